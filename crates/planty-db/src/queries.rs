use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::models::{AnalysisRow, LedRow, PlantRow, UserRow};
use crate::{Database, Result};

/// Column values for a new plant row.
pub struct NewPlant<'a> {
    pub owner_id: &'a str,
    pub name: &'a str,
    pub plant_type: &'a str,
    pub watering_cycle: i64,
    pub last_watered: &'a str,
    pub created_at: &'a str,
}

/// Column values for an LED upsert.
pub struct NewLed<'a> {
    pub plant_id: i64,
    pub mode: &'a str,
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub strength: u8,
    pub updated_at: &'a str,
}

impl Database {
    // -- Users --

    pub fn create_user(
        &self,
        user_id: &str,
        nickname: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (user_id, nickname, email, hashed_password) VALUES (?1, ?2, ?3, ?4)",
                (user_id, nickname, email, password_hash),
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_id(&self, user_id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "user_id", user_id))
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    pub fn user_has_plants(&self, owner_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let found = conn
                .query_row(
                    "SELECT 1 FROM plants WHERE owner_id = ?1 LIMIT 1",
                    [owner_id],
                    |_| Ok(()),
                )
                .optional()?;
            Ok(found.is_some())
        })
    }

    // -- Plants --

    /// Insert a plant and return its id.
    pub fn insert_plant(&self, plant: &NewPlant<'_>) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO plants (name, type, watering_cycle, last_watered, created_at, owner_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    plant.name,
                    plant.plant_type,
                    plant.watering_cycle,
                    plant.last_watered,
                    plant.created_at,
                    plant.owner_id,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Look up a plant by id, restricted to one owner. A plant owned by
    /// someone else is indistinguishable from a missing one.
    pub fn get_owned_plant(&self, plant_id: i64, owner_id: &str) -> Result<Option<PlantRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, name, type, watering_cycle, last_watered, created_at, owner_id
                 FROM plants WHERE id = ?1 AND owner_id = ?2",
                params![plant_id, owner_id],
                plant_from_row,
            )
            .optional()
            .map_err(Into::into)
        })
    }

    pub fn plant_exists(&self, plant_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let found = conn
                .query_row("SELECT 1 FROM plants WHERE id = ?1", [plant_id], |_| Ok(()))
                .optional()?;
            Ok(found.is_some())
        })
    }

    pub fn list_plants(&self, owner_id: &str) -> Result<Vec<PlantRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, type, watering_cycle, last_watered, created_at, owner_id
                 FROM plants WHERE owner_id = ?1 ORDER BY id",
            )?;
            let rows = stmt
                .query_map([owner_id], plant_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- LED --

    /// Insert or overwrite the single LED row for a plant.
    pub fn upsert_led(&self, led: &NewLed<'_>) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO plant_leds (plant_id, mode, r, g, b, strength, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(plant_id) DO UPDATE SET
                     mode = excluded.mode,
                     r = excluded.r,
                     g = excluded.g,
                     b = excluded.b,
                     strength = excluded.strength,
                     updated_at = excluded.updated_at",
                params![led.plant_id, led.mode, led.r, led.g, led.b, led.strength, led.updated_at],
            )?;
            Ok(())
        })
    }

    pub fn get_owned_led(&self, plant_id: i64, owner_id: &str) -> Result<Option<LedRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT l.plant_id, l.mode, l.r, l.g, l.b, l.strength, l.updated_at
                 FROM plant_leds l
                 JOIN plants p ON p.id = l.plant_id
                 WHERE l.plant_id = ?1 AND p.owner_id = ?2",
                params![plant_id, owner_id],
                |row| {
                    Ok(LedRow {
                        plant_id: row.get(0)?,
                        mode: row.get(1)?,
                        r: row.get(2)?,
                        g: row.get(3)?,
                        b: row.get(4)?,
                        strength: row.get(5)?,
                        updated_at: row.get(6)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
        })
    }

    // -- AI analysis --

    /// Append an analysis record and return its id.
    pub fn insert_analysis(&self, plant_id: i64, text: &str, created_at: &str) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO plant_ai_analysis (plant_id, analysis_text, created_at) VALUES (?1, ?2, ?3)",
                params![plant_id, text, created_at],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn latest_analysis(&self, plant_id: i64) -> Result<Option<AnalysisRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, plant_id, analysis_text, created_at
                 FROM plant_ai_analysis
                 WHERE plant_id = ?1
                 ORDER BY created_at DESC, id DESC
                 LIMIT 1",
                [plant_id],
                |row| {
                    Ok(AnalysisRow {
                        id: row.get(0)?,
                        plant_id: row.get(1)?,
                        analysis_text: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
        })
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    // `column` is one of our own literals, never client input.
    let sql = format!(
        "SELECT user_id, nickname, email, hashed_password, is_active FROM users WHERE {} = ?1",
        column
    );
    let mut stmt = conn.prepare(&sql)?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                user_id: row.get(0)?,
                nickname: row.get(1)?,
                email: row.get(2)?,
                hashed_password: row.get(3)?,
                is_active: row.get(4)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn plant_from_row(row: &Row<'_>) -> rusqlite::Result<PlantRow> {
    Ok(PlantRow {
        id: row.get(0)?,
        name: row.get(1)?,
        plant_type: row.get(2)?,
        watering_cycle: row.get(3)?,
        last_watered: row.get(4)?,
        created_at: row.get(5)?,
        owner_id: row.get(6)?,
    })
}
