//! Database row types. These map directly to SQLite rows and are kept
//! separate from the planty-types API models.

use chrono::{DateTime, Utc};
use tracing::warn;

use planty_types::models::{AnalysisRecord, LedState, Plant, User};

use crate::timestamp;

pub struct UserRow {
    pub user_id: String,
    pub nickname: String,
    pub email: String,
    pub hashed_password: String,
    pub is_active: bool,
}

pub struct PlantRow {
    pub id: i64,
    pub name: String,
    pub plant_type: String,
    pub watering_cycle: i64,
    pub last_watered: String,
    pub created_at: String,
    pub owner_id: String,
}

pub struct LedRow {
    pub plant_id: i64,
    pub mode: String,
    pub r: i64,
    pub g: i64,
    pub b: i64,
    pub strength: i64,
    pub updated_at: String,
}

pub struct AnalysisRow {
    pub id: i64,
    pub plant_id: i64,
    pub analysis_text: String,
    pub created_at: String,
}

fn stored_time(raw: &str, what: &str, id: i64) -> DateTime<Utc> {
    timestamp::parse(raw).unwrap_or_else(|| {
        warn!("Corrupt {} '{}' on row {}", what, raw, id);
        DateTime::default()
    })
}

fn channel(value: i64, what: &str, plant_id: i64) -> u8 {
    u8::try_from(value).unwrap_or_else(|_| {
        warn!("Out-of-range LED {} {} on plant {}", what, value, plant_id);
        value.clamp(0, 255) as u8
    })
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            user_id: row.user_id,
            nickname: row.nickname,
            email: row.email,
            is_active: row.is_active,
        }
    }
}

impl From<PlantRow> for Plant {
    fn from(row: PlantRow) -> Self {
        Plant {
            last_watered: stored_time(&row.last_watered, "last_watered", row.id),
            created_at: stored_time(&row.created_at, "created_at", row.id),
            id: row.id,
            name: row.name,
            plant_type: row.plant_type,
            watering_cycle: row.watering_cycle,
            owner_id: row.owner_id,
        }
    }
}

impl From<LedRow> for LedState {
    fn from(row: LedRow) -> Self {
        LedState {
            r: channel(row.r, "r", row.plant_id),
            g: channel(row.g, "g", row.plant_id),
            b: channel(row.b, "b", row.plant_id),
            strength: channel(row.strength, "strength", row.plant_id),
            updated_at: stored_time(&row.updated_at, "updated_at", row.plant_id),
            plant_id: row.plant_id,
            mode: row.mode,
        }
    }
}

impl From<AnalysisRow> for AnalysisRecord {
    fn from(row: AnalysisRow) -> Self {
        AnalysisRecord {
            created_at: stored_time(&row.created_at, "created_at", row.id),
            id: row.id,
            plant_id: row.plant_id,
            analysis_text: row.analysis_text,
        }
    }
}
