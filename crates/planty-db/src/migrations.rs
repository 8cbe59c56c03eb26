use rusqlite::Connection;
use tracing::info;

use crate::Result;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                user_id          TEXT PRIMARY KEY,
                nickname         TEXT NOT NULL,
                email            TEXT NOT NULL UNIQUE,
                hashed_password  TEXT NOT NULL,
                is_active        INTEGER NOT NULL DEFAULT 1
            );

            CREATE TABLE plants (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                name            TEXT NOT NULL,
                type            TEXT NOT NULL,
                watering_cycle  INTEGER NOT NULL,
                last_watered    TEXT NOT NULL,
                created_at      TEXT NOT NULL,
                owner_id        TEXT NOT NULL REFERENCES users(user_id)
            );

            CREATE INDEX idx_plants_owner ON plants(owner_id);

            CREATE TABLE plant_leds (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                plant_id    INTEGER NOT NULL UNIQUE REFERENCES plants(id),
                mode        TEXT NOT NULL,
                r           INTEGER NOT NULL,
                g           INTEGER NOT NULL,
                b           INTEGER NOT NULL,
                strength    INTEGER NOT NULL DEFAULT 128,
                updated_at  TEXT NOT NULL
            );

            CREATE TABLE plant_ai_analysis (
                id             INTEGER PRIMARY KEY AUTOINCREMENT,
                plant_id       INTEGER NOT NULL REFERENCES plants(id),
                analysis_text  TEXT NOT NULL,
                created_at     TEXT NOT NULL
            );

            CREATE INDEX idx_analysis_plant
                ON plant_ai_analysis(plant_id, created_at);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
