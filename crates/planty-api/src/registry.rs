use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use planty_bus::{ColorCommand, ColorPublisher};
use planty_db::queries::{NewLed, NewPlant};
use planty_db::{Database, timestamp};
use planty_types::models::{AnalysisRecord, LedState, Plant};

use crate::{Error, Result};

const PLANT_NOT_FOUND: &str = "Plant not found";

/// LED values as requested by a client, before range checks.
#[derive(Debug, Clone)]
pub struct LedSetting<'a> {
    pub mode: &'a str,
    pub r: i64,
    pub g: i64,
    pub b: i64,
    pub strength: i64,
}

/// Plants, their LED configuration, and their analysis history.
#[derive(Clone)]
pub struct PlantRegistry {
    db: Arc<Database>,
    publisher: Arc<dyn ColorPublisher>,
}

impl PlantRegistry {
    pub fn new(db: Arc<Database>, publisher: Arc<dyn ColorPublisher>) -> Self {
        Self { db, publisher }
    }

    pub fn register(
        &self,
        owner_id: &str,
        name: &str,
        plant_type: &str,
        watering_cycle: i64,
        last_watered: Option<&str>,
    ) -> Result<Plant> {
        if name.trim().is_empty() {
            return Err(Error::BadRequest("name is required".into()));
        }
        if plant_type.trim().is_empty() {
            return Err(Error::BadRequest("type is required".into()));
        }
        if watering_cycle < 1 {
            return Err(Error::BadRequest("watering_cycle must be at least 1 day".into()));
        }

        let now = Utc::now();
        let last_watered = match last_watered {
            Some(raw) => timestamp::parse_client(raw).unwrap_or_else(|| {
                warn!("Unparseable last_watered '{}', using now", raw);
                now
            }),
            None => now,
        };

        let last_watered_s = timestamp::format(last_watered);
        let created_at_s = timestamp::format(now);
        let id = self.db.insert_plant(&NewPlant {
            owner_id,
            name,
            plant_type,
            watering_cycle,
            last_watered: &last_watered_s,
            created_at: &created_at_s,
        })?;

        info!(plant_id = id, owner_id, "Plant registered");

        // Round-trip through the stored form so the result matches later reads.
        let plant = self
            .db
            .get_owned_plant(id, owner_id)?
            .ok_or_else(|| Error::Internal(format!("plant {} vanished after insert", id)))?;
        Ok(plant.into())
    }

    pub fn list(&self, owner_id: &str) -> Result<Vec<Plant>> {
        Ok(self
            .db
            .list_plants(owner_id)?
            .into_iter()
            .map(Plant::from)
            .collect())
    }

    /// Not found both when the plant is absent and when it belongs to
    /// another user.
    pub fn get(&self, plant_id: i64, owner_id: &str) -> Result<Plant> {
        self.db
            .get_owned_plant(plant_id, owner_id)?
            .map(Plant::from)
            .ok_or(Error::NotFound(PLANT_NOT_FOUND))
    }

    /// Store the plant's LED setting and forward the scaled color to the bus.
    /// The write stands even if publishing fails.
    pub fn set_led(&self, plant_id: i64, owner_id: &str, setting: &LedSetting<'_>) -> Result<LedState> {
        if setting.mode.trim().is_empty() {
            return Err(Error::BadRequest("mode is required".into()));
        }
        let r = channel("r", setting.r)?;
        let g = channel("g", setting.g)?;
        let b = channel("b", setting.b)?;
        let strength = channel("strength", setting.strength)?;

        self.get(plant_id, owner_id)?;

        let updated_at = Utc::now();
        let updated_at_s = timestamp::format(updated_at);
        self.db.upsert_led(&NewLed {
            plant_id,
            mode: setting.mode,
            r,
            g,
            b,
            strength,
            updated_at: &updated_at_s,
        })?;

        let cmd = ColorCommand::scaled(r, g, b, strength);
        if let Err(e) = self.publisher.publish(cmd) {
            warn!(plant_id, "Failed to publish LED color: {}", e);
        }

        Ok(LedState {
            plant_id,
            mode: setting.mode.to_string(),
            r,
            g,
            b,
            strength,
            updated_at,
        })
    }

    /// `None` when the plant has no LED setting or is not the caller's.
    pub fn get_led(&self, plant_id: i64, owner_id: &str) -> Result<Option<LedState>> {
        Ok(self.db.get_owned_led(plant_id, owner_id)?.map(LedState::from))
    }

    pub fn record_analysis(&self, plant_id: i64, text: &str) -> Result<AnalysisRecord> {
        if text.trim().is_empty() {
            return Err(Error::BadRequest("analysis_text is required".into()));
        }
        if !self.db.plant_exists(plant_id)? {
            return Err(Error::NotFound(PLANT_NOT_FOUND));
        }

        let created_at = Utc::now();
        let id = self
            .db
            .insert_analysis(plant_id, text, &timestamp::format(created_at))?;

        info!(plant_id, analysis_id = id, "Analysis recorded");
        Ok(AnalysisRecord {
            id,
            plant_id,
            analysis_text: text.to_string(),
            created_at,
        })
    }

    pub fn latest_analysis(&self, plant_id: i64) -> Result<AnalysisRecord> {
        self.db
            .latest_analysis(plant_id)?
            .map(AnalysisRecord::from)
            .ok_or(Error::NotFound("No analysis found"))
    }
}

fn channel(name: &str, value: i64) -> Result<u8> {
    u8::try_from(value).map_err(|_| Error::BadRequest(format!("{} must be between 0 and 255", name)))
}
