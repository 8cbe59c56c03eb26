use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Public view of an account. The password hash never leaves the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: String,
    pub nickname: String,
    pub email: String,
    #[serde(skip)]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plant {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub plant_type: String,
    /// Days between waterings.
    pub watering_cycle: i64,
    pub last_watered: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub owner_id: String,
}

/// The single LED configuration of a plant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedState {
    pub plant_id: i64,
    pub mode: String,
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub strength: u8,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub id: i64,
    pub plant_id: i64,
    pub analysis_text: String,
    pub created_at: DateTime<Utc>,
}
