use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{AnalysisRecord, LedState, Plant, User};

// -- Token claims --

/// Session token claims. `sub` is the user identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub nickname: String,
    pub user_id: String,
    pub user_pw: String,
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub user_id: String,
    pub user_pw: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    pub token: Option<String>,
    pub user_data: Option<User>,
    pub requires_plant_registration: Option<bool>,
}

impl LoginResponse {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            token: None,
            user_data: None,
            requires_plant_registration: Some(false),
        }
    }
}

// -- Plants --

#[derive(Debug, Deserialize)]
pub struct CreatePlantRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub plant_type: String,
    pub watering_cycle: i64,
    /// ISO-8601 string from the client; unparseable values fall back to now.
    pub last_watered: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PlantResponse {
    pub success: bool,
    pub message: String,
    pub plant: Option<Plant>,
}

// -- LED --

#[derive(Debug, Deserialize)]
pub struct SetLedRequest {
    /// Older clients repeat the path id in the body.
    pub plant_id: Option<i64>,
    pub mode: String,
    pub r: i64,
    pub g: i64,
    pub b: i64,
    #[serde(default = "default_strength")]
    pub strength: i64,
}

pub fn default_strength() -> i64 {
    128
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LedResponse {
    pub success: bool,
    pub message: String,
    pub led: Option<LedState>,
}

// -- AI analysis --

#[derive(Debug, Deserialize)]
pub struct AnalysisRequest {
    pub analysis_text: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub success: bool,
    pub message: String,
    pub id: i64,
    pub analysis_text: String,
    pub created_at: DateTime<Utc>,
}

impl AnalysisResponse {
    pub fn from_record(record: AnalysisRecord, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            id: record.id,
            analysis_text: record.analysis_text,
            created_at: record.created_at,
        }
    }
}

// -- Errors --

/// Body of every non-2xx response.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    pub error_code: String,
}
