use axum::{
    Extension, Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
};
use tracing::{info, warn};

use planty_types::api::{AnalysisRequest, AnalysisResponse};
use planty_types::models::{AnalysisRecord, User};

use crate::auth::{AppState, AppStateInner};
use crate::error::{Error, Result, blocking};

/// POST /plants/{plant_id}/ai-analysis
///
/// Unauthenticated: the greenhouse analysis job posts here directly.
pub async fn save_analysis(
    State(state): State<AppState>,
    path: std::result::Result<Path<i64>, PathRejection>,
    body: std::result::Result<Json<AnalysisRequest>, JsonRejection>,
) -> Result<Json<AnalysisResponse>> {
    let Path(plant_id) = path?;
    let Json(req) = body?;
    let text = req.analysis_text.unwrap_or_default();

    let registry = state.registry.clone();
    let record = blocking(move || registry.record_analysis(plant_id, &text)).await?;

    Ok(Json(AnalysisResponse::from_record(record, "Analysis saved")))
}

/// GET /plants/{plant_id}/ai-analysis
pub async fn latest_analysis(
    State(state): State<AppState>,
    path: std::result::Result<Path<i64>, PathRejection>,
) -> Result<Json<AnalysisResponse>> {
    let Path(plant_id) = path?;
    let registry = state.registry.clone();
    let record = blocking(move || registry.latest_analysis(plant_id)).await?;

    Ok(Json(AnalysisResponse::from_record(record, "Analysis found")))
}

/// POST /plants/{plant_id}/ai-analysis/run
pub async fn run_analysis(
    State(state): State<AppState>,
    path: std::result::Result<Path<i64>, PathRejection>,
    Extension(user): Extension<User>,
) -> Result<Json<AnalysisResponse>> {
    let Path(plant_id) = path?;
    let record = analyze_plant(&state, plant_id, &user.user_id).await?;
    Ok(Json(AnalysisResponse::from_record(record, "Analysis saved")))
}

/// Capture a frame, ask the vision model about the caller's plant, and
/// append the diagnosis to the plant's history.
pub async fn analyze_plant(state: &AppStateInner, plant_id: i64, owner_id: &str) -> Result<AnalysisRecord> {
    let registry = state.registry.clone();
    let owner = owner_id.to_string();
    let plant = blocking(move || registry.get(plant_id, &owner)).await?;

    let analyzer = state
        .analyzer
        .clone()
        .ok_or_else(|| Error::UpstreamFailure("Plant analysis is not configured".into()))?;

    let diagnosis = analyzer.diagnose(&plant.plant_type).await.map_err(|e| {
        warn!(plant_id, "Plant analysis failed: {}", e);
        Error::UpstreamFailure(format!("Plant analysis failed: {}", e))
    })?;

    let registry = state.registry.clone();
    let record = blocking(move || registry.record_analysis(plant_id, &diagnosis)).await?;
    info!(plant_id, "Stored vision diagnosis");
    Ok(record)
}
