use axum::{
    Extension, Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
};

use planty_types::api::{CreatePlantRequest, PlantResponse};
use planty_types::models::{Plant, User};

use crate::auth::AppState;
use crate::error::{Error, Result, blocking};

/// POST /plants
pub async fn register_plant(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    body: std::result::Result<Json<CreatePlantRequest>, JsonRejection>,
) -> Result<Json<PlantResponse>> {
    let Json(req) = body?;

    let registry = state.registry.clone();
    let plant = blocking(move || {
        registry.register(
            &user.user_id,
            &req.name,
            &req.plant_type,
            req.watering_cycle,
            req.last_watered.as_deref(),
        )
    })
    .await?;

    Ok(Json(PlantResponse {
        success: true,
        message: "Plant registered successfully".into(),
        plant: Some(plant),
    }))
}

/// GET /plants
pub async fn list_plants(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<Plant>>> {
    let registry = state.registry.clone();
    let plants = blocking(move || registry.list(&user.user_id)).await?;
    Ok(Json(plants))
}

/// GET /plants/{plant_id}. A foreign or missing plant is a success=false
/// envelope, not an error status.
pub async fn get_plant(
    State(state): State<AppState>,
    path: std::result::Result<Path<i64>, PathRejection>,
    Extension(user): Extension<User>,
) -> Result<Json<PlantResponse>> {
    let Path(plant_id) = path?;
    let registry = state.registry.clone();
    let found = blocking(move || registry.get(plant_id, &user.user_id)).await;

    match found {
        Ok(plant) => Ok(Json(PlantResponse {
            success: true,
            message: "Plant found".into(),
            plant: Some(plant),
        })),
        Err(e @ Error::NotFound(_)) => Ok(Json(PlantResponse {
            success: false,
            message: e.to_string(),
            plant: None,
        })),
        Err(e) => Err(e),
    }
}
