use axum::{
    Extension, Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
};

use planty_types::api::{LedResponse, SetLedRequest};
use planty_types::models::User;

use crate::auth::AppState;
use crate::error::{Error, Result, blocking};
use crate::registry::LedSetting;

/// POST /plants/{plant_id}/led
pub async fn set_led(
    State(state): State<AppState>,
    path: std::result::Result<Path<i64>, PathRejection>,
    Extension(user): Extension<User>,
    body: std::result::Result<Json<SetLedRequest>, JsonRejection>,
) -> Result<Json<LedResponse>> {
    let Path(plant_id) = path?;
    let Json(req) = body?;
    if req.plant_id.is_some_and(|id| id != plant_id) {
        return Err(Error::BadRequest("plant_id does not match the path".into()));
    }

    let registry = state.registry.clone();
    let led = blocking(move || {
        let setting = LedSetting {
            mode: &req.mode,
            r: req.r,
            g: req.g,
            b: req.b,
            strength: req.strength,
        };
        registry.set_led(plant_id, &user.user_id, &setting)
    })
    .await?;

    Ok(Json(LedResponse {
        success: true,
        message: "LED mode updated".into(),
        led: Some(led),
    }))
}

/// GET /plants/{plant_id}/led. "Not configured" is a success=false envelope.
pub async fn get_led(
    State(state): State<AppState>,
    path: std::result::Result<Path<i64>, PathRejection>,
    Extension(user): Extension<User>,
) -> Result<Json<LedResponse>> {
    let Path(plant_id) = path?;
    let registry = state.registry.clone();
    let led = blocking(move || registry.get_led(plant_id, &user.user_id)).await?;

    Ok(Json(match led {
        Some(led) => LedResponse {
            success: true,
            message: "LED setting found".into(),
            led: Some(led),
        },
        None => LedResponse {
            success: false,
            message: "No LED setting found".into(),
            led: None,
        },
    }))
}
