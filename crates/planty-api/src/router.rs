use axum::{
    Json, Router, middleware,
    routing::{get, post},
};
use serde_json::{Value, json};

use crate::auth::{self, AppState};
use crate::middleware::require_auth;
use crate::{analysis, led, plants};

/// All API routes. Transport layers (CORS, tracing) are added by the binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route(
            "/plants/{plant_id}/ai-analysis",
            get(analysis::latest_analysis).post(analysis::save_analysis),
        )
        .route("/health", get(health));

    let protected_routes = Router::new()
        .route("/auth/refresh", post(auth::refresh))
        .route("/plants", get(plants::list_plants).post(plants::register_plant))
        .route("/plants/{plant_id}", get(plants::get_plant))
        .route("/plants/{plant_id}/led", get(led::get_led).post(led::set_led))
        .route("/plants/{plant_id}/ai-analysis/run", post(analysis::run_analysis))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
