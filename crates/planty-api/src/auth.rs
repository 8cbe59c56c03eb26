use std::sync::Arc;

use axum::{Extension, Json, extract::State, extract::rejection::JsonRejection};
use tracing::info;

use planty_bus::ColorPublisher;
use planty_db::Database;
use planty_types::api::{LoginRequest, LoginResponse, SignupRequest, SignupResponse};
use planty_types::models::User;
use planty_vision::PlantAnalyzer;

use crate::credentials::CredentialStore;
use crate::error::{Error, Result, blocking};
use crate::registry::PlantRegistry;
use crate::token::TokenService;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub tokens: TokenService,
    pub credentials: CredentialStore,
    pub registry: PlantRegistry,
    /// Absent when no camera or vision key is configured.
    pub analyzer: Option<Arc<dyn PlantAnalyzer>>,
}

impl AppStateInner {
    pub fn new(
        db: Arc<Database>,
        tokens: TokenService,
        publisher: Arc<dyn ColorPublisher>,
        analyzer: Option<Arc<dyn PlantAnalyzer>>,
    ) -> AppState {
        Arc::new(Self {
            tokens,
            credentials: CredentialStore::new(db.clone()),
            registry: PlantRegistry::new(db, publisher),
            analyzer,
        })
    }
}

/// POST /auth/signup
pub async fn signup(
    State(state): State<AppState>,
    body: std::result::Result<Json<SignupRequest>, JsonRejection>,
) -> Result<Json<SignupResponse>> {
    let Json(req) = body?;

    let credentials = state.credentials.clone();
    let created =
        blocking(move || credentials.create(&req.user_id, &req.nickname, &req.email, &req.user_pw))
            .await;

    match created {
        Ok(_) => Ok(Json(SignupResponse {
            success: true,
            message: "Signup successful".into(),
            error_code: None,
        })),
        Err(e @ (Error::IdentifierTaken | Error::EmailTaken)) => {
            info!("Signup rejected: {}", e);
            Ok(Json(SignupResponse {
                success: false,
                message: e.to_string(),
                error_code: Some(e.code().into()),
            }))
        }
        Err(e) => Err(e),
    }
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    body: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>> {
    let Json(req) = body?;

    let credentials = state.credentials.clone();
    let user_id = req.user_id.clone();
    let authenticated = blocking(move || credentials.authenticate(&user_id, &req.user_pw)).await;

    let auth = match authenticated {
        Ok(auth) => auth,
        Err(e @ (Error::NotFound(_) | Error::BadCredential)) => {
            info!(user_id = %req.user_id, "Login failed: {}", e);
            return Ok(Json(LoginResponse::failed(e.to_string())));
        }
        Err(e) => return Err(e),
    };

    let token = state.tokens.issue(&auth.user.user_id)?;
    info!(user_id = %auth.user.user_id, "Login successful");

    Ok(Json(LoginResponse {
        success: true,
        message: "Login successful".into(),
        token: Some(token),
        user_data: Some(auth.user),
        requires_plant_registration: Some(auth.requires_plant_registration),
    }))
}

/// POST /auth/refresh: re-issue a token for an already authenticated user.
pub async fn refresh(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<LoginResponse>> {
    let token = state.tokens.issue(&user.user_id)?;

    let credentials = state.credentials.clone();
    let user_id = user.user_id.clone();
    let requires_plant_registration =
        blocking(move || credentials.requires_plant_registration(&user_id)).await?;

    Ok(Json(LoginResponse {
        success: true,
        message: "Token refreshed successfully".into(),
        token: Some(token),
        user_data: Some(user),
        requires_plant_registration: Some(requires_plant_registration),
    }))
}
