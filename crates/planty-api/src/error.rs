use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use planty_db::DbError;
use planty_types::api::ErrorResponse;

#[derive(Debug, Error)]
pub enum Error {
    /// Bad, expired or malformed session token, or a token for a user that
    /// no longer exists.
    #[error("Invalid authentication credentials")]
    InvalidCredential,

    /// Absent entity, or one owned by somebody else. The two are never
    /// distinguished.
    #[error("{0}")]
    NotFound(&'static str),

    #[error("User ID already exists")]
    IdentifierTaken,

    #[error("Email already registered")]
    EmailTaken,

    #[error("Incorrect password")]
    BadCredential,

    #[error("{0}")]
    BadRequest(String),

    /// Bus or vision collaborator failed.
    #[error("{0}")]
    UpstreamFailure(String),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error("{0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidCredential => "INVALID_CREDENTIAL",
            Error::NotFound(_) => "NOT_FOUND",
            Error::IdentifierTaken => "USER_EXISTS",
            Error::EmailTaken => "EMAIL_EXISTS",
            Error::BadCredential => "BAD_CREDENTIAL",
            Error::BadRequest(_) => "BAD_REQUEST",
            Error::UpstreamFailure(_) => "UPSTREAM_FAILURE",
            Error::Db(_) | Error::Internal(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Error::InvalidCredential | Error::BadCredential => StatusCode::UNAUTHORIZED,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::IdentifierTaken | Error::EmailTaken => StatusCode::CONFLICT,
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::UpstreamFailure(_) => StatusCode::BAD_GATEWAY,
            Error::Db(_) | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            error!("Request failed: {}", self);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorResponse {
            success: false,
            message,
            error_code: self.code().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        Error::BadRequest(rejection.body_text())
    }
}

/// Run blocking work (SQLite, password hashing) off the async runtime.
pub async fn blocking<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        Error::Internal("background task failed".into())
    })?
}
