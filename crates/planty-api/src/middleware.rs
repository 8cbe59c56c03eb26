use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};

use crate::auth::AppState;
use crate::error::{Error, blocking};

/// Validate the bearer token and attach the caller's `User` to the request.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, Error> {
    let token = bearer_token(req.headers()).ok_or(Error::InvalidCredential)?;
    let user_id = state.tokens.verify(token)?;

    let credentials = state.credentials.clone();
    let user = blocking(move || credentials.find(&user_id))
        .await
        .map_err(|e| match e {
            Error::NotFound(_) => Error::InvalidCredential,
            other => other,
        })?;

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
