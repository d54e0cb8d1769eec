//! Authenticated principal extraction and the request gate for protected routes.
//!
//! Flow Overview: read the bearer token, verify its signature and expiry, then
//! resolve the subject to a stored identity. Any failure short-circuits with
//! `401` before the protected handler runs.

use axum::{
    extract::{Extension, Request},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use time::Date;
use tracing::debug;

use super::{
    error::AuthError,
    state::AuthState,
    utils::{extract_bearer_token, now_unix_seconds},
};

/// Authenticated caller derived from a valid session token.
#[derive(Clone, Debug)]
pub struct Principal {
    pub id: String,
    pub name: String,
    pub date_of_birth: Option<Date>,
    pub issued_at: i64,
    pub expires_at: i64,
}

/// Resolve the `Authorization` header into a principal at `now_unix_seconds`.
///
/// # Errors
/// Returns [`AuthError::Unauthorized`] when the header is missing, the token
/// does not verify, it has expired, or its subject no longer exists.
pub async fn authorize(
    headers: &HeaderMap,
    state: &AuthState,
    now_unix_seconds: i64,
) -> Result<Principal, AuthError> {
    let token = extract_bearer_token(headers).ok_or(AuthError::Unauthorized)?;

    let claims = state
        .validator()
        .validate(&token, now_unix_seconds)
        .map_err(|err| {
            debug!("Rejected session token: {err}");
            AuthError::Unauthorized
        })?;

    let Some(record) = state.store().find_by_id(&claims.sub).await? else {
        debug!("Session token subject no longer exists");
        return Err(AuthError::Unauthorized);
    };

    Ok(Principal {
        id: record.id,
        name: record.display_name,
        date_of_birth: record.date_of_birth,
        issued_at: claims.iat,
        expires_at: claims.exp,
    })
}

/// Middleware for protected routes. Attaches the [`Principal`] to the request
/// extensions on success.
pub async fn require_token(
    Extension(state): Extension<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    match authorize(request.headers(), &state, now_unix_seconds()).await {
        Ok(principal) => {
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        Err(err) => err.into_response(),
    }
}
