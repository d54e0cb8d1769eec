//! Identity lookup for authenticated callers.
//!
//! Any valid session may read any user's public identity; the game client
//! uses this to show opponents.

use crate::api::handlers::auth::{types::Identity, AuthError, AuthState, Principal};
use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tracing::{debug, instrument};

#[utoipa::path(
    get,
    path= "/user/{id}/info",
    params(
        ("id" = String, Path, description = "Identifier of the user to look up")
    ),
    responses (
        (status = 200, description = "Public identity of the user", body = Identity, content_type = "application/json"),
        (status = 401, description = "Missing, invalid, or expired session token", body = String),
        (status = 404, description = "User not found", body = String),
    ),
    security(("bearer" = [])),
    tag= "user"
)]
// axum handler for identity lookup, runs behind `require_token`
#[instrument(skip(auth_state, principal), fields(caller = %principal.id))]
pub async fn info(
    Path(id): Path<String>,
    auth_state: Extension<Arc<AuthState>>,
    Extension(principal): Extension<Principal>,
) -> impl IntoResponse {
    let record = match auth_state.store().find_by_id(id.trim()).await {
        Ok(record) => record,
        Err(err) => return AuthError::Internal(err).into_response(),
    };

    match record {
        Some(record) => (StatusCode::OK, Json(record.identity())).into_response(),
        None => {
            debug!("Lookup for unknown user");
            AuthError::NotFound.into_response()
        }
    }
}
