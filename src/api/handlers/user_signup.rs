use crate::api::handlers::auth::{
    types::{Identity, SignUpRequest},
    AuthState,
};
use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;
use tracing::{debug, instrument};

#[utoipa::path(
    put,
    path= "/user/signup",
    request_body = SignUpRequest,
    responses (
        (status = 200, description = "Registration successful", body = Identity, content_type = "application/json"),
        (status = 400, description = "Mandatory fields missing, user already registered, or missing payload", body = String),
    ),
    tag= "user"
)]
// axum handler for sign-up
#[instrument(skip(auth_state, payload))]
pub async fn signup(
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<SignUpRequest>>,
) -> impl IntoResponse {
    let request: SignUpRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload").into_response(),
    };

    match auth_state.verifier().sign_up(request.into()).await {
        Ok(identity) => {
            debug!("Registered {}", identity.id);
            (StatusCode::OK, Json(identity)).into_response()
        }
        Err(err) => err.into_response(),
    }
}
