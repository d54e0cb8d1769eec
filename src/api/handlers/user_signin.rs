use crate::api::handlers::auth::{
    now_unix_seconds,
    types::{SignInRequest, SignInResponse},
    AuthError, AuthState,
};
use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use secrecy::SecretString;
use std::sync::Arc;
use tracing::{debug, instrument};

#[utoipa::path(
    post,
    path= "/user/signin",
    request_body = SignInRequest,
    responses (
        (status = 200, description = "Credentials verified, session token issued", body = SignInResponse, content_type = "application/json"),
        (status = 400, description = "Wrong username or password, or missing payload", body = String),
    ),
    tag= "user"
)]
// axum handler for sign-in
#[instrument(skip(auth_state, payload))]
pub async fn signin(
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<SignInRequest>>,
) -> impl IntoResponse {
    let request: SignInRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload").into_response(),
    };

    let id = request.id.unwrap_or_default();
    let secret = request
        .pwd
        .unwrap_or_else(|| SecretString::from(String::new()));

    let identity = match auth_state.verifier().sign_in(&id, &secret).await {
        Ok(identity) => identity,
        Err(err) => return err.into_response(),
    };

    match auth_state
        .issuer()
        .issue(&identity.id, now_unix_seconds())
    {
        Ok(issued) => {
            debug!("Issued session token for {}", issued.subject);
            let response = SignInResponse {
                token: issued.token,
                id: issued.subject,
                issued_at: issued.issued_at,
                expires_at: issued.expires_at,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => AuthError::Internal(err.into()).into_response(),
    }
}
