//! Error taxonomy for the auth core and its HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

pub const MANDATORY_FIELDS_MISSING: &str = "Mandatory fields missing";
pub const ALREADY_REGISTERED: &str = "User is already registered";
pub const WRONG_USERNAME_OR_PASSWORD: &str = "Wrong username or password";
pub const UNAUTHORIZED: &str = "Unauthorized";
pub const USER_NOT_FOUND: &str = "User not found";
pub const INTERNAL_ERROR: &str = "Internal server error";

/// Terminal outcomes surfaced to the caller. None of them is retried.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Malformed or missing sign-up input.
    #[error("mandatory fields missing")]
    Validation,
    /// The identifier is already taken.
    #[error("already registered")]
    Conflict,
    /// Unknown id or wrong secret; the two are deliberately indistinguishable.
    #[error("wrong username or password")]
    Authentication,
    /// Missing, invalid, or expired token on a protected request.
    #[error("unauthorized")]
    Unauthorized,
    /// The requested identity does not exist.
    #[error("user not found")]
    NotFound,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation | Self::Conflict | Self::Authentication => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Body text returned to the client.
    #[must_use]
    pub fn message(&self) -> &'static str {
        match self {
            Self::Validation => MANDATORY_FIELDS_MISSING,
            Self::Conflict => ALREADY_REGISTERED,
            Self::Authentication => WRONG_USERNAME_OR_PASSWORD,
            Self::Unauthorized => UNAUTHORIZED,
            Self::NotFound => USER_NOT_FOUND,
            Self::Internal(_) => INTERNAL_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let Self::Internal(err) = &self {
            error!("Internal auth error: {err:#}");
        }
        (self.status(), self.message().to_string()).into_response()
    }
}
