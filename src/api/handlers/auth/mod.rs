//! Auth core: credential store, verifier, session tokens, and the request gate.
//!
//! ## Credential Hashing
//!
//! Secrets are hashed with Argon2id on the blocking thread pool. Sign-in for
//! an unknown id still runs one verification against a fixed dummy hash, so
//! response timing does not reveal which ids are registered.
//!
//! ## Session Tokens
//!
//! `HS256` JWS signed with a key loaded at startup. A token carries issuer,
//! subject, issue time, expiry, and a random `jti`.
//!
//! > **Warning:** Rotating the signing key invalidates every outstanding token.

mod credentials;
pub(crate) mod error;
mod password;
mod postgres;
pub(crate) mod principal;
mod state;
mod storage;
pub(crate) mod token;
pub mod types;
mod utils;

pub use credentials::CredentialVerifier;
pub use error::AuthError;
pub use password::CredentialHasher;
pub use postgres::{PgStore, SCHEMA_SQL};
pub use principal::{authorize, require_token, Principal};
pub use state::{AuthConfig, AuthState};
pub use storage::{CredentialStore, MemoryStore, SignupOutcome};
pub use token::{IssuedToken, SessionClaims, TokenError, TokenIssuer, TokenKey, TokenValidator};
pub use types::{Identity, IdentityRecord, NewIdentity};

pub(crate) use state::{DEFAULT_TOKEN_ISSUER, DEFAULT_TOKEN_TTL_SECONDS};
pub(crate) use utils::now_unix_seconds;
