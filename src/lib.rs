//! # Holdem Auth (Credential & Session Authority)
//!
//! `holdem-auth` registers players of the Hold'em server, checks their
//! credentials, and issues the stateless session tokens the game client
//! presents on every protected request.
//!
//! ## Credentials
//!
//! - **Identifiers** are unique across the store. Sign-up performs a single
//!   atomic insert-if-absent, so two concurrent registrations of the same id
//!   can never both succeed.
//! - **Secrets** are stored as salted Argon2id hashes (PHC string format) and
//!   never leave the service. Verification compares in constant time.
//! - **Sign-in failures** return the same message whether the id is unknown or
//!   the password is wrong, and both paths run a hash verification.
//!
//! ## Session Tokens
//!
//! Tokens are compact `HS256` JWS strings signed with a server-held key. They
//! are not persisted; each request is authorized purely from the token's own
//! signed claims plus the current time. Expiry is the only invalidation.
//!
//! ## Request Gate
//!
//! Protected routes sit behind [`api::handlers::auth::require_token`], which
//! rejects missing, garbled, expired, or foreign tokens with `401` before the
//! handler runs and attaches the resolved [`api::handlers::auth::Principal`]
//! otherwise.

pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }
}
