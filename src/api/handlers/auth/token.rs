//! Stateless session tokens (`HS256` JWS).
//!
//! A token is `base64url(header).base64url(claims).base64url(mac)` where the
//! MAC is HMAC-SHA256 over the first two segments, keyed with the server-held
//! [`TokenKey`]. Nothing is stored server-side: validation only needs the key
//! and the current time.

use base64ct::{Base64, Base64UrlUnpadded, Encoding};
use hmac::{Hmac, Mac};
use rand::{rngs::OsRng, RngCore};
use secrecy::{ExposeSecret, SecretSlice};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::Arc;
use thiserror::Error;
use ulid::Ulid;

pub const TOKEN_VERSION: u8 = 1;
pub const MIN_KEY_LENGTH: usize = 32;
const ALGORITHM: &str = "HS256";

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("invalid token format")]
    TokenFormat,
    #[error("invalid base64url encoding")]
    Base64,
    #[error("invalid json")]
    Json(#[from] serde_json::Error),
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlg(String),
    #[error("invalid signature")]
    InvalidSignature,
    #[error("invalid token version")]
    InvalidVersion,
    #[error("invalid issuer")]
    InvalidIssuer,
    #[error("invalid issued-at")]
    InvalidIat,
    #[error("token expired")]
    Expired,
    #[error("signing key must be at least {MIN_KEY_LENGTH} bytes")]
    KeyTooShort,
    #[error("signing key is not valid base64")]
    KeyEncoding,
    #[error("token ttl must be positive")]
    InvalidTtl,
}

/// Server-held signing material. Loaded once at startup, never mutated.
pub struct TokenKey(SecretSlice<u8>);

impl TokenKey {
    /// # Errors
    /// Returns [`TokenError::KeyTooShort`] for keys under [`MIN_KEY_LENGTH`] bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, TokenError> {
        if bytes.len() < MIN_KEY_LENGTH {
            return Err(TokenError::KeyTooShort);
        }
        Ok(Self(SecretSlice::from(bytes)))
    }

    /// Decode a standard (padded) base64 key.
    ///
    /// # Errors
    /// Returns an error if the value is not base64 or decodes to a short key.
    pub fn from_base64(encoded: &str) -> Result<Self, TokenError> {
        let bytes = Base64::decode_vec(encoded.trim()).map_err(|_| TokenError::KeyEncoding)?;
        Self::from_bytes(bytes)
    }

    /// Random 32-byte key. The server always loads a configured key; this is for tests.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = vec![0u8; MIN_KEY_LENGTH];
        OsRng.fill_bytes(&mut bytes);
        Self(SecretSlice::from(bytes))
    }

    fn mac(&self) -> Result<HmacSha256, TokenError> {
        HmacSha256::new_from_slice(self.0.expose_secret()).map_err(|_| TokenError::KeyTooShort)
    }
}

impl std::fmt::Debug for TokenKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TokenKey(***)")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionTokenHeader {
    pub alg: String,
    pub typ: String,
}

impl SessionTokenHeader {
    fn hs256() -> Self {
        Self {
            alg: ALGORITHM.to_string(),
            typ: "JWT".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaims {
    pub v: u8,
    pub iss: String,
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

/// A freshly minted token plus its claims, readable by the caller.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub subject: String,
    pub issued_at: i64,
    pub expires_at: i64,
}

fn b64e_json<T: Serialize>(value: &T) -> Result<String, TokenError> {
    let json = serde_json::to_vec(value)?;
    Ok(Base64UrlUnpadded::encode_string(&json))
}

fn b64d_json<T: for<'de> Deserialize<'de>>(s: &str) -> Result<T, TokenError> {
    let bytes = Base64UrlUnpadded::decode_vec(s).map_err(|_| TokenError::Base64)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Mints tokens. Each call is a pure function of subject, time, and key (plus a random `jti`).
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    key: Arc<TokenKey>,
    issuer: String,
    ttl_seconds: i64,
}

impl TokenIssuer {
    /// # Errors
    /// Returns [`TokenError::InvalidTtl`] when `ttl_seconds` is not positive.
    pub fn new(key: Arc<TokenKey>, issuer: String, ttl_seconds: i64) -> Result<Self, TokenError> {
        if ttl_seconds <= 0 {
            return Err(TokenError::InvalidTtl);
        }
        Ok(Self {
            key,
            issuer,
            ttl_seconds,
        })
    }

    #[must_use]
    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }

    /// Sign a token for `subject`, valid from `now_unix_seconds` for the configured TTL.
    ///
    /// # Errors
    /// Returns an error if the header or claims cannot be encoded.
    pub fn issue(&self, subject: &str, now_unix_seconds: i64) -> Result<IssuedToken, TokenError> {
        let claims = SessionClaims {
            v: TOKEN_VERSION,
            iss: self.issuer.clone(),
            sub: subject.to_string(),
            iat: now_unix_seconds,
            exp: now_unix_seconds.saturating_add(self.ttl_seconds),
            jti: Ulid::new().to_string(),
        };
        let token = sign_hs256(&self.key, &claims)?;
        Ok(IssuedToken {
            token,
            subject: claims.sub,
            issued_at: claims.iat,
            expires_at: claims.exp,
        })
    }
}

/// Verifies tokens minted by a [`TokenIssuer`] sharing the same key and issuer.
#[derive(Debug, Clone)]
pub struct TokenValidator {
    key: Arc<TokenKey>,
    issuer: String,
}

impl TokenValidator {
    #[must_use]
    pub fn new(key: Arc<TokenKey>, issuer: String) -> Self {
        Self { key, issuer }
    }

    /// Verify the signature and claims of `token` at `now_unix_seconds`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - the token is malformed or contains invalid base64/json,
    /// - the algorithm is anything but `HS256`,
    /// - the signature does not verify against the key,
    /// - the claims fail validation (`v`, `iss`, `iat`, `exp`).
    pub fn validate(&self, token: &str, now_unix_seconds: i64) -> Result<SessionClaims, TokenError> {
        let mut parts = token.split('.');
        let header_b64 = parts.next().ok_or(TokenError::TokenFormat)?;
        let claims_b64 = parts.next().ok_or(TokenError::TokenFormat)?;
        let sig_b64 = parts.next().ok_or(TokenError::TokenFormat)?;
        if parts.next().is_some() {
            return Err(TokenError::TokenFormat);
        }

        let header: SessionTokenHeader = b64d_json(header_b64)?;
        if header.alg != ALGORITHM {
            return Err(TokenError::UnsupportedAlg(header.alg));
        }

        let signature = Base64UrlUnpadded::decode_vec(sig_b64).map_err(|_| TokenError::Base64)?;
        let mut mac = self.key.mac()?;
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(claims_b64.as_bytes());
        // Constant-time comparison.
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::InvalidSignature)?;

        let claims: SessionClaims = b64d_json(claims_b64)?;
        if claims.v != TOKEN_VERSION {
            return Err(TokenError::InvalidVersion);
        }
        if claims.iss != self.issuer {
            return Err(TokenError::InvalidIssuer);
        }
        if claims.iat > claims.exp {
            return Err(TokenError::InvalidIat);
        }
        if claims.exp <= now_unix_seconds {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

fn sign_hs256(key: &TokenKey, claims: &SessionClaims) -> Result<String, TokenError> {
    let header_b64 = b64e_json(&SessionTokenHeader::hs256())?;
    let claims_b64 = b64e_json(claims)?;
    let signing_input = format!("{header_b64}.{claims_b64}");

    let mut mac = key.mac()?;
    mac.update(signing_input.as_bytes());
    let signature_b64 = Base64UrlUnpadded::encode_string(&mac.finalize().into_bytes());

    Ok(format!("{signing_input}.{signature_b64}"))
}
