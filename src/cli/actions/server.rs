use crate::{
    api,
    api::handlers::auth::{
        AuthConfig, AuthState, CredentialHasher, CredentialStore, MemoryStore, PgStore, TokenKey,
    },
};
use anyhow::{anyhow, Context, Result};
use secrecy::{ExposeSecret, SecretString};
use sqlx::postgres::PgPoolOptions;
use std::{fs, sync::Arc, time::Duration};
use tracing::{debug, info, warn};
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: Option<String>,
    pub token_secret: Option<SecretString>,
    pub token_secret_path: Option<String>,
    pub token_ttl_seconds: i64,
    pub token_issuer: String,
    pub argon2_memory_kib: u32,
    pub argon2_iterations: u32,
    pub argon2_parallelism: u32,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the signing key is unusable, the store cannot be reached, or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let key = load_token_key(args.token_secret.as_ref(), args.token_secret_path.as_deref())?;

    let hasher = CredentialHasher::with_params(
        args.argon2_memory_kib,
        args.argon2_iterations,
        args.argon2_parallelism,
    )?;

    let store = build_store(args.dsn.as_deref()).await?;

    let auth_config = AuthConfig::new()
        .with_issuer(args.token_issuer)
        .with_token_ttl_seconds(args.token_ttl_seconds);

    debug!("Auth config: {:?}", auth_config);

    let auth_state = Arc::new(AuthState::new(auth_config, store, hasher, key)?);

    api::new(args.port, auth_state).await
}

/// Read the signing key from a file when a path is given, otherwise from the inline secret.
fn load_token_key(secret: Option<&SecretString>, path: Option<&str>) -> Result<TokenKey> {
    let encoded = if let Some(path) = path {
        SecretString::from(
            fs::read_to_string(path)
                .with_context(|| format!("Failed to read token secret file: {path}"))?,
        )
    } else if let Some(secret) = secret {
        secret.clone()
    } else {
        return Err(anyhow!("Session token signing key is required"));
    };

    TokenKey::from_base64(encoded.expose_secret()).context("Invalid session token signing key")
}

async fn build_store(dsn: Option<&str>) -> Result<Arc<dyn CredentialStore>> {
    let Some(dsn) = dsn else {
        warn!("No DSN configured, credentials are kept in memory");
        return Ok(Arc::new(MemoryStore::new()));
    };

    let url = Url::parse(dsn).context("Invalid DSN")?;
    info!(
        "Connecting to database at {}",
        url.host_str().unwrap_or("localhost")
    );

    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(url.as_str())
        .await
        .context("Failed to connect to database")?;

    let store = PgStore::new(pool);
    store.apply_schema().await?;

    Ok(Arc::new(store))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ulid::Ulid;

    // 32 bytes of 0x07, standard base64.
    const KEY_B64: &str = "BwcHBwcHBwcHBwcHBwcHBwcHBwcHBwcHBwcHBwcHBwc=";

    #[test]
    fn load_token_key_from_inline_secret() {
        let secret = SecretString::from(KEY_B64.to_string());
        assert!(load_token_key(Some(&secret), None).is_ok());
    }

    #[test]
    fn load_token_key_prefers_file() -> Result<()> {
        let path = std::env::temp_dir().join(format!("holdem-auth-key-{}", Ulid::new()));
        fs::write(&path, format!("{KEY_B64}\n"))?;

        let bogus = SecretString::from("not base64".to_string());
        let result = load_token_key(Some(&bogus), path.to_str());
        fs::remove_file(&path)?;

        assert!(result.is_ok());
        Ok(())
    }

    #[test]
    fn load_token_key_rejects_short_or_missing_keys() {
        let short = SecretString::from("c2VjcmV0".to_string());
        assert!(load_token_key(Some(&short), None).is_err());
        assert!(load_token_key(None, None).is_err());
        assert!(load_token_key(None, Some("/nonexistent/holdem-auth-key")).is_err());
    }

    #[tokio::test]
    async fn build_store_without_dsn_is_in_memory() -> Result<()> {
        let store = build_store(None).await?;
        store.ping().await?;
        assert!(store.find_by_id("anyone").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn build_store_rejects_invalid_dsn() {
        assert!(build_store(Some("not a dsn")).await.is_err());
    }
}
