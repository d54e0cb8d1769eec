use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

use crate::api::handlers::auth::{DEFAULT_TOKEN_ISSUER, DEFAULT_TOKEN_TTL_SECONDS};

pub const ARG_TOKEN_SECRET: &str = "token-secret";
pub const ARG_TOKEN_SECRET_PATH: &str = "token-secret-path";
pub const ARG_TOKEN_TTL_SECONDS: &str = "token-ttl-seconds";
pub const ARG_TOKEN_ISSUER: &str = "token-issuer";

#[derive(Debug, Clone)]
pub struct Options {
    pub secret: Option<SecretString>,
    pub secret_path: Option<String>,
    pub ttl_seconds: i64,
    pub issuer: String,
}

impl Options {
    /// Parse session token arguments from matches.
    ///
    /// # Errors
    /// Returns an error if neither a secret nor a secret path is provided, or the TTL is not positive.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let get_non_empty = |id: &str| {
            matches
                .get_one::<String>(id)
                .cloned()
                .filter(|v| !v.trim().is_empty())
        };

        let secret = get_non_empty(ARG_TOKEN_SECRET).map(SecretString::from);
        let secret_path = get_non_empty(ARG_TOKEN_SECRET_PATH);
        if secret.is_none() && secret_path.is_none() {
            anyhow::bail!(
                "missing required argument: --{ARG_TOKEN_SECRET} or --{ARG_TOKEN_SECRET_PATH}"
            );
        }

        let ttl_seconds = matches
            .get_one::<i64>(ARG_TOKEN_TTL_SECONDS)
            .copied()
            .unwrap_or(DEFAULT_TOKEN_TTL_SECONDS);
        if ttl_seconds <= 0 {
            anyhow::bail!("--{ARG_TOKEN_TTL_SECONDS} must be positive");
        }

        Ok(Self {
            secret,
            secret_path,
            ttl_seconds,
            issuer: get_non_empty(ARG_TOKEN_ISSUER)
                .unwrap_or_else(|| DEFAULT_TOKEN_ISSUER.to_string()),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_TOKEN_SECRET)
                .long(ARG_TOKEN_SECRET)
                .help("Base64-encoded session token signing key (at least 32 bytes)")
                .long_help(
                    "Base64-encoded HS256 signing key for session tokens, at least 32 bytes once decoded.\n\nChanging it invalidates every token issued with the previous key.",
                )
                .env("HOLDEM_TOKEN_SECRET")
                .hide_env_values(true)
                .conflicts_with(ARG_TOKEN_SECRET_PATH),
        )
        .arg(
            Arg::new(ARG_TOKEN_SECRET_PATH)
                .long(ARG_TOKEN_SECRET_PATH)
                .help("Path to a file holding the base64-encoded signing key")
                .env("HOLDEM_TOKEN_SECRET_PATH"),
        )
        .arg(
            Arg::new(ARG_TOKEN_TTL_SECONDS)
                .long(ARG_TOKEN_TTL_SECONDS)
                .help("Session token TTL in seconds")
                .env("HOLDEM_TOKEN_TTL_SECONDS")
                .default_value("86400")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_TOKEN_ISSUER)
                .long(ARG_TOKEN_ISSUER)
                .help("Issuer (iss) written into and required from session tokens")
                .env("HOLDEM_TOKEN_ISSUER")
                .default_value(DEFAULT_TOKEN_ISSUER),
        )
}
