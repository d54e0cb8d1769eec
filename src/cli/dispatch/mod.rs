//! Command-line argument dispatch.
//!
//! Maps parsed CLI matches to the action the binary runs, currently only the
//! API server with its token, hashing, and store configuration.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{hashing, token};
use anyhow::Result;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .filter(|v| !v.trim().is_empty());

    let token_opts = token::Options::parse(matches)?;
    let hashing_opts = hashing::Options::parse(matches);

    Ok(Action::Server(Args {
        port,
        dsn,
        token_secret: token_opts.secret,
        token_secret_path: token_opts.secret_path,
        token_ttl_seconds: token_opts.ttl_seconds,
        token_issuer: token_opts.issuer,
        argon2_memory_kib: hashing_opts.memory_kib,
        argon2_iterations: hashing_opts.iterations,
        argon2_parallelism: hashing_opts.parallelism,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_secret_required() {
        temp_env::with_vars(
            [
                ("HOLDEM_TOKEN_SECRET", None::<&str>),
                ("HOLDEM_TOKEN_SECRET_PATH", None::<&str>),
                ("HOLDEM_DSN", None::<&str>),
            ],
            || {
                let command = crate::cli::commands::new();
                let matches = command.get_matches_from(vec!["holdem-auth"]);
                let result = handler(&matches);
                assert!(result.is_err());
                if let Err(err) = result {
                    assert!(err
                        .to_string()
                        .contains("missing required argument: --token-secret"));
                }
            },
        );
    }

    #[test]
    fn server_args_from_env() {
        temp_env::with_vars(
            [
                ("HOLDEM_PORT", Some("9000")),
                ("HOLDEM_DSN", Some("")),
                ("HOLDEM_TOKEN_SECRET", Some("c2VjcmV0")),
                ("HOLDEM_TOKEN_SECRET_PATH", None),
                ("HOLDEM_TOKEN_TTL_SECONDS", Some("3600")),
                ("HOLDEM_TOKEN_ISSUER", None),
            ],
            || {
                let command = crate::cli::commands::new();
                let matches = command.get_matches_from(vec!["holdem-auth"]);
                let result = handler(&matches);
                assert!(result.is_ok());
                if let Ok(Action::Server(args)) = result {
                    assert_eq!(args.port, 9000);
                    assert!(args.dsn.is_none(), "empty DSN selects the memory store");
                    assert!(args.token_secret.is_some());
                    assert_eq!(args.token_ttl_seconds, 3600);
                    assert_eq!(args.token_issuer, "holdem-auth");
                }
            },
        );
    }
}
