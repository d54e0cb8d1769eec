use argon2::Params;
use clap::{Arg, ArgMatches, Command};

pub const ARG_ARGON2_MEMORY_KIB: &str = "argon2-memory-kib";
pub const ARG_ARGON2_ITERATIONS: &str = "argon2-iterations";
pub const ARG_ARGON2_PARALLELISM: &str = "argon2-parallelism";

/// Argon2id cost parameters for credential hashing.
#[derive(Debug, Clone, Copy)]
pub struct Options {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Options {
    #[must_use]
    pub fn parse(matches: &ArgMatches) -> Self {
        let get = |id: &str, default: u32| matches.get_one::<u32>(id).copied().unwrap_or(default);
        Self {
            memory_kib: get(ARG_ARGON2_MEMORY_KIB, Params::DEFAULT_M_COST),
            iterations: get(ARG_ARGON2_ITERATIONS, Params::DEFAULT_T_COST),
            parallelism: get(ARG_ARGON2_PARALLELISM, Params::DEFAULT_P_COST),
        }
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_ARGON2_MEMORY_KIB)
                .long(ARG_ARGON2_MEMORY_KIB)
                .help("Argon2id memory cost in KiB")
                .env("HOLDEM_ARGON2_MEMORY_KIB")
                .default_value("19456")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new(ARG_ARGON2_ITERATIONS)
                .long(ARG_ARGON2_ITERATIONS)
                .help("Argon2id iteration count")
                .env("HOLDEM_ARGON2_ITERATIONS")
                .default_value("2")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new(ARG_ARGON2_PARALLELISM)
                .long(ARG_ARGON2_PARALLELISM)
                .help("Argon2id lanes")
                .env("HOLDEM_ARGON2_PARALLELISM")
                .default_value("1")
                .value_parser(clap::value_parser!(u32)),
        )
}
