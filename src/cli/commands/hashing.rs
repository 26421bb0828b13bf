use crate::accounts::password;
use argon2::Params;
use clap::{Arg, ArgMatches, Command};

pub const ARG_HASH_MEMORY_KIB: &str = "hash-memory-kib";
pub const ARG_HASH_ITERATIONS: &str = "hash-iterations";
pub const ARG_HASH_PARALLELISM: &str = "hash-parallelism";

pub struct Options {
    pub params: Params,
}

impl Options {
    /// Parse Argon2 cost arguments from matches.
    ///
    /// # Errors
    /// Returns an error if argon2 rejects the combination.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let get = |id: &str, default: u32| matches.get_one::<u32>(id).copied().unwrap_or(default);

        let params = password::params(
            get(ARG_HASH_MEMORY_KIB, Params::DEFAULT_M_COST),
            get(ARG_HASH_ITERATIONS, Params::DEFAULT_T_COST),
            get(ARG_HASH_PARALLELISM, Params::DEFAULT_P_COST),
        )?;

        Ok(Self { params })
    }
}

// Defaults mirror argon2::Params::DEFAULT_{M,T,P}_COST.
#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_HASH_MEMORY_KIB)
                .long(ARG_HASH_MEMORY_KIB)
                .help("Argon2id memory cost in KiB")
                .env("ACCOUNTS_HASH_MEMORY_KIB")
                .default_value("19456")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new(ARG_HASH_ITERATIONS)
                .long(ARG_HASH_ITERATIONS)
                .help("Argon2id iterations")
                .env("ACCOUNTS_HASH_ITERATIONS")
                .default_value("2")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new(ARG_HASH_PARALLELISM)
                .long(ARG_HASH_PARALLELISM)
                .help("Argon2id lanes")
                .env("ACCOUNTS_HASH_PARALLELISM")
                .default_value("1")
                .value_parser(clap::value_parser!(u32)),
        )
}
