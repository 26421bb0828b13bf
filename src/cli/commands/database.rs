use clap::{Arg, ArgMatches, Command};
use std::time::Duration;

pub const ARG_MAX_CONNECTIONS: &str = "max-connections";
pub const ARG_STORAGE_TIMEOUT: &str = "storage-timeout";
pub const ARG_SKIP_MIGRATIONS: &str = "skip-migrations";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub max_connections: u32,
    pub storage_timeout: Duration,
    pub skip_migrations: bool,
}

impl Options {
    /// Parse credential store arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the timeout is zero.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let timeout = matches
            .get_one::<u64>(ARG_STORAGE_TIMEOUT)
            .copied()
            .unwrap_or(5);
        if timeout == 0 {
            anyhow::bail!("--{ARG_STORAGE_TIMEOUT} must be at least 1 second");
        }

        Ok(Self {
            max_connections: matches
                .get_one::<u32>(ARG_MAX_CONNECTIONS)
                .copied()
                .unwrap_or(5)
                .max(1),
            storage_timeout: Duration::from_secs(timeout),
            skip_migrations: matches.get_flag(ARG_SKIP_MIGRATIONS),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_MAX_CONNECTIONS)
                .long(ARG_MAX_CONNECTIONS)
                .help("Maximum PostgreSQL pool connections")
                .env("ACCOUNTS_MAX_CONNECTIONS")
                .default_value("5")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new(ARG_STORAGE_TIMEOUT)
                .long(ARG_STORAGE_TIMEOUT)
                .help("Seconds before a credential store call is abandoned")
                .env("ACCOUNTS_STORAGE_TIMEOUT")
                .default_value("5")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new(ARG_SKIP_MIGRATIONS)
                .long(ARG_SKIP_MIGRATIONS)
                .help("Do not create the users schema on startup")
                .env("ACCOUNTS_SKIP_MIGRATIONS")
                .action(clap::ArgAction::SetTrue),
        )
}
