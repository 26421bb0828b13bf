//! Maps parsed CLI arguments to an [`Action`].

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::{ARG_DSN, ARG_PORT, database, directory, hashing};
use anyhow::{Context, Result};

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(10000);
    let dsn = matches
        .get_one::<String>(ARG_DSN)
        .cloned()
        .filter(|dsn| !dsn.trim().is_empty())
        .context("missing required argument: --dsn")?;

    let database_opts = database::Options::parse(matches)?;
    let hashing_opts = hashing::Options::parse(matches)?;
    let directory_opts = directory::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        dsn,
        max_connections: database_opts.max_connections,
        storage_timeout: database_opts.storage_timeout,
        skip_migrations: database_opts.skip_migrations,
        hash_params: hashing_opts.params,
        page_size: directory_opts.page_size,
        directory_token: directory_opts.token,
    }))
}
