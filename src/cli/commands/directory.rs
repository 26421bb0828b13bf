use crate::accounts::DEFAULT_PAGE_SIZE;
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_PAGE_SIZE: &str = "page-size";
pub const ARG_DIRECTORY_TOKEN: &str = "directory-token";

#[derive(Debug)]
pub struct Options {
    pub page_size: u32,
    pub token: Option<SecretString>,
}

impl Options {
    /// Parse directory arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the page size is zero.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let page_size = matches
            .get_one::<u32>(ARG_PAGE_SIZE)
            .copied()
            .unwrap_or(DEFAULT_PAGE_SIZE);
        if page_size == 0 {
            anyhow::bail!("--{ARG_PAGE_SIZE} must be at least 1");
        }

        // clap passes empty env values through
        let token = matches
            .get_one::<String>(ARG_DIRECTORY_TOKEN)
            .filter(|token| !token.trim().is_empty())
            .map(|token| SecretString::from(token.clone()));

        Ok(Self { page_size, token })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_PAGE_SIZE)
                .long(ARG_PAGE_SIZE)
                .help("Maximum number of users returned by one directory request")
                .env("ACCOUNTS_PAGE_SIZE")
                .default_value("100")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new(ARG_DIRECTORY_TOKEN)
                .long(ARG_DIRECTORY_TOKEN)
                .help("Bearer token required to list users (open when unset)")
                .env("ACCOUNTS_DIRECTORY_TOKEN")
                .hide_env_values(true),
        )
}
