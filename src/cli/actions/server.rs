use crate::{
    accounts::{
        AccountService, CredentialHasher, CredentialStore, DirectoryAccess,
        store::{MemoryCredentialStore, PgCredentialStore, PgStoreOptions},
    },
    api,
    cli::telemetry,
};
use anyhow::{Context, Result};
use argon2::Params;
use secrecy::SecretString;
use std::{sync::Arc, time::Duration};
use tracing::{info, warn};
use url::Url;

const MEMORY_SCHEME: &str = "memory";

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub max_connections: u32,
    pub storage_timeout: Duration,
    pub skip_migrations: bool,
    pub hash_params: Params,
    pub page_size: u32,
    pub directory_token: Option<SecretString>,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the store cannot be opened, the hasher cannot be built, or
/// the server fails.
pub async fn execute(args: Args) -> Result<()> {
    info!("Credential store: {}", masked_dsn(&args.dsn));

    let store = open_store(&args).await?;

    let hasher = CredentialHasher::new(args.hash_params)
        .context("Failed to initialize password hasher")?;

    let directory_access = DirectoryAccess::from_token(args.directory_token);
    if directory_access.is_open() {
        warn!("No directory token configured: GET /api/users is open to anyone");
    }

    let service = Arc::new(
        AccountService::new(store, hasher)
            .with_storage_timeout(args.storage_timeout)
            .with_max_page_size(args.page_size)
            .with_directory_access(directory_access),
    );

    let result = api::new(args.port, service.clone()).await;

    service.close().await;
    telemetry::shutdown_tracer();

    result
}

async fn open_store(args: &Args) -> Result<Arc<dyn CredentialStore>> {
    if is_memory_dsn(&args.dsn) {
        warn!("Using the in-memory credential store: users are lost on exit");
        return Ok(Arc::new(MemoryCredentialStore::new()));
    }

    let options = PgStoreOptions::new()
        .with_max_connections(args.max_connections)
        .with_acquire_timeout(args.storage_timeout);

    let store = PgCredentialStore::connect(&args.dsn, options)
        .await
        .context("Failed to connect to database")?;

    if args.skip_migrations {
        info!("Skipping schema migration");
    } else {
        store
            .migrate()
            .await
            .context("Failed to apply users schema")?;
    }

    Ok(Arc::new(store))
}

fn is_memory_dsn(dsn: &str) -> bool {
    Url::parse(dsn).is_ok_and(|url| url.scheme() == MEMORY_SCHEME)
}

/// DSN safe for logs: the password, if any, is replaced.
fn masked_dsn(dsn: &str) -> String {
    match Url::parse(dsn) {
        Ok(mut url) => {
            if url.password().is_some() && url.set_password(Some("***")).is_err() {
                return "<unprintable dsn>".to_string();
            }
            url.to_string()
        }
        Err(_) => "<unparseable dsn>".to_string(),
    }
}
