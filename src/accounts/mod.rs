//! Account workflows: registration, authentication and the user directory.
//!
//! [`AccountService`] is the one object the HTTP layer talks to. It owns the
//! credential store and the password hasher, applies the storage timeout to every
//! store call, and decides who may read the directory. It is built once at startup,
//! shared behind an `Arc`, and closed when the server stops.

pub mod authentication;
pub mod directory;
pub mod error;
pub mod model;
pub mod password;
pub mod registration;
pub mod store;

use std::{future::Future, sync::Arc, time::Duration};

pub use self::{
    authentication::LoginRequest,
    directory::{DirectoryAccess, PageQuery},
    error::{AccountError, FieldError},
    model::{IdentityField, InputField, UserRecord, UserView},
    password::{CredentialHash, CredentialHasher},
    registration::RegistrationRequest,
    store::{CredentialStore, StoreError},
};

pub const DEFAULT_STORAGE_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_PAGE_SIZE: u32 = 100;

pub struct AccountService {
    store: Arc<dyn CredentialStore>,
    hasher: CredentialHasher,
    storage_timeout: Duration,
    max_page_size: u32,
    directory_access: DirectoryAccess,
}

impl std::fmt::Debug for AccountService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountService")
            .field("hasher", &self.hasher)
            .field("storage_timeout", &self.storage_timeout)
            .field("max_page_size", &self.max_page_size)
            .field("directory_access", &self.directory_access)
            .finish_non_exhaustive()
    }
}

impl AccountService {
    #[must_use]
    pub fn new(store: Arc<dyn CredentialStore>, hasher: CredentialHasher) -> Self {
        Self {
            store,
            hasher,
            storage_timeout: DEFAULT_STORAGE_TIMEOUT,
            max_page_size: DEFAULT_PAGE_SIZE,
            directory_access: DirectoryAccess::Open,
        }
    }

    #[must_use]
    pub fn with_storage_timeout(mut self, timeout: Duration) -> Self {
        self.storage_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_max_page_size(mut self, max_page_size: u32) -> Self {
        self.max_page_size = max_page_size.max(1);
        self
    }

    #[must_use]
    pub fn with_directory_access(mut self, access: DirectoryAccess) -> Self {
        self.directory_access = access;
        self
    }

    #[must_use]
    pub fn storage_timeout(&self) -> Duration {
        self.storage_timeout
    }

    #[must_use]
    pub fn max_page_size(&self) -> u32 {
        self.max_page_size
    }

    #[must_use]
    pub fn directory_access(&self) -> &DirectoryAccess {
        &self.directory_access
    }

    /// Check store reachability, bounded by the storage timeout.
    ///
    /// # Errors
    /// Returns the store error or [`StoreError::Timeout`].
    pub async fn ping(&self) -> Result<(), StoreError> {
        self.bounded(self.store.ping()).await
    }

    /// Close the store's connections.
    pub async fn close(&self) {
        self.store.close().await;
    }

    async fn bounded<T, F>(&self, call: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        tokio::time::timeout(self.storage_timeout, call)
            .await
            .map_err(|_| StoreError::Timeout(self.storage_timeout))?
    }
}
