//! Credential store: persistence of user records with identity uniqueness.
//!
//! Uniqueness is the store's job, not the caller's. [`CredentialStore::create`]
//! must report [`StoreError::Conflict`] when the email or phone already exists,
//! even when two inserts race. The Postgres store relies on unique indexes for
//! that; the memory store serializes inserts behind one lock and is only suitable
//! for a single process.

mod memory;
mod postgres;

pub use memory::MemoryCredentialStore;
pub use postgres::{PgCredentialStore, PgStoreOptions};

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use super::model::{IdentityField, NewUser, UserRecord};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} already registered")]
    Conflict(IdentityField),
    #[error("storage call timed out after {0:?}")]
    Timeout(Duration),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up by already-normalized email.
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Look up by already-normalized phone.
    async fn find_by_phone(&self, phone: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Insert a user, atomically rejecting duplicate identities. When both the email
    /// and the phone are taken, the email conflict is reported.
    async fn create(&self, user: NewUser) -> Result<UserRecord, StoreError>;

    /// Page through users in insertion order.
    async fn list(&self, limit: u32, offset: u64) -> Result<Vec<UserRecord>, StoreError>;

    /// Cheap reachability check for `/health`.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Release pooled resources.
    async fn close(&self) {}
}
