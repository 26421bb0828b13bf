//! Password hashing boundary.
//!
//! Raw passwords only ever exist as [`SecretString`] values on their way into this
//! module. What comes out is a [`CredentialHash`]: an Argon2id PHC string with a
//! per-call random salt embedded in it. Verification parses the stored PHC string
//! and lets `argon2` compare digests in constant time. Anything that cannot be
//! parsed fails closed.
//!
//! Argon2 is deliberately expensive, so the async entry points run on tokio's
//! blocking pool instead of the request executor.

use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::{SaltString, rand_core::OsRng},
};
use rand::{Rng, distributions::Alphanumeric};
use secrecy::{ExposeSecret, SecretString};
use std::{fmt, sync::Arc};
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum HashError {
    #[error("invalid argon2 parameters: {0}")]
    Params(String),
    #[error("failed to hash password: {0}")]
    Hash(String),
    #[error("hashing task failed: {0}")]
    Task(String),
}

/// Stored form of a credential. Not serializable, and redacted in `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialHash(String);

impl CredentialHash {
    /// Wrap a PHC string loaded from storage. No validation happens here; a
    /// corrupted value simply never verifies.
    #[must_use]
    pub fn from_stored(phc: impl Into<String>) -> Self {
        Self(phc.into())
    }

    /// PHC string for persistence.
    #[must_use]
    pub fn as_phc(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for CredentialHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CredentialHash(***)")
    }
}

/// Build Argon2 parameters from operator settings.
///
/// # Errors
/// Returns an error if the combination is rejected by `argon2`.
pub fn params(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Params, HashError> {
    Params::new(memory_kib, iterations, parallelism, None)
        .map_err(|err| HashError::Params(err.to_string()))
}

#[derive(Clone)]
pub struct CredentialHasher {
    inner: Arc<Inner>,
}

struct Inner {
    argon2: Argon2<'static>,
    // Verified against when the email is unknown, so both login failures cost the same.
    dummy: CredentialHash,
}

impl fmt::Debug for CredentialHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialHasher")
            .field("params", self.inner.argon2.params())
            .finish_non_exhaustive()
    }
}

impl CredentialHasher {
    /// Create an Argon2id hasher. Computes the dummy hash up front, so this blocks
    /// for one hash.
    ///
    /// # Errors
    /// Returns an error if the dummy hash cannot be produced.
    pub fn new(params: Params) -> Result<Self, HashError> {
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let filler: String = OsRng
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();
        let dummy = hash_with(&argon2, filler.as_bytes())?;

        Ok(Self {
            inner: Arc::new(Inner { argon2, dummy }),
        })
    }

    /// Hash on the current thread.
    ///
    /// # Errors
    /// Returns an error if argon2 rejects the input.
    pub fn hash_blocking(&self, password: &SecretString) -> Result<CredentialHash, HashError> {
        hash_with(&self.inner.argon2, password.expose_secret().as_bytes())
    }

    /// Verify on the current thread. Malformed hashes return `false`.
    #[must_use]
    pub fn verify_blocking(&self, password: &SecretString, hash: &CredentialHash) -> bool {
        let parsed = match PasswordHash::new(hash.as_phc()) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!("Stored credential hash is unreadable: {err}");
                return false;
            }
        };

        self.inner
            .argon2
            .verify_password(password.expose_secret().as_bytes(), &parsed)
            .is_ok()
    }

    /// Hash on the blocking pool.
    ///
    /// # Errors
    /// Returns an error if hashing fails or the blocking task panics.
    pub async fn hash(&self, password: SecretString) -> Result<CredentialHash, HashError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash_blocking(&password))
            .await
            .map_err(|err| HashError::Task(err.to_string()))?
    }

    /// Verify on the blocking pool. A failed task counts as a failed verification.
    pub async fn verify(&self, password: SecretString, hash: CredentialHash) -> bool {
        let hasher = self.clone();
        match tokio::task::spawn_blocking(move || hasher.verify_blocking(&password, &hash)).await {
            Ok(valid) => valid,
            Err(err) => {
                error!("Credential verification task failed: {err}");
                false
            }
        }
    }

    /// Spend the cost of one verification without a real target. Always `false`.
    pub async fn verify_dummy(&self, password: SecretString) -> bool {
        let dummy = self.inner.dummy.clone();
        let _ = self.verify(password, dummy).await;
        false
    }
}

fn hash_with(argon2: &Argon2<'_>, password: &[u8]) -> Result<CredentialHash, HashError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = argon2
        .hash_password(password, &salt)
        .map_err(|err| HashError::Hash(err.to_string()))?
        .to_string();
    Ok(CredentialHash(hash))
}
