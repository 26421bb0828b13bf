//! User directory listing and who may read it.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::fmt;
use subtle::ConstantTimeEq;
use tracing::instrument;
use utoipa::IntoParams;

use super::{AccountService, error::AccountError, model::UserView};

/// Access policy for the directory.
pub enum DirectoryAccess {
    /// No check. Only for internal or debugging deployments.
    Open,
    /// Callers must present this bearer token.
    Bearer(SecretString),
}

impl DirectoryAccess {
    /// `Bearer` for a non-empty token, `Open` otherwise.
    #[must_use]
    pub fn from_token(token: Option<SecretString>) -> Self {
        match token {
            Some(token) if !token.expose_secret().trim().is_empty() => Self::Bearer(token),
            _ => Self::Open,
        }
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }

    /// Compare the presented token without leaking where it differs. Both sides are
    /// hashed first so lengths do not leak either.
    #[must_use]
    pub fn authorize(&self, presented: Option<&str>) -> bool {
        match self {
            Self::Open => true,
            Self::Bearer(expected) => presented.is_some_and(|token| {
                let expected = Sha256::digest(expected.expose_secret().as_bytes());
                let presented = Sha256::digest(token.as_bytes());
                expected.as_slice().ct_eq(presented.as_slice()).into()
            }),
        }
    }
}

impl fmt::Debug for DirectoryAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => f.write_str("Open"),
            Self::Bearer(_) => f.write_str("Bearer(***)"),
        }
    }
}

#[derive(Deserialize, IntoParams, Debug, Default, Clone, Copy)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// Page size, clamped to the configured maximum.
    pub limit: Option<u32>,
    /// Number of users to skip.
    pub offset: Option<u64>,
}

impl AccountService {
    /// List users in insertion order, sanitized. Authorization is checked by the
    /// caller through [`DirectoryAccess::authorize`].
    ///
    /// # Errors
    /// Returns a storage error if the store fails or times out.
    #[instrument(skip(self))]
    pub async fn list_users(&self, page: PageQuery) -> Result<Vec<UserView>, AccountError> {
        let limit = page
            .limit
            .unwrap_or(self.max_page_size)
            .clamp(1, self.max_page_size);
        let offset = page.offset.unwrap_or(0);

        let records = self.bounded(self.store.list(limit, offset)).await?;

        Ok(records.iter().map(UserView::from).collect())
    }
}
