use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use super::{model::IdentityField, password::HashError, store::StoreError};

/// One rejected input field.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    #[must_use]
    pub fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

/// Everything a workflow can fail with. Storage and internal variants carry detail
/// for the server log only; responses use a fixed message.
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("validation failed")]
    Validation(Vec<FieldError>),
    #[error("Email and password required")]
    MissingCredentials,
    #[error("{} already registered", capitalized(.0))]
    Conflict(IdentityField),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("storage failure: {0}")]
    Storage(StoreError),
    #[error("internal failure: {0}")]
    Internal(String),
}

impl From<StoreError> for AccountError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(field) => Self::Conflict(field),
            other => Self::Storage(other),
        }
    }
}

impl From<HashError> for AccountError {
    fn from(err: HashError) -> Self {
        Self::Internal(err.to_string())
    }
}

fn capitalized(field: &IdentityField) -> &'static str {
    match field {
        IdentityField::Email => "Email",
        IdentityField::Phone => "Phone",
    }
}
