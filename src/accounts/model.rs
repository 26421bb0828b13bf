//! User records and the sanitized view that leaves the service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

use super::password::CredentialHash;

/// Identity fields that must be unique across all users.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityField {
    Email,
    Phone,
}

impl IdentityField {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Phone => "phone",
        }
    }
}

impl fmt::Display for IdentityField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted user. Holds the credential hash, so it is never serialized directly;
/// use [`UserView`] for anything that leaves the process.
#[derive(Clone)]
pub struct UserRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub credential_hash: CredentialHash,
    pub created_at: DateTime<Utc>,
}

impl fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("phone", &self.phone)
            .field("credential_hash", &"***")
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Candidate record handed to the store. Email and phone are already normalized
/// and the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub credential_hash: CredentialHash,
}

/// Sanitized user as returned by every endpoint.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
}

impl From<&UserRecord> for UserView {
    fn from(record: &UserRecord) -> Self {
        Self {
            id: record.id.to_string(),
            name: record.name.clone(),
            email: record.email.clone(),
            phone: record.phone.clone(),
            created_at: record.created_at,
        }
    }
}

impl From<UserRecord> for UserView {
    fn from(record: UserRecord) -> Self {
        Self::from(&record)
    }
}

/// One field of a JSON request body, judged on its own. A value of the wrong JSON
/// type becomes [`InputField::Invalid`] instead of failing the whole body, and the
/// offending value is dropped without being kept or echoed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputField<T> {
    Missing,
    Value(T),
    Invalid,
}

impl<T> InputField<T> {
    #[must_use]
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Value(value) => Some(value),
            Self::Missing | Self::Invalid => None,
        }
    }

    #[must_use]
    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Value(value) => Some(value),
            Self::Missing | Self::Invalid => None,
        }
    }

    #[must_use]
    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid)
    }
}

impl<T> Default for InputField<T> {
    fn default() -> Self {
        Self::Missing
    }
}

impl<T> From<Option<T>> for InputField<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Missing, Self::Value)
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for InputField<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        if raw.is_null() {
            return Ok(Self::Missing);
        }
        Ok(T::deserialize(raw).map_or(Self::Invalid, Self::Value))
    }
}

/// Trim and lowercase an email for lookups and uniqueness checks.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Phones are compared exactly after trimming.
#[must_use]
pub fn normalize_phone(phone: &str) -> String {
    phone.trim().to_string()
}
