//! Signup: validate, normalize, hash, insert.
//!
//! Validation never touches the store or the hasher. Uniqueness is left entirely
//! to [`CredentialStore::create`](super::CredentialStore::create), so there is no
//! find-then-insert window for concurrent signups to slip through.

use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{
    AccountService,
    error::{AccountError, FieldError},
    model::{InputField, NewUser, UserView, normalize_email, normalize_phone},
};

pub const PHONE_MIN_LEN: usize = 10;
pub const PASSWORD_MIN_LEN: usize = 6;
pub const PASSWORD_MAX_LEN: usize = 1024;

/// Signup payload. Fields are judged one by one: a missing field or one of the
/// wrong JSON type is reported like any other invalid one.
#[derive(ToSchema, Deserialize, Debug, Default)]
#[serde(default)]
pub struct RegistrationRequest {
    #[schema(value_type = Option<String>, default = json!(null))]
    pub name: InputField<String>,
    #[schema(value_type = Option<String>, default = json!(null))]
    pub email: InputField<String>,
    #[schema(value_type = Option<String>, default = json!(null))]
    pub phone: InputField<String>,
    #[schema(value_type = Option<String>, format = Password, default = json!(null))]
    pub password: InputField<SecretString>,
}

#[derive(Debug)]
struct ValidRegistration {
    name: String,
    email: String,
    phone: String,
    password: SecretString,
}

/// Lightweight email sanity check on already-normalized input.
#[must_use]
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

fn validate(request: RegistrationRequest) -> Result<ValidRegistration, Vec<FieldError>> {
    let mut errors = Vec::new();

    let name = request.name.value().map_or("", |name| name.trim());
    if request.name.is_invalid() {
        errors.push(FieldError::new("name", "Name must be a string"));
    } else if name.is_empty() {
        errors.push(FieldError::new("name", "Name is required"));
    }

    let email = request
        .email
        .value()
        .map(String::as_str)
        .map(normalize_email)
        .unwrap_or_default();
    if request.email.is_invalid() {
        errors.push(FieldError::new("email", "Email must be a string"));
    } else if !valid_email(&email) {
        errors.push(FieldError::new("email", "Valid email is required"));
    }

    let phone = request
        .phone
        .value()
        .map(String::as_str)
        .map(normalize_phone)
        .unwrap_or_default();
    if request.phone.is_invalid() {
        errors.push(FieldError::new("phone", "Phone must be a string"));
    } else if phone.is_empty() {
        errors.push(FieldError::new("phone", "Phone is required"));
    } else if phone.chars().count() < PHONE_MIN_LEN {
        errors.push(FieldError::new(
            "phone",
            "Phone should be at least 10 digits",
        ));
    }

    let password_len = request
        .password
        .value()
        .map_or(0, |password| password.expose_secret().chars().count());
    if request.password.is_invalid() {
        errors.push(FieldError::new("password", "Password must be a string"));
    } else if password_len < PASSWORD_MIN_LEN {
        errors.push(FieldError::new("password", "Password min 6 chars"));
    } else if password_len > PASSWORD_MAX_LEN {
        errors.push(FieldError::new("password", "Password max 1024 chars"));
    }

    match request.password.into_value() {
        Some(password) if errors.is_empty() => Ok(ValidRegistration {
            name: name.to_string(),
            email,
            phone,
            password,
        }),
        _ => Err(errors),
    }
}

impl AccountService {
    /// Register a new user and return its sanitized view.
    ///
    /// # Errors
    /// [`AccountError::Validation`] for bad input, [`AccountError::Conflict`] when the
    /// email (checked first) or phone is taken, storage/internal errors otherwise.
    #[instrument(skip(self, request))]
    pub async fn register(&self, request: RegistrationRequest) -> Result<UserView, AccountError> {
        let valid = validate(request).map_err(|errors| {
            debug!("Registration rejected: {} invalid field(s)", errors.len());
            AccountError::Validation(errors)
        })?;

        let credential_hash = self.hasher.hash(valid.password).await?;

        let record = self
            .bounded(self.store.create(NewUser {
                id: Uuid::now_v7(),
                name: valid.name,
                email: valid.email,
                phone: valid.phone,
                credential_hash,
            }))
            .await?;

        info!(user_id = %record.id, "User registered");

        Ok(UserView::from(record))
    }
}
