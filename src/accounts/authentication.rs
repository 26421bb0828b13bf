//! Login: look up by email, verify the password, return the sanitized user.
//!
//! An unknown email and a wrong password produce the same error and cost one
//! Argon2 verification each.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, instrument};
use utoipa::ToSchema;

use super::{
    AccountService,
    error::AccountError,
    model::{InputField, UserView, normalize_email},
};

/// Login payload. A field of the wrong JSON type counts as missing.
#[derive(ToSchema, Deserialize, Debug, Default)]
#[serde(default)]
pub struct LoginRequest {
    #[schema(value_type = Option<String>, default = json!(null))]
    pub email: InputField<String>,
    #[schema(value_type = Option<String>, format = Password, default = json!(null))]
    pub password: InputField<SecretString>,
}

impl AccountService {
    /// Check credentials. No session is created.
    ///
    /// # Errors
    /// [`AccountError::MissingCredentials`] when either field is absent or empty,
    /// [`AccountError::InvalidCredentials`] for unknown email or wrong password,
    /// storage errors otherwise.
    #[instrument(skip(self, request))]
    pub async fn authenticate(&self, request: LoginRequest) -> Result<UserView, AccountError> {
        let (email, password) = match (request.email.into_value(), request.password.into_value()) {
            (Some(email), Some(password))
                if !email.trim().is_empty() && !password.expose_secret().is_empty() =>
            {
                (normalize_email(&email), password)
            }
            _ => return Err(AccountError::MissingCredentials),
        };

        let Some(record) = self.bounded(self.store.find_by_email(&email)).await? else {
            self.hasher.verify_dummy(password).await;
            debug!("Login failed");
            return Err(AccountError::InvalidCredentials);
        };

        if !self
            .hasher
            .verify(password, record.credential_hash.clone())
            .await
        {
            debug!(user_id = %record.id, "Login failed");
            return Err(AccountError::InvalidCredentials);
        }

        debug!(user_id = %record.id, "Login successful");

        Ok(UserView::from(record))
    }
}
