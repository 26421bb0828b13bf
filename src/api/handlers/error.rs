use super::{SERVER_ERROR, ValidationResponse, failure};
use crate::accounts::{AccountError, StoreError};
use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};
use tracing::{debug, error};

impl IntoResponse for AccountError {
    /// Maps workflow failures onto stable HTTP responses. Storage and internal
    /// causes are logged here and replaced by a generic message.
    fn into_response(self) -> Response {
        match self {
            Self::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                Json(ValidationResponse {
                    success: false,
                    errors,
                }),
            )
                .into_response(),
            Self::MissingCredentials => failure(StatusCode::BAD_REQUEST, &self.to_string()),
            Self::Conflict(field) => {
                debug!("Registration conflict on {field}");
                failure(StatusCode::CONFLICT, &self.to_string())
            }
            Self::InvalidCredentials | Self::Unauthorized => {
                failure(StatusCode::UNAUTHORIZED, &self.to_string())
            }
            Self::Storage(StoreError::Timeout(timeout)) => {
                error!("Storage call timed out after {timeout:?}");
                let mut response = failure(StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR);
                response
                    .headers_mut()
                    .insert(RETRY_AFTER, HeaderValue::from_static("1"));
                response
            }
            Self::Storage(err) => {
                error!("Storage failure: {err}");
                failure(StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR)
            }
            Self::Internal(err) => {
                error!("Internal failure: {err}");
                failure(StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR)
            }
        }
    }
}
