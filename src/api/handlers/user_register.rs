use super::{INVALID_BODY, UserResponse, ValidationResponse, failure};
use crate::accounts::{AccountService, RegistrationRequest};
use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{debug, instrument};

#[utoipa::path(
    post,
    path= "/api/register",
    request_body = RegistrationRequest,
    responses (
        (status = 201, description = "Registration successful", body = UserResponse, content_type = "application/json"),
        (status = 400, description = "One or more fields failed validation", body = ValidationResponse),
        (status = 409, description = "Email or phone already registered", body = super::MessageResponse),
        (status = 500, description = "Server error", body = super::MessageResponse),
    ),
    tag= "accounts"
)]
#[instrument(skip(service, payload))]
pub async fn register(
    service: Extension<Arc<AccountService>>,
    payload: Result<Json<RegistrationRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            // serde messages quote the offending value, so only the status is logged
            debug!("Rejected registration body: {}", rejection.status());
            return failure(StatusCode::BAD_REQUEST, INVALID_BODY);
        }
    };

    match service.register(request).await {
        Ok(user) => (
            StatusCode::CREATED,
            Json(UserResponse::new("Registration successful", user)),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}
