use super::{INVALID_BODY, MessageResponse, UserResponse, failure};
use crate::accounts::{AccountService, LoginRequest};
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
    path= "/api/login",
    request_body = LoginRequest,
    responses (
        (status = 200, description = "Login successful", body = UserResponse, content_type = "application/json"),
        (status = 400, description = "Email and password required", body = MessageResponse),
        (status = 401, description = "Invalid credentials", body = MessageResponse),
        (status = 500, description = "Server error", body = MessageResponse),
    ),
    tag= "accounts"
)]
#[instrument(skip(service, payload))]
pub async fn login(
    service: Extension<Arc<AccountService>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            // serde messages quote the offending value, so only the status is logged
            debug!("Rejected login body: {}", rejection.status());
            return failure(StatusCode::BAD_REQUEST, INVALID_BODY);
        }
    };

    match service.authenticate(request).await {
        Ok(user) => Json(UserResponse::new("Login successful", user)).into_response(),
        Err(err) => err.into_response(),
    }
}
