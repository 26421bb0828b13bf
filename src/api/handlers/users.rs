use super::{MessageResponse, UsersResponse, failure};
use crate::accounts::{AccountError, AccountService, PageQuery};
use axum::{
    Json,
    extract::{Extension, Query, rejection::QueryRejection},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{debug, instrument};

#[utoipa::path(
    get,
    path= "/api/users",
    params(PageQuery),
    responses (
        (status = 200, description = "Registered users in insertion order", body = UsersResponse, content_type = "application/json"),
        (status = 400, description = "Malformed paging parameters", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = MessageResponse),
        (status = 500, description = "Server error", body = MessageResponse),
    ),
    security(
        (),
        ("bearer" = [])
    ),
    tag= "accounts"
)]
#[instrument(skip(service, headers, page))]
pub async fn list_users(
    service: Extension<Arc<AccountService>>,
    headers: HeaderMap,
    page: Result<Query<PageQuery>, QueryRejection>,
) -> Response {
    if !service.directory_access().authorize(bearer_token(&headers)) {
        return AccountError::Unauthorized.into_response();
    }

    let Query(page) = match page {
        Ok(page) => page,
        Err(rejection) => {
            debug!("Rejected paging parameters: {}", rejection.status());
            return failure(StatusCode::BAD_REQUEST, "Invalid paging parameters");
        }
    };

    match service.list_users(page).await {
        Ok(users) => Json(UsersResponse {
            success: true,
            users,
        })
        .into_response(),
        Err(err) => err.into_response(),
    }
}

/// Token from an `Authorization: Bearer <token>` header, if present and well formed.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    scheme
        .eq_ignore_ascii_case("bearer")
        .then(|| token.trim())
        .filter(|token| !token.is_empty())
}
