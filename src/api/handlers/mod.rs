//! HTTP handlers and the JSON envelopes they answer with.
//!
//! Every body carries `success`; failures carry either a single `message` or a
//! list of field `errors`. Users only ever appear as [`UserView`].

pub mod error;
pub mod health;
pub mod root;
pub mod user_login;
pub mod user_register;
pub mod users;

use crate::accounts::{FieldError, UserView};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const SERVER_ERROR: &str = "Server error";
pub const INVALID_BODY: &str = "Invalid JSON body";

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct UserResponse {
    pub success: bool,
    pub message: String,
    pub user: UserView,
}

impl UserResponse {
    #[must_use]
    pub fn new(message: &str, user: UserView) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            user,
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct UsersResponse {
    pub success: bool,
    pub users: Vec<UserView>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ValidationResponse {
    pub success: bool,
    pub errors: Vec<FieldError>,
}

/// `{success:false, message}` with the given status.
pub fn failure(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(MessageResponse {
            success: false,
            message: message.to_string(),
        }),
    )
        .into_response()
}
