use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct Liveness {
    ok: bool,
}

/// Liveness check. Does not touch the store; see `/health` for that.
pub async fn root() -> Json<Liveness> {
    Json(Liveness { ok: true })
}
