use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::utils::response::success;

pub mod auth;
pub mod dashboard;
pub mod payments;
pub mod slots;
pub mod tickets;
pub mod users;
pub mod violations;

#[derive(Serialize)]
struct HealthPayload {
    status: &'static str,
    service: &'static str,
}

pub async fn health_check() -> Response {
    let payload = HealthPayload {
        status: "ok",
        service: "parklot-api",
    };

    success(payload, "Health check successful").into_response()
}
