use axum::http::StatusCode;
use serde::Serialize;

use super::{ResponseEnvelope, build_response};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub async fn health_handler() -> ResponseEnvelope {
    build_response(&HealthResponse { status: "healthy" }, StatusCode::OK)
}
