//! HTTP handlers for push-gateway.

pub mod health;
pub mod send;

use axum::{http::StatusCode, response::IntoResponse};

use crate::services::get_metrics;

pub use health::{health_check, readiness_check};
pub use send::send_notification;

pub async fn metrics_endpoint() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        get_metrics(),
    )
}
