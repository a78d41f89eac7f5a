use axum::{body::Bytes, extract::State, Json};
use serde_json::Value;

use crate::dispatch::{DispatchError, DispatchSummary};
use crate::services::record_dispatch;
use crate::startup::AppState;

/// Accepts an arbitrary JSON payload and forwards it to the dispatcher.
///
/// The body is parsed leniently: a missing or malformed body is treated as an
/// empty payload and surfaces as a validation error downstream, not as a
/// framework rejection.
#[tracing::instrument(skip(state, body))]
pub async fn send_notification(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<DispatchSummary>, DispatchError> {
    let payload: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);

    match state.dispatcher.dispatch(&payload).await {
        Ok(summary) => {
            record_dispatch("ok");
            tracing::info!(
                success_count = summary.success_count,
                failure_count = summary.failure_count,
                "notification dispatch completed"
            );
            Ok(Json(summary))
        }
        Err(error) => {
            record_dispatch(error.kind());
            Err(error)
        }
    }
}
