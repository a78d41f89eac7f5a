//! Input normalization, message assembly, and per-token failure aggregation
//! around a single multicast send.
//!
//! The caller payload is untrusted JSON. Fields that fail their expected
//! shape are dropped silently; only a token list that normalizes to empty
//! rejects the request.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::services::{MulticastMessage, NotificationContent, PushProvider, SendError};

/// Caller-facing error with a machine-readable kind.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("The 'tokens' array is required and must contain at least one valid device token.")]
    InvalidArgument,

    #[error("Unable to send notifications. Please try again later.")]
    Internal { detail: Option<String> },
}

impl DispatchError {
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::InvalidArgument => "invalid-argument",
            DispatchError::Internal { .. } => "internal",
        }
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorBody {
            kind: &'static str,
            message: String,
            #[serde(skip_serializing_if = "Option::is_none")]
            detail: Option<String>,
        }

        #[derive(Serialize)]
        struct ErrorResponse {
            error: ErrorBody,
        }

        let status = match self {
            DispatchError::InvalidArgument => StatusCode::BAD_REQUEST,
            DispatchError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let kind = self.kind();
        let message = self.to_string();
        let detail = match self {
            DispatchError::Internal { detail } => detail,
            DispatchError::InvalidArgument => None,
        };

        (
            status,
            Json(ErrorResponse {
                error: ErrorBody {
                    kind,
                    message,
                    detail,
                },
            }),
        )
            .into_response()
    }
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DispatchSummary {
    pub success_count: u32,
    pub failure_count: u32,
    pub failures: Vec<DispatchFailure>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct DispatchFailure {
    pub token: String,
    pub error: String,
}

/// Filters the raw value down to trimmed, non-empty string tokens.
///
/// Anything that is not an array yields an empty list. Order is preserved
/// and duplicates are kept.
pub fn normalize_tokens(value: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_owned)
        .collect()
}

fn trimmed_string(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

/// Builds the notification block, or `None` when neither field is usable.
pub fn build_notification(
    title: Option<&Value>,
    body: Option<&Value>,
) -> Option<NotificationContent> {
    let title = trimmed_string(title);
    let body = trimmed_string(body);

    if title.is_none() && body.is_none() {
        return None;
    }

    Some(NotificationContent { title, body })
}

/// Builds the data block from a flat object, keeping string values only.
pub fn build_data(value: Option<&Value>) -> Option<HashMap<String, String>> {
    let Some(Value::Object(entries)) = value else {
        return None;
    };

    let data: HashMap<String, String> = entries
        .iter()
        .filter_map(|(key, value)| value.as_str().map(|s| (key.clone(), s.to_owned())))
        .collect();

    if data.is_empty() {
        None
    } else {
        Some(data)
    }
}

/// Formats a per-token send error: message first, then code, then "unknown".
pub fn format_send_error(error: Option<&SendError>) -> String {
    error
        .and_then(|e| e.message.clone().or_else(|| e.code.clone()))
        .unwrap_or_else(|| "unknown".to_string())
}

#[derive(Clone)]
pub struct NotificationDispatcher {
    provider: Arc<dyn PushProvider>,
}

impl NotificationDispatcher {
    pub fn new(provider: Arc<dyn PushProvider>) -> Self {
        Self { provider }
    }

    /// Validates the payload, performs exactly one multicast send, and maps
    /// per-token outcomes to a failures list in input token order.
    ///
    /// Partial per-token failure is a successful dispatch carrying a
    /// non-empty `failures` list; only validation and provider call failures
    /// are errors.
    pub async fn dispatch(&self, payload: &Value) -> Result<DispatchSummary, DispatchError> {
        let tokens = normalize_tokens(payload.get("tokens"));
        if tokens.is_empty() {
            return Err(DispatchError::InvalidArgument);
        }

        let notification = build_notification(payload.get("title"), payload.get("body"));
        let data = build_data(payload.get("notificationData"));

        let message = MulticastMessage {
            tokens,
            notification,
            data,
        };

        match self.provider.send_multicast(&message).await {
            Ok(report) => {
                let failures = message
                    .tokens
                    .iter()
                    .zip(report.responses.iter())
                    .filter(|(_, outcome)| !outcome.success)
                    .map(|(token, outcome)| DispatchFailure {
                        token: token.clone(),
                        error: format_send_error(outcome.error.as_ref()),
                    })
                    .collect();

                Ok(DispatchSummary {
                    success_count: report.success_count,
                    failure_count: report.failure_count,
                    failures,
                })
            }
            Err(error) => {
                tracing::error!(error = %error, "multicast send failed");
                Err(DispatchError::Internal {
                    detail: Some(error.to_string()),
                })
            }
        }
    }
}
