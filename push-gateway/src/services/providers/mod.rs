pub mod fcm;

use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

pub use fcm::{FcmProvider, MockPushProvider};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider not enabled: {0}")]
    NotEnabled(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Send error: {0}")]
    SendFailed(String),
}

/// One message delivered to many recipient tokens in a single provider call.
///
/// Absent blocks are omitted from provider payloads entirely, never sent as
/// empty objects.
#[derive(Debug, Clone, PartialEq)]
pub struct MulticastMessage {
    pub tokens: Vec<String>,
    pub notification: Option<NotificationContent>,
    pub data: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// Per-token outcomes of a multicast call, in the order the tokens were sent.
#[derive(Debug, Clone)]
pub struct MulticastReport {
    pub success_count: u32,
    pub failure_count: u32,
    pub responses: Vec<SendOutcome>,
}

#[derive(Debug, Clone)]
pub struct SendOutcome {
    pub success: bool,
    pub error: Option<SendError>,
}

/// Loosely structured error attached to a failed per-token send.
#[derive(Debug, Clone, PartialEq)]
pub struct SendError {
    pub message: Option<String>,
    pub code: Option<String>,
}

#[async_trait]
pub trait PushProvider: Send + Sync {
    async fn send_multicast(
        &self,
        message: &MulticastMessage,
    ) -> Result<MulticastReport, ProviderError>;
    async fn health_check(&self) -> Result<(), ProviderError>;
    fn is_enabled(&self) -> bool;
}
