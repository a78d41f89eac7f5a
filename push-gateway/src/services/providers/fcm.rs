use super::{
    MulticastMessage, MulticastReport, NotificationContent, ProviderError, PushProvider,
    SendError, SendOutcome,
};
use crate::config::FcmConfig;
use crate::services::metrics::record_provider_call;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

const FCM_API_URL: &str = "https://fcm.googleapis.com/v1/projects";

pub struct FcmProvider {
    config: FcmConfig,
    client: Client,
}

#[derive(Debug, Serialize)]
struct FcmSendRequest<'a> {
    message: FcmMessage<'a>,
}

#[derive(Debug, Serialize)]
struct FcmMessage<'a> {
    token: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    notification: Option<&'a NotificationContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a HashMap<String, String>>,
}

#[derive(Debug, Deserialize)]
struct FcmResponse {
    #[serde(default)]
    error: Option<FcmErrorBody>,
}

#[derive(Debug, Deserialize)]
struct FcmErrorEnvelope {
    error: FcmErrorBody,
}

#[derive(Debug, Deserialize)]
struct FcmErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

fn parse_error_body(body: &str) -> Option<SendError> {
    serde_json::from_str::<FcmErrorEnvelope>(body)
        .ok()
        .map(|envelope| SendError {
            message: envelope.error.message,
            code: envelope.error.status,
        })
}

impl FcmProvider {
    pub fn new(config: FcmConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    // The service account key is used directly as the bearer credential;
    // OAuth2 token exchange is handled by the deployment environment.
    async fn access_token(&self) -> Result<String, ProviderError> {
        if self.config.service_account_key.is_empty() {
            return Err(ProviderError::Authentication(
                "FCM service account key not configured".to_string(),
            ));
        }

        Ok(self.config.service_account_key.clone())
    }

    async fn send_to_token(
        &self,
        url: &str,
        access_token: &str,
        token: &str,
        message: &MulticastMessage,
    ) -> Result<(), SendError> {
        let request = FcmSendRequest {
            message: FcmMessage {
                token,
                notification: message.notification.as_ref(),
                data: message.data.as_ref(),
            },
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(access_token)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| SendError {
                message: Some(format!("Failed to connect to FCM: {}", e)),
                code: None,
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(parse_error_body(&body).unwrap_or_else(|| SendError {
                message: Some(format!(
                    "FCM API returned error status {}: {}",
                    status, body
                )),
                code: None,
            }));
        }

        match serde_json::from_str::<FcmResponse>(&body) {
            Ok(FcmResponse { error: Some(error) }) => Err(SendError {
                message: error.message,
                code: error.status,
            }),
            Ok(FcmResponse { error: None }) => Ok(()),
            Err(e) => Err(SendError {
                message: Some(format!("Failed to parse FCM response: {}", e)),
                code: None,
            }),
        }
    }
}

#[async_trait]
impl PushProvider for FcmProvider {
    async fn send_multicast(
        &self,
        message: &MulticastMessage,
    ) -> Result<MulticastReport, ProviderError> {
        if !self.config.enabled {
            return Err(ProviderError::NotEnabled(
                "FCM push provider is not enabled".to_string(),
            ));
        }

        if self.config.project_id.is_empty() {
            return Err(ProviderError::Configuration(
                "FCM project_id is not configured".to_string(),
            ));
        }

        let access_token = self.access_token().await?;
        let url = format!("{}/{}/messages:send", FCM_API_URL, self.config.project_id);

        let mut responses = Vec::with_capacity(message.tokens.len());
        let mut success_count = 0u32;
        let mut failure_count = 0u32;

        for token in &message.tokens {
            match self
                .send_to_token(&url, &access_token, token, message)
                .await
            {
                Ok(()) => {
                    success_count += 1;
                    record_provider_call("fcm", "ok");
                    responses.push(SendOutcome {
                        success: true,
                        error: None,
                    });
                }
                Err(error) => {
                    failure_count += 1;
                    record_provider_call("fcm", "error");
                    tracing::debug!(token = %token, "FCM send failed for token");
                    responses.push(SendOutcome {
                        success: false,
                        error: Some(error),
                    });
                }
            }
        }

        tracing::info!(success_count, failure_count, "multicast send completed via FCM");

        Ok(MulticastReport {
            success_count,
            failure_count,
            responses,
        })
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        if !self.config.enabled {
            return Ok(());
        }

        if self.config.project_id.is_empty() {
            return Err(ProviderError::Configuration(
                "FCM project_id is not configured".to_string(),
            ));
        }

        if self.config.service_account_key.is_empty() {
            return Err(ProviderError::Configuration(
                "FCM service_account_key is not configured".to_string(),
            ));
        }

        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }
}

/// Mock push provider for tests and disabled deployments.
pub struct MockPushProvider {
    enabled: bool,
    send_count: AtomicU64,
    scripted_failures: HashMap<usize, SendError>,
    forced_error: Option<String>,
}

impl MockPushProvider {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            send_count: AtomicU64::new(0),
            scripted_failures: HashMap::new(),
            forced_error: None,
        }
    }

    /// Succeeds overall, failing only the tokens at the given indexes.
    pub fn with_failures(failures: Vec<(usize, SendError)>) -> Self {
        Self {
            enabled: true,
            send_count: AtomicU64::new(0),
            scripted_failures: failures.into_iter().collect(),
            forced_error: None,
        }
    }

    /// Fails the whole multicast call with a send error.
    pub fn failing_with(message: impl Into<String>) -> Self {
        Self {
            enabled: true,
            send_count: AtomicU64::new(0),
            scripted_failures: HashMap::new(),
            forced_error: Some(message.into()),
        }
    }

    pub fn send_count(&self) -> u64 {
        self.send_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PushProvider for MockPushProvider {
    async fn send_multicast(
        &self,
        message: &MulticastMessage,
    ) -> Result<MulticastReport, ProviderError> {
        if !self.enabled {
            return Err(ProviderError::NotEnabled(
                "Mock push provider is not enabled".to_string(),
            ));
        }

        self.send_count.fetch_add(1, Ordering::SeqCst);

        if let Some(reason) = &self.forced_error {
            return Err(ProviderError::SendFailed(reason.clone()));
        }

        let mut success_count = 0u32;
        let mut failure_count = 0u32;
        let responses = message
            .tokens
            .iter()
            .enumerate()
            .map(|(index, _)| match self.scripted_failures.get(&index) {
                Some(error) => {
                    failure_count += 1;
                    SendOutcome {
                        success: false,
                        error: Some(error.clone()),
                    }
                }
                None => {
                    success_count += 1;
                    SendOutcome {
                        success: true,
                        error: None,
                    }
                }
            })
            .collect();

        tracing::info!(
            tokens = message.tokens.len(),
            "[MOCK] multicast send would be delivered"
        );

        Ok(MulticastReport {
            success_count,
            failure_count,
            responses,
        })
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}
