use push_gateway::config::PushGatewayConfig;
use push_gateway::services::{init_metrics, FcmProvider, MockPushProvider, PushProvider};
use push_gateway::startup::Application;
use service_core::observability::init_tracing;
use std::sync::Arc;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    init_tracing(&log_level);

    init_metrics();

    let config = PushGatewayConfig::load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    let push_provider: Arc<dyn PushProvider> = if config.fcm.enabled {
        tracing::info!("FCM push provider initialized");
        Arc::new(FcmProvider::new(config.fcm.clone()))
    } else {
        tracing::info!("FCM provider disabled, using mock push provider");
        Arc::new(MockPushProvider::new(true))
    };

    let app = Application::build(&config, push_provider).await.map_err(|e| {
        tracing::error!("Failed to build application: {}", e);
        std::io::Error::other(format!("Startup error: {}", e))
    })?;

    app.run_until_stopped().await
}
