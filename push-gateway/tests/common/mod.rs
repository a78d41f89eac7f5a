use push_gateway::config::{FcmConfig, PushGatewayConfig};
use push_gateway::services::PushProvider;
use push_gateway::startup::Application;
use service_core::config::Config as CoreConfig;
use std::sync::Arc;

pub struct TestApp {
    pub address: String,
}

impl TestApp {
    /// Spawn the app on a random port with the given push provider.
    pub async fn spawn(provider: Arc<dyn PushProvider>) -> Self {
        let config = PushGatewayConfig {
            common: CoreConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            fcm: FcmConfig {
                project_id: "test-project".to_string(),
                service_account_key: "test-key".to_string(),
                enabled: false,
            },
        };

        let app = Application::build(&config, provider)
            .await
            .expect("Failed to build test application");
        let port = app.port();

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        let address = format!("http://127.0.0.1:{}", port);

        // Wait for the server to accept requests.
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp { address }
    }
}
