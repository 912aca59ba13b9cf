use postwhale::config::Config;
use postwhale::gateway::{self, GatewayResponse};
use postwhale::state::AppState;

/// Test application wrapper over a private in-memory database
pub struct TestApp {
    pub state: AppState,
}

impl TestApp {
    /// Create a new test application
    pub async fn new() -> Self {
        let state = AppState::new(Config::in_memory())
            .await
            .expect("Failed to create test app state");

        Self { state }
    }

    /// Send one envelope through the gateway and return its response
    pub async fn send(&self, action: &str, data: serde_json::Value) -> GatewayResponse {
        let line = serde_json::json!({ "action": action, "data": data }).to_string();
        gateway::handle_line(&self.state, &line).await
    }

    /// Send an envelope that must succeed and return its data
    pub async fn send_ok(&self, action: &str, data: serde_json::Value) -> serde_json::Value {
        let response = self.send(action, data).await;
        assert!(
            response.success,
            "{} failed: {:?}",
            action,
            response.error
        );
        response.data.unwrap_or(serde_json::Value::Null)
    }
}
