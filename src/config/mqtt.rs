use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(default)]
pub struct MqttConfig {
    pub host: String,

    #[validate(range(min = 1))]
    pub port: u16,

    /// Stable by default so a persistent session survives restarts; an
    /// empty string requests a random id per run.
    pub client_id: String,

    /// Keep-alive interval in seconds.
    #[validate(range(min = 5, max = 3600))]
    pub keep_alive: u64,

    pub clean_session: bool,

    /// Initial reconnect delay in seconds.
    #[validate(range(min = 1, max = 3600))]
    pub reconnect_delay: u64,

    /// Upper bound the backoff grows towards, in seconds.
    #[validate(range(min = 1, max = 86400))]
    pub max_reconnect_delay: u64,

    /// 0 retries forever.
    pub max_reconnect_attempts: u32,

    #[validate(range(min = 1.0, max = 10.0))]
    pub reconnect_backoff_multiplier: f64,

    /// Topic filters to subscribe to; at least one is required.
    #[validate(length(min = 1, message = "at least one topic filter is required"))]
    pub topics: Vec<String>,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1883,
            client_id: "iotpump-persistence".to_string(),
            keep_alive: 60,
            clean_session: true,
            reconnect_delay: 5,
            max_reconnect_delay: 300,
            max_reconnect_attempts: 0,
            reconnect_backoff_multiplier: 2.0,
            topics: Vec::new(),
        }
    }
}

impl MqttConfig {
    /// The configured client id, or a random one when left empty.
    pub fn effective_client_id(&self) -> String {
        if self.client_id.is_empty() {
            format!("iotpump-{}", Uuid::new_v4())
        } else {
            self.client_id.clone()
        }
    }
}
