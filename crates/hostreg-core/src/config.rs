//! Configuration types for the host registry client

use serde::{Deserialize, Serialize};

use crate::endpoint::DEFAULT_API_PORT;

/// Main client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Port the appliance API listens on
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Timeout for a single HTTP round trip (in seconds)
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// Capacity of the notification channel
    ///
    /// When full, new notifications are dropped (with a warning log) so the
    /// engine never waits on the presentation layer.
    #[serde(default = "default_notification_channel_capacity")]
    pub notification_channel_capacity: usize,

    /// Endpoint address to connect to at startup
    ///
    /// When unset the client starts in the endpoint entry workflow.
    #[serde(default)]
    pub initial_endpoint: Option<String>,
}

impl ClientConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self {
            api_port: default_api_port(),
            http_timeout_secs: default_http_timeout_secs(),
            notification_channel_capacity: default_notification_channel_capacity(),
            initial_endpoint: None,
        }
    }

    /// Set the endpoint to connect to at startup
    pub fn with_initial_endpoint(mut self, address: impl Into<String>) -> Self {
        self.initial_endpoint = Some(address.into());
        self
    }

    /// Set the API port
    pub fn with_api_port(mut self, port: u16) -> Self {
        self.api_port = port;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.api_port == 0 {
            return Err(crate::Error::config("API port must be > 0"));
        }

        if !(1..=300).contains(&self.http_timeout_secs) {
            return Err(crate::Error::config(format!(
                "HTTP timeout must be between 1 and 300 seconds. Got: {}",
                self.http_timeout_secs
            )));
        }

        if self.notification_channel_capacity == 0 {
            return Err(crate::Error::config(
                "Notification channel capacity must be > 0",
            ));
        }

        if let Some(address) = &self.initial_endpoint {
            if address.trim().is_empty() {
                return Err(crate::Error::config("Initial endpoint cannot be empty"));
            }
        }

        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn default_api_port() -> u16 {
    DEFAULT_API_PORT
}

fn default_http_timeout_secs() -> u64 {
    30
}

fn default_notification_channel_capacity() -> usize {
    64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.api_port, 8080);
        assert_eq!(config.http_timeout_secs, 30);
        assert!(config.initial_endpoint.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_serde_defaults_fill_missing_fields() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"initial_endpoint": "192.168.1.2"}"#).unwrap();
        assert_eq!(config.api_port, 8080);
        assert_eq!(config.notification_channel_capacity, 64);
        assert_eq!(config.initial_endpoint.as_deref(), Some("192.168.1.2"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(ClientConfig::new().with_api_port(0).validate().is_err());

        let mut config = ClientConfig::new();
        config.http_timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = ClientConfig::new();
        config.notification_channel_capacity = 0;
        assert!(config.validate().is_err());

        let config = ClientConfig::new().with_initial_endpoint("  ");
        assert!(matches!(config.validate(), Err(crate::Error::Config(_))));
    }
}
