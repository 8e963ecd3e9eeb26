// # Endpoint Configuration
//
// Holds the address of the appliance API the client talks to.
//
// The endpoint is unset at startup and only changes when the user commits a
// new address. No reachability check happens at set-time; the first remote
// call against it is the check.

use std::fmt;
use std::sync::{PoisonError, RwLock};

use crate::error::{Error, Result};

/// Port the appliance API listens on unless configured otherwise
pub const DEFAULT_API_PORT: u16 = 8080;

/// Network address of the appliance API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    /// Create an endpoint on the default API port
    ///
    /// The address is trimmed; an empty address is rejected.
    pub fn new(address: impl AsRef<str>) -> Result<Self> {
        let host = address.as_ref().trim();
        if host.is_empty() {
            return Err(Error::validation("Endpoint address cannot be empty"));
        }

        Ok(Self {
            host: host.to_string(),
            port: DEFAULT_API_PORT,
        })
    }

    /// Use a different API port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// The host part as entered by the user
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Base URL of the API, e.g. `http://10.0.0.5:8080/api`
    pub fn base_url(&self) -> String {
        format!("http://{}:{}/api", self.host, self.port)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// The current endpoint, shared by every remote operation
///
/// Owned by the [`RegistryEngine`](crate::RegistryEngine); tests may construct
/// one directly to drive a transport without an engine.
#[derive(Debug)]
pub struct EndpointConfig {
    port: u16,
    current: RwLock<Option<Endpoint>>,
}

impl EndpointConfig {
    /// Create an unset endpoint configuration using the given API port
    pub fn new(port: u16) -> Self {
        Self {
            port,
            current: RwLock::new(None),
        }
    }

    /// Store a new endpoint built from `address`
    ///
    /// Returns the endpoint that is now current.
    pub fn set(&self, address: &str) -> Result<Endpoint> {
        let endpoint = Endpoint::new(address)?.with_port(self.port);
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *current = Some(endpoint.clone());
        Ok(endpoint)
    }

    /// The current endpoint, if one was set
    pub fn current(&self) -> Option<Endpoint> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Base URL of the current endpoint
    ///
    /// # Errors
    ///
    /// [`Error::NotConfigured`] if no endpoint was ever set.
    pub fn base_url(&self) -> Result<String> {
        self.current()
            .map(|endpoint| endpoint.base_url())
            .ok_or(Error::NotConfigured)
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_PORT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_format() {
        let endpoint = Endpoint::new("10.0.0.5").unwrap();
        assert_eq!(endpoint.base_url(), "http://10.0.0.5:8080/api");
        assert_eq!(endpoint.to_string(), "10.0.0.5:8080");

        let endpoint = Endpoint::new(" pi.lan ").unwrap().with_port(9000);
        assert_eq!(endpoint.base_url(), "http://pi.lan:9000/api");
    }

    #[test]
    fn test_empty_address_rejected() {
        assert!(matches!(Endpoint::new(""), Err(Error::Validation(_))));
        assert!(matches!(Endpoint::new("   "), Err(Error::Validation(_))));
    }

    #[test]
    fn test_unset_config_is_not_configured() {
        let config = EndpointConfig::default();
        assert!(config.current().is_none());
        assert_eq!(config.base_url(), Err(Error::NotConfigured));
    }

    #[test]
    fn test_set_and_change() {
        let config = EndpointConfig::default();
        config.set("192.168.1.10").unwrap();
        assert_eq!(config.base_url().unwrap(), "http://192.168.1.10:8080/api");

        config.set("192.168.1.20").unwrap();
        assert_eq!(config.base_url().unwrap(), "http://192.168.1.20:8080/api");
    }

    #[test]
    fn test_failed_set_keeps_previous() {
        let config = EndpointConfig::new(8081);
        config.set("10.0.0.1").unwrap();
        assert!(config.set("").is_err());
        assert_eq!(config.base_url().unwrap(), "http://10.0.0.1:8081/api");
    }
}
