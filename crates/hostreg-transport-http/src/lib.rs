// # HTTP Host Transport
//
// This crate provides the HTTP transport for the host registry client. It
// speaks the appliance's JSON API under the endpoint's base URL:
//
// | Operation | Request                 | Body                     | Response       |
// |-----------|-------------------------|--------------------------|----------------|
// | List      | `GET /hosts`            |                          | record array   |
// | Create    | `POST /hosts`           | `{mac, hostname, ip?}`   | created record |
// | Delete    | `DELETE /hosts/{mac}`   |                          | ack JSON       |
// | Update    | `PUT /hosts/{mac}`      | `{hostname, ip}`         | updated record |
//
// ## Constraints
//
// - One HTTP request per call, no retries (the engine decides what to do next)
// - Every failure maps to `Error::Transport`: connection errors, timeouts,
//   non-2xx statuses and bodies that do not decode
// - No caching; the registry cache is owned by the engine

use async_trait::async_trait;
use hostreg_core::config::ClientConfig;
use hostreg_core::{Error, HostRecord, HostTransport, HostUpdate, NewHost, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Host transport over the appliance's HTTP API
pub struct HttpTransport {
    /// HTTP client for API requests
    client: reqwest::Client,

    /// Per-request timeout
    timeout: Duration,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl HttpTransport {
    /// Create a transport with the given request timeout
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, timeout })
    }

    /// Create a transport using the timeout from the client configuration
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::new(Duration::from_secs(config.http_timeout_secs))
    }

    /// The per-request timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send a request and check its status
    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        operation: &str,
    ) -> Result<reqwest::Response> {
        let response = request
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::transport(format!("{}: request timed out", operation))
                } else {
                    Error::transport(format!("{}: HTTP request failed: {}", operation, e))
                }
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error response".to_string());

        Err(status_error(operation, status, &error_text))
    }

    /// Decode a JSON response body
    async fn decode<T: DeserializeOwned>(response: reqwest::Response, operation: &str) -> Result<T> {
        response
            .json::<T>()
            .await
            .map_err(|e| Error::transport(format!("{}: failed to parse response: {}", operation, e)))
    }
}

/// Map a non-2xx status to a transport error
fn status_error(operation: &str, status: reqwest::StatusCode, error_text: &str) -> Error {
    match status.as_u16() {
        401 | 403 => Error::transport(format!(
            "{}: authentication failed. Status: {}",
            operation, status
        )),
        404 => Error::transport(format!("{}: not found. Status: {}", operation, status)),
        409 => Error::transport(format!(
            "{}: conflict with the current server state. Status: {}",
            operation, status
        )),
        429 => Error::transport(format!(
            "{}: rate limit exceeded. Please retry later. Status: {}",
            operation, status
        )),
        500..=599 => Error::transport(format!(
            "{}: server error: {} - {}",
            operation, status, error_text
        )),
        _ => Error::transport(format!("{}: {} - {}", operation, status, error_text)),
    }
}

fn hosts_url(base_url: &str) -> String {
    format!("{}/hosts", base_url)
}

/// URL of a single host; the MAC is escaped as one path segment
fn host_url(base_url: &str, mac: &str) -> Result<reqwest::Url> {
    let mut url = reqwest::Url::parse(base_url)
        .map_err(|e| Error::transport(format!("Invalid base URL {}: {}", base_url, e)))?;

    url.path_segments_mut()
        .map_err(|()| Error::transport(format!("Base URL cannot take a path: {}", base_url)))?
        .pop_if_empty()
        .push("hosts")
        .push(mac);

    Ok(url)
}

#[async_trait]
impl HostTransport for HttpTransport {
    async fn list_hosts(&self, base_url: &str) -> Result<Vec<HostRecord>> {
        let url = hosts_url(base_url);
        tracing::debug!("GET {}", url);

        let response = self.send(self.client.get(&url), "list hosts").await?;
        let hosts: Vec<HostRecord> = Self::decode(response, "list hosts").await?;

        tracing::debug!("Received {} host(s) from {}", hosts.len(), url);
        Ok(hosts)
    }

    async fn create_host(&self, base_url: &str, host: &NewHost) -> Result<HostRecord> {
        let url = hosts_url(base_url);
        tracing::debug!("POST {} (mac: {})", url, host.mac);

        let response = self
            .send(self.client.post(&url).json(host), "create host")
            .await?;
        let record: HostRecord = Self::decode(response, "create host").await?;

        tracing::info!("Server created host {} ({})", record.hostname, record.mac);
        Ok(record)
    }

    async fn delete_host(&self, base_url: &str, mac: &str) -> Result<()> {
        let url = host_url(base_url, mac)?;
        tracing::debug!("DELETE {}", url);

        let response = self.send(self.client.delete(url), "delete host").await?;

        // The acknowledgement carries nothing we use, but it must be JSON
        let _ack: Value = Self::decode(response, "delete host").await?;

        tracing::info!("Server deleted host {}", mac);
        Ok(())
    }

    async fn update_host(
        &self,
        base_url: &str,
        mac: &str,
        update: &HostUpdate,
    ) -> Result<HostRecord> {
        let url = host_url(base_url, mac)?;
        tracing::debug!("PUT {}", url);

        let response = self
            .send(self.client.put(url).json(update), "update host")
            .await?;
        let record: HostRecord = Self::decode(response, "update host").await?;

        tracing::info!("Server updated host {} ({})", record.hostname, record.mac);
        Ok(record)
    }

    fn transport_name(&self) -> &'static str {
        "http"
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(DEFAULT_HTTP_TIMEOUT)
                .build()
                .unwrap_or_default(),
            timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }
}
