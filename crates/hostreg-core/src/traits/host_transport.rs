// # Host Transport Trait
//
// Defines the interface for the remote host reservation store.
//
// ## Implementations
//
// - HTTP/JSON: `hostreg-transport-http` crate
// - Test doubles: `tests/common`
//
// ## Usage
//
// ```rust,ignore
// use hostreg_core::HostTransport;
//
// #[tokio::main]
// async fn main() -> hostreg_core::Result<()> {
//     let transport = /* HostTransport implementation */;
//
//     let hosts = transport.list_hosts("http://10.0.0.5:8080/api").await?;
//     for host in hosts {
//         println!("{} {}", host.mac, host.hostname);
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A DHCP/DNS reservation entry
///
/// The MAC address is the identity of the record and never changes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HostRecord {
    /// MAC address (unique key)
    pub mac: String,
    /// Hostname
    pub hostname: String,
    /// IP address, absent until the server assigns one
    #[serde(default)]
    pub ip: Option<String>,
}

impl HostRecord {
    /// Create a host record
    pub fn new(mac: impl Into<String>, hostname: impl Into<String>, ip: Option<String>) -> Self {
        Self {
            mac: mac.into(),
            hostname: hostname.into(),
            ip,
        }
    }
}

/// A validated request to create a host
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewHost {
    /// MAC address
    pub mac: String,
    /// Hostname
    pub hostname: String,
    /// Requested IP address; omitted to let the server assign one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
}

impl NewHost {
    /// Validate user input for a new host
    ///
    /// Fields are trimmed. MAC and hostname are required; an empty IP means
    /// "no IP".
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] if the MAC or hostname is empty.
    pub fn new(mac: &str, hostname: &str, ip: Option<&str>) -> Result<Self> {
        let mac = mac.trim();
        let hostname = hostname.trim();

        if mac.is_empty() {
            return Err(Error::validation("MAC address is required"));
        }
        if hostname.is_empty() {
            return Err(Error::validation("Hostname is required"));
        }

        Ok(Self {
            mac: mac.to_string(),
            hostname: hostname.to_string(),
            ip: non_empty(ip),
        })
    }
}

/// New values for the mutable fields of a host
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostUpdate {
    /// Hostname
    pub hostname: String,
    /// IP address; `None` clears it
    pub ip: Option<String>,
}

impl HostUpdate {
    /// The mutable fields of `record`
    pub fn from_record(record: &HostRecord) -> Self {
        Self {
            hostname: record.hostname.clone(),
            ip: record.ip.clone(),
        }
    }
}

pub(crate) fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Trait for the remote host store
///
/// Each method is a single round trip against `base_url`, the resolved base
/// URL of the current endpoint (e.g. `http://10.0.0.5:8080/api`).
///
/// # Failure Contract
///
/// Every failure (network error, non-2xx status, malformed body) is reported
/// as [`Error::Transport`], so callers need a single failure branch.
/// Implementations never retry; a failed attempt surfaces immediately.
///
/// # Thread Safety
///
/// Implementations must be usable from concurrent tasks.
#[async_trait]
pub trait HostTransport: Send + Sync {
    /// Fetch every host record, in server order
    async fn list_hosts(&self, base_url: &str) -> Result<Vec<HostRecord>>;

    /// Create a host record
    ///
    /// Returns the record as stored by the server, which may have assigned an IP.
    async fn create_host(&self, base_url: &str, host: &NewHost) -> Result<HostRecord>;

    /// Delete the host record with this MAC address
    async fn delete_host(&self, base_url: &str, mac: &str) -> Result<()>;

    /// Replace the mutable fields of the host record with this MAC address
    ///
    /// Returns the record as stored by the server.
    async fn update_host(&self, base_url: &str, mac: &str, update: &HostUpdate)
    -> Result<HostRecord>;

    /// Get the transport name (for logging/debugging)
    fn transport_name(&self) -> &'static str;
}
