//! Test doubles and common utilities for engine contract tests
//!
//! `MockTransport` behaves like a small in-memory appliance: it keeps a host
//! list, records every call it receives, can be switched to fail, and can hold
//! calls in flight until the test releases them.

#![allow(dead_code)]

use hostreg_core::error::{Error, Result};
use hostreg_core::{
    ClientConfig, HostRecord, HostTransport, HostUpdate, NewHost, Notification, RegistryEngine,
};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{mpsc, watch};

/// A call received by the mock transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub method: &'static str,
    pub url: String,
}

impl Call {
    pub fn new(method: &'static str, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
        }
    }
}

/// An in-memory stand-in for the appliance API
pub struct MockTransport {
    /// Server-side host list
    hosts: Arc<Mutex<Vec<HostRecord>>>,
    /// Every call received, in order
    calls: Arc<Mutex<Vec<Call>>>,
    /// When set, every call fails with a transport error
    failing: Arc<AtomicBool>,
    /// When set, list calls fail with a transport error
    failing_lists: Arc<AtomicBool>,
    /// Calls wait until this is `true`
    gate: Arc<watch::Sender<bool>>,
    /// Number of calls that reached the transport
    entered: Arc<watch::Sender<usize>>,
    /// Next host octet for server-assigned IPs
    next_octet: Arc<Mutex<u8>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::with_hosts(Vec::new())
    }

    pub fn with_hosts(hosts: Vec<HostRecord>) -> Self {
        let (gate, _) = watch::channel(true);
        let (entered, _) = watch::channel(0);
        Self {
            hosts: Arc::new(Mutex::new(hosts)),
            calls: Arc::new(Mutex::new(Vec::new())),
            failing: Arc::new(AtomicBool::new(false)),
            failing_lists: Arc::new(AtomicBool::new(false)),
            gate: Arc::new(gate),
            entered: Arc::new(entered),
            next_octet: Arc::new(Mutex::new(100)),
        }
    }

    /// Create a new MockTransport that shares server state with an existing one
    pub fn sharing_state_with(other: &Self) -> Self {
        Self {
            hosts: Arc::clone(&other.hosts),
            calls: Arc::clone(&other.calls),
            failing: Arc::clone(&other.failing),
            failing_lists: Arc::clone(&other.failing_lists),
            gate: Arc::clone(&other.gate),
            entered: Arc::clone(&other.entered),
            next_octet: Arc::clone(&other.next_octet),
        }
    }

    /// Every call received so far
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls received so far
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// The server-side host list
    pub fn server_hosts(&self) -> Vec<HostRecord> {
        self.hosts.lock().unwrap().clone()
    }

    /// Replace the server-side host list behind the client's back
    pub fn set_server_hosts(&self, hosts: Vec<HostRecord>) {
        *self.hosts.lock().unwrap() = hosts;
    }

    /// Make every following call fail (or succeed again)
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Make list calls fail while other calls succeed
    pub fn set_failing_lists(&self, failing: bool) {
        self.failing_lists.store(failing, Ordering::SeqCst);
    }

    /// Hold every following call until `release()`
    pub fn pause(&self) {
        self.gate.send_replace(false);
    }

    /// Let held calls proceed
    pub fn release(&self) {
        self.gate.send_replace(true);
    }

    /// Wait until at least `count` calls reached the transport
    pub async fn wait_for_calls(&self, count: usize) {
        let mut rx = self.entered.subscribe();
        rx.wait_for(|entered| *entered >= count)
            .await
            .expect("entered counter dropped");
    }

    async fn enter(&self, call: Call) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        self.entered.send_modify(|n| *n += 1);

        let mut gate = self.gate.subscribe();
        gate.wait_for(|open| *open)
            .await
            .map_err(|e| Error::transport(e.to_string()))?;

        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::transport("connection refused"));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl HostTransport for MockTransport {
    async fn list_hosts(&self, base_url: &str) -> Result<Vec<HostRecord>> {
        self.enter(Call::new("GET", format!("{}/hosts", base_url)))
            .await?;
        if self.failing_lists.load(Ordering::SeqCst) {
            return Err(Error::transport("HTTP 503 Service Unavailable"));
        }
        Ok(self.server_hosts())
    }

    async fn create_host(&self, base_url: &str, host: &NewHost) -> Result<HostRecord> {
        self.enter(Call::new("POST", format!("{}/hosts", base_url)))
            .await?;

        let ip = match &host.ip {
            Some(ip) => ip.clone(),
            None => {
                let mut octet = self.next_octet.lock().unwrap();
                *octet += 1;
                format!("192.168.1.{}", *octet)
            }
        };
        let record = HostRecord::new(host.mac.clone(), host.hostname.clone(), Some(ip));

        let mut hosts = self.hosts.lock().unwrap();
        match hosts.iter_mut().find(|h| h.mac == record.mac) {
            Some(existing) => *existing = record.clone(),
            None => hosts.push(record.clone()),
        }
        Ok(record)
    }

    async fn delete_host(&self, base_url: &str, mac: &str) -> Result<()> {
        self.enter(Call::new("DELETE", format!("{}/hosts/{}", base_url, mac)))
            .await?;

        let mut hosts = self.hosts.lock().unwrap();
        let before = hosts.len();
        hosts.retain(|h| h.mac != mac);
        if hosts.len() == before {
            return Err(Error::transport("HTTP 404 Not Found"));
        }
        Ok(())
    }

    async fn update_host(
        &self,
        base_url: &str,
        mac: &str,
        update: &HostUpdate,
    ) -> Result<HostRecord> {
        self.enter(Call::new("PUT", format!("{}/hosts/{}", base_url, mac)))
            .await?;

        let mut hosts = self.hosts.lock().unwrap();
        let host = hosts
            .iter_mut()
            .find(|h| h.mac == mac)
            .ok_or_else(|| Error::transport("HTTP 404 Not Found"))?;
        host.hostname = update.hostname.clone();
        host.ip = update.ip.clone();
        Ok(host.clone())
    }

    fn transport_name(&self) -> &'static str {
        "mock"
    }
}

/// Build an engine over a transport sharing state with `mock`
pub fn engine_with(mock: &MockTransport) -> (RegistryEngine, mpsc::Receiver<Notification>) {
    engine_with_config(mock, ClientConfig::default())
}

/// Build an engine with a custom configuration
pub fn engine_with_config(
    mock: &MockTransport,
    config: ClientConfig,
) -> (RegistryEngine, mpsc::Receiver<Notification>) {
    RegistryEngine::new(Box::new(MockTransport::sharing_state_with(mock)), config)
        .expect("engine construction succeeds")
}

/// Build an engine already pointed at 10.0.0.5 and synced
pub async fn connected_engine(
    mock: &MockTransport,
) -> (RegistryEngine, mpsc::Receiver<Notification>) {
    let (engine, rx) = engine_with(mock);
    engine
        .set_endpoint("10.0.0.5")
        .await
        .expect("initial sync succeeds");
    (engine, rx)
}

/// Base URL of the endpoint used by `connected_engine`
pub const BASE_URL: &str = "http://10.0.0.5:8080/api";

/// All notifications received so far
pub fn drain(rx: &mut mpsc::Receiver<Notification>) -> Vec<Notification> {
    let mut notifications = Vec::new();
    while let Ok(notification) = rx.try_recv() {
        notifications.push(notification);
    }
    notifications
}

pub fn host(mac: &str, hostname: &str, ip: Option<&str>) -> HostRecord {
    HostRecord::new(mac, hostname, ip.map(str::to_string))
}
