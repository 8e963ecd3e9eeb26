//! Host registry engine
//!
//! The RegistryEngine is responsible for:
//! - Owning the endpoint, the registry cache and the active workflow
//! - Validating user input before anything leaves the process
//! - Calling the HostTransport against the current endpoint
//! - Updating the cache only after the remote store accepted a change
//! - Notifying the presentation layer of every outcome
//!
//! ## Architecture
//!
//! ```text
//!   Presentation ─── Intent ───┐
//!                              ▼
//!                     ┌────────────────┐
//!                     │ RegistryEngine │
//!                     └────────────────┘
//!                              │
//!        ┌─────────────────────┼─────────────────────┐
//!        │                     │                     │
//!        ▼                     ▼                     ▼
//! ┌─────────────┐      ┌───────────────┐     ┌──────────────┐
//! │  Workflow   │      │ HostTransport │     │ Notification │
//! │  (modal)    │      │ (remote call) │     │  (channel)   │
//! └─────────────┘      └───────────────┘     └──────────────┘
//!                              │
//!                              ▼
//!                      ┌───────────────┐
//!                      │ RegistryCache │
//!                      └───────────────┘
//! ```
//!
//! ## Mutation Flow
//!
//! 1. Validate input (Add) or commit the workflow (Delete, Edit)
//! 2. Admit the mutation unless one for the same MAC is in flight
//! 3. Resolve the endpoint (fails with `NotConfigured` if unset)
//! 4. Single remote call, no retries
//! 5. On success, patch the cache and re-sync it from the server
//! 6. Emit a notification either way

mod in_flight;
mod intent;

pub use intent::Intent;

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cache::RegistryCache;
use crate::config::ClientConfig;
use crate::endpoint::{Endpoint, EndpointConfig};
use crate::error::{Error, Result};
use crate::traits::{HostRecord, HostTransport, HostUpdate, NewHost};
use crate::workflow::{DraftEdit, Workflow, WorkflowState};
use in_flight::InFlight;

const SYNC_FAILED: &str = "Failed to connect to the API. Please check the IP address.";
const ADD_FAILED: &str = "Failed to add host. Please check your connection.";
const DELETE_FAILED: &str = "Failed to delete host. Please check your connection.";
const UPDATE_FAILED: &str = "Failed to update host. Please check your connection.";
const ENDPOINT_FAILED: &str = "Failed to set the API endpoint.";

/// Kind of notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// A mutation was accepted by the server
    Success,
    /// The cache was reloaded from the server
    Refreshed,
    /// An operation failed
    Failure,
}

/// An outcome the presentation layer should show
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Kind of notification
    pub kind: NotificationKind,
    /// Human-readable message
    pub message: String,
    /// Whether to offer "change endpoint" as a way out
    pub offer_reconfigure: bool,
    /// When the notification was raised
    pub at: DateTime<Utc>,
}

impl Notification {
    fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            offer_reconfigure: false,
            at: Utc::now(),
        }
    }

    fn failure(context: &str, error: &Error) -> Self {
        let message = if error.offers_reconfigure() {
            format!("{} ({})", context, error)
        } else {
            error.to_string()
        };

        Self {
            offer_reconfigure: error.offers_reconfigure(),
            ..Self::new(NotificationKind::Failure, message)
        }
    }
}

/// Host registry engine
///
/// Owns every piece of client state; the presentation layer only reads
/// snapshots and sends intents.
///
/// ## Concurrency
///
/// All methods take `&self`. Wrap the engine in an `Arc` to run mutations for
/// different MAC addresses concurrently. A second mutation for a MAC that is
/// already in flight fails with [`Error::Busy`].
pub struct RegistryEngine {
    /// Transport to the remote host store
    transport: Box<dyn HostTransport>,

    /// Current endpoint
    endpoint: EndpointConfig,

    /// Endpoint to connect to on start
    initial_endpoint: Option<String>,

    /// Last known server state
    cache: RegistryCache,

    /// Active modal workflow
    workflow: Mutex<Workflow>,

    /// MAC addresses with a mutation in flight
    in_flight: InFlight,

    /// Notification sender for the presentation layer
    notify_tx: mpsc::Sender<Notification>,
}

impl RegistryEngine {
    /// Create a new engine
    ///
    /// The engine starts in endpoint entry with an empty cache.
    ///
    /// # Returns
    ///
    /// A tuple of (engine, notification_receiver)
    pub fn new(
        transport: Box<dyn HostTransport>,
        config: ClientConfig,
    ) -> Result<(Self, mpsc::Receiver<Notification>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.notification_channel_capacity);

        let engine = Self {
            transport,
            endpoint: EndpointConfig::new(config.api_port),
            initial_endpoint: config.initial_endpoint,
            cache: RegistryCache::new(),
            workflow: Mutex::new(Workflow::awaiting_endpoint()),
            in_flight: InFlight::default(),
            notify_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Connect to the configured initial endpoint, if any
    ///
    /// Without an initial endpoint this leaves the engine in endpoint entry.
    pub async fn start(&self) -> Result<()> {
        match self.initial_endpoint.clone() {
            Some(address) => self.set_endpoint(&address).await,
            None => {
                debug!("No initial endpoint, waiting for endpoint entry");
                Ok(())
            }
        }
    }

    /// Snapshot of the cached hosts, in server order
    pub async fn hosts(&self) -> Vec<HostRecord> {
        self.cache.snapshot().await
    }

    /// The active workflow
    pub fn workflow_state(&self) -> WorkflowState {
        self.lock_workflow().state().clone()
    }

    /// The current endpoint, if one was set
    pub fn endpoint(&self) -> Option<Endpoint> {
        self.endpoint.current()
    }

    /// Open endpoint entry
    pub fn request_endpoint_change(&self) -> Result<()> {
        let result = self.lock_workflow().begin_endpoint_entry();
        result.or_else(|e| self.fail(ENDPOINT_FAILED, e))
    }

    /// Point the client at a new endpoint and reload the cache from it
    ///
    /// Closes endpoint entry. The cache is not cleared; the sync that follows
    /// replaces it on success. The returned result is that of the sync; the
    /// endpoint stays set even when the sync fails.
    pub async fn set_endpoint(&self, address: &str) -> Result<()> {
        let committed = {
            let mut workflow = self.lock_workflow();
            workflow
                .check_endpoint_commit()
                .and_then(|()| self.endpoint.set(address))
                .and_then(|endpoint| workflow.finish_endpoint_entry().map(|()| endpoint))
        };
        let endpoint = committed.or_else(|e| self.fail(ENDPOINT_FAILED, e))?;

        info!("API endpoint set to {}", endpoint);
        self.sync().await.map(|_| ())
    }

    /// Replace the cache with the server's host list
    ///
    /// On failure the cache keeps its previous contents.
    ///
    /// # Returns
    ///
    /// Number of hosts now cached
    pub async fn sync(&self) -> Result<usize> {
        let base_url = self.base_url(SYNC_FAILED)?;

        match self.cache.sync(self.transport.as_ref(), &base_url).await {
            Ok(count) => {
                self.emit(Notification::new(
                    NotificationKind::Refreshed,
                    format!("Loaded {} host(s)", count),
                ));
                Ok(count)
            }
            Err(e) => {
                warn!(
                    "Sync via {} failed, keeping cached hosts: {}",
                    self.transport.transport_name(),
                    e
                );
                self.fail(SYNC_FAILED, e)
            }
        }
    }

    /// Create a host
    ///
    /// MAC and hostname are required; an empty IP lets the server assign one.
    /// Invalid input fails before any network call.
    pub async fn request_add(
        &self,
        mac: &str,
        hostname: &str,
        ip: Option<&str>,
    ) -> Result<HostRecord> {
        let host = NewHost::new(mac, hostname, ip).or_else(|e| self.fail(ADD_FAILED, e))?;

        let guard = self.admit(&host.mac, ADD_FAILED)?;
        let base_url = self.base_url(ADD_FAILED)?;

        let record = match self.transport.create_host(&base_url, &host).await {
            Ok(record) => record,
            Err(e) => {
                warn!("Failed to add host {}: {}", host.mac, e);
                return self.fail(ADD_FAILED, e);
            }
        };

        self.cache.apply_create(record.clone()).await;
        drop(guard);

        info!("Added host {} ({})", record.hostname, record.mac);
        self.emit(Notification::new(
            NotificationKind::Success,
            format!("Added {}", record.hostname),
        ));

        self.resync_after("add").await;
        Ok(record)
    }

    /// Ask for confirmation before deleting the cached host with this MAC
    pub async fn request_delete(&self, mac: &str) -> Result<()> {
        let target = match self.cache.get(mac).await {
            Some(target) => target,
            None => return self.fail(DELETE_FAILED, Error::not_found(mac)),
        };

        let result = self.lock_workflow().begin_delete(target);
        result.or_else(|e| self.fail(DELETE_FAILED, e))?;
        debug!("Confirming delete of {}", mac);
        Ok(())
    }

    /// Delete the host awaiting confirmation
    ///
    /// The confirmation closes as soon as the delete is issued.
    pub async fn confirm_delete(&self) -> Result<()> {
        let result = self.lock_workflow().confirm_delete();
        let target = result.or_else(|e| self.fail(DELETE_FAILED, e))?;
        self.delete_host(&target.mac).await
    }

    /// Dismiss the delete confirmation
    pub fn cancel_delete(&self) -> Result<()> {
        let result = self.lock_workflow().cancel_delete();
        result.or_else(|e| self.fail(DELETE_FAILED, e))
    }

    /// Delete a host on the server, then drop it from the cache
    pub async fn delete_host(&self, mac: &str) -> Result<()> {
        let guard = self.admit(mac, DELETE_FAILED)?;
        let base_url = self.base_url(DELETE_FAILED)?;

        if let Err(e) = self.transport.delete_host(&base_url, mac).await {
            warn!("Failed to delete host {}: {}", mac, e);
            return self.fail(DELETE_FAILED, e);
        }

        self.cache.apply_delete(mac).await;
        drop(guard);

        info!("Deleted host {}", mac);
        self.emit(Notification::new(
            NotificationKind::Success,
            format!("Deleted {}", mac),
        ));

        self.resync_after("delete").await;
        Ok(())
    }

    /// Start editing the cached host with this MAC
    pub async fn request_edit(&self, mac: &str) -> Result<()> {
        let target = match self.cache.get(mac).await {
            Some(target) => target,
            None => return self.fail(UPDATE_FAILED, Error::not_found(mac)),
        };

        let result = self.lock_workflow().begin_edit(target);
        result.or_else(|e| self.fail(UPDATE_FAILED, e))
    }

    /// Change the edit draft
    pub fn update_draft(&self, edit: DraftEdit) -> Result<()> {
        let result = self.lock_workflow().update_draft(edit);
        result.or_else(|e| self.fail(UPDATE_FAILED, e))
    }

    /// Save the edit draft to the server
    ///
    /// An unchanged draft closes the edit without a network call. A draft
    /// without a hostname is rejected and stays open.
    pub async fn save_edit(&self) -> Result<()> {
        let result = self.lock_workflow().save_edit();
        let (target, draft) = result.or_else(|e| self.fail(UPDATE_FAILED, e))?;

        if target == draft {
            debug!("Edit of {} saved without changes", target.mac);
            return Ok(());
        }

        self.update_host(&target.mac, &HostUpdate::from_record(&draft))
            .await
            .map(|_| ())
    }

    /// Discard the edit draft
    pub fn cancel_edit(&self) -> Result<()> {
        let result = self.lock_workflow().cancel_edit();
        result.or_else(|e| self.fail(UPDATE_FAILED, e))
    }

    /// Update a host on the server, then overwrite it in the cache
    pub async fn update_host(&self, mac: &str, update: &HostUpdate) -> Result<HostRecord> {
        let guard = self.admit(mac, UPDATE_FAILED)?;
        let base_url = self.base_url(UPDATE_FAILED)?;

        let record = match self.transport.update_host(&base_url, mac, update).await {
            Ok(record) => record,
            Err(e) => {
                warn!("Failed to update host {}: {}", mac, e);
                return self.fail(UPDATE_FAILED, e);
            }
        };

        if !self.cache.apply_update(record.clone()).await {
            debug!("Updated host {} was not cached", mac);
        }
        drop(guard);

        info!("Updated host {} ({})", record.hostname, record.mac);
        self.emit(Notification::new(
            NotificationKind::Success,
            format!("Updated {}", record.hostname),
        ));

        self.resync_after("update").await;
        Ok(record)
    }

    /// Check if a mutation for this MAC is in flight
    pub fn is_in_flight(&self, mac: &str) -> bool {
        self.in_flight.contains(mac)
    }

    /// Route an intent to the matching operation
    pub async fn dispatch(&self, intent: Intent) -> Result<()> {
        debug!("Dispatching intent: {}", intent.name());
        match intent {
            Intent::ChangeEndpoint => self.request_endpoint_change(),
            Intent::SetEndpoint(address) => self.set_endpoint(&address).await,
            Intent::Refresh => self.sync().await.map(|_| ()),
            Intent::RequestAdd { mac, hostname, ip } => self
                .request_add(&mac, &hostname, ip.as_deref())
                .await
                .map(|_| ()),
            Intent::RequestDelete(mac) => self.request_delete(&mac).await,
            Intent::ConfirmDelete => self.confirm_delete().await,
            Intent::CancelDelete => self.cancel_delete(),
            Intent::RequestEdit(mac) => self.request_edit(&mac).await,
            Intent::UpdateDraft(edit) => self.update_draft(edit),
            Intent::SaveEdit => self.save_edit().await,
            Intent::CancelEdit => self.cancel_edit(),
        }
    }

    fn lock_workflow(&self) -> MutexGuard<'_, Workflow> {
        self.workflow.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn admit(&self, mac: &str, context: &str) -> Result<in_flight::InFlightGuard<'_>> {
        match self.in_flight.acquire(mac) {
            Some(guard) => Ok(guard),
            None => {
                debug!("Rejecting mutation of {}: already in flight", mac);
                self.fail(context, Error::Busy(mac.to_string()))
            }
        }
    }

    fn base_url(&self, context: &str) -> Result<String> {
        self.endpoint.base_url().or_else(|e| self.fail(context, e))
    }

    async fn resync_after(&self, operation: &str) {
        // Failure already reported by sync(); the patched cache stays.
        if let Err(e) = self.sync().await {
            debug!("Sync after {} failed: {}", operation, e);
        }
    }

    fn fail<T>(&self, context: &str, error: Error) -> Result<T> {
        self.emit(Notification::failure(context, &error));
        Err(error)
    }

    fn emit(&self, notification: Notification) {
        if self.notify_tx.try_send(notification).is_err() {
            warn!("Notification channel full or closed, dropping notification");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_message_includes_cause() {
        let n = Notification::failure(ADD_FAILED, &Error::transport("connection refused"));
        assert_eq!(n.kind, NotificationKind::Failure);
        assert!(n.offer_reconfigure);
        assert!(n.message.starts_with(ADD_FAILED));
        assert!(n.message.contains("connection refused"));
    }

    #[test]
    fn test_validation_failure_has_no_reconfigure() {
        let n = Notification::failure(ADD_FAILED, &Error::validation("Hostname is required"));
        assert!(!n.offer_reconfigure);
        assert_eq!(n.message, "Invalid input: Hostname is required");
    }
}
