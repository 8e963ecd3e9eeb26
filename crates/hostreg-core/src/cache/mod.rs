// # Registry Cache
//
// The client's copy of the remote host store.
//
// ## Update Policy
//
// - `sync()` replaces the whole sequence from a remote list (no diffing)
// - A failed sync leaves the cache untouched (stale but available)
// - `apply_*` patches are applied only after the remote store accepted the change
// - Readers get an owned snapshot in server order; the cache never sorts
//
// ## Invariant
//
// No two cached records share a MAC address.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::Result;
use crate::traits::{HostRecord, HostTransport};

/// Last known server state
///
/// Cloning shares the underlying storage.
#[derive(Debug, Clone, Default)]
pub struct RegistryCache {
    inner: Arc<RwLock<Vec<HostRecord>>>,
}

impl RegistryCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the remote list and replace the cached sequence with it
    ///
    /// # Returns
    ///
    /// - `Ok(usize)`: Number of records now cached
    /// - `Err(Error)`: The list call failed; the cache is unchanged
    pub async fn sync(&self, transport: &dyn HostTransport, base_url: &str) -> Result<usize> {
        let records = transport.list_hosts(base_url).await?;
        Ok(self.replace(records).await)
    }

    /// Replace the cached sequence wholesale
    ///
    /// Records repeating an earlier MAC are dropped.
    pub async fn replace(&self, records: Vec<HostRecord>) -> usize {
        let records = dedup_by_mac(records);
        let count = records.len();

        let mut guard = self.inner.write().await;
        *guard = records;
        debug!("Registry cache replaced: {} host(s)", count);
        count
    }

    /// Record a host the server created
    ///
    /// A cached record with the same MAC is replaced in place.
    pub async fn apply_create(&self, record: HostRecord) {
        let mut guard = self.inner.write().await;
        match guard.iter_mut().find(|r| r.mac == record.mac) {
            Some(existing) => *existing = record,
            None => guard.push(record),
        }
    }

    /// Drop the host the server deleted
    ///
    /// Returns `true` if a record was removed.
    pub async fn apply_delete(&self, mac: &str) -> bool {
        let mut guard = self.inner.write().await;
        let before = guard.len();
        guard.retain(|r| r.mac != mac);
        guard.len() != before
    }

    /// Overwrite a host the server updated
    ///
    /// Returns `false` if no record with that MAC is cached.
    pub async fn apply_update(&self, record: HostRecord) -> bool {
        let mut guard = self.inner.write().await;
        match guard.iter_mut().find(|r| r.mac == record.mac) {
            Some(existing) => {
                *existing = record;
                true
            }
            None => false,
        }
    }

    /// Owned copy of the cached records, in server order
    pub async fn snapshot(&self) -> Vec<HostRecord> {
        self.inner.read().await.clone()
    }

    /// Look up a record by MAC address
    pub async fn get(&self, mac: &str) -> Option<HostRecord> {
        self.inner.read().await.iter().find(|r| r.mac == mac).cloned()
    }

    /// Get the number of cached records
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if the cache is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

fn dedup_by_mac(records: Vec<HostRecord>) -> Vec<HostRecord> {
    let mut seen = HashSet::with_capacity(records.len());
    records
        .into_iter()
        .filter(|record| {
            let fresh = seen.insert(record.mac.clone());
            if !fresh {
                warn!("Server listed MAC {} more than once, keeping the first", record.mac);
            }
            fresh
        })
        .collect()
}
