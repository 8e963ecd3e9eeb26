// Per-MAC mutation tracking.
//
// A MAC is "in flight" from the moment a mutation for it is admitted until
// its guard is dropped. Mutations for other MACs are unaffected.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Default)]
pub(crate) struct InFlight {
    macs: Mutex<HashSet<String>>,
}

impl InFlight {
    /// Admit a mutation for `mac`, or `None` if one is already running
    pub(crate) fn acquire(&self, mac: &str) -> Option<InFlightGuard<'_>> {
        let mut macs = self.macs.lock().unwrap_or_else(PoisonError::into_inner);
        if !macs.insert(mac.to_string()) {
            return None;
        }
        Some(InFlightGuard {
            owner: self,
            mac: mac.to_string(),
        })
    }

    pub(crate) fn contains(&self, mac: &str) -> bool {
        self.macs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(mac)
    }
}

pub(crate) struct InFlightGuard<'a> {
    owner: &'a InFlight,
    mac: String,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.owner
            .macs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.mac);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_mac_rejected_until_released() {
        let in_flight = InFlight::default();

        let guard = in_flight.acquire("aa:bb").unwrap();
        assert!(in_flight.acquire("aa:bb").is_none());
        assert!(in_flight.acquire("cc:dd").is_some());

        drop(guard);
        assert!(!in_flight.contains("aa:bb"));
        assert!(in_flight.acquire("aa:bb").is_some());
    }
}
