//! Per-registration serialization of remote fetches.
//!
//! Two detail views of the same vehicle must not race each other: without
//! coordination a slow, older refresh could land after a newer one and
//! overwrite the cache with stale data. `FetchGate` hands out one permit per
//! registration at a time, so fetch-and-store sequences for a key run one
//! after another in the order they asked. Adds and validation passes take
//! the same permit, so at most one lookup per registration is in flight.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::trace;

use crate::api::{LookupError, VehicleLookup};
use crate::models::VehicleDetailRecord;

/// Shared registry of per-registration locks. Clones share the registry.
#[derive(Clone, Default)]
pub struct FetchGate {
    slots: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

/// Held while a fetch for one registration is in flight.
pub struct FetchPermit {
    _guard: OwnedMutexGuard<()>,
}

impl FetchGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other fetch for `registration` is in flight.
    pub async fn acquire(&self, registration: &str) -> FetchPermit {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(slots.entry(registration.to_string()).or_default())
        };
        trace!(registration = %registration, "Waiting for fetch permit");
        FetchPermit {
            _guard: slot.lock_owned().await,
        }
    }

    /// Look up `registration` while holding its permit.
    pub async fn fetch<L: VehicleLookup>(
        &self,
        lookup: &L,
        registration: &str,
    ) -> Result<VehicleDetailRecord, LookupError> {
        let _permit = self.acquire(registration).await;
        lookup.fetch_details(registration).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::testing::{record, MockLookup};

    #[tokio::test]
    async fn test_same_key_is_exclusive() {
        let gate = &FetchGate::new();
        let active = &AtomicUsize::new(0);
        let peak = &AtomicUsize::new(0);

        let work = move || async move {
            let _permit = gate.acquire("SW03PER").await;
            let now = active.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            tokio::task::yield_now().await;
            active.fetch_sub(1, Ordering::SeqCst);
        };

        tokio::join!(work(), work(), work());
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fetch_waits_for_permit() {
        let gate = FetchGate::new();
        let lookup = MockLookup::new().with_record(record("SW03PER", "FORD", "SILVER", 2003));

        let (first, second) = tokio::join!(
            gate.fetch(&lookup, "SW03PER"),
            gate.fetch(&lookup, "SW03PER")
        );

        assert_eq!(first, second);
        assert_eq!(lookup.calls(), 2);
        assert_eq!(lookup.peak_concurrency(), 1);
    }

    #[tokio::test]
    async fn test_different_keys_do_not_block() {
        let gate = FetchGate::new();
        let first = gate.acquire("ABC123").await;
        // Would deadlock if keys shared a lock
        let second = gate.acquire("XYZ789").await;
        drop(first);
        drop(second);
        let _again = gate.acquire("ABC123").await;
    }
}
