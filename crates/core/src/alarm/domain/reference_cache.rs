use std::sync::{Mutex, PoisonError, RwLock};

use crate::fingerprint::domain::fingerprint::Fingerprint;

/// Write-once slot for a watch-list entry's reference fingerprint.
///
/// Share one cache (behind an `Arc`) between every task that refers to the
/// same watch-list entry. Readers take a read lock; the first caller to find
/// the slot empty computes under a separate mutex so concurrent first use
/// computes once, then publishes under the write lock. A computation that
/// yields nothing leaves the slot empty so a later call may try again.
#[derive(Debug, Default)]
pub struct ReferenceCache {
    slot: RwLock<Option<Fingerprint>>,
    compute: Mutex<()>,
}

impl ReferenceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fingerprint(fingerprint: Fingerprint) -> Self {
        Self {
            slot: RwLock::new(Some(fingerprint)),
            compute: Mutex::new(()),
        }
    }

    pub fn get(&self) -> Option<Fingerprint> {
        *self.slot.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the cached fingerprint, computing and publishing it first
    /// if the slot is empty.
    pub fn get_or_compute<F>(&self, compute: F) -> Option<Fingerprint>
    where
        F: FnOnce() -> Option<Fingerprint>,
    {
        if let Some(fp) = self.get() {
            return Some(fp);
        }

        let _guard = self.compute.lock().unwrap_or_else(PoisonError::into_inner);
        // Another caller may have published while we waited.
        if let Some(fp) = self.get() {
            return Some(fp);
        }

        let computed = compute();
        if let Some(fp) = computed {
            *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(fp);
        }
        computed
    }
}
