//! Ownership of an in-flight fetch.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;

use flagcache_core::{FeatureKey, TenantId};

use super::state::{Slot, TenantStateTable};
use super::stats::StatsCounters;

/// Held by the caller that claimed a pair, from the claim until the fetch
/// resolves.
///
/// Unless [`FetchGuard::publish`] consumes it, dropping the guard reverts the
/// pair to Absent and wakes its waiters. This covers fetch errors and panics
/// unwinding through the owner alike; waiters then retry the fetch
/// themselves.
pub(super) struct FetchGuard<'a> {
    table: &'a Mutex<TenantStateTable>,
    shared: &'a Condvar,
    stats: &'a StatsCounters,
    tenant: TenantId,
    key: FeatureKey,
    signal: Option<Arc<Condvar>>,
    published: bool,
}

impl<'a> FetchGuard<'a> {
    /// Arm a guard for a pair that the caller has just set to `Fetching`.
    pub(super) fn new(
        table: &'a Mutex<TenantStateTable>,
        shared: &'a Condvar,
        stats: &'a StatsCounters,
        tenant: TenantId,
        key: FeatureKey,
        signal: Option<Arc<Condvar>>,
    ) -> Self {
        Self {
            table,
            shared,
            stats,
            tenant,
            key,
            signal,
            published: false,
        }
    }

    /// Store the fetched value and wake the pair's waiters.
    pub(super) fn publish(mut self, enabled: bool) {
        let mut table = lock_recovering(self.table);
        table.set(self.tenant, self.key, Slot::Loaded { enabled });
        self.wake();
        self.published = true;
    }

    fn wake(&self) {
        match &self.signal {
            Some(signal) => signal.notify_all(),
            None => self.shared.notify_all(),
        }
    }
}

impl Drop for FetchGuard<'_> {
    fn drop(&mut self) {
        if self.published {
            return;
        }

        if thread::panicking() {
            self.stats.record_panic();
            tracing::error!(
                tenant = %self.tenant,
                key = %self.key,
                "Feature flag fetch panicked, releasing waiters"
            );
        } else {
            self.stats.record_failure();
        }

        let mut table = lock_recovering(self.table);
        table.remove(self.tenant, self.key);
        self.wake();
    }
}

/// The guard cannot report errors, so it works on a poisoned table anyway.
/// The table is never left half-updated: every mutation is a single insert
/// or remove.
fn lock_recovering(table: &Mutex<TenantStateTable>) -> MutexGuard<'_, TenantStateTable> {
    table.lock().unwrap_or_else(PoisonError::into_inner)
}
