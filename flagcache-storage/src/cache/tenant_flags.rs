//! The tenant flag cache.

use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::Instant;

use flagcache_core::{CacheConfig, FeatureKey, FlagError, FlagResult, TenantId, WaitStrategy};

use super::fetch_guard::FetchGuard;
use super::state::{EntryState, Slot, TenantStateTable};
use super::stats::{CacheStats, StatsCounters};
use crate::registry::{FlagDefinition, FlagRegistry};

/// Boolean feature flags per tenant, fetched at most once concurrently per
/// (tenant, key) pair and kept for the lifetime of the cache.
///
/// One mutex guards the whole state table. Callers that find their pair
/// being fetched by someone else wait on a condition variable tied to that
/// mutex: the table-wide one under [`WaitStrategy::Shared`], or the pair's
/// own under [`WaitStrategy::PerKey`].
///
/// The cache is `Sync`; share it behind an `Arc`.
pub struct TenantFlagCache {
    registry: Arc<FlagRegistry>,
    config: CacheConfig,
    table: Mutex<TenantStateTable>,
    /// Signalled on every completion under `WaitStrategy::Shared`.
    changed: Condvar,
    stats: StatsCounters,
}

impl TenantFlagCache {
    pub fn new(registry: Arc<FlagRegistry>, config: CacheConfig) -> Self {
        Self {
            registry,
            config,
            table: Mutex::new(TenantStateTable::default()),
            changed: Condvar::new(),
            stats: StatsCounters::default(),
        }
    }

    pub fn with_defaults(registry: Arc<FlagRegistry>) -> Self {
        Self::new(registry, CacheConfig::default())
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn registry(&self) -> &FlagRegistry {
        &self.registry
    }

    /// Whether `key` is enabled for `tenant`.
    ///
    /// Returns the loaded value when present. If another caller is fetching
    /// the pair, blocks until it resolves and checks again. Otherwise claims
    /// the pair and fetches it from the backing store outside the lock.
    ///
    /// A failed fetch is returned only to the caller that ran it. The pair
    /// goes back to Absent, so callers that were waiting on it, and any later
    /// caller, fetch again themselves. A panicking fetch behaves the same for
    /// the cache and keeps unwinding into the caller that ran it.
    pub fn get_flag(&self, tenant: TenantId, key: FeatureKey) -> FlagResult<bool> {
        let definition = self.registry.lookup(key)?;

        let mut table = self.lock_table()?;
        table.tenant_mut(tenant);

        loop {
            let signal = match table.get(tenant, key) {
                Some(Slot::Loaded { enabled }) => {
                    self.stats.record_hit();
                    return Ok(*enabled);
                }
                Some(Slot::Fetching { signal }) => signal.clone(),
                None => break,
            };

            // Woken by any completion under the shared strategy, or spuriously;
            // the loop re-reads the pair either way.
            self.stats.record_wait();
            tracing::debug!(tenant = %tenant, key = %key, "Waiting on in-flight flag fetch");
            let condvar = signal.as_deref().unwrap_or(&self.changed);
            table = condvar.wait(table).map_err(|_| FlagError::LockPoisoned)?;
        }

        let signal = match self.config.wait_strategy {
            WaitStrategy::Shared => None,
            WaitStrategy::PerKey => Some(Arc::new(Condvar::new())),
        };
        table.set(tenant, key, Slot::Fetching { signal: signal.clone() });
        self.stats.record_miss();
        drop(table);

        self.fetch(definition, tenant, signal)
    }

    /// Runs the backend fetch for a pair the caller has claimed. Must be
    /// called without the table lock.
    fn fetch(
        &self,
        definition: &FlagDefinition,
        tenant: TenantId,
        signal: Option<Arc<Condvar>>,
    ) -> FlagResult<bool> {
        let key = definition.key();
        let guard = FetchGuard::new(&self.table, &self.changed, &self.stats, tenant, key, signal);
        tracing::debug!(tenant = %tenant, key = %key, "Fetching feature flag");

        let started = Instant::now();
        let outcome = definition.fetcher().fetch(tenant);
        let elapsed = started.elapsed();
        if elapsed >= self.config.slow_fetch_threshold() {
            tracing::warn!(
                tenant = %tenant,
                key = %key,
                elapsed_ms = elapsed.as_millis() as u64,
                "Slow feature flag fetch"
            );
        }

        match outcome {
            Ok(enabled) => {
                guard.publish(enabled);
                tracing::debug!(tenant = %tenant, key = %key, enabled, "Loaded feature flag");
                Ok(enabled)
            }
            Err(e) => {
                drop(guard);
                tracing::warn!(tenant = %tenant, key = %key, error = %e, "Feature flag fetch failed");
                Err(FlagError::fetch(tenant, key, definition.name(), e))
            }
        }
    }

    /// Current state of a pair, without fetching or waiting on it.
    /// `None` means the pair is Absent.
    pub fn peek(&self, tenant: TenantId, key: FeatureKey) -> FlagResult<Option<EntryState>> {
        let table = self.lock_table()?;
        Ok(table.get(tenant, key).map(Slot::state))
    }

    pub fn stats(&self) -> FlagResult<CacheStats> {
        let table = self.lock_table()?;
        Ok(self.stats.snapshot(table.tenant_count(), table.loaded_count()))
    }

    fn lock_table(&self) -> FlagResult<MutexGuard<'_, TenantStateTable>> {
        self.table.lock().map_err(|_| FlagError::LockPoisoned)
    }
}
