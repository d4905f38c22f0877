//! Per-tenant flag state table.

use std::collections::HashMap;
use std::sync::{Arc, Condvar};

use flagcache_core::{FeatureKey, TenantId};

/// Public view of a pair's state. Absent pairs have no entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    /// A caller is fetching the flag from the backing store.
    Fetching,
    /// The fetch completed; `enabled` is authoritative for the process lifetime.
    Loaded { enabled: bool },
}

/// Stored state of a materialized pair.
#[derive(Debug)]
pub(crate) enum Slot {
    /// `signal` is the pair's own condition variable when waiting per key,
    /// `None` when waiters share the table-wide one.
    Fetching { signal: Option<Arc<Condvar>> },
    Loaded { enabled: bool },
}

impl Slot {
    pub(crate) fn state(&self) -> EntryState {
        match self {
            Slot::Fetching { .. } => EntryState::Fetching,
            Slot::Loaded { enabled } => EntryState::Loaded { enabled: *enabled },
        }
    }
}

/// `tenant -> (key -> slot)`. Only ever touched under the cache's lock.
#[derive(Debug, Default)]
pub(crate) struct TenantStateTable {
    tenants: HashMap<TenantId, HashMap<FeatureKey, Slot>>,
}

impl TenantStateTable {
    /// The tenant's flags, created on first access.
    pub(crate) fn tenant_mut(&mut self, tenant: TenantId) -> &mut HashMap<FeatureKey, Slot> {
        self.tenants.entry(tenant).or_default()
    }

    pub(crate) fn get(&self, tenant: TenantId, key: FeatureKey) -> Option<&Slot> {
        self.tenants.get(&tenant)?.get(&key)
    }

    pub(crate) fn set(&mut self, tenant: TenantId, key: FeatureKey, slot: Slot) {
        self.tenant_mut(tenant).insert(key, slot);
    }

    /// Drop the pair back to Absent. The tenant's map is kept.
    pub(crate) fn remove(&mut self, tenant: TenantId, key: FeatureKey) -> Option<Slot> {
        self.tenants.get_mut(&tenant)?.remove(&key)
    }

    pub(crate) fn tenant_count(&self) -> usize {
        self.tenants.len()
    }

    pub(crate) fn loaded_count(&self) -> usize {
        self.tenants
            .values()
            .flat_map(|flags| flags.values())
            .filter(|slot| matches!(slot, Slot::Loaded { .. }))
            .count()
    }
}
