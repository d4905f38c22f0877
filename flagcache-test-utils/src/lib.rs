//! Flagcache Test Utilities
//!
//! Shared test infrastructure for the flagcache workspace:
//! - Fetchers that count, delay, fail on script, block on a gate, or panic
//! - Registry/cache fixtures
//! - Proptest generators for identifiers
//! - Tracing setup for test output

pub use flagcache_core::{
    BoxError, CacheConfig, FeatureKey, FlagError, FlagResult, RegistryError, TenantId,
    WaitStrategy,
};
pub use flagcache_storage::{
    CacheStats, EntryState, FlagDefinition, FlagFetcher, FlagRegistry, TenantFlagCache,
};

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, Once};
use std::thread;
use std::time::{Duration, Instant};

// ============================================================================
// TRACING
// ============================================================================

static TRACING: Once = Once::new();

/// Install a test subscriber honouring `RUST_LOG`. Safe to call from every test.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

// ============================================================================
// ERRORS
// ============================================================================

/// The backing store is unreachable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("backend down")]
pub struct BackendDown;

// ============================================================================
// FETCHERS
// ============================================================================

/// One scripted fetch result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Enabled,
    Disabled,
    BackendDown,
    Panic,
}

impl Outcome {
    fn resolve(self) -> Result<bool, BoxError> {
        match self {
            Outcome::Enabled => Ok(true),
            Outcome::Disabled => Ok(false),
            Outcome::BackendDown => Err(Box::new(BackendDown)),
            Outcome::Panic => panic!("scripted fetch panic"),
        }
    }
}

/// A fetcher that records every call and plays back a script.
///
/// Once the script is exhausted every further call returns `fallback`.
/// Cloning shares the call counter and script.
#[derive(Debug, Clone)]
pub struct ScriptedFetcher {
    inner: Arc<ScriptedInner>,
}

#[derive(Debug)]
struct ScriptedInner {
    calls: AtomicUsize,
    script: Mutex<VecDeque<Outcome>>,
    fallback: Outcome,
    delay: Duration,
    gate: Option<Gate>,
}

impl ScriptedFetcher {
    /// Always returns `outcome`.
    pub fn always(outcome: Outcome) -> Self {
        Self::script([], outcome)
    }

    /// Returns `script` in order, then `fallback` forever.
    pub fn script(script: impl IntoIterator<Item = Outcome>, fallback: Outcome) -> Self {
        Self {
            inner: Arc::new(ScriptedInner {
                calls: AtomicUsize::new(0),
                script: Mutex::new(script.into_iter().collect()),
                fallback,
                delay: Duration::ZERO,
                gate: None,
            }),
        }
    }

    /// Sleep for `delay` before answering. Must be called before cloning.
    pub fn with_delay(self, delay: Duration) -> Self {
        self.rebuild(|inner| inner.delay = delay)
    }

    /// Block on `gate` before answering. Must be called before cloning.
    pub fn with_gate(self, gate: Gate) -> Self {
        self.rebuild(|inner| inner.gate = Some(gate))
    }

    fn rebuild(self, update: impl FnOnce(&mut ScriptedInner)) -> Self {
        let mut inner = Arc::try_unwrap(self.inner).expect("fetcher configured before sharing");
        update(&mut inner);
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Number of times the backing store was hit.
    pub fn calls(&self) -> usize {
        self.inner.calls.load(Ordering::SeqCst)
    }
}

impl FlagFetcher for ScriptedFetcher {
    fn fetch(&self, _tenant: TenantId) -> Result<bool, BoxError> {
        self.inner.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.inner.gate {
            gate.wait();
        }
        if !self.inner.delay.is_zero() {
            thread::sleep(self.inner.delay);
        }
        let next = self
            .inner
            .script
            .lock()
            .expect("script lock")
            .pop_front()
            .unwrap_or(self.inner.fallback);
        next.resolve()
    }
}

/// A one-shot latch that blocks fetchers until the test opens it.
#[derive(Debug, Clone, Default)]
pub struct Gate {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl Gate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&self) {
        let (open, condvar) = &*self.inner;
        *open.lock().expect("gate lock") = true;
        condvar.notify_all();
    }

    pub fn wait(&self) {
        let (open, condvar) = &*self.inner;
        let mut is_open = open.lock().expect("gate lock");
        while !*is_open {
            is_open = condvar.wait(is_open).expect("gate lock");
        }
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

/// Build a cache with one flag per `(key, fetcher)` pair.
pub fn cache_with_flags(
    config: CacheConfig,
    flags: impl IntoIterator<Item = (FeatureKey, ScriptedFetcher)>,
) -> Arc<TenantFlagCache> {
    let mut builder = FlagRegistry::builder();
    for (key, fetcher) in flags {
        builder
            .register(FlagDefinition::new(key, format!("flag {key}"), "tests", fetcher))
            .expect("fixture keys are unique");
    }
    Arc::new(TenantFlagCache::new(Arc::new(builder.build()), config))
}

/// Poll `condition` until it holds, panicking after `timeout`.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + timeout;
    while !condition() {
        assert!(Instant::now() < deadline, "condition not reached within {timeout:?}");
        thread::sleep(Duration::from_millis(1));
    }
}

/// Wait until at least `waits` callers have blocked on in-flight fetches.
pub fn wait_for_waiters(cache: &TenantFlagCache, waits: u64) {
    wait_until(Duration::from_secs(5), || {
        cache.stats().expect("stats").waits >= waits
    });
}

// ============================================================================
// GENERATORS
// ============================================================================

pub mod generators {
    use super::*;
    use proptest::prelude::*;

    /// A small fixed key space, so generated operations collide often.
    pub const KEYS: [FeatureKey; 4] = [
        FeatureKey::new("logs.username"),
        FeatureKey::new("logs.nickname"),
        FeatureKey::new("automod.enabled"),
        FeatureKey::new("reputation.enabled"),
    ];

    pub fn tenant_id_strategy() -> impl Strategy<Value = TenantId> {
        (-4i64..4).prop_map(TenantId::new)
    }

    pub fn feature_key_strategy() -> impl Strategy<Value = FeatureKey> {
        prop::sample::select(KEYS.to_vec())
    }

    pub fn outcome_strategy() -> impl Strategy<Value = Outcome> {
        prop_oneof![
            Just(Outcome::Enabled),
            Just(Outcome::Disabled),
            Just(Outcome::BackendDown),
        ]
    }
}
