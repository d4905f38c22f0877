//! Property tests: sequential lookups against a reference model.

use std::collections::{HashMap, VecDeque};

use flagcache_test_utils::generators::{feature_key_strategy, outcome_strategy, tenant_id_strategy, KEYS};
use flagcache_test_utils::{
    cache_with_flags, CacheConfig, EntryState, FeatureKey, Outcome, ScriptedFetcher, TenantId,
    WaitStrategy,
};
use proptest::prelude::*;

/// What the cache should do, given each key's scripted backend answers.
#[derive(Default)]
struct Model {
    scripts: HashMap<FeatureKey, VecDeque<Outcome>>,
    loaded: HashMap<(TenantId, FeatureKey), bool>,
    fetches: HashMap<FeatureKey, usize>,
}

impl Model {
    /// `Some(enabled)` on success, `None` on a backend failure.
    fn get_flag(&mut self, tenant: TenantId, key: FeatureKey) -> Option<bool> {
        if let Some(enabled) = self.loaded.get(&(tenant, key)) {
            return Some(*enabled);
        }
        *self.fetches.entry(key).or_default() += 1;
        let outcome = self
            .scripts
            .get_mut(&key)
            .and_then(VecDeque::pop_front)
            .unwrap_or(Outcome::Enabled);
        let enabled = match outcome {
            Outcome::Enabled => true,
            Outcome::Disabled => false,
            _ => return None,
        };
        self.loaded.insert((tenant, key), enabled);
        Some(enabled)
    }
}

fn scripts_strategy() -> impl Strategy<Value = Vec<Vec<Outcome>>> {
    prop::collection::vec(prop::collection::vec(outcome_strategy(), 0..6), KEYS.len())
}

fn ops_strategy() -> impl Strategy<Value = Vec<(TenantId, FeatureKey)>> {
    prop::collection::vec((tenant_id_strategy(), feature_key_strategy()), 1..64)
}

fn strategy_strategy() -> impl Strategy<Value = WaitStrategy> {
    prop_oneof![Just(WaitStrategy::Shared), Just(WaitStrategy::PerKey)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Property: the cache agrees with the model on every lookup, fetches
    /// exactly as often, and leaves no pair stuck in `Fetching`.
    #[test]
    fn prop_cache_matches_model(
        scripts in scripts_strategy(),
        ops in ops_strategy(),
        wait_strategy in strategy_strategy(),
    ) {
        let fetchers: Vec<(FeatureKey, ScriptedFetcher)> = KEYS
            .iter()
            .zip(&scripts)
            .map(|(key, script)| (*key, ScriptedFetcher::script(script.clone(), Outcome::Enabled)))
            .collect();
        let cache = cache_with_flags(
            CacheConfig::new().with_wait_strategy(wait_strategy),
            fetchers.iter().cloned(),
        );

        let mut model = Model::default();
        for (key, script) in KEYS.iter().zip(&scripts) {
            model.scripts.insert(*key, script.iter().copied().collect());
        }

        for (tenant, key) in ops {
            let expected = model.get_flag(tenant, key);
            let actual = cache.get_flag(tenant, key);
            match expected {
                Some(enabled) => prop_assert_eq!(actual.expect("model expects success"), enabled),
                None => {
                    let err = actual.expect_err("model expects failure");
                    prop_assert!(err.is_retryable());
                }
            }

            let state = cache.peek(tenant, key).expect("peek");
            prop_assert_ne!(state, Some(EntryState::Fetching));
            prop_assert_eq!(state.is_some(), expected.is_some());
        }

        for (key, fetcher) in &fetchers {
            prop_assert_eq!(
                fetcher.calls(),
                model.fetches.get(key).copied().unwrap_or(0),
                "fetch count for {}", key
            );
        }
        prop_assert_eq!(cache.stats().expect("stats").loaded_entries as usize, model.loaded.len());
    }
}
