//! Process-wide registry of feature flag definitions.
//!
//! Registration happens once at startup through a [`FlagRegistryBuilder`].
//! `build()` freezes the set; a [`FlagRegistry`] has no mutating methods, so
//! every registration happens-before any lookup made through it.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use flagcache_core::{BoxError, FeatureKey, FlagResult, RegistryError, TenantId};

use crate::fetcher::FlagFetcher;

/// An immutable feature flag definition.
#[derive(Clone)]
pub struct FlagDefinition {
    key: FeatureKey,
    name: String,
    owner: String,
    fetcher: Arc<dyn FlagFetcher>,
}

impl FlagDefinition {
    /// Create a definition.
    ///
    /// * `key` - identity of the flag
    /// * `name` - human readable name, used in errors and logs
    /// * `owner` - the module that registered the flag
    /// * `fetcher` - resolves the flag for a tenant from the backing store
    pub fn new(
        key: FeatureKey,
        name: impl Into<String>,
        owner: impl Into<String>,
        fetcher: impl FlagFetcher + 'static,
    ) -> Self {
        Self {
            key,
            name: name.into(),
            owner: owner.into(),
            fetcher: Arc::new(fetcher),
        }
    }

    pub fn key(&self) -> FeatureKey {
        self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn fetcher(&self) -> &dyn FlagFetcher {
        self.fetcher.as_ref()
    }
}

impl fmt::Debug for FlagDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlagDefinition")
            .field("key", &self.key)
            .field("name", &self.name)
            .field("owner", &self.owner)
            .finish_non_exhaustive()
    }
}

/// A module that owns a set of feature flags.
pub trait FlagModule {
    /// Name recorded as the owner of every flag this module registers.
    fn owner(&self) -> &str;

    /// Register this module's flags.
    fn register_flags(&self, registry: &mut FlagRegistryBuilder) -> FlagResult<()>;
}

/// Collects flag definitions during startup.
#[derive(Debug, Default)]
pub struct FlagRegistryBuilder {
    flags: HashMap<FeatureKey, FlagDefinition>,
}

impl FlagRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition.
    ///
    /// A key may only be registered once. A second registration is a
    /// configuration error; the first definition is kept and the caller is
    /// expected to abort startup.
    pub fn register(&mut self, definition: FlagDefinition) -> FlagResult<()> {
        if let Some(existing) = self.flags.get(&definition.key) {
            tracing::error!(
                key = %definition.key,
                existing_owner = %existing.owner,
                new_owner = %definition.owner,
                "Duplicate feature flag registration"
            );
            return Err(RegistryError::DuplicateKey {
                key: definition.key,
                existing_owner: existing.owner.clone(),
                new_owner: definition.owner.clone(),
            }
            .into());
        }

        tracing::debug!(key = %definition.key, name = %definition.name, owner = %definition.owner, "Registered feature flag");
        self.flags.insert(definition.key, definition);
        Ok(())
    }

    /// Register a flag backed by a closure.
    pub fn register_fn<F>(
        &mut self,
        key: FeatureKey,
        name: impl Into<String>,
        owner: impl Into<String>,
        fetch: F,
    ) -> FlagResult<()>
    where
        F: Fn(TenantId) -> Result<bool, BoxError> + Send + Sync + 'static,
    {
        self.register(FlagDefinition::new(key, name, owner, fetch))
    }

    /// Let `module` register its flags, stopping at the first error.
    pub fn register_module(&mut self, module: &dyn FlagModule) -> FlagResult<()> {
        let before = self.flags.len();
        module.register_flags(self)?;
        tracing::debug!(
            owner = module.owner(),
            count = self.flags.len() - before,
            "Registered module feature flags"
        );
        Ok(())
    }

    /// Freeze the registry.
    pub fn build(self) -> FlagRegistry {
        FlagRegistry { flags: self.flags }
    }
}

/// Frozen mapping from [`FeatureKey`] to [`FlagDefinition`].
#[derive(Debug, Default)]
pub struct FlagRegistry {
    flags: HashMap<FeatureKey, FlagDefinition>,
}

impl FlagRegistry {
    pub fn builder() -> FlagRegistryBuilder {
        FlagRegistryBuilder::new()
    }

    /// Look up the definition for `key`.
    ///
    /// An unregistered key means a caller is using a flag whose module never
    /// registered it. This is reported as [`RegistryError::UnregisteredKey`]
    /// and never retried.
    pub fn lookup(&self, key: FeatureKey) -> FlagResult<&FlagDefinition> {
        match self.flags.get(&key) {
            Some(definition) => Ok(definition),
            None => {
                tracing::error!(key = %key, "Lookup of unregistered feature flag");
                Err(RegistryError::UnregisteredKey { key }.into())
            }
        }
    }

    pub fn contains(&self, key: FeatureKey) -> bool {
        self.flags.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// All registered keys, sorted.
    pub fn keys(&self) -> Vec<FeatureKey> {
        let mut keys: Vec<FeatureKey> = self.flags.keys().copied().collect();
        keys.sort();
        keys
    }
}
