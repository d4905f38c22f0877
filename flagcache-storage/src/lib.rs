//! Flagcache Storage - Registry and Tenant Flag Cache
//!
//! Answers "is feature X enabled for tenant Y" from memory, reaching the
//! backing store at most once concurrently per (tenant, feature) pair.
//!
//! Startup registers every flag into a [`FlagRegistryBuilder`]; the built
//! [`FlagRegistry`] is then frozen and handed to a [`TenantFlagCache`]:
//!
//! ```
//! use std::sync::Arc;
//! use flagcache_core::{FeatureKey, TenantId};
//! use flagcache_storage::{FlagRegistry, TenantFlagCache};
//!
//! const USERNAME_LOGGING: FeatureKey = FeatureKey::new("logs.username");
//!
//! let mut builder = FlagRegistry::builder();
//! builder
//!     .register_fn(USERNAME_LOGGING, "Username logging", "logs", |_tenant| Ok(true))
//!     .expect("unique key");
//!
//! let cache = TenantFlagCache::with_defaults(Arc::new(builder.build()));
//! assert!(cache.get_flag(TenantId::new(42), USERNAME_LOGGING).expect("fetch succeeds"));
//! ```

pub mod cache;
pub mod fetcher;
pub mod registry;

pub use cache::{CacheStats, EntryState, TenantFlagCache};
pub use fetcher::FlagFetcher;
pub use registry::{FlagDefinition, FlagModule, FlagRegistry, FlagRegistryBuilder};
