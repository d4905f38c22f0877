//! Flagcache Core - Shared Types
//!
//! Identifiers, errors and configuration shared by the registry, the tenant
//! flag cache and the test fixtures. This crate contains no coordination
//! logic.

pub mod config;
pub mod error;
pub mod identity;

pub use config::{CacheConfig, ConfigError, WaitStrategy};
pub use error::{BoxError, FlagError, FlagResult, RegistryError};
pub use identity::{FeatureKey, TenantId};
