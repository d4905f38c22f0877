//! Identity types for tenants and feature flags

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of the tenant a flag is resolved for (a server, a workspace).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(i64);

impl TenantId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn as_i64(self) -> i64 {
        self.0
    }
}

impl From<i64> for TenantId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a registered feature flag.
///
/// Keys are declared as constants by the module that owns the flag:
///
/// ```
/// use flagcache_core::FeatureKey;
///
/// pub const USERNAME_LOGGING: FeatureKey = FeatureKey::new("logs.username");
/// ```
///
/// The cache treats a key purely as an identity; two keys are the same flag
/// iff their identifiers are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct FeatureKey(&'static str);

impl FeatureKey {
    pub const fn new(id: &'static str) -> Self {
        Self(id)
    }

    pub const fn as_str(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for FeatureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}
