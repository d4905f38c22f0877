//! Error types for flag registration and lookup

use crate::{FeatureKey, TenantId};
use thiserror::Error;

/// Error type returned by backing-store fetch functions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Registry misuse. Both variants are programming errors, never transient.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Feature flag {key} registered twice (owned by {existing_owner}, re-registered by {new_owner})")]
    DuplicateKey {
        key: FeatureKey,
        existing_owner: String,
        new_owner: String,
    },

    #[error("Feature flag {key} is not registered")]
    UnregisteredKey { key: FeatureKey },
}

/// Master error type for flag lookups.
#[derive(Debug, Error)]
pub enum FlagError {
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Fetching flag {name} ({key}) for tenant {tenant} failed")]
    Fetch {
        tenant: TenantId,
        key: FeatureKey,
        name: String,
        #[source]
        source: BoxError,
    },

    #[error("Flag state table lock poisoned")]
    LockPoisoned,
}

impl FlagError {
    /// Wrap a backend error with the pair it was fetched for.
    pub fn fetch(tenant: TenantId, key: FeatureKey, name: impl Into<String>, source: BoxError) -> Self {
        Self::Fetch {
            tenant,
            key,
            name: name.into(),
            source,
        }
    }

    /// Whether calling again may succeed. Only backend failures qualify;
    /// the failed pair is reverted so the next call fetches again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Fetch { .. })
    }

    /// The backend error, if this is a fetch failure.
    pub fn backend_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            Self::Fetch { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Result type alias for flag operations.
pub type FlagResult<T> = Result<T, FlagError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    const KEY: FeatureKey = FeatureKey::new("logs.username");

    #[derive(Debug, Error)]
    #[error("connection refused")]
    struct ConnectionRefused;

    #[test]
    fn test_registry_error_display_duplicate() {
        let err = RegistryError::DuplicateKey {
            key: KEY,
            existing_owner: "logs".to_string(),
            new_owner: "moderation".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("logs.username"));
        assert!(msg.contains("registered twice"));
        assert!(msg.contains("moderation"));
    }

    #[test]
    fn test_fetch_error_keeps_backend_error_as_source() {
        let err = FlagError::fetch(TenantId::new(7), KEY, "Username logging", Box::new(ConnectionRefused));
        let msg = format!("{}", err);
        assert!(msg.contains("Username logging"));
        assert!(msg.contains("tenant 7"));
        assert!(!msg.contains("connection refused"), "source is reported by the chain, not the message");

        let source = err.source().expect("fetch error has a source");
        assert!(source.downcast_ref::<ConnectionRefused>().is_some());
        assert!(err
            .backend_error()
            .and_then(|e| e.downcast_ref::<ConnectionRefused>())
            .is_some());
    }

    #[test]
    fn test_retryable_classification() {
        let fetch = FlagError::fetch(TenantId::new(1), KEY, "x", Box::new(ConnectionRefused));
        assert!(fetch.is_retryable());

        let unregistered = FlagError::from(RegistryError::UnregisteredKey { key: KEY });
        assert!(!unregistered.is_retryable());
        assert!(unregistered.backend_error().is_none());
        assert!(!FlagError::LockPoisoned.is_retryable());
    }

    #[test]
    fn test_flag_error_from_registry_error() {
        let err = FlagError::from(RegistryError::UnregisteredKey { key: KEY });
        assert!(matches!(
            err,
            FlagError::Registry(RegistryError::UnregisteredKey { key }) if key == KEY
        ));
    }

    #[test]
    fn test_fetch_error_chain_ends_at_backend_error() {
        let err = FlagError::fetch(TenantId::new(1), KEY, "x", Box::new(ConnectionRefused));

        let mut chain = Vec::new();
        let mut current: Option<&(dyn std::error::Error + 'static)> = Some(&err);
        while let Some(e) = current {
            chain.push(e.to_string());
            current = e.source();
        }

        assert_eq!(chain.len(), 2);
        assert_eq!(chain[1], "connection refused");
    }
}
