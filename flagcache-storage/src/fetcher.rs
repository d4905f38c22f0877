//! Backing-store fetch abstraction.

use flagcache_core::{BoxError, TenantId};

/// Resolves a single flag for a tenant from the backing store.
///
/// Implementations are arbitrary external code: they may block on I/O and
/// are never called while the cache's table lock is held. Timeouts, if
/// needed, belong here; the cache waits for as long as a fetch takes.
pub trait FlagFetcher: Send + Sync {
    /// Fetch whether the flag is enabled for `tenant`.
    fn fetch(&self, tenant: TenantId) -> Result<bool, BoxError>;
}

impl<F> FlagFetcher for F
where
    F: Fn(TenantId) -> Result<bool, BoxError> + Send + Sync,
{
    fn fetch(&self, tenant: TenantId) -> Result<bool, BoxError> {
        self(tenant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EvenTenants;

    impl FlagFetcher for EvenTenants {
        fn fetch(&self, tenant: TenantId) -> Result<bool, BoxError> {
            Ok(tenant.as_i64() % 2 == 0)
        }
    }

    #[test]
    fn test_closure_fetcher() {
        let fetcher = |tenant: TenantId| -> Result<bool, BoxError> {
            if tenant.as_i64() < 0 {
                return Err("negative tenant".into());
            }
            Ok(true)
        };

        assert!(fetcher.fetch(TenantId::new(1)).expect("ok"));
        assert!(fetcher.fetch(TenantId::new(-1)).is_err());
    }

    #[test]
    fn test_trait_object_fetcher() {
        let fetcher: Box<dyn FlagFetcher> = Box::new(EvenTenants);
        assert!(fetcher.fetch(TenantId::new(4)).expect("ok"));
        assert!(!fetcher.fetch(TenantId::new(5)).expect("ok"));
    }
}
