//! TTL cache in front of the policy store
//!
//! A fetched policy stays fresh for the configured TTL; within that window
//! every lookup is served from memory. The cached entry is swapped
//! wholesale, so concurrent readers always observe a complete policy.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::policy::GuardrailPolicy;
use super::store::PolicyStore;

#[derive(Debug, Clone)]
struct CachedPolicy {
    policy: Arc<GuardrailPolicy>,
    fetched_at: Instant,
}

/// Caching policy provider
#[derive(Debug)]
pub struct PolicyCache {
    store: Arc<dyn PolicyStore>,
    policy_name: String,
    ttl: Duration,
    cached: RwLock<Option<CachedPolicy>>,
}

impl PolicyCache {
    pub fn new(store: Arc<dyn PolicyStore>, policy_name: impl Into<String>, ttl: Duration) -> Self {
        Self {
            store,
            policy_name: policy_name.into(),
            ttl,
            cached: RwLock::new(None),
        }
    }

    /// Return the active policy, refreshing from the store when the cached
    /// entry is missing, stale, or `force_refresh` is set.
    ///
    /// A refresh that fails falls back to the fail-closed default without
    /// caching it, so the next lookup retries the store.
    pub async fn get(&self, force_refresh: bool) -> Arc<GuardrailPolicy> {
        if !force_refresh {
            let guard = self.cached.read().await;
            if let Some(cached) = guard.as_ref() {
                if cached.fetched_at.elapsed() < self.ttl {
                    return Arc::clone(&cached.policy);
                }
            }
        }

        match self.store.fetch(&self.policy_name).await {
            Ok(policy) => {
                debug!("Refreshed guardrail policy '{}'", self.policy_name);
                let policy = Arc::new(policy);
                let mut guard = self.cached.write().await;
                *guard = Some(CachedPolicy {
                    policy: Arc::clone(&policy),
                    fetched_at: Instant::now(),
                });
                policy
            }
            Err(e) => {
                warn!(
                    "Failed to fetch guardrail policy '{}', enforcing fail-closed default: {}",
                    self.policy_name, e
                );
                Arc::new(GuardrailPolicy::fail_closed())
            }
        }
    }

    /// Drop the cached entry so the next lookup hits the store.
    pub async fn invalidate(&self) {
        let mut guard = self.cached.write().await;
        *guard = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::DomainError;
    use crate::domain::guardrail::store::mock::MockPolicyStore;

    #[tokio::test]
    async fn test_get_fetches_and_caches() {
        let store = Arc::new(MockPolicyStore::with_policy(GuardrailPolicy::new("default")));
        let cache = PolicyCache::new(store.clone(), "default", Duration::from_secs(300));

        let first = cache.get(false).await;
        let second = cache.get(false).await;

        assert_eq!(first.name(), "default");
        assert_eq!(second.name(), "default");
        assert_eq!(store.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_force_refresh_bypasses_cache() {
        let store = Arc::new(MockPolicyStore::with_policy(GuardrailPolicy::new("default")));
        let cache = PolicyCache::new(store.clone(), "default", Duration::from_secs(300));

        cache.get(false).await;
        cache.get(true).await;

        assert_eq!(store.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_expired_entry_is_refetched() {
        let store = Arc::new(MockPolicyStore::with_policy(GuardrailPolicy::new("default")));
        let cache = PolicyCache::new(store.clone(), "default", Duration::from_millis(0));

        cache.get(false).await;
        cache.get(false).await;

        assert_eq!(store.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_fetch_failure_falls_back_to_fail_closed() {
        let store = Arc::new(MockPolicyStore::with_error(DomainError::not_found(
            "Policy not found: default",
        )));
        let cache = PolicyCache::new(store.clone(), "default", Duration::from_secs(300));

        let policy = cache.get(false).await;

        assert_eq!(policy.name(), "fail-closed");
        assert!(policy.is_enabled());

        // The fallback is not cached, so the store is retried
        cache.get(false).await;
        assert_eq!(store.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_invalidate_clears_cache() {
        let store = Arc::new(MockPolicyStore::with_policy(GuardrailPolicy::new("default")));
        let cache = PolicyCache::new(store.clone(), "default", Duration::from_secs(300));

        cache.get(false).await;
        cache.invalidate().await;
        cache.get(false).await;

        assert_eq!(store.fetch_count(), 2);
    }
}
