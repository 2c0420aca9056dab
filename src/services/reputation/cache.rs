use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::bot::error::Error;
use crate::constants::moderation::REPUTATION_CACHE_TTL;
use crate::services::reputation::client::ReputationApi;
use crate::services::reputation::{ReputationCheckResult, ReputationConfig};

struct CachedEntry {
    result: ReputationCheckResult,
    fetched_at: Instant,
}

/// Time-bounded cache in front of the external reputation API.
///
/// Entries expire an absolute hour after first insert and are refreshed
/// opportunistically on the next lookup, never proactively. Lookup failures
/// are treated as "not banned" and are not cached, so the next join retries
/// the API — an outage degrades protection for at most its own duration and
/// never blocks or bans anyone on its own.
pub struct ReputationChecker {
    api: Arc<dyn ReputationApi>,
    cache: DashMap<u64, CachedEntry>,
    ttl: Duration,
}

impl ReputationChecker {
    pub fn new(api: Arc<dyn ReputationApi>) -> Self {
        Self::with_ttl(api, REPUTATION_CACHE_TTL)
    }

    pub fn with_ttl(api: Arc<dyn ReputationApi>, ttl: Duration) -> Self {
        Self {
            api,
            cache: DashMap::new(),
            ttl,
        }
    }

    pub async fn check_user(
        &self,
        user_id: u64,
        config: &ReputationConfig,
    ) -> Result<ReputationCheckResult, Error> {
        if !config.enabled {
            return Ok(ReputationCheckResult::not_banned());
        }

        // An enabled check without an endpoint is a wiring bug, not an API
        // outage; surface it instead of silently disabling the feature
        let endpoint = config
            .endpoint
            .as_deref()
            .ok_or_else(|| Error::ConfigNotFound("reputation API endpoint".to_string()))?;

        if let Some(entry) = self.cache.get(&user_id) {
            if entry.fetched_at.elapsed() < self.ttl {
                debug!("Reputation cache hit for user {}", user_id);
                return Ok(entry.result.clone());
            }
        }

        match self.api.lookup(user_id, endpoint, config.timeout).await {
            Ok(result) => {
                self.cache.insert(
                    user_id,
                    CachedEntry {
                        result: result.clone(),
                        fetched_at: Instant::now(),
                    },
                );
                Ok(result)
            }
            Err(e) => {
                warn!(
                    "Reputation lookup for user {} failed: {} (treating as not banned)",
                    user_id, e
                );
                Ok(ReputationCheckResult::not_banned())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;

    struct CountingApi {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingApi {
        fn ok() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: true,
            }
        }
    }

    #[async_trait]
    impl ReputationApi for CountingApi {
        async fn lookup(
            &self,
            _user_id: u64,
            _endpoint: &str,
            _timeout: Duration,
        ) -> Result<ReputationCheckResult, Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Error::custom("connection timed out"));
            }
            Ok(ReputationCheckResult {
                is_banned: true,
                reason: Some("spam network".to_string()),
            })
        }
    }

    fn config() -> ReputationConfig {
        ReputationConfig {
            enabled: true,
            endpoint: Some("https://reputation.example".to_string()),
            timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn second_lookup_within_ttl_hits_the_cache() {
        let api = Arc::new(CountingApi::ok());
        let checker = ReputationChecker::new(api.clone());

        let first = checker.check_user(42, &config()).await.unwrap();
        let second = checker.check_user(42, &config()).await.unwrap();

        assert!(first.is_banned);
        assert_eq!(first, second);
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entry_triggers_a_fresh_lookup() {
        let api = Arc::new(CountingApi::ok());
        let checker = ReputationChecker::with_ttl(api.clone(), Duration::from_secs(3600));

        checker.check_user(42, &config()).await.unwrap();
        tokio::time::advance(Duration::from_secs(3601)).await;
        checker.check_user(42, &config()).await.unwrap();

        assert_eq!(api.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn api_failure_fails_open_and_is_not_cached() {
        let api = Arc::new(CountingApi::failing());
        let checker = ReputationChecker::new(api.clone());

        let result = checker.check_user(42, &config()).await.unwrap();
        assert!(!result.is_banned);

        // A failure leaves no cache entry, so the next call retries
        checker.check_user(42, &config()).await.unwrap();
        assert_eq!(api.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn disabled_check_never_calls_the_api() {
        let api = Arc::new(CountingApi::ok());
        let checker = ReputationChecker::new(api.clone());

        let disabled = ReputationConfig {
            enabled: false,
            endpoint: None,
            timeout: Duration::from_secs(5),
        };

        let result = checker.check_user(42, &disabled).await.unwrap();
        assert!(!result.is_banned);
        assert_eq!(api.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn enabled_without_endpoint_is_a_configuration_error() {
        let checker = ReputationChecker::new(Arc::new(CountingApi::ok()));

        let broken = ReputationConfig {
            enabled: true,
            endpoint: None,
            timeout: Duration::from_secs(5),
        };

        assert!(checker.check_user(42, &broken).await.is_err());
    }
}
