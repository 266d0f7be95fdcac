use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::{
    model::LoanView,
    types::{FicoScore, WalletAnalytics},
};

/// A cache entry with expiration time
pub struct CacheEntry<T> {
    pub data: T,
    pub expires_at: Instant,
}

/// A generic time-based cache with TTL support
pub struct TimedCache<T> {
    entries: RwLock<HashMap<String, CacheEntry<T>>>,
    ttl: Duration,
}

impl<T: Clone + Send + Sync> TimedCache<T> {
    /// Create a new cache with the specified TTL in seconds
    pub fn new(ttl_seconds: u64) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl: Duration::from_secs(ttl_seconds),
        }
    }

    /// Get a value from the cache if it exists and hasn't expired
    pub async fn get(&self, key: &str) -> Option<T> {
        let entries = self.entries.read().await;
        if let Some(entry) = entries.get(key) {
            if Instant::now() < entry.expires_at {
                return Some(entry.data.clone());
            }
        }
        None
    }

    /// Store a value in the cache with the configured TTL
    pub async fn set(&self, key: &str, value: T) {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            CacheEntry {
                data: value,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Remove a specific key from the cache
    pub async fn invalidate(&self, key: &str) {
        let mut entries = self.entries.write().await;
        entries.remove(key);
    }
}

impl<T> std::fmt::Debug for TimedCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimedCache")
            .field("ttl", &self.ttl)
            .finish()
    }
}

/// Key for the single full-marketplace snapshot entry.
pub const LOAN_SNAPSHOT: &str = "loan_snapshot";

/// Response caches shared across controllers. The loan snapshot is one
/// entry; scoring responses are keyed per wallet so one slow wallet does
/// not evict the rest.
#[derive(Debug)]
pub struct ResponseCaches {
    pub loans: TimedCache<Vec<LoanView>>,
    pub scores: TimedCache<FicoScore>,
    pub analytics: TimedCache<WalletAnalytics>,
}

impl ResponseCaches {
    pub fn new(loans_ttl: u64, scoring_ttl: u64) -> ResponseCaches {
        ResponseCaches {
            loans: TimedCache::new(loans_ttl),
            scores: TimedCache::new(scoring_ttl),
            analytics: TimedCache::new(scoring_ttl),
        }
    }

    /// Drop the snapshot after a state-changing transaction so the next
    /// dashboard load sees the new chain state.
    pub async fn invalidate_loans(&self) {
        self.loans.invalidate(LOAN_SNAPSHOT).await;
    }
}
