//! Private-key cache and background refresh.
//!
//! Concrete cloud-KMS fetching stays behind [`KeySource`]; the services only
//! see [`KeyFetcherManager`]. Reads take a shared lock held for a clone.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use ba_envelope::PrivateKey;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Resolves the private key named by an envelope header.
pub trait KeyFetcherManager: Send + Sync {
    fn private_key(&self, key_id: u8) -> Option<PrivateKey>;
}

/// Upstream source of key material (cloud KMS coordinator in production,
/// static keys in tests).
#[async_trait]
pub trait KeySource: Send + Sync {
    async fn fetch_keys(&self) -> anyhow::Result<Vec<PrivateKey>>;
}

struct CachedKey {
    key: PrivateKey,
    refreshed_at: Instant,
}

/// In-memory key cache with TTL-based expiry.
pub struct PrivateKeyCache {
    keys: RwLock<HashMap<u8, CachedKey>>,
    ttl: Duration,
}

impl PrivateKeyCache {
    pub fn new(ttl: Duration) -> Self {
        Self { keys: RwLock::new(HashMap::new()), ttl }
    }

    /// Cache that never expires entries; for tests and static deployments.
    pub fn with_static_keys(keys: impl IntoIterator<Item = PrivateKey>) -> Self {
        let cache = Self::new(Duration::MAX);
        cache.insert_all(keys);
        cache
    }

    pub fn insert_all(&self, keys: impl IntoIterator<Item = PrivateKey>) {
        let now = Instant::now();
        let mut guard = self.keys.write().expect("key cache poisoned");
        for key in keys {
            guard.insert(key.id, CachedKey { key, refreshed_at: now });
        }
    }

    fn evict_expired(&self) {
        let ttl = self.ttl;
        let mut guard = self.keys.write().expect("key cache poisoned");
        guard.retain(|_, cached| cached.refreshed_at.elapsed() < ttl);
    }
}

impl KeyFetcherManager for PrivateKeyCache {
    fn private_key(&self, key_id: u8) -> Option<PrivateKey> {
        let guard = self.keys.read().expect("key cache poisoned");
        guard
            .get(&key_id)
            .filter(|cached| cached.refreshed_at.elapsed() < self.ttl)
            .map(|cached| cached.key.clone())
    }
}

/// Spawns the periodic refresh loop: pull keys from `source` every `period`,
/// dropping entries that have outlived the cache TTL.
pub fn spawn_key_refresh(
    cache: std::sync::Arc<PrivateKeyCache>,
    source: std::sync::Arc<dyn KeySource>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(period);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tick.tick().await;
            match source.fetch_keys().await {
                Ok(keys) => {
                    info!(message = "refreshed private keys", count = keys.len());
                    cache.insert_all(keys);
                }
                Err(e) => {
                    error!(message = "private key refresh failed", error = %e);
                }
            }
            cache.evict_expired();
        }
    })
}
