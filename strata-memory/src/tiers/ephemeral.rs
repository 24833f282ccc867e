//! L1 — hot cache. Grounded on `put_ephemeral`/`get_ephemeral` in
//! `unified_memory_router.py`, with one deliberate redesign: the original
//! mirrors writes into its local cache at the full `ttl_s` but hardcodes
//! 300s for reads that re-populate the cache after a backend hit — two
//! different expiries for the same key depending on which path wrote it
//! last. This rework applies `min(ttl, 300s)` uniformly on both paths.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

const LOCAL_CACHE_CAP: Duration = Duration::from_secs(300);

#[async_trait]
pub trait EphemeralTier: Send + Sync {
    async fn put(&self, key: &str, value: serde_json::Value, ttl: Duration);
    async fn get(&self, key: &str) -> Option<serde_json::Value>;
}

struct Entry {
    value: serde_json::Value,
    expires_at: Instant,
}

/// Local-process mirror of L1, used directly in tests/embedders and as the
/// read-through cache layer in front of a real backend elsewhere.
#[derive(Default)]
pub struct InMemoryEphemeralTier {
    cache: RwLock<HashMap<String, Entry>>,
}

impl InMemoryEphemeralTier {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EphemeralTier for InMemoryEphemeralTier {
    async fn put(&self, key: &str, value: serde_json::Value, ttl: Duration) {
        let capped = ttl.min(LOCAL_CACHE_CAP);
        self.cache.write().await.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Instant::now() + capped,
            },
        );
    }

    async fn get(&self, key: &str) -> Option<serde_json::Value> {
        let mut cache = self.cache.write().await;
        match cache.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.value.clone()),
            Some(_) => {
                cache.remove(key);
                None
            }
            None => None,
        }
    }
}
