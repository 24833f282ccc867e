//! L4 — cold archive. Grounded on `archive` in
//! `unified_memory_router.py`; bucket name is domain-neutral
//! (`strata-archive`) rather than the original's persona-named default.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

pub const DEFAULT_BUCKET: &str = "strata-archive";

#[async_trait]
pub trait ColdTier: Send + Sync {
    /// Archives `data` under `key`, returning an opaque storage URI.
    async fn archive(
        &self,
        key: &str,
        data: Vec<u8>,
        metadata: HashMap<String, String>,
    ) -> String;
}

#[derive(Default)]
pub struct InMemoryColdTier {
    bucket: String,
    blobs: RwLock<HashMap<String, (Vec<u8>, HashMap<String, String>)>>,
}

impl InMemoryColdTier {
    pub fn new() -> Self {
        Self {
            bucket: DEFAULT_BUCKET.to_string(),
            blobs: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.blobs.read().await.get(key).map(|(data, _)| data.clone())
    }
}

#[async_trait]
impl ColdTier for InMemoryColdTier {
    async fn archive(
        &self,
        key: &str,
        data: Vec<u8>,
        metadata: HashMap<String, String>,
    ) -> String {
        let uri = format!("mem://{}/{}", self.bucket, key);
        self.blobs
            .write()
            .await
            .insert(key.to_string(), (data, metadata));
        uri
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn archive_round_trips() {
        let tier = InMemoryColdTier::new();
        let uri = tier.archive("k", b"payload".to_vec(), HashMap::new()).await;
        assert!(uri.contains(DEFAULT_BUCKET));
        assert_eq!(tier.get("k").await, Some(b"payload".to_vec()));
    }
}
