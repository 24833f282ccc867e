//! L3 — structured facts. Grounded on `record_fact`/`query_facts` in
//! `unified_memory_router.py`. `fact_id` is the **full** SHA-256 hex of the
//! canonical (sorted-key) JSON serialization of the fact data — a
//! deliberate deviation from the original's 16-character truncation, which
//! risks collisions at scale for no real benefit once the whole system
//! content-addresses by hash anyway.

use async_trait::async_trait;
use std::collections::HashMap;
use strata_core::{canonical_json, sha256_hex};
use tokio::sync::RwLock;

#[async_trait]
pub trait StructuredTier: Send + Sync {
    /// Inserts `data` into `table`, returning the fact id. Idempotent: a
    /// fact with identical canonical JSON in the same table returns the
    /// same id without inserting a second row (`ON CONFLICT DO NOTHING`
    /// semantics).
    async fn record_fact(&self, table: &str, data: serde_json::Value) -> String;

    async fn query_facts(&self, table: &str) -> Vec<serde_json::Value>;
}

#[derive(Default)]
pub struct InMemoryStructuredTier {
    tables: RwLock<HashMap<String, HashMap<String, serde_json::Value>>>,
}

impl InMemoryStructuredTier {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StructuredTier for InMemoryStructuredTier {
    async fn record_fact(&self, table: &str, data: serde_json::Value) -> String {
        let fact_id = sha256_hex(canonical_json(&data).as_bytes());
        let mut tables = self.tables.write().await;
        let rows = tables.entry(table.to_string()).or_default();
        rows.entry(fact_id.clone()).or_insert(data);
        fact_id
    }

    async fn query_facts(&self, table: &str) -> Vec<serde_json::Value> {
        self.tables
            .read()
            .await
            .get(table)
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default()
    }
}
