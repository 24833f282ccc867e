//! Shared vocabulary across all four memory tiers, grounded on
//! `unified_memory_router.py`'s `DocChunk`/`SearchHit`/`*Report` dataclasses.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strata_core::{sha256_hex, Domain, Tier};

/// A chunk of source content destined for the vector tier. `chunk_id` is
/// content-addressed — computed at construction time from `content` alone,
/// a real constructor invariant, not left to be derived later at dedup
/// time. Two chunks with identical content share a `chunk_id` even if their
/// `source_uri` differs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocChunk {
    pub chunk_id: String,
    pub content: String,
    pub source_uri: String,
    pub domain: Domain,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    #[serde(default = "default_confidence")]
    pub confidence: f32,
}

fn default_confidence() -> f32 {
    1.0
}

impl DocChunk {
    pub fn new(content: impl Into<String>, source_uri: impl Into<String>, domain: Domain) -> Self {
        let content = content.into();
        let source_uri = source_uri.into();
        let chunk_id = sha256_hex(content.as_bytes());
        Self {
            chunk_id,
            content,
            source_uri,
            domain,
            metadata: HashMap::new(),
            embedding: None,
            timestamp: chrono::Utc::now(),
            confidence: 1.0,
        }
    }

    pub fn with_metadata(mut self, metadata: HashMap<String, serde_json::Value>) -> Self {
        self.metadata = metadata;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub content: String,
    pub score: f32,
    pub source_uri: String,
    pub metadata: HashMap<String, serde_json::Value>,
    pub tier: Tier,
    pub domain: Domain,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpsertReport {
    pub success: bool,
    pub chunks_processed: usize,
    pub chunks_stored: usize,
    pub duplicates_found: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditReport {
    pub orphans: Vec<String>,
    pub duplicates: Vec<String>,
    /// Left genuinely stubbed — PII scanning needs a classifier this crate
    /// does not own. Always empty.
    pub pii_violations: Vec<String>,
    pub total_chunks: usize,
    pub total_size_bytes: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PurgeReport {
    pub purged: HashMap<String, usize>,
    pub success: bool,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fact {
    pub fact_id: String,
    pub table: String,
    pub data: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_id_is_deterministic_over_content_alone() {
        let a = DocChunk::new("hello", "doc://1", Domain::Bi);
        let b = DocChunk::new("hello", "doc://2", Domain::Code);
        assert_eq!(a.chunk_id, b.chunk_id);
        assert_eq!(a.chunk_id.len(), 64);
    }

    #[test]
    fn chunk_id_differs_on_content() {
        let a = DocChunk::new("hello", "doc://1", Domain::Bi);
        let b = DocChunk::new("world", "doc://1", Domain::Bi);
        assert_ne!(a.chunk_id, b.chunk_id);
    }
}
