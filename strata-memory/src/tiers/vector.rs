//! L2 — semantic/vector storage. Grounded on `upsert_chunks`/`search` in
//! `unified_memory_router.py`; `InMemoryVectorTier` does brute-force cosine
//! similarity, standing in for a real ANN backend the way
//! `neuron-state-memory::MemoryStore` stands in for a real state backend.

use crate::error::MemoryError;
use crate::types::DocChunk;
use async_trait::async_trait;
use std::collections::HashMap;
use strata_core::Domain;
use tokio::sync::RwLock;

#[async_trait]
pub trait VectorTier: Send + Sync {
    /// Stores chunks (which must already carry an embedding). Returns the
    /// count actually stored (ties to the caller's own upsert count, since
    /// overwriting an existing chunk_id is not itself a new record).
    async fn upsert(&self, chunks: Vec<DocChunk>) -> Result<usize, MemoryError>;

    /// Dense nearest-neighbor search, optionally restricted to one domain.
    /// Returns `(chunk, cosine_similarity)` pairs, best first. Chunks with no
    /// embedding score `0.0` rather than being dropped, so a caller blending
    /// this with a lexical score still sees them as candidates.
    async fn dense_search(
        &self,
        embedding: &[f32],
        domain: Option<Domain>,
        limit: usize,
    ) -> Vec<(DocChunk, f32)>;

    async fn all_chunks(&self) -> Vec<DocChunk>;
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[derive(Default)]
pub struct InMemoryVectorTier {
    chunks: RwLock<HashMap<String, DocChunk>>,
}

impl InMemoryVectorTier {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorTier for InMemoryVectorTier {
    async fn upsert(&self, chunks: Vec<DocChunk>) -> Result<usize, MemoryError> {
        let mut store = self.chunks.write().await;
        let mut stored = 0;
        for chunk in chunks {
            store.insert(chunk.chunk_id.clone(), chunk);
            stored += 1;
        }
        Ok(stored)
    }

    async fn dense_search(
        &self,
        embedding: &[f32],
        domain: Option<Domain>,
        limit: usize,
    ) -> Vec<(DocChunk, f32)> {
        let store = self.chunks.read().await;
        let mut scored: Vec<(DocChunk, f32)> = store
            .values()
            .filter(|c| match &domain {
                Some(d) => d.can_read(c.domain.clone()),
                None => true,
            })
            .map(|c| {
                let score = c
                    .embedding
                    .as_ref()
                    .map(|e| cosine_similarity(embedding, e))
                    .unwrap_or(0.0);
                (c.clone(), score)
            })
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);
        scored
    }

    async fn all_chunks(&self) -> Vec<DocChunk> {
        self.chunks.read().await.values().cloned().collect()
    }
}
