//! End-to-end memory router scenarios, in-memory tiers only (no live
//! embedding/rerank providers, no live storage).

use std::sync::Arc;
use strata_core::Domain;
use strata_memory::tiers::{
    InMemoryColdTier, InMemoryEphemeralTier, InMemoryStructuredTier, InMemoryVectorTier,
};
use strata_memory::{DocChunk, MemoryPolicy, MemoryRouter};

fn in_memory_router() -> MemoryRouter {
    MemoryRouter::new(
        MemoryPolicy::default_policy(),
        Arc::new(InMemoryEphemeralTier::new()),
        Arc::new(InMemoryVectorTier::new()),
        Arc::new(InMemoryStructuredTier::new()),
        Arc::new(InMemoryColdTier::new()),
    )
}

/// Scenario 1: vector round-trip.
#[tokio::test]
async fn vector_round_trip() {
    let router = in_memory_router();
    let chunk = DocChunk::new(
        "smoke test vector 2025-01-01T00:00:00Z",
        "smoke://vector#1",
        Domain::Shared,
    );
    router.upsert_chunks(vec![chunk]).await;

    let hits = router
        .search(
            "smoke test vector 2025-01-01T00:00:00Z",
            Domain::Shared,
            3,
            0.5,
            None,
            false,
        )
        .await
        .expect("search succeeds");

    assert!(hits.iter().any(|h| h.source_uri == "smoke://vector#1"));
}

/// Scenario 2: dedup.
#[tokio::test]
async fn upserting_the_same_chunk_twice_is_deduped() {
    let router = in_memory_router();
    let chunk = DocChunk::new("duplicate content", "dup://1", Domain::Code);

    let report = router.upsert_chunks(vec![chunk.clone(), chunk]).await;

    assert_eq!(report.chunks_processed, 1);
    assert_eq!(report.duplicates_found, 1);
    assert!(report.chunks_stored <= 1);
}

/// A search in one isolated domain never surfaces a chunk stored under a
/// different, non-SHARED domain.
#[tokio::test]
async fn domain_isolation_holds_for_non_shared_domains() {
    let router = in_memory_router();
    router
        .upsert_chunks(vec![DocChunk::new(
            "bi-only quarterly figures",
            "bi://report#1",
            Domain::Bi,
        )])
        .await;

    let hits = router
        .search("bi-only quarterly figures", Domain::Code, 5, 0.5, None, false)
        .await
        .expect("search succeeds");

    assert!(hits.iter().all(|h| h.domain != Domain::Bi));
}

/// Recording the same fact twice returns the same fact id (idempotence).
#[tokio::test]
async fn record_fact_twice_is_idempotent() {
    let router = in_memory_router();
    let data = serde_json::json!({"metric": "revenue", "value": 42});

    let first = router.record_fact("metrics", data.clone()).await;
    let second = router.record_fact("metrics", data).await;

    assert_eq!(first, second);
}
