//! # strata-memory — four-tier memory router
//!
//! L1 ephemeral cache, L2 vector search, L3 structured facts, L4 cold
//! archive, behind one facade. Grounded on `unified_memory_router.py`'s
//! `UnifiedMemoryRouter`, with the vector/structured/cold tiers exposed as
//! traits the way `neuron-state-memory`/`neuron-state-fs` expose
//! `layer0::state::StateStore` implementations — callers depend on the
//! trait, a real backend or the in-memory double implements it.

mod error;
mod metrics;
mod policy;
mod router;
pub mod tiers;
mod types;

pub use error::MemoryError;
pub use metrics::MemoryMetrics;
pub use policy::{
    BatchSizes, CacheConfig, L1Config, L2Config, L3Config, L4Config, MemoryPolicy, NamespaceRule,
    PerformanceConfig, TiersConfig,
};
pub use router::MemoryRouter;
pub use types::{AuditReport, DocChunk, Fact, PurgeReport, SearchHit, UpsertReport};
