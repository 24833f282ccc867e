//! # strata-provider — multi-provider LLM routing
//!
//! Routes a task to the cheapest, fastest, healthiest available LLM
//! provider binding, falling back through alternatives on failure and
//! quarantining routes whose credentials are simply bad. Grounded in
//! `neuron-turn::provider`'s `Provider`/`ProviderError` shapes and in
//! `neuron-provider-anthropic`'s concrete binding style.

mod error;
mod provider;
mod router;
mod types;
mod virtual_key;

pub use error::{ProviderError, ProviderRouterError};
pub use provider::{
    DynEmbeddingProvider, DynRerankProvider, EmbeddingProvider, Provider, RerankProvider,
};
pub use router::{DynProvider, ProviderRouter, RouteEntry, RouteKey};
pub use types::{
    ContentPart, ProviderMessage, ProviderRequest, ProviderResponse, Role, StopReason, TaskType,
    TokenUsage, ToolSchema,
};
pub use virtual_key::{VirtualKey, VirtualKeyStore};
