//! Provider bindings.
//!
//! [`Provider`] uses RPITIT (return-position `impl Trait` in traits) and is
//! intentionally NOT object-safe — `RouteEntry` is generic over one concrete
//! provider type per entry, the same generation `neuron-turn::provider`
//! uses for its `Provider` trait. `ProviderRouter` is the object-safe
//! boundary callers actually hold.

use crate::error::ProviderError;
use crate::types::{ProviderRequest, ProviderResponse};
use async_trait::async_trait;
use std::future::Future;

pub trait Provider: Send + Sync {
    fn complete(
        &self,
        request: ProviderRequest,
    ) -> impl Future<Output = Result<ProviderResponse, ProviderError>> + Send;
}

pub trait EmbeddingProvider: Send + Sync {
    fn embed_texts(
        &self,
        texts: Vec<String>,
    ) -> impl Future<Output = Result<Vec<Vec<f32>>, ProviderError>> + Send;
}

pub trait RerankProvider: Send + Sync {
    fn rerank(
        &self,
        query: &str,
        candidates: Vec<String>,
    ) -> impl Future<Output = Result<Vec<(usize, f32)>, ProviderError>> + Send;
}

/// Object-safe adapter over [`EmbeddingProvider`], for callers (like
/// `strata-memory`) that need to hold one behind `Arc<dyn ...>` rather than
/// be generic over a concrete embedding provider type.
#[async_trait]
pub trait DynEmbeddingProvider: Send + Sync {
    async fn embed_texts(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, ProviderError>;
}

#[async_trait]
impl<T: EmbeddingProvider> DynEmbeddingProvider for T {
    async fn embed_texts(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, ProviderError> {
        EmbeddingProvider::embed_texts(self, texts).await
    }
}

/// Object-safe adapter over [`RerankProvider`], mirroring [`DynEmbeddingProvider`].
#[async_trait]
pub trait DynRerankProvider: Send + Sync {
    async fn rerank(
        &self,
        query: &str,
        candidates: Vec<String>,
    ) -> Result<Vec<(usize, f32)>, ProviderError>;
}

#[async_trait]
impl<T: RerankProvider> DynRerankProvider for T {
    async fn rerank(
        &self,
        query: &str,
        candidates: Vec<String>,
    ) -> Result<Vec<(usize, f32)>, ProviderError> {
        RerankProvider::rerank(self, query, candidates).await
    }
}
