//! Errors surfaced by `Orchestrator::execute`'s internal steps, before the
//! retry-requeue policy converts them into a `TaskResult`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("invalid task: {0}")]
    Validation(String),

    #[error("circuit '{0}' is open")]
    CircuitOpen(String),

    #[error(transparent)]
    Provider(#[from] strata_provider::ProviderRouterError),

    #[error(transparent)]
    Memory(#[from] strata_memory::MemoryError),

    #[error("core execution failed: {0}")]
    Core(String),
}
