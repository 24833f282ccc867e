//! `OrchestratorBehavior`: the one method a domain-specific orchestrator
//! implements, grounded on `BaseOrchestrator._execute_core`'s abstract
//! method. Composition over inheritance, the same resolution used for
//! `strata-connector::ConnectorBehavior`.

use async_trait::async_trait;
use strata_provider::ProviderRouter;

use crate::error::OrchestratorError;
use crate::types::{Task, TaskResult};

#[async_trait]
pub trait OrchestratorBehavior: Send + Sync {
    /// Domain-specific core execution: given the task and a handle to the
    /// shared provider router, produce a result. Implementations call
    /// `provider_router.execute_with_fallback(...)` (or multiple calls, for
    /// multi-step agentic work) and translate the response into a
    /// `TaskResult`.
    async fn execute_core(
        &self,
        task: &Task,
        provider_router: &ProviderRouter,
    ) -> Result<TaskResult, OrchestratorError>;
}
