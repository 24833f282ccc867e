//! # strata-orchestrator — unified task execution pattern
//!
//! `Orchestrator<B>` owns task queueing, budget gating, provider routing,
//! bounded concurrency, circuit-breaker-wrapped execution, and
//! cost/history/metrics bookkeeping. Domain-specific logic is supplied
//! through the single-method [`OrchestratorBehavior`] trait, grounded on
//! `base_orchestrator.py`'s `BaseOrchestrator`/`_execute_core` split.

mod behavior;
mod config;
mod error;
mod metrics;
mod orchestrator;
mod types;

pub use behavior::OrchestratorBehavior;
pub use config::{BudgetLimits, OrchestratorConfig};
pub use error::OrchestratorError;
pub use metrics::OrchestratorMetrics;
pub use orchestrator::{CostTracker, Orchestrator, OrchestratorStatus};
pub use types::{Budget, ExecutionPriority, Task, TaskResult, TaskStatus};
