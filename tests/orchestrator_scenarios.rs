//! End-to-end orchestrator budget gating, using a mock `OrchestratorBehavior`
//! and an empty (routeless) `ProviderRouter` — the budget check runs before
//! any route is ever consulted.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use strata_core::Domain;
use strata_orchestrator::{
    OrchestratorBehavior, OrchestratorConfig, OrchestratorError, Orchestrator, Task, TaskResult,
};
use strata_provider::{ProviderRouter, TaskType};

struct NeverCalled;

#[async_trait]
impl OrchestratorBehavior for NeverCalled {
    async fn execute_core(
        &self,
        _task: &Task,
        _provider_router: &ProviderRouter,
    ) -> Result<TaskResult, OrchestratorError> {
        panic!("execute_core must not run once the budget gate has rejected the task");
    }
}

/// Scenario 5: budget gate.
#[tokio::test]
async fn task_exceeding_the_hourly_budget_is_rejected_before_execution() {
    let mut config = OrchestratorConfig::new(Domain::Bi, "budget-test", "budget gate scenario");
    config.enable_memory = false;
    config.budget_limits.hourly_cost_usd = Decimal::new(100, 0);

    let orchestrator = Orchestrator::new(
        config,
        NeverCalled,
        None,
        Arc::new(ProviderRouter::new(HashMap::new())),
    );

    // A single task whose cost alone exceeds the hourly limit is rejected
    // without ever reaching `execute_core`.
    let mut task = Task::new("t-budget", TaskType::new("analysis"), "exceeds budget");
    task.budget.cost_usd = Decimal::new(10001, 2); // 100.01 against a 100.0 hourly limit

    let result = orchestrator.execute(task).await;

    assert!(!result.success);
    assert_eq!(result.execution_time_ms, 0.0);
    assert_eq!(result.cost, Decimal::ZERO);

    let status = orchestrator.status().await;
    assert_eq!(status.cost_tracking.hourly, Decimal::ZERO);
}

struct FixedCost(Decimal);

#[async_trait]
impl OrchestratorBehavior for FixedCost {
    async fn execute_core(
        &self,
        _task: &Task,
        _provider_router: &ProviderRouter,
    ) -> Result<TaskResult, OrchestratorError> {
        Ok(TaskResult {
            success: true,
            cost: self.0,
            ..Default::default()
        })
    }
}

/// A nearly-exhausted accumulator plus one more task that would tip it over
/// the limit is rejected, and the accumulator is left exactly as it was.
#[tokio::test]
async fn task_that_would_tip_an_almost_exhausted_budget_over_is_rejected() {
    let mut config = OrchestratorConfig::new(Domain::Bi, "budget-test", "budget gate scenario");
    config.enable_memory = false;
    config.budget_limits.hourly_cost_usd = Decimal::new(100, 0);

    let orchestrator = Orchestrator::new(
        config,
        FixedCost(Decimal::new(99995, 3)), // 99.995
        None,
        Arc::new(ProviderRouter::new(HashMap::new())),
    );

    let priming = Task::new("t-prime", TaskType::new("analysis"), "prime the accumulator");
    let primed = orchestrator.execute(priming).await;
    assert!(primed.success);
    assert_eq!(
        orchestrator.status().await.cost_tracking.hourly,
        Decimal::new(99995, 3)
    );

    let mut task = Task::new("t-overflow", TaskType::new("analysis"), "tips it over");
    task.budget.cost_usd = Decimal::new(1, 2); // 0.01
    let result = orchestrator.execute(task).await;

    assert!(!result.success);
    assert_eq!(
        orchestrator.status().await.cost_tracking.hourly,
        Decimal::new(99995, 3)
    );
}

struct CountingSuccess(Arc<AtomicUsize>);

#[async_trait]
impl OrchestratorBehavior for CountingSuccess {
    async fn execute_core(
        &self,
        _task: &Task,
        _provider_router: &ProviderRouter,
    ) -> Result<TaskResult, OrchestratorError> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(TaskResult {
            success: true,
            ..Default::default()
        })
    }
}

/// Tasks submitted to the queue are actually drained and executed once
/// `process_tasks` is running — `submit_task` alone only enqueues them.
#[tokio::test]
async fn submitted_tasks_are_drained_and_executed_by_process_tasks() {
    let mut config = OrchestratorConfig::new(Domain::Bi, "queue-test", "queue drain scenario");
    config.enable_memory = false;

    let calls = Arc::new(AtomicUsize::new(0));
    let orchestrator = Arc::new(Orchestrator::new(
        config,
        CountingSuccess(calls.clone()),
        None,
        Arc::new(ProviderRouter::new(HashMap::new())),
    ));
    orchestrator.process_tasks().await;

    orchestrator
        .submit_task(Task::new("t-1", TaskType::new("analysis"), "first"))
        .await;
    orchestrator
        .submit_task(Task::new("t-2", TaskType::new("analysis"), "second"))
        .await;

    for _ in 0..50 {
        if calls.load(Ordering::SeqCst) == 2 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    orchestrator.shutdown().await;
}
