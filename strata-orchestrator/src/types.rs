//! `Task`/`TaskResult` and supporting enums, grounded on `base_orchestrator.py`'s
//! `Task`/`Result` dataclasses. Renamed `Result` to `TaskResult` to avoid
//! shadowing `std::result::Result`.

use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::HashMap;
use strata_core::TaskId;
use strata_provider::TaskType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ExecutionPriority {
    Critical,
    High,
    Normal,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct Budget {
    pub cost_usd: Decimal,
    pub tokens: u64,
}

impl Default for Budget {
    fn default() -> Self {
        Self {
            cost_usd: Decimal::new(1, 0),
            tokens: 10_000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Task {
    pub id: TaskId,
    pub task_type: TaskType,
    pub content: String,
    pub priority: ExecutionPriority,
    pub metadata: HashMap<String, Value>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub status: TaskStatus,
    pub retries: u32,
    pub max_retries: u32,
    pub budget: Budget,
}

impl Task {
    pub fn new(id: impl Into<TaskId>, task_type: TaskType, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            task_type,
            content: content.into(),
            priority: ExecutionPriority::Normal,
            metadata: HashMap::new(),
            created_at: chrono::Utc::now(),
            started_at: None,
            completed_at: None,
            status: TaskStatus::Pending,
            retries: 0,
            max_retries: 3,
            budget: Budget::default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TaskResult {
    pub success: bool,
    pub content: Value,
    pub metadata: HashMap<String, Value>,
    pub citations: Vec<HashMap<String, String>>,
    pub confidence: f32,
    pub cost: Decimal,
    pub tokens_used: u64,
    pub execution_time_ms: f64,
    pub errors: Vec<String>,
}

impl TaskResult {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            errors: vec![error.into()],
            ..Default::default()
        }
    }
}
