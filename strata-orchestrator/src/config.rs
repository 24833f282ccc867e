//! `OrchestratorConfig`, grounded on `base_orchestrator.py`'s dataclass of
//! the same name — same fields and defaults, typed instead of a dict for
//! `budget_limits`.

use rust_decimal::Decimal;
use std::time::Duration;
use strata_core::Domain;

#[derive(Debug, Clone)]
pub struct BudgetLimits {
    pub hourly_cost_usd: Decimal,
    pub daily_cost_usd: Decimal,
    pub monthly_cost_usd: Decimal,
}

impl Default for BudgetLimits {
    fn default() -> Self {
        Self {
            hourly_cost_usd: Decimal::new(100, 0),
            daily_cost_usd: Decimal::new(1000, 0),
            monthly_cost_usd: Decimal::new(20_000, 0),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub domain: Domain,
    pub name: String,
    pub description: String,
    pub max_concurrent_tasks: usize,
    pub default_timeout: Duration,
    pub enable_caching: bool,
    pub enable_monitoring: bool,
    pub enable_memory: bool,
    pub budget_limits: BudgetLimits,
    /// Bound on the in-memory task history ring buffer. Unlike the source's
    /// unbounded `_task_history` list, this caps memory growth for
    /// long-running orchestrator processes.
    pub history_capacity: usize,
}

impl OrchestratorConfig {
    pub fn new(domain: Domain, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            domain,
            name: name.into(),
            description: description.into(),
            max_concurrent_tasks: 10,
            default_timeout: Duration::from_secs(120),
            enable_caching: true,
            enable_monitoring: true,
            enable_memory: true,
            budget_limits: BudgetLimits::default(),
            history_capacity: 1000,
        }
    }
}
