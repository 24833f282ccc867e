//! Cost- and latency-aware routing across provider bindings, with
//! per-route circuit breakers and session-scoped quarantine on hard auth
//! failures — grounded in `neuron-turn::provider`'s retryable/hard-auth
//! error split and in `neuron-provider-anthropic`'s binding shape.

use crate::error::{ProviderError, ProviderRouterError};
use crate::types::{ProviderRequest, ProviderResponse, TaskType};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use strata_breaker::{BreakerError, BreakerState, CircuitBreaker, CircuitBreakerConfig};
use tokio::sync::Mutex;

/// Object-safe adapter over [`crate::provider::Provider`], since the
/// router holds a heterogeneous set of concrete provider bindings behind
/// one `HashMap` and `Provider` itself is not object-safe (RPITIT).
#[async_trait]
pub trait DynProvider: Send + Sync {
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError>;
}

#[async_trait]
impl<T: crate::provider::Provider> DynProvider for T {
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        crate::provider::Provider::complete(self, request).await
    }
}

/// Identifies one breaker/EWMA slot: `"{task_type}:{provider_name}"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteKey(String);

impl RouteKey {
    fn new(task_type: &TaskType, provider_name: &str) -> Self {
        Self(format!("{task_type}:{provider_name}"))
    }
}

impl std::fmt::Display for RouteKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One candidate binding for a task type, in declaration order (used as the
/// final tie-break after cost and EWMA latency).
pub struct RouteEntry {
    pub provider_name: String,
    pub provider: Arc<dyn DynProvider>,
    pub cost_per_1k_tokens: Decimal,
    pub max_cost_usd: Option<Decimal>,
}

/// Smoothing constant for the exponentially weighted moving average of
/// route latency used to break cost ties. 0.3 is a standard EWMA smoothing
/// constant; this rework documents it rather than leaving it a magic number.
const EWMA_ALPHA: f64 = 0.3;

pub struct ProviderRouter {
    routes: HashMap<TaskType, Vec<RouteEntry>>,
    breakers: HashMap<RouteKey, Arc<CircuitBreaker>>,
    ewma_latency_ms: Mutex<HashMap<RouteKey, f64>>,
    cost_accumulator: Mutex<Decimal>,
    quarantined: Mutex<HashSet<RouteKey>>,
}

impl ProviderRouter {
    pub fn new(routes: HashMap<TaskType, Vec<RouteEntry>>) -> Self {
        let mut breakers = HashMap::new();
        for (task_type, entries) in &routes {
            for entry in entries {
                let key = RouteKey::new(task_type, &entry.provider_name);
                breakers.insert(
                    key.clone(),
                    Arc::new(CircuitBreaker::new(
                        key.to_string(),
                        CircuitBreakerConfig::default(),
                    )),
                );
            }
        }
        Self {
            routes,
            breakers,
            ewma_latency_ms: Mutex::new(HashMap::new()),
            cost_accumulator: Mutex::new(Decimal::ZERO),
            quarantined: Mutex::new(HashSet::new()),
        }
    }

    /// Total cost accrued across every routed request so far. Monotonic —
    /// callers reset budgeting windows externally, matching the
    /// orchestrator's cost-accumulator design.
    pub async fn total_cost_usd(&self) -> Decimal {
        *self.cost_accumulator.lock().await
    }

    async fn estimated_cost(entry: &RouteEntry, estimated_tokens: u64) -> Decimal {
        entry.cost_per_1k_tokens * Decimal::from(estimated_tokens) / Decimal::from(1000)
    }

    /// Orders route candidates for one task type by: not quarantined, then
    /// breaker closed, then within budget, then lowest cost, then lowest
    /// EWMA latency, then declaration order.
    async fn ranked_candidates(
        &self,
        task_type: &TaskType,
        estimated_tokens: u64,
    ) -> Result<Vec<&RouteEntry>, ProviderRouterError> {
        let entries = self
            .routes
            .get(task_type)
            .ok_or_else(|| ProviderRouterError::NoProviderAvailable(task_type.to_string()))?;

        let quarantined = self.quarantined.lock().await;
        let ewma = self.ewma_latency_ms.lock().await;

        let mut eligible = Vec::new();
        for entry in entries {
            let key = RouteKey::new(task_type, &entry.provider_name);
            if quarantined.contains(&key) {
                continue;
            }
            if let Some(breaker) = self.breakers.get(&key) {
                if breaker.state().await == BreakerState::Open {
                    continue;
                }
            }
            let cost = Self::estimated_cost(entry, estimated_tokens).await;
            if let Some(limit) = entry.max_cost_usd {
                if cost > limit {
                    continue;
                }
            }
            eligible.push((entry, cost, *ewma.get(&key).unwrap_or(&0.0)));
        }

        eligible.sort_by(|a, b| {
            a.1.cmp(&b.1)
                .then(a.2.partial_cmp(&b.2).unwrap_or(std::cmp::Ordering::Equal))
        });

        if eligible.is_empty() {
            return Err(ProviderRouterError::NoProviderAvailable(
                task_type.to_string(),
            ));
        }

        Ok(eligible.into_iter().map(|(e, _, _)| e).collect())
    }

    /// Picks the single best candidate without attempting a call — used by
    /// callers that want to inspect a route before committing to it.
    pub async fn route_request(
        &self,
        task_type: &TaskType,
        estimated_tokens: u64,
    ) -> Result<&RouteEntry, ProviderRouterError> {
        let candidates = self.ranked_candidates(task_type, estimated_tokens).await?;
        Ok(candidates[0])
    }

    /// Tries each eligible candidate in ranked order through its breaker.
    /// Retryable errors advance to the next candidate; hard-auth errors
    /// additionally quarantine the route for the rest of the session.
    pub async fn execute_with_fallback(
        &self,
        task_type: &TaskType,
        request: ProviderRequest,
        estimated_tokens: u64,
    ) -> Result<ProviderResponse, ProviderRouterError> {
        let candidates = self.ranked_candidates(task_type, estimated_tokens).await?;

        let mut last_err = None;
        for entry in candidates {
            let key = RouteKey::new(task_type, &entry.provider_name);
            let breaker = match self.breakers.get(&key) {
                Some(b) => b.clone(),
                None => continue,
            };

            let started = std::time::Instant::now();
            let result = breaker
                .call_with_classifier(
                    || entry.provider.complete(request.clone()),
                    |e: &ProviderError| e.is_retryable() || e.is_hard_auth(),
                )
                .await;
            let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

            match result {
                Ok(response) => {
                    self.record_latency(&key, elapsed_ms).await;
                    if let Some(cost) = response.cost {
                        *self.cost_accumulator.lock().await += cost;
                    }
                    return Ok(response);
                }
                Err(BreakerError::Open { .. }) => {
                    tracing::debug!(route = %key, "breaker open, skipping route");
                    continue;
                }
                Err(BreakerError::Inner(e)) => {
                    if e.is_hard_auth() {
                        tracing::warn!(route = %key, "hard auth failure, quarantining route");
                        self.quarantined.lock().await.insert(key.clone());
                    }
                    last_err = Some(e);
                    continue;
                }
            }
        }

        match last_err {
            Some(e) => Err(ProviderRouterError::Provider(e)),
            None => Err(ProviderRouterError::NoProviderAvailable(
                task_type.to_string(),
            )),
        }
    }

    async fn record_latency(&self, key: &RouteKey, sample_ms: f64) {
        let mut ewma = self.ewma_latency_ms.lock().await;
        let entry = ewma.entry(key.clone()).or_insert(sample_ms);
        *entry = EWMA_ALPHA * sample_ms + (1.0 - EWMA_ALPHA) * *entry;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::Provider;
    use crate::types::{ProviderMessage, Role, StopReason, TokenUsage};
    use std::sync::atomic::{AtomicU32, Ordering};

    struct AlwaysFails;

    impl Provider for AlwaysFails {
        async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            Err(ProviderError::RequestFailed("down".into()))
        }
    }

    struct AlwaysSucceeds {
        calls: AtomicU32,
    }

    impl Provider for AlwaysSucceeds {
        async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ProviderResponse {
                content: vec![],
                stop_reason: StopReason::EndTurn,
                usage: TokenUsage::default(),
                model: "mock".into(),
                cost: Some(Decimal::new(1, 2)),
            })
        }
    }

    fn sample_request() -> ProviderRequest {
        ProviderRequest {
            model: None,
            messages: vec![ProviderMessage {
                role: Role::User,
                content: vec![],
            }],
            tools: vec![],
            max_tokens: None,
            temperature: None,
            system: None,
            extra: serde_json::Value::Null,
        }
    }

    fn route(name: &str, provider: Arc<dyn DynProvider>) -> RouteEntry {
        RouteEntry {
            provider_name: name.to_string(),
            provider,
            cost_per_1k_tokens: Decimal::new(1, 2),
            max_cost_usd: None,
        }
    }

    #[tokio::test]
    async fn falls_back_to_second_route_on_failure() {
        let task_type = TaskType::new("chat");
        let mut routes = HashMap::new();
        routes.insert(
            task_type.clone(),
            vec![
                route("flaky", Arc::new(AlwaysFails)),
                route(
                    "reliable",
                    Arc::new(AlwaysSucceeds {
                        calls: AtomicU32::new(0),
                    }),
                ),
            ],
        );
        let router = ProviderRouter::new(routes);

        let result = router
            .execute_with_fallback(&task_type, sample_request(), 100)
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn no_provider_available_for_unknown_task_type() {
        let router = ProviderRouter::new(HashMap::new());
        let result = router
            .execute_with_fallback(&TaskType::new("unknown"), sample_request(), 100)
            .await;
        assert!(matches!(
            result,
            Err(ProviderRouterError::NoProviderAvailable(_))
        ));
    }

    #[tokio::test]
    async fn route_request_excludes_a_candidate_whose_breaker_is_open() {
        let task_type = TaskType::new("chat");
        let mut routes = HashMap::new();
        routes.insert(task_type.clone(), vec![route("flaky", Arc::new(AlwaysFails))]);
        let router = ProviderRouter::new(routes);

        // Default failure_threshold is 5; five failed calls trip the breaker.
        for _ in 0..5 {
            let _ = router
                .execute_with_fallback(&task_type, sample_request(), 100)
                .await;
        }

        let result = router.route_request(&task_type, 100).await;
        assert!(matches!(
            result,
            Err(ProviderRouterError::NoProviderAvailable(_))
        ));
    }

    #[tokio::test]
    async fn cost_over_budget_is_excluded() {
        let task_type = TaskType::new("chat");
        let mut entry = route("expensive", Arc::new(AlwaysSucceeds { calls: AtomicU32::new(0) }));
        entry.max_cost_usd = Some(Decimal::new(1, 6));
        let mut routes = HashMap::new();
        routes.insert(task_type.clone(), vec![entry]);
        let router = ProviderRouter::new(routes);

        let result = router.route_request(&task_type, 1_000_000).await;
        assert!(matches!(
            result,
            Err(ProviderRouterError::NoProviderAvailable(_))
        ));
    }
}
