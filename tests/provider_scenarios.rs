//! End-to-end provider routing and circuit breaker scenarios, using mock
//! `Provider` implementations — no live network calls.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use strata_breaker::{BreakerError, BreakerState, CircuitBreaker, CircuitBreakerConfig};
use strata_provider::{
    DynProvider, ProviderError, ProviderMessage, ProviderRequest, ProviderResponse,
    ProviderRouter, ProviderRouterError, RouteEntry, Role, StopReason, TaskType, TokenUsage,
};
use rust_decimal::Decimal;

struct AlwaysFails {
    calls: AtomicU32,
}

impl strata_provider::Provider for AlwaysFails {
    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ProviderError::RequestFailed("transport error".into()))
    }
}

struct Scripted {
    content: &'static str,
}

impl strata_provider::Provider for Scripted {
    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        Ok(ProviderResponse {
            content: vec![strata_provider::ContentPart::Text {
                text: self.content.to_string(),
            }],
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

/// Scenario 3: provider fallback.
#[tokio::test]
async fn fallback_reaches_the_second_route_after_the_first_fails() {
    let task_type = TaskType::new("analysis");
    let flaky = Arc::new(AlwaysFails {
        calls: AtomicU32::new(0),
    });

    let mut routes = HashMap::new();
    routes.insert(
        task_type.clone(),
        vec![
            route("a", flaky.clone()),
            route("b", Arc::new(Scripted { content: "ok" })),
        ],
    );
    let router = ProviderRouter::new(routes);

    let response = router
        .execute_with_fallback(&task_type, sample_request(), 100)
        .await
        .expect("route b succeeds");

    match &response.content[0] {
        strata_provider::ContentPart::Text { text } => assert_eq!(text, "ok"),
        other => panic!("unexpected content part: {other:?}"),
    }
    assert_eq!(flaky.calls.load(Ordering::SeqCst), 1);
}

/// Scenario 9 (from the circuit breaker quantified invariant): if all
/// routes fail, the caller receives the last error.
#[tokio::test]
async fn all_routes_failing_surfaces_the_last_error() {
    let task_type = TaskType::new("analysis");
    let mut routes = HashMap::new();
    routes.insert(
        task_type.clone(),
        vec![route(
            "only",
            Arc::new(AlwaysFails {
                calls: AtomicU32::new(0),
            }),
        )],
    );
    let router = ProviderRouter::new(routes);

    let result = router
        .execute_with_fallback(&task_type, sample_request(), 100)
        .await;

    assert!(matches!(result, Err(ProviderRouterError::Provider(_))));
}

/// Scenario 4: circuit trip, admission after open_timeout, and close on
/// half-open success — exercised directly against `CircuitBreaker` rather
/// than through a route, since the threshold/timeout need to be small for
/// a fast test.
#[tokio::test]
async fn circuit_trips_after_threshold_then_recovers() {
    let breaker = CircuitBreaker::new(
        "analysis:flaky",
        CircuitBreakerConfig {
            failure_threshold: 3,
            success_threshold: 1,
            open_timeout: Duration::from_millis(20),
        },
    );
    let calls = AtomicU32::new(0);

    for _ in 0..3 {
        let result: Result<(), BreakerError<&str>> = breaker
            .call(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err("boom") }
            })
            .await;
        assert!(matches!(result, Err(BreakerError::Inner(_))));
    }
    assert_eq!(breaker.state().await, BreakerState::Open);

    // The 4th call short-circuits without invoking the underlying function.
    let result: Result<(), BreakerError<&str>> = breaker.call(|| async { Ok(()) }).await;
    assert!(matches!(result, Err(BreakerError::Open { .. })));
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    tokio::time::sleep(Duration::from_millis(30)).await;

    // After open_timeout, the next call is admitted (half-open) and, with
    // success_threshold=1, closes the circuit immediately on success.
    let result: Result<(), BreakerError<&str>> = breaker.call(|| async { Ok(()) }).await;
    assert!(result.is_ok());
    assert_eq!(breaker.state().await, BreakerState::Closed);
}
