//! Scenario 6: connector incremental sync, exercised against
//! `ConnectorRuntime` with a recording mock behavior — no live network
//! calls.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use strata_connector::{ConnectorBehavior, ConnectorConfig, ConnectorError, ConnectorRuntime};
use strata_core::Domain;
use strata_secrets::EnvOnlySecretsStore;

struct RecordingBehavior {
    calls: AtomicUsize,
    last_params: Arc<Mutex<Option<HashMap<String, String>>>>,
}

impl RecordingBehavior {
    fn new(last_params: Arc<Mutex<Option<HashMap<String, String>>>>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            last_params,
        }
    }
}

#[async_trait]
impl ConnectorBehavior for RecordingBehavior {
    async fn test_connection(&self) -> Result<bool, ConnectorError> {
        Ok(true)
    }

    async fn fetch_data(&self, params: HashMap<String, String>) -> Result<Value, ConnectorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_params.lock().unwrap() = Some(params);
        Ok(json!({"results": [{"id": 1}, {"id": 2}, {"id": 3}]}))
    }

    async fn process_webhook(&self, _payload: Value) -> Result<(), ConnectorError> {
        Ok(())
    }
}

#[tokio::test]
async fn incremental_sync_completes_sequential_calls_and_releases_the_guard() {
    let secrets = EnvOnlySecretsStore::new();
    let config = ConnectorConfig::new("records", "https://example.invalid");
    let last_params = Arc::new(Mutex::new(None));
    let runtime = Arc::new(
        ConnectorRuntime::new(
            config,
            RecordingBehavior::new(last_params.clone()),
            &secrets,
            None,
            Domain::Shared,
        )
        .await
        .unwrap(),
    );

    let first = runtime.sync(true).await;
    assert!(first.success);
    assert_eq!(first.records_fetched, 3);

    // A genuinely concurrent second call while the first is still running
    // is turned away with `success=false, records_fetched=0` by
    // `strata-connector`'s own `concurrent_sync_is_turned_away_not_queued`
    // test. Here, a call issued after the first completes must succeed —
    // the reentrancy guard releases once `sync` returns.
    let second = runtime.sync(false).await;
    assert!(second.success);
}

#[tokio::test]
async fn second_sync_passes_modified_since_from_the_first() {
    let secrets = EnvOnlySecretsStore::new();
    let config = ConnectorConfig::new("records", "https://example.invalid");
    let last_params = Arc::new(Mutex::new(None));
    let runtime = ConnectorRuntime::new(
        config,
        RecordingBehavior::new(last_params.clone()),
        &secrets,
        None,
        Domain::Shared,
    )
    .await
    .unwrap();

    runtime.sync(true).await;
    assert!(!last_params.lock().unwrap().as_ref().unwrap().contains_key("modified_since"));

    runtime.sync(false).await;
    let params = last_params.lock().unwrap().clone().unwrap();
    assert!(params.contains_key("modified_since"));
}
