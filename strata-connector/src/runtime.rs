//! `ConnectorRuntime`: the shared machinery every connector gets for free,
//! grounded on `BaseConnector`'s `__init__`/`make_request`/`sync`/
//! `start_auto_sync`/`handle_webhook`.

use chrono::{DateTime, Utc};
use reqwest::{Client, Method};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;

use strata_breaker::{BreakerError, CircuitBreaker, CircuitBreakerConfig};
use strata_core::Domain;
use strata_memory::MemoryRouter;
use strata_ratelimit::RateLimiter;
use strata_secrets::{IntegrationCredentials, SecretValue, SecretsStore};

use crate::behavior::ConnectorBehavior;
use crate::config::{ConnectorConfig, SyncReport};
use crate::error::ConnectorError;
use crate::metrics::ConnectorMetrics;
use crate::status::ConnectorStatus;
use crate::webhook::verify_signature;

/// Owns everything a connector needs besides the integration-specific
/// request/transform logic, which lives in `B: ConnectorBehavior`.
pub struct ConnectorRuntime<B: ConnectorBehavior> {
    config: ConnectorConfig,
    behavior: B,
    credentials: IntegrationCredentials,
    client: Client,
    rate_limiter: RateLimiter,
    breaker: Arc<CircuitBreaker>,
    memory: Option<Arc<MemoryRouter>>,
    domain: Domain,
    last_sync: RwLock<Option<DateTime<Utc>>>,
    sync_in_progress: AtomicBool,
    sync_task: Mutex<Option<JoinHandle<()>>>,
    status: RwLock<ConnectorStatus>,
    metrics: ConnectorMetrics,
}

impl<B: ConnectorBehavior> ConnectorRuntime<B> {
    pub async fn new<S: SecretsStore>(
        config: ConnectorConfig,
        behavior: B,
        secrets: &S,
        memory: Option<Arc<MemoryRouter>>,
        domain: Domain,
    ) -> Result<Self, ConnectorError> {
        let credentials = secrets.get_integration(&config.name).await;
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ConnectorError::Request {
                endpoint: "<client-build>".to_string(),
                source: e,
            })?;
        let rate_limiter = RateLimiter::new(
            config.rate_limit.calls,
            config.rate_limit.window,
            config.rate_limit.strategy,
        );
        let breaker = Arc::new(CircuitBreaker::new(
            format!("connector:{}", config.name),
            CircuitBreakerConfig::default(),
        ));

        Ok(Self {
            config,
            behavior,
            credentials,
            client,
            rate_limiter,
            breaker,
            memory,
            domain,
            last_sync: RwLock::new(None),
            sync_in_progress: AtomicBool::new(false),
            sync_task: Mutex::new(None),
            status: RwLock::new(ConnectorStatus::Disconnected),
            metrics: ConnectorMetrics::default(),
        })
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn metrics(&self) -> &ConnectorMetrics {
        &self.metrics
    }

    pub async fn status(&self) -> ConnectorStatus {
        *self.status.read().await
    }

    pub async fn connect(&self) -> Result<(), ConnectorError> {
        let healthy = self.behavior.test_connection().await?;
        *self.status.write().await = if healthy {
            ConnectorStatus::Healthy
        } else {
            ConnectorStatus::Unhealthy
        };
        Ok(())
    }

    pub async fn disconnect(&self) {
        self.stop_auto_sync().await;
        *self.status.write().await = ConnectorStatus::Disconnected;
    }

    fn bearer_token(&self) -> Option<String> {
        self.credentials
            .get("access_token")
            .or_else(|| self.credentials.get("api_key"))
            .and_then(SecretValue::to_string_lossy)
    }

    /// Rate-limited, circuit-breaker-wrapped HTTP call. Degrades `status` to
    /// `Degraded` on any failure that reaches the caller (4xx/5xx or
    /// transport error), matching the source's `except aiohttp.ClientError`
    /// handling in `make_request`.
    pub async fn make_request(
        &self,
        method: Method,
        endpoint: &str,
        params: Option<&HashMap<String, String>>,
        json_body: Option<&Value>,
    ) -> Result<Value, ConnectorError> {
        self.rate_limiter.wait_if_needed().await;

        let url = format!(
            "{}/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.api_version,
            endpoint.trim_start_matches('/')
        );

        let result = self
            .breaker
            .call_with_classifier(
                || async {
                    let mut req = self
                        .client
                        .request(method.clone(), &url)
                        .timeout(self.config.timeout);
                    if let Some(p) = params {
                        req = req.query(p);
                    }
                    if let Some(body) = json_body {
                        req = req.json(body);
                    }
                    if let Some(token) = self.bearer_token() {
                        req = req.bearer_auth(token);
                    }

                    let response = req.send().await.map_err(|e| ConnectorError::Request {
                        endpoint: endpoint.to_string(),
                        source: e,
                    })?;
                    let status = response.status();
                    if status.is_client_error() || status.is_server_error() {
                        return Err(ConnectorError::Status {
                            endpoint: endpoint.to_string(),
                            status: status.as_u16(),
                        });
                    }
                    response
                        .json::<Value>()
                        .await
                        .map_err(|e| ConnectorError::Request {
                            endpoint: endpoint.to_string(),
                            source: e,
                        })
                },
                |_: &ConnectorError| true,
            )
            .await;

        match result {
            Ok(value) => {
                self.metrics.record_request(true);
                Ok(value)
            }
            Err(BreakerError::Open { .. }) => {
                self.metrics.record_request(false);
                Err(ConnectorError::Status {
                    endpoint: endpoint.to_string(),
                    status: 503,
                })
            }
            Err(BreakerError::Inner(e)) => {
                self.metrics.record_request(false);
                *self.status.write().await = ConnectorStatus::Degraded;
                Err(e)
            }
        }
    }

    async fn sync_params(&self, full_sync: bool) -> HashMap<String, String> {
        let mut params = HashMap::new();
        params.insert("limit".to_string(), "1000".to_string());
        if full_sync {
            params.insert("offset".to_string(), "0".to_string());
        } else if let Some(ts) = *self.last_sync.read().await {
            params.insert("modified_since".to_string(), ts.to_rfc3339());
        }
        params
    }

    /// Non-reentrant: a caller arriving while a sync is already running is
    /// turned away immediately rather than made to wait, matching the
    /// source's check-then-immediate-return (not a mutex).
    pub async fn sync(&self, full_sync: bool) -> SyncReport {
        if self
            .sync_in_progress
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::warn!(connector = %self.config.name, "sync already in progress, skipping");
            return SyncReport {
                success: false,
                errors: vec!["sync already in progress".to_string()],
                ..Default::default()
            };
        }

        let start = Instant::now();
        let mut report = self.run_sync(full_sync).await;
        self.sync_in_progress.store(false, Ordering::SeqCst);
        report.duration_ms = start.elapsed().as_millis() as u64;
        self.metrics.record_sync();
        report
    }

    async fn run_sync(&self, full_sync: bool) -> SyncReport {
        let params = self.sync_params(full_sync).await;
        let data = match self.behavior.fetch_data(params).await {
            Ok(data) => data,
            Err(e) => {
                return SyncReport {
                    success: false,
                    errors: vec![e.to_string()],
                    ..Default::default()
                };
            }
        };

        let records_fetched = self.behavior.count_records(&data);
        let chunks = self
            .behavior
            .transform_to_chunks(&data, self.domain, &self.config.name);

        let records_stored = match &self.memory {
            Some(memory) => memory.upsert_chunks(chunks).await.chunks_stored,
            None => chunks.len(),
        };

        *self.last_sync.write().await = Some(Utc::now());

        SyncReport {
            success: true,
            records_fetched,
            records_stored,
            errors: Vec::new(),
            duration_ms: 0,
        }
    }

    /// Spawns a background loop that calls `sync(false)` every
    /// `sync_interval`, retrying after 60s on failure — matching
    /// `_auto_sync_loop`'s `except Exception: sleep(60)` behavior.
    pub async fn start_auto_sync(self: &Arc<Self>) {
        let this = Arc::clone(self);
        let handle = tokio::spawn(async move {
            loop {
                tokio::time::sleep(this.config.sync_interval).await;
                let report = this.sync(false).await;
                if !report.success {
                    tracing::warn!(
                        connector = %this.config.name,
                        errors = ?report.errors,
                        "auto-sync failed, retrying in 60s"
                    );
                    tokio::time::sleep(Duration::from_secs(60)).await;
                }
            }
        });
        *self.sync_task.lock().await = Some(handle);
    }

    pub async fn stop_auto_sync(&self) {
        if let Some(handle) = self.sync_task.lock().await.take() {
            handle.abort();
        }
    }

    /// Verifies `signature` against `webhook_secret` (when configured) and
    /// dispatches to `B::process_webhook`. The verifier is real
    /// HMAC-SHA256, not the source's always-`true` placeholder.
    pub async fn handle_webhook(
        &self,
        payload: Value,
        signature: Option<&str>,
    ) -> Result<(), ConnectorError> {
        if !self.config.webhook_enabled {
            return Err(ConnectorError::WebhookDisabled);
        }

        if let Some(secret) = self.credentials.get("webhook_secret") {
            let sig = signature.ok_or(ConnectorError::InvalidSignature)?;
            let body =
                serde_json::to_vec(&payload).map_err(|e| ConnectorError::Transform(e.to_string()))?;
            let verified = secret.with_bytes(|bytes| verify_signature(bytes, &body, sig));
            if !verified {
                return Err(ConnectorError::InvalidSignature);
            }
        }

        self.metrics.record_webhook();
        self.behavior.process_webhook(payload).await
    }
}
