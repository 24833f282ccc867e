//! Typed connector configuration, grounded on `ConnectorConfig` in
//! `base_connector.py` — same fields, same defaults, no untyped dict.

use std::time::Duration;
use strata_ratelimit::Strategy;

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub calls: u32,
    pub window: Duration,
    pub strategy: Strategy,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            calls: 100,
            window: Duration::from_secs(60),
            strategy: Strategy::SlidingWindow,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConnectorConfig {
    pub name: String,
    pub base_url: String,
    pub api_version: String,
    pub timeout: Duration,
    pub max_retries: u32,
    pub rate_limit: RateLimitConfig,
    pub cache_ttl: Duration,
    pub sync_interval: Duration,
    pub webhook_enabled: bool,
}

impl ConnectorConfig {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            api_version: "v1".to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 3,
            rate_limit: RateLimitConfig::default(),
            cache_ttl: Duration::from_secs(300),
            sync_interval: Duration::from_secs(3600),
            webhook_enabled: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub success: bool,
    pub records_fetched: usize,
    pub records_stored: usize,
    pub errors: Vec<String>,
    pub duration_ms: u64,
}
