//! # strata-connector — external service connector runtime
//!
//! Shared machinery for pulling data into the memory router and accepting
//! webhooks from external services: credential loading, rate limiting,
//! circuit breaking, scheduled sync, and signed webhook ingestion.
//! Grounded directly on `BaseConnector` in the pack's connector source —
//! integrations implement [`ConnectorBehavior`]; everything else is
//! provided by [`ConnectorRuntime`].

mod behavior;
mod config;
mod error;
mod metrics;
mod runtime;
mod status;
mod webhook;

pub use behavior::ConnectorBehavior;
pub use config::{ConnectorConfig, RateLimitConfig, SyncReport};
pub use error::ConnectorError;
pub use metrics::ConnectorMetrics;
pub use runtime::ConnectorRuntime;
pub use status::ConnectorStatus;
pub use webhook::verify_signature;
