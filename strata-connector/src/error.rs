//! Errors surfaced by connector request/sync/webhook handling.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("request to {endpoint} failed: {source}")]
    Request {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned status {status}")]
    Status { endpoint: String, status: u16 },

    #[error("sync already in progress")]
    SyncInProgress,

    #[error("webhook signature verification failed")]
    InvalidSignature,

    #[error("webhooks are not enabled for this connector")]
    WebhookDisabled,

    #[error("transform failed: {0}")]
    Transform(String),

    #[error("missing credential: {0}")]
    MissingCredential(String),
}
