//! Shared error kinds that every component-level error enum can wrap via a
//! `#[from]` variant, following `layer0::error`'s per-crate `thiserror` split.

use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CoreError {
    #[error("invalid domain: {0}")]
    InvalidDomain(String),

    #[error("value out of range: {field} must be in {expected}, got {actual}")]
    OutOfRange {
        field: &'static str,
        expected: &'static str,
        actual: String,
    },

    #[error("unknown config key: {0}")]
    UnknownConfigKey(String),

    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}
