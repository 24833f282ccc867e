use thiserror::Error;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("rate limited")]
    RateLimited,

    #[error("auth failed: {0}")]
    AuthFailed(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl ProviderError {
    /// Whether retrying this exact request, possibly on another route,
    /// might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::RateLimited | ProviderError::RequestFailed(_)
        )
    }

    /// Whether this error means the credentials themselves are bad, which
    /// should quarantine the route rather than retry it later in-session.
    pub fn is_hard_auth(&self) -> bool {
        matches!(self, ProviderError::AuthFailed(_))
    }
}

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ProviderRouterError {
    #[error("no provider available for task type '{0}'")]
    NoProviderAvailable(String),

    #[error("estimated cost {estimated} exceeds route budget {limit}")]
    BudgetExceeded {
        estimated: rust_decimal::Decimal,
        limit: rust_decimal::Decimal,
    },

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(ProviderError::RateLimited.is_retryable());
        assert!(ProviderError::RequestFailed("timeout".into()).is_retryable());
        assert!(!ProviderError::AuthFailed("bad key".into()).is_retryable());
    }

    #[test]
    fn hard_auth_classification() {
        assert!(ProviderError::AuthFailed("bad key".into()).is_hard_auth());
        assert!(!ProviderError::RateLimited.is_hard_auth());
    }
}
