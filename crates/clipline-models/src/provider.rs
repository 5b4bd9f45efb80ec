//! Capability provider error taxonomy.
//!
//! Both external collaborators (analysis provider, media toolchain) report
//! failures through this closed set of kinds. The orchestrator decides retry
//! behavior from the kind alone; messages are for logs only and never reach
//! job state.

use thiserror::Error;

use crate::job::FailureCause;

/// Result type for capability provider calls.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Typed failure from an external capability provider.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// Retryable: timeout, rate limit, transient server error
    #[error("transient provider error: {0}")]
    Transient(String),

    /// Not retryable: the input itself is unusable
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Not retryable: quota permanently exhausted, surfaced distinctly
    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),
}

impl ProviderError {
    pub fn transient(msg: impl Into<String>) -> Self {
        Self::Transient(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn quota_exceeded(msg: impl Into<String>) -> Self {
        Self::QuotaExceeded(msg.into())
    }

    /// Whether the retry policy applies to this error.
    pub fn is_transient(&self) -> bool {
        matches!(self, ProviderError::Transient(_))
    }

    /// The failure cause recorded on the job when this error is final.
    pub fn failure_cause(&self) -> FailureCause {
        match self {
            ProviderError::Transient(_) => FailureCause::ProviderTransient,
            ProviderError::InvalidInput(_) => FailureCause::InvalidInput,
            ProviderError::QuotaExceeded(_) => FailureCause::QuotaExceeded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transient_is_retryable() {
        assert!(ProviderError::transient("timeout").is_transient());
        assert!(!ProviderError::invalid_input("corrupt").is_transient());
        assert!(!ProviderError::quota_exceeded("out").is_transient());
    }

    #[test]
    fn test_failure_cause_mapping() {
        assert_eq!(
            ProviderError::quota_exceeded("out").failure_cause(),
            FailureCause::QuotaExceeded
        );
        assert_eq!(
            ProviderError::invalid_input("bad").failure_cause(),
            FailureCause::InvalidInput
        );
    }
}
