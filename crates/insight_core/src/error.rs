//! Error types for the insight pipeline.
//!
//! Validation failures and availability failures are the only conditions
//! that surface to callers as errors; malformed model output never does,
//! it degrades to placeholder content instead.

use thiserror::Error;

/// Errors produced by the insight service and the Ollama gateway.
#[derive(Debug, Clone, Error)]
pub enum InsightError {
    /// Request rejected before any external call was made.
    #[error("invalid request: {0}")]
    Validation(String),

    /// Ollama host not reachable (connection-level failure).
    #[error("Ollama is not reachable at {0}")]
    ServiceUnavailable(String),

    /// Host reachable but the configured model is not in its model list.
    #[error("model '{0}' is not available in Ollama")]
    ModelMissing(String),

    /// Host reachable but it answered with a non-2xx status.
    #[error("Ollama returned HTTP {status}: {body}")]
    RemoteError { status: u16, body: String },

    /// Reply arrived but could not be decoded as the expected JSON shape.
    #[error("unexpected reply from Ollama: {0}")]
    MalformedReply(String),
}

impl InsightError {
    /// Whether this error represents the externally visible
    /// "service unavailable" condition. Connection failures and remote
    /// errors are classified separately for logging but collapse to the
    /// same answer here.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            InsightError::ServiceUnavailable(_)
                | InsightError::ModelMissing(_)
                | InsightError::RemoteError { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailability_classification() {
        assert!(InsightError::ServiceUnavailable("http://localhost:11434".into()).is_unavailable());
        assert!(InsightError::ModelMissing("llama2".into()).is_unavailable());
        assert!(InsightError::RemoteError { status: 500, body: String::new() }.is_unavailable());
        assert!(!InsightError::Validation("empty topic".into()).is_unavailable());
        assert!(!InsightError::MalformedReply("no content".into()).is_unavailable());
    }
}
