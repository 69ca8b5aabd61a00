//! Error taxonomy for gate runs.
//!
//! Every kind here fails the run closed (non-zero exit) except
//! `Promotion(TargetFailed)`, which can only occur after a gate has already
//! passed and is reported distinctly for that reason.

use agentgate_cloud::ServiceError;

use crate::promotion::PromotionError;

/// Errors produced by a gate run.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    /// The service returned a result for an evaluator with no configured
    /// threshold.
    #[error("evaluator '{evaluator}' has no configured threshold")]
    UnknownEvaluator { evaluator: String },

    /// A configured evaluator came back with no result.
    #[error("no result returned for configured evaluator '{evaluator}'")]
    MissingEvaluatorResult { evaluator: String },

    /// The eval service did not answer within the bounded wait.
    #[error("evaluation did not complete within {limit_secs}s")]
    EvaluationTimedOut { limit_secs: u64 },

    /// The eval service failed or was unreachable.
    #[error("eval service error: {0}")]
    Transport(#[from] ServiceError),

    /// A threshold, dataset, or result value failed structural validation.
    #[error("config validation failed: {0}")]
    ConfigValidation(String),

    /// The promotion state machine refused or the target failed.
    #[error("promotion error: {0}")]
    Promotion(#[from] PromotionError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for agentgate domain operations.
pub type Result<T> = std::result::Result<T, GateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_evaluator_names_the_evaluator() {
        let err = GateError::UnknownEvaluator {
            evaluator: "fluency".to_string(),
        };
        assert!(err.to_string().contains("fluency"));
        assert!(err.to_string().contains("no configured threshold"));
    }

    #[test]
    fn test_timeout_carries_limit() {
        let err = GateError::EvaluationTimedOut { limit_secs: 900 };
        assert!(err.to_string().contains("900"));
    }

    #[test]
    fn test_transport_wraps_service_error() {
        let err: GateError = ServiceError::Transport("connection refused".to_string()).into();
        assert!(err.to_string().contains("connection refused"));
    }
}
