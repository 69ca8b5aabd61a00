//! Error types for the cloud collaborator layer.

use thiserror::Error;

/// Errors produced by the eval service or the promotion target.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// The service could not be reached.
    #[error("transport error: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("service returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// The eval run reached a terminal failure state server-side.
    #[error("eval run {run_id} failed: {reason}")]
    RunFailed { run_id: String, reason: String },

    /// The service answered with a payload we could not interpret.
    #[error("invalid service response: {0}")]
    InvalidResponse(String),

    /// The agent manifest file is malformed or incomplete.
    #[error("invalid agent manifest: {0}")]
    InvalidManifest(String),

    /// Client-side settings are missing or malformed.
    #[error("service configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        ServiceError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::InvalidResponse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_display() {
        let err = ServiceError::Status {
            status: 503,
            message: "service unavailable".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("503"));
        assert!(msg.contains("service unavailable"));
    }

    #[test]
    fn test_run_failed_display() {
        let err = ServiceError::RunFailed {
            run_id: "run-42".to_string(),
            reason: "infrastructure error".to_string(),
        };
        assert!(err.to_string().contains("run-42"));
        assert!(err.to_string().contains("infrastructure error"));
    }
}
