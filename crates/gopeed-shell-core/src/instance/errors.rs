use crate::errors::ShellError;

#[derive(Debug, thiserror::Error)]
pub enum LocatorError {
    #[error("Instance lookup at '{endpoint}' failed: {message}")]
    QueryFailed { endpoint: String, message: String },
}

impl ShellError for LocatorError {
    fn error_code(&self) -> &'static str {
        match self {
            LocatorError::QueryFailed { .. } => "LOCATOR_QUERY_FAILED",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClaimError {
    #[error("Cannot prepare runtime directory '{path}': {source}")]
    RuntimeDir {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to claim instance identity at '{path}': {message}")]
    LockFailed { path: String, message: String },
}

impl ShellError for ClaimError {
    fn error_code(&self) -> &'static str {
        match self {
            ClaimError::RuntimeDir { .. } => "CLAIM_RUNTIME_DIR",
            ClaimError::LockFailed { .. } => "CLAIM_LOCK_FAILED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locator_error_display() {
        let error = LocatorError::QueryFailed {
            endpoint: "/tmp/gopeed.sock".to_string(),
            message: "permission denied".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Instance lookup at '/tmp/gopeed.sock' failed: permission denied"
        );
        assert_eq!(error.error_code(), "LOCATOR_QUERY_FAILED");
        assert!(!error.is_user_error());
    }
}
