use thiserror::Error;

/// A failure reported by the remote analysis service, already normalized to
/// a single human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RemoteFailure {
    pub message: String,
}

impl RemoteFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum FeedlensError {
    #[error("{0}")]
    Validation(String),

    #[error("submission in progress")]
    SubmissionInProgress,

    #[error(transparent)]
    Remote(#[from] RemoteFailure),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl FeedlensError {
    /// Returns `true` when the error is likely transient and worth retrying
    /// (e.g. HTTP 429/5xx, network timeouts, connection refused).
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => {
                if let Some(status) = e.status() {
                    status.as_u16() == 429 || status.is_server_error()
                } else {
                    e.is_timeout() || e.is_connect() || e.is_request()
                }
            }
            Self::Status { status, .. } => *status == 429 || (500..600).contains(status),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, FeedlensError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_failure_displays_bare_message() {
        let err = FeedlensError::from(RemoteFailure::new("Feedback message cannot be empty"));
        assert_eq!(err.to_string(), "Feedback message cannot be empty");
    }

    #[test]
    fn test_conflict_message() {
        assert_eq!(
            FeedlensError::SubmissionInProgress.to_string(),
            "submission in progress"
        );
    }

    #[test]
    fn test_transient_status_codes() {
        for status in [429, 500, 502, 503, 504] {
            let err = FeedlensError::Status {
                status,
                body: String::new(),
            };
            assert!(err.is_transient(), "{status} should be transient");
        }
    }

    #[test]
    fn test_permanent_status_codes() {
        for status in [400, 401, 404, 422] {
            let err = FeedlensError::Status {
                status,
                body: String::new(),
            };
            assert!(!err.is_transient(), "{status} should not be transient");
        }
    }

    #[test]
    fn test_permanent_validation() {
        let err = FeedlensError::Validation("too short".into());
        assert!(!err.is_transient());
    }

    #[test]
    fn test_permanent_detail() {
        let err = FeedlensError::Remote(RemoteFailure::new("Feedback message cannot be empty"));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_normalized_failure_never_retried() {
        // already past the retry loop, whatever the message says
        let err = FeedlensError::Remote(RemoteFailure::new("operation timed out"));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_permanent_conflict() {
        assert!(!FeedlensError::SubmissionInProgress.is_transient());
    }
}
