//! Error taxonomy for remote API operations
//!
//! Every failure is terminal for a run. The variants only exist so callers and
//! logs can tell *why* a run stopped.

use thiserror::Error;

/// Errors surfaced by the GitHub facade and its transport
#[derive(Debug, Error)]
pub enum ApiError {
    /// Token missing, empty, or rejected by the service
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Missing repository, branch, or file
    #[error("not found: {0}")]
    NotFound(String),

    /// Write rejected because the supplied content SHA is stale
    #[error("conflict: {0}")]
    Conflict(String),

    /// Network failure or unexpected service status
    #[error("transport error: {0}")]
    Transport(String),

    /// Malformed response or inconsistent pagination state
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl ApiError {
    /// Classify an HTTP status returned for `operation`
    pub fn from_status(status: u16, operation: &str, detail: &str) -> Self {
        let message = format!("{}: {} ({})", operation, detail, status);
        match status {
            401 | 403 => ApiError::Auth(message),
            404 => ApiError::NotFound(message),
            409 => ApiError::Conflict(message),
            _ => ApiError::Transport(message),
        }
    }

    /// Classify an octocrab error raised while running `operation`
    pub fn from_octocrab(err: octocrab::Error, operation: &str) -> Self {
        match err {
            octocrab::Error::GitHub { source, .. } => {
                ApiError::from_status(source.status_code.as_u16(), operation, &source.message)
            }
            other => ApiError::Transport(format!("{}: {}", operation, other)),
        }
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_status_classification() {
        assert_matches!(ApiError::from_status(401, "get user", "Bad credentials"), ApiError::Auth(_));
        assert_matches!(ApiError::from_status(403, "get user", "Forbidden"), ApiError::Auth(_));
        assert_matches!(ApiError::from_status(404, "get contents", "Not Found"), ApiError::NotFound(_));
        assert_matches!(ApiError::from_status(409, "update contents", "sha mismatch"), ApiError::Conflict(_));
        assert_matches!(ApiError::from_status(502, "list repos", "Bad Gateway"), ApiError::Transport(_));
    }

    #[test]
    fn test_message_names_operation() {
        let err = ApiError::from_status(404, "get contents alice/alice README.md", "Not Found");
        let text = err.to_string();
        assert!(text.starts_with("not found:"));
        assert!(text.contains("alice/alice README.md"));
        assert!(text.contains("404"));
    }
}
