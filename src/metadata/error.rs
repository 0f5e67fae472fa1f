use thiserror::Error;

/// Marker the remote service puts in a failure reason when the requested
/// record does not exist.
pub const NOT_FOUND_MARKER: &str = "NOT_FOUND";

/// Failure of a remote metadata call. The reason is a free-form message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RemoteError {
    message: String,
}

impl RemoteError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn not_found(what: &str, id: &str) -> Self {
        Self::new(format!("{}: {} {} does not exist", NOT_FOUND_MARKER, what, id))
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_not_found(&self) -> bool {
        self.message.contains(NOT_FOUND_MARKER)
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        RemoteError::new(e.to_string())
    }
}
