//! Error types and result aliases for roster.
//!
//! Errors here cover the parts of the client that can actually fail: local
//! persistence, (de)serialization, and the remote search call. Login failures
//! have their own type in [`crate::remote::LoginError`] because each variant is
//! shown to the user as a distinct message.

/// The result type used throughout roster.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in roster operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A key-value storage operation failed.
    #[error("storage error: {message}")]
    Storage {
        /// Description of the storage failure.
        message: String,
        /// The underlying cause, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A serialization or deserialization error occurred.
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of the serialization failure.
        message: String,
    },

    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A remote collaborator call failed (transport error or non-success status).
    #[error("remote error: {message}")]
    Remote {
        /// Description of the remote failure.
        message: String,
        /// HTTP status, when the remote answered at all.
        status: Option<u16>,
    },

    /// An internal error occurred that should not happen in normal operation.
    #[error("internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl Error {
    /// Creates a new storage error with the given message.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new storage error with a source cause.
    #[must_use]
    pub fn storage_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Storage {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a remote error for a transport-level failure.
    #[must_use]
    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote {
            message: message.into(),
            status: None,
        }
    }

    /// Creates a remote error for a non-success HTTP status.
    #[must_use]
    pub fn remote_status(status: u16, message: impl Into<String>) -> Self {
        Self::Remote {
            message: message.into(),
            status: Some(status),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_status_keeps_status() {
        let err = Error::remote_status(502, "bad gateway");
        assert!(matches!(err, Error::Remote { status: Some(502), .. }));
        assert_eq!(err.to_string(), "remote error: bad gateway");
    }

    #[test]
    fn storage_with_source_exposes_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = Error::storage_with_source("write failed", io);
        assert!(std::error::Error::source(&err).is_some());
    }
}
