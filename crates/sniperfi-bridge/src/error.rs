//! Error types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Bridge errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// No response within the request deadline
    #[error("Engine timed out after {}ms running '{command}'", after.as_millis())]
    Timeout {
        /// Command that was running
        command: String,
        /// Deadline that elapsed
        after: Duration,
    },

    /// Output was not exactly one JSON document, or had an unexpected shape
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Engine reported a failure, exited abnormally or could not be spawned
    #[error("Engine error: {0}")]
    Process(String),
}

impl Error {
    /// Error kind recorded in per-wallet results
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Timeout { .. } => ErrorKind::BridgeTimeout,
            Error::Protocol(_) => ErrorKind::BridgeProtocolError,
            Error::Process(_) => ErrorKind::BridgeProcessError,
        }
    }

    /// Whether repeating an idempotent read may succeed
    ///
    /// Protocol errors are deterministic for a given engine build and are
    /// never retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Timeout { .. } | Error::Process(_))
    }
}

/// Transport-level error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Deadline elapsed
    BridgeTimeout,
    /// Malformed engine output
    BridgeProtocolError,
    /// Engine-reported or process failure
    BridgeProcessError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::BridgeTimeout => write!(f, "BridgeTimeout"),
            ErrorKind::BridgeProtocolError => write!(f, "BridgeProtocolError"),
            ErrorKind::BridgeProcessError => write!(f, "BridgeProcessError"),
        }
    }
}

/// Result type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let timeout = Error::Timeout {
            command: "balance".to_string(),
            after: Duration::from_secs(30),
        };
        assert_eq!(timeout.kind(), ErrorKind::BridgeTimeout);
        assert!(timeout.is_transient());
        assert!(timeout.to_string().contains("30000ms"));

        assert_eq!(
            Error::Protocol("x".to_string()).kind(),
            ErrorKind::BridgeProtocolError
        );
        assert!(!Error::Protocol("x".to_string()).is_transient());
        assert!(Error::Process("x".to_string()).is_transient());
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ErrorKind::BridgeTimeout.to_string(), "BridgeTimeout");
        assert_eq!(
            ErrorKind::BridgeProcessError.to_string(),
            "BridgeProcessError"
        );
    }
}
