//! Error types for fleet operations
//!
//! Validation errors fail before any dispatch. Per-wallet transport
//! failures never surface here; they are recorded in the batch result.

use crate::batch::OperationKind;
use std::fmt;

/// Result type
pub type Result<T> = std::result::Result<T, Error>;

/// Fleet errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Engine call failed before dispatch could start
    #[error(transparent)]
    Bridge(#[from] sniperfi_bridge::Error),

    /// Invalid operation parameters
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// Invalid wallet count
    #[error("Invalid count: {0}")]
    InvalidCount(String),

    /// Fleet has no child wallets
    #[error("No wallets in fleet")]
    NoWallets,

    /// No parent wallet is known
    #[error("No parent wallet")]
    NoParent,

    /// Backup is encrypted and no password was given
    #[error("Backup is password protected")]
    PasswordRequired,

    /// Wrong password or tampered ciphertext
    #[error("Decryption failed")]
    DecryptionFailed,

    /// Backup is structurally invalid
    #[error("Corrupt backup: {0}")]
    CorruptBackup(String),

    /// Parent key material is not available locally
    #[error("Missing key material: {0}")]
    MissingKeyMaterial(String),

    /// Another operation of the same kind is in flight
    #[error("{0} already in progress")]
    OperationInProgress(OperationKind),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Secret store error
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<sniperfi_vault::Error> for Error {
    fn from(error: sniperfi_vault::Error) -> Self {
        use sniperfi_vault::Error as Vault;
        match error {
            Vault::PasswordRequired => Error::PasswordRequired,
            Vault::DecryptionFailed => Error::DecryptionFailed,
            Vault::CorruptBackup(reason) => Error::CorruptBackup(reason),
            Vault::Io(e) => Error::Io(e),
            Vault::Serialization(e) => Error::Serialization(e),
            other => Error::Storage(other.to_string()),
        }
    }
}

impl From<sniperfi_params::Error> for Error {
    fn from(error: sniperfi_params::Error) -> Self {
        Error::InvalidParams(error.to_string())
    }
}

impl Error {
    /// Check if error is a user-facing error (vs internal error)
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidParams(_)
                | Error::InvalidCount(_)
                | Error::NoWallets
                | Error::NoParent
                | Error::PasswordRequired
                | Error::DecryptionFailed
                | Error::CorruptBackup(_)
                | Error::OperationInProgress(_)
                | Error::Config(_)
        )
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Error::NoWallets => {
                "There are no child wallets yet. Generate some wallets first.".to_string()
            }
            Error::NoParent => {
                "No parent wallet found. Generate or restore a parent wallet first.".to_string()
            }
            Error::PasswordRequired => {
                "This backup is password protected. Please enter the backup password.".to_string()
            }
            Error::DecryptionFailed => {
                "The password is incorrect or the backup has been modified.".to_string()
            }
            Error::CorruptBackup(_) => {
                "The backup file is damaged or was not created by this application.".to_string()
            }
            Error::OperationInProgress(kind) => {
                format!("A {} is already running. Wait for it to finish.", kind)
            }
            Error::Bridge(sniperfi_bridge::Error::Timeout { .. }) => {
                "The execution engine did not answer in time. Please try again.".to_string()
            }
            _ => self.to_string(),
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Bridge(_) => ErrorCategory::Transport,
            Error::InvalidParams(_)
            | Error::InvalidCount(_)
            | Error::NoWallets
            | Error::NoParent => ErrorCategory::Validation,
            Error::PasswordRequired
            | Error::DecryptionFailed
            | Error::CorruptBackup(_)
            | Error::MissingKeyMaterial(_) => ErrorCategory::Backup,
            Error::OperationInProgress(_) => ErrorCategory::Concurrency,
            Error::Config(_) => ErrorCategory::Config,
            Error::Storage(_) => ErrorCategory::Storage,
            Error::Io(_) | Error::Serialization(_) => ErrorCategory::Internal,
        }
    }
}

/// Error categories for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Engine transport errors
    Transport,
    /// Rejected before dispatch
    Validation,
    /// Backup and restore errors
    Backup,
    /// Single-flight conflicts
    Concurrency,
    /// Configuration errors
    Config,
    /// Secret store errors
    Storage,
    /// Internal/system errors
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Transport => write!(f, "Transport"),
            ErrorCategory::Validation => write!(f, "Validation"),
            ErrorCategory::Backup => write!(f, "Backup"),
            ErrorCategory::Concurrency => write!(f, "Concurrency"),
            ErrorCategory::Config => write!(f, "Config"),
            ErrorCategory::Storage => write!(f, "Storage"),
            ErrorCategory::Internal => write!(f, "Internal"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_error_detection() {
        assert!(Error::NoWallets.is_user_error());
        assert!(Error::InvalidParams("amount".to_string()).is_user_error());
        assert!(!Error::Storage("disk".to_string()).is_user_error());
        assert!(!Error::Bridge(sniperfi_bridge::Error::Protocol("x".into())).is_user_error());
    }

    #[test]
    fn test_vault_errors_keep_their_meaning() {
        assert!(matches!(
            Error::from(sniperfi_vault::Error::PasswordRequired),
            Error::PasswordRequired
        ));
        assert!(matches!(
            Error::from(sniperfi_vault::Error::DecryptionFailed),
            Error::DecryptionFailed
        ));
        assert!(matches!(
            Error::from(sniperfi_vault::Error::CorruptBackup("salt".into())),
            Error::CorruptBackup(_)
        ));
        assert!(matches!(
            Error::from(sniperfi_vault::Error::Malformed("x".into())),
            Error::Storage(_)
        ));
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(Error::NoParent.category(), ErrorCategory::Validation);
        assert_eq!(Error::DecryptionFailed.category(), ErrorCategory::Backup);
        assert_eq!(
            Error::OperationInProgress(OperationKind::Distribute).category(),
            ErrorCategory::Concurrency
        );
        assert_eq!(
            Error::Bridge(sniperfi_bridge::Error::Process("x".into())).category(),
            ErrorCategory::Transport
        );
    }

    #[test]
    fn test_user_messages() {
        assert!(Error::PasswordRequired.user_message().contains("password"));
        let msg = Error::OperationInProgress(OperationKind::Snipe).user_message();
        assert!(msg.contains("snipe"));
    }
}
