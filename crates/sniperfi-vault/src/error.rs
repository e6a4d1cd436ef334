//! Error types

/// Vault errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Blob is encrypted and no password was supplied
    #[error("Backup is password protected")]
    PasswordRequired,

    /// Ciphertext did not authenticate under the derived key
    #[error("Decryption failed: wrong password or tampered data")]
    DecryptionFailed,

    /// Backup is structurally invalid
    #[error("Corrupt backup: {0}")]
    CorruptBackup(String),

    /// Sealed data has an invalid layout
    #[error("Malformed sealed data: {0}")]
    Malformed(String),

    /// Encryption error
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type
pub type Result<T> = std::result::Result<T, Error>;
