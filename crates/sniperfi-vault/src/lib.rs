//! Key material protection
//!
//! Password-based backup blobs (PBKDF2-HMAC-SHA256 + AEAD) and the
//! file-backed secret store that keeps the parent key sealed at rest.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod backup;
pub mod error;
pub mod kdf;
pub mod security;
pub mod store;

pub use backup::{BackupBlob, BackupOptions, CipherAlgorithm, KdfAlgorithm, BACKUP_VERSION};
pub use error::{Error, Result};
pub use security::{EncryptionAlgorithm, SealingKey};
pub use store::{ParentRecord, SecretStore};
