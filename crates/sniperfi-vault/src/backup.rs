//! Self-describing backup blobs
//!
//! A blob carries everything needed to restore the parent key except the
//! password: KDF and cipher identifiers, salt, iteration count and the
//! (possibly encrypted) key material, with binary fields base64 encoded.

use crate::kdf::{derive_key, generate_salt};
use crate::security::{EncryptionAlgorithm, SealingKey};
use crate::{Error, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sniperfi_params::defaults::{KDF_ITERATIONS, MAX_KDF_ITERATIONS, SALT_SIZE};
use zeroize::Zeroizing;

/// Current blob format version
pub const BACKUP_VERSION: u32 = 1;

/// Key derivation identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KdfAlgorithm {
    /// No derivation (unencrypted blob)
    #[serde(rename = "none")]
    None,
    /// PBKDF2 with HMAC-SHA256
    #[serde(rename = "pbkdf2-hmac-sha256")]
    Pbkdf2HmacSha256,
}

/// Cipher identifier, including the explicit unencrypted marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CipherAlgorithm {
    /// Key material stored in the clear
    #[serde(rename = "unencrypted")]
    Unencrypted,
    /// AES-256-GCM
    #[serde(rename = "aes-256-gcm")]
    Aes256Gcm,
    /// ChaCha20-Poly1305
    #[serde(rename = "chacha20-poly1305")]
    ChaCha20Poly1305,
}

impl CipherAlgorithm {
    /// AEAD behind this identifier, `None` for unencrypted blobs
    pub fn encryption(self) -> Option<EncryptionAlgorithm> {
        match self {
            Self::Unencrypted => None,
            Self::Aes256Gcm => Some(EncryptionAlgorithm::AesGcm),
            Self::ChaCha20Poly1305 => Some(EncryptionAlgorithm::ChaCha20Poly1305),
        }
    }
}

impl From<EncryptionAlgorithm> for CipherAlgorithm {
    fn from(algorithm: EncryptionAlgorithm) -> Self {
        match algorithm {
            EncryptionAlgorithm::AesGcm => Self::Aes256Gcm,
            EncryptionAlgorithm::ChaCha20Poly1305 => Self::ChaCha20Poly1305,
        }
    }
}

/// Password protection parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackupOptions {
    /// PBKDF2 iterations
    pub iterations: u32,
    /// Salt size (bytes)
    pub salt_size: usize,
    /// AEAD used when a password is given
    pub cipher: EncryptionAlgorithm,
}

impl Default for BackupOptions {
    fn default() -> Self {
        Self {
            iterations: KDF_ITERATIONS,
            salt_size: SALT_SIZE,
            cipher: EncryptionAlgorithm::AesGcm,
        }
    }
}

/// Backup blob
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupBlob {
    /// Format version
    pub version: u32,
    /// Public key the material belongs to (base58)
    pub public_key: String,
    /// Key material, sealed unless `cipher_algorithm` is unencrypted (base64)
    pub ciphertext: String,
    /// KDF salt (base64), absent for unencrypted blobs
    #[serde(default)]
    pub salt: Option<String>,
    /// KDF iterations, zero for unencrypted blobs
    #[serde(default)]
    pub iterations: u32,
    /// Key derivation
    pub kdf_algorithm: KdfAlgorithm,
    /// Cipher
    pub cipher_algorithm: CipherAlgorithm,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

fn normalize(password: Option<&str>) -> Option<&str> {
    password.filter(|p| !p.is_empty())
}

impl BackupBlob {
    /// Build a blob for `key_material`
    ///
    /// An empty or missing password yields an unencrypted blob.
    pub fn create(
        public_key: &str,
        key_material: &[u8],
        password: Option<&str>,
        options: &BackupOptions,
    ) -> Result<Self> {
        let created_at = Utc::now();

        let Some(password) = normalize(password) else {
            return Ok(Self {
                version: BACKUP_VERSION,
                public_key: public_key.to_string(),
                ciphertext: BASE64.encode(key_material),
                salt: None,
                iterations: 0,
                kdf_algorithm: KdfAlgorithm::None,
                cipher_algorithm: CipherAlgorithm::Unencrypted,
                created_at,
            });
        };

        if options.iterations > MAX_KDF_ITERATIONS {
            return Err(Error::Encryption(format!(
                "{} KDF iterations exceeds the limit of {}",
                options.iterations, MAX_KDF_ITERATIONS
            )));
        }
        let salt = generate_salt(options.salt_size);
        let key = derive_key(password, &salt, options.iterations)?;
        let sealed = SealingKey::from_bytes(&key[..], options.cipher)?.encrypt(key_material)?;

        Ok(Self {
            version: BACKUP_VERSION,
            public_key: public_key.to_string(),
            ciphertext: BASE64.encode(sealed),
            salt: Some(BASE64.encode(salt)),
            iterations: options.iterations,
            kdf_algorithm: KdfAlgorithm::Pbkdf2HmacSha256,
            cipher_algorithm: options.cipher.into(),
            created_at,
        })
    }

    /// Whether restoring needs a password
    pub fn is_encrypted(&self) -> bool {
        self.cipher_algorithm != CipherAlgorithm::Unencrypted
    }

    /// Recover the key material
    ///
    /// The result is checked against `public_key` when the material is a
    /// 64-byte keypair.
    pub fn open(&self, password: Option<&str>) -> Result<Zeroizing<Vec<u8>>> {
        if self.version != BACKUP_VERSION {
            return Err(Error::CorruptBackup(format!(
                "unsupported version {}",
                self.version
            )));
        }
        if self.public_key.is_empty() {
            return Err(Error::CorruptBackup("missing public key".to_string()));
        }

        let raw = BASE64
            .decode(&self.ciphertext)
            .map_err(|e| Error::CorruptBackup(format!("ciphertext is not base64: {}", e)))?;

        let material = match self.cipher_algorithm.encryption() {
            None => {
                if self.kdf_algorithm != KdfAlgorithm::None {
                    return Err(Error::CorruptBackup(
                        "unencrypted blob names a KDF".to_string(),
                    ));
                }
                Zeroizing::new(raw)
            }
            Some(algorithm) => {
                let password = normalize(password).ok_or(Error::PasswordRequired)?;
                self.decrypt(&raw, algorithm, password)?
            }
        };

        verify_public_key(&self.public_key, &material)?;
        Ok(material)
    }

    fn decrypt(
        &self,
        sealed: &[u8],
        algorithm: EncryptionAlgorithm,
        password: &str,
    ) -> Result<Zeroizing<Vec<u8>>> {
        if self.kdf_algorithm != KdfAlgorithm::Pbkdf2HmacSha256 {
            return Err(Error::CorruptBackup(
                "encrypted blob without a KDF".to_string(),
            ));
        }
        if self.iterations == 0 {
            return Err(Error::CorruptBackup("zero KDF iterations".to_string()));
        }
        if self.iterations > MAX_KDF_ITERATIONS {
            return Err(Error::CorruptBackup(format!(
                "{} KDF iterations exceeds the limit of {}",
                self.iterations, MAX_KDF_ITERATIONS
            )));
        }
        let salt = self
            .salt
            .as_deref()
            .ok_or_else(|| Error::CorruptBackup("missing salt".to_string()))?;
        let salt = BASE64
            .decode(salt)
            .map_err(|e| Error::CorruptBackup(format!("salt is not base64: {}", e)))?;
        if salt.is_empty() {
            return Err(Error::CorruptBackup("empty salt".to_string()));
        }

        let key = derive_key(password, &salt, self.iterations)?;
        SealingKey::from_bytes(&key[..], algorithm)?
            .decrypt(sealed)
            .map_err(|e| match e {
                Error::Malformed(reason) => Error::CorruptBackup(reason),
                other => other,
            })
    }

    /// Serialize as pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a blob; shape errors are [`Error::CorruptBackup`]
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::CorruptBackup(e.to_string()))
    }
}

/// Check that keypair bytes end with the recorded public key
///
/// 32-byte seeds carry no public half and pass unchecked.
fn verify_public_key(public_key: &str, material: &[u8]) -> Result<()> {
    match material.len() {
        32 => Ok(()),
        64 => {
            let embedded = bs58::encode(&material[32..]).into_string();
            if embedded == public_key {
                Ok(())
            } else {
                Err(Error::CorruptBackup(
                    "key material does not match the recorded public key".to_string(),
                ))
            }
        }
        other => Err(Error::CorruptBackup(format!(
            "unexpected key material length {}",
            other
        ))),
    }
}
