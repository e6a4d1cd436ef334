//! AEAD sealing
//!
//! Sealed layout: `[version(1)][algorithm(1)][nonce(12)][ciphertext]`.
//! Algorithm byte 0 is AES-256-GCM, 1 is ChaCha20-Poly1305.

use crate::{Error, Result};
use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm,
};
use chacha20poly1305::ChaCha20Poly1305;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

const SEAL_VERSION: u8 = 1;
const NONCE_LEN: usize = 12;
const HEADER_LEN: usize = 2 + NONCE_LEN;
const TAG_LEN: usize = 16;

/// Encryption algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EncryptionAlgorithm {
    /// AES-256-GCM
    #[default]
    #[serde(rename = "aes-256-gcm")]
    AesGcm,
    /// ChaCha20-Poly1305
    #[serde(rename = "chacha20-poly1305")]
    ChaCha20Poly1305,
}

impl EncryptionAlgorithm {
    fn id(self) -> u8 {
        match self {
            Self::AesGcm => 0,
            Self::ChaCha20Poly1305 => 1,
        }
    }

    fn from_id(id: u8) -> Result<Self> {
        match id {
            0 => Ok(Self::AesGcm),
            1 => Ok(Self::ChaCha20Poly1305),
            other => Err(Error::Malformed(format!("unknown algorithm id {}", other))),
        }
    }
}

/// 256-bit symmetric key bound to one AEAD algorithm
#[derive(Clone)]
pub struct SealingKey {
    key: Zeroizing<[u8; 32]>,
    algorithm: EncryptionAlgorithm,
}

impl SealingKey {
    /// Generate new random key
    pub fn generate(algorithm: EncryptionAlgorithm) -> Self {
        let mut key = Zeroizing::new([0u8; 32]);
        OsRng.fill_bytes(&mut *key);
        Self { key, algorithm }
    }

    /// Create from bytes
    pub fn from_bytes(bytes: &[u8], algorithm: EncryptionAlgorithm) -> Result<Self> {
        if bytes.len() != 32 {
            return Err(Error::Encryption("Invalid key length".to_string()));
        }
        let mut key = Zeroizing::new([0u8; 32]);
        key.copy_from_slice(bytes);
        Ok(Self { key, algorithm })
    }

    /// Key bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.key
    }

    /// Algorithm used for sealing
    pub fn algorithm(&self) -> EncryptionAlgorithm {
        self.algorithm
    }

    /// Encrypt under a fresh random nonce
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);

        let ciphertext = match self.algorithm {
            EncryptionAlgorithm::AesGcm => Aes256Gcm::new(self.key.as_ref().into())
                .encrypt(aes_gcm::Nonce::from_slice(&nonce), plaintext),
            EncryptionAlgorithm::ChaCha20Poly1305 => {
                ChaCha20Poly1305::new(self.key.as_ref().into())
                    .encrypt(chacha20poly1305::Nonce::from_slice(&nonce), plaintext)
            }
        }
        .map_err(|e| Error::Encryption(e.to_string()))?;

        let mut sealed = Vec::with_capacity(HEADER_LEN + ciphertext.len());
        sealed.push(SEAL_VERSION);
        sealed.push(self.algorithm.id());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    /// Decrypt sealed data
    ///
    /// Layout problems are [`Error::Malformed`]; an authentication failure is
    /// [`Error::DecryptionFailed`].
    pub fn decrypt(&self, sealed: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        if sealed.len() < HEADER_LEN + TAG_LEN {
            return Err(Error::Malformed(format!(
                "sealed data too short ({} bytes)",
                sealed.len()
            )));
        }
        if sealed[0] != SEAL_VERSION {
            return Err(Error::Malformed(format!(
                "unsupported seal version {}",
                sealed[0]
            )));
        }
        let algorithm = EncryptionAlgorithm::from_id(sealed[1])?;
        if algorithm != self.algorithm {
            return Err(Error::Malformed(format!(
                "algorithm mismatch: expected {:?}, got {:?}",
                self.algorithm, algorithm
            )));
        }

        let nonce = &sealed[2..HEADER_LEN];
        let ciphertext = &sealed[HEADER_LEN..];
        let plaintext = match algorithm {
            EncryptionAlgorithm::AesGcm => Aes256Gcm::new(self.key.as_ref().into())
                .decrypt(aes_gcm::Nonce::from_slice(nonce), ciphertext),
            EncryptionAlgorithm::ChaCha20Poly1305 => {
                ChaCha20Poly1305::new(self.key.as_ref().into())
                    .decrypt(chacha20poly1305::Nonce::from_slice(nonce), ciphertext)
            }
        }
        .map_err(|_| Error::DecryptionFailed)?;

        Ok(Zeroizing::new(plaintext))
    }
}

impl std::fmt::Debug for SealingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SealingKey")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}
