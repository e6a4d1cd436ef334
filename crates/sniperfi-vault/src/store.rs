//! File-backed secret store
//!
//! Layout under the wallet directory, which the engine shares:
//! - `.sniperfi/store.key`: hex-encoded local sealing key (0600 on unix)
//! - `.sniperfi/parent.sealed.json`: parent public key and its sealed key material
//! - `<backup_dir>/wallet_backup_<unix-ts>.json`: backup blobs
//!
//! Engine-owned files in the wallet directory are never read or written.

use crate::backup::BackupBlob;
use crate::security::{EncryptionAlgorithm, SealingKey};
use crate::{Error, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use zeroize::Zeroizing;

const STORE_DIR: &str = ".sniperfi";
const KEY_FILE: &str = "store.key";
const PARENT_FILE: &str = "parent.sealed.json";
const BACKUP_PREFIX: &str = "wallet_backup_";
const BACKUP_SUFFIX: &str = ".json";

/// Persisted parent wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentRecord {
    /// Public key (base58)
    pub public_key: String,
    /// Key material sealed with the store key (base64)
    pub sealed_key: String,
    /// When the record was first written
    pub created_at: DateTime<Utc>,
    /// When the record was last replaced by a restore
    #[serde(default)]
    pub restored_at: Option<DateTime<Utc>>,
}

impl ParentRecord {
    /// Sealed key bytes
    pub fn sealed_bytes(&self) -> Result<Vec<u8>> {
        BASE64
            .decode(&self.sealed_key)
            .map_err(|e| Error::Malformed(format!("sealed key is not base64: {}", e)))
    }
}

/// Secret store
pub struct SecretStore {
    wallet_dir: PathBuf,
    store_dir: PathBuf,
    backup_dir: PathBuf,
    key: SealingKey,
}

impl SecretStore {
    /// Open the store, creating directories and the sealing key on first use
    pub fn open(wallet_dir: impl Into<PathBuf>, backup_dir: impl Into<PathBuf>) -> Result<Self> {
        let wallet_dir = wallet_dir.into();
        let backup_dir = backup_dir.into();
        let store_dir = wallet_dir.join(STORE_DIR);
        fs::create_dir_all(&store_dir)?;
        fs::create_dir_all(&backup_dir)?;

        let key = load_or_create_key(&store_dir.join(KEY_FILE))?;
        debug!("Secret store opened at {:?}", store_dir);

        Ok(Self {
            wallet_dir,
            store_dir,
            backup_dir,
            key,
        })
    }

    /// Wallet directory
    pub fn wallet_dir(&self) -> &Path {
        &self.wallet_dir
    }

    /// Backup directory
    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Seal key material with the local key
    pub fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        self.key.encrypt(plaintext)
    }

    /// Unseal key material sealed by [`SecretStore::seal`]
    pub fn unseal(&self, sealed: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        self.key.decrypt(sealed)
    }

    /// Write the parent record
    ///
    /// `restored` marks a replacement coming from a backup; the original
    /// creation time is kept when the same key is written again.
    pub fn save_parent(&self, public_key: &str, sealed_key: &[u8], restored: bool) -> Result<ParentRecord> {
        let now = Utc::now();
        let created_at = match self.load_parent()? {
            Some(previous) if previous.public_key == public_key => previous.created_at,
            _ => now,
        };

        let record = ParentRecord {
            public_key: public_key.to_string(),
            sealed_key: BASE64.encode(sealed_key),
            created_at,
            restored_at: restored.then_some(now),
        };

        write_atomic(
            &self.store_dir.join(PARENT_FILE),
            serde_json::to_string_pretty(&record)?.as_bytes(),
        )?;
        info!("Parent wallet record written for {}", public_key);
        Ok(record)
    }

    /// Read the parent record, `None` when no parent was stored
    pub fn load_parent(&self) -> Result<Option<ParentRecord>> {
        let path = self.store_dir.join(PARENT_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&json)?))
    }

    /// Unsealed key material of the stored parent
    pub fn parent_key_material(&self) -> Result<Option<(String, Zeroizing<Vec<u8>>)>> {
        match self.load_parent()? {
            None => Ok(None),
            Some(record) => {
                let material = self.unseal(&record.sealed_bytes()?)?;
                Ok(Some((record.public_key, material)))
            }
        }
    }

    /// Write a blob as `wallet_backup_<unix-ts>.json`
    pub fn write_backup(&self, blob: &BackupBlob) -> Result<PathBuf> {
        let stamp = blob.created_at.timestamp();
        let mut path = self
            .backup_dir
            .join(format!("{}{}{}", BACKUP_PREFIX, stamp, BACKUP_SUFFIX));
        let mut n = 1;
        while path.exists() {
            path = self
                .backup_dir
                .join(format!("{}{}_{}{}", BACKUP_PREFIX, stamp, n, BACKUP_SUFFIX));
            n += 1;
        }

        write_atomic(&path, blob.to_json()?.as_bytes())?;
        info!("Backup written to {:?}", path);
        Ok(path)
    }

    /// Read a blob from disk
    pub fn read_backup(&self, path: &Path) -> Result<BackupBlob> {
        if !path.exists() {
            return Err(Error::NotFound(path.display().to_string()));
        }
        BackupBlob::from_json(&fs::read_to_string(path)?)
    }

    /// Backup files, newest first
    pub fn list_backups(&self) -> Result<Vec<PathBuf>> {
        let mut backups: Vec<(std::time::SystemTime, PathBuf)> = Vec::new();
        for entry in fs::read_dir(&self.backup_dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with(BACKUP_PREFIX) && name.ends_with(BACKUP_SUFFIX) {
                let modified = entry.metadata()?.modified()?;
                backups.push((modified, entry.path()));
            }
        }
        backups.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.cmp(&a.1)));
        Ok(backups.into_iter().map(|(_, path)| path).collect())
    }
}

fn load_or_create_key(path: &Path) -> Result<SealingKey> {
    if path.exists() {
        let encoded = Zeroizing::new(fs::read_to_string(path)?);
        let bytes = Zeroizing::new(
            hex::decode(encoded.trim())
                .map_err(|e| Error::Malformed(format!("store key is not hex: {}", e)))?,
        );
        return SealingKey::from_bytes(&bytes, EncryptionAlgorithm::AesGcm);
    }

    let key = SealingKey::generate(EncryptionAlgorithm::AesGcm);
    let encoded = Zeroizing::new(hex::encode(key.as_bytes()));
    write_atomic(path, encoded.as_bytes())?;
    restrict_permissions(path)?;
    info!("Created new store key at {:?}", path);
    Ok(key)
}

fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, contents)?;
    restrict_permissions(&tmp)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
