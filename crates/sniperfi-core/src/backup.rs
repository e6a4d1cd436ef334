//! Backup and restore of the parent key
//!
//! Key material never leaves the process unsealed except inside a backup
//! blob. Without a password the blob is explicitly marked unencrypted; the
//! manager never falls back to a built-in key.

use crate::{Error, FleetRegistry, Result, Wallet};
use sniperfi_vault::{BackupBlob, BackupOptions, SecretStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use zeroize::Zeroizing;

/// Backup/restore manager
pub struct BackupManager {
    registry: Arc<FleetRegistry>,
    store: Arc<SecretStore>,
    options: BackupOptions,
}

impl BackupManager {
    /// Create new backup manager
    pub fn new(registry: Arc<FleetRegistry>, store: Arc<SecretStore>, options: BackupOptions) -> Self {
        Self {
            registry,
            store,
            options,
        }
    }

    /// Unsealed parent key material
    async fn parent_key_material(&self) -> Result<(String, Zeroizing<Vec<u8>>)> {
        let parent = self.registry.get_parent().await?.ok_or(Error::NoParent)?;

        if let Some(sealed) = &parent.encrypted_private_key {
            return Ok((parent.public_key.clone(), self.store.unseal(sealed)?));
        }

        match self.store.parent_key_material()? {
            Some((public_key, material)) if public_key == parent.public_key => {
                Ok((public_key, material))
            }
            _ => Err(Error::MissingKeyMaterial(format!(
                "no local key material for parent {}",
                parent.public_key
            ))),
        }
    }

    /// Build a backup blob of the parent key
    pub async fn backup(&self, password: Option<&str>) -> Result<BackupBlob> {
        let (public_key, material) = self.parent_key_material().await?;
        let blob = BackupBlob::create(&public_key, &material, password, &self.options)?;
        if blob.is_encrypted() {
            info!("Created password-protected backup for {}", public_key);
        } else {
            warn!("Created UNENCRYPTED backup for {}", public_key);
        }
        Ok(blob)
    }

    /// Build a backup blob and write it to the backup directory
    pub async fn backup_to_file(&self, password: Option<&str>) -> Result<PathBuf> {
        let blob = self.backup(password).await?;
        Ok(self.store.write_backup(&blob)?)
    }

    /// Restore the parent from a blob and install it
    pub async fn restore(&self, blob: &BackupBlob, password: Option<&str>) -> Result<Wallet> {
        let material = blob.open(password)?;
        let sealed = self.store.seal(&material)?;
        self.store.save_parent(&blob.public_key, &sealed, true)?;

        let wallet = Wallet::parent(blob.public_key.clone(), Some(sealed));
        self.registry.replace_parent(wallet.clone());
        info!("Restored parent wallet {}", wallet.public_key);
        Ok(wallet)
    }

    /// Restore from a backup file
    pub async fn restore_from_file(&self, path: &Path, password: Option<&str>) -> Result<Wallet> {
        let blob = self.store.read_backup(path)?;
        self.restore(&blob, password).await
    }

    /// Backup files, newest first
    pub fn list_backups(&self) -> Result<Vec<PathBuf>> {
        Ok(self.store.list_backups()?)
    }
}
