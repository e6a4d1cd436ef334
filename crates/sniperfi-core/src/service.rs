//! Parent wallet generation

use crate::{Error, FleetRegistry, Result, Wallet};
use sniperfi_bridge::commands;
use sniperfi_vault::SecretStore;
use std::sync::Arc;
use tracing::info;
use zeroize::Zeroizing;

/// Newly generated parent
pub struct GeneratedParent {
    /// Installed parent wallet
    pub wallet: Wallet,
    /// Private key (base58), shown to the user once
    pub private_key: Zeroizing<String>,
}

/// Fleet-level wallet lifecycle
pub struct FleetService {
    registry: Arc<FleetRegistry>,
    store: Arc<SecretStore>,
}

impl FleetService {
    /// Create new fleet service
    pub fn new(registry: Arc<FleetRegistry>, store: Arc<SecretStore>) -> Self {
        Self { registry, store }
    }

    /// Generate a parent keypair in the engine, seal it locally and install it
    pub async fn generate_parent(&self, password: Option<&str>) -> Result<GeneratedParent> {
        let keypair = commands::generate(self.registry.bridge().as_ref(), password).await?;

        let material = Zeroizing::new(
            bs58::decode(keypair.private_key.as_str())
                .into_vec()
                .map_err(|e| {
                    sniperfi_bridge::Error::Protocol(format!("private key is not base58: {}", e))
                })?,
        );
        if material.len() == 64 {
            let embedded = bs58::encode(&material[32..]).into_string();
            if embedded != keypair.public_key {
                return Err(Error::Bridge(sniperfi_bridge::Error::Protocol(
                    "generated keypair does not match its public key".to_string(),
                )));
            }
        }

        let sealed = self.store.seal(&material)?;
        self.store.save_parent(&keypair.public_key, &sealed, false)?;

        let wallet = Wallet::parent(keypair.public_key.clone(), Some(sealed));
        self.registry.replace_parent(wallet.clone());
        info!("Generated parent wallet {}", wallet.public_key);

        Ok(GeneratedParent {
            wallet,
            private_key: keypair.private_key,
        })
    }

    /// Generate `count` child wallets
    pub async fn generate_children(&self, count: u32) -> Result<Vec<Wallet>> {
        self.registry.generate_children(count).await
    }
}
