#![allow(dead_code)]

use serde_json::json;
use sniperfi_bridge::{commands, MockBridge};
use sniperfi_core::{AppContext, FleetConfig};
use std::sync::Arc;

pub const PARENT: &str = "ParentPk";

pub fn config(dir: &tempfile::TempDir) -> FleetConfig {
    let wallet_dir = dir.path().join("wallets");
    FleetConfig {
        backup_dir: wallet_dir.join("backups"),
        wallet_dir,
        kdf_iterations: 1_000,
        max_read_retries: 0,
        ..FleetConfig::default()
    }
}

pub fn context(dir: &tempfile::TempDir, bridge: &Arc<MockBridge>) -> AppContext {
    AppContext::with_bridge(config(dir), bridge.clone()).unwrap()
}

/// Engine with a parent and the given children
pub fn fleet_bridge(children: &[&str]) -> Arc<MockBridge> {
    let bridge = Arc::new(MockBridge::new());
    let wallets: Vec<_> = children
        .iter()
        .map(|key| json!({"public_key": key}))
        .collect();
    bridge
        .on(commands::INFO, Ok(json!({"public_key": PARENT})))
        .on(commands::LIST, Ok(json!({"success": true, "wallets": wallets})));
    bridge
}

/// 64-byte keypair whose trailing half encodes to the returned public key
pub fn keypair(seed: u8) -> (String, String) {
    let mut bytes = vec![seed; 32];
    bytes.extend((0u8..32).map(|i| i.wrapping_add(seed)));
    let public_key = bs58::encode(&bytes[32..]).into_string();
    let private_key = bs58::encode(&bytes).into_string();
    (public_key, private_key)
}
