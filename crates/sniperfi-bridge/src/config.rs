//! Bridge configuration

use crate::binary::EngineBinary;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable carrying the RPC endpoint to the engine
pub const RPC_URL_ENV: &str = "SNIPERFI_RPC_URL";

/// Environment variable carrying the wallet directory to the engine
pub const WALLET_DIR_ENV: &str = "SNIPERFI_WALLET_DIR";

/// Bridge configuration
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Engine program
    pub binary: EngineBinary,
    /// Per-call deadline
    pub request_timeout: Duration,
    /// RPC endpoint handed to the engine
    pub rpc_endpoint: String,
    /// Wallet directory handed to the engine
    pub wallet_dir: PathBuf,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            binary: EngineBinary::default(),
            request_timeout: Duration::from_millis(sniperfi_params::defaults::REQUEST_TIMEOUT_MS),
            rpc_endpoint: sniperfi_params::Network::default_cluster().rpc_url.to_string(),
            wallet_dir: PathBuf::from(sniperfi_params::defaults::WALLET_DIR),
        }
    }
}
