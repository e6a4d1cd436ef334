//! Fleet configuration
//!
//! Loaded from an optional JSON file, then overridden field by field from
//! `SNIPERFI_*` environment variables, then validated.

use crate::{Error, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use sniperfi_bridge::{BridgeConfig, EngineBinary, RetryPolicy};
use sniperfi_params::defaults;
use sniperfi_params::Network;
use sniperfi_vault::{BackupOptions, EncryptionAlgorithm};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// RPC endpoint override
pub const ENV_RPC_URL: &str = "SNIPERFI_RPC_URL";
/// Network preset override (mainnet, devnet, testnet, localnet)
pub const ENV_NETWORK: &str = "SNIPERFI_NETWORK";
/// Wallet directory override
pub const ENV_WALLET_DIR: &str = "SNIPERFI_WALLET_DIR";
/// Backup directory override
pub const ENV_BACKUP_DIR: &str = "SNIPERFI_BACKUP_DIR";
/// Request timeout override (milliseconds)
pub const ENV_TIMEOUT_MS: &str = "SNIPERFI_TIMEOUT_MS";
/// Cache TTL override (milliseconds)
pub const ENV_CACHE_TTL_MS: &str = "SNIPERFI_CACHE_TTL_MS";
/// Worker cap override
pub const ENV_WORKERS: &str = "SNIPERFI_WORKERS";
/// KDF iteration override
pub const ENV_KDF_ITERATIONS: &str = "SNIPERFI_KDF_ITERATIONS";
/// Salt size override (bytes)
pub const ENV_SALT_SIZE: &str = "SNIPERFI_SALT_SIZE";
/// Read retry override
pub const ENV_MAX_RETRIES: &str = "SNIPERFI_MAX_RETRIES";
/// Engine program override
pub const ENV_ENGINE: &str = "SNIPERFI_ENGINE";
/// Dashboard refresh override (milliseconds)
pub const ENV_REFRESH_INTERVAL_MS: &str = "SNIPERFI_REFRESH_INTERVAL_MS";

/// Fleet configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetConfig {
    /// Chain RPC endpoint handed to the engine
    pub rpc_endpoint: String,
    /// Per-call engine deadline (milliseconds)
    pub request_timeout_ms: u64,
    /// Wallet directory
    pub wallet_dir: PathBuf,
    /// Backup directory
    pub backup_dir: PathBuf,
    /// Read-through cache TTL (milliseconds)
    pub cache_ttl_ms: u64,
    /// PBKDF2 iterations for password backups
    pub kdf_iterations: u32,
    /// Salt size for password backups (bytes)
    pub salt_size: usize,
    /// AEAD for password backups
    pub backup_cipher: EncryptionAlgorithm,
    /// Concurrent engine processes per batch
    pub worker_concurrency: usize,
    /// Retries after the first attempt for idempotent reads
    pub max_read_retries: u32,
    /// Engine program
    pub engine: EngineBinary,
    /// Dashboard refresh period (milliseconds)
    pub refresh_interval_ms: u64,
    /// History entries on the dashboard
    pub dashboard_history_len: usize,
}

fn default_wallet_dir() -> PathBuf {
    ProjectDirs::from("com", "Sniperfi", "Sniperfi")
        .map(|dirs| dirs.data_local_dir().join(defaults::WALLET_DIR))
        .unwrap_or_else(|| PathBuf::from(defaults::WALLET_DIR))
}

impl Default for FleetConfig {
    fn default() -> Self {
        let wallet_dir = default_wallet_dir();
        Self {
            rpc_endpoint: Network::default_cluster().rpc_url.to_string(),
            request_timeout_ms: defaults::REQUEST_TIMEOUT_MS,
            backup_dir: wallet_dir.join(defaults::BACKUP_DIR),
            wallet_dir,
            cache_ttl_ms: defaults::CACHE_TTL_MS,
            kdf_iterations: defaults::KDF_ITERATIONS,
            salt_size: defaults::SALT_SIZE,
            backup_cipher: EncryptionAlgorithm::AesGcm,
            worker_concurrency: defaults::WORKER_CONCURRENCY,
            max_read_retries: defaults::MAX_READ_RETRIES,
            engine: EngineBinary::default(),
            refresh_interval_ms: defaults::REFRESH_INTERVAL_MS,
            dashboard_history_len: defaults::DASHBOARD_HISTORY_LEN,
        }
    }
}

fn parse_env<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{} has an invalid value '{}'", name, value)))
}

impl FleetConfig {
    /// Read a JSON config file; missing fields take their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        serde_json::from_str(&json)
            .map_err(|e| Error::Config(format!("cannot parse {}: {}", path.display(), e)))
    }

    /// File (when given) plus process environment, validated
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `SNIPERFI_*` overrides from `lookup`
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(network) = get(ENV_NETWORK) {
            let network_type = network
                .parse::<sniperfi_params::NetworkType>()
                .map_err(|e| Error::Config(e.to_string()))?;
            self.rpc_endpoint = Network::from_type(network_type).rpc_url.to_string();
        }
        if let Some(url) = get(ENV_RPC_URL) {
            self.rpc_endpoint = url.trim().to_string();
        }
        if let Some(dir) = get(ENV_WALLET_DIR) {
            let wallet_dir = PathBuf::from(dir);
            if get(ENV_BACKUP_DIR).is_none() {
                self.backup_dir = wallet_dir.join(defaults::BACKUP_DIR);
            }
            self.wallet_dir = wallet_dir;
        }
        if let Some(dir) = get(ENV_BACKUP_DIR) {
            self.backup_dir = PathBuf::from(dir);
        }
        if let Some(value) = get(ENV_TIMEOUT_MS) {
            self.request_timeout_ms = parse_env(ENV_TIMEOUT_MS, &value)?;
        }
        if let Some(value) = get(ENV_CACHE_TTL_MS) {
            self.cache_ttl_ms = parse_env(ENV_CACHE_TTL_MS, &value)?;
        }
        if let Some(value) = get(ENV_WORKERS) {
            self.worker_concurrency = parse_env(ENV_WORKERS, &value)?;
        }
        if let Some(value) = get(ENV_KDF_ITERATIONS) {
            self.kdf_iterations = parse_env(ENV_KDF_ITERATIONS, &value)?;
        }
        if let Some(value) = get(ENV_SALT_SIZE) {
            self.salt_size = parse_env(ENV_SALT_SIZE, &value)?;
        }
        if let Some(value) = get(ENV_MAX_RETRIES) {
            self.max_read_retries = parse_env(ENV_MAX_RETRIES, &value)?;
        }
        if let Some(program) = get(ENV_ENGINE) {
            self.engine = EngineBinary::new(program.trim());
        }
        if let Some(value) = get(ENV_REFRESH_INTERVAL_MS) {
            self.refresh_interval_ms = parse_env(ENV_REFRESH_INTERVAL_MS, &value)?;
        }
        Ok(())
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.worker_concurrency == 0 {
            return Err(Error::Config("worker concurrency must be at least 1".to_string()));
        }
        if self.request_timeout_ms == 0 {
            return Err(Error::Config("request timeout must be positive".to_string()));
        }
        if self.kdf_iterations == 0 {
            return Err(Error::Config("KDF iterations must be positive".to_string()));
        }
        if self.kdf_iterations > defaults::MAX_KDF_ITERATIONS {
            return Err(Error::Config(format!(
                "KDF iterations must not exceed {}",
                defaults::MAX_KDF_ITERATIONS
            )));
        }
        if self.salt_size < defaults::MIN_SALT_SIZE {
            return Err(Error::Config(format!(
                "salt size must be at least {} bytes",
                defaults::MIN_SALT_SIZE
            )));
        }
        if self.refresh_interval_ms == 0 {
            return Err(Error::Config("refresh interval must be positive".to_string()));
        }
        sniperfi_params::network::validate_endpoint(&self.rpc_endpoint)
            .map_err(|e| Error::Config(e.to_string()))?;
        Ok(())
    }

    /// Engine bridge settings
    pub fn bridge_config(&self) -> BridgeConfig {
        BridgeConfig {
            binary: self.engine.clone(),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            rpc_endpoint: self.rpc_endpoint.clone(),
            wallet_dir: self.wallet_dir.clone(),
        }
    }

    /// Password backup settings
    pub fn backup_options(&self) -> BackupOptions {
        BackupOptions {
            iterations: self.kdf_iterations,
            salt_size: self.salt_size,
            cipher: self.backup_cipher,
        }
    }

    /// Retry policy for idempotent reads
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default().with_max_retries(self.max_read_retries)
    }

    /// Cache TTL
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }

    /// Dashboard refresh period
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }
}
