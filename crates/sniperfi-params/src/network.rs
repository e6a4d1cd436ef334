//! Cluster definitions

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Cluster type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    /// Mainnet beta
    Mainnet,
    /// Devnet (default)
    Devnet,
    /// Testnet
    Testnet,
    /// Local validator
    Localnet,
}

impl std::str::FromStr for NetworkType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mainnet" | "mainnet-beta" => Ok(Self::Mainnet),
            "devnet" => Ok(Self::Devnet),
            "testnet" => Ok(Self::Testnet),
            "localnet" | "localhost" => Ok(Self::Localnet),
            other => Err(Error::InvalidNetwork(other.to_string())),
        }
    }
}

/// Cluster configuration
#[derive(Debug, Clone)]
pub struct Network {
    /// Cluster type
    pub network_type: NetworkType,
    /// Human-readable name
    pub name: &'static str,
    /// Public JSON-RPC endpoint
    pub rpc_url: &'static str,
}

impl Network {
    /// Get mainnet parameters
    pub const fn mainnet() -> Self {
        Self {
            network_type: NetworkType::Mainnet,
            name: "mainnet-beta",
            rpc_url: "https://api.mainnet-beta.solana.com",
        }
    }

    /// Get devnet parameters
    pub const fn devnet() -> Self {
        Self {
            network_type: NetworkType::Devnet,
            name: "devnet",
            rpc_url: "https://api.devnet.solana.com",
        }
    }

    /// Get testnet parameters
    pub const fn testnet() -> Self {
        Self {
            network_type: NetworkType::Testnet,
            name: "testnet",
            rpc_url: "https://api.testnet.solana.com",
        }
    }

    /// Get local validator parameters
    pub const fn localnet() -> Self {
        Self {
            network_type: NetworkType::Localnet,
            name: "localnet",
            rpc_url: "http://127.0.0.1:8899",
        }
    }

    /// Get network by type
    pub const fn from_type(network_type: NetworkType) -> Self {
        match network_type {
            NetworkType::Mainnet => Self::mainnet(),
            NetworkType::Devnet => Self::devnet(),
            NetworkType::Testnet => Self::testnet(),
            NetworkType::Localnet => Self::localnet(),
        }
    }

    /// Default cluster used when nothing is configured
    pub const fn default_cluster() -> Self {
        Self::devnet()
    }
}

/// Check that an RPC endpoint looks like an http(s) URL
pub fn validate_endpoint(endpoint: &str) -> Result<()> {
    let trimmed = endpoint.trim();
    let rest = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .ok_or_else(|| Error::InvalidEndpoint(endpoint.to_string()))?;

    if rest.is_empty() || rest.starts_with('/') || rest.contains(char::is_whitespace) {
        return Err(Error::InvalidEndpoint(endpoint.to_string()));
    }
    Ok(())
}
