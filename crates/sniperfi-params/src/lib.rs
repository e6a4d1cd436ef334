//! SNIPERFI network parameters and constants
//!
//! This crate provides cluster presets (RPC endpoints), native unit
//! constants and the default values shared by the engine and the CLI.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod defaults;
pub mod network;

pub use network::{Network, NetworkType};

/// Lamports in one whole native coin
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Fractional digits of the native coin
pub const LAMPORT_DECIMALS: u32 = 9;

/// Error types for parameter operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid network specified
    #[error("Invalid network: {0}")]
    InvalidNetwork(String),

    /// Invalid RPC endpoint
    #[error("Invalid RPC endpoint: {0}")]
    InvalidEndpoint(String),
}

/// Result type for parameter operations
pub type Result<T> = std::result::Result<T, Error>;
