//! Execution engine bridge
//!
//! Typed request/response channel to the out-of-process execution engine
//! that holds signing capability and talks to the chain RPC endpoint.
//! Every call spawns one engine process, passes the command and its
//! arguments, and reads exactly one JSON document from stdout.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod binary;
pub mod client;
pub mod commands;
pub mod config;
pub mod envelope;
pub mod error;
pub mod mock;
pub mod retry;

pub use binary::EngineBinary;
pub use client::{ExecutionBridge, ProcessBridge};
pub use commands::{
    BuyReceipt, GeneratedKeypair, HistoryEntry, ParentInfo, TokenHolding, TransferReceipt,
};
pub use config::{BridgeConfig, RPC_URL_ENV, WALLET_DIR_ENV};
pub use error::{Error, ErrorKind, Result};
pub use mock::{MockBridge, MockCall};
pub use retry::{with_retry, RetryPolicy};
