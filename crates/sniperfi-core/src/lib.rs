//! Fleet orchestration engine
//!
//! Turns one fleet-level intent (distribute funds, buy a token from every
//! wallet, back up or restore the parent key) into a supervised set of
//! concurrent per-wallet engine calls, aggregates their individually
//! fallible outcomes and keeps a cached view of fleet state.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod amount;
pub mod backup;
pub mod batch;
pub mod cache;
pub mod cancel;
pub mod config;
pub mod context;
pub mod dashboard;
pub mod dispatch;
pub mod distribution;
pub mod error;
pub mod guard;
pub mod refresh;
pub mod registry;
pub mod service;
pub mod snipe;
pub mod wallet;

pub use amount::{split_shares, Lamports};
pub use backup::BackupManager;
pub use batch::{
    BatchOutcome, BatchResult, FailureKind, OperationKind, OperationParams, OperationRequest,
    Payload, PerWalletResult, PerWalletTask, TaskAction, WalletOutcome,
};
pub use cache::TtlCache;
pub use cancel::CancelToken;
pub use config::FleetConfig;
pub use context::AppContext;
pub use dashboard::DashboardSnapshot;
pub use dispatch::Dispatcher;
pub use distribution::DistributionEngine;
pub use error::{Error, ErrorCategory, Result};
pub use guard::{FlightGuard, SingleFlight};
pub use refresh::{DashboardRefresher, RefresherHandle};
pub use registry::{CacheKey, CacheValue, FleetRegistry};
pub use service::{FleetService, GeneratedParent};
pub use snipe::SnipeCoordinator;
pub use wallet::{Wallet, WalletRole};
