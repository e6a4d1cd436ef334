//! Fleet operation requests and batch results
//!
//! A fleet-wide request decomposes into one [`PerWalletTask`] per target
//! wallet. Every dispatched task produces exactly one [`PerWalletResult`],
//! and the [`BatchResult`] keeps them in input order.

use crate::Lamports;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Fleet operation kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    /// Parent to children funding
    Distribute,
    /// Token buy from every wallet
    Snipe,
    /// Parent key backup
    Backup,
    /// Parent key restore
    Restore,
    /// Wallet generation
    Generate,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Distribute => write!(f, "distribute"),
            OperationKind::Snipe => write!(f, "snipe"),
            OperationKind::Backup => write!(f, "backup"),
            OperationKind::Restore => write!(f, "restore"),
            OperationKind::Generate => write!(f, "generate"),
        }
    }
}

/// Parameters of a fleet operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OperationParams {
    /// Split `total` across all children
    Distribute {
        /// Total to distribute
        total: Lamports,
    },
    /// Buy `token_mint` with `amount_per_wallet` from every child
    Snipe {
        /// Token mint address
        token_mint: String,
        /// Spend per wallet
        amount_per_wallet: Lamports,
    },
    /// Back up the parent key
    Backup {
        /// Whether a password protects the blob
        encrypted: bool,
    },
    /// Restore the parent key
    Restore,
    /// Generate child wallets
    Generate {
        /// Number of wallets
        count: u32,
    },
}

impl OperationParams {
    /// Kind of operation these parameters describe
    pub fn kind(&self) -> OperationKind {
        match self {
            OperationParams::Distribute { .. } => OperationKind::Distribute,
            OperationParams::Snipe { .. } => OperationKind::Snipe,
            OperationParams::Backup { .. } => OperationKind::Backup,
            OperationParams::Restore => OperationKind::Restore,
            OperationParams::Generate { .. } => OperationKind::Generate,
        }
    }
}

/// Fleet-level request with its idempotency key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationRequest {
    /// Operation kind
    pub kind: OperationKind,
    /// Parameters
    pub params: OperationParams,
    /// Key forwarded to the engine with every fund-moving call
    pub idempotency_key: Uuid,
}

impl OperationRequest {
    /// New request with a fresh idempotency key
    pub fn new(params: OperationParams) -> Self {
        Self {
            kind: params.kind(),
            params,
            idempotency_key: Uuid::new_v4(),
        }
    }
}

/// Engine action performed by one task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskAction {
    /// Parent to wallet transfer
    Transfer {
        /// Sending parent public key
        from: Arc<str>,
    },
    /// Token buy from the wallet
    Buy {
        /// Token mint address
        token_mint: Arc<str>,
    },
}

/// One wallet's share of a fleet request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerWalletTask {
    /// Position in the input wallet order
    pub index: usize,
    /// Wallet public key
    pub wallet: String,
    /// Lamports moved or spent
    pub amount: Lamports,
    /// Engine action
    pub action: TaskAction,
    /// Attempt number, starting at 1
    pub attempt: u32,
}

/// Failure classification for one wallet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    /// Engine did not answer in time
    BridgeTimeout,
    /// Engine output was malformed
    BridgeProtocolError,
    /// Engine reported a failure or crashed
    BridgeProcessError,
    /// Task panicked or was lost
    Internal,
}

impl From<sniperfi_bridge::ErrorKind> for FailureKind {
    fn from(kind: sniperfi_bridge::ErrorKind) -> Self {
        match kind {
            sniperfi_bridge::ErrorKind::BridgeTimeout => FailureKind::BridgeTimeout,
            sniperfi_bridge::ErrorKind::BridgeProtocolError => FailureKind::BridgeProtocolError,
            sniperfi_bridge::ErrorKind::BridgeProcessError => FailureKind::BridgeProcessError,
        }
    }
}

/// What a successful task produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Payload {
    /// Transfer landed
    Transfer {
        /// Lamports transferred
        lamports: Lamports,
    },
    /// Buy landed
    Buy {
        /// Token balance after the trade
        token_balance: f64,
    },
}

/// Outcome of one task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WalletOutcome {
    /// Engine confirmed the operation
    Success {
        /// Result payload
        payload: Payload,
        /// Transaction signature, when reported
        signature: Option<String>,
    },
    /// Operation failed for this wallet only
    Failed {
        /// Failure class
        error_kind: FailureKind,
        /// Engine or runtime message
        message: String,
    },
}

/// Result for one wallet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerWalletResult {
    /// Position in the input wallet order
    pub index: usize,
    /// Wallet public key
    pub wallet: String,
    /// Amount the task tried to move or spend
    pub attempted_lamports: Lamports,
    /// Outcome
    pub outcome: WalletOutcome,
}

impl PerWalletResult {
    /// Whether the task succeeded
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, WalletOutcome::Success { .. })
    }

    /// Failure class, if the task failed
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match &self.outcome {
            WalletOutcome::Failed { error_kind, .. } => Some(*error_kind),
            WalletOutcome::Success { .. } => None,
        }
    }

    pub(crate) fn failed(task: &PerWalletTask, error_kind: FailureKind, message: String) -> Self {
        Self {
            index: task.index,
            wallet: task.wallet.clone(),
            attempted_lamports: task.amount,
            outcome: WalletOutcome::Failed {
                error_kind,
                message,
            },
        }
    }
}

/// Aggregate verdict of a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchOutcome {
    /// Nothing was dispatched
    Empty,
    /// Every wallet succeeded
    AllSucceeded,
    /// Every wallet failed
    AllFailed,
    /// Partial success
    Mixed,
}

/// Ordered outcome of a fleet-wide operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    /// Operation kind
    pub kind: OperationKind,
    /// Idempotency key forwarded to the engine
    pub idempotency_key: Uuid,
    /// Parent that funded the batch, for distributions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// One entry per dispatched wallet, in input order
    pub results: Vec<PerWalletResult>,
    /// Successful wallets
    pub succeeded: usize,
    /// Failed wallets
    pub failed: usize,
    /// Dispatch start
    pub started_at: DateTime<Utc>,
    /// When the last task settled
    pub settled_at: DateTime<Utc>,
}

impl BatchResult {
    /// Assemble from settled results
    pub fn new(
        request: &OperationRequest,
        results: Vec<PerWalletResult>,
        started_at: DateTime<Utc>,
    ) -> Self {
        let succeeded = results.iter().filter(|r| r.is_success()).count();
        let failed = results.len() - succeeded;
        Self {
            kind: request.kind,
            idempotency_key: request.idempotency_key,
            source: None,
            results,
            succeeded,
            failed,
            started_at,
            settled_at: Utc::now(),
        }
    }

    /// Record the parent that funded the batch
    pub fn with_source(mut self, public_key: impl Into<String>) -> Self {
        self.source = Some(public_key.into());
        self
    }

    /// Aggregate verdict
    pub fn outcome(&self) -> BatchOutcome {
        match (self.succeeded, self.failed) {
            (0, 0) => BatchOutcome::Empty,
            (_, 0) => BatchOutcome::AllSucceeded,
            (0, _) => BatchOutcome::AllFailed,
            _ => BatchOutcome::Mixed,
        }
    }

    /// Sum of attempted amounts
    pub fn total_attempted(&self) -> Lamports {
        Lamports(self.results.iter().map(|r| r.attempted_lamports.0).sum())
    }

    /// Failed entries
    pub fn failures(&self) -> impl Iterator<Item = &PerWalletResult> {
        self.results.iter().filter(|r| !r.is_success())
    }

    /// Wallets the batch touched, in input order
    pub fn wallets(&self) -> impl Iterator<Item = &str> {
        self.results.iter().map(|r| r.wallet.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(index: usize, ok: bool) -> PerWalletResult {
        let task = PerWalletTask {
            index,
            wallet: format!("w{}", index),
            amount: Lamports(10),
            action: TaskAction::Transfer { from: Arc::from("parent") },
            attempt: 1,
        };
        if ok {
            PerWalletResult {
                index,
                wallet: task.wallet,
                attempted_lamports: task.amount,
                outcome: WalletOutcome::Success {
                    payload: Payload::Transfer {
                        lamports: Lamports(10),
                    },
                    signature: None,
                },
            }
        } else {
            PerWalletResult::failed(&task, FailureKind::BridgeTimeout, "late".to_string())
        }
    }

    #[test]
    fn test_outcome_classification() {
        let request = OperationRequest::new(OperationParams::Distribute {
            total: Lamports(20),
        });
        let at = Utc::now();

        let batch = BatchResult::new(&request, vec![], at);
        assert_eq!(batch.outcome(), BatchOutcome::Empty);

        let batch = BatchResult::new(&request, vec![result(0, true), result(1, true)], at);
        assert_eq!(batch.outcome(), BatchOutcome::AllSucceeded);

        let batch = BatchResult::new(&request, vec![result(0, false), result(1, false)], at);
        assert_eq!(batch.outcome(), BatchOutcome::AllFailed);

        let batch = BatchResult::new(&request, vec![result(0, true), result(1, false)], at);
        assert_eq!(batch.outcome(), BatchOutcome::Mixed);
        assert_eq!((batch.succeeded, batch.failed), (1, 1));
        assert_eq!(batch.total_attempted(), Lamports(20));
        assert_eq!(batch.kind, OperationKind::Distribute);
        assert_eq!(batch.idempotency_key, request.idempotency_key);
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(result(0, false)).unwrap();
        assert_eq!(json["outcome"]["status"], "failed");
        assert_eq!(json["outcome"]["error_kind"], "BridgeTimeout");
        assert_eq!(json["attempted_lamports"], 10);
    }
}
