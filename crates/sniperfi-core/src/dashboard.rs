//! Dashboard snapshot
//!
//! Every field goes through the registry's cached reads. A failing field is
//! recorded in `errors` and left empty; the snapshot itself never fails.
//! Snapshots fill the read cache but leave wallet records alone, so the
//! refresh task never races a settling batch over wallet state.

use crate::{FleetRegistry, Lamports};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sniperfi_bridge::{HistoryEntry, TokenHolding};
use tracing::warn;

/// Point-in-time view of the fleet
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    /// Parent public key
    pub parent_public_key: Option<String>,
    /// Parent balance
    pub parent_balance: Option<Lamports>,
    /// Child wallet count
    pub wallet_count: Option<u64>,
    /// Most recent parent transactions
    pub recent_transactions: Vec<HistoryEntry>,
    /// Parent token holdings
    pub token_holdings: Vec<TokenHolding>,
    /// Fields that could not be read (non-fatal)
    pub errors: Vec<String>,
    /// When the snapshot was taken
    pub taken_at: DateTime<Utc>,
}

/// Take a snapshot, keeping at most `history_len` transactions
pub async fn snapshot(registry: &FleetRegistry, history_len: usize) -> DashboardSnapshot {
    let mut errors = Vec::new();
    let mut record = |field: &str, error: crate::Error| {
        warn!("Dashboard {} unavailable: {}", field, error);
        errors.push(format!("{}: {}", field, error));
    };

    let parent = match registry.get_parent().await {
        Ok(parent) => parent,
        Err(e) => {
            record("parent", e);
            None
        }
    };

    let mut parent_balance = None;
    let mut recent_transactions = Vec::new();
    let mut token_holdings = Vec::new();

    if let Some(parent) = &parent {
        match registry.balance(&parent.public_key).await {
            Ok(balance) => parent_balance = Some(balance),
            Err(e) => record("balance", e),
        }
        match registry.transaction_history(&parent.public_key).await {
            Ok(mut history) => {
                history.truncate(history_len);
                recent_transactions = history;
            }
            Err(e) => record("history", e),
        }
        match registry.token_holdings(&parent.public_key).await {
            Ok(tokens) => token_holdings = tokens,
            Err(e) => record("tokens", e),
        }
    }

    let wallet_count = match registry.wallet_count().await {
        Ok(count) => Some(count),
        Err(e) => {
            record("wallet_count", e);
            None
        }
    };

    DashboardSnapshot {
        parent_public_key: parent.map(|p| p.public_key),
        parent_balance,
        wallet_count,
        recent_transactions,
        token_holdings,
        errors,
        taken_at: Utc::now(),
    }
}
