//! Fleet wallets

use crate::Lamports;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Wallet role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletRole {
    /// Funding wallet, exactly one per fleet
    Parent,
    /// Derived wallet
    Child,
}

/// Wallet known to the registry
///
/// The balance is a best-effort snapshot, never authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    /// Public key (base58)
    pub public_key: String,
    /// Key material sealed with the local store key
    #[serde(skip)]
    pub encrypted_private_key: Option<Vec<u8>>,
    /// Role
    pub role: WalletRole,
    /// Last known balance
    pub balance_lamports: Lamports,
    /// When the balance was last read from the engine
    pub last_refreshed: Option<DateTime<Utc>>,
}

impl Wallet {
    /// Parent wallet, optionally with sealed key material
    pub fn parent(public_key: impl Into<String>, encrypted_private_key: Option<Vec<u8>>) -> Self {
        Self {
            public_key: public_key.into(),
            encrypted_private_key,
            role: WalletRole::Parent,
            balance_lamports: Lamports::ZERO,
            last_refreshed: None,
        }
    }

    /// Child wallet
    pub fn child(public_key: impl Into<String>) -> Self {
        Self {
            public_key: public_key.into(),
            encrypted_private_key: None,
            role: WalletRole::Child,
            balance_lamports: Lamports::ZERO,
            last_refreshed: None,
        }
    }

    /// Whether this is the parent wallet
    pub fn is_parent(&self) -> bool {
        self.role == WalletRole::Parent
    }

    pub(crate) fn record_balance(&mut self, balance: Lamports) {
        self.balance_lamports = balance;
        self.last_refreshed = Some(Utc::now());
    }
}
