//! Engine command catalogue
//!
//! Typed wrappers around [`ExecutionBridge::invoke`]. Each wrapper knows the
//! command name, formats its arguments and decodes the response shape.

use crate::{ExecutionBridge, Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sniperfi_params::LAMPORTS_PER_SOL;
use zeroize::Zeroizing;

/// Parent wallet info
pub const INFO: &str = "info";
/// Native balance
pub const BALANCE: &str = "balance";
/// Token holdings
pub const TOKENS: &str = "tokens";
/// Transaction history
pub const HISTORY: &str = "history";
/// Switch RPC endpoint
pub const SET_RPC: &str = "set-rpc";
/// Generate parent keypair
pub const GENERATE: &str = "generate";
/// Child wallet count
pub const COUNT: &str = "count";
/// Child wallet listing
pub const LIST: &str = "list";
/// Generate child keypairs
pub const GENERATE_CHILDREN: &str = "generate-children";
/// Transfer from parent to a child
pub const TRANSFER: &str = "transfer";
/// Buy a token from one wallet
pub const BUY: &str = "buy";

/// Parent wallet info (`info`)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ParentInfo {
    /// Parent public key, absent when no parent exists yet
    #[serde(default)]
    pub public_key: Option<String>,
}

/// Token balance entry (`tokens`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenHolding {
    /// Token symbol
    pub symbol: String,
    /// Balance in token units
    pub balance: f64,
}

/// Transaction history entry (`history`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Transaction type (transfer, swap, ...)
    #[serde(rename = "type")]
    pub kind: String,
    /// Amount in whole coins
    pub amount: f64,
    /// Unix timestamp (seconds)
    #[serde(default)]
    pub timestamp: i64,
    /// Engine-specific details
    #[serde(default)]
    pub details: Option<Value>,
}

/// Freshly generated keypair (`generate`)
pub struct GeneratedKeypair {
    /// Public key (base58)
    pub public_key: String,
    /// Private key (base58), zeroized on drop
    pub private_key: Zeroizing<String>,
}

impl std::fmt::Debug for GeneratedKeypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratedKeypair")
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// Transfer receipt (`transfer`)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TransferReceipt {
    /// Transaction signature
    pub signature: String,
}

/// Buy receipt (`buy`)
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BuyReceipt {
    /// Token balance of the wallet after the trade
    pub token_balance: f64,
    /// Transaction signature, when the engine reports one
    #[serde(default)]
    pub signature: Option<String>,
}

#[derive(Deserialize)]
struct WalletEntry {
    public_key: String,
}

#[derive(Deserialize)]
struct WalletListing {
    #[serde(default)]
    wallets: Vec<WalletEntry>,
}

#[derive(Deserialize)]
struct WalletCount {
    count: u64,
}

fn decode<T: DeserializeOwned>(command: &str, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| {
        Error::Protocol(format!("unexpected response shape for '{}': {}", command, e))
    })
}

fn optional_key(public_key: Option<&str>) -> Vec<String> {
    public_key.map(|key| vec![key.to_string()]).unwrap_or_default()
}

/// Decode a balance document into lamports
///
/// Integers are lamports. A fractional number is read as whole coins, which
/// is what older engines print. `{"lamports": n}` is accepted as well.
pub fn decode_lamports(value: &Value) -> Result<u64> {
    if let Some(lamports) = value.as_u64() {
        return Ok(lamports);
    }
    if let Some(lamports) = value.get("lamports").and_then(Value::as_u64) {
        return Ok(lamports);
    }
    match value.as_f64() {
        Some(coins) if coins.is_finite() && coins >= 0.0 => {
            let lamports = (coins * LAMPORTS_PER_SOL as f64).round();
            if lamports > u64::MAX as f64 {
                return Err(Error::Protocol(format!("balance out of range: {}", coins)));
            }
            Ok(lamports as u64)
        }
        _ => Err(Error::Protocol(format!(
            "unexpected response shape for '{}': {}",
            BALANCE, value
        ))),
    }
}

/// `info → {public_key}`
pub async fn info(bridge: &dyn ExecutionBridge) -> Result<ParentInfo> {
    let value = bridge.invoke(INFO, &[]).await?;
    decode(INFO, value)
}

/// `balance [public_key?] → lamports`
pub async fn balance(bridge: &dyn ExecutionBridge, public_key: Option<&str>) -> Result<u64> {
    let value = bridge.invoke(BALANCE, &optional_key(public_key)).await?;
    decode_lamports(&value)
}

/// `tokens [public_key?] → [{symbol, balance}]`
pub async fn tokens(
    bridge: &dyn ExecutionBridge,
    public_key: Option<&str>,
) -> Result<Vec<TokenHolding>> {
    let value = bridge.invoke(TOKENS, &optional_key(public_key)).await?;
    decode(TOKENS, value)
}

/// `history [public_key?] → [{type, amount, timestamp, details}]`
pub async fn history(
    bridge: &dyn ExecutionBridge,
    public_key: Option<&str>,
) -> Result<Vec<HistoryEntry>> {
    let value = bridge.invoke(HISTORY, &optional_key(public_key)).await?;
    decode(HISTORY, value)
}

/// `set-rpc [endpoint] → {success}`
pub async fn set_rpc(bridge: &dyn ExecutionBridge, endpoint: &str) -> Result<()> {
    bridge.invoke(SET_RPC, &[endpoint.to_string()]).await?;
    bridge.set_rpc_endpoint(endpoint);
    Ok(())
}

/// `generate [password?] → {public_key, private_key}`
pub async fn generate(
    bridge: &dyn ExecutionBridge,
    password: Option<&str>,
) -> Result<GeneratedKeypair> {
    let args = password
        .filter(|p| !p.is_empty())
        .map(|p| vec![p.to_string()])
        .unwrap_or_default();
    let value = bridge.invoke(GENERATE, &args).await?;

    let field = |name: &str| {
        value
            .get(name)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                Error::Protocol(format!("'{}' response is missing '{}'", GENERATE, name))
            })
    };

    Ok(GeneratedKeypair {
        public_key: field("public_key")?,
        private_key: Zeroizing::new(field("private_key")?),
    })
}

/// `count → {count}`
pub async fn count(bridge: &dyn ExecutionBridge) -> Result<u64> {
    let value = bridge.invoke(COUNT, &[]).await?;
    if let Some(count) = value.as_u64() {
        return Ok(count);
    }
    Ok(decode::<WalletCount>(COUNT, value)?.count)
}

/// `list → {wallets: [{public_key}]}`
pub async fn list(bridge: &dyn ExecutionBridge) -> Result<Vec<String>> {
    let value = bridge.invoke(LIST, &[]).await?;
    let listing: WalletListing = decode(LIST, value)?;
    Ok(listing.wallets.into_iter().map(|w| w.public_key).collect())
}

/// `generate-children [count] → {wallets: [{public_key}]}`
pub async fn generate_children(bridge: &dyn ExecutionBridge, count: u32) -> Result<Vec<String>> {
    let value = bridge
        .invoke(GENERATE_CHILDREN, &[count.to_string()])
        .await?;
    let listing: WalletListing = decode(GENERATE_CHILDREN, value)?;
    Ok(listing.wallets.into_iter().map(|w| w.public_key).collect())
}

/// `transfer [from, to, lamports, idempotency_key] → {signature}`
///
/// `from` names the parent the core believes is current; the engine refuses
/// the transfer when it signs for a different parent.
pub async fn transfer(
    bridge: &dyn ExecutionBridge,
    from: &str,
    to: &str,
    lamports: u64,
    idempotency_key: &str,
) -> Result<TransferReceipt> {
    let args = [
        from.to_string(),
        to.to_string(),
        lamports.to_string(),
        idempotency_key.to_string(),
    ];
    let value = bridge.invoke(TRANSFER, &args).await?;
    decode(TRANSFER, value)
}

/// `buy [wallet, mint, lamports, idempotency_key] → {token_balance, signature?}`
pub async fn buy(
    bridge: &dyn ExecutionBridge,
    wallet: &str,
    token_mint: &str,
    lamports: u64,
    idempotency_key: &str,
) -> Result<BuyReceipt> {
    let args = [
        wallet.to_string(),
        token_mint.to_string(),
        lamports.to_string(),
        idempotency_key.to_string(),
    ];
    let value = bridge.invoke(BUY, &args).await?;
    decode(BUY, value)
}
