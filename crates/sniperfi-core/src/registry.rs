//! Fleet registry
//!
//! Owns the in-memory wallet set and the read-through cache in front of the
//! engine's idempotent reads. Locks are never held across an engine call.

use crate::cache::TtlCache;
use crate::{BatchResult, Error, Lamports, OperationKind, Result, Wallet};
use parking_lot::{Mutex, RwLock};
use sniperfi_bridge::{commands, with_retry, ExecutionBridge, HistoryEntry, RetryPolicy, TokenHolding};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Cached engine reads
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Parent public key reported by `info`
    ParentInfo,
    /// Child wallet count
    WalletCount,
    /// Child wallet listing
    WalletList,
    /// Native balance of one wallet
    Balance(String),
    /// Token holdings of one wallet
    Tokens(String),
    /// Transaction history of one wallet
    History(String),
}

/// Cached values, one variant per [`CacheKey`] family
#[derive(Debug, Clone, PartialEq)]
pub enum CacheValue {
    /// Parent public key, `None` when the engine has no parent
    Parent(Option<String>),
    /// Wallet count
    Count(u64),
    /// Wallet public keys in engine order
    List(Vec<String>),
    /// Balance
    Balance(Lamports),
    /// Token holdings
    Tokens(Vec<TokenHolding>),
    /// History entries
    History(Vec<HistoryEntry>),
}

#[derive(Default)]
struct FleetState {
    parent: Option<Wallet>,
    children: Vec<Wallet>,
    known: HashSet<String>,
}

impl FleetState {
    fn append_child(&mut self, public_key: &str) -> Option<Wallet> {
        if self.known.insert(public_key.to_string()) {
            let wallet = Wallet::child(public_key);
            self.children.push(wallet.clone());
            Some(wallet)
        } else {
            None
        }
    }

    fn wallet_mut(&mut self, public_key: &str) -> Option<&mut Wallet> {
        if let Some(parent) = self.parent.as_mut().filter(|p| p.public_key == public_key) {
            return Some(parent);
        }
        self.children.iter_mut().find(|w| w.public_key == public_key)
    }
}

/// Fleet registry
pub struct FleetRegistry {
    bridge: Arc<dyn ExecutionBridge>,
    retry: RetryPolicy,
    state: RwLock<FleetState>,
    cache: Mutex<TtlCache<CacheKey, CacheValue>>,
}

impl FleetRegistry {
    /// Create an empty registry
    pub fn new(bridge: Arc<dyn ExecutionBridge>, cache_ttl: Duration, retry: RetryPolicy) -> Self {
        Self {
            bridge,
            retry,
            state: RwLock::new(FleetState::default()),
            cache: Mutex::new(TtlCache::new(cache_ttl)),
        }
    }

    /// Engine handle shared with dispatch workers
    pub fn bridge(&self) -> Arc<dyn ExecutionBridge> {
        Arc::clone(&self.bridge)
    }

    fn cached(&self, key: &CacheKey) -> Option<CacheValue> {
        let value = self.cache.lock().get(key);
        if value.is_some() {
            debug!("Cache hit for {:?}", key);
        }
        value
    }

    fn store(&self, key: CacheKey, value: CacheValue) {
        self.cache.lock().insert(key, value);
    }

    fn invalidate(&self, keys: &[CacheKey]) {
        let mut cache = self.cache.lock();
        for key in keys {
            cache.invalidate(key);
        }
    }

    /// Parent wallet
    ///
    /// A locally installed parent wins. Otherwise the engine's `info` answer
    /// is used, cached for the TTL, including a "no parent" answer.
    pub async fn get_parent(&self) -> Result<Option<Wallet>> {
        if let Some(parent) = self.state.read().parent.clone() {
            return Ok(Some(parent));
        }

        let public_key = match self.cached(&CacheKey::ParentInfo) {
            Some(CacheValue::Parent(public_key)) => public_key,
            _ => {
                let bridge = self.bridge.as_ref();
                let info = with_retry(&self.retry, "info", || commands::info(bridge)).await?;
                self.store(CacheKey::ParentInfo, CacheValue::Parent(info.public_key.clone()));
                info.public_key
            }
        };

        let Some(public_key) = public_key.filter(|key| !key.is_empty()) else {
            return Ok(None);
        };

        let mut state = self.state.write();
        let parent = state
            .parent
            .get_or_insert_with(|| Wallet::parent(public_key, None));
        Ok(Some(parent.clone()))
    }

    /// Child wallets in insertion order
    ///
    /// When the listing is stale the engine's `list` is consulted and unseen
    /// keys are appended in engine order.
    pub async fn list_children(&self) -> Result<Vec<Wallet>> {
        if self.cached(&CacheKey::WalletList).is_none() {
            let bridge = self.bridge.as_ref();
            let keys = with_retry(&self.retry, "list", || commands::list(bridge)).await?;

            let added = {
                let mut state = self.state.write();
                let parent_key = state.parent.as_ref().map(|p| p.public_key.clone());
                keys.iter()
                    .filter(|key| parent_key.as_deref() != Some(key.as_str()))
                    .filter_map(|key| state.append_child(key))
                    .count()
            };
            if added > 0 {
                debug!("Fleet sync appended {} wallets", added);
            }
            self.store(CacheKey::WalletList, CacheValue::List(keys));
        }

        Ok(self.state.read().children.clone())
    }

    /// Balance of one wallet, read through the cache
    ///
    /// Only the cache is filled; wallet records keep their last recorded
    /// balance.
    pub async fn balance(&self, public_key: &str) -> Result<Lamports> {
        let key = CacheKey::Balance(public_key.to_string());
        if let Some(CacheValue::Balance(balance)) = self.cached(&key) {
            return Ok(balance);
        }

        let bridge = self.bridge.as_ref();
        let lamports = with_retry(&self.retry, "balance", || {
            commands::balance(bridge, Some(public_key))
        })
        .await?;
        let balance = Lamports(lamports);
        self.store(key, CacheValue::Balance(balance));
        Ok(balance)
    }

    /// Balance of one wallet, read through the cache and recorded on the wallet
    pub async fn refresh_balance(&self, public_key: &str) -> Result<Lamports> {
        let balance = self.balance(public_key).await?;
        if let Some(wallet) = self.state.write().wallet_mut(public_key) {
            wallet.record_balance(balance);
        }
        Ok(balance)
    }

    /// Ask the engine for `count` new child wallets and append them
    pub async fn generate_children(&self, count: u32) -> Result<Vec<Wallet>> {
        if count == 0 {
            return Err(Error::InvalidCount(
                "wallet count must be positive".to_string(),
            ));
        }

        let keys = commands::generate_children(self.bridge.as_ref(), count).await?;
        let created: Vec<Wallet> = {
            let mut state = self.state.write();
            keys.iter().filter_map(|key| state.append_child(key)).collect()
        };
        self.invalidate(&[CacheKey::WalletCount, CacheKey::WalletList]);

        info!(
            "Generated {} child wallets ({} requested)",
            created.len(),
            count
        );
        Ok(created)
    }

    /// Install a new parent, discarding the previous one
    pub fn replace_parent(&self, parent: Wallet) {
        let new_key = parent.public_key.clone();
        let previous = {
            let mut state = self.state.write();
            state.known.remove(&new_key);
            state.children.retain(|w| w.public_key != new_key);
            state.parent.replace(Wallet {
                role: crate::WalletRole::Parent,
                ..parent
            })
        };

        let mut keys = vec![CacheKey::ParentInfo, CacheKey::Balance(new_key.clone())];
        if let Some(previous) = &previous {
            keys.push(CacheKey::Balance(previous.public_key.clone()));
        }
        self.invalidate(&keys);
        info!("Parent wallet set to {}", new_key);
    }

    /// Child wallet count reported by the engine
    pub async fn wallet_count(&self) -> Result<u64> {
        if let Some(CacheValue::Count(count)) = self.cached(&CacheKey::WalletCount) {
            return Ok(count);
        }
        let bridge = self.bridge.as_ref();
        let count = with_retry(&self.retry, "count", || commands::count(bridge)).await?;
        self.store(CacheKey::WalletCount, CacheValue::Count(count));
        Ok(count)
    }

    /// Token holdings of one wallet
    pub async fn token_holdings(&self, public_key: &str) -> Result<Vec<TokenHolding>> {
        let key = CacheKey::Tokens(public_key.to_string());
        if let Some(CacheValue::Tokens(tokens)) = self.cached(&key) {
            return Ok(tokens);
        }
        let bridge = self.bridge.as_ref();
        let tokens = with_retry(&self.retry, "tokens", || {
            commands::tokens(bridge, Some(public_key))
        })
        .await?;
        self.store(key, CacheValue::Tokens(tokens.clone()));
        Ok(tokens)
    }

    /// Transaction history of one wallet, newest first as the engine reports it
    pub async fn transaction_history(&self, public_key: &str) -> Result<Vec<HistoryEntry>> {
        let key = CacheKey::History(public_key.to_string());
        if let Some(CacheValue::History(history)) = self.cached(&key) {
            return Ok(history);
        }
        let bridge = self.bridge.as_ref();
        let history = with_retry(&self.retry, "history", || {
            commands::history(bridge, Some(public_key))
        })
        .await?;
        self.store(key, CacheValue::History(history.clone()));
        Ok(history)
    }

    /// Invalidate everything a settled batch may have changed
    pub fn apply_settlement(&self, batch: &BatchResult) {
        let parent_key = batch
            .source
            .clone()
            .or_else(|| self.state.read().parent.as_ref().map(|p| p.public_key.clone()));

        let mut touched: Vec<&str> = batch.wallets().collect();
        if batch.kind == OperationKind::Distribute {
            if let Some(parent) = parent_key.as_deref() {
                touched.push(parent);
            }
        }

        let mut cache = self.cache.lock();
        for wallet in &touched {
            cache.invalidate(&CacheKey::Balance(wallet.to_string()));
            cache.invalidate(&CacheKey::History(wallet.to_string()));
            if batch.kind == OperationKind::Snipe {
                cache.invalidate(&CacheKey::Tokens(wallet.to_string()));
            }
        }
        debug!(
            "Settlement of {} invalidated {} wallets",
            batch.kind,
            touched.len()
        );
    }

    /// Switch the engine's RPC endpoint and drop every cached chain read
    pub async fn set_rpc_endpoint(&self, endpoint: &str) -> Result<()> {
        sniperfi_params::network::validate_endpoint(endpoint)?;
        commands::set_rpc(self.bridge.as_ref(), endpoint).await?;
        self.cache.lock().clear();
        info!("RPC endpoint switched to {}", endpoint);
        Ok(())
    }

    /// Locally known parent, without consulting the engine
    pub fn current_parent(&self) -> Option<Wallet> {
        self.state.read().parent.clone()
    }

    /// Locally known children, without consulting the engine
    pub fn current_children(&self) -> Vec<Wallet> {
        self.state.read().children.clone()
    }
}
