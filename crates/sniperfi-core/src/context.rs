//! Application context
//!
//! Built once at startup and passed explicitly to whoever needs it.

use crate::{
    dashboard, BackupManager, CancelToken, DashboardRefresher, DashboardSnapshot, Dispatcher,
    DistributionEngine, FleetConfig, FleetRegistry, FleetService, RefresherHandle, Result,
    SingleFlight, SnipeCoordinator, Wallet,
};
use sniperfi_bridge::{ExecutionBridge, ProcessBridge};
use sniperfi_vault::SecretStore;
use std::sync::Arc;
use tracing::info;

/// Everything a front end needs to drive the fleet
pub struct AppContext {
    config: FleetConfig,
    registry: Arc<FleetRegistry>,
    store: Arc<SecretStore>,
    distribution: DistributionEngine,
    snipe: SnipeCoordinator,
    backup: BackupManager,
    service: FleetService,
}

impl AppContext {
    /// Context driving the configured engine program
    pub fn new(config: FleetConfig) -> Result<Self> {
        let bridge = Arc::new(ProcessBridge::new(config.bridge_config()));
        Self::with_bridge(config, bridge)
    }

    /// Context over an arbitrary bridge
    pub fn with_bridge(config: FleetConfig, bridge: Arc<dyn ExecutionBridge>) -> Result<Self> {
        config.validate()?;

        let store = Arc::new(SecretStore::open(&config.wallet_dir, &config.backup_dir)?);
        let registry = Arc::new(FleetRegistry::new(
            bridge,
            config.cache_ttl(),
            config.retry_policy(),
        ));

        if let Some(record) = store.load_parent()? {
            let sealed = record.sealed_bytes()?;
            registry.replace_parent(Wallet::parent(record.public_key, Some(sealed)));
        }

        let flights = Arc::new(SingleFlight::new());
        let dispatcher = Dispatcher::new(config.worker_concurrency);

        info!(
            "Fleet context ready (rpc {}, {} workers, wallets in {:?})",
            config.rpc_endpoint, config.worker_concurrency, config.wallet_dir
        );

        Ok(Self {
            distribution: DistributionEngine::new(
                Arc::clone(&registry),
                dispatcher,
                Arc::clone(&flights),
            ),
            snipe: SnipeCoordinator::new(Arc::clone(&registry), dispatcher, flights),
            backup: BackupManager::new(
                Arc::clone(&registry),
                Arc::clone(&store),
                config.backup_options(),
            ),
            service: FleetService::new(Arc::clone(&registry), Arc::clone(&store)),
            config,
            registry,
            store,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &FleetConfig {
        &self.config
    }

    /// Fleet registry
    pub fn registry(&self) -> &Arc<FleetRegistry> {
        &self.registry
    }

    /// Secret store
    pub fn store(&self) -> &Arc<SecretStore> {
        &self.store
    }

    /// Distribution engine
    pub fn distribution(&self) -> &DistributionEngine {
        &self.distribution
    }

    /// Snipe coordinator
    pub fn snipe(&self) -> &SnipeCoordinator {
        &self.snipe
    }

    /// Backup/restore manager
    pub fn backup(&self) -> &BackupManager {
        &self.backup
    }

    /// Wallet lifecycle service
    pub fn service(&self) -> &FleetService {
        &self.service
    }

    /// One dashboard snapshot
    pub async fn dashboard(&self) -> DashboardSnapshot {
        dashboard::snapshot(&self.registry, self.config.dashboard_history_len).await
    }

    /// Start the periodic dashboard refresh
    pub fn spawn_refresher(&self, cancel: CancelToken) -> RefresherHandle {
        DashboardRefresher::spawn(
            Arc::clone(&self.registry),
            self.config.refresh_interval(),
            self.config.dashboard_history_len,
            cancel,
        )
    }
}
