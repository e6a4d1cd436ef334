//! Distribution engine
//!
//! Splits a total exactly across every child wallet and transfers each
//! share from the parent. Failures are per wallet; there is no automatic
//! retry of fund-moving calls.

use crate::{
    split_shares, BatchResult, Dispatcher, Error, FleetRegistry, Lamports, OperationParams,
    OperationRequest, PerWalletTask, Result, SingleFlight, TaskAction,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

/// Distribution engine
pub struct DistributionEngine {
    registry: Arc<FleetRegistry>,
    dispatcher: Dispatcher,
    flights: Arc<SingleFlight>,
}

impl DistributionEngine {
    /// Create new distribution engine
    pub fn new(registry: Arc<FleetRegistry>, dispatcher: Dispatcher, flights: Arc<SingleFlight>) -> Self {
        Self {
            registry,
            dispatcher,
            flights,
        }
    }

    /// Distribute a decimal coin amount such as `"1.5"`
    pub async fn distribute_decimal(&self, total: &str) -> Result<BatchResult> {
        self.distribute(Lamports::parse_decimal(total)?).await
    }

    /// Distribute `total` lamports across all child wallets
    ///
    /// Every child receives at least one lamport: a total smaller than the
    /// number of children fails with [`Error::InvalidParams`] before anything
    /// is dispatched, as does a zero total. Transfers name the current parent
    /// as sender so the engine can refuse a batch signed for another parent.
    pub async fn distribute(&self, total: Lamports) -> Result<BatchResult> {
        if total.is_zero() {
            return Err(Error::InvalidParams(
                "distribution total must be positive".to_string(),
            ));
        }

        let request = OperationRequest::new(OperationParams::Distribute { total });
        let _flight = self.flights.try_acquire(request.kind)?;

        let children = self.registry.list_children().await?;
        if children.is_empty() {
            return Err(Error::NoWallets);
        }
        let parent = self.registry.get_parent().await?.ok_or(Error::NoParent)?;
        if total.get() < children.len() as u64 {
            return Err(Error::InvalidParams(format!(
                "{} lamports cannot fund {} wallets",
                total.get(),
                children.len()
            )));
        }

        let shares = split_shares(total, children.len())?;
        let from: Arc<str> = Arc::from(parent.public_key.as_str());
        let tasks: Vec<PerWalletTask> = children
            .into_iter()
            .zip(shares)
            .enumerate()
            .map(|(index, (wallet, amount))| PerWalletTask {
                index,
                wallet: wallet.public_key,
                amount,
                action: TaskAction::Transfer {
                    from: Arc::clone(&from),
                },
                attempt: 1,
            })
            .collect();

        info!(
            "Distributing {} lamports to {} wallets (key {})",
            total.get(),
            tasks.len(),
            request.idempotency_key
        );

        let started_at = Utc::now();
        let results = self
            .dispatcher
            .run(self.registry.bridge(), tasks, request.idempotency_key)
            .await;
        let batch = BatchResult::new(&request, results, started_at).with_source(parent.public_key);

        self.registry.apply_settlement(&batch);
        info!(
            "Distribution {} settled: {} succeeded, {} failed",
            request.idempotency_key, batch.succeeded, batch.failed
        );
        Ok(batch)
    }
}
