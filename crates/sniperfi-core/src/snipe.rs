//! Snipe coordinator
//!
//! Buys one token from every child wallet concurrently. Failed buys are
//! reported, never retried.

use crate::{
    BatchResult, Dispatcher, Error, FleetRegistry, Lamports, OperationParams, OperationRequest,
    PerWalletTask, Result, SingleFlight, TaskAction,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

/// Snipe coordinator
pub struct SnipeCoordinator {
    registry: Arc<FleetRegistry>,
    dispatcher: Dispatcher,
    flights: Arc<SingleFlight>,
}

fn validate_mint(token_mint: &str) -> Result<()> {
    if token_mint.is_empty() {
        return Err(Error::InvalidParams("token mint is empty".to_string()));
    }
    if token_mint.chars().any(char::is_whitespace) {
        return Err(Error::InvalidParams(format!(
            "token mint '{}' contains whitespace",
            token_mint
        )));
    }
    Ok(())
}

impl SnipeCoordinator {
    /// Create new snipe coordinator
    pub fn new(registry: Arc<FleetRegistry>, dispatcher: Dispatcher, flights: Arc<SingleFlight>) -> Self {
        Self {
            registry,
            dispatcher,
            flights,
        }
    }

    /// Snipe with a decimal per-wallet amount such as `"0.25"`
    pub async fn snipe_decimal(&self, token_mint: &str, amount_per_wallet: &str) -> Result<BatchResult> {
        validate_mint(token_mint)?;
        self.snipe(token_mint, Lamports::parse_decimal(amount_per_wallet)?)
            .await
    }

    /// Buy `token_mint` with `amount_per_wallet` from every child wallet
    pub async fn snipe(&self, token_mint: &str, amount_per_wallet: Lamports) -> Result<BatchResult> {
        validate_mint(token_mint)?;
        if amount_per_wallet.is_zero() {
            return Err(Error::InvalidParams(
                "amount per wallet must be positive".to_string(),
            ));
        }

        let request = OperationRequest::new(OperationParams::Snipe {
            token_mint: token_mint.to_string(),
            amount_per_wallet,
        });
        let _flight = self.flights.try_acquire(request.kind)?;

        let children = self.registry.list_children().await?;
        if children.is_empty() {
            return Err(Error::NoWallets);
        }

        let mint: Arc<str> = Arc::from(token_mint);
        let tasks: Vec<PerWalletTask> = children
            .into_iter()
            .enumerate()
            .map(|(index, wallet)| PerWalletTask {
                index,
                wallet: wallet.public_key,
                amount: amount_per_wallet,
                action: TaskAction::Buy {
                    token_mint: Arc::clone(&mint),
                },
                attempt: 1,
            })
            .collect();

        info!(
            "Sniping {} with {} lamports from {} wallets (key {})",
            token_mint,
            amount_per_wallet.get(),
            tasks.len(),
            request.idempotency_key
        );

        let started_at = Utc::now();
        let results = self
            .dispatcher
            .run(self.registry.bridge(), tasks, request.idempotency_key)
            .await;
        let batch = BatchResult::new(&request, results, started_at);

        self.registry.apply_settlement(&batch);
        info!(
            "Snipe {} settled: {} succeeded, {} failed",
            request.idempotency_key, batch.succeeded, batch.failed
        );
        Ok(batch)
    }
}
