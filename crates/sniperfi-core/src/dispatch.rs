//! Bounded fan-out of per-wallet tasks
//!
//! Tasks run on the tokio runtime behind a semaphore. A failing or
//! panicking task never affects its siblings, and results come back in
//! input order whatever the completion order was.

use crate::{
    FailureKind, Payload, PerWalletResult, PerWalletTask, TaskAction, WalletOutcome,
};
use sniperfi_bridge::{commands, ExecutionBridge};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinError;
use tracing::{debug, warn};
use uuid::Uuid;

/// Per-batch worker pool
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher {
    concurrency: usize,
}

impl Dispatcher {
    /// Pool running at most `concurrency` engine calls at once
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
        }
    }

    /// Worker cap
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Run every task to completion
    pub async fn run(
        &self,
        bridge: Arc<dyn ExecutionBridge>,
        tasks: Vec<PerWalletTask>,
        idempotency_key: Uuid,
    ) -> Vec<PerWalletResult> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let key: Arc<str> = Arc::from(idempotency_key.to_string());

        let mut handles = Vec::with_capacity(tasks.len());
        for task in tasks {
            let sem = Arc::clone(&semaphore);
            let bridge = Arc::clone(&bridge);
            let key = Arc::clone(&key);
            let spawned = task.clone();

            let handle = tokio::spawn(async move {
                let _permit = match sem.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => {
                        return PerWalletResult::failed(&spawned, FailureKind::Internal, e.to_string())
                    }
                };
                execute(bridge.as_ref(), &spawned, &key).await
            });
            handles.push((task, handle));
        }

        let mut slots: Vec<Option<PerWalletResult>> = vec![None; handles.len()];
        for (position, (task, handle)) in handles.into_iter().enumerate() {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => lost_task(&task, e),
            };
            let index = if result.index < slots.len() { result.index } else { position };
            slots[index] = Some(result);
        }

        slots.into_iter().flatten().collect()
    }
}

async fn execute(bridge: &dyn ExecutionBridge, task: &PerWalletTask, key: &str) -> PerWalletResult {
    debug!(
        "Task {} ({:?}) for {} with {} lamports",
        task.index,
        task.action,
        task.wallet,
        task.amount.get()
    );

    let outcome = match &task.action {
        TaskAction::Transfer { from } => {
            commands::transfer(bridge, from, &task.wallet, task.amount.get(), key)
                .await
                .map(|receipt| WalletOutcome::Success {
                    payload: Payload::Transfer {
                        lamports: task.amount,
                    },
                    signature: Some(receipt.signature),
                })
        }
        TaskAction::Buy { token_mint } => {
            commands::buy(bridge, &task.wallet, token_mint, task.amount.get(), key)
                .await
                .map(|receipt| WalletOutcome::Success {
                    payload: Payload::Buy {
                        token_balance: receipt.token_balance,
                    },
                    signature: receipt.signature,
                })
        }
    };

    match outcome {
        Ok(outcome) => PerWalletResult {
            index: task.index,
            wallet: task.wallet.clone(),
            attempted_lamports: task.amount,
            outcome,
        },
        Err(e) => {
            warn!("Wallet {} failed: {}", task.wallet, e);
            PerWalletResult::failed(task, e.kind().into(), e.to_string())
        }
    }
}

fn lost_task(task: &PerWalletTask, error: JoinError) -> PerWalletResult {
    let message = if error.is_panic() {
        let panic = error.into_panic();
        let detail = panic
            .downcast_ref::<String>()
            .cloned()
            .or_else(|| panic.downcast_ref::<&str>().map(|s| s.to_string()))
            .unwrap_or_else(|| "unknown panic".to_string());
        format!("task panicked: {}", detail)
    } else {
        format!("task aborted: {}", error)
    };
    warn!("Wallet {} lost: {}", task.wallet, message);
    PerWalletResult::failed(task, FailureKind::Internal, message)
}
