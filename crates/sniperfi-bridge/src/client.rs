//! Process-per-call engine client

use crate::config::{BridgeConfig, RPC_URL_ENV, WALLET_DIR_ENV};
use crate::{envelope, Error, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tracing::{debug, warn};

/// Longest stderr excerpt carried in a process error
const STDERR_TAIL_BYTES: usize = 512;

/// Request/response channel to the execution engine
///
/// Implementations perform no retries; callers decide the retry policy.
#[async_trait]
pub trait ExecutionBridge: Send + Sync {
    /// Run one engine command and return its decoded payload
    async fn invoke(&self, command: &str, args: &[String]) -> Result<Value>;

    /// Point subsequent calls at a new RPC endpoint
    fn set_rpc_endpoint(&self, _endpoint: &str) {}
}

/// Bridge that spawns a fresh engine process for every call
pub struct ProcessBridge {
    config: BridgeConfig,
    rpc_endpoint: RwLock<String>,
}

impl ProcessBridge {
    /// Create new process bridge
    pub fn new(config: BridgeConfig) -> Self {
        let rpc_endpoint = RwLock::new(config.rpc_endpoint.clone());
        Self {
            config,
            rpc_endpoint,
        }
    }

    /// Bridge configuration
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// RPC endpoint currently handed to the engine
    pub fn rpc_endpoint(&self) -> String {
        self.rpc_endpoint.read().clone()
    }

    fn build_command(&self, command: &str, args: &[String]) -> Command {
        let binary = &self.config.binary;
        let mut cmd = Command::new(binary.program());
        cmd.args(binary.leading_args())
            .arg(command)
            .args(args)
            .env(RPC_URL_ENV, self.rpc_endpoint())
            .env(WALLET_DIR_ENV, &self.config.wallet_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = binary.working_dir() {
            cmd.current_dir(dir);
        }
        cmd
    }
}

#[async_trait]
impl ExecutionBridge for ProcessBridge {
    async fn invoke(&self, command: &str, args: &[String]) -> Result<Value> {
        let started = Instant::now();
        let child = self.build_command(command, args).spawn().map_err(|e| {
            Error::Process(format!(
                "failed to spawn engine {:?} for '{}': {}",
                self.config.binary.program(),
                command,
                e
            ))
        })?;

        debug!(
            "Engine spawned for '{}' (pid {:?}, {} args)",
            command,
            child.id(),
            args.len()
        );

        // Dropping the wait future on timeout kills the child (kill_on_drop).
        let output =
            match tokio::time::timeout(self.config.request_timeout, child.wait_with_output()).await
            {
                Ok(Ok(output)) => output,
                Ok(Err(e)) => {
                    return Err(Error::Process(format!(
                        "engine I/O failed for '{}': {}",
                        command, e
                    )))
                }
                Err(_) => {
                    warn!(
                        "Engine '{}' exceeded {}ms deadline, killed",
                        command,
                        self.config.request_timeout.as_millis()
                    );
                    return Err(Error::Timeout {
                        command: command.to_string(),
                        after: self.config.request_timeout,
                    });
                }
            };

        debug!(
            "Engine '{}' exited with {} after {}ms",
            command,
            output.status,
            started.elapsed().as_millis()
        );

        if !output.status.success() {
            // A failure envelope printed before a non-zero exit is the better message.
            if let Ok(document) = envelope::parse_document(&output.stdout) {
                envelope::into_result(document)?;
            }
            return Err(Error::Process(format!(
                "engine exited with {} running '{}': {}",
                output.status,
                command,
                stderr_tail(&output.stderr)
            )));
        }

        let document = envelope::parse_document(&output.stdout)?;
        envelope::into_result(document)
    }

    fn set_rpc_endpoint(&self, endpoint: &str) {
        *self.rpc_endpoint.write() = endpoint.to_string();
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return "no stderr output".to_string();
    }
    let mut start = trimmed.len().saturating_sub(STDERR_TAIL_BYTES);
    while !trimmed.is_char_boundary(start) {
        start += 1;
    }
    trimmed[start..].to_string()
}
