//! SNIPERFI command-line front end
//!
//! Drives the fleet engine and prints plain JSON on stdout. Logs go to
//! stderr, filtered by `RUST_LOG` (default `info`).

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use sniperfi_core::{AppContext, CancelToken, FleetConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "sniperfi")]
#[command(about = "Fleet orchestration for a parent wallet and its child wallets", long_about = None)]
struct Cli {
    /// JSON config file (SNIPERFI_* environment variables override it)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the parent wallet
    Info,

    /// Show a wallet balance (parent by default)
    Balance {
        /// Wallet public key
        #[arg(short, long)]
        wallet: Option<String>,
    },

    /// Show token holdings (parent by default)
    Tokens {
        /// Wallet public key
        #[arg(short, long)]
        wallet: Option<String>,
    },

    /// Show recent transactions (parent by default)
    History {
        /// Wallet public key
        #[arg(short, long)]
        wallet: Option<String>,
    },

    /// List child wallets
    List,

    /// Count wallets known to the engine
    Count,

    /// Generate a new parent wallet
    GenerateParent {
        /// Password forwarded to the engine
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Generate child wallets
    GenerateChildren {
        /// Number of wallets
        count: u32,
    },

    /// Split an amount across all child wallets
    Distribute {
        /// Total in whole coins, e.g. 1.5
        amount: String,
    },

    /// Buy a token from every child wallet
    Snipe {
        /// Token mint address
        mint: String,

        /// Spend per wallet in whole coins
        amount: String,
    },

    /// Back up the parent key
    Backup {
        /// Backup password (omit for an unencrypted backup)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Restore the parent key from a backup file
    Restore {
        /// Backup file
        file: PathBuf,

        /// Backup password
        #[arg(short, long)]
        password: Option<String>,
    },

    /// List backup files
    Backups,

    /// Show the dashboard snapshot
    Dashboard {
        /// Keep refreshing until interrupted
        #[arg(short, long)]
        watch: bool,
    },

    /// Switch the RPC endpoint
    SetRpc {
        /// Endpoint URL
        url: String,
    },
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn print<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<sniperfi_core::Error>() {
                Some(fleet) => {
                    error!("{} error: {}", fleet.category(), fleet);
                    eprintln!("error: {}", fleet.user_message());
                }
                None => eprintln!("error: {:#}", e),
            }
            ExitCode::FAILURE
        }
    }
}

async fn wallet_or_parent(ctx: &AppContext, wallet: Option<String>) -> anyhow::Result<String> {
    match wallet {
        Some(key) => Ok(key),
        None => Ok(ctx
            .registry()
            .get_parent()
            .await?
            .ok_or(sniperfi_core::Error::NoParent)?
            .public_key),
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = FleetConfig::load(cli.config.as_deref()).context("loading configuration")?;
    let ctx = AppContext::new(config)?;

    match cli.command {
        Commands::Info => {
            let parent = ctx.registry().get_parent().await?;
            print(&json!({ "parent": parent }))?;
        }
        Commands::Balance { wallet } => {
            let public_key = wallet_or_parent(&ctx, wallet).await?;
            let balance = ctx.registry().refresh_balance(&public_key).await?;
            print(&json!({
                "public_key": public_key,
                "lamports": balance,
                "sol": balance.to_string(),
            }))?;
        }
        Commands::Tokens { wallet } => {
            let public_key = wallet_or_parent(&ctx, wallet).await?;
            let holdings = ctx.registry().token_holdings(&public_key).await?;
            print(&json!({ "public_key": public_key, "tokens": holdings }))?;
        }
        Commands::History { wallet } => {
            let public_key = wallet_or_parent(&ctx, wallet).await?;
            let entries = ctx.registry().transaction_history(&public_key).await?;
            print(&json!({ "public_key": public_key, "history": entries }))?;
        }
        Commands::Count => {
            print(&json!({ "count": ctx.registry().wallet_count().await? }))?;
        }
        Commands::List => {
            let children = ctx.registry().list_children().await?;
            print(&json!({ "count": children.len(), "wallets": children }))?;
        }
        Commands::GenerateParent { password } => {
            let generated = ctx.service().generate_parent(password.as_deref()).await?;
            warn!("The private key below is shown once; store it safely");
            print(&json!({
                "public_key": generated.wallet.public_key,
                "private_key": generated.private_key.as_str(),
            }))?;
        }
        Commands::GenerateChildren { count } => {
            let created = ctx.service().generate_children(count).await?;
            print(&json!({ "created": created }))?;
        }
        Commands::Distribute { amount } => {
            let batch = ctx.distribution().distribute_decimal(&amount).await?;
            print(&json!({ "outcome": batch.outcome(), "batch": batch }))?;
        }
        Commands::Snipe { mint, amount } => {
            let batch = ctx.snipe().snipe_decimal(&mint, &amount).await?;
            print(&json!({ "outcome": batch.outcome(), "batch": batch }))?;
        }
        Commands::Backup { password } => {
            let path = ctx.backup().backup_to_file(password.as_deref()).await?;
            print(&json!({
                "backup_path": path,
                "encrypted": password.as_deref().is_some_and(|p| !p.is_empty()),
            }))?;
        }
        Commands::Restore { file, password } => {
            let wallet = ctx
                .backup()
                .restore_from_file(&file, password.as_deref())
                .await?;
            print(&json!({ "restored": wallet.public_key }))?;
        }
        Commands::Backups => {
            print(&json!({ "backups": ctx.backup().list_backups()? }))?;
        }
        Commands::Dashboard { watch } => {
            if !watch {
                print(&ctx.dashboard().await)?;
                return Ok(());
            }

            let mut handle = ctx.spawn_refresher(CancelToken::new());
            loop {
                tokio::select! {
                    snapshot = handle.next() => match snapshot {
                        Some(snapshot) => print(&snapshot)?,
                        None => break,
                    },
                    _ = tokio::signal::ctrl_c() => {
                        info!("Interrupted, stopping dashboard refresh");
                        break;
                    }
                }
            }
            handle.stop().await;
        }
        Commands::SetRpc { url } => {
            ctx.registry().set_rpc_endpoint(&url).await?;
            print(&json!({ "rpc_endpoint": url }))?;
        }
    }

    Ok(())
}
