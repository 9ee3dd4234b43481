//! xswap-executor - operator CLI for the swap route executor
//!
//! Tracks submitted step transactions and approvals against the routing
//! service, and validates transaction descriptors offline.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};

use xswap_executor::api::HttpSwapApi;
use xswap_executor::chain::SignerSet;
use xswap_executor::config::Settings;
use xswap_executor::coordination::{cancel_pair, ApprovalFlow, CancelHandle, StatusPoller};
use xswap_executor::events::EventBus;
use xswap_executor::tx::{TransactionDescriptor, TransactionSender};
use xswap_executor::SwapApi;

/// Swap route executor CLI
#[derive(Parser, Debug)]
#[command(name = "xswap-executor", version, about = "Cross-chain swap route executor")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, env = "XSWAP_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll a submitted step transaction until it succeeds or fails
    Track {
        #[arg(long)]
        request_id: String,
        #[arg(long)]
        step: u32,
        #[arg(long)]
        tx_id: String,
    },

    /// Poll an approval transaction until the allowance is visible
    Approval {
        #[arg(long)]
        request_id: String,
        #[arg(long)]
        tx_id: String,
    },

    /// Parse and validate a transaction descriptor JSON file
    Validate { file: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();

    match cli.command {
        Command::Validate { file } => validate(&file),
        Command::Track {
            request_id,
            step,
            tx_id,
        } => {
            let settings = load_settings(cli.config)?;
            track(&settings, &request_id, step, &tx_id).await
        }
        Command::Approval { request_id, tx_id } => {
            let settings = load_settings(cli.config)?;
            approval(&settings, &request_id, &tx_id).await
        }
    }
}

fn load_settings(path: Option<PathBuf>) -> Result<Settings> {
    let settings = match path {
        Some(path) => Settings::from_path(path)?,
        None => Settings::load()?,
    };
    info!("Loaded configuration for {}", settings.api.base_url);
    Ok(settings)
}

fn validate(file: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read descriptor file: {:?}", file))?;
    let value: serde_json::Value =
        serde_json::from_str(&raw).with_context(|| "Descriptor is not valid JSON")?;

    let descriptor = TransactionDescriptor::parse(value)?;
    println!(
        "{}",
        json!({
            "chainFamily": descriptor.chain_family(),
            "blockchain": descriptor.blockchain(),
            "requiresApproval": descriptor.requires_approval(),
        })
    );
    Ok(())
}

async fn track(settings: &Settings, request_id: &str, step: u32, tx_id: &str) -> Result<()> {
    let api: Arc<dyn SwapApi> = Arc::new(HttpSwapApi::new(&settings.api)?);
    let config = settings.executor_config();
    let poller = StatusPoller::new(api, config.status_policy, EventBus::new());

    let (handle, cancel) = cancel_pair();
    let watcher = tokio::spawn(cancel_on_shutdown(handle));

    info!(request_id, step, tx_id, "Tracking transaction");
    let result = poller
        .await_terminal_status(request_id, step, tx_id, &cancel)
        .await;
    watcher.abort();
    let result = result?;

    println!(
        "{}",
        json!({
            "requestId": request_id,
            "step": step,
            "txId": result.tx_id,
            "status": result.status,
            "outputAmount": result.output_amount,
            "extraMessage": result.extra_message,
            "hasNewTx": result.new_tx.is_some(),
            "explorerUrl": result.explorer_urls,
        })
    );
    Ok(())
}

async fn approval(settings: &Settings, request_id: &str, tx_id: &str) -> Result<()> {
    let api: Arc<dyn SwapApi> = Arc::new(HttpSwapApi::new(&settings.api)?);
    let config = settings.executor_config();
    // Confirmation only: nothing is signed here
    let sender = Arc::new(TransactionSender::new(SignerSet::new(), None));
    let flow = ApprovalFlow::new(api, sender, config.approval_policy, EventBus::new())
        .with_grace_polls(config.approval_grace_polls);

    let (handle, cancel) = cancel_pair();
    let watcher = tokio::spawn(cancel_on_shutdown(handle));

    info!(request_id, tx_id, "Waiting for approval");
    let result = flow.await_confirmation(request_id, tx_id, &cancel).await;
    watcher.abort();
    result?;

    println!(
        "{}",
        json!({ "requestId": request_id, "txId": tx_id, "approved": true })
    );
    Ok(())
}

async fn cancel_on_shutdown(handle: CancelHandle) {
    shutdown_signal().await;
    warn!("Shutdown signal received, cancelling");
    handle.cancel();
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info,xswap_executor=debug,reqwest=warn,hyper=warn")
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
