//! Receipt delivery CLI - sends and manages notification receipts.
//!
//! This is the main binary entry point. See the `receipt_delivery` library
//! for the core functionality.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use receipt_delivery::{credentials, Config, Credential, ReceiptSender};

/// Global allocator configured per M-MIMALLOC-APPS guideline.
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

// CLI
#[derive(Parser)]
#[command(name = "receipt-delivery")]
#[command(version)]
#[command(about = "Send push notification receipt acknowledgements")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Acknowledge a received notification (always exits successfully)
    Send {
        /// Acknowledgement id from the push payload
        #[arg(long)]
        ack_id: String,
        /// Notification type, e.g. "message" or "clear"
        #[arg(long = "type", default_value = "message")]
        kind: String,
    },
    /// Store the backend token and server URL in secure storage
    Login {
        /// Bearer token for the backend
        #[arg(long)]
        token: String,
        /// Server base URL
        #[arg(long)]
        server_url: String,
    },
    /// Remove the stored credential
    Logout,
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();
    let config = Config::load().unwrap_or_else(|e| {
        log::warn!("Falling back to default config: {e:#}");
        Config::default()
    });
    log::debug!(
        "Running in {} environment",
        receipt_delivery::env::Environment::current()
    );

    match cli.command {
        Commands::Send { ack_id, kind } => {
            match credentials::default_store(&config) {
                Ok(store) => ReceiptSender::new(store).send(&ack_id, &kind).await,
                Err(e) => log::error!("[Receipt] No credential store available: {e:#}"),
            }
        }
        Commands::Login { token, server_url } => {
            if token.is_empty() || server_url.is_empty() {
                anyhow::bail!("Token and server URL must be non-empty");
            }
            if token.contains(',') || server_url.contains(',') {
                anyhow::bail!("Token and server URL must not contain ','");
            }
            let store = credentials::default_store(&config)?;
            store
                .set(&Credential::new(token, server_url).to_secret())
                .await
                .context("Failed to store credential")?;
            println!("Credential saved.");
        }
        Commands::Logout => {
            let store = credentials::default_store(&config)?;
            store.clear().await.context("Failed to remove credential")?;
            println!("Credential removed.");
        }
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
