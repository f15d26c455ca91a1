//! anekdot-relay CLI entry point

use anekdot_relay::{
    commands::{cmd_purge, cmd_scan, cmd_status, print_page_map, print_purge_stats, print_status},
    config::{Config, ConfigOverrides},
    delivery::DeliveryLoop,
    error::Result,
    notify::WebhookNotifier,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "anekdot-relay")]
#[command(version, about = "Relay unseen jokes to a chat webhook", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Webhook that receives the jokes
    #[arg(long, env = "WEBHOOK_URL", global = true, hide_env_values = true)]
    webhook_url: Option<String>,

    /// Hours between page map rescans
    #[arg(long, env = "CHECK_INTERVAL_HOURS", global = true)]
    check_interval_hours: Option<u64>,

    /// Seconds between deliveries (clamped to 60..=86400)
    #[arg(long, env = "SEND_INTERVAL_SECS", global = true)]
    send_interval_secs: Option<u64>,

    /// Site root to scrape
    #[arg(long, env = "BASE_URL", global = true)]
    base_url: Option<String>,

    /// Directory holding the ledger and page map files
    #[arg(long, env = "DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the delivery loop (default)
    Run,

    /// Rebuild the category page map now
    Scan,

    /// Show page map and ledger state
    Status,

    /// Drop ledger entries past the retention window
    Purge {
        /// Show what would be removed without writing
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    if cli.json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .init();
    }

    let config = Config::load_or_default(cli.config.as_deref())?.with_overrides(ConfigOverrides {
        webhook_url: cli.webhook_url,
        base_url: cli.base_url,
        data_dir: cli.data_dir,
        check_interval_hours: cli.check_interval_hours,
        send_interval_secs: cli.send_interval_secs,
    });
    config.validate()?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let notifier = WebhookNotifier::new(&config)?;
            let mut relay = DeliveryLoop::new(config, notifier)?;
            relay.run_until(shutdown_signal()).await;
        }

        Commands::Scan => {
            let map = cmd_scan(&config).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&map)?);
            } else {
                print_page_map(&map);
            }
        }

        Commands::Status => {
            let status = cmd_status(&config);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                print_status(&status);
            }
        }

        Commands::Purge { dry_run } => {
            let stats = cmd_purge(&config, dry_run)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print_purge_stats(&stats, dry_run);
            }
        }
    }

    Ok(())
}

/// Resolve on Ctrl-C, or SIGTERM on unix
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("Shutdown signal received");
}
