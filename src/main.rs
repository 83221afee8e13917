//! Mevharvest - Round-Synchronized MEV Log Harvesting Replica
//!
//! Harvests hourly MEV transaction logs, delivers each record to a
//! reporting endpoint, and advances its round state machine only through
//! agreed transitions.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mevharvest::agreement::InMemoryAgreement;
use mevharvest::config::MevHarvestConfig;
use mevharvest::error::Result;
use mevharvest::replica::ReplicaStateMachine;
use mevharvest::round::TransitionTable;
use mevharvest::state::SynchronizedData;

/// Mevharvest - Round-Synchronized MEV Log Harvesting Replica
#[derive(Parser)]
#[command(name = "mevharvest")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "mevharvest.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the harvesting replica
    Start,

    /// Initialize a new configuration file
    Init {
        /// Output path for configuration file
        #[arg(short, long, default_value = "mevharvest.toml")]
        output: PathBuf,

        /// Node ID
        #[arg(long, default_value = "replica-1")]
        node_id: String,
    },

    /// Validate configuration file
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(&cli.log_level);

    match cli.command {
        Commands::Start => run_start(cli.config).await,
        Commands::Init { output, node_id } => run_init(output, node_id),
        Commands::Validate => run_validate(cli.config),
    }
}

/// Initialize logging
fn init_logging(level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| level.into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Start the harvesting replica
async fn run_start(config_path: PathBuf) -> Result<()> {
    tracing::info!("Starting mevharvest replica...");

    let config = match MevHarvestConfig::from_file(&config_path) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to load configuration from {:?}: {}", config_path, e);
            tracing::error!("Please check that the config file exists and is valid TOML");
            return Err(e);
        }
    };

    tracing::info!("Replica '{}' configured", config.node.id);
    tracing::info!("Log path: {}", config.agent.log_path);
    tracing::info!("Reporting endpoint: {}", config.agent.base_url);

    // Single-replica deployment: the loopback engine stands in for the
    // external agreement engine, with this node as sole participant.
    let engine = Arc::new(InMemoryAgreement::new());
    let synced = SynchronizedData::with_participants([config.node.id.clone()]);
    let table = TransitionTable::harvesting()?;

    let mut replica = ReplicaStateMachine::new(config, table, engine, synced);

    tokio::select! {
        result = replica.run() => {
            if let Err(ref e) = result {
                tracing::error!("Replica stopped: {}", e);
            }
            result
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received shutdown signal, stopping replica");
            Ok(())
        }
    }
}

/// Initialize a new configuration file
fn run_init(output: PathBuf, node_id: String) -> Result<()> {
    let config = MevHarvestConfig {
        node: mevharvest::config::NodeConfig { id: node_id },
        agent: mevharvest::config::AgentConfig {
            log_path: "/var/log/mev".to_string(),
            base_url: "https://reports.example.com/api".to_string(),
            api_key: "change-me".to_string(),
            wait_time_secs: 5,
            round_timeout_secs: 30,
        },
        logging: Default::default(),
    };

    let toml = toml::to_string_pretty(&config)
        .map_err(|e| mevharvest::Error::Internal(format!("config serialization: {e}")))?;
    std::fs::write(&output, toml)?;

    tracing::info!("Wrote configuration template to {:?}", output);
    Ok(())
}

/// Validate configuration file
fn run_validate(config_path: PathBuf) -> Result<()> {
    match MevHarvestConfig::from_file(&config_path) {
        Ok(config) => {
            tracing::info!("Configuration {:?} is valid (node '{}')", config_path, config.node.id);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Configuration {:?} is invalid: {}", config_path, e);
            Err(e)
        }
    }
}
