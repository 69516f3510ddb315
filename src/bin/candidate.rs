//! Candidate worker binary
//!
//! Competes for leadership in a group and polls its verdict on a timer,
//! doing "leader work" only while it holds the verdict.

use clap::{Parser, Subcommand};
use minielect::{CoordinationClient, ElectionCoordinator, MemoryCluster};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "minielect-candidate")]
#[command(about = "leader election candidate worker")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the candidate loop
    Run {
        /// Service group to compete in
        #[arg(long, default_value = "WorkerService")]
        group: String,

        /// Candidate name; generated when omitted
        #[arg(long)]
        name: Option<String>,

        /// Poll interval in milliseconds
        #[arg(long, default_value = "10000")]
        interval: u64,

        /// Config file (TOML)
        #[arg(long, default_value = "./minielect.toml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            group,
            name,
            interval,
            config,
        } => {
            let mut config = minielect::ElectionConfig::load(config)?;
            // CLI has priority over the file
            if group != "WorkerService" {
                config.group = group;
            }
            if interval != 10_000 {
                config.poll_interval_ms = interval;
            }
            config.validate()?;

            let candidate =
                name.unwrap_or_else(|| format!("candidate-{}", uuid::Uuid::new_v4()));
            tracing::info!("Hi, I am {}", candidate);
            tracing::info!("  Group: {}", config.group);
            tracing::info!("  Endpoints: {}", config.connect_string());
            tracing::info!("  Session timeout: {:?}", config.session_timeout());

            // In-process backend; a wire client to a real ensemble would be
            // constructed from config.endpoints here instead.
            let cluster = MemoryCluster::new();
            let client = Arc::new(CoordinationClient::new(Arc::new(cluster)));
            let election = ElectionCoordinator::connect(client.clone(), config.group.clone()).await?;

            let mut ticker = tokio::time::interval(config.poll_interval());
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
                        if election.is_leader(&candidate).await {
                            tracing::info!("[{}] [{}]: I did something useful", candidate, now);
                        } else {
                            tracing::info!("[{}] [{}]: Sorry, I did nothing", candidate, now);
                        }
                    }
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("Shutting down, closing session");
                        client.close().await?;
                        break;
                    }
                }
            }
        }
    }

    Ok(())
}
