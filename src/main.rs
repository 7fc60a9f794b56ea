//! pNode Indexer CLI
//!
//! One-shot run: discover, enrich, score and export, then exit.

use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use pnode_indexer::config::{IndexerConfig, Network};
use pnode_indexer::pipeline::Indexer;
use pnode_indexer::summary::log_top;
use pnode_indexer::transport::HttpTransport;

/// pNode Indexer - gossip discovery and reputation scoring
#[derive(Parser, Debug)]
#[command(name = "pnode-indexer")]
#[command(version)]
#[command(about = "Discover, enrich and rank the pNodes of a Xandeum network", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "indexer.toml")]
    config: PathBuf,

    /// Network to index (selects default entry hosts and credit endpoint)
    #[arg(long, value_enum, env = "PNODE_NETWORK")]
    network: Option<Network>,

    /// Comma-separated bootstrap hosts, tried in order
    #[arg(long, env = "PNODE_ENTRY_HOSTS", value_delimiter = ',')]
    entry_hosts: Vec<String>,

    /// pNode RPC port
    #[arg(long, env = "PNODE_RPC_PORT")]
    rpc_port: Option<u16>,

    /// Peers enriched concurrently
    #[arg(long, env = "PNODE_CONCURRENCY")]
    concurrency: Option<usize>,

    /// Directory for pnodes.json and pnodes.csv
    #[arg(short, long, env = "PNODE_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Disable the enrichment progress bar
    #[arg(long)]
    no_progress: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .init();

    // Load configuration
    let mut config = if args.config.exists() {
        IndexerConfig::load(&args.config)?
    } else {
        IndexerConfig::default()
    };

    // Override config with CLI args
    if let Some(network) = args.network {
        config = config.with_network(network);
    }
    config = config.with_entry_hosts(args.entry_hosts.clone());
    if let Some(port) = args.rpc_port {
        config = config.with_rpc_port(port);
    }
    if let Some(limit) = args.concurrency {
        config = config.with_concurrency(limit);
    }
    if let Some(dir) = args.output_dir.clone() {
        config = config.with_output_dir(dir);
    }

    config.validate()?;

    if args.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    info!("🌐 pNode Indexer v{}", env!("CARGO_PKG_VERSION"));
    if !args.config.exists() {
        warn!("Config file {:?} not found, using defaults", args.config);
    }
    info!("⚙️  Configuration:");
    info!("   Network: {:?}", config.network);
    info!("   Entry hosts: {}", config.resolved_entry_hosts().join(", "));
    info!("   RPC port: {}", config.rpc_port);
    info!("   Concurrency: {}", config.concurrency_limit);
    info!("   Output: {:?}", config.output_dir);

    let transport = Arc::new(HttpTransport::new(config.concurrency_limit)?);
    let show_progress = !args.no_progress && std::io::stderr().is_terminal();
    let top_n = config.top_n;

    let indexer = Indexer::new(Arc::new(config), transport).with_progress(show_progress);
    let report = indexer.run().await?;

    report.summary.log();
    log_top(&report.ranked, top_n);

    info!("👋 Done: {} nodes exported", report.ranked.len());
    Ok(())
}
