//! Indexer Configuration
//!
//! Configurable parameters for one indexing run.
//! Defaults match the public devnet and the rate limits of the free
//! geolocation service.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::scheduler::DEFAULT_CONCURRENCY;
use crate::types::DEFAULT_RPC_PORT;

/// Which pNode network to index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Devnet,
    Mainnet,
}

impl Network {
    /// Known bootstrap pNodes
    pub fn entry_hosts(&self) -> Vec<String> {
        let hosts: &[&str] = match self {
            Network::Devnet => &[
                "192.190.136.28",
                "192.190.136.36",
                "192.190.136.37",
                "192.190.136.38",
            ],
            Network::Mainnet => &[
                "161.97.97.41",
                "173.212.203.145",
                "173.212.220.65",
                "62.171.138.27",
                "173.212.207.32",
                "62.171.135.107",
                "173.249.3.118",
            ],
        };
        hosts.iter().map(|h| h.to_string()).collect()
    }

    /// Pod credits endpoints
    pub fn credits_urls(&self) -> Vec<String> {
        let url = match self {
            Network::Devnet => "https://podcredits.xandeum.network/api/pods-credits",
            Network::Mainnet => "https://podcredits.xandeum.network/api/mainnet-pod-credits",
        };
        vec![url.to_string()]
    }
}

/// Main configuration for the indexer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexerConfig {
    // === Network ===

    pub network: Network,

    /// Bootstrap hosts queried for the gossip peer list, in order.
    /// Empty means the network's known hosts.
    pub entry_hosts: Vec<String>,

    /// Conventional pNode RPC port (discovery and first stats attempt)
    pub rpc_port: u16,

    /// Credit endpoints, merged when several are given.
    /// Empty means the network's endpoint.
    pub credits_urls: Vec<String>,

    /// Geolocation service base URL (ip-api.com compatible)
    pub geo_base_url: String,

    // === Timing ===

    /// Timeout for each `get-pods` call (seconds)
    pub discovery_timeout_secs: u64,

    /// Timeout for each credits fetch (seconds)
    pub credits_timeout_secs: u64,

    /// Timeout for each `get-stats` attempt (milliseconds)
    /// Kept short: it bounds per-peer latency during fan-out
    pub rpc_timeout_ms: u64,

    /// Timeout for each geo lookup (milliseconds)
    pub geo_timeout_ms: u64,

    /// Pause after each successful geo lookup (milliseconds)
    pub geo_delay_ms: u64,

    // === Limits ===

    /// Peers enriched concurrently
    pub concurrency_limit: usize,

    // === Output ===

    pub output_dir: PathBuf,

    pub json_file: String,

    pub csv_file: String,

    /// Peers listed in the end-of-run report
    pub top_n: usize,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self::for_network(Network::Devnet)
    }
}

impl IndexerConfig {
    /// Defaults for `network`
    pub fn for_network(network: Network) -> Self {
        Self {
            network,
            entry_hosts: Vec::new(),
            rpc_port: DEFAULT_RPC_PORT,
            credits_urls: Vec::new(),
            geo_base_url: "http://ip-api.com".to_string(),

            discovery_timeout_secs: 5,
            credits_timeout_secs: 10,
            rpc_timeout_ms: 2_000,
            geo_timeout_ms: 2_000,
            geo_delay_ms: 100, // free tier allows ~45 req/min

            concurrency_limit: DEFAULT_CONCURRENCY,

            output_dir: PathBuf::from("."),
            json_file: "pnodes.json".to_string(),
            csv_file: "pnodes.csv".to_string(),
            top_n: 10,
        }
    }

    /// Load configuration from TOML file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = self.to_toml()?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn to_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    // Builder-style methods for CLI overrides

    pub fn with_network(mut self, network: Network) -> Self {
        self.network = network;
        self
    }

    pub fn with_entry_hosts(mut self, hosts: Vec<String>) -> Self {
        if !hosts.is_empty() {
            self.entry_hosts = hosts;
        }
        self
    }

    /// Entry hosts to query, falling back to the network's known hosts
    pub fn resolved_entry_hosts(&self) -> Vec<String> {
        if self.entry_hosts.is_empty() {
            self.network.entry_hosts()
        } else {
            self.entry_hosts.clone()
        }
    }

    /// Credit endpoints to fetch, falling back to the network's endpoint
    pub fn resolved_credits_urls(&self) -> Vec<String> {
        if self.credits_urls.is_empty() {
            self.network.credits_urls()
        } else {
            self.credits_urls.clone()
        }
    }

    pub fn with_rpc_port(mut self, port: u16) -> Self {
        self.rpc_port = port;
        self
    }

    pub fn with_concurrency(mut self, limit: usize) -> Self {
        self.concurrency_limit = limit;
        self
    }

    pub fn with_output_dir(mut self, dir: PathBuf) -> Self {
        self.output_dir = dir;
        self
    }

    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_secs(self.discovery_timeout_secs)
    }

    pub fn credits_timeout(&self) -> Duration {
        Duration::from_secs(self.credits_timeout_secs)
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_millis(self.rpc_timeout_ms)
    }

    pub fn geo_timeout(&self) -> Duration {
        Duration::from_millis(self.geo_timeout_ms)
    }

    pub fn geo_delay(&self) -> Duration {
        Duration::from_millis(self.geo_delay_ms)
    }

    /// Validate configuration values
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.resolved_entry_hosts().is_empty() {
            anyhow::bail!("at least one entry host is required");
        }

        if self.entry_hosts.iter().any(|h| h.trim().is_empty()) {
            anyhow::bail!("entry_hosts must not contain blank entries");
        }

        if self.concurrency_limit == 0 {
            anyhow::bail!("concurrency_limit must be at least 1");
        }

        if self.rpc_timeout() >= self.discovery_timeout() {
            anyhow::bail!(
                "rpc_timeout_ms ({}) must be shorter than discovery_timeout_secs ({}s)",
                self.rpc_timeout_ms,
                self.discovery_timeout_secs
            );
        }

        if self.json_file.is_empty() || self.csv_file.is_empty() {
            anyhow::bail!("output file names must not be empty");
        }

        if self.json_file == self.csv_file {
            anyhow::bail!("json_file and csv_file must differ (both {})", self.json_file);
        }

        Ok(())
    }
}
