//! Gossip Discovery
//!
//! Asks a fixed list of bootstrap pNodes for the gossip peer list.
//!
//! ## Strategy
//!
//! - Entry hosts are tried in order, one `get-pods` call each
//! - The first host returning a non-empty list wins, later hosts are never contacted
//! - Transport errors, malformed bodies and empty lists move on to the next host
//! - If every host fails the run cannot continue ([`IndexerError::DiscoveryUnavailable`])

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::error::{IndexerError, Result};
use crate::rpc::{GossipPod, RpcClient};
use crate::transport::CallOutcome;
use crate::types::Peer;
use crate::version::normalize_version;

/// Gossip peer list client
pub struct DiscoveryClient {
    rpc: Arc<RpcClient>,
    port: u16,
    timeout: Duration,
}

impl DiscoveryClient {
    /// `port` is both the RPC port of the entry hosts and the default
    /// gossip port for addresses without one
    pub fn new(rpc: Arc<RpcClient>, port: u16, timeout: Duration) -> Self {
        Self { rpc, port, timeout }
    }

    /// Discover the network from the first responsive entry host
    pub async fn discover(&self, entry_hosts: &[String]) -> Result<Vec<Peer>> {
        info!("📡 Connecting to the pNode network via {} entry hosts", entry_hosts.len());

        for host in entry_hosts {
            match self.rpc.get_pods(host, self.port, self.timeout).await {
                CallOutcome::Success(result) if !result.pods.is_empty() => {
                    let peers = self.parse_pods(result.pods);
                    info!("✅ Connected via {}, discovered {} nodes", host, peers.len());
                    return Ok(peers);
                }
                CallOutcome::Success(_) => {
                    debug!("Entry host {} returned an empty peer list", host);
                }
                other => {
                    debug!(
                        "Entry host {} failed: {}",
                        host,
                        other.reason().unwrap_or("unknown")
                    );
                }
            }
        }

        error!("❌ Could not reach any entry host, network may be down");
        Err(IndexerError::DiscoveryUnavailable {
            hosts_tried: entry_hosts.len(),
        })
    }

    /// Normalize gossip records, keeping the first record per identity
    fn parse_pods(&self, pods: Vec<GossipPod>) -> Vec<Peer> {
        let mut seen = HashSet::new();
        let mut peers = Vec::with_capacity(pods.len());

        for pod in pods {
            if let Some(id) = &pod.pubkey {
                if !seen.insert(id.clone()) {
                    debug!("Dropping duplicate gossip record for {}", id);
                    continue;
                }
            }

            peers.push(Peer::new(
                pod.pubkey,
                pod.address.as_deref().unwrap_or_default(),
                normalize_version(pod.version.as_deref()),
                pod.last_seen_timestamp.unwrap_or(0),
                self.port,
            ));
        }

        peers
    }
}
