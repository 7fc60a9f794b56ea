//! Peer Enrichment
//!
//! Attaches health, credit and location data to a discovered peer.
//!
//! ## Steps
//!
//! 1. `get-stats` on the conventional RPC port, then on the peer's own
//!    gossip port if different. First valid answer wins.
//! 2. Geolocation, only when step 1 succeeded. Lookups are followed by a
//!    short pause to stay under the geo service's rate ceiling.
//! 3. Credits from the shared [`CreditTable`].
//!
//! Enrichment never fails. Every failed call leaves its fields at defaults.

use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::geo::GeoLookup;
use crate::rpc::RpcClient;
use crate::transport::CallOutcome;
use crate::types::{CreditTable, EnrichedPeer, GeoInfo, NodeStats, Peer};

/// Timeouts and ports used per peer
#[derive(Debug, Clone)]
pub struct EnrichSettings {
    /// Conventional RPC port, tried first
    pub rpc_port: u16,

    /// Timeout for each `get-stats` attempt
    pub rpc_timeout: Duration,

    /// Pause after a successful geo lookup
    pub geo_delay: Duration,
}

/// Single-peer enricher, shared by all fan-out workers
pub struct PeerEnricher {
    rpc: Arc<RpcClient>,
    geo: GeoLookup,
    settings: EnrichSettings,
}

impl PeerEnricher {
    pub fn new(rpc: Arc<RpcClient>, geo: GeoLookup, settings: EnrichSettings) -> Self {
        Self { rpc, geo, settings }
    }

    /// Ports to try for `get-stats`, conventional port first, no duplicates
    pub fn candidate_ports(&self, peer: &Peer) -> Vec<u16> {
        let mut ports = vec![self.settings.rpc_port];
        if peer.discovery_port != self.settings.rpc_port {
            ports.push(peer.discovery_port);
        }
        ports
    }

    /// Enrich one peer
    pub async fn enrich(&self, peer: Peer, credits: &CreditTable) -> EnrichedPeer {
        let stats = self.fetch_stats(&peer).await;
        let rpc_reachable = stats.is_some();

        // Geo traffic is limited to live peers
        let geo = if rpc_reachable {
            self.fetch_geo(&peer.host).await
        } else {
            GeoInfo::default()
        };

        let credits = peer
            .identity
            .as_ref()
            .and_then(|id| credits.get(id))
            .copied()
            .unwrap_or(0.0);

        EnrichedPeer {
            peer,
            rpc_reachable,
            stats: stats.unwrap_or_default(),
            credits,
            geo,
        }
    }

    async fn fetch_stats(&self, peer: &Peer) -> Option<NodeStats> {
        if peer.host.is_empty() {
            return None;
        }

        for port in self.candidate_ports(peer) {
            match self
                .rpc
                .get_stats(&peer.host, port, self.settings.rpc_timeout)
                .await
            {
                CallOutcome::Success(stats) => return Some(stats.into()),
                other => debug!(
                    "get-stats failed on {}:{}: {}",
                    peer.host,
                    port,
                    other.reason().unwrap_or("unknown")
                ),
            }
        }

        None
    }

    async fn fetch_geo(&self, host: &str) -> GeoInfo {
        match self.geo.locate(host).await {
            CallOutcome::Success(info) => {
                tokio::time::sleep(self.settings.geo_delay).await;
                info
            }
            other => {
                debug!("Geo lookup failed for {}: {}", host, other.reason().unwrap_or("unknown"));
                GeoInfo::default()
            }
        }
    }
}
