//! Core types for the pNode indexer
//!
//! A peer moves through three stages during one run:
//! discovered ([`Peer`]), enriched ([`EnrichedPeer`]) and scored ([`ScoredPeer`]).
//! Each stage owns the previous one, so the discovered fields are carried
//! through unchanged.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Conventional pNode RPC port, also used for gossip discovery
pub const DEFAULT_RPC_PORT: u16 = 6000;

/// Placeholder for location fields the geo service did not provide
pub const UNKNOWN_LOCATION: &str = "Unknown";

/// Identity (pubkey) to earned credits
pub type CreditTable = HashMap<String, f64>;

// =============================================================================
// PEER
// =============================================================================

/// A pNode as reported by the gossip `get-pods` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Peer {
    /// Node pubkey. Peers without one cannot be matched to credits.
    pub identity: Option<String>,

    /// Raw `host:port` gossip address
    pub address: String,

    /// Host part of `address`
    pub host: String,

    /// Port part of `address`, or the default RPC port when absent
    pub discovery_port: u16,

    /// Normalized version (see [`crate::version::normalize_version`])
    pub version: String,

    /// Last gossip timestamp (Unix seconds, 0 when not reported)
    pub last_seen: u64,
}

impl Peer {
    /// Build a peer from its gossip address.
    ///
    /// `address` is split on the first `:`; a missing or unparsable port
    /// falls back to `default_port`.
    pub fn new(
        identity: Option<String>,
        address: &str,
        version: String,
        last_seen: u64,
        default_port: u16,
    ) -> Self {
        let (host, discovery_port) = split_address(address, default_port);
        Self {
            identity,
            address: address.to_string(),
            host,
            discovery_port,
            version,
            last_seen,
        }
    }
}

/// Split a `host:port` string
pub fn split_address(address: &str, default_port: u16) -> (String, u16) {
    match address.split_once(':') {
        Some((host, port)) => {
            let port = port.parse::<u16>().unwrap_or(default_port);
            (host.to_string(), port)
        }
        None => (address.to_string(), default_port),
    }
}

// =============================================================================
// ENRICHMENT
// =============================================================================

/// Resource figures reported by a node's `get-stats` RPC.
///
/// Every field is `None` when the node was not reachable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeStats {
    pub cpu_percent: Option<f64>,
    pub ram_used: Option<u64>,
    pub ram_total: Option<u64>,
    pub uptime_seconds: Option<u64>,
    pub active_streams: Option<u64>,
    pub storage_used: Option<u64>,
}

impl NodeStats {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Location of a node's host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoInfo {
    pub country: String,
    pub city: String,
    pub isp: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Default for GeoInfo {
    fn default() -> Self {
        Self {
            country: UNKNOWN_LOCATION.to_string(),
            city: UNKNOWN_LOCATION.to_string(),
            isp: UNKNOWN_LOCATION.to_string(),
            latitude: None,
            longitude: None,
        }
    }
}

impl GeoInfo {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// A peer with best-effort health, credit and location data attached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedPeer {
    pub peer: Peer,

    /// True only if a `get-stats` call succeeded on some candidate port
    pub rpc_reachable: bool,

    pub stats: NodeStats,

    /// Credits earned by `peer.identity`, 0 when unknown
    pub credits: f64,

    /// Only looked up for reachable peers
    pub geo: GeoInfo,
}

impl EnrichedPeer {
    /// An enrichment result with nothing but credits attached
    pub fn unreachable(peer: Peer, credits: f64) -> Self {
        Self {
            peer,
            rpc_reachable: false,
            stats: NodeStats::default(),
            credits,
            geo: GeoInfo::default(),
        }
    }
}

// =============================================================================
// SCORING
// =============================================================================

/// Per-component scores, each in `[0, 100]`
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub uptime_score: f64,
    pub cpu_score: f64,
    pub version_score: f64,
    pub credit_score: f64,
}

/// An enriched peer with its composite reputation score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPeer {
    pub enriched: EnrichedPeer,

    pub breakdown: ScoreBreakdown,

    /// Weighted composite in `[0, 100]`, rounded to 2 decimals
    pub total_score: f64,

    /// 1-based position after export ranking (0 until ranked)
    pub rank: usize,
}

impl ScoredPeer {
    pub fn identity(&self) -> Option<&str> {
        self.enriched.peer.identity.as_deref()
    }
}
