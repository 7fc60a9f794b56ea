//! Network Summary
//!
//! Aggregates one run's ranked peers into network-wide figures for the
//! end-of-run report.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

use crate::scoring::round2;
use crate::types::{ScoredPeer, UNKNOWN_LOCATION};
use crate::version::is_unknown;

#[derive(Debug, Clone, Serialize)]
pub struct NetworkSummary {
    pub generated_at: DateTime<Utc>,

    pub total_peers: usize,

    /// Peers that answered `get-stats`
    pub reachable_peers: usize,

    pub reference_version: String,

    /// Known versions by peer count, most common first
    pub versions: Vec<(String, usize)>,

    /// Located peers per country
    pub countries: BTreeMap<String, usize>,

    pub total_credits: f64,

    pub average_score: f64,
}

impl NetworkSummary {
    /// Aggregate `peers`. Versions with equal counts are listed in the
    /// order they first appear in `peers`, so pass them in discovery order.
    pub fn from_peers(peers: &[ScoredPeer], reference_version: &str) -> Self {
        let mut versions: Vec<(String, usize)> = Vec::new();
        let mut countries = BTreeMap::new();

        for peer in peers {
            let version = &peer.enriched.peer.version;
            if !is_unknown(version) {
                match versions.iter_mut().find(|(v, _)| *v == *version) {
                    Some((_, n)) => *n += 1,
                    None => versions.push((version.clone(), 1)),
                }
            }

            let country = &peer.enriched.geo.country;
            if country != UNKNOWN_LOCATION {
                *countries.entry(country.clone()).or_insert(0) += 1;
            }
        }
        // Stable: equal counts stay in order of first appearance
        versions.sort_by(|a, b| b.1.cmp(&a.1));

        let average_score = if peers.is_empty() {
            0.0
        } else {
            round2(peers.iter().map(|p| p.total_score).sum::<f64>() / peers.len() as f64)
        };

        Self {
            generated_at: Utc::now(),
            total_peers: peers.len(),
            reachable_peers: peers.iter().filter(|p| p.enriched.rpc_reachable).count(),
            reference_version: reference_version.to_string(),
            versions,
            countries,
            total_credits: peers.iter().map(|p| p.enriched.credits).sum(),
            average_score,
        }
    }

    /// Log the summary
    pub fn log(&self) {
        info!(
            "📊 Network: {} nodes, {} reachable, standard version {}, avg score {:.2}",
            self.total_peers, self.reachable_peers, self.reference_version, self.average_score
        );
        for (version, count) in &self.versions {
            info!("   version {}: {} nodes", version, count);
        }
        if !self.countries.is_empty() {
            info!("   {} countries, {:.0} total credits", self.countries.len(), self.total_credits);
        }
    }
}

/// Log the best `n` ranked peers
pub fn log_top(peers: &[ScoredPeer], n: usize) {
    if n == 0 || peers.is_empty() {
        return;
    }
    info!("🏆 Top {} nodes", n.min(peers.len()));
    for p in peers.iter().take(n) {
        let e = &p.enriched;
        info!(
            "   #{:<3} {:<16} {:<14} {:<8} credits={:<8.0} rpc={:<5} score={:.2}",
            p.rank, e.peer.host, e.geo.country, e.peer.version, e.credits, e.rpc_reachable, p.total_score
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EnrichedPeer, Peer, ScoreBreakdown, DEFAULT_RPC_PORT};

    fn scored(version: &str, country: &str, reachable: bool, credits: f64, total: f64) -> ScoredPeer {
        let peer = Peer::new(None, "1.1.1.1:6000", version.into(), 0, DEFAULT_RPC_PORT);
        let mut enriched = EnrichedPeer::unreachable(peer, credits);
        enriched.rpc_reachable = reachable;
        enriched.geo.country = country.to_string();
        ScoredPeer {
            enriched,
            breakdown: ScoreBreakdown::default(),
            total_score: total,
            rank: 0,
        }
    }

    #[test]
    fn test_summary_aggregates() {
        let peers = vec![
            scored("0.7.0", "Germany", true, 100.0, 60.0),
            scored("0.8.0", "Germany", true, 50.0, 80.0),
            scored("0.8.0", UNKNOWN_LOCATION, false, 0.0, 10.0),
            scored("unknown", UNKNOWN_LOCATION, false, 0.0, 0.0),
        ];

        let summary = NetworkSummary::from_peers(&peers, "0.8.0");

        assert_eq!(summary.total_peers, 4);
        assert_eq!(summary.reachable_peers, 2);
        assert_eq!(summary.versions, vec![("0.8.0".to_string(), 2), ("0.7.0".to_string(), 1)]);
        assert_eq!(summary.countries.get("Germany"), Some(&2));
        assert_eq!(summary.countries.len(), 1);
        assert_eq!(summary.total_credits, 150.0);
        assert_eq!(summary.average_score, 37.5);
    }

    #[test]
    fn test_version_ties_follow_input_order() {
        // Lower-scored peer first, as discovered
        let peers = vec![
            scored("0.7.0", UNKNOWN_LOCATION, true, 0.0, 10.0),
            scored("0.8.0", UNKNOWN_LOCATION, true, 0.0, 90.0),
        ];

        let summary = NetworkSummary::from_peers(&peers, "0.7.0");

        assert_eq!(summary.versions, vec![("0.7.0".to_string(), 1), ("0.8.0".to_string(), 1)]);
    }

    #[test]
    fn test_empty_summary() {
        let summary = NetworkSummary::from_peers(&[], "0.0.0");
        assert_eq!(summary.total_peers, 0);
        assert_eq!(summary.average_score, 0.0);
        assert!(summary.versions.is_empty());
    }
}
