//! Peer Scoring System
//!
//! Rates each enriched peer with a composite reputation score.
//! Scores range from 0-100, with higher scores indicating better peers.
//!
//! ## Components
//!
//! | Component | Weight | Source                                   |
//! |-----------|--------|------------------------------------------|
//! | Uptime    | 40%    | hours of uptime, capped at 100           |
//! | Credits   | 30%    | credits / 100, capped at 100             |
//! | Version   | 20%    | 100 on the reference version, 50 if older or newer, 0 if unknown |
//! | CPU       | 10%    | 100 - cpu%                               |
//!
//! Uptime and CPU only count for peers that answered RPC.

use crate::types::{EnrichedPeer, ScoreBreakdown, ScoredPeer};
use crate::version::is_unknown;

/// Highest component or total score
pub const MAX_SCORE: f64 = 100.0;

/// Lowest component or total score
pub const MIN_SCORE: f64 = 0.0;

/// Reference version when no peer reports one
pub const FALLBACK_REFERENCE_VERSION: &str = "0.0.0";

/// Composite weights (sum to 1.0)
pub mod weights {
    pub const UPTIME: f64 = 0.4;
    pub const CREDITS: f64 = 0.3;
    pub const VERSION: f64 = 0.2;
    pub const CPU: f64 = 0.1;
}

/// Version score levels
pub mod version_levels {
    /// Running the reference version
    pub const MATCH: f64 = 100.0;

    /// Known version other than the reference
    pub const MISMATCH: f64 = 50.0;

    /// No version reported
    pub const UNKNOWN: f64 = 0.0;
}

const SECS_PER_HOUR: f64 = 3600.0;

/// Credits worth one score point
const CREDITS_PER_POINT: f64 = 100.0;

/// Clamp score to valid range (NaN counts as the minimum)
pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        return MIN_SCORE;
    }
    score.max(MIN_SCORE).min(MAX_SCORE)
}

/// Round to two decimals
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Most common known version; on ties the one seen first wins
pub fn reference_version(peers: &[EnrichedPeer]) -> String {
    let mut counts: Vec<(&str, usize)> = Vec::new();

    for version in peers.iter().map(|p| p.peer.version.as_str()) {
        if is_unknown(version) {
            continue;
        }
        match counts.iter_mut().find(|(v, _)| *v == version) {
            Some((_, n)) => *n += 1,
            None => counts.push((version, 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (version, n) in counts {
        if best.map_or(true, |(_, top)| n > top) {
            best = Some((version, n));
        }
    }

    best.map(|(v, _)| v.to_string())
        .unwrap_or_else(|| FALLBACK_REFERENCE_VERSION.to_string())
}

/// Component scores of one peer against `reference`
pub fn breakdown(peer: &EnrichedPeer, reference: &str) -> ScoreBreakdown {
    let (uptime_score, cpu_score) = if peer.rpc_reachable {
        let hours = peer.stats.uptime_seconds.unwrap_or(0) as f64 / SECS_PER_HOUR;
        let cpu = peer.stats.cpu_percent.unwrap_or(0.0);
        (clamp_score(hours), clamp_score(MAX_SCORE - cpu))
    } else {
        (MIN_SCORE, MIN_SCORE)
    };

    let version = peer.peer.version.as_str();
    let version_score = if is_unknown(version) {
        version_levels::UNKNOWN
    } else if version == reference {
        version_levels::MATCH
    } else {
        version_levels::MISMATCH
    };

    let credit_score = clamp_score(peer.credits / CREDITS_PER_POINT);

    ScoreBreakdown {
        uptime_score,
        cpu_score,
        version_score,
        credit_score,
    }
}

/// Weighted composite, rounded to two decimals
pub fn composite(b: &ScoreBreakdown) -> f64 {
    let total = weights::UPTIME * b.uptime_score
        + weights::CREDITS * b.credit_score
        + weights::VERSION * b.version_score
        + weights::CPU * b.cpu_score;
    round2(clamp_score(total))
}

/// Score every peer against the network's reference version.
///
/// Input order is preserved; ranking happens at export.
pub fn score(peers: Vec<EnrichedPeer>) -> (String, Vec<ScoredPeer>) {
    let reference = reference_version(&peers);

    let scored = peers
        .into_iter()
        .map(|enriched| {
            let breakdown = breakdown(&enriched, &reference);
            ScoredPeer {
                total_score: composite(&breakdown),
                breakdown,
                enriched,
                rank: 0,
            }
        })
        .collect();

    (reference, scored)
}
