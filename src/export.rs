//! Ranked Export
//!
//! Sorts scored peers by total score, assigns 1-based ranks and writes the
//! same flat records as a JSON array and as a CSV table.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::Result;
use crate::types::ScoredPeer;

/// One output row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRecord {
    pub rank: usize,
    pub identity: Option<String>,
    pub address: String,
    pub host: String,
    pub discovery_port: u16,
    pub version: String,
    pub last_seen: u64,
    pub rpc_reachable: bool,
    pub cpu_percent: Option<f64>,
    pub ram_used: Option<u64>,
    pub ram_total: Option<u64>,
    pub uptime_seconds: Option<u64>,
    pub active_streams: Option<u64>,
    pub storage_used: Option<u64>,
    pub credits: f64,
    pub country: String,
    pub city: String,
    pub isp: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub uptime_score: f64,
    pub cpu_score: f64,
    pub version_score: f64,
    pub credit_score: f64,
    pub total_score: f64,
}

impl From<&ScoredPeer> for ExportRecord {
    fn from(s: &ScoredPeer) -> Self {
        let e = &s.enriched;
        Self {
            rank: s.rank,
            identity: e.peer.identity.clone(),
            address: e.peer.address.clone(),
            host: e.peer.host.clone(),
            discovery_port: e.peer.discovery_port,
            version: e.peer.version.clone(),
            last_seen: e.peer.last_seen,
            rpc_reachable: e.rpc_reachable,
            cpu_percent: e.stats.cpu_percent,
            ram_used: e.stats.ram_used,
            ram_total: e.stats.ram_total,
            uptime_seconds: e.stats.uptime_seconds,
            active_streams: e.stats.active_streams,
            storage_used: e.stats.storage_used,
            credits: e.credits,
            country: e.geo.country.clone(),
            city: e.geo.city.clone(),
            isp: e.geo.isp.clone(),
            latitude: e.geo.latitude,
            longitude: e.geo.longitude,
            uptime_score: s.breakdown.uptime_score,
            cpu_score: s.breakdown.cpu_score,
            version_score: s.breakdown.version_score,
            credit_score: s.breakdown.credit_score,
            total_score: s.total_score,
        }
    }
}

/// Sort by descending score and assign ranks.
///
/// The sort is stable: equal scores keep their input order.
pub fn rank(mut peers: Vec<ScoredPeer>) -> Vec<ScoredPeer> {
    peers.sort_by(|a, b| b.total_score.total_cmp(&a.total_score));
    for (i, peer) in peers.iter_mut().enumerate() {
        peer.rank = i + 1;
    }
    peers
}

/// Where the two outputs were written
#[derive(Debug, Clone)]
pub struct ExportPaths {
    pub json: PathBuf,
    pub csv: PathBuf,
}

/// Output file writer
pub struct Exporter {
    output_dir: PathBuf,
    json_file: String,
    csv_file: String,
}

impl Exporter {
    pub fn new(output_dir: impl Into<PathBuf>, json_file: &str, csv_file: &str) -> Self {
        Self {
            output_dir: output_dir.into(),
            json_file: json_file.to_string(),
            csv_file: csv_file.to_string(),
        }
    }

    /// Rank `peers` and write both outputs
    pub fn export(&self, peers: Vec<ScoredPeer>) -> Result<(Vec<ScoredPeer>, ExportPaths)> {
        let ranked = rank(peers);
        let records: Vec<ExportRecord> = ranked.iter().map(ExportRecord::from).collect();

        std::fs::create_dir_all(&self.output_dir)?;
        let paths = ExportPaths {
            json: self.output_dir.join(&self.json_file),
            csv: self.output_dir.join(&self.csv_file),
        };

        write_json(&paths.json, &records)?;
        info!("💾 Saved {} records to {:?}", records.len(), paths.json);

        write_csv(&paths.csv, &records)?;
        info!("💾 Saved {} records to {:?}", records.len(), paths.csv);

        Ok((ranked, paths))
    }
}

/// Write records as a pretty-printed JSON array
pub fn write_json(path: &Path, records: &[ExportRecord]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, records)?;
    writer.flush()?;
    Ok(())
}

/// Write records as CSV with a header row
pub fn write_csv(path: &Path, records: &[ExportRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EnrichedPeer, Peer, ScoreBreakdown, DEFAULT_RPC_PORT};

    fn scored(id: &str, total: f64) -> ScoredPeer {
        let peer = Peer::new(Some(id.into()), "1.2.3.4:9001", "0.8.0".into(), 5, DEFAULT_RPC_PORT);
        ScoredPeer {
            enriched: EnrichedPeer::unreachable(peer, 0.0),
            breakdown: ScoreBreakdown::default(),
            total_score: total,
            rank: 0,
        }
    }

    #[test]
    fn test_rank_is_stable_on_ties() {
        let ranked = rank(vec![scored("a", 50.0), scored("b", 90.0), scored("c", 90.0)]);

        let order: Vec<_> = ranked.iter().map(|p| (p.identity().unwrap(), p.rank)).collect();
        assert_eq!(order, vec![("b", 1), ("c", 2), ("a", 3)]);
    }

    #[test]
    fn test_rank_by_input_position() {
        let input = vec![scored("a", 50.0), scored("b", 90.0), scored("c", 90.0)];
        let ranked = rank(input.clone());

        let ranks: Vec<usize> = input
            .iter()
            .map(|p| ranked.iter().find(|r| r.identity() == p.identity()).unwrap().rank)
            .collect();
        assert_eq!(ranks, vec![3, 1, 2]);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_write_failure_surfaces_as_error() {
        // Every write to /dev/full fails with ENOSPC
        let full = Path::new("/dev/full");
        if !full.exists() {
            return;
        }
        let records = vec![ExportRecord::from(&scored("a", 1.0))];

        assert!(matches!(write_json(full, &records), Err(crate::error::IndexerError::Io(_))));
        assert!(write_csv(full, &records).is_err());
    }

    #[test]
    fn test_writes_equivalent_json_and_csv() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = Exporter::new(dir.path().join("out"), "pnodes.json", "pnodes.csv");

        let (ranked, paths) = exporter
            .export(vec![scored("low", 10.0), scored("high", 70.5)])
            .unwrap();
        assert_eq!(ranked[0].identity(), Some("high"));

        let from_json: Vec<ExportRecord> =
            serde_json::from_reader(File::open(&paths.json).unwrap()).unwrap();

        let mut reader = csv::Reader::from_path(&paths.csv).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(&headers[0], "rank");
        assert_eq!(&headers[headers.len() - 1], "total_score");
        let from_csv: Vec<ExportRecord> = reader.deserialize().map(|r| r.unwrap()).collect();

        assert_eq!(from_json, from_csv);
        assert_eq!(from_json.len(), 2);
        assert_eq!(from_json[0].rank, 1);
        assert_eq!(from_json[0].total_score, 70.5);
        assert_eq!(from_json[1].identity.as_deref(), Some("low"));
        assert_eq!(from_json[1].cpu_percent, None);
    }
}
