//! Indexing Run
//!
//! ```text
//! Discovery ──► Credits ──► Fan-Out Enrichment ──► Scoring ──► Export
//!  (fatal)     (best effort)  (per-peer best effort)
//! ```
//!
//! Only discovery can abort a run. Every later stage degrades to defaults,
//! so a run that gets past discovery always exports every discovered peer.

use std::sync::Arc;
use tracing::info;

use crate::config::IndexerConfig;
use crate::credits::CreditLookup;
use crate::discovery::DiscoveryClient;
use crate::enrich::{EnrichSettings, PeerEnricher};
use crate::error::Result;
use crate::export::{ExportPaths, Exporter};
use crate::geo::GeoLookup;
use crate::rpc::RpcClient;
use crate::scheduler::FanOutScheduler;
use crate::scoring;
use crate::summary::NetworkSummary;
use crate::transport::Transport;
use crate::types::ScoredPeer;

/// Outcome of a completed run
#[derive(Debug)]
pub struct RunReport {
    /// Peers in rank order
    pub ranked: Vec<ScoredPeer>,
    pub summary: NetworkSummary,
    pub paths: ExportPaths,
}

/// Wires the components of one run around a shared transport
pub struct Indexer {
    config: Arc<IndexerConfig>,
    discovery: DiscoveryClient,
    credits: CreditLookup,
    scheduler: FanOutScheduler,
    exporter: Exporter,
}

impl Indexer {
    pub fn new(config: Arc<IndexerConfig>, transport: Arc<dyn Transport>) -> Self {
        let rpc = Arc::new(RpcClient::new(transport.clone()));

        let discovery = DiscoveryClient::new(rpc.clone(), config.rpc_port, config.discovery_timeout());

        let credits = CreditLookup::new(
            transport.clone(),
            config.resolved_credits_urls(),
            config.credits_timeout(),
        );

        let enricher = PeerEnricher::new(
            rpc,
            GeoLookup::new(transport, &config.geo_base_url, config.geo_timeout()),
            EnrichSettings {
                rpc_port: config.rpc_port,
                rpc_timeout: config.rpc_timeout(),
                geo_delay: config.geo_delay(),
            },
        );
        let scheduler = FanOutScheduler::new(Arc::new(enricher), config.concurrency_limit);

        let exporter = Exporter::new(config.output_dir.clone(), &config.json_file, &config.csv_file);

        Self {
            config,
            discovery,
            credits,
            scheduler,
            exporter,
        }
    }

    /// Draw a progress bar during enrichment
    pub fn with_progress(mut self, show: bool) -> Self {
        self.scheduler = self.scheduler.with_progress(show);
        self
    }

    /// Discover, enrich, score and export
    pub async fn run(&self) -> Result<RunReport> {
        let peers = self.discovery.discover(&self.config.resolved_entry_hosts()).await?;

        let credits = Arc::new(self.credits.fetch_credits().await);

        let enriched = self.scheduler.enrich_all(peers, credits).await;

        info!("📊 Calculating scores");
        let (reference, scored) = scoring::score(enriched);
        info!("ℹ️  Network standard version: {}", reference);

        // Summarized before ranking so version ties follow discovery order
        let summary = NetworkSummary::from_peers(&scored, &reference);
        let (ranked, paths) = self.exporter.export(scored)?;

        Ok(RunReport {
            ranked,
            summary,
            paths,
        })
    }
}
