//! Fan-Out Enrichment
//!
//! Runs [`PeerEnricher::enrich`] for every discovered peer with at most
//! `concurrency_limit` peers in flight. Results come back in input order.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::enrich::PeerEnricher;
use crate::types::{CreditTable, EnrichedPeer, Peer};

/// Default number of peers enriched concurrently
pub const DEFAULT_CONCURRENCY: usize = 50;

/// Bounded fan-out over a shared enricher
pub struct FanOutScheduler {
    enricher: Arc<PeerEnricher>,
    concurrency_limit: usize,
    show_progress: bool,
    completed: Arc<AtomicUsize>,
}

impl FanOutScheduler {
    pub fn new(enricher: Arc<PeerEnricher>, concurrency_limit: usize) -> Self {
        Self {
            enricher,
            concurrency_limit: concurrency_limit.max(1),
            show_progress: false,
            completed: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Draw a progress bar on stderr while enriching
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Peers finished by the current (or last) run
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }

    fn progress_bar(&self, total: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::with_draw_target(Some(total as u64), ProgressDrawTarget::stderr());
        bar.set_style(
            ProgressStyle::with_template("{spinner} [{elapsed_precise}] {bar:40} {pos}/{len} nodes")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar
    }

    /// Enrich every peer. Output position `i` belongs to input position `i`.
    pub async fn enrich_all(&self, peers: Vec<Peer>, credits: Arc<CreditTable>) -> Vec<EnrichedPeer> {
        let total = peers.len();
        info!("🚀 Enriching {} nodes ({} concurrent)", total, self.concurrency_limit);

        self.completed.store(0, Ordering::Relaxed);
        let bar = self.progress_bar(total);
        let semaphore = Arc::new(Semaphore::new(self.concurrency_limit));
        let mut tasks = JoinSet::new();

        // Kept to rebuild a default record if a task dies
        let originals = peers.clone();

        for (index, peer) in peers.into_iter().enumerate() {
            let enricher = self.enricher.clone();
            let credits = credits.clone();
            let semaphore = semaphore.clone();

            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                (index, enricher.enrich(peer, &credits).await)
            });
        }

        let mut results: Vec<Option<EnrichedPeer>> = (0..total).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, enriched)) => results[index] = Some(enriched),
                Err(e) => warn!("Enrichment task aborted: {}", e),
            }
            self.completed.fetch_add(1, Ordering::Relaxed);
            bar.inc(1);
        }
        bar.finish_and_clear();

        let reachable = results.iter().flatten().filter(|e| e.rpc_reachable).count();
        info!("✅ Enrichment done: {}/{} nodes answered RPC", reachable, total);

        results
            .into_iter()
            .zip(originals)
            .map(|(result, peer)| {
                result.unwrap_or_else(|| {
                    let credit = peer
                        .identity
                        .as_ref()
                        .and_then(|id| credits.get(id))
                        .copied()
                        .unwrap_or(0.0);
                    EnrichedPeer::unreachable(peer, credit)
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrich::EnrichSettings;
    use crate::geo::GeoLookup;
    use crate::rpc::{rpc_url, RpcClient, METHOD_GET_STATS};
    use crate::transport::mock::MockTransport;
    use crate::transport::{CallOutcome, Transport};
    use crate::types::DEFAULT_RPC_PORT;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::time::Duration;

    fn scheduler(transport: Arc<dyn Transport>, limit: usize) -> FanOutScheduler {
        let enricher = PeerEnricher::new(
            Arc::new(RpcClient::new(transport.clone())),
            GeoLookup::new(transport, "http://geo.test", Duration::from_secs(2)),
            EnrichSettings {
                rpc_port: DEFAULT_RPC_PORT,
                rpc_timeout: Duration::from_secs(2),
                geo_delay: Duration::ZERO,
            },
        );
        FanOutScheduler::new(Arc::new(enricher), limit)
    }

    fn peers(n: usize) -> Vec<Peer> {
        (0..n)
            .map(|i| {
                Peer::new(
                    Some(format!("pk-{}", i)),
                    &format!("10.0.0.{}:6000", i),
                    "0.8.0".into(),
                    0,
                    DEFAULT_RPC_PORT,
                )
            })
            .collect()
    }

    /// Transport that tracks how many calls overlap
    #[derive(Default)]
    struct SlowTransport {
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    #[async_trait]
    impl Transport for SlowTransport {
        async fn post_json(&self, _url: &str, _body: &Value, _timeout: Duration) -> CallOutcome<Value> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            CallOutcome::Unreachable("timeout".into())
        }

        async fn get_json(&self, _url: &str, _timeout: Duration) -> CallOutcome<Value> {
            CallOutcome::Unreachable("timeout".into())
        }
    }

    #[tokio::test]
    async fn test_preserves_order_and_cardinality() {
        // Only odd peers answer, so results differ per position
        let mut mock = MockTransport::new();
        for i in (1..12).step_by(2) {
            mock = mock.on_post(
                &rpc_url(&format!("10.0.0.{}", i), 6000),
                METHOD_GET_STATS,
                json!({"result": {"uptime": 3600 * i}}),
            );
        }
        let input = peers(12);

        let output = scheduler(Arc::new(mock), 4)
            .enrich_all(input.clone(), Arc::new(CreditTable::new()))
            .await;

        assert_eq!(output.len(), input.len());
        for (i, (enriched, peer)) in output.iter().zip(&input).enumerate() {
            assert_eq!(enriched.peer.identity, peer.identity);
            assert_eq!(enriched.rpc_reachable, i % 2 == 1);
            if enriched.rpc_reachable {
                assert_eq!(enriched.stats.uptime_seconds, Some(3600 * i as u64));
            }
        }
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let transport = Arc::new(SlowTransport::default());
        let fan_out = scheduler(transport.clone(), 3);

        let output = fan_out.enrich_all(peers(20), Arc::new(CreditTable::new())).await;

        assert_eq!(output.len(), 20);
        let max_in_flight = transport.max_in_flight.load(Ordering::SeqCst);
        assert!(max_in_flight <= 3);
        // Peers really overlap
        assert!(max_in_flight > 1);
        assert_eq!(fan_out.completed(), 20);
    }

    #[tokio::test]
    async fn test_credits_reach_every_peer() {
        let mut credits = CreditTable::new();
        credits.insert("pk-1".into(), 42.0);

        let output = scheduler(Arc::new(MockTransport::new()), 2)
            .enrich_all(peers(3), Arc::new(credits))
            .await;

        assert_eq!(output[0].credits, 0.0);
        assert_eq!(output[1].credits, 42.0);
        assert!(output.iter().all(|e| !e.rpc_reachable));
    }

    #[tokio::test]
    async fn test_empty_input() {
        let output = scheduler(Arc::new(MockTransport::new()), 5)
            .enrich_all(Vec::new(), Arc::new(CreditTable::new()))
            .await;
        assert!(output.is_empty());
    }
}
