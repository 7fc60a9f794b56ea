//! Pod Credits Lookup
//!
//! Credits are earned by pNodes for serving the network and published by
//! an external service as `{"pods_credits": [{"pod_id": ..., "credits": ...}]}`.
//! They are a best-effort input: any failure yields an empty table and
//! unmapped peers score 0 credits.

use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::transport::{json_number, CallOutcome, Transport};
use crate::types::CreditTable;

#[derive(Debug, Deserialize)]
struct CreditsResponse {
    pods_credits: Vec<Value>,
}

/// Read one `{pod_id, credits}` entry.
///
/// Entries without a string `pod_id` are skipped. Missing or non-numeric
/// credits count as 0.
fn credit_entry(entry: &Value) -> Option<(String, f64)> {
    let pod_id = entry.get("pod_id").and_then(Value::as_str)?;
    let credits = entry.get("credits").and_then(json_number).unwrap_or(0.0);
    Some((pod_id.to_string(), credits))
}

/// Credit service client
pub struct CreditLookup {
    transport: Arc<dyn Transport>,
    urls: Vec<String>,
    timeout: Duration,
}

impl CreditLookup {
    pub fn new(transport: Arc<dyn Transport>, urls: Vec<String>, timeout: Duration) -> Self {
        Self {
            transport,
            urls,
            timeout,
        }
    }

    /// Fetch every configured endpoint once and merge the results.
    ///
    /// An identity listed by several endpoints keeps its largest amount.
    pub async fn fetch_credits(&self) -> CreditTable {
        info!("💰 Fetching pod credits");
        let mut table = CreditTable::new();

        for url in &self.urls {
            match self.fetch_one(url).await {
                CallOutcome::Success(entries) => {
                    let count = entries.len();
                    for (pod_id, credits) in entries {
                        let slot = table.entry(pod_id).or_insert(credits);
                        if credits > *slot {
                            *slot = credits;
                        }
                    }
                    info!("✅ Loaded credits for {} nodes from {}", count, url);
                }
                other => {
                    warn!(
                        "⚠️  Credits unavailable from {}: {}. Proceeding without them.",
                        url,
                        other.reason().unwrap_or("unknown")
                    );
                }
            }
        }

        table
    }

    async fn fetch_one(&self, url: &str) -> CallOutcome<Vec<(String, f64)>> {
        self.transport
            .get_json(url, self.timeout)
            .await
            .and_then(|body| match serde_json::from_value::<CreditsResponse>(body) {
                Ok(response) => {
                    let entries: Vec<_> = response.pods_credits.iter().filter_map(credit_entry).collect();
                    let skipped = response.pods_credits.len() - entries.len();
                    if skipped > 0 {
                        debug!("Skipped {} credit entries without a pod id", skipped);
                    }
                    CallOutcome::Success(entries)
                }
                Err(e) => CallOutcome::Malformed(format!("Unexpected credits body: {}", e)),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockTransport;
    use serde_json::json;

    const URL_A: &str = "https://credits.test/api/pods-credits";
    const URL_B: &str = "https://credits.test/api/mainnet-pod-credits";

    fn lookup(mock: MockTransport, urls: &[&str]) -> CreditLookup {
        CreditLookup::new(
            Arc::new(mock),
            urls.iter().map(|u| u.to_string()).collect(),
            Duration::from_secs(10),
        )
    }

    #[tokio::test]
    async fn test_builds_identity_table() {
        let mock = MockTransport::new().on_get(
            URL_A,
            json!({"pods_credits": [
                {"pod_id": "A", "credits": 1500},
                {"pod_id": "B"},
                {"credits": 99}
            ]}),
        );

        let table = lookup(mock, &[URL_A]).fetch_credits().await;

        assert_eq!(table.len(), 2);
        assert_eq!(table["A"], 1500.0);
        assert_eq!(table["B"], 0.0);
    }

    #[tokio::test]
    async fn test_bad_entries_are_skipped_individually() {
        let mock = MockTransport::new().on_get(
            URL_A,
            json!({"pods_credits": [
                {"pod_id": "A", "credits": "1200"},
                {"pod_id": 17, "credits": 500},
                {"pod_id": "B", "credits": {"total": 3}},
                "C",
                {"pod_id": "D", "credits": 80.5}
            ]}),
        );

        let table = lookup(mock, &[URL_A]).fetch_credits().await;

        assert_eq!(table.len(), 3);
        assert_eq!(table["A"], 1200.0);
        assert_eq!(table["B"], 0.0);
        assert_eq!(table["D"], 80.5);
    }

    #[tokio::test]
    async fn test_failure_yields_empty_table() {
        let mock = MockTransport::new().on_get_outcome(URL_A, CallOutcome::Unreachable("HTTP error: 503".into()));
        assert!(lookup(mock, &[URL_A]).fetch_credits().await.is_empty());

        let mock = MockTransport::new().on_get(URL_A, json!({"credits": "nope"}));
        assert!(lookup(mock, &[URL_A]).fetch_credits().await.is_empty());
    }

    #[tokio::test]
    async fn test_multiple_sources_keep_largest() {
        let mock = MockTransport::new()
            .on_get(URL_A, json!({"pods_credits": [{"pod_id": "A", "credits": 10}, {"pod_id": "B", "credits": 70}]}))
            .on_get(URL_B, json!({"pods_credits": [{"pod_id": "A", "credits": 40}, {"pod_id": "B", "credits": 5}]}));

        let table = lookup(mock, &[URL_A, URL_B]).fetch_credits().await;

        assert_eq!(table["A"], 40.0);
        assert_eq!(table["B"], 70.0);
    }

    #[tokio::test]
    async fn test_one_call_per_endpoint() {
        let mock = Arc::new(MockTransport::new());
        let credits = CreditLookup::new(mock.clone(), vec![URL_A.to_string()], Duration::from_secs(10));
        credits.fetch_credits().await;
        assert_eq!(mock.calls(), vec![format!("GET {}", URL_A)]);
    }
}
