//! pNode JSON-RPC client
//!
//! pNodes expose a JSON-RPC 2.0 endpoint at `http://<host>:<port>/rpc`.
//! The indexer uses two methods: `get-pods` (gossip peer list) and
//! `get-stats` (resource figures of the answering node).

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::transport::{json_number, CallOutcome, Transport};
use crate::types::NodeStats;

/// Gossip peer list method
pub const METHOD_GET_PODS: &str = "get-pods";

/// Node resource stats method
pub const METHOD_GET_STATS: &str = "get-stats";

/// JSON-RPC request
#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    id: u64,
}

/// JSON-RPC response
#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

/// JSON-RPC error
#[derive(Debug, Deserialize)]
struct JsonRpcError {
    #[serde(default)]
    message: String,
}

/// `get-pods` result
#[derive(Debug, Clone, Deserialize)]
pub struct PodsResult {
    /// Object entries of the list; non-object entries are dropped
    #[serde(deserialize_with = "lenient_pods")]
    pub pods: Vec<GossipPod>,
}

/// One entry of the gossip peer list.
///
/// Fields are read one by one: a field of the wrong type is absent
/// instead of invalidating the entry (or the list).
#[derive(Debug, Clone, Default)]
pub struct GossipPod {
    pub address: Option<String>,
    pub pubkey: Option<String>,
    pub version: Option<String>,
    pub last_seen_timestamp: Option<u64>,
}

impl GossipPod {
    fn from_value(value: &Value) -> Option<Self> {
        let fields = value.as_object()?;
        let text = |key: &str| fields.get(key).and_then(Value::as_str).map(str::to_string);

        Some(Self {
            address: text("address"),
            pubkey: text("pubkey"),
            version: text("version"),
            last_seen_timestamp: fields
                .get("last_seen_timestamp")
                .and_then(json_number)
                .filter(|t| *t >= 0.0)
                .map(|t| t as u64),
        })
    }
}

fn lenient_pods<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<GossipPod>, D::Error> {
    let raw = Vec::<Value>::deserialize(deserializer)?;
    Ok(raw.iter().filter_map(GossipPod::from_value).collect())
}

/// `get-stats` result. Counters may arrive as numbers or numeric strings;
/// anything else reads as absent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StatsResult {
    #[serde(deserialize_with = "lenient_number")]
    pub cpu_percent: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub ram_used: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub ram_total: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub uptime: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub active_streams: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub file_size: Option<f64>,
}

fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(json_number(&Value::deserialize(deserializer)?))
}

impl From<StatsResult> for NodeStats {
    fn from(stats: StatsResult) -> Self {
        Self {
            cpu_percent: stats.cpu_percent,
            ram_used: stats.ram_used.map(as_count),
            ram_total: stats.ram_total.map(as_count),
            uptime_seconds: stats.uptime.map(as_count),
            active_streams: stats.active_streams.map(as_count),
            storage_used: stats.file_size.map(as_count),
        }
    }
}

/// Nodes report counters as JSON numbers that may carry a fraction
fn as_count(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value as u64
    } else {
        0
    }
}

/// RPC endpoint of a node
pub fn rpc_url(host: &str, port: u16) -> String {
    format!("http://{}:{}/rpc", host, port)
}

/// JSON-RPC client over a shared [`Transport`]
pub struct RpcClient {
    transport: Arc<dyn Transport>,
    request_id: AtomicU64,
}

impl RpcClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            request_id: AtomicU64::new(1),
        }
    }

    fn next_id(&self) -> u64 {
        self.request_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Make a JSON-RPC call and decode its `result`
    pub async fn call<T: DeserializeOwned>(
        &self,
        url: &str,
        method: &str,
        timeout: Duration,
    ) -> CallOutcome<T> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method,
            id: self.next_id(),
        };
        let body = match serde_json::to_value(&request) {
            Ok(b) => b,
            Err(e) => return CallOutcome::Malformed(format!("Encode error: {}", e)),
        };

        self.transport
            .post_json(url, &body, timeout)
            .await
            .and_then(decode_result)
    }

    /// Fetch the gossip peer list from `host:port`
    pub async fn get_pods(&self, host: &str, port: u16, timeout: Duration) -> CallOutcome<PodsResult> {
        self.call(&rpc_url(host, port), METHOD_GET_PODS, timeout).await
    }

    /// Fetch resource stats from `host:port`.
    ///
    /// Any non-null `result` counts as an answer; fields it lacks stay absent.
    pub async fn get_stats(&self, host: &str, port: u16, timeout: Duration) -> CallOutcome<StatsResult> {
        self.call::<Value>(&rpc_url(host, port), METHOD_GET_STATS, timeout)
            .await
            .and_then(|result| CallOutcome::Success(serde_json::from_value(result).unwrap_or_default()))
    }
}

fn decode_result<T: DeserializeOwned>(body: serde_json::Value) -> CallOutcome<T> {
    let response: JsonRpcResponse = match serde_json::from_value(body) {
        Ok(r) => r,
        Err(e) => return CallOutcome::Malformed(format!("Parse error: {}", e)),
    };

    if let Some(error) = response.error {
        return CallOutcome::Malformed(format!("RPC error: {}", error.message));
    }

    match response.result {
        Some(result) => serde_json::from_value(result)
            .map(CallOutcome::Success)
            .unwrap_or_else(|e| CallOutcome::Malformed(format!("Unexpected result: {}", e))),
        None => CallOutcome::Malformed("Empty response".to_string()),
    }
}
