//! reqwest-backed transport

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;
use std::time::Duration;

use super::{CallOutcome, Transport};

/// Shared HTTP client with connection pooling
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a transport whose pool keeps up to `max_idle_per_host`
    /// idle connections (one per concurrent worker is enough)
    pub fn new(max_idle_per_host: usize) -> anyhow::Result<Self> {
        let client = Client::builder()
            .pool_max_idle_per_host(max_idle_per_host)
            .user_agent(concat!("pnode-indexer/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    async fn send(request: RequestBuilder, timeout: Duration) -> CallOutcome<Value> {
        let response = match request.timeout(timeout).send().await {
            Ok(r) => r,
            Err(e) => return CallOutcome::Unreachable(format!("Network error: {}", e)),
        };

        if response.status() != StatusCode::OK {
            return CallOutcome::Unreachable(format!("HTTP error: {}", response.status()));
        }

        match response.json::<Value>().await {
            Ok(body) => CallOutcome::Success(body),
            // A timeout while reading the body is still a transport failure
            Err(e) if e.is_timeout() => CallOutcome::Unreachable(format!("Network error: {}", e)),
            Err(e) => CallOutcome::Malformed(format!("Parse error: {}", e)),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_json(&self, url: &str, body: &Value, timeout: Duration) -> CallOutcome<Value> {
        Self::send(self.client.post(url).json(body), timeout).await
    }

    async fn get_json(&self, url: &str, timeout: Duration) -> CallOutcome<Value> {
        Self::send(self.client.get(url), timeout).await
    }
}
