//! Scripted transport for tests
//!
//! Routes are keyed by `"POST <url> <rpc-method>"` or `"GET <url>"`.
//! Unrouted calls are unreachable. Every call is recorded in order.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use super::{CallOutcome, Transport};

#[derive(Default)]
pub struct MockTransport {
    routes: HashMap<String, CallOutcome<Value>>,
    calls: Mutex<Vec<String>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn post_key(url: &str, rpc_method: &str) -> String {
        format!("POST {} {}", url, rpc_method)
    }

    fn get_key(url: &str) -> String {
        format!("GET {}", url)
    }

    /// Answer a JSON-RPC POST with `body`
    pub fn on_post(self, url: &str, rpc_method: &str, body: Value) -> Self {
        self.on_post_outcome(url, rpc_method, CallOutcome::Success(body))
    }

    pub fn on_post_outcome(mut self, url: &str, rpc_method: &str, outcome: CallOutcome<Value>) -> Self {
        self.routes.insert(Self::post_key(url, rpc_method), outcome);
        self
    }

    /// Answer a GET with `body`
    pub fn on_get(self, url: &str, body: Value) -> Self {
        self.on_get_outcome(url, CallOutcome::Success(body))
    }

    pub fn on_get_outcome(mut self, url: &str, outcome: CallOutcome<Value>) -> Self {
        self.routes.insert(Self::get_key(url), outcome);
        self
    }

    /// Every call made so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls whose key contains `needle`
    pub fn count_calls(&self, needle: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| c.contains(needle)).count()
    }

    fn answer(&self, key: String) -> CallOutcome<Value> {
        let outcome = self
            .routes
            .get(&key)
            .cloned()
            .unwrap_or_else(|| CallOutcome::Unreachable("connection refused".into()));
        self.calls.lock().unwrap().push(key);
        outcome
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn post_json(&self, url: &str, body: &Value, _timeout: Duration) -> CallOutcome<Value> {
        let method = body.get("method").and_then(Value::as_str).unwrap_or_default();
        self.answer(Self::post_key(url, method))
    }

    async fn get_json(&self, url: &str, _timeout: Duration) -> CallOutcome<Value> {
        self.answer(Self::get_key(url))
    }
}
