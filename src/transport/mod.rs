//! HTTP Transport
//!
//! Every external call the indexer makes is a JSON POST or GET with a
//! per-request timeout. Components receive the transport as an
//! `Arc<dyn Transport>` so tests can substitute a scripted one.
//!
//! Calls never fail outward. Each returns a [`CallOutcome`] and the caller
//! decides which default to fall back to.

mod http;
#[cfg(test)]
pub mod mock;

pub use http::HttpTransport;

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// Result of a single external call
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutcome<T> {
    /// Status 200 and a body of the expected shape
    Success(T),

    /// Connection error, timeout or non-200 status
    Unreachable(String),

    /// Reached the service but the body was not what we expected
    Malformed(String),
}

impl<T> CallOutcome<T> {
    pub fn success(self) -> Option<T> {
        match self {
            CallOutcome::Success(v) => Some(v),
            _ => None,
        }
    }

    /// Chain a fallible decoding step onto a successful call
    pub fn and_then<U>(self, f: impl FnOnce(T) -> CallOutcome<U>) -> CallOutcome<U> {
        match self {
            CallOutcome::Success(v) => f(v),
            CallOutcome::Unreachable(e) => CallOutcome::Unreachable(e),
            CallOutcome::Malformed(e) => CallOutcome::Malformed(e),
        }
    }

    /// Failure reason, if any
    pub fn reason(&self) -> Option<&str> {
        match self {
            CallOutcome::Success(_) => None,
            CallOutcome::Unreachable(e) | CallOutcome::Malformed(e) => Some(e),
        }
    }
}

/// Read a JSON number the way pNodes and their services send them:
/// a number or a numeric string. Anything else (including non-finite
/// values) is `None`.
pub fn json_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

/// POST-JSON / GET-JSON capability.
///
/// Implementations must be safe to share across concurrent enrichment tasks.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST `body` as JSON and decode the JSON response
    async fn post_json(&self, url: &str, body: &Value, timeout: Duration) -> CallOutcome<Value>;

    /// GET and decode the JSON response
    async fn get_json(&self, url: &str, timeout: Duration) -> CallOutcome<Value>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_and_then_keeps_failure_kind() {
        let unreachable: CallOutcome<u32> = CallOutcome::Unreachable("timeout".into());
        let mapped = unreachable.and_then(|v| CallOutcome::Success(v + 1));
        assert_eq!(mapped, CallOutcome::Unreachable("timeout".into()));

        let ok: CallOutcome<u32> = CallOutcome::Success(1);
        let mapped: CallOutcome<u32> = ok.and_then(|_| CallOutcome::Malformed("no result".into()));
        assert_eq!(mapped.reason(), Some("no result"));
    }

    #[test]
    fn test_success_accessor() {
        assert_eq!(CallOutcome::Success(3).success(), Some(3));
        assert!(CallOutcome::<u32>::Malformed("x".into()).success().is_none());
    }

    #[test]
    fn test_json_number_accepts_numeric_strings() {
        use serde_json::json;

        assert_eq!(json_number(&json!(12)), Some(12.0));
        assert_eq!(json_number(&json!(1.5)), Some(1.5));
        assert_eq!(json_number(&json!(" 7200 ")), Some(7200.0));
        assert_eq!(json_number(&json!("NaN")), None);
        assert_eq!(json_number(&json!("fast")), None);
        assert_eq!(json_number(&json!(true)), None);
        assert_eq!(json_number(&json!(null)), None);
    }
}
