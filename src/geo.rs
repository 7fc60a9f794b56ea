//! IP Geolocation
//!
//! Looks up a host with an ip-api.com compatible service. The free tier
//! allows roughly 45 requests per minute, so callers only look up peers
//! that answered RPC and pause briefly after each successful lookup.

use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::transport::{CallOutcome, Transport};
use crate::types::{GeoInfo, UNKNOWN_LOCATION};

/// Fields requested from the service
const GEO_FIELDS: &str = "status,message,country,city,lat,lon,isp";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GeoResponse {
    status: Option<String>,
    message: Option<String>,
    country: Option<String>,
    city: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
    isp: Option<String>,
}

impl From<GeoResponse> for GeoInfo {
    fn from(r: GeoResponse) -> Self {
        let or_unknown = |v: Option<String>| v.filter(|s| !s.is_empty()).unwrap_or_else(|| UNKNOWN_LOCATION.to_string());
        Self {
            country: or_unknown(r.country),
            city: or_unknown(r.city),
            isp: or_unknown(r.isp),
            latitude: r.lat,
            longitude: r.lon,
        }
    }
}

/// Geolocation service client
pub struct GeoLookup {
    transport: Arc<dyn Transport>,
    base_url: String,
    timeout: Duration,
}

impl GeoLookup {
    pub fn new(transport: Arc<dyn Transport>, base_url: &str, timeout: Duration) -> Self {
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    /// Lookup URL for `host`
    pub fn url_for(&self, host: &str) -> String {
        format!("{}/json/{}?fields={}", self.base_url, host, GEO_FIELDS)
    }

    /// Locate `host`. Fields the service leaves out default to `Unknown` / `None`.
    pub async fn locate(&self, host: &str) -> CallOutcome<GeoInfo> {
        self.transport
            .get_json(&self.url_for(host), self.timeout)
            .await
            .and_then(|body| match serde_json::from_value::<GeoResponse>(body) {
                Ok(r) if r.status.as_deref() == Some("fail") => CallOutcome::Malformed(format!(
                    "Lookup failed: {}",
                    r.message.as_deref().unwrap_or("no reason given")
                )),
                Ok(r) => CallOutcome::Success(r.into()),
                Err(e) => CallOutcome::Malformed(format!("Unexpected geo body: {}", e)),
            })
    }
}
