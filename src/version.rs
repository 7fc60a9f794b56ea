//! Version Normalization
//!
//! pNodes report versions with build metadata appended
//! (`0.8.0-trynet.20251212.abcd`). Scoring compares versions by their
//! release part only.

/// Sentinel for peers that did not report a version
pub const UNKNOWN_VERSION: &str = "unknown";

/// Strip everything from the first `-` onwards.
///
/// Empty or absent input maps to [`UNKNOWN_VERSION`]. The function is
/// idempotent: normalizing an already normalized value returns it unchanged.
pub fn normalize_version(raw: Option<&str>) -> String {
    match raw {
        None | Some("") => UNKNOWN_VERSION.to_string(),
        Some(v) => match v.split('-').next() {
            Some(release) if !release.is_empty() => release.to_string(),
            _ => UNKNOWN_VERSION.to_string(),
        },
    }
}

/// Whether a normalized version is the unknown sentinel
pub fn is_unknown(version: &str) -> bool {
    version == UNKNOWN_VERSION
}
