//! Run-level errors
//!
//! Only failures that abort a run live here. Per-peer and per-source
//! failures are folded into default field values by the component that
//! sees them (see [`crate::transport::CallOutcome`]).

#[derive(Debug, thiserror::Error)]
pub enum IndexerError {
    /// No bootstrap host returned a usable peer list
    #[error("discovery unavailable: none of {hosts_tried} entry hosts returned peers")]
    DiscoveryUnavailable { hosts_tried: usize },

    #[error("export I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON export error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV export error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, IndexerError>;
