//! pNode Indexer
//!
//! Discovers the pNodes of a Xandeum network through gossip, enriches each
//! one with health, credit and location data, scores it and exports the
//! ranked set as JSON and CSV.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      PNODE INDEXER                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Discovery Client  ──► get-pods on bootstrap hosts          │
//! │  Credit Lookup     ──► pod credits service (once)           │
//! │  Fan-Out Scheduler ──► bounded pool of Peer Enrichers       │
//! │     Peer Enricher  ──► get-stats (port fallback) + geo      │
//! │  Scorer            ──► reference version + weighted score   │
//! │  Exporter          ──► pnodes.json / pnodes.csv             │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod credits;
pub mod discovery;
pub mod enrich;
pub mod error;
pub mod export;
pub mod geo;
pub mod pipeline;
pub mod rpc;
pub mod scheduler;
pub mod scoring;
pub mod summary;
pub mod transport;
pub mod types;
pub mod version;

pub use config::{IndexerConfig, Network};
pub use error::IndexerError;
pub use pipeline::{Indexer, RunReport};
