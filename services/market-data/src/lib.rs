//! Market Data Service
//!
//! Accepts crowd-sourced market board uploads from trusted client
//! applications and serves the aggregated result:
//! - Current listing snapshots per item and world
//! - Append-only sale history per item and world
//! - Content identities (characters, retainers) revealed by uploads
//! - Daily upload counts and a last-updated index per item
//!
//! Personal identifiers are replaced by SHA-256 digests before anything
//! is written. Sub-writes of one upload run concurrently and are not
//! transactional.
//!
//! # Architecture
//!
//! ```text
//!        Upload (api key, JSON body)
//!               │
//!         ┌─────▼──────┐
//!         │ Ingestion  │  ← authenticate, validate, anonymize
//!         └─────┬──────┘
//!               │
//!   ┌─────────┬─┴────────┬───────────┐
//!   │         │          │           │
//! ┌─▼──────┐┌─▼──────┐┌──▼──────┐┌───▼────┐
//! │Snapshot││History ││ Content ││ Stats  │
//! └─┬──────┘└─┬──────┘└──┬──────┘└───┬────┘
//!   │         │          │           │
//! ┌─▼─────────▼──────────▼───────────▼──┐
//! │     DocumentStore (with timeout)    │
//! └─────────────────┬───────────────────┘
//!                   │
//!             ┌─────▼──────┐
//!             │   Query    │  ← world / datacenter resolution
//!             └────────────┘
//! ```

pub mod blacklist;
pub mod config;
pub mod content;
pub mod context;
pub mod error;
pub mod hashing;
pub mod history;
pub mod ingestion;
pub mod query;
pub mod reference;
pub mod snapshot;
pub mod sources;
pub mod stats;
pub mod store;
pub mod upload;
pub mod validation;

pub use context::AppContext;
pub use error::{QueryError, UploadError};

// Library version
pub const SERVICE_VERSION: &str = "0.1.0";

/// Wall clock in Unix milliseconds.
pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
