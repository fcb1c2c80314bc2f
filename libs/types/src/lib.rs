//! Types library for the market board aggregator
//!
//! Shared data model for crowd-submitted market board uploads and the
//! read records served back to clients.
//!
//! # Modules
//! - `ids`: World, item and hashed identifiers
//! - `world`: Reference world rows and retainer cities
//! - `market`: Listings, sale history, snapshots and price stats
//! - `content`: Content identities (hashed id -> display name)
//! - `source`: Trusted sources and blacklist rows
//! - `stats`: Upload activity rows
//! - `errors`: Validation errors

pub mod content;
pub mod errors;
pub mod ids;
pub mod market;
pub mod source;
pub mod stats;
pub mod world;

pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::content::*;
    pub use crate::errors::*;
    pub use crate::ids::*;
    pub use crate::market::*;
    pub use crate::source::*;
    pub use crate::stats::*;
    pub use crate::world::*;
}
