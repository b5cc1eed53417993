//! Spatial partitioning: a fixed-size grid over a bounded world, used for
//! broad-phase collision detection and proximity queries.
//!
//! # Invariants
//! - A key sits in exactly the buckets its rect intersects, and no others.
//! - The hash never owns objects; it resolves keys through an
//!   [`ObjectSource`] and skips keys that no longer resolve.
//! - Grid geometry is fixed at construction; resize by building a new hash.

mod hash;
mod source;

pub use hash::{CellId, SpatialHash};
pub use source::ObjectSource;

pub fn crate_info() -> &'static str {
    "scrollkit-spatial v0.1.0"
}
