//! Stream: adjacent map regions loaded around a moving focus, and frame
//! timing for the loop that drives them.
//!
//! # Invariants
//! - The history never holds more than `max_maps` regions.
//! - The current region is always loaded.
//! - Unloaded handlers report no map; they never hand out a placeholder.

mod error;
mod frame;
mod region;
mod supermap;

pub use error::{LoadError, Result, StreamError};
pub use frame::FrameTimer;
pub use region::{MapHandler, MapLoader, Region};
pub use supermap::{MapTransition, SuperMap, SuperMapConfig};

pub fn crate_info() -> &'static str {
    "scrollkit-stream v0.1.0"
}
