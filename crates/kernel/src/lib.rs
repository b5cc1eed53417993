//! Kernel: the body arena that collision indexes point into, the fixed-step
//! game clock, and named context snapshots.
//!
//! # Invariants
//! - Indexes never own bodies; they hold `EntityId`s that may go stale.
//! - A stale id resolves to `None`, never to another body.
//! - The clock's interpolation fraction is always within `0.0..=1.0`.

pub mod clock;
pub mod context;
pub mod world;

pub use clock::GameClock;
pub use context::{ContextSnapshot, ContextStack};
pub use world::{Body, Locate, Shape, World};

pub fn crate_info() -> &'static str {
    "scrollkit-kernel v0.1.0"
}
