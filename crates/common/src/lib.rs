//! Shared types for the scrollkit crates: world-space rectangles, anchors,
//! entity identifiers, the collision capability and the common error type.
//!
//! # Invariants
//! - World space is y-down: `top < bottom` for every non-empty rect.
//! - Rect overlap is strict; rects that only share an edge do not collide.

pub mod error;
pub mod rect;
pub mod types;

pub use error::{Error, Result};
pub use rect::{Anchor, Rect};
pub use types::{Collidable, EntityId, collides};

pub fn crate_info() -> &'static str {
    "scrollkit-common v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("common"));
    }
}
