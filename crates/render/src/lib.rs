//! Render: the camera, the map contract a tile cache reads from, and the
//! aged tile cache itself.
//!
//! # Invariants
//! - The tile cache never mutates the map; map edits are reported through
//!   `TileCache::set_dirty`.
//! - Every tile returned by `get_tiles` carries the stamp of the current
//!   visibility recompute.
//! - A camera's world rect is always centered on its position.

pub mod camera;
pub mod context;
pub mod map;
pub mod surface;
pub mod tile_cache;

pub use camera::{Camera, CameraConfig, View};
pub use context::{ViewContext, ViewStack};
pub use map::{Drawable, MapLayer, MapSource, ObjectLayer, Sprite, TileMap};
pub use surface::{Image, Rgba, Surface, TRANSPARENT};
pub use tile_cache::{Tile, TileCache, TileCacheConfig, TileCacheStats};

pub fn crate_info() -> &'static str {
    "scrollkit-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
