use std::sync::Arc;

use glam::{IVec2, Vec2};
use scrollkit_common::{Rect, Result};
use scrollkit_kernel::{Body, World};
use scrollkit_render::{Image, ObjectLayer, Rgba, Sprite, TileMap};
use scrollkit_stream::{LoadError, MapLoader};

/// Deterministic 64-bit generator for reproducible scenes.
pub struct SplitMix64(u64);

impl SplitMix64 {
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    pub fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }

    /// Uniform in `0.0..1.0`.
    pub fn next_f32(&mut self) -> f32 {
        (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32
    }

    pub fn range(&mut self, lo: f32, hi: f32) -> f32 {
        lo + (hi - lo) * self.next_f32()
    }
}

/// Scatter `count` bodies inside `bounds`, alternating circles and boxes.
pub fn scatter_bodies(world: &mut World, bounds: Rect, count: usize, max_size: f32, seed: u64) {
    let mut rng = SplitMix64::new(seed);
    for i in 0..count {
        let size = rng.range(max_size * 0.25, max_size);
        let center = Vec2::new(
            rng.range(bounds.left() + size, bounds.right() - size),
            rng.range(bounds.top() + size, bounds.bottom() - size),
        );
        let body = if i % 2 == 0 {
            Body::circle(center, size * 0.5)
        } else {
            Body::boxed(Rect::from_center(center, Vec2::splat(size)))
        };
        world.spawn(body);
    }
}

/// A `cols` x `rows` checkerboard of `tile`-sized ground sprites starting at
/// `origin`, plus a sparse prop layer.
pub fn checker_map(origin: Vec2, cols: u32, rows: u32, tile: f32, tint: Rgba) -> Result<TileMap> {
    let side = tile.max(1.0) as u32;
    let light = Arc::new(Image::filled(side, side, tint));
    let dark = Arc::new(Image::filled(side, side, shade(tint)));
    let ground = ObjectLayer::tiled("ground", origin, tile, cols, rows, |c, r| {
        Some(if (c + r) % 2 == 0 { light.clone() } else { dark.clone() })
    })?;

    let bounds = Rect::from_min_size(origin, Vec2::new(cols as f32, rows as f32) * tile);
    let mut props = ObjectLayer::new("props", bounds, tile * 4.0)?;
    let marker = Arc::new(Image::filled(side / 4 + 1, side / 4 + 1, [230, 200, 40, 255]));
    for r in (0..rows).step_by(7) {
        for c in (0..cols).step_by(5) {
            let at = origin + Vec2::new(c as f32 + 0.4, r as f32 + 0.4) * tile;
            props.push(Sprite::new(Rect::from_min_size(at, Vec2::splat(tile * 0.25)), marker.clone()));
        }
    }

    let mut map = TileMap::new(bounds);
    map.add_layer(ground);
    map.add_layer(props);
    Ok(map)
}

fn shade(c: Rgba) -> Rgba {
    [c[0] / 2, c[1] / 2, c[2] / 2, c[3]]
}

/// Builds a checkerboard map for each region, tinted by its offset.
pub struct CheckerLoader {
    pub region_size: Vec2,
    pub tile: f32,
    pub loads: usize,
}

impl MapLoader<TileMap> for CheckerLoader {
    fn load(&mut self, name: &str, offset: IVec2) -> std::result::Result<TileMap, LoadError> {
        let origin = offset.as_vec2() * self.region_size;
        let cols = (self.region_size.x / self.tile).ceil() as u32;
        let rows = (self.region_size.y / self.tile).ceil() as u32;
        let tint = [
            (64 + offset.x.rem_euclid(4) * 48) as u8,
            (64 + offset.y.rem_euclid(4) * 48) as u8,
            160,
            255,
        ];
        let map = checker_map(origin, cols, rows, self.tile, tint)?;
        self.loads += 1;
        tracing::debug!(name, ?offset, "built region map");
        Ok(map)
    }
}
