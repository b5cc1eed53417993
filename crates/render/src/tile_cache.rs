use std::collections::HashMap;
use std::collections::hash_map::Entry;

use glam::{IVec2, Vec2};
use scrollkit_common::{Anchor, Error, Rect, Result};
use serde::{Deserialize, Serialize};

use crate::camera::Camera;
use crate::surface::{Image, Surface};
use crate::map::{Drawable, MapLayer, MapSource};

/// Maximum tiles examined by one aging pass.
pub const DEFAULT_AGE_THROTTLE: usize = 30;

/// Tile cache tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileCacheConfig {
    /// Edge length of a cached tile in world units.
    pub tile_size: i32,
    /// Recomputes a tile may go unseen before it is evicted.
    pub lifespan: u64,
    /// Largest per-tick viewport displacement; the covered area extends this
    /// far past every edge of the view. Too small and a gap shows at the
    /// trailing edge while scrolling.
    pub max_scroll_speed: f32,
    /// Tiles examined per aging pass.
    pub age_throttle: usize,
}

impl Default for TileCacheConfig {
    fn default() -> Self {
        Self {
            tile_size: 128,
            lifespan: 60,
            max_scroll_speed: 10.0,
            age_throttle: DEFAULT_AGE_THROTTLE,
        }
    }
}

impl TileCacheConfig {
    pub fn validate(&self) -> Result<()> {
        if self.tile_size <= 0 {
            return Err(Error::invalid(format!(
                "tile_size must be positive, got {}",
                self.tile_size
            )));
        }
        validate_scroll_speed(self.max_scroll_speed)?;
        if self.age_throttle == 0 {
            return Err(Error::invalid("age_throttle must be at least 1"));
        }
        Ok(())
    }
}

fn validate_scroll_speed(speed: f32) -> Result<()> {
    if speed.is_finite() && speed >= 0.0 {
        Ok(())
    } else {
        Err(Error::invalid(format!(
            "max_scroll_speed must be finite and non-negative, got {speed}"
        )))
    }
}

/// A composited snapshot of the map over one grid square.
#[derive(Debug, Clone)]
pub struct Tile {
    /// Grid-aligned world coordinate of the top-left corner.
    pub index: IVec2,
    /// Unique per composite; a recreated tile gets a new serial.
    pub serial: u64,
    pub image: Image,
    pub rect: Rect,
    /// Stamp of the last recompute that found this tile visible.
    pub stamp: u64,
}

/// Counters from the most recent visibility recompute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TileCacheStats {
    pub stamp: u64,
    pub created: usize,
    pub aged_out: usize,
    /// Tiles evicted by `set_dirty` since the previous recompute.
    pub dirty_evicted: usize,
    pub visible: usize,
    pub live: usize,
}

/// Bounded cache of composited map tiles following a moving view.
///
/// Tiles are created on first need and never recomposited; map changes must
/// be reported through [`TileCache::set_dirty`]. Unused tiles age out a few
/// at a time so a large cache never costs more than `age_throttle` checks
/// per recompute.
#[derive(Debug)]
pub struct TileCache<M> {
    map: M,
    config: TileCacheConfig,
    view_rect: Rect,
    tiles: HashMap<IVec2, Tile>,
    visible: Vec<IVec2>,
    fresh: bool,
    age_queue: Vec<IVec2>,
    stamp: u64,
    next_serial: u64,
    dirty_rects: Vec<Rect>,
    pending_dirty: usize,
    stats: TileCacheStats,
}

impl<M: MapSource> TileCache<M> {
    /// Create a cache over `map` for a view of `view_size` world units,
    /// initially anchored at the map's top-left corner.
    pub fn new(map: M, view_size: Vec2, config: TileCacheConfig) -> Result<Self> {
        config.validate()?;
        validate_view_size(view_size)?;
        let view_rect = Rect::from_min_size(map.rect().topleft(), view_size);
        Ok(Self {
            map,
            config,
            view_rect,
            tiles: HashMap::new(),
            visible: Vec::new(),
            fresh: false,
            age_queue: Vec::new(),
            stamp: 0,
            next_serial: 0,
            dirty_rects: Vec::new(),
            pending_dirty: 0,
            stats: TileCacheStats::default(),
        })
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    /// Mutable map access. Cached tiles are not updated; call
    /// [`TileCache::set_dirty`] for every area changed.
    pub fn map_mut(&mut self) -> &mut M {
        &mut self.map
    }

    pub fn config(&self) -> &TileCacheConfig {
        &self.config
    }

    /// The camera-aligned rect the cache keeps covered.
    pub fn view_rect(&self) -> Rect {
        self.view_rect
    }

    /// `view_rect` grown by `max_scroll_speed` on every side.
    pub fn inflated_rect(&self) -> Rect {
        let margin = self.config.max_scroll_speed * 2.0;
        self.view_rect.inflate(margin, margin)
    }

    pub fn stamp(&self) -> u64 {
        self.stamp
    }

    pub fn stats(&self) -> &TileCacheStats {
        &self.stats
    }

    /// Number of cached tiles.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn tile(&self, index: IVec2) -> Option<&Tile> {
        self.tiles.get(&index)
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.values()
    }

    /// Move the view so that `anchor` lands on `pos`. The visible set is
    /// recomputed by the next [`TileCache::get_tiles`].
    pub fn set_rect(&mut self, anchor: Anchor, pos: Vec2) {
        self.view_rect = self.view_rect.with_anchor(anchor, pos);
        self.visible.clear();
        self.fresh = false;
    }

    /// [`TileCache::set_rect`] with the anchor given by name, e.g. `"center"`.
    pub fn set_rect_named(&mut self, anchor: &str, pos: Vec2) -> Result<()> {
        let anchor: Anchor = anchor.parse()?;
        self.set_rect(anchor, pos);
        Ok(())
    }

    /// Change the view size, keeping its center.
    pub fn resize(&mut self, view_size: Vec2) -> Result<()> {
        validate_view_size(view_size)?;
        self.view_rect = Rect::from_center(self.view_rect.center(), view_size);
        self.visible.clear();
        self.fresh = false;
        Ok(())
    }

    /// Change the tile size. Every cached tile is discarded.
    pub fn set_tile_size(&mut self, tile_size: i32) -> Result<()> {
        if tile_size <= 0 {
            return Err(Error::invalid(format!(
                "tile_size must be positive, got {tile_size}"
            )));
        }
        if tile_size != self.config.tile_size {
            self.config.tile_size = tile_size;
            self.clear();
        }
        Ok(())
    }

    pub fn set_lifespan(&mut self, lifespan: u64) {
        self.config.lifespan = lifespan;
    }

    pub fn set_max_scroll_speed(&mut self, speed: f32) -> Result<()> {
        validate_scroll_speed(speed)?;
        self.config.max_scroll_speed = speed;
        self.visible.clear();
        self.fresh = false;
        Ok(())
    }

    /// Discard every cached tile.
    pub fn clear(&mut self) {
        self.tiles.clear();
        self.age_queue.clear();
        self.visible.clear();
        self.fresh = false;
    }

    /// Tiles covering the inflated view, creating any that are missing.
    ///
    /// The first call after [`TileCache::set_rect`] advances the stamp, runs
    /// one aging pass and stamps every covering tile. Later calls reuse that
    /// visible set, only recreating tiles evicted by `set_dirty` meanwhile.
    pub fn get_tiles(&mut self) -> Vec<&Tile> {
        if self.fresh {
            self.restore_evicted();
        } else {
            self.recompute();
        }
        self.visible
            .iter()
            .filter_map(|index| self.tiles.get(index))
            .collect()
    }

    fn recompute(&mut self) {
        let _span = tracing::info_span!("tile_cache_get_tiles").entered();
        self.stamp += 1;
        let aged_out = self.age_tiles();

        let ts = self.config.tile_size;
        let area = self.inflated_rect();
        let x0 = floor_to_grid(area.left(), ts);
        let y0 = floor_to_grid(area.top(), ts);
        let x_end = area.right() + ts as f32;
        let y_end = area.bottom() + ts as f32;

        self.visible.clear();
        let mut created = 0;
        let mut y = y0;
        while (y as f32) < y_end {
            let mut x = x0;
            while (x as f32) < x_end {
                let index = IVec2::new(x, y);
                let tile = match self.tiles.entry(index) {
                    Entry::Occupied(e) => e.into_mut(),
                    Entry::Vacant(e) => {
                        created += 1;
                        let serial = self.next_serial;
                        self.next_serial += 1;
                        e.insert(composite(&self.map, index, ts, serial, self.stamp))
                    }
                };
                tile.stamp = self.stamp;
                self.visible.push(index);
                x += ts;
            }
            y += ts;
        }
        self.fresh = true;

        let dirty_evicted = std::mem::take(&mut self.pending_dirty);
        self.stats = TileCacheStats {
            stamp: self.stamp,
            created,
            aged_out,
            dirty_evicted,
            visible: self.visible.len(),
            live: self.tiles.len(),
        };
        tracing::trace!(
            stamp = self.stamp,
            created,
            aged_out,
            dirty_evicted,
            visible = self.visible.len(),
            live = self.tiles.len(),
            "tile visibility recomputed"
        );
    }

    /// Recreate visible tiles evicted since the last recompute, stamping them
    /// with the current stamp.
    fn restore_evicted(&mut self) {
        let ts = self.config.tile_size;
        for &index in &self.visible {
            if !self.tiles.contains_key(&index) {
                let serial = self.next_serial;
                self.next_serial += 1;
                let tile = composite(&self.map, index, ts, serial, self.stamp);
                self.tiles.insert(index, tile);
                self.stats.created += 1;
            }
        }
        self.stats.live = self.tiles.len();
    }

    /// One throttled aging pass. Returns the number of tiles evicted.
    fn age_tiles(&mut self) -> usize {
        if self.age_queue.is_empty() {
            self.age_queue.extend(self.tiles.keys().copied());
        }
        let mut dead = Vec::new();
        for _ in 0..self.config.age_throttle {
            let Some(index) = self.age_queue.pop() else {
                break;
            };
            // Tiles already evicted by set_dirty are skipped.
            if let Some(tile) = self.tiles.get(&index) {
                if self.stamp - tile.stamp > self.config.lifespan {
                    dead.push(index);
                }
            }
        }
        for index in &dead {
            self.tiles.remove(index);
            tracing::debug!(x = index.x, y = index.y, "tile aged out");
        }
        dead.len()
    }

    /// Re-center on the camera and blit every visible tile that overlaps the
    /// view onto `surface`, which stands for the camera's viewport. Returns
    /// the number of tiles drawn.
    pub fn draw_tiles<S: Surface + ?Sized>(&mut self, camera: &Camera, surface: &mut S) -> usize {
        self.set_rect(Anchor::Center, camera.rect().center());
        self.get_tiles();

        let origin = self.view_rect.topleft();
        let mut drawn = 0;
        for index in &self.visible {
            let Some(tile) = self.tiles.get(index) else {
                continue;
            };
            if tile.rect.overlaps(&self.view_rect) {
                let dest = (tile.rect.topleft() - origin).round().as_ivec2();
                surface.blit(&tile.image, dest);
                drawn += 1;
            }
        }
        drawn
    }

    /// Evict every cached tile overlapping any of `areas`. Evicted tiles are
    /// recomposited from the map when next needed, and their rects are
    /// queued in [`TileCache::dirty_rects`]. Returns the number evicted.
    pub fn set_dirty(&mut self, areas: &[Rect]) -> usize {
        let mut evicted = 0;
        for area in areas {
            let hit: Vec<IVec2> = self
                .tiles
                .values()
                .filter(|tile| tile.rect.overlaps(area))
                .map(|tile| tile.index)
                .collect();
            for index in hit {
                if let Some(tile) = self.tiles.remove(&index) {
                    tracing::debug!(x = index.x, y = index.y, "tile marked dirty");
                    self.dirty_rects.push(tile.rect);
                    evicted += 1;
                }
            }
        }
        self.pending_dirty += evicted;
        evicted
    }

    /// World rects of tiles evicted by `set_dirty` and not yet taken.
    pub fn dirty_rects(&self) -> &[Rect] {
        &self.dirty_rects
    }

    pub fn take_dirty_rects(&mut self) -> Vec<Rect> {
        std::mem::take(&mut self.dirty_rects)
    }
}

fn validate_view_size(size: Vec2) -> Result<()> {
    if size.is_finite() && size.x > 0.0 && size.y > 0.0 {
        Ok(())
    } else {
        Err(Error::invalid(format!("view size must be positive, got {size}")))
    }
}

/// Largest multiple of `step` not greater than `v`.
fn floor_to_grid(v: f32, step: i32) -> i32 {
    (v.floor() as i32).div_euclid(step) * step
}

/// Composite every visible layer's objects over the grid square at `index`.
fn composite<M: MapSource>(map: &M, index: IVec2, tile_size: i32, serial: u64, stamp: u64) -> Tile {
    let rect = Rect::new(
        index.x as f32,
        index.y as f32,
        tile_size as f32,
        tile_size as f32,
    );
    let mut image = Image::new(tile_size as u32, tile_size as u32);
    for layer in map.layers().iter().filter(|l| l.is_visible()) {
        for object in layer.objects_intersecting(&rect) {
            if let Some(src) = object.image() {
                let dest = (object.rect().topleft() - rect.topleft()).round().as_ivec2();
                image.blit(src, dest);
            }
        }
    }
    tracing::debug!(x = index.x, y = index.y, serial, "composited tile");
    Tile {
        index,
        serial,
        image,
        rect,
        stamp,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::View;
    use crate::map::{ObjectLayer, Sprite, TileMap};

    const GREEN: [u8; 4] = [0, 200, 0, 255];
    const GREY: [u8; 4] = [90, 90, 90, 255];

    /// 1000x1000 world of 50-unit ground tiles, alternating green and grey.
    fn checker_map() -> TileMap {
        let green = Arc::new(Image::filled(50, 50, GREEN));
        let grey = Arc::new(Image::filled(50, 50, GREY));
        let ground = ObjectLayer::tiled("ground", Vec2::ZERO, 50.0, 20, 20, |c, r| {
            Some(if (c + r) % 2 == 0 { green.clone() } else { grey.clone() })
        })
        .unwrap();
        let mut map = TileMap::new(Rect::new(0.0, 0.0, 1000.0, 1000.0));
        map.add_layer(ground);
        map
    }

    fn cache(config: TileCacheConfig) -> TileCache<TileMap> {
        TileCache::new(checker_map(), Vec2::new(100.0, 100.0), config).unwrap()
    }

    fn config(tile_size: i32, lifespan: u64, max_scroll_speed: f32) -> TileCacheConfig {
        TileCacheConfig {
            tile_size,
            lifespan,
            max_scroll_speed,
            ..TileCacheConfig::default()
        }
    }

    #[derive(Default)]
    struct RecordingSurface {
        blits: Vec<IVec2>,
    }

    impl Surface for RecordingSurface {
        fn size(&self) -> glam::UVec2 {
            glam::UVec2::new(100, 100)
        }

        fn blit(&mut self, _image: &Image, dest: IVec2) {
            self.blits.push(dest);
        }
    }

    #[test]
    fn rejects_bad_config() {
        let map = checker_map();
        let bad = config(0, 10, 5.0);
        assert!(matches!(
            TileCache::new(map.clone(), Vec2::splat(100.0), bad),
            Err(Error::InvalidArgument(_))
        ));
        assert!(TileCache::new(map.clone(), Vec2::splat(100.0), config(-5, 10, 5.0)).is_err());
        assert!(TileCache::new(map.clone(), Vec2::splat(100.0), config(60, 10, -1.0)).is_err());
        assert!(TileCache::new(map, Vec2::new(0.0, 100.0), config(60, 10, 5.0)).is_err());
    }

    #[test]
    fn set_rect_rejects_unknown_anchor() {
        let mut tc = cache(config(60, 10, 5.0));
        let before = tc.view_rect();
        assert!(tc.set_rect_named("centre", Vec2::ZERO).is_err());
        assert!(tc.set_rect_named("centerx", Vec2::ZERO).is_err());
        assert_eq!(tc.view_rect(), before);

        tc.set_rect_named("topleft", Vec2::new(30.0, 40.0)).unwrap();
        assert_eq!(tc.view_rect(), Rect::new(30.0, 40.0, 100.0, 100.0));
    }

    #[test]
    fn tiles_cover_inflated_view() {
        let mut tc = cache(config(60, 10, 15.0));
        tc.set_rect(Anchor::Center, Vec2::new(333.0, 517.0));
        let count = tc.get_tiles().len();
        let stamp = tc.stamp();
        let area = tc.inflated_rect();
        assert_eq!(area, Rect::new(268.0, 452.0, 130.0, 130.0));

        let mut expected = 0;
        for gy in -2..20 {
            for gx in -2..20 {
                let index = IVec2::new(gx * 60, gy * 60);
                let rect = Rect::new(index.x as f32, index.y as f32, 60.0, 60.0);
                if rect.overlaps(&area) {
                    expected += 1;
                    let tile = tc.tile(index).expect("covering tile missing");
                    assert_eq!(tile.stamp, stamp);
                    assert_eq!(tile.rect, rect);
                }
            }
        }
        assert!(count >= expected);
    }

    #[test]
    fn negative_coordinates_floor_to_grid() {
        let mut tc = cache(config(60, 10, 0.0));
        tc.set_rect(Anchor::TopLeft, Vec2::new(-70.0, -10.0));
        tc.get_tiles();
        assert!(tc.tile(IVec2::new(-120, -60)).is_some());
        assert!(tc.tile(IVec2::new(0, 0)).is_some());
        assert_eq!(floor_to_grid(-0.5, 60), -60);
        assert_eq!(floor_to_grid(59.9, 60), 0);
    }

    #[test]
    fn get_tiles_is_idempotent_within_tick() {
        let mut tc = cache(config(60, 10, 5.0));
        tc.set_rect(Anchor::Center, Vec2::new(200.0, 200.0));
        let first: Vec<u64> = tc.get_tiles().iter().map(|t| t.serial).collect();
        let stamp = tc.stamp();
        let second: Vec<u64> = tc.get_tiles().iter().map(|t| t.serial).collect();
        assert_eq!(first, second);
        assert_eq!(tc.stamp(), stamp);

        tc.set_rect(Anchor::Center, Vec2::new(200.0, 200.0));
        tc.get_tiles();
        assert_eq!(tc.stamp(), stamp + 1);
        assert_eq!(tc.stats().created, 0);
    }

    #[test]
    fn composited_tile_samples_map() {
        let mut tc = cache(config(50, 10, 0.0));
        tc.set_rect(Anchor::TopLeft, Vec2::ZERO);
        tc.get_tiles();
        let origin = tc.tile(IVec2::new(0, 0)).unwrap();
        assert_eq!(origin.image.get(10, 10), Some(GREEN));
        let next = tc.tile(IVec2::new(50, 0)).unwrap();
        assert_eq!(next.image.get(10, 10), Some(GREY));
    }

    #[test]
    fn cache_tile_spanning_map_tiles_composites_both() {
        let mut tc = cache(config(60, 10, 0.0));
        tc.set_rect(Anchor::TopLeft, Vec2::ZERO);
        tc.get_tiles();
        let tile = tc.tile(IVec2::new(0, 0)).unwrap();
        assert_eq!(tile.image.get(49, 10), Some(GREEN));
        assert_eq!(tile.image.get(50, 10), Some(GREY));
    }

    #[test]
    fn hidden_layers_are_not_composited() {
        let mut map = checker_map();
        map.layer_mut("ground").unwrap().visible = false;
        let mut tc = TileCache::new(map, Vec2::splat(100.0), config(50, 10, 0.0)).unwrap();
        tc.set_rect(Anchor::TopLeft, Vec2::ZERO);
        tc.get_tiles();
        let tile = tc.tile(IVec2::ZERO).unwrap();
        assert_eq!(tile.image.get(10, 10), Some(crate::TRANSPARENT));
    }

    #[test]
    fn abandoned_tile_evicted_after_lifespan() {
        // 60x60 view with no margin touches 4 tiles at each position, so the
        // whole cache fits in one aging batch.
        let mut tc = TileCache::new(checker_map(), Vec2::splat(60.0), config(60, 10, 0.0)).unwrap();
        tc.set_rect(Anchor::Center, Vec2::new(30.0, 30.0));
        tc.get_tiles();
        let old = IVec2::new(0, 0);
        assert!(tc.tile(old).is_some());

        for call in 1..=11 {
            tc.set_rect(Anchor::Center, Vec2::new(630.0, 630.0));
            tc.get_tiles();
            if call < 11 {
                assert!(tc.tile(old).is_some(), "evicted early on call {call}");
            }
        }
        assert!(tc.tile(old).is_none());
        assert_eq!(tc.len(), 4);
    }

    #[test]
    fn aging_is_throttled_per_call() {
        let cfg = TileCacheConfig {
            tile_size: 10,
            lifespan: 0,
            max_scroll_speed: 0.0,
            age_throttle: 30,
        };
        // 100x100 view of 10-unit tiles: 11x11 = 121 tiles per position.
        let mut tc = cache(cfg);
        tc.set_rect(Anchor::TopLeft, Vec2::ZERO);
        tc.get_tiles();
        let first_batch = tc.len();
        assert_eq!(first_batch, 121);

        tc.set_rect(Anchor::TopLeft, Vec2::new(500.0, 500.0));
        tc.get_tiles();
        // One pass examines at most 30 of the old tiles.
        assert!(tc.stats().aged_out <= 30);

        let mut calls = 1;
        while tc.tiles().any(|t| t.rect.x < 200.0) {
            tc.set_rect(Anchor::TopLeft, Vec2::new(500.0, 500.0));
            tc.get_tiles();
            calls += 1;
            assert!(calls <= 20, "old tiles never aged out");
        }
        // 121 old tiles drain at 30 per pass.
        assert!(calls <= 10);
        assert_eq!(tc.len(), 121);
    }

    #[test]
    fn dirty_rect_recreates_only_overlapping_tiles() {
        let mut tc = cache(config(60, 10, 0.0));
        tc.set_rect(Anchor::TopLeft, Vec2::ZERO);
        tc.get_tiles();
        let before: HashMap<IVec2, (u64, u64)> =
            tc.tiles().map(|t| (t.index, (t.serial, t.stamp))).collect();

        let area = Rect::new(70.0, 10.0, 10.0, 10.0);
        assert_eq!(tc.set_dirty(&[area]), 1);
        assert!(tc.tile(IVec2::new(60, 0)).is_none());
        assert_eq!(tc.dirty_rects(), &[Rect::new(60.0, 0.0, 60.0, 60.0)]);

        tc.get_tiles();
        for tile in tc.tiles() {
            let (serial, stamp) = before[&tile.index];
            if tile.rect.overlaps(&area) {
                assert_ne!(tile.serial, serial);
            } else {
                assert_eq!(tile.serial, serial);
                assert_eq!(tile.stamp, stamp);
            }
        }
        assert_eq!(tc.len(), before.len());
        assert_eq!(tc.take_dirty_rects().len(), 1);
        assert!(tc.dirty_rects().is_empty());
    }

    #[test]
    fn dirty_tile_sees_map_change() {
        let mut tc = cache(config(50, 10, 0.0));
        tc.set_rect(Anchor::TopLeft, Vec2::ZERO);
        tc.get_tiles();

        let red = Arc::new(Image::filled(10, 10, [255, 0, 0, 255]));
        let mut props =
            ObjectLayer::new("props", Rect::new(0.0, 0.0, 1000.0, 1000.0), 50.0).unwrap();
        props.push(Sprite::new(Rect::new(20.0, 20.0, 10.0, 10.0), red));
        tc.map_mut().add_layer(props);

        assert_eq!(tc.tile(IVec2::ZERO).unwrap().image.get(25, 25), Some(GREEN));
        tc.set_dirty(&[Rect::new(20.0, 20.0, 10.0, 10.0)]);
        tc.get_tiles();
        assert_eq!(
            tc.tile(IVec2::ZERO).unwrap().image.get(25, 25),
            Some([255, 0, 0, 255])
        );
    }

    #[test]
    fn dirty_count_reported_by_next_recompute_only() {
        let mut tc = cache(config(60, 10, 0.0));
        tc.set_rect(Anchor::TopLeft, Vec2::ZERO);
        tc.get_tiles();
        assert_eq!(tc.stats().dirty_evicted, 0);

        assert_eq!(tc.set_dirty(&[Rect::new(70.0, 10.0, 10.0, 10.0)]), 1);
        tc.set_rect(Anchor::TopLeft, Vec2::ZERO);
        tc.get_tiles();
        assert_eq!(tc.stats().dirty_evicted, 1);

        tc.set_rect(Anchor::TopLeft, Vec2::ZERO);
        tc.get_tiles();
        assert_eq!(tc.stats().dirty_evicted, 0);
    }

    #[test]
    fn translucent_sprite_keeps_colour_on_fresh_tile() {
        let glass = Arc::new(Image::filled(10, 10, [200, 200, 200, 128]));
        let mut props =
            ObjectLayer::new("props", Rect::new(0.0, 0.0, 1000.0, 1000.0), 50.0).unwrap();
        props.push(Sprite::new(Rect::new(20.0, 20.0, 10.0, 10.0), glass));
        let mut map = TileMap::new(Rect::new(0.0, 0.0, 1000.0, 1000.0));
        map.add_layer(props);

        let mut tc = TileCache::new(map, Vec2::splat(100.0), config(50, 10, 0.0)).unwrap();
        tc.set_rect(Anchor::TopLeft, Vec2::ZERO);
        tc.get_tiles();
        let p = tc.tile(IVec2::ZERO).unwrap().image.get(25, 25).unwrap();
        for channel in &p[..3] {
            assert!((199..=200).contains(channel), "darkened to {p:?}");
        }
        assert!((127..=128).contains(&p[3]));
        assert_eq!(tc.tile(IVec2::ZERO).unwrap().image.get(5, 5), Some(crate::TRANSPARENT));
    }

    #[test]
    fn tile_size_change_discards_cache() {
        let mut tc = cache(config(60, 10, 0.0));
        tc.get_tiles();
        assert!(!tc.is_empty());
        assert!(tc.set_tile_size(0).is_err());
        assert!(!tc.is_empty());
        tc.set_tile_size(40).unwrap();
        assert!(tc.is_empty());
        tc.get_tiles();
        assert!(tc.tiles().all(|t| t.rect.w == 40.0));
    }

    #[test]
    fn draw_follows_camera_and_clips_to_view() {
        let mut tc = cache(config(50, 10, 10.0));
        let mut camera = Camera::new(View::new(Vec2::new(100.0, 100.0)));
        camera.set_position(Vec2::new(275.0, 275.0));

        let mut surface = RecordingSurface::default();
        let drawn = tc.draw_tiles(&camera, &mut surface);

        assert_eq!(tc.view_rect(), Rect::new(225.0, 225.0, 100.0, 100.0));
        // View spans x 225..325: tiles at 200, 250 and 300 on each axis.
        assert_eq!(drawn, 9);
        assert!(surface.blits.contains(&IVec2::new(-25, -25)));
        assert!(surface.blits.contains(&IVec2::new(75, 75)));
        // The margin tiles were cached but not drawn.
        assert!(tc.stats().visible > drawn);
    }

    #[test]
    fn draw_onto_image_shows_map() {
        let mut tc = cache(config(50, 10, 0.0));
        let mut camera = Camera::new(View::new(Vec2::new(100.0, 100.0)));
        camera.set_position(Vec2::new(75.0, 50.0));
        let mut screen = Image::new(100, 100);
        tc.draw_tiles(&camera, &mut screen);
        // Screen x 0..25 shows world x 25..50 (green), 25..75 shows 50..100 (grey).
        assert_eq!(screen.get(10, 10), Some(GREEN));
        assert_eq!(screen.get(30, 10), Some(GREY));
    }

    #[test]
    fn config_round_trips_through_json() {
        let json = r#"{ "tile_size": 64, "lifespan": 20 }"#;
        let cfg: TileCacheConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.tile_size, 64);
        assert_eq!(cfg.lifespan, 20);
        assert_eq!(cfg.age_throttle, DEFAULT_AGE_THROTTLE);
        assert!(cfg.validate().is_ok());
    }
}
