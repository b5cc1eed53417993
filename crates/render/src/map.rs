use std::sync::Arc;

use scrollkit_common::{Collidable, Rect, Result};
use scrollkit_spatial::{CellId, SpatialHash};

use crate::Image;

/// An object placed on a map layer.
pub trait Drawable {
    fn rect(&self) -> Rect;

    /// Image composited into tiles; objects without one are skipped when
    /// compositing.
    fn image(&self) -> Option<&Image>;
}

/// One layer of a map, queryable by world rect or by grid cell.
pub trait MapLayer {
    type Object: Drawable;

    fn is_visible(&self) -> bool;

    /// Objects whose rect overlaps `rect`, in draw order.
    fn objects_intersecting(&self, rect: &Rect) -> Vec<&Self::Object>;

    /// Objects stored in one cell of the layer's index. Unknown cells are empty.
    fn objects_in_cell(&self, cell: CellId) -> Vec<&Self::Object>;
}

/// The map a [`TileCache`](crate::TileCache) streams tiles from.
pub trait MapSource {
    type Layer: MapLayer;

    /// World bounds of the map.
    fn rect(&self) -> Rect;

    /// Layers from bottom to top.
    fn layers(&self) -> &[Self::Layer];
}

/// A positioned, optionally textured map object.
#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
    pub rect: Rect,
    pub image: Option<Arc<Image>>,
}

impl Sprite {
    pub fn new(rect: Rect, image: Arc<Image>) -> Self {
        Self {
            rect,
            image: Some(image),
        }
    }
}

impl Drawable for Sprite {
    fn rect(&self) -> Rect {
        self.rect
    }

    fn image(&self) -> Option<&Image> {
        self.image.as_deref()
    }
}

impl Collidable for Sprite {
    fn rect(&self) -> Rect {
        self.rect
    }
}

/// Layer of sprites indexed by a spatial hash. Draw order is insertion order.
#[derive(Debug, Clone)]
pub struct ObjectLayer {
    pub name: String,
    pub visible: bool,
    objects: Vec<Sprite>,
    index: SpatialHash<usize>,
}

impl ObjectLayer {
    /// Empty layer covering `bounds`, indexed with cells of `cell_size`.
    pub fn new(name: impl Into<String>, bounds: Rect, cell_size: f32) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            visible: true,
            objects: Vec::new(),
            index: SpatialHash::new(bounds, cell_size)?,
        })
    }

    /// Layer holding one sprite per grid cell for which `tile_at` returns an
    /// image. The layer is indexed at the same cell size as the grid.
    pub fn tiled(
        name: impl Into<String>,
        origin: glam::Vec2,
        tile_size: f32,
        cols: u32,
        rows: u32,
        mut tile_at: impl FnMut(u32, u32) -> Option<Arc<Image>>,
    ) -> Result<Self> {
        let bounds = Rect::new(
            origin.x,
            origin.y,
            cols as f32 * tile_size,
            rows as f32 * tile_size,
        );
        let mut layer = Self::new(name, bounds, tile_size)?;
        for row in 0..rows {
            for col in 0..cols {
                if let Some(image) = tile_at(col, row) {
                    let rect = Rect::new(
                        origin.x + col as f32 * tile_size,
                        origin.y + row as f32 * tile_size,
                        tile_size,
                        tile_size,
                    );
                    layer.push(Sprite::new(rect, image));
                }
            }
        }
        Ok(layer)
    }

    /// Add a sprite on top of the layer. Returns its index.
    pub fn push(&mut self, sprite: Sprite) -> usize {
        let key = self.objects.len();
        self.index.add(key, &sprite.rect);
        self.objects.push(sprite);
        key
    }

    pub fn get(&self, key: usize) -> Option<&Sprite> {
        self.objects.get(key)
    }

    /// Move a sprite and re-index it. Returns false for an unknown index.
    pub fn move_object(&mut self, key: usize, rect: Rect) -> bool {
        let Some(sprite) = self.objects.get_mut(key) else {
            return false;
        };
        sprite.rect = rect;
        self.index.add(key, &rect);
        true
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn objects(&self) -> &[Sprite] {
        &self.objects
    }

    pub fn index(&self) -> &SpatialHash<usize> {
        &self.index
    }
}

impl MapLayer for ObjectLayer {
    type Object = Sprite;

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn objects_intersecting(&self, rect: &Rect) -> Vec<&Sprite> {
        let mut keys = self.index.query_rect(rect, &self.objects);
        keys.sort_unstable();
        keys.into_iter().map(|k| &self.objects[k]).collect()
    }

    fn objects_in_cell(&self, cell: CellId) -> Vec<&Sprite> {
        let mut keys = self.index.bucket(cell).to_vec();
        keys.sort_unstable();
        keys.into_iter().map(|k| &self.objects[k]).collect()
    }
}

/// A map made of object layers sharing the same world bounds.
#[derive(Debug, Clone)]
pub struct TileMap {
    rect: Rect,
    layers: Vec<ObjectLayer>,
}

impl TileMap {
    pub fn new(rect: Rect) -> Self {
        Self {
            rect,
            layers: Vec::new(),
        }
    }

    pub fn add_layer(&mut self, layer: ObjectLayer) {
        self.layers.push(layer);
    }

    pub fn layer(&self, name: &str) -> Option<&ObjectLayer> {
        self.layers.iter().find(|l| l.name == name)
    }

    pub fn layer_mut(&mut self, name: &str) -> Option<&mut ObjectLayer> {
        self.layers.iter_mut().find(|l| l.name == name)
    }
}

impl MapSource for TileMap {
    type Layer = ObjectLayer;

    fn rect(&self) -> Rect {
        self.rect
    }

    fn layers(&self) -> &[ObjectLayer] {
        &self.layers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn swatch(v: u8) -> Arc<Image> {
        Arc::new(Image::filled(4, 4, [v, v, v, 255]))
    }

    #[test]
    fn tiled_layer_places_one_sprite_per_cell() {
        let layer = ObjectLayer::tiled("ground", Vec2::ZERO, 16.0, 4, 3, |c, r| {
            ((c + r) % 2 == 0).then(|| swatch(1))
        })
        .unwrap();
        assert_eq!(layer.len(), 6);
        assert_eq!(layer.index().cols(), 4);
        assert_eq!(layer.index().rows(), 3);
    }

    #[test]
    fn objects_intersecting_in_draw_order() {
        let mut layer = ObjectLayer::new("props", Rect::new(0.0, 0.0, 64.0, 64.0), 16.0).unwrap();
        let a = layer.push(Sprite::new(Rect::new(10.0, 10.0, 20.0, 20.0), swatch(1)));
        let b = layer.push(Sprite::new(Rect::new(12.0, 12.0, 4.0, 4.0), swatch(2)));
        layer.push(Sprite::new(Rect::new(50.0, 50.0, 4.0, 4.0), swatch(3)));

        let hits = layer.objects_intersecting(&Rect::new(0.0, 0.0, 20.0, 20.0));
        assert_eq!(hits.len(), 2);
        assert!(std::ptr::eq(hits[0], layer.get(a).unwrap()));
        assert!(std::ptr::eq(hits[1], layer.get(b).unwrap()));
    }

    #[test]
    fn edge_neighbours_are_not_intersecting() {
        let layer = ObjectLayer::tiled("ground", Vec2::ZERO, 16.0, 3, 1, |_, _| Some(swatch(1)))
            .unwrap();
        let hits = layer.objects_intersecting(&Rect::new(16.0, 0.0, 16.0, 16.0));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].rect.x, 16.0);
    }

    #[test]
    fn objects_in_cell_and_unknown_cell() {
        let layer = ObjectLayer::tiled("ground", Vec2::ZERO, 16.0, 2, 2, |_, _| Some(swatch(1)))
            .unwrap();
        assert_eq!(layer.objects_in_cell(3).len(), 1);
        assert!(layer.objects_in_cell(99).is_empty());
    }

    #[test]
    fn move_object_reindexes() {
        let mut layer = ObjectLayer::new("props", Rect::new(0.0, 0.0, 64.0, 64.0), 16.0).unwrap();
        let key = layer.push(Sprite::new(Rect::new(1.0, 1.0, 4.0, 4.0), swatch(1)));
        assert!(layer.move_object(key, Rect::new(40.0, 40.0, 4.0, 4.0)));
        assert!(layer.objects_in_cell(0).is_empty());
        assert_eq!(layer.objects_in_cell(10).len(), 1);
        assert!(!layer.move_object(99, Rect::default()));
    }

    #[test]
    fn map_looks_up_layers_by_name() {
        let mut map = TileMap::new(Rect::new(0.0, 0.0, 64.0, 64.0));
        map.add_layer(ObjectLayer::new("ground", map.rect(), 16.0).unwrap());
        map.add_layer(ObjectLayer::new("props", map.rect(), 16.0).unwrap());
        assert_eq!(map.layers().len(), 2);
        assert!(map.layer("props").is_some());
        map.layer_mut("props").unwrap().visible = false;
        assert!(!map.layer("props").unwrap().is_visible());
        assert!(map.layer("sky").is_none());
    }
}
