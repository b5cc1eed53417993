use glam::IVec2;
use scrollkit_render::TileMap;

use crate::error::{LoadError, Result, StreamError};

/// A map that can live inside a [`SuperMap`](crate::SuperMap).
pub trait Region {
    /// Called once per tick while the region is loaded.
    fn update(&mut self, _dt: f32) {}
}

impl Region for TileMap {}

/// Produces the map for a region when it needs to be loaded.
pub trait MapLoader<M> {
    fn load(&mut self, name: &str, offset: IVec2) -> std::result::Result<M, LoadError>;
}

/// A region slot at a grid offset whose map is loaded on demand.
#[derive(Debug, Clone)]
pub struct MapHandler<M> {
    name: String,
    offset: IVec2,
    map: Option<M>,
}

impl<M> MapHandler<M> {
    pub fn new(name: impl Into<String>, offset: IVec2) -> Self {
        Self {
            name: name.into(),
            offset,
            map: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Grid offset of the region, in region units.
    pub fn offset(&self) -> IVec2 {
        self.offset
    }

    pub fn is_loaded(&self) -> bool {
        self.map.is_some()
    }

    /// The loaded map, or `None` while the region is unloaded.
    pub fn map(&self) -> Option<&M> {
        self.map.as_ref()
    }

    pub fn map_mut(&mut self) -> Option<&mut M> {
        self.map.as_mut()
    }

    /// Load the map if it is not already loaded. Returns true when a load
    /// happened.
    pub fn load(&mut self, loader: &mut impl MapLoader<M>) -> Result<bool> {
        if self.map.is_some() {
            return Ok(false);
        }
        let map = loader
            .load(&self.name, self.offset)
            .map_err(|source| StreamError::Load {
                name: self.name.clone(),
                offset: self.offset,
                source,
            })?;
        tracing::debug!(name = %self.name, offset = ?self.offset, "region loaded");
        self.map = Some(map);
        Ok(true)
    }

    /// Drop the map, returning it if it was loaded.
    pub fn unload(&mut self) -> Option<M> {
        let map = self.map.take();
        if map.is_some() {
            tracing::debug!(name = %self.name, offset = ?self.offset, "region unloaded");
        }
        map
    }
}
