use std::collections::{HashMap, HashSet, VecDeque};

use glam::{IVec2, Vec2};
use scrollkit_common::{Error, Rect};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::region::{MapHandler, MapLoader, Region};

/// Region streaming settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuperMapConfig {
    /// Most recently visited regions kept loaded, the current one included.
    pub max_maps: usize,
    /// Also load the eight regions around the current one.
    pub preload_neighbors: bool,
}

impl Default for SuperMapConfig {
    fn default() -> Self {
        Self {
            max_maps: 4,
            preload_neighbors: true,
        }
    }
}

impl SuperMapConfig {
    pub fn validate(&self) -> scrollkit_common::Result<()> {
        if self.max_maps == 0 {
            return Err(Error::invalid("max_maps must be at least 1"));
        }
        Ok(())
    }
}

/// Regions loaded and unloaded by one [`SuperMap::update`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapTransition {
    pub loaded: Vec<IVec2>,
    pub unloaded: Vec<IVec2>,
}

impl MapTransition {
    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty() && self.unloaded.is_empty()
    }
}

/// A grid of equally sized map regions, loaded around a moving focus.
///
/// Region `offset` covers the world rect starting at `offset * region_size`.
/// Entering a region makes it current and records it in the history; regions
/// that fall out of the history (and are not preloaded neighbours of the
/// current region) are unloaded.
#[derive(Debug)]
pub struct SuperMap<M> {
    region_size: Vec2,
    config: SuperMapConfig,
    handlers: HashMap<IVec2, MapHandler<M>>,
    current: Option<IVec2>,
    history: VecDeque<IVec2>,
}

impl<M: Region> SuperMap<M> {
    pub fn new(region_size: Vec2, config: SuperMapConfig) -> Result<Self> {
        config.validate()?;
        if !(region_size.is_finite() && region_size.x > 0.0 && region_size.y > 0.0) {
            return Err(Error::invalid(format!(
                "region size must be positive, got {region_size}"
            ))
            .into());
        }
        Ok(Self {
            region_size,
            config,
            handlers: HashMap::new(),
            current: None,
            history: VecDeque::new(),
        })
    }

    pub fn config(&self) -> &SuperMapConfig {
        &self.config
    }

    pub fn region_size(&self) -> Vec2 {
        self.region_size
    }

    /// Register a region. Fails if its offset is already taken.
    pub fn add_handler(&mut self, handler: MapHandler<M>) -> Result<()> {
        let offset = handler.offset();
        if self.handlers.contains_key(&offset) {
            return Err(Error::invalid(format!(
                "a region is already registered at {offset}"
            ))
            .into());
        }
        tracing::debug!(name = handler.name(), ?offset, "region registered");
        self.handlers.insert(offset, handler);
        Ok(())
    }

    pub fn handler(&self, offset: IVec2) -> Option<&MapHandler<M>> {
        self.handlers.get(&offset)
    }

    pub fn handler_mut(&mut self, offset: IVec2) -> Option<&mut MapHandler<M>> {
        self.handlers.get_mut(&offset)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Offset of the region the focus was last inside.
    pub fn current(&self) -> Option<IVec2> {
        self.current
    }

    pub fn current_handler(&self) -> Option<&MapHandler<M>> {
        self.current.and_then(|offset| self.handlers.get(&offset))
    }

    /// Visited regions, oldest first.
    pub fn history(&self) -> impl Iterator<Item = IVec2> + '_ {
        self.history.iter().copied()
    }

    pub fn loaded_count(&self) -> usize {
        self.handlers.values().filter(|h| h.is_loaded()).count()
    }

    /// Grid offset of the region containing the world point `pos`.
    pub fn region_at(&self, pos: Vec2) -> IVec2 {
        (pos / self.region_size).floor().as_ivec2()
    }

    /// World bounds of the region at `offset`.
    pub fn region_rect(&self, offset: IVec2) -> Rect {
        Rect::from_min_size(offset.as_vec2() * self.region_size, self.region_size)
    }

    /// Advance one tick with the focus (typically the camera center) at
    /// `focus`. Crossing into another registered region loads it and
    /// reshuffles the loaded set; every loaded map then gets
    /// [`Region::update`].
    ///
    /// A failure to load the entered region is returned and leaves the
    /// current region unchanged. Neighbour failures are logged and skipped.
    pub fn update(
        &mut self,
        dt: f32,
        focus: Vec2,
        loader: &mut impl MapLoader<M>,
    ) -> Result<MapTransition> {
        let _span = tracing::info_span!("supermap_update").entered();
        let mut transition = MapTransition::default();

        let offset = self.region_at(focus);
        if self.current != Some(offset) && self.handlers.contains_key(&offset) {
            self.enter(offset, loader, &mut transition)?;
        }

        for key in self.sorted_offsets() {
            if let Some(map) = self.handlers.get_mut(&key).and_then(|h| h.map_mut()) {
                map.update(dt);
            }
        }

        tracing::trace!(
            current = ?self.current,
            loaded = transition.loaded.len(),
            unloaded = transition.unloaded.len(),
            live = self.loaded_count(),
            "supermap update complete"
        );
        Ok(transition)
    }

    fn enter(
        &mut self,
        offset: IVec2,
        loader: &mut impl MapLoader<M>,
        transition: &mut MapTransition,
    ) -> Result<()> {
        if let Some(handler) = self.handlers.get_mut(&offset) {
            if handler.load(loader)? {
                transition.loaded.push(offset);
            }
        }
        tracing::debug!(from = ?self.current, to = ?offset, "entered region");
        self.current = Some(offset);

        self.history.retain(|o| *o != offset);
        self.history.push_back(offset);
        while self.history.len() > self.config.max_maps {
            self.history.pop_front();
        }

        let mut keep: HashSet<IVec2> = self.history.iter().copied().collect();
        if self.config.preload_neighbors {
            for neighbor in neighbors(offset) {
                let Some(handler) = self.handlers.get_mut(&neighbor) else {
                    continue;
                };
                keep.insert(neighbor);
                match handler.load(loader) {
                    Ok(true) => transition.loaded.push(neighbor),
                    Ok(false) => {}
                    Err(err) => tracing::warn!(%err, "skipping neighbour region"),
                }
            }
        }

        for key in self.sorted_offsets() {
            if keep.contains(&key) {
                continue;
            }
            if let Some(handler) = self.handlers.get_mut(&key) {
                if handler.unload().is_some() {
                    transition.unloaded.push(key);
                }
            }
        }
        Ok(())
    }

    /// Visit every loaded map, row by row.
    pub fn draw(&self, mut f: impl FnMut(&MapHandler<M>, &M)) {
        for key in self.sorted_offsets() {
            if let Some(handler) = self.handlers.get(&key) {
                if let Some(map) = handler.map() {
                    f(handler, map);
                }
            }
        }
    }

    /// Unload every region and forget the history.
    pub fn unload_all(&mut self) -> Vec<IVec2> {
        let mut unloaded: Vec<IVec2> = self
            .handlers
            .iter_mut()
            .filter_map(|(key, h)| h.unload().map(|_| *key))
            .collect();
        unloaded.sort_by_key(|k| (k.y, k.x));
        self.history.clear();
        self.current = None;
        unloaded
    }

    fn sorted_offsets(&self) -> Vec<IVec2> {
        let mut keys: Vec<IVec2> = self.handlers.keys().copied().collect();
        keys.sort_by_key(|k| (k.y, k.x));
        keys
    }
}

fn neighbors(center: IVec2) -> impl Iterator<Item = IVec2> {
    (-1..=1)
        .flat_map(|dy| (-1..=1).map(move |dx| IVec2::new(dx, dy)))
        .filter(|d| *d != IVec2::ZERO)
        .map(move |d| center + d)
}
