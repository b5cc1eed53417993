use std::collections::BTreeMap;

use glam::Vec2;
use scrollkit_common::{Collidable, EntityId, Error, Rect, Result};
use serde::{Deserialize, Serialize};

/// Optional precise shape of a body, fitted to its rect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    /// Circle centered on the rect center.
    Circle { radius: f32 },
    /// The rect itself.
    Box,
}

/// A collidable body stored in the world.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub rect: Rect,
    pub shape: Option<Shape>,
}

impl Body {
    /// Body tested by rect overlap only.
    pub fn new(rect: Rect) -> Self {
        Self { rect, shape: None }
    }

    pub fn circle(center: Vec2, radius: f32) -> Self {
        Self {
            rect: Rect::from_center(center, Vec2::splat(radius * 2.0)),
            shape: Some(Shape::Circle { radius }),
        }
    }

    pub fn boxed(rect: Rect) -> Self {
        Self {
            rect,
            shape: Some(Shape::Box),
        }
    }
}

impl Collidable for Body {
    fn rect(&self) -> Rect {
        self.rect
    }

    fn precise_collision(&self, other: &Self) -> Option<bool> {
        let (a, b) = (self.shape?, other.shape?);
        let hit = match (a, b) {
            (Shape::Box, Shape::Box) => self.rect.overlaps(&other.rect),
            (Shape::Circle { radius: ra }, Shape::Circle { radius: rb }) => {
                let reach = ra + rb;
                self.rect.center().distance_squared(other.rect.center()) < reach * reach
            }
            (Shape::Circle { radius }, Shape::Box) => {
                circle_hits_rect(self.rect.center(), radius, &other.rect)
            }
            (Shape::Box, Shape::Circle { radius }) => {
                circle_hits_rect(other.rect.center(), radius, &self.rect)
            }
        };
        Some(hit)
    }
}

fn circle_hits_rect(center: Vec2, radius: f32, rect: &Rect) -> bool {
    let nearest = Vec2::new(
        center.x.clamp(rect.left(), rect.right()),
        center.y.clamp(rect.top(), rect.bottom()),
    );
    center.distance_squared(nearest) < radius * radius
}

/// Resolves an entity id to a world-space position.
///
/// Used by anything that follows an entity it does not own, such as a camera
/// target.
pub trait Locate {
    fn locate(&self, id: EntityId) -> Option<Vec2>;
}

/// Arena of bodies keyed by `EntityId`.
///
/// Spatial indexes store ids only. Despawning here leaves those ids stale;
/// they resolve to `None` and are skipped by queries.
///
/// Uses BTreeMap for deterministic iteration order across all platforms.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct World {
    entities: BTreeMap<EntityId, Body>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Read-only access to all bodies (BTreeMap for deterministic iteration).
    pub fn entities(&self) -> &BTreeMap<EntityId, Body> {
        &self.entities
    }

    /// Spawn a new body. Returns its id.
    pub fn spawn(&mut self, body: Body) -> EntityId {
        let id = EntityId::new();
        self.spawn_with_id(id, body);
        id
    }

    /// Spawn a body with a specific id, replacing any body already there.
    pub fn spawn_with_id(&mut self, id: EntityId, body: Body) {
        self.entities.insert(id, body);
    }

    /// Remove a body. Returns it if it existed.
    pub fn despawn(&mut self, id: EntityId) -> Option<Body> {
        let body = self.entities.remove(&id);
        if body.is_some() {
            tracing::trace!(?id, "despawned body");
        }
        body
    }

    pub fn get(&self, id: EntityId) -> Option<&Body> {
        self.entities.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Body> {
        self.entities.get_mut(&id)
    }

    /// Like [`World::get`], but reports a missing body as a stale reference.
    pub fn try_get(&self, id: EntityId) -> Result<&Body> {
        self.entities.get(&id).ok_or(Error::StaleReference(id))
    }

    /// Replace a body's rect. Returns false when the id is stale.
    pub fn set_rect(&mut self, id: EntityId, rect: Rect) -> bool {
        match self.entities.get_mut(&id) {
            Some(body) => {
                body.rect = rect;
                true
            }
            None => false,
        }
    }

    /// Move a body by `delta`. Returns false when the id is stale.
    pub fn translate(&mut self, id: EntityId, delta: Vec2) -> bool {
        match self.entities.get_mut(&id) {
            Some(body) => {
                body.rect = body.rect.translate(delta);
                true
            }
            None => false,
        }
    }
}

impl Locate for World {
    fn locate(&self, id: EntityId) -> Option<Vec2> {
        self.get(id).map(|body| body.rect.center())
    }
}
