use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Rect;

/// Unique identifier for an entity in the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

/// Anything that can take part in broad-phase collision.
///
/// `precise_collision` is an optional narrow-phase capability. Returning
/// `None` means "no precise shape on one side", in which case rect overlap
/// alone decides.
pub trait Collidable {
    fn rect(&self) -> Rect;

    fn precise_collision(&self, _other: &Self) -> Option<bool> {
        None
    }
}

impl Collidable for Rect {
    fn rect(&self) -> Rect {
        *self
    }
}

/// Rect overlap, refined by the precise test when both sides provide one.
pub fn collides<T: Collidable + ?Sized>(a: &T, b: &T) -> bool {
    a.rect().overlaps(&b.rect()) && a.precise_collision(b).unwrap_or(true)
}
