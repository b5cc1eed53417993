use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};

use scrollkit_common::{Collidable, EntityId};
use scrollkit_kernel::{Body, World};

/// Resolves the keys stored in a [`SpatialHash`](crate::SpatialHash) to the
/// objects they name.
///
/// `None` means the key is stale: the object was dropped without being
/// removed from the hash.
pub trait ObjectSource<K> {
    type Object: Collidable;

    fn resolve(&self, key: K) -> Option<&Self::Object>;
}

impl ObjectSource<EntityId> for World {
    type Object = Body;

    fn resolve(&self, key: EntityId) -> Option<&Body> {
        self.get(key)
    }
}

impl<T: Collidable> ObjectSource<usize> for [T] {
    type Object = T;

    fn resolve(&self, key: usize) -> Option<&T> {
        self.get(key)
    }
}

impl<T: Collidable> ObjectSource<usize> for Vec<T> {
    type Object = T;

    fn resolve(&self, key: usize) -> Option<&T> {
        self.get(key)
    }
}

impl<K: Ord, T: Collidable> ObjectSource<K> for BTreeMap<K, T> {
    type Object = T;

    fn resolve(&self, key: K) -> Option<&T> {
        self.get(&key)
    }
}

impl<K: Hash + Eq, T: Collidable, S: BuildHasher> ObjectSource<K> for HashMap<K, T, S> {
    type Object = T;

    fn resolve(&self, key: K) -> Option<&T> {
        self.get(&key)
    }
}
