//! Entity capabilities consumed by the spatial index

use super::bounds::{AxisAlignedBounds, Bounded};
use std::fmt::Debug;
use std::hash::Hash;

/// Identity type used to track entities in the index
pub trait EntityKey: Copy + Eq + Hash + Debug {}

impl<T: Copy + Eq + Hash + Debug> EntityKey for T {}

/// A bounded entity with a stable identity
pub trait SpatialEntity: Bounded {
    /// Key type identifying the entity
    type Key: EntityKey;

    /// Stable identity of this entity
    fn key(&self) -> Self::Key;
}

/// Key and bounds of one indexed entity, as stored in tree nodes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexEntry<K> {
    /// Entity identity
    pub key: K,
    /// Bounds at the time the entity was last placed
    pub bounds: AxisAlignedBounds,
}

impl<K> IndexEntry<K> {
    /// Create a new entry
    pub fn new(key: K, bounds: AxisAlignedBounds) -> Self {
        Self { key, bounds }
    }
}

impl<K: EntityKey> IndexEntry<K> {
    /// Snapshot the key and current bounds of an entity
    pub fn of<E: SpatialEntity<Key = K>>(entity: &E) -> Self {
        Self::new(entity.key(), entity.bounds())
    }
}

impl<K> Bounded for IndexEntry<K> {
    fn bounds(&self) -> AxisAlignedBounds {
        self.bounds
    }
}

impl<K: EntityKey> SpatialEntity for IndexEntry<K> {
    type Key = K;

    fn key(&self) -> K {
        self.key
    }
}
