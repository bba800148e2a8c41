//! Read interface shared by static and dynamic trees
//!
//! Perception code only needs to ask "what is inside this box", so it takes
//! any [`RegionQuery`] and does not care whether the tree behind it is
//! frozen or still being relocated into.

use super::bounds::AxisAlignedBounds;
use super::entity::EntityKey;
use super::geometry::PartitionGeometry;
use super::manipulator::DynamicManipulator;
use super::tree::ShagamTree;

/// Region queries over an indexed entity set
pub trait RegionQuery<K> {
    /// Keys of all entities whose bounds intersect `region`
    fn query_region(&self, region: &AxisAlignedBounds) -> Vec<K>;

    /// Number of indexed entities
    fn entity_count(&self) -> usize;
}

impl<K: EntityKey, G: PartitionGeometry> RegionQuery<K> for ShagamTree<K, G> {
    fn query_region(&self, region: &AxisAlignedBounds) -> Vec<K> {
        self.query_keys(region)
    }

    fn entity_count(&self) -> usize {
        self.len()
    }
}

impl<K: EntityKey, G: PartitionGeometry> RegionQuery<K> for DynamicManipulator<K, G> {
    fn query_region(&self, region: &AxisAlignedBounds) -> Vec<K> {
        self.tree().query_keys(region)
    }

    fn entity_count(&self) -> usize {
        self.len()
    }
}
