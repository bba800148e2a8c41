//! Spatial partitioning data structures
//!
//! A Shagam tree splits space at a cut point per node. Entities fitting in
//! one of the eight octant voxels descend into the matching child; entities
//! straddling a cut plane (icosep entities) stay resident at the node.

mod bounds;
mod builder;
mod entity;
mod error;
mod geometry;
mod manipulator;
mod node;
mod policy;
mod query;
mod sub_area;
mod tree;
mod zone;

#[cfg(test)]
mod tests;

pub use bounds::{AxisAlignedBounds, Bounded};
pub use builder::StaticBuilder;
pub use entity::{EntityKey, IndexEntry, SpatialEntity};
pub use error::{TreeError, TreeResult};
pub use geometry::{OctantGeometry, PartitionGeometry};
pub use manipulator::{DynamicManipulator, Locator};
pub use node::{NodeId, TreeNode};
pub use policy::{check_cut, CutCheck, FnPolicy, MedianSplit, MidpointSplit, PartitionKind, PartitionPolicy};
pub use query::RegionQuery;
pub use sub_area::{refine_universe, sub_area, voxel_area};
pub use tree::{IntegrityReport, QueryIter, ShagamTree, TreeStats};
pub use zone::{classify, classify_bounds, Icosep, Voxel, Zone, ZONE_BUCKETS};
