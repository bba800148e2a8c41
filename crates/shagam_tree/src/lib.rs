//! # Shagam Tree
//!
//! A spatial partition tree for indexing bounded entities in a 3D
//! simulation place.
//!
//! ## Features
//!
//! - **Nine-category partitioning**: eight octant voxels plus icosep
//!   residents that straddle a node's cut planes
//! - **Static and dynamic trees**: bulk construction, or incremental
//!   insert / remove / relocate with O(1) entity lookup
//! - **Pluggable cut policies**: median, midpoint, or any closure
//! - **Place indexing**: obstacle and agent trees driven by a two-phase tick
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use shagam_tree::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let universe = AxisAlignedBounds::from_coords(0.0, 0.0, 0.0, 100.0, 100.0, 100.0)?;
//!     let mut agents = DynamicManipulator::new(universe, TreeConfig::default())?;
//!
//!     let walker = AxisAlignedBounds::from_coords(10.0, 10.0, 0.0, 11.0, 11.0, 2.0)?;
//!     agents.insert(&IndexEntry::new(1_u32, walker))?;
//!
//!     let moved = AxisAlignedBounds::from_coords(12.0, 10.0, 0.0, 13.0, 11.0, 2.0)?;
//!     agents.relocate(&1, moved)?;
//!
//!     let nearby = AxisAlignedBounds::from_coords(11.5, 9.0, 0.0, 14.0, 12.0, 1.0)?;
//!     assert_eq!(agents.query_region(&nearby), vec![1]);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names)]

pub mod foundation;
pub mod config;
pub mod spatial;
pub mod place;

/// Common imports for index users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError, PlaceConfig, TreeConfig},
        foundation::math::{Axis, Point3, Vec3},
        place::{DynamicsReport, Perception, PlaceIndex, TickReport},
        spatial::{
            AxisAlignedBounds, Bounded, DynamicManipulator, IndexEntry, NodeId, PartitionKind,
            PartitionPolicy, RegionQuery, ShagamTree, SpatialEntity, StaticBuilder, TreeError,
            TreeResult, Voxel, Zone,
        },
    };
}
