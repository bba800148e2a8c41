//! Geometry policy used by the tree engine
//!
//! The tree only needs four geometric operations. Keeping them behind a
//! trait lets tests and callers swap tie-break rules without touching the
//! builder or the manipulator.

use crate::foundation::math::Point3;
use super::bounds::AxisAlignedBounds;
use super::sub_area;
use super::zone::{self, Zone};

/// Geometric operations the tree engine is parameterized over
pub trait PartitionGeometry: std::fmt::Debug {
    /// Zone of `bounds` around `cut`
    fn classify(&self, cut: &Point3, bounds: &AxisAlignedBounds) -> Zone;

    /// Extent of the child region for `zone` of `parent` cut at `cut`
    fn sub_area(&self, parent: &AxisAlignedBounds, zone: Zone, cut: &Point3) -> AxisAlignedBounds;

    /// Smallest box containing both boxes
    fn union(&self, a: &AxisAlignedBounds, b: &AxisAlignedBounds) -> AxisAlignedBounds {
        a.union(b)
    }

    /// Whether two boxes overlap
    fn intersects(&self, a: &AxisAlignedBounds, b: &AxisAlignedBounds) -> bool {
        a.intersects(b)
    }
}

/// Standard octant geometry: eight voxels plus icosep straddling categories
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OctantGeometry;

impl PartitionGeometry for OctantGeometry {
    fn classify(&self, cut: &Point3, bounds: &AxisAlignedBounds) -> Zone {
        zone::classify_bounds(cut, bounds)
    }

    fn sub_area(&self, parent: &AxisAlignedBounds, zone: Zone, cut: &Point3) -> AxisAlignedBounds {
        sub_area::sub_area(parent, zone, cut)
    }
}
