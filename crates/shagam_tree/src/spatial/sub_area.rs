//! Sub-area splitting: the spatial inverse of zone classification

use crate::foundation::math::{Axis, Point3};
use super::bounds::AxisAlignedBounds;
use super::zone::{Voxel, Zone};

/// Extent of the child region for `zone` when `parent` is cut at `cut`.
///
/// Voxel zones take the half interval on each axis (`[min, cut]` below the
/// cut, `[cut, max]` above). Icosep and indeterminate zones are not
/// subdivided and yield the parent unchanged.
pub fn sub_area(parent: &AxisAlignedBounds, zone: Zone, cut: &Point3) -> AxisAlignedBounds {
    match zone {
        Zone::Voxel(voxel) => voxel_area(parent, voxel, cut),
        Zone::Icosep(_) | Zone::Indeterminate => *parent,
    }
}

/// Extent of one voxel of `parent` cut at `cut`.
///
/// The cut is clamped into the parent so the result is always a valid box,
/// even for a cut lying outside the parent.
pub fn voxel_area(parent: &AxisAlignedBounds, voxel: Voxel, cut: &Point3) -> AxisAlignedBounds {
    Axis::ALL.into_iter().fold(*parent, |area, axis| {
        let (lower, upper) = (parent.lower_on(axis), parent.upper_on(axis));
        let c = cut[axis.index()].clamp(lower, upper);
        if voxel.is_upper(axis) {
            area.with_interval(axis, c, upper)
        } else {
            area.with_interval(axis, lower, c)
        }
    })
}

/// Narrow `universe` down a chain of ancestor cuts.
///
/// Each history step is the cut point of an ancestor and the voxel taken
/// below it, ordered from the root downwards.
pub fn refine_universe<'a, I>(universe: &AxisAlignedBounds, history: I) -> AxisAlignedBounds
where
    I: IntoIterator<Item = &'a (Point3, Voxel)>,
{
    history
        .into_iter()
        .fold(*universe, |area, (cut, voxel)| voxel_area(&area, *voxel, cut))
}
