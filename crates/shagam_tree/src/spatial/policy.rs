//! Partition policies choosing where a node's cut point lies

use crate::foundation::math::{utils, Axis, Point3};
use super::bounds::AxisAlignedBounds;
use super::zone::straddles;
use serde::{Deserialize, Serialize};

/// Strategy choosing a node's cut point.
///
/// `region` is the node's spatial extent and `members` the bounds of the
/// entities to split. Returning `None`, or a point the tree judges degenerate,
/// keeps the node a leaf.
pub trait PartitionPolicy: std::fmt::Debug {
    /// Propose a cut point for `members` inside `region`
    fn cut_point(&self, region: &AxisAlignedBounds, members: &[&AxisAlignedBounds]) -> Option<Point3>;
}

/// Median of the member centers on each axis.
///
/// On an axis where the median crosses every member (a population sharing a
/// height band, say) the plane separates nothing, so the cut moves to the
/// region midpoint there, or to the region's lower face when the midpoint
/// crosses every member too.
#[derive(Debug, Clone, Copy, Default)]
pub struct MedianSplit;

impl PartitionPolicy for MedianSplit {
    fn cut_point(&self, region: &AxisAlignedBounds, members: &[&AxisAlignedBounds]) -> Option<Point3> {
        let mut cut = Point3::origin();
        let mut values = Vec::with_capacity(members.len());
        for axis in Axis::ALL {
            values.clear();
            values.extend(members.iter().map(|b| b.center()[axis.index()]));
            let median = utils::median_in_place(&mut values)?;
            let crosses_all = |c: f64| {
                members
                    .iter()
                    .all(|b| straddles(b.lower_on(axis), b.upper_on(axis), c))
            };
            let midpoint = region.center()[axis.index()];
            cut[axis.index()] = [median, midpoint]
                .into_iter()
                .find(|&c| !crosses_all(c))
                .unwrap_or_else(|| region.lower_on(axis));
        }
        Some(cut)
    }
}

/// Geometric center of the node region
#[derive(Debug, Clone, Copy, Default)]
pub struct MidpointSplit;

impl PartitionPolicy for MidpointSplit {
    fn cut_point(&self, region: &AxisAlignedBounds, _members: &[&AxisAlignedBounds]) -> Option<Point3> {
        Some(region.center())
    }
}

/// Closure wrapper so any function can serve as a policy
pub struct FnPolicy<F>(pub F);

impl<F> std::fmt::Debug for FnPolicy<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FnPolicy")
    }
}

impl<F> FnPolicy<F>
where
    F: Fn(&AxisAlignedBounds, &[&AxisAlignedBounds]) -> Option<Point3>,
{
    /// Wrap a cut-point function
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> PartitionPolicy for FnPolicy<F>
where
    F: Fn(&AxisAlignedBounds, &[&AxisAlignedBounds]) -> Option<Point3>,
{
    fn cut_point(&self, region: &AxisAlignedBounds, members: &[&AxisAlignedBounds]) -> Option<Point3> {
        (self.0)(region, members)
    }
}

/// Serializable selector for the built-in policies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionKind {
    /// [`MedianSplit`]
    #[default]
    Median,
    /// [`MidpointSplit`]
    Midpoint,
}

impl PartitionKind {
    /// Instantiate the selected policy
    pub fn policy(self) -> Box<dyn PartitionPolicy> {
        match self {
            PartitionKind::Median => Box::new(MedianSplit),
            PartitionKind::Midpoint => Box::new(MidpointSplit),
        }
    }
}

/// Outcome of checking a proposed cut against a node region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutCheck {
    /// Usable cut
    Valid,
    /// No cut proposed, or a NaN coordinate
    Missing,
    /// A coordinate lies outside the region
    OutsideRegion,
    /// The cut does not split the region on any axis
    NoSplit,
    /// The cut repeats the parent node's cut
    Repeated,
    /// No member fits a voxel around the cut
    Unseparated,
}

/// Validate a proposed cut point for a node region.
///
/// A usable cut lies inside the region (boundary allowed) and strictly inside
/// it on at least one axis of positive extent, so at least one voxel is
/// smaller than the region and recursion makes progress.
pub fn check_cut(region: &AxisAlignedBounds, cut: Option<&Point3>, parent_cut: Option<&Point3>) -> CutCheck {
    let Some(cut) = cut else {
        return CutCheck::Missing;
    };
    if utils::has_nan(cut) {
        return CutCheck::Missing;
    }
    if !region.contains_point(cut) {
        return CutCheck::OutsideRegion;
    }
    if parent_cut == Some(cut) {
        return CutCheck::Repeated;
    }
    let splits = Axis::ALL.iter().any(|&axis| {
        let c = cut[axis.index()];
        region.lower_on(axis) < c && c < region.upper_on(axis)
    });
    if splits {
        CutCheck::Valid
    } else {
        CutCheck::NoSplit
    }
}
