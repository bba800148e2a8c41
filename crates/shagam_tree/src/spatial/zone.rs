//! Zone classification against three orthogonal cut planes
//!
//! A cut point splits space into eight voxels. A box that lies on one side of
//! every plane belongs to exactly one voxel; a box crossing a plane (or lying
//! flat inside one) is an *icosep* and stays with the node that owns the cut.
//!
//! Axis naming follows the place conventions:
//! - X: west (below the cut) / east (above)
//! - Y: front (below) / back (above)
//! - Z: south (below) / north (above)
//!
//! Tie-break: a box touching a plane from one side stays on that side. Only a
//! box extending across the plane, or a flat box coincident with it, straddles.

use crate::foundation::math::{Axis, Point3};
use super::bounds::AxisAlignedBounds;

/// One of the eight pure voxels around a cut point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Voxel {
    /// West, front, south
    SouthWestFront,
    /// West, back, south
    SouthWestBack,
    /// East, front, south
    SouthEastFront,
    /// East, back, south
    SouthEastBack,
    /// West, front, north
    NorthWestFront,
    /// West, back, north
    NorthWestBack,
    /// East, front, north
    NorthEastFront,
    /// East, back, north
    NorthEastBack,
}

impl Voxel {
    /// All voxels in child-slot order
    pub const ALL: [Voxel; 8] = [
        Voxel::SouthWestFront,
        Voxel::SouthWestBack,
        Voxel::SouthEastFront,
        Voxel::SouthEastBack,
        Voxel::NorthWestFront,
        Voxel::NorthWestBack,
        Voxel::NorthEastFront,
        Voxel::NorthEastBack,
    ];

    /// Build a voxel from its side on each axis (`true` = above the cut)
    pub const fn from_sides(east: bool, back: bool, north: bool) -> Self {
        match (north, east, back) {
            (false, false, false) => Voxel::SouthWestFront,
            (false, false, true) => Voxel::SouthWestBack,
            (false, true, false) => Voxel::SouthEastFront,
            (false, true, true) => Voxel::SouthEastBack,
            (true, false, false) => Voxel::NorthWestFront,
            (true, false, true) => Voxel::NorthWestBack,
            (true, true, false) => Voxel::NorthEastFront,
            (true, true, true) => Voxel::NorthEastBack,
        }
    }

    /// Child slot index: `(north << 2) | (east << 1) | back`
    pub const fn index(self) -> usize {
        match self {
            Voxel::SouthWestFront => 0,
            Voxel::SouthWestBack => 1,
            Voxel::SouthEastFront => 2,
            Voxel::SouthEastBack => 3,
            Voxel::NorthWestFront => 4,
            Voxel::NorthWestBack => 5,
            Voxel::NorthEastFront => 6,
            Voxel::NorthEastBack => 7,
        }
    }

    /// Inverse of [`Voxel::index`]
    pub const fn from_index(index: usize) -> Option<Self> {
        if index < 8 {
            Some(Self::ALL[index])
        } else {
            None
        }
    }

    /// Whether the voxel lies above the cut on the given axis
    pub const fn is_upper(self, axis: Axis) -> bool {
        let bit = match axis {
            Axis::X => 1,
            Axis::Y => 0,
            Axis::Z => 2,
        };
        (self.index() >> bit) & 1 == 1
    }
}

/// Straddling categories for boxes that cannot descend into a voxel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Icosep {
    /// Crosses only the X cut plane (the plane parallel to YZ)
    Yz,
    /// Crosses only the Y cut plane (the plane parallel to XZ)
    Xz,
    /// Crosses only the Z cut plane (the plane parallel to XY)
    Xy,
    /// Crosses two or three cut planes
    Spanning,
}

/// Classification of a box against a cut point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Zone {
    /// Entirely inside one voxel
    Voxel(Voxel),
    /// Crossing or lying on one or more cut planes
    Icosep(Icosep),
    /// No valid zone; the box must stay at the current node
    Indeterminate,
}

impl Zone {
    /// The voxel for pure zones
    pub const fn voxel(self) -> Option<Voxel> {
        match self {
            Zone::Voxel(v) => Some(v),
            Zone::Icosep(_) | Zone::Indeterminate => None,
        }
    }

    /// Whether the zone designates a single voxel
    pub const fn is_voxel(self) -> bool {
        matches!(self, Zone::Voxel(_))
    }

    /// Bucket index used when partitioning entities: voxels 0..8, everything else 8
    pub const fn bucket(self) -> usize {
        match self {
            Zone::Voxel(v) => v.index(),
            Zone::Icosep(_) | Zone::Indeterminate => ZONE_BUCKETS - 1,
        }
    }
}

impl From<Voxel> for Zone {
    fn from(voxel: Voxel) -> Self {
        Zone::Voxel(voxel)
    }
}

/// Number of buckets a node partitions its entities into (eight voxels + icosep)
pub const ZONE_BUCKETS: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Below,
    Above,
    Straddle,
    Unordered,
}

fn side(lower: f64, upper: f64, cut: f64) -> Side {
    if lower.is_nan() || upper.is_nan() || cut.is_nan() {
        Side::Unordered
    } else if upper <= cut && lower < cut {
        Side::Below
    } else if lower >= cut && upper > cut {
        Side::Above
    } else {
        Side::Straddle
    }
}

/// Whether the interval `lower..=upper` straddles a plane at `cut`
pub(crate) fn straddles(lower: f64, upper: f64, cut: f64) -> bool {
    side(lower, upper, cut) == Side::Straddle
}

/// Classify a box against the three planes through `cut`.
///
/// Pure and total: every input yields exactly one zone.
pub fn classify(cut: &Point3, lower: &Point3, upper: &Point3) -> Zone {
    let sides = Axis::ALL.map(|axis| {
        let i = axis.index();
        side(lower[i], upper[i], cut[i])
    });

    if sides.contains(&Side::Unordered) {
        return Zone::Indeterminate;
    }

    let straddled = sides.iter().filter(|s| **s == Side::Straddle).count();
    match straddled {
        0 => Zone::Voxel(Voxel::from_sides(
            sides[Axis::X.index()] == Side::Above,
            sides[Axis::Y.index()] == Side::Above,
            sides[Axis::Z.index()] == Side::Above,
        )),
        1 if sides[Axis::X.index()] == Side::Straddle => Zone::Icosep(Icosep::Yz),
        1 if sides[Axis::Y.index()] == Side::Straddle => Zone::Icosep(Icosep::Xz),
        1 => Zone::Icosep(Icosep::Xy),
        _ => Zone::Icosep(Icosep::Spanning),
    }
}

/// Classify bounds against a cut point
pub fn classify_bounds(cut: &Point3, bounds: &AxisAlignedBounds) -> Zone {
    classify(cut, bounds.lower(), bounds.upper())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone_of(l: [f64; 3], u: [f64; 3]) -> Zone {
        let cut = Point3::new(100.0, 100.0, 100.0);
        classify(&cut, &Point3::from(l), &Point3::from(u))
    }

    #[test]
    fn test_reference_voxels() {
        use Voxel::*;
        let cases = [
            ([0.0, 0.0, 0.0], [1.0, 1.0, 1.0], SouthWestFront),
            ([0.0, 1000.0, 0.0], [1.0, 1001.0, 1.0], SouthWestBack),
            ([1000.0, 0.0, 0.0], [1001.0, 1.0, 1.0], SouthEastFront),
            ([1000.0, 1000.0, 0.0], [1001.0, 1001.0, 1.0], SouthEastBack),
            ([0.0, 0.0, 1000.0], [1.0, 1.0, 1001.0], NorthWestFront),
            ([0.0, 1000.0, 1000.0], [1.0, 1001.0, 1001.0], NorthWestBack),
            ([1000.0, 0.0, 1000.0], [1001.0, 1.0, 1001.0], NorthEastFront),
            ([1000.0, 1000.0, 1000.0], [1001.0, 1001.0, 1001.0], NorthEastBack),
        ];
        for (lower, upper, expected) in cases {
            assert_eq!(zone_of(lower, upper), Zone::Voxel(expected), "box {lower:?}-{upper:?}");
        }
    }

    #[test]
    fn test_reference_icoseps() {
        assert_eq!(zone_of([0.0, 0.0, 0.0], [1000.0, 1.0, 1.0]), Zone::Icosep(Icosep::Yz));
        assert_eq!(zone_of([0.0, 0.0, 0.0], [1.0, 1000.0, 1.0]), Zone::Icosep(Icosep::Xz));
        assert_eq!(zone_of([0.0, 0.0, 0.0], [1.0, 1.0, 1000.0]), Zone::Icosep(Icosep::Xy));
        assert_eq!(
            zone_of([0.0, 0.0, 0.0], [1000.0, 1000.0, 1.0]),
            Zone::Icosep(Icosep::Spanning)
        );
        assert_eq!(
            zone_of([0.0, 0.0, 0.0], [1000.0, 1000.0, 1000.0]),
            Zone::Icosep(Icosep::Spanning)
        );
    }

    #[test]
    fn test_touching_stays_on_its_side() {
        // Upper face on the plane: still west
        assert_eq!(
            zone_of([0.0, 0.0, 0.0], [100.0, 1.0, 1.0]),
            Zone::Voxel(Voxel::SouthWestFront)
        );
        // Lower face on the plane: east
        assert_eq!(
            zone_of([100.0, 0.0, 0.0], [101.0, 1.0, 1.0]),
            Zone::Voxel(Voxel::SouthEastFront)
        );
        // Flat box lying in the plane: coincident, icosep
        assert_eq!(zone_of([100.0, 0.0, 0.0], [100.0, 1.0, 1.0]), Zone::Icosep(Icosep::Yz));
    }

    #[test]
    fn test_nan_is_indeterminate() {
        let cut = Point3::new(f64::NAN, 0.0, 0.0);
        let zone = classify(&cut, &Point3::new(1.0, 1.0, 1.0), &Point3::new(2.0, 2.0, 2.0));
        assert_eq!(zone, Zone::Indeterminate);
    }

    #[test]
    fn test_voxel_index_round_trip() {
        for (i, voxel) in Voxel::ALL.iter().enumerate() {
            assert_eq!(voxel.index(), i);
            assert_eq!(Voxel::from_index(i), Some(*voxel));
        }
        assert_eq!(Voxel::from_index(8), None);
        assert!(Voxel::NorthEastFront.is_upper(Axis::X));
        assert!(!Voxel::NorthEastFront.is_upper(Axis::Y));
        assert!(Voxel::NorthEastFront.is_upper(Axis::Z));
    }

    #[test]
    fn test_buckets() {
        assert_eq!(Zone::Voxel(Voxel::NorthEastBack).bucket(), 7);
        assert_eq!(Zone::Icosep(Icosep::Xy).bucket(), 8);
        assert_eq!(Zone::Indeterminate.bucket(), 8);
    }
}
