//! Axis-aligned bounding boxes in double precision world space

use crate::foundation::math::{utils, Axis, Point3, Vec3};
use super::error::{TreeError, TreeResult};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box with closed intervals on every axis.
///
/// Construction goes through [`AxisAlignedBounds::new`], which rejects a lower
/// corner above the upper corner (or NaN) on any axis, so every live value
/// satisfies `lower <= upper`. Deserialized values are validated the same way.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBounds", into = "RawBounds")]
pub struct AxisAlignedBounds {
    lower: Point3,
    upper: Point3,
}

#[derive(Serialize, Deserialize)]
struct RawBounds {
    lower: [f64; 3],
    upper: [f64; 3],
}

impl TryFrom<RawBounds> for AxisAlignedBounds {
    type Error = TreeError;

    fn try_from(raw: RawBounds) -> Result<Self, Self::Error> {
        Self::new(Point3::from(raw.lower), Point3::from(raw.upper))
    }
}

impl From<AxisAlignedBounds> for RawBounds {
    fn from(bounds: AxisAlignedBounds) -> Self {
        Self {
            lower: bounds.lower.coords.into(),
            upper: bounds.upper.coords.into(),
        }
    }
}

impl AxisAlignedBounds {
    /// Create bounds from lower and upper corners
    pub fn new(lower: Point3, upper: Point3) -> TreeResult<Self> {
        for axis in Axis::ALL {
            let (l, u) = (lower[axis.index()], upper[axis.index()]);
            // `!(l <= u)` also catches NaN on either side
            if !(l <= u) {
                return Err(TreeError::InvalidBounds { axis, lower: l, upper: u });
            }
        }
        Ok(Self { lower, upper })
    }

    /// Smallest bounds holding both corners, whatever their order.
    ///
    /// Infallible for NaN-free input; used for built-in constants.
    pub(crate) fn spanning(a: [f64; 3], b: [f64; 3]) -> Self {
        let (a, b) = (Point3::from(a), Point3::from(b));
        Self {
            lower: utils::min_point(&a, &b),
            upper: utils::max_point(&a, &b),
        }
    }

    /// Create bounds from the six scalar coordinates
    pub fn from_coords(
        lower_x: f64,
        lower_y: f64,
        lower_z: f64,
        upper_x: f64,
        upper_y: f64,
        upper_z: f64,
    ) -> TreeResult<Self> {
        Self::new(
            Point3::new(lower_x, lower_y, lower_z),
            Point3::new(upper_x, upper_y, upper_z),
        )
    }

    /// Create bounds centered at a point with given half extents
    pub fn from_center_extents(center: Point3, half_extents: Vec3) -> TreeResult<Self> {
        Self::new(center - half_extents, center + half_extents)
    }

    /// Degenerate bounds covering a single point
    pub fn from_point(point: Point3) -> TreeResult<Self> {
        Self::new(point, point)
    }

    /// Lower corner
    pub fn lower(&self) -> &Point3 {
        &self.lower
    }

    /// Upper corner
    pub fn upper(&self) -> &Point3 {
        &self.upper
    }

    /// Lower coordinate on an axis
    pub fn lower_on(&self, axis: Axis) -> f64 {
        self.lower[axis.index()]
    }

    /// Upper coordinate on an axis
    pub fn upper_on(&self, axis: Axis) -> f64 {
        self.upper[axis.index()]
    }

    /// Get the center of the box
    pub fn center(&self) -> Point3 {
        nalgebra::center(&self.lower, &self.upper)
    }

    /// Get the half size of the box on each axis
    pub fn extents(&self) -> Vec3 {
        (self.upper - self.lower) * 0.5
    }

    /// Smallest box containing both boxes
    pub fn union(&self, other: &AxisAlignedBounds) -> AxisAlignedBounds {
        Self {
            lower: utils::min_point(&self.lower, &other.lower),
            upper: utils::max_point(&self.upper, &other.upper),
        }
    }

    /// The eight corners, indexed with bit 0 = x, bit 1 = y, bit 2 = z (set = upper)
    pub fn corners(&self) -> [Point3; 8] {
        std::array::from_fn(|i| {
            Point3::new(
                if i & 1 != 0 { self.upper.x } else { self.lower.x },
                if i & 2 != 0 { self.upper.y } else { self.lower.y },
                if i & 4 != 0 { self.upper.z } else { self.lower.z },
            )
        })
    }

    /// Check if this box contains a point (boundary included)
    pub fn contains_point(&self, point: &Point3) -> bool {
        point.x >= self.lower.x && point.x <= self.upper.x &&
        point.y >= self.lower.y && point.y <= self.upper.y &&
        point.z >= self.lower.z && point.z <= self.upper.z
    }

    /// Check if this box fully contains another box (boundary included)
    pub fn contains(&self, other: &AxisAlignedBounds) -> bool {
        self.contains_point(&other.lower) && self.contains_point(&other.upper)
    }

    /// Check if this box intersects another box; touching faces intersect
    pub fn intersects(&self, other: &AxisAlignedBounds) -> bool {
        self.lower.x <= other.upper.x && self.upper.x >= other.lower.x &&
        self.lower.y <= other.upper.y && self.upper.y >= other.lower.y &&
        self.lower.z <= other.upper.z && self.upper.z >= other.lower.z
    }

    /// Replace one axis interval, keeping the others.
    ///
    /// Used by the sub-area splitter, which only ever shrinks an interval to
    /// one side of a cut lying inside it.
    pub(crate) fn with_interval(mut self, axis: Axis, lower: f64, upper: f64) -> Self {
        self.lower[axis.index()] = lower;
        self.upper[axis.index()] = upper;
        self
    }
}

impl std::fmt::Display for AxisAlignedBounds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[({}, {}, {}) - ({}, {}, {})]",
            self.lower.x, self.lower.y, self.lower.z,
            self.upper.x, self.upper.y, self.upper.z
        )
    }
}

/// Capability of anything with an axis-aligned extent in the place
pub trait Bounded {
    /// Current world-space bounds
    fn bounds(&self) -> AxisAlignedBounds;
}

impl Bounded for AxisAlignedBounds {
    fn bounds(&self) -> AxisAlignedBounds {
        *self
    }
}
