//! Math utilities and types
//!
//! World-space coordinates are double precision: simulation places can be
//! kilometres wide and entity bounds must not drift when classified
//! repeatedly against the same cut planes.

pub use nalgebra::Vector3;

/// 3D vector type
pub type Vec3 = Vector3<f64>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f64>;

/// Cartesian axis of a 3D point or box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// West/east axis
    X,
    /// Front/back axis
    Y,
    /// South/north axis
    Z,
}

impl Axis {
    /// All axes in storage order
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Component index of this axis in a nalgebra point or vector
    pub const fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        };
        f.write_str(name)
    }
}

/// Math utility functions
pub mod utils {
    use super::Point3;

    /// Component-wise minimum of two points
    pub fn min_point(a: &Point3, b: &Point3) -> Point3 {
        Point3::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z))
    }

    /// Component-wise maximum of two points
    pub fn max_point(a: &Point3, b: &Point3) -> Point3 {
        Point3::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z))
    }

    /// True if any coordinate of the point is NaN
    pub fn has_nan(p: &Point3) -> bool {
        p.x.is_nan() || p.y.is_nan() || p.z.is_nan()
    }

    /// Median of a slice of values, reordering the slice in place.
    ///
    /// Returns `None` for an empty slice or when a NaN is present.
    pub fn median_in_place(values: &mut [f64]) -> Option<f64> {
        if values.is_empty() || values.iter().any(|v| v.is_nan()) {
            return None;
        }
        let mid = values.len() / 2;
        let (_, upper, _) = values.select_nth_unstable_by(mid, f64::total_cmp);
        let upper = *upper;
        if values.len() % 2 == 1 {
            return Some(upper);
        }
        let lower = values[..mid]
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        Some((lower + upper) * 0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::utils::*;
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_median_odd_and_even() {
        let mut odd = [5.0, 1.0, 3.0];
        assert_relative_eq!(median_in_place(&mut odd).unwrap(), 3.0);

        let mut even = [4.0, 1.0, 3.0, 2.0];
        assert_relative_eq!(median_in_place(&mut even).unwrap(), 2.5);
    }

    #[test]
    fn test_median_rejects_empty_and_nan() {
        assert!(median_in_place(&mut []).is_none());
        assert!(median_in_place(&mut [1.0, f64::NAN]).is_none());
    }

    #[test]
    fn test_min_max_point() {
        let a = Point3::new(1.0, 5.0, -2.0);
        let b = Point3::new(3.0, 0.0, -4.0);
        assert_eq!(min_point(&a, &b), Point3::new(1.0, 0.0, -4.0));
        assert_eq!(max_point(&a, &b), Point3::new(3.0, 5.0, -2.0));
        assert_eq!(Axis::Z.index(), 2);
    }
}
