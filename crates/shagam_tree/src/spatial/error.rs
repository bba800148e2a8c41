//! Error conditions raised by the spatial index

use crate::foundation::math::Axis;
use thiserror::Error;

/// Spatial index errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TreeError {
    /// Bounds with a lower corner above the upper corner (or NaN) on an axis
    #[error("Invalid bounds on {axis} axis: lower {lower} > upper {upper}")]
    InvalidBounds {
        /// Offending axis
        axis: Axis,
        /// Lower coordinate supplied
        lower: f64,
        /// Upper coordinate supplied
        upper: f64,
    },

    /// The entity is already tracked; it must be removed first
    #[error("Entity already indexed: {0}")]
    DuplicateEntity(String),

    /// The entity is not tracked by this index
    #[error("Entity not found: {0}")]
    NotFound(String),

    /// Tree configuration rejected
    #[error("Invalid tree configuration: {0}")]
    InvalidConfig(String),
}

impl TreeError {
    /// Whether this error only reports a missing entity.
    ///
    /// Simulations remove entities speculatively; callers usually ignore this case.
    pub fn is_not_found(&self) -> bool {
        matches!(self, TreeError::NotFound(_))
    }

    pub(crate) fn duplicate<K: std::fmt::Debug>(key: &K) -> Self {
        TreeError::DuplicateEntity(format!("{key:?}"))
    }

    pub(crate) fn not_found<K: std::fmt::Debug>(key: &K) -> Self {
        TreeError::NotFound(format!("{key:?}"))
    }
}

/// Result type for spatial index operations
pub type TreeResult<T> = Result<T, TreeError>;
