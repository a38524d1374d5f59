//! Weighted spheres, the power function, and the lifting map.
//!
//! A [`Sphere`] is the only externally supplied entity of the pipeline; every
//! other structure is derived from it. Spheres are immutable once built and
//! identified by their position in the caller's input slice (the "site"
//! index carried through the hull and both lattices).

#![forbid(unsafe_code)]

use nalgebra::DVector;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Input-validation errors raised before any geometry is computed.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum LiftingError {
    /// The sphere set is empty.
    #[error("cannot build a diagram from an empty sphere set")]
    EmptyInput,
    /// Sphere centers disagree in dimensionality.
    #[error("sphere {index} has center dimension {found}, expected {expected}")]
    DimensionMismatch {
        /// Index of the offending sphere in the input.
        index: usize,
        /// Dimension of the preceding spheres.
        expected: usize,
        /// Dimension of the offending sphere's center.
        found: usize,
    },
    /// A radius is negative or not finite.
    #[error("sphere {index} has invalid radius {radius}")]
    InvalidRadius {
        /// Index of the offending sphere in the input.
        index: usize,
        /// The rejected radius.
        radius: f64,
    },
}

// =============================================================================
// SPHERE
// =============================================================================

/// A sphere in `R^d` with non-negative radius, the weighted site of a power
/// diagram.
///
/// # Examples
///
/// ```
/// use powerdiagram::sphere;
///
/// let s = sphere!([0.0, 4.0], 1.0);
/// assert_eq!(s.dimension(), 2);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sphere {
    center: DVector<f64>,
    radius: f64,
}

impl Sphere {
    /// Build a sphere from its center and radius.
    #[must_use]
    pub fn new(center: DVector<f64>, radius: f64) -> Self {
        Self { center, radius }
    }

    /// The center of the sphere.
    #[must_use]
    pub fn center(&self) -> &DVector<f64> {
        &self.center
    }

    /// The radius of the sphere.
    #[must_use]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Dimension of the space the sphere lives in.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.center.len()
    }

    /// Power of `point` with respect to this sphere: the squared distance to
    /// the center minus the squared radius.
    ///
    /// Points inside the sphere have negative power, points on it zero, and
    /// points outside positive power.
    #[must_use]
    pub fn power(&self, point: &DVector<f64>) -> f64 {
        (point - &self.center).norm_squared() - self.radius * self.radius
    }

    /// The pole of the sphere: its lifting into `R^(d+1)`.
    ///
    /// The first `d` coordinates are the center; the last is
    /// `|center|² - radius²`.
    #[must_use]
    pub fn pole(&self) -> DVector<f64> {
        let lift = self.center.norm_squared() - self.radius * self.radius;
        DVector::from_iterator(
            self.center.len() + 1,
            self.center.iter().copied().chain(std::iter::once(lift)),
        )
    }
}

/// Validate a sphere set and return its common dimension.
///
/// # Errors
///
/// - [`LiftingError::EmptyInput`] for an empty slice,
/// - [`LiftingError::DimensionMismatch`] if centers disagree in length,
/// - [`LiftingError::InvalidRadius`] for negative or non-finite radii.
pub fn validate_spheres(spheres: &[Sphere]) -> Result<usize, LiftingError> {
    let Some(first) = spheres.first() else {
        return Err(LiftingError::EmptyInput);
    };
    let dimension = first.dimension();

    for (index, sphere) in spheres.iter().enumerate() {
        if sphere.dimension() != dimension {
            return Err(LiftingError::DimensionMismatch {
                index,
                expected: dimension,
                found: sphere.dimension(),
            });
        }
        if !(sphere.radius.is_finite() && sphere.radius >= 0.0) {
            return Err(LiftingError::InvalidRadius {
                index,
                radius: sphere.radius,
            });
        }
    }

    Ok(dimension)
}

/// Convenience constructor for a [`Sphere`] from a coordinate array and a
/// radius.
///
/// # Examples
///
/// ```
/// use powerdiagram::sphere;
///
/// let s = sphere!([1.0, 2.0, 3.0], 0.5);
/// assert_eq!(s.radius(), 0.5);
/// ```
#[macro_export]
macro_rules! sphere {
    ([$($coord:expr),* $(,)?], $radius:expr) => {
        $crate::core::sphere::Sphere::new(
            $crate::nalgebra::DVector::from_vec(vec![$($coord),*]),
            $radius,
        )
    };
}
