//! Hyperplanes and the polar transform.
//!
//! A [`Hyperplane`] is stored in normal form `normal · x = offset` with a unit
//! normal. Hyperplanes are fitted to the vertex sets of lattice facets, carry
//! the orientation logic used to split a lifted hull into its upper and lower
//! families, and provide the polar projection that turns a facet of the lifted
//! hull into a 0-face of the power diagram.
//!
//! # Polar convention
//!
//! A sphere `(c, r)` lifts to the pole `(c, |c|² - r²)`, and its power
//! function is the vertical distance to the tangent hyperplane
//! `x_d = 2c·x - (|c|² - r²)` of the lifted paraboloid. A supporting
//! hyperplane `n·x = offset` of the hull of poles with `n_d ≠ 0` can be
//! rewritten in that tangent form, which identifies the dual point
//!
//! ```text
//! v = -n_head / (2 n_d),        v_d = offset / n_d
//! ```
//!
//! The transform is invariant under rescaling of `(n, offset)`, so the sign
//! ambiguity of a fitted normal is harmless here. It is undefined exactly when
//! `n_d` vanishes, i.e. for hyperplanes parallel to the lifted axis; those
//! fail with [`HyperplaneError::NonPolarizable`].

#![forbid(unsafe_code)]

use nalgebra::DVector;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::util::{SIDE_TOLERANCE, SpanDecomposition};

/// Component magnitude below which a hyperplane counts as parallel to the
/// lifted axis and therefore has no polar image.
pub const POLAR_TOLERANCE: f64 = 1e-12;

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors produced when fitting or transforming hyperplanes.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum HyperplaneError {
    /// The normal vector has (numerically) zero length.
    #[error("hyperplane normal has zero length")]
    ZeroNormal,
    /// Too few points were supplied to span a hyperplane.
    #[error("{found} points cannot span a hyperplane in dimension {dim}")]
    TooFewPoints {
        /// Number of points supplied.
        found: usize,
        /// Ambient dimension of the points.
        dim: usize,
    },
    /// Points supplied with inconsistent dimensionality.
    #[error("point {index} has dimension {found}, expected {expected}")]
    DimensionMismatch {
        /// Index of the offending point.
        index: usize,
        /// Dimension of the other points.
        expected: usize,
        /// Dimension of the offending point.
        found: usize,
    },
    /// The affine span of the points does not have codimension 1.
    ///
    /// Either the points are affinely dependent below hyperplane rank
    /// (degenerate face) or they span the whole space (no common
    /// hyperplane).
    #[error("point set spans affine rank {rank}, expected {expected}")]
    DegenerateSpan {
        /// Affine rank of the supplied points.
        rank: usize,
        /// Rank a hyperplane requires, `dim - 1`.
        expected: usize,
    },
    /// The hyperplane is parallel to the lifted axis; its polar point lies at
    /// infinity.
    #[error("hyperplane is vertical (lifted-axis component {axis_component:e}), polar point undefined")]
    NonPolarizable {
        /// The (near-zero) component of the unit normal along the lifted axis.
        axis_component: f64,
    },
}

// =============================================================================
// HYPERPLANE
// =============================================================================

/// Orientation status of a facet normal relative to the hull it bounds.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FacetOrientation {
    /// Some hull point lies strictly off the hyperplane; the normal has been
    /// flipped (if necessary) to point away from the hull.
    Proper,
    /// No hull point lies off the hyperplane: the hull is flat, both sides of
    /// the facet face "outwards" and the orientation is a convention.
    Ambiguous,
}

/// A hyperplane `normal · x = offset` with unit normal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hyperplane {
    normal: DVector<f64>,
    offset: f64,
}

impl Hyperplane {
    /// Build a hyperplane from a (not necessarily unit) normal and offset.
    ///
    /// # Errors
    ///
    /// Returns [`HyperplaneError::ZeroNormal`] if the normal cannot be
    /// normalized.
    pub fn new(normal: DVector<f64>, offset: f64) -> Result<Self, HyperplaneError> {
        let length = normal.norm();
        if length <= POLAR_TOLERANCE {
            return Err(HyperplaneError::ZeroNormal);
        }
        Ok(Self {
            normal: normal / length,
            offset: offset / length,
        })
    }

    /// Fit the unique hyperplane through a set of points whose affine span
    /// has codimension 1.
    ///
    /// The sign of the returned normal is arbitrary; use
    /// [`Hyperplane::orient_outward`] to fix it against a point cloud.
    ///
    /// # Errors
    ///
    /// - [`HyperplaneError::TooFewPoints`] for fewer than one point,
    /// - [`HyperplaneError::DimensionMismatch`] for ragged input,
    /// - [`HyperplaneError::DegenerateSpan`] if the affine rank of the points
    ///   is not exactly `dim - 1`.
    ///
    /// # Examples
    ///
    /// ```
    /// use nalgebra::DVector;
    /// use powerdiagram::geometry::hyperplane::Hyperplane;
    ///
    /// let points = vec![
    ///     DVector::from_vec(vec![1.0, 0.0]),
    ///     DVector::from_vec(vec![0.0, 1.0]),
    /// ];
    /// let plane = Hyperplane::spanning(&points).unwrap();
    /// assert!(plane.contains(&DVector::from_vec(vec![0.5, 0.5])));
    /// ```
    pub fn spanning(points: &[DVector<f64>]) -> Result<Self, HyperplaneError> {
        let Some(first) = points.first() else {
            return Err(HyperplaneError::TooFewPoints { found: 0, dim: 0 });
        };
        let dim = first.len();
        if let Some((index, point)) = points.iter().enumerate().find(|(_, p)| p.len() != dim) {
            return Err(HyperplaneError::DimensionMismatch {
                index,
                expected: dim,
                found: point.len(),
            });
        }

        let span = SpanDecomposition::of(points, dim);
        let rank = span.rank();
        if rank + 1 != dim {
            return Err(HyperplaneError::DegenerateSpan {
                rank,
                expected: dim - 1,
            });
        }

        // The single kernel direction of the span is the normal.
        let threshold = span.threshold();
        let kernel_row = span
            .singular_values
            .iter()
            .enumerate()
            .find(|&(_, &s)| s <= threshold)
            .map(|(row, _)| row)
            .unwrap_or_else(|| unreachable!("rank {rank} of {dim} leaves a kernel direction"));
        let normal = span.v_t.row(kernel_row).transpose();
        let offset = normal.dot(first);
        Self::new(normal, offset)
    }

    /// The unit normal.
    #[must_use]
    pub fn normal(&self) -> &DVector<f64> {
        &self.normal
    }

    /// The offset in `normal · x = offset`.
    #[must_use]
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Signed distance of `point` from the hyperplane.
    #[must_use]
    pub fn signed_distance(&self, point: &DVector<f64>) -> f64 {
        self.normal.dot(point) - self.offset
    }

    /// Whether `point` lies on the hyperplane within [`SIDE_TOLERANCE`].
    #[must_use]
    pub fn contains(&self, point: &DVector<f64>) -> bool {
        self.signed_distance(point).abs() <= SIDE_TOLERANCE
    }

    /// Flip the hyperplane so its normal points to the opposite side.
    #[must_use]
    pub fn flipped(self) -> Self {
        Self {
            normal: -self.normal,
            offset: -self.offset,
        }
    }

    /// Orient the normal to face outwards with respect to a point cloud
    /// containing the hyperplane's polytope.
    ///
    /// The first point found strictly off the hyperplane decides the side. If
    /// no such point exists the polytope is flat; by convention the normal is
    /// then made to point towards negative values of the last axis (the
    /// lifted axis in this crate), so a flat hull deterministically shows up
    /// as a "lower" facet, and [`FacetOrientation::Ambiguous`] is reported so
    /// callers can treat both sides as boundary.
    #[must_use]
    pub fn orient_outward<'a, I>(self, cloud: I) -> (Self, FacetOrientation)
    where
        I: IntoIterator<Item = &'a DVector<f64>>,
    {
        for point in cloud {
            let distance = self.signed_distance(point);
            if distance > SIDE_TOLERANCE {
                return (self.flipped(), FacetOrientation::Proper);
            } else if distance < -SIDE_TOLERANCE {
                return (self, FacetOrientation::Proper);
            }
        }

        let last = self.normal.len() - 1;
        if self.normal[last] > 0.0 {
            (self.flipped(), FacetOrientation::Ambiguous)
        } else {
            (self, FacetOrientation::Ambiguous)
        }
    }

    /// Component of the unit normal along `axis`.
    #[must_use]
    pub fn axis_component(&self, axis: usize) -> f64 {
        self.normal[axis]
    }

    /// Polar point of the hyperplane in the lifted frame.
    ///
    /// See the module documentation for the convention. The last coordinate
    /// of the result is the (negated) offset of the tangent form and is
    /// discarded by the projection stage.
    ///
    /// # Errors
    ///
    /// Returns [`HyperplaneError::NonPolarizable`] if the hyperplane is
    /// parallel to the lifted axis.
    pub fn polar_point(&self) -> Result<DVector<f64>, HyperplaneError> {
        let last = self.normal.len() - 1;
        let axis_component = self.normal[last];
        if axis_component.abs() <= POLAR_TOLERANCE {
            return Err(HyperplaneError::NonPolarizable { axis_component });
        }

        let mut polar = self.normal.clone() * 0.5;
        polar[last] = -self.offset;
        polar *= -1.0 / axis_component;
        Ok(polar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    fn v(coords: &[f64]) -> DVector<f64> {
        DVector::from_column_slice(coords)
    }

    #[test]
    fn spanning_two_points_in_the_plane() {
        let plane = Hyperplane::spanning(&[v(&[0.0, -1.0]), v(&[4.0, 15.0])]).unwrap();
        assert!(plane.contains(&v(&[2.0, 7.0])));
        assert!(!plane.contains(&v(&[2.0, 8.0])));
        assert_relative_eq!(plane.normal().norm(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn spanning_rejects_degenerate_spans() {
        let err = Hyperplane::spanning(&[v(&[1.0, 1.0])]).unwrap_err();
        assert_eq!(err, HyperplaneError::DegenerateSpan { rank: 0, expected: 1 });

        // Full-rank point sets admit no common hyperplane either.
        let err =
            Hyperplane::spanning(&[v(&[0.0, 0.0]), v(&[1.0, 0.0]), v(&[0.0, 1.0])]).unwrap_err();
        assert_eq!(err, HyperplaneError::DegenerateSpan { rank: 2, expected: 1 });
    }

    #[test]
    fn spanning_rejects_ragged_points() {
        let err = Hyperplane::spanning(&[v(&[0.0, 0.0]), v(&[1.0])]).unwrap_err();
        assert!(matches!(
            err,
            HyperplaneError::DimensionMismatch { index: 1, expected: 2, found: 1 }
        ));
    }

    #[test]
    fn orientation_points_away_from_cloud() {
        let plane = Hyperplane::spanning(&[v(&[1.0, 0.0]), v(&[1.0, 1.0])]).unwrap();
        let cloud = [v(&[1.0, 0.0]), v(&[1.0, 1.0]), v(&[0.0, 0.5])];
        let (oriented, orientation) = plane.orient_outward(cloud.iter());

        assert_eq!(orientation, FacetOrientation::Proper);
        assert!(oriented.signed_distance(&v(&[0.0, 0.5])) < 0.0);
    }

    #[test]
    fn orientation_of_flat_cloud_is_ambiguous_and_downward() {
        let plane = Hyperplane::spanning(&[v(&[0.0, -1.0]), v(&[4.0, 15.0])]).unwrap();
        let cloud = [v(&[0.0, -1.0]), v(&[4.0, 15.0])];
        let (oriented, orientation) = plane.orient_outward(cloud.iter());

        assert_eq!(orientation, FacetOrientation::Ambiguous);
        assert!(oriented.axis_component(1) < 0.0);
    }

    #[test]
    fn polar_point_of_segment_hyperplane() {
        // Poles of the two unit spheres at x = 0 and x = 4; the power
        // bisector sits at x = 2.
        let plane = Hyperplane::spanning(&[v(&[0.0, -1.0]), v(&[4.0, 15.0])]).unwrap();
        let polar = plane.polar_point().unwrap();

        assert_relative_eq!(polar[0], 2.0, epsilon = 1e-9);
        assert_relative_eq!(polar[1], -1.0, epsilon = 1e-9);
    }

    #[test]
    fn polar_point_is_orientation_invariant() {
        let plane = Hyperplane::spanning(&[v(&[0.0, -1.0]), v(&[4.0, 15.0])]).unwrap();
        let flipped = plane.clone().flipped();
        assert_relative_eq!(
            plane.polar_point().unwrap(),
            flipped.polar_point().unwrap(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn vertical_hyperplane_is_not_polarizable() {
        let plane = Hyperplane::new(v(&[1.0, 0.0]), 3.0).unwrap();
        assert!(matches!(
            plane.polar_point(),
            Err(HyperplaneError::NonPolarizable { .. })
        ));
    }
}
