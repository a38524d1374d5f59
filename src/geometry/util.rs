//! Numeric utilities for runtime-dimensional geometry.
//!
//! This module contains the shared tolerance constants and the small pieces of
//! linear algebra the rest of the crate builds on: affine rank of a point set,
//! orthonormal bases of affine spans, and the SVD plumbing behind both. All
//! computations are over [`nalgebra::DVector`] because the pipeline changes
//! dimensionality at runtime (spheres in `R^d` are lifted to poles in
//! `R^(d+1)`).

#![forbid(unsafe_code)]

use nalgebra::{DMatrix, DVector};

/// Tolerance for deciding whether a singular value counts towards the rank of
/// an affine span.
///
/// The effective threshold is scaled by the largest singular value of the
/// span, so large coordinates do not spuriously inflate the rank.
pub const RANK_TOLERANCE: f64 = 1e-10;

/// Tolerance for side-of-hyperplane tests against unit normals.
pub const SIDE_TOLERANCE: f64 = 1e-9;

/// Squared-distance threshold below which two points are considered
/// coincident.
pub const COINCIDENCE_TOLERANCE: f64 = 1e-20;

/// The singular value decomposition of the affine span of a point set.
///
/// Rows `p_i - p_0` of the difference matrix are padded with zero rows up to a
/// square matrix so that the full set of right singular vectors is available;
/// vectors paired with a (near-)zero singular value span the orthogonal
/// complement of the affine span.
pub(crate) struct SpanDecomposition {
    /// Singular values, paired with the rows of `v_t`.
    pub singular_values: DVector<f64>,
    /// Right singular vectors, one per row.
    pub v_t: DMatrix<f64>,
}

impl SpanDecomposition {
    /// Decompose the affine span of `points`, all of dimension `dim`.
    pub(crate) fn of(points: &[DVector<f64>], dim: usize) -> Self {
        let rows = points.len().saturating_sub(1).max(dim);
        let mut differences = DMatrix::<f64>::zeros(rows, dim);
        if let Some((origin, rest)) = points.split_first() {
            for (row, point) in rest.iter().enumerate() {
                differences.row_mut(row).copy_from(&(point - origin).transpose());
            }
        }

        let svd = differences.svd(false, true);
        let v_t = svd
            .v_t
            .unwrap_or_else(|| unreachable!("right singular vectors were requested"));
        Self {
            singular_values: svd.singular_values,
            v_t,
        }
    }

    /// Scale-adaptive threshold separating rank from kernel directions.
    pub(crate) fn threshold(&self) -> f64 {
        RANK_TOLERANCE * self.singular_values.max().max(1.0)
    }

    /// Number of singular values above the adaptive threshold.
    pub(crate) fn rank(&self) -> usize {
        let threshold = self.threshold();
        self.singular_values.iter().filter(|&&s| s > threshold).count()
    }
}

/// Dimension of the affine hull of `points` living in `R^dim`.
///
/// A single point (or the empty set) has affine rank 0, two distinct points
/// have rank 1, and so on up to `dim`.
///
/// # Examples
///
/// ```
/// use nalgebra::DVector;
/// use powerdiagram::geometry::util::affine_rank;
///
/// let points = vec![
///     DVector::from_vec(vec![0.0, 0.0]),
///     DVector::from_vec(vec![1.0, 0.0]),
///     DVector::from_vec(vec![2.0, 0.0]),
/// ];
/// assert_eq!(affine_rank(&points, 2), 1);
/// ```
#[must_use]
pub fn affine_rank(points: &[DVector<f64>], dim: usize) -> usize {
    if points.len() < 2 {
        return 0;
    }
    SpanDecomposition::of(points, dim).rank()
}

/// Orthonormal basis of the affine span of `points`, together with the origin
/// the basis is anchored at (the first point).
///
/// Projecting every point onto the basis yields coordinates in `R^r`, where
/// `r` is the affine rank; this is how degenerate ("flat") hull inputs are
/// reduced to a full-dimensional subproblem.
#[must_use]
pub fn affine_basis(points: &[DVector<f64>], dim: usize) -> (DVector<f64>, Vec<DVector<f64>>) {
    let origin = points
        .first()
        .cloned()
        .unwrap_or_else(|| DVector::zeros(dim));
    if points.len() < 2 {
        return (origin, Vec::new());
    }

    let span = SpanDecomposition::of(points, dim);
    let threshold = span.threshold();
    let basis = span
        .singular_values
        .iter()
        .enumerate()
        .filter(|&(_, &s)| s > threshold)
        .map(|(row, _)| span.v_t.row(row).transpose())
        .collect();
    (origin, basis)
}

/// Coordinates of `point` in the chart given by `origin` and an orthonormal
/// `basis` of an affine subspace.
#[must_use]
pub fn project_onto_basis(
    point: &DVector<f64>,
    origin: &DVector<f64>,
    basis: &[DVector<f64>],
) -> DVector<f64> {
    let shifted = point - origin;
    DVector::from_iterator(basis.len(), basis.iter().map(|b| b.dot(&shifted)))
}

/// Squared Euclidean distance between two points.
#[inline]
#[must_use]
pub fn squared_distance(a: &DVector<f64>, b: &DVector<f64>) -> f64 {
    (a - b).norm_squared()
}
