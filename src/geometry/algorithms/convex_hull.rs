//! Convex hull construction behind a pluggable engine trait.
//!
//! The diagram pipeline only depends on the [`ConvexHullEngine`] contract:
//! points in, face-incidence lattice out, with hull vertices labeled by their
//! input index. [`ExhaustiveHull`] is the crate's reference implementation.
//! It enumerates candidate supporting hyperplanes over point subsets, which
//! is exponential in the worst case but exact, dimension-agnostic, and free
//! of incremental bookkeeping; production users with large inputs are
//! expected to wrap a dedicated hull library behind the same trait.
//!
//! Affinely degenerate inputs (all points on a common hyperplane) are
//! handled by recursing inside an orthonormal basis of the affine span: the
//! flat point set becomes a single top face whose boundary is the hull of
//! the projected points. This is what makes the two-pole case work, where
//! the "hull" is a segment whose only facet is the segment itself.

#![forbid(unsafe_code)]

use std::collections::BTreeSet;

use log::debug;
use nalgebra::DVector;
use thiserror::Error;

use crate::core::lattice::{IncidenceLattice, LatticeError};
use crate::core::util::index_combinations;
use crate::geometry::hyperplane::{Hyperplane, HyperplaneError};
use crate::geometry::util::{
    COINCIDENCE_TOLERANCE, SIDE_TOLERANCE, affine_basis, affine_rank, project_onto_basis,
    squared_distance,
};

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors raised by hull construction.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum HullError {
    /// Fewer points than any hull needs.
    #[error("convex hull needs at least {needed} points, got {found}")]
    TooFewPoints {
        /// Number of points supplied.
        found: usize,
        /// Minimum required.
        needed: usize,
    },
    /// Points supplied with inconsistent dimensionality.
    #[error("point {index} has dimension {found}, expected {expected}")]
    DimensionMismatch {
        /// Index of the offending point.
        index: usize,
        /// Dimension of the first point.
        expected: usize,
        /// Dimension of the offending point.
        found: usize,
    },
    /// A coordinate is NaN or infinite.
    #[error("point {index} has a non-finite coordinate")]
    NonFiniteCoordinate {
        /// Index of the offending point.
        index: usize,
    },
    /// Two input points coincide within tolerance.
    ///
    /// For lifted sphere sets this means two input spheres are identical;
    /// the engine rejects this rather than producing an empty cell.
    #[error("points {first} and {second} coincide")]
    CoincidentPoints {
        /// Index of the first point.
        first: usize,
        /// Index of the coinciding point.
        second: usize,
    },
    /// A facet candidate could not be fitted.
    #[error("failed to fit a facet hyperplane: {source}")]
    FacetFit {
        /// The underlying fitting failure.
        #[from]
        source: HyperplaneError,
    },
    /// Assembling the output lattice failed.
    #[error("failed to assemble the hull lattice: {source}")]
    Lattice {
        /// The underlying lattice error.
        #[from]
        source: LatticeError,
    },
}

// =============================================================================
// ENGINE CONTRACT
// =============================================================================

/// A convex hull construction capability.
///
/// Implementations must return a lattice in the ambient dimension of the
/// input whose 0-faces carry the coordinates of the hull points and whose
/// `site` labels are the corresponding input indices. Input points that are
/// coincident must be rejected with [`HullError::CoincidentPoints`].
pub trait ConvexHullEngine {
    /// Compute the face-incidence lattice of the convex hull of `points`.
    ///
    /// # Errors
    ///
    /// Returns a [`HullError`] describing invalid input or a construction
    /// failure.
    fn hull_of(&self, points: &[DVector<f64>]) -> Result<IncidenceLattice, HullError>;
}

// =============================================================================
// EXHAUSTIVE REFERENCE ENGINE
// =============================================================================

/// Exact hull engine based on exhaustive supporting-hyperplane enumeration.
///
/// Runs in `O(C(n, d) · n)`; intended for moderate point counts and tests.
/// Points that lie on a facet's hyperplane without being extreme are
/// reported as vertices of that facet.
///
/// # Examples
///
/// ```
/// use nalgebra::DVector;
/// use powerdiagram::geometry::algorithms::convex_hull::{ConvexHullEngine, ExhaustiveHull};
///
/// let points = vec![
///     DVector::from_vec(vec![0.0, 0.0]),
///     DVector::from_vec(vec![1.0, 0.0]),
///     DVector::from_vec(vec![0.0, 1.0]),
/// ];
/// let hull = ExhaustiveHull.hull_of(&points).unwrap();
/// assert_eq!(hull.vertices().len(), 3);
/// assert_eq!(hull.facets().len(), 3);
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct ExhaustiveHull;

/// Faces of a hull described combinatorially by input-point index sets.
struct FaceSets {
    /// Indices of points that are hull vertices.
    vertices: BTreeSet<usize>,
    /// Faces of dimension ≥ 1 as `(dim, vertex index set)`.
    faces: Vec<(usize, BTreeSet<usize>)>,
}

impl ConvexHullEngine for ExhaustiveHull {
    fn hull_of(&self, points: &[DVector<f64>]) -> Result<IncidenceLattice, HullError> {
        let dim = validate_points(points)?;
        let sets = face_sets(points, dim)?;
        debug!(
            "hull of {} points in dimension {dim}: {} vertices, {} higher faces",
            points.len(),
            sets.vertices.len(),
            sets.faces.len()
        );

        let mut lattice = IncidenceLattice::new(dim);
        let mut key_of = std::collections::BTreeMap::new();
        for &index in &sets.vertices {
            let key = lattice.add_vertex(points[index].clone(), Some(index))?;
            key_of.insert(index, key);
        }

        let mut faces = sets.faces;
        faces.sort_by_key(|(face_dim, _)| *face_dim);
        for (face_dim, indices) in faces {
            let vertices: BTreeSet<_> = indices.iter().map(|index| key_of[index]).collect();
            lattice.add_face(face_dim, &vertices)?;
        }

        Ok(lattice)
    }
}

fn validate_points(points: &[DVector<f64>]) -> Result<usize, HullError> {
    let Some(first) = points.first() else {
        return Err(HullError::TooFewPoints { found: 0, needed: 2 });
    };
    if points.len() < 2 {
        return Err(HullError::TooFewPoints { found: 1, needed: 2 });
    }

    let dim = first.len();
    for (index, point) in points.iter().enumerate() {
        if point.len() != dim {
            return Err(HullError::DimensionMismatch {
                index,
                expected: dim,
                found: point.len(),
            });
        }
        if point.iter().any(|c| !c.is_finite()) {
            return Err(HullError::NonFiniteCoordinate { index });
        }
    }

    for first_index in 0..points.len() {
        for second_index in first_index + 1..points.len() {
            if squared_distance(&points[first_index], &points[second_index])
                <= COINCIDENCE_TOLERANCE
            {
                return Err(HullError::CoincidentPoints {
                    first: first_index,
                    second: second_index,
                });
            }
        }
    }

    Ok(dim)
}

/// Combinatorial hull faces of a validated point set.
fn face_sets(points: &[DVector<f64>], dim: usize) -> Result<FaceSets, HullError> {
    let rank = affine_rank(points, dim);
    if rank < dim {
        return flat_face_sets(points, dim);
    }

    if dim == 1 {
        return Ok(one_dimensional_face_sets(points));
    }

    // Every facet is supported by some hyperplane through `dim` of the
    // points; collect the maximal coplanar point set per supporting
    // hyperplane so coplanar facets are found exactly once.
    let mut facets: BTreeSet<BTreeSet<usize>> = BTreeSet::new();
    for combination in index_combinations(points.len(), dim) {
        let support: Vec<DVector<f64>> =
            combination.iter().map(|&index| points[index].clone()).collect();
        let plane = match Hyperplane::spanning(&support) {
            Ok(plane) => plane,
            Err(HyperplaneError::DegenerateSpan { .. }) => continue,
            Err(other) => return Err(other.into()),
        };

        let mut above = false;
        let mut below = false;
        let mut coplanar = BTreeSet::new();
        for (index, point) in points.iter().enumerate() {
            let distance = plane.signed_distance(point);
            if distance > SIDE_TOLERANCE {
                above = true;
            } else if distance < -SIDE_TOLERANCE {
                below = true;
            } else {
                coplanar.insert(index);
            }
        }
        if above && below {
            continue;
        }
        facets.insert(coplanar);
    }

    let vertices: BTreeSet<usize> = facets.iter().flatten().copied().collect();

    // The proper faces of a polytope are the intersections of its facets;
    // iterate pairwise intersections to the closure.
    let mut known: BTreeSet<BTreeSet<usize>> = facets.clone();
    let mut frontier: Vec<BTreeSet<usize>> = facets.iter().cloned().collect();
    while let Some(current) = frontier.pop() {
        for other in facets.iter() {
            let intersection: BTreeSet<usize> =
                current.intersection(other).copied().collect();
            if intersection.len() < 2 || intersection == current || intersection == *other {
                continue;
            }
            if known.insert(intersection.clone()) {
                frontier.push(intersection);
            }
        }
    }

    let mut faces = Vec::new();
    for indices in known {
        let members: Vec<DVector<f64>> =
            indices.iter().map(|&index| points[index].clone()).collect();
        let face_dim = affine_rank(&members, dim);
        if face_dim >= 1 {
            faces.push((face_dim, indices));
        }
    }

    Ok(FaceSets { vertices, faces })
}

/// Flat inputs: hull the points inside their affine span and wrap the result
/// in a single top face covering the whole set.
fn flat_face_sets(points: &[DVector<f64>], dim: usize) -> Result<FaceSets, HullError> {
    let (origin, basis) = affine_basis(points, dim);
    let rank = basis.len();
    debug!("flat hull input: rank {rank} < ambient {dim}, recursing in the affine span");

    let projected: Vec<DVector<f64>> = points
        .iter()
        .map(|point| project_onto_basis(point, &origin, &basis))
        .collect();
    let sub = face_sets(&projected, rank)?;

    let mut faces = sub.faces;
    faces.push((rank, sub.vertices.clone()));
    Ok(FaceSets { vertices: sub.vertices, faces })
}

/// Hull of points on a line: the two extreme points are the facets.
fn one_dimensional_face_sets(points: &[DVector<f64>]) -> FaceSets {
    let mut indices: Vec<usize> = (0..points.len()).collect();
    indices.sort_by(|&a, &b| {
        points[a][0]
            .partial_cmp(&points[b][0])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let minimum = indices[0];
    let maximum = indices[indices.len() - 1];

    FaceSets {
        vertices: [minimum, maximum].into(),
        faces: Vec::new(),
    }
}
