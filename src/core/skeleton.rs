//! The 1-skeleton of a projected diagram: edges and their directions.
//!
//! A power diagram's 1-faces come in two flavors: internal edges, bounded
//! segments between two 0-faces, and extremal edges, rays leaving the
//! diagram through a single 0-face. Downstream consumers (drawing, cell
//! walks) need each edge's carrier direction, which is the normal to the
//! affine span of the centers of the spheres whose cells share the edge.
//!
//! For extremal edges the sign of the direction matters: the ray must point
//! away from the sphere that caps it at its single 0-face. The sign is fixed
//! by probing the power of an edge sphere against the power of a capping
//! sphere one step along the candidate direction; directions assume the
//! minimal-diagram family.

#![forbid(unsafe_code)]

use std::collections::BTreeSet;

use nalgebra::DVector;
use thiserror::Error;

use crate::core::collections::{FastHashSet, SmallBuffer};
use crate::core::lattice::{FaceKey, IncidenceLattice, LatticeError};
use crate::core::sphere::{LiftingError, Sphere, validate_spheres};
use crate::geometry::hyperplane::{Hyperplane, HyperplaneError};

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors raised while extracting the diagram's 1-skeleton.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum SkeletonError {
    /// Invalid sphere input.
    #[error(transparent)]
    Lifting(#[from] LiftingError),
    /// The sphere set does not live in the diagram's dimension.
    #[error("spheres have dimension {found}, diagram lives in dimension {expected}")]
    DimensionMismatch {
        /// Ambient dimension of the diagram.
        expected: usize,
        /// Dimension of the spheres.
        found: usize,
    },
    /// A lattice query failed.
    #[error(transparent)]
    Lattice(#[from] LatticeError),
    /// A cell face carries no site label linking it to a sphere.
    #[error("cell {face:?} carries no sphere site")]
    MissingSite {
        /// The unlabeled cell.
        face: FaceKey,
    },
    /// A site label does not index into the sphere slice.
    #[error("site {site} of face {face:?} exceeds the {count} supplied spheres")]
    UnknownSite {
        /// The face carrying the label.
        face: FaceKey,
        /// The out-of-range site.
        site: usize,
        /// Number of spheres supplied.
        count: usize,
    },
    /// An edge has an unexpected number of endpoint 0-faces.
    #[error("edge {face:?} has {found} endpoints, expected 1 or 2")]
    MalformedEdge {
        /// The offending 1-face.
        face: FaceKey,
        /// Number of endpoints found.
        found: usize,
    },
    /// The centers of an edge's spheres do not pin down a direction.
    #[error("edge {face:?} has a degenerate sphere span: {source}")]
    DegenerateEdge {
        /// The offending 1-face.
        face: FaceKey,
        /// The underlying fitting failure.
        #[source]
        source: HyperplaneError,
    },
    /// An extremal edge's endpoint borders no sphere beyond the edge's own.
    #[error("cannot orient extremal edge {face:?}: no capping sphere at its endpoint")]
    AmbiguousDirection {
        /// The offending 1-face.
        face: FaceKey,
    },
}

// =============================================================================
// EDGES
// =============================================================================

/// Whether a 1-face is a bounded segment or an unbounded ray.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EdgeKind {
    /// Bounded edge between two 0-faces.
    Internal,
    /// Unbounded ray leaving the diagram through one 0-face.
    Extremal,
}

/// A 1-face of the diagram together with its geometry.
#[derive(Clone, Debug)]
pub struct DiagramEdge {
    /// Key of the 1-face in the diagram lattice.
    pub face: FaceKey,
    /// Bounded or unbounded.
    pub kind: EdgeKind,
    /// The incident 0-faces: two for internal edges, one for extremal.
    pub endpoints: SmallBuffer<FaceKey, 2>,
    /// Indices of the spheres whose cells share the edge.
    pub sites: BTreeSet<usize>,
    /// Unit carrier direction. For extremal edges the sign points along the
    /// ray; for internal edges it is arbitrary.
    pub direction: DVector<f64>,
}

/// Extract all 1-faces of a projected diagram with their directions.
///
/// `spheres` must be the input the diagram was built from; the cell site
/// labels of the lattice index into it. Diagrams on the line have no
/// 1-skeleton to speak of (their 1-faces are the cells themselves), so an
/// empty vector is returned for ambient dimension < 2.
///
/// # Errors
///
/// See [`SkeletonError`].
pub fn diagram_edges(
    diagram: &IncidenceLattice,
    spheres: &[Sphere],
) -> Result<Vec<DiagramEdge>, SkeletonError> {
    if diagram.ambient_dim() < 2 {
        return Ok(Vec::new());
    }

    let dimension = validate_spheres(spheres)?;
    if dimension != diagram.ambient_dim() {
        return Err(SkeletonError::DimensionMismatch {
            expected: diagram.ambient_dim(),
            found: dimension,
        });
    }

    let mut visited: FastHashSet<FaceKey> = FastHashSet::default();
    let mut edges = Vec::new();
    for vertex in diagram.vertices() {
        for &edge in diagram.parents(vertex)? {
            if !visited.insert(edge) {
                continue;
            }
            edges.push(build_edge(diagram, spheres, edge, vertex)?);
        }
    }

    Ok(edges)
}

fn build_edge(
    diagram: &IncidenceLattice,
    spheres: &[Sphere],
    edge: FaceKey,
    seen_from: FaceKey,
) -> Result<DiagramEdge, SkeletonError> {
    let endpoints: SmallBuffer<FaceKey, 2> =
        diagram.children(edge)?.iter().copied().collect();
    let kind = match endpoints.len() {
        1 => EdgeKind::Extremal,
        2 => EdgeKind::Internal,
        found => return Err(SkeletonError::MalformedEdge { face: edge, found }),
    };

    let sites = cell_sites(diagram, spheres, edge)?;
    let centers: Vec<DVector<f64>> = sites
        .iter()
        .map(|&site| spheres[site].center().clone())
        .collect();
    let plane = Hyperplane::spanning(&centers)
        .map_err(|source| SkeletonError::DegenerateEdge { face: edge, source })?;
    let mut direction = plane.normal().clone();

    if kind == EdgeKind::Extremal {
        // The ray leaves its endpoint away from the spheres that cap it
        // there: along the correct direction the edge's own spheres keep
        // winning the power comparison.
        let endpoint_sites = cell_sites(diagram, spheres, seen_from)?;
        let capping = endpoint_sites
            .difference(&sites)
            .next()
            .copied()
            .ok_or(SkeletonError::AmbiguousDirection { face: edge })?;
        let active = *sites
            .iter()
            .next()
            .unwrap_or_else(|| unreachable!("edges border at least one cell"));

        let origin = diagram
            .face(seen_from)?
            .coordinates()
            .ok_or(LatticeError::MissingCoordinates { vertex: seen_from })?;
        let probe = origin + &direction;
        if spheres[active].power(&probe) > spheres[capping].power(&probe) {
            direction = -direction;
        }
    }

    Ok(DiagramEdge { face: edge, kind, endpoints, sites, direction })
}

/// Site labels of the cells a face borders.
fn cell_sites(
    diagram: &IncidenceLattice,
    spheres: &[Sphere],
    face: FaceKey,
) -> Result<BTreeSet<usize>, SkeletonError> {
    let mut sites = BTreeSet::new();
    for cell in diagram.leafs_above(face)? {
        let site = diagram
            .face(cell)?
            .site()
            .ok_or(SkeletonError::MissingSite { face: cell })?;
        if site >= spheres.len() {
            return Err(SkeletonError::UnknownSite { face: cell, site, count: spheres.len() });
        }
        sites.insert(site);
    }
    Ok(sites)
}
