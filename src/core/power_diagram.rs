//! The lifting-and-duality power diagram pipeline.
//!
//! A power diagram attributes every point of `R^d` to the sphere of least
//! power. Instead of intersecting cells directly, the pipeline lifts each
//! sphere to a pole in `R^(d+1)`, takes the convex hull of the poles, keeps
//! the facet family facing the relevant side of the lifted axis, and reads
//! the diagram off the polar dual of that family:
//!
//! ```text
//! spheres → lift → hull → separate → dualize(lower|upper) → project
//! ```
//!
//! The stages are plain functions over [`IncidenceLattice`]s and can be
//! driven individually; [`PowerDiagram`] wires them together behind the
//! `convert_to_lattice` entry point. Every stage either succeeds or fails
//! with a typed error carrying the offending face; no partial results are
//! returned and no state survives an invocation.

#![forbid(unsafe_code)]

use log::{debug, warn};
use nalgebra::DVector;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::lattice::{FaceKey, IncidenceLattice, LatticeError};
use crate::core::sphere::{LiftingError, Sphere, validate_spheres};
use crate::geometry::algorithms::convex_hull::{ConvexHullEngine, HullError};
use crate::geometry::hyperplane::{FacetOrientation, HyperplaneError};

/// Unit-normal components along the lifted axis smaller than this make a
/// facet "vertical": it bounds neither the minimal nor the maximal diagram.
pub const VERTICAL_TOLERANCE: f64 = 1e-9;

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors raised by the diagram pipeline.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum PowerDiagramError {
    /// Invalid sphere input.
    #[error(transparent)]
    Lifting(#[from] LiftingError),
    /// Too few spheres for the lifted hull to have any facet.
    #[error("a {dimension}-dimensional diagram needs at least {needed} spheres, got {found}")]
    TooFewSpheres {
        /// Number of spheres supplied.
        found: usize,
        /// Minimum required, `dimension + 1`.
        needed: usize,
        /// Dimension of the sphere centers.
        dimension: usize,
    },
    /// The hull engine failed; propagated unchanged.
    #[error(transparent)]
    HullConstruction(#[from] HullError),
    /// A lattice operation failed (degenerate face, foreign key, ...).
    #[error(transparent)]
    Lattice(#[from] LatticeError),
    /// A facet of the selected family has no polar point.
    #[error("facet {facet:?} of the hull cannot be polarized: {source}")]
    NonPolarizableFacet {
        /// The offending facet of the family sub-lattice.
        facet: FaceKey,
        /// The underlying polar failure.
        #[source]
        source: HyperplaneError,
    },
    /// The selected facet family is empty, so the diagram has no 0-faces.
    #[error("the {family} diagram family contains no facets")]
    EmptyFamily {
        /// The family that came up empty.
        family: DiagramFamily,
    },
}

// =============================================================================
// FAMILIES AND SEPARATION
// =============================================================================

/// Which one-sided facet family of the lifted hull to dualize.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum DiagramFamily {
    /// Lower family: cells of least power (the power diagram).
    Minimal,
    /// Upper family: cells of greatest power (the maximal power diagram).
    Maximal,
}

impl std::fmt::Display for DiagramFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Minimal => write!(f, "minimal"),
            Self::Maximal => write!(f, "maximal"),
        }
    }
}

/// The two one-sided facet families of a lifted hull.
///
/// Vertical facets belong to neither family; they are excluded from both
/// sub-lattices and reported here so callers can inspect the degeneracy.
#[derive(Clone, Debug)]
pub struct Separation {
    /// Sub-lattice induced by the facets whose outward normal rises along
    /// the lifted axis.
    pub upper: IncidenceLattice,
    /// Sub-lattice induced by the facets whose outward normal falls along
    /// the lifted axis.
    pub lower: IncidenceLattice,
    /// Hull facets parallel to the lifted axis, excluded from both families.
    pub vertical: Vec<FaceKey>,
}

// =============================================================================
// PIPELINE STAGES
// =============================================================================

/// Lift every sphere to its pole in `R^(d+1)`.
///
/// Output order corresponds to input order.
///
/// # Errors
///
/// Returns a [`LiftingError`] for empty, ragged, or invalid-radius input.
pub fn lift_spheres(spheres: &[Sphere]) -> Result<Vec<DVector<f64>>, LiftingError> {
    validate_spheres(spheres)?;
    Ok(spheres.iter().map(Sphere::pole).collect())
}

/// Split the facets of a lifted hull into the upper and lower family by the
/// lifted-axis component of their outward normals.
///
/// A facet whose hyperplane is parallel to the lifted axis is logged and
/// excluded from both families. A facet of a flat (not full-dimensional)
/// hull has no outward side and joins both families, since both one-sided
/// diagrams coincide there.
///
/// # Errors
///
/// Fails with a [`LatticeError`] if a facet's hyperplane cannot be fitted
/// (degenerate face) or the hull lattice is malformed.
pub fn separate(hull: &IncidenceLattice) -> Result<Separation, PowerDiagramError> {
    let axis = hull.ambient_dim() - 1;

    let mut cloud = Vec::new();
    for key in hull.vertices() {
        let face = hull.face(key)?;
        let coordinates = face
            .coordinates()
            .ok_or(LatticeError::MissingCoordinates { vertex: key })?;
        cloud.push(coordinates.clone());
    }

    let mut upper = Vec::new();
    let mut lower = Vec::new();
    let mut vertical = Vec::new();
    for facet in hull.facets() {
        let plane = hull.containing_hyperplane(facet)?;
        let (plane, orientation) = plane.orient_outward(cloud.iter());
        let component = plane.axis_component(axis);

        if component.abs() <= VERTICAL_TOLERANCE {
            warn!("facet {facet:?} is vertical, excluded from both diagram families");
            vertical.push(facet);
        } else if orientation == FacetOrientation::Ambiguous {
            debug!("facet {facet:?} bounds a flat hull, joining both families");
            upper.push(facet);
            lower.push(facet);
        } else if component > 0.0 {
            upper.push(facet);
        } else {
            lower.push(facet);
        }
    }
    debug!(
        "separated {} hull facets: {} upper, {} lower, {} vertical",
        upper.len() + lower.len() + vertical.len(),
        upper.len(),
        lower.len(),
        vertical.len()
    );

    Ok(Separation {
        upper: hull.restrict_to_facets(&upper)?,
        lower: hull.restrict_to_facets(&lower)?,
        vertical,
    })
}

/// Polar-dualize one facet family: reverse all incidence edges, then place
/// every dual 0-face at the polar point of the corresponding primal facet's
/// hyperplane.
///
/// The result still lives in the lifted dimension `d + 1`; apply
/// [`project_to_base`] to land in `R^d`.
///
/// # Errors
///
/// - [`PowerDiagramError::Lattice`] for degenerate facets or malformed
///   input,
/// - [`PowerDiagramError::NonPolarizableFacet`] if a facet hyperplane is
///   parallel to the lifted axis.
pub fn dualize(family: &IncidenceLattice) -> Result<IncidenceLattice, PowerDiagramError> {
    let mut reversed = family.revert_edges()?;

    for facet in family.facets() {
        let plane = family.containing_hyperplane(facet)?;
        let polar = plane
            .polar_point()
            .map_err(|source| PowerDiagramError::NonPolarizableFacet { facet, source })?;

        let dual_vertex = reversed.dual_of[&facet];
        reversed.lattice.set_vertex_coordinates(dual_vertex, polar)?;
    }

    Ok(reversed.lattice)
}

/// Drop the lifted coordinate from every 0-face, leaving the diagram in
/// `R^d`. Topology is untouched.
///
/// # Errors
///
/// Fails with a [`LatticeError`] if the lattice is not in a lifted
/// dimension.
pub fn project_to_base(mut dual: IncidenceLattice) -> Result<IncidenceLattice, PowerDiagramError> {
    dual.project_out_last_axis()?;
    Ok(dual)
}

// =============================================================================
// PIPELINE
// =============================================================================

/// Power diagram construction by lifting, hulling, and dualizing, generic
/// over the hull engine.
///
/// # Examples
///
/// ```
/// use powerdiagram::core::power_diagram::{DiagramFamily, PowerDiagram};
/// use powerdiagram::geometry::algorithms::convex_hull::ExhaustiveHull;
/// use powerdiagram::sphere;
///
/// let spheres = vec![sphere!([0.0], 1.0), sphere!([4.0], 1.0)];
/// let diagram = PowerDiagram::new(ExhaustiveHull)
///     .convert_to_lattice(&spheres, DiagramFamily::Minimal)
///     .unwrap();
///
/// // Two equal spheres meet at the midpoint of their centers.
/// let vertex = diagram.vertices()[0];
/// let position = diagram.face(vertex).unwrap().coordinates().unwrap();
/// assert!((position[0] - 2.0).abs() < 1e-9);
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct PowerDiagram<H> {
    engine: H,
}

impl<H: ConvexHullEngine> PowerDiagram<H> {
    /// Build a pipeline around a hull engine.
    #[must_use]
    pub fn new(engine: H) -> Self {
        Self { engine }
    }

    /// The hull engine this pipeline uses.
    #[must_use]
    pub fn engine(&self) -> &H {
        &self.engine
    }

    /// Compute the incidence lattice of the power diagram of `spheres`.
    ///
    /// The returned lattice lives in `R^d`: its 0-faces are the diagram
    /// vertices (positioned), its leafs are the cells, labeled with the
    /// index of the sphere they belong to.
    ///
    /// # Errors
    ///
    /// See [`PowerDiagramError`]; every failure aborts the whole
    /// computation.
    pub fn convert_to_lattice(
        &self,
        spheres: &[Sphere],
        family: DiagramFamily,
    ) -> Result<IncidenceLattice, PowerDiagramError> {
        let dimension = validate_spheres(spheres)?;
        if spheres.len() < dimension + 1 {
            return Err(PowerDiagramError::TooFewSpheres {
                found: spheres.len(),
                needed: dimension + 1,
                dimension,
            });
        }

        let poles = lift_spheres(spheres)?;
        debug!("lifted {} spheres to dimension {}", poles.len(), dimension + 1);

        let hull = self.engine.hull_of(&poles)?;
        let separation = separate(&hull)?;
        let chosen = match family {
            DiagramFamily::Minimal => separation.lower,
            DiagramFamily::Maximal => separation.upper,
        };
        if chosen.facets().is_empty() {
            return Err(PowerDiagramError::EmptyFamily { family });
        }

        let dual = dualize(&chosen)?;
        let diagram = project_to_base(dual)?;
        debug!(
            "{} diagram: {} vertices, {} cells",
            family,
            diagram.vertices().len(),
            diagram.facets().len()
        );
        Ok(diagram)
    }
}
