//! # powerdiagram
//!
//! Power diagrams (weighted Voronoi diagrams) of spheres in d-dimensional
//! space, computed by lifting and convex-hull duality and represented as
//! face-incidence lattices.
//!
//! Every point `x` of `R^d` is attributed to the sphere `(c, r)` of least
//! *power* `|x - c|² - r²`. The resulting cell complex is not returned as
//! explicit cell geometry but as an [`IncidenceLattice`](core::lattice::IncidenceLattice):
//! a DAG linking the diagram's 0-faces (positioned vertices) through its
//! intermediate faces up to the cells, each cell labeled with the index of
//! its sphere.
//!
//! # Pipeline
//!
//! ```text
//! spheres → lift → convex hull → separate → dualize → project
//! ```
//!
//! Each sphere is lifted to a pole in `R^(d+1)`; the facets of the poles'
//! convex hull split into a lower and an upper family, and the polar dual of
//! the lower family, projected back to `R^d`, is the power diagram (the
//! upper family yields the maximal power diagram). Hull construction is
//! pluggable through the
//! [`ConvexHullEngine`](geometry::algorithms::convex_hull::ConvexHullEngine)
//! trait; the crate ships the exact reference engine
//! [`ExhaustiveHull`](geometry::algorithms::convex_hull::ExhaustiveHull).
//!
//! # Basic usage
//!
//! ```rust
//! use powerdiagram::prelude::*;
//!
//! // Two unit spheres on the line; their cells meet at x = 2.
//! let spheres = vec![sphere!([0.0], 1.0), sphere!([4.0], 1.0)];
//!
//! let diagram = PowerDiagram::new(ExhaustiveHull)
//!     .convert_to_lattice(&spheres, DiagramFamily::Minimal)
//!     .unwrap();
//!
//! assert_eq!(diagram.vertices().len(), 1);
//! assert_eq!(diagram.facets().len(), 2); // one cell per sphere
//!
//! let vertex = diagram.vertices()[0];
//! let position = diagram.face(vertex).unwrap().coordinates().unwrap();
//! assert!((position[0] - 2.0).abs() < 1e-9);
//! ```
//!
//! # Degeneracies
//!
//! Degenerate inputs surface as typed errors instead of silent
//! approximations: coincident spheres are rejected by the hull engine,
//! facets whose vertices do not span a hyperplane raise
//! [`LatticeError::DegenerateFace`](core::lattice::LatticeError), and
//! vertical hull facets, which bound neither diagram family, are excluded
//! with a warning through the [`log`] facade. See
//! [`PowerDiagramError`](core::power_diagram::PowerDiagramError) for the
//! full taxonomy.

#![forbid(unsafe_code)]

/// Re-export of [`nalgebra`], whose [`DVector`](nalgebra::DVector) is the
/// coordinate type of this crate.
pub use nalgebra;

/// Combinatorial core: spheres, the incidence lattice, and the diagram
/// pipeline.
pub mod core {
    /// Collection aliases tuned for lattice bookkeeping.
    pub mod collections;
    /// The face-incidence lattice data structure.
    pub mod lattice;
    /// Exhaustive 0-face oracle for cross-checking the dual pipeline.
    pub mod naive;
    /// The lifting-and-duality pipeline.
    pub mod power_diagram;
    /// Diagram 1-skeleton extraction (edges and ray directions).
    pub mod skeleton;
    /// Weighted spheres, power, and the lifting map.
    pub mod sphere;
    /// Combinatorial helpers.
    pub mod util;

    pub use lattice::*;
    pub use power_diagram::*;
    pub use sphere::*;
}

/// Numeric geometry: hyperplanes, tolerances, and hull construction.
pub mod geometry {
    /// Geometric algorithms.
    pub mod algorithms {
        /// Convex hull engines behind a pluggable trait.
        pub mod convex_hull;
        pub use convex_hull::*;
    }
    /// Hyperplanes and the polar transform.
    pub mod hyperplane;
    /// Tolerances and affine-span utilities.
    pub mod util;

    pub use algorithms::*;
    pub use hyperplane::*;
}

/// Text boundary formats (sphere input, diagram records).
pub mod io;

/// Re-exports of the commonly used surface of the crate.
pub mod prelude {
    pub use crate::core::lattice::{
        Face, FaceKey, IncidenceLattice, LatticeError, LatticeValidationOptions,
    };
    pub use crate::core::naive::{ZeroFace, zero_faces};
    pub use crate::core::power_diagram::{
        DiagramFamily, PowerDiagram, PowerDiagramError, Separation, dualize, lift_spheres,
        project_to_base, separate,
    };
    pub use crate::core::skeleton::{DiagramEdge, EdgeKind, SkeletonError, diagram_edges};
    pub use crate::core::sphere::{LiftingError, Sphere, validate_spheres};
    pub use crate::geometry::algorithms::convex_hull::{
        ConvexHullEngine, ExhaustiveHull, HullError,
    };
    pub use crate::geometry::hyperplane::{FacetOrientation, Hyperplane, HyperplaneError};

    pub use crate::sphere;
}
