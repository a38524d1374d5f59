//! Scenario tests for the full diagram pipeline on hand-checked inputs.
//!
//! Every expected coordinate in this file was derived on paper from the
//! power-function definition, so these tests pin down the semantics of the
//! lifting, separation, duality, and projection stages end to end.

use approx::assert_relative_eq;
use nalgebra::DVector;
use powerdiagram::prelude::*;

fn minimal_diagram(spheres: &[Sphere]) -> IncidenceLattice {
    PowerDiagram::new(ExhaustiveHull)
        .convert_to_lattice(spheres, DiagramFamily::Minimal)
        .unwrap()
}

fn vertex_positions(diagram: &IncidenceLattice) -> Vec<DVector<f64>> {
    diagram
        .vertices()
        .into_iter()
        .map(|key| diagram.face(key).unwrap().coordinates().unwrap().clone())
        .collect()
}

fn cell_sites(diagram: &IncidenceLattice) -> Vec<usize> {
    let mut sites: Vec<usize> = diagram
        .facets()
        .into_iter()
        .map(|key| diagram.face(key).unwrap().site().unwrap())
        .collect();
    sites.sort_unstable();
    sites
}

// =============================================================================
// ONE-DIMENSIONAL SCENARIOS
// =============================================================================

#[test]
fn two_equal_spheres_meet_at_the_midpoint() {
    let spheres = vec![sphere!([0.0], 1.0), sphere!([4.0], 1.0)];
    let diagram = minimal_diagram(&spheres);

    assert_eq!(diagram.ambient_dim(), 1);
    let positions = vertex_positions(&diagram);
    assert_eq!(positions.len(), 1);
    assert_relative_eq!(positions[0][0], 2.0, epsilon = 1e-9);

    // Two rays meeting at x = 2: one cell per sphere.
    assert_eq!(cell_sites(&diagram), vec![0, 1]);
    diagram.validate().unwrap();
}

#[test]
fn unequal_radii_shift_the_boundary_towards_the_smaller_sphere() {
    // x² - 4 = (x - 4)² has the solution x = 2.5.
    let spheres = vec![sphere!([0.0], 2.0), sphere!([4.0], 0.0)];
    let diagram = minimal_diagram(&spheres);

    let positions = vertex_positions(&diagram);
    assert_eq!(positions.len(), 1);
    assert_relative_eq!(positions[0][0], 2.5, epsilon = 1e-9);
}

#[test]
fn three_spheres_on_the_line_produce_two_boundaries() {
    let spheres = vec![sphere!([0.0], 1.0), sphere!([4.0], 1.0), sphere!([10.0], 1.0)];
    let diagram = minimal_diagram(&spheres);

    let mut boundaries: Vec<f64> = vertex_positions(&diagram)
        .into_iter()
        .map(|position| position[0])
        .collect();
    boundaries.sort_by(f64::total_cmp);

    assert_eq!(boundaries.len(), 2);
    assert_relative_eq!(boundaries[0], 2.0, epsilon = 1e-9);
    assert_relative_eq!(boundaries[1], 7.0, epsilon = 1e-9);
    assert_eq!(cell_sites(&diagram), vec![0, 1, 2]);

    // The middle sphere's cell is the bounded segment [2, 7]: it touches
    // both diagram vertices.
    let middle_cell = diagram
        .facets()
        .into_iter()
        .find(|&key| diagram.face(key).unwrap().site() == Some(1))
        .unwrap();
    assert_eq!(diagram.vertex_set(middle_cell).unwrap().len(), 2);
}

// =============================================================================
// TWO-DIMENSIONAL SCENARIOS
// =============================================================================

#[test]
fn three_equal_spheres_meet_at_their_circumcenter() {
    // Equal radii make the power diagram the ordinary Voronoi diagram.
    let spheres = vec![
        sphere!([0.0, 0.0], 1.0),
        sphere!([4.0, 0.0], 1.0),
        sphere!([0.0, 4.0], 1.0),
    ];
    let diagram = minimal_diagram(&spheres);

    let positions = vertex_positions(&diagram);
    assert_eq!(positions.len(), 1);
    assert_relative_eq!(positions[0][0], 2.0, epsilon = 1e-9);
    assert_relative_eq!(positions[0][1], 2.0, epsilon = 1e-9);

    assert_eq!(cell_sites(&diagram), vec![0, 1, 2]);
    assert_eq!(diagram.faces_of_dim(1).len(), 3);
    diagram.validate().unwrap();
}

#[test]
fn interior_sphere_gets_a_bounded_cell() {
    let spheres = vec![
        sphere!([0.0, 0.0], 1.0),
        sphere!([4.0, 0.0], 1.0),
        sphere!([2.0, 3.0], 1.0),
        sphere!([2.0, 1.0], 1.0),
    ];
    let diagram = minimal_diagram(&spheres);

    let mut positions: Vec<(f64, f64)> = vertex_positions(&diagram)
        .into_iter()
        .map(|position| (position[0], position[1]))
        .collect();
    positions.sort_by(|a, b| a.partial_cmp(b).unwrap());

    // Circumcenters of the three triangles of the underlying Delaunay
    // triangulation (equal radii).
    assert_eq!(positions.len(), 3);
    let expected = [(0.25, 2.0), (2.0, -1.5), (3.75, 2.0)];
    for ((x, y), (ex, ey)) in positions.into_iter().zip(expected) {
        assert_relative_eq!(x, ex, epsilon = 1e-9);
        assert_relative_eq!(y, ey, epsilon = 1e-9);
    }

    assert_eq!(cell_sites(&diagram), vec![0, 1, 2, 3]);
    assert_eq!(diagram.faces_of_dim(1).len(), 6);

    // Sphere 3 sits inside the triangle of the others; its cell is bounded
    // by all three diagram vertices.
    let interior_cell = diagram
        .facets()
        .into_iter()
        .find(|&key| diagram.face(key).unwrap().site() == Some(3))
        .unwrap();
    assert_eq!(diagram.vertex_set(interior_cell).unwrap().len(), 3);
    diagram.validate().unwrap();
}

#[test]
fn cocircular_spheres_share_a_single_degenerate_vertex() {
    // Four equal spheres on a common circle around (2, 2): four cells meet
    // in one point, a non-simplicial 0-face.
    let spheres = vec![
        sphere!([0.0, 0.0], 1.0),
        sphere!([4.0, 0.0], 1.0),
        sphere!([0.0, 4.0], 1.0),
        sphere!([4.0, 4.0], 1.0),
    ];
    let diagram = minimal_diagram(&spheres);

    let positions = vertex_positions(&diagram);
    assert_eq!(positions.len(), 1);
    assert_relative_eq!(positions[0][0], 2.0, epsilon = 1e-9);
    assert_relative_eq!(positions[0][1], 2.0, epsilon = 1e-9);

    assert_eq!(cell_sites(&diagram), vec![0, 1, 2, 3]);
    assert_eq!(diagram.faces_of_dim(1).len(), 4);
    diagram.validate().unwrap();
}

// =============================================================================
// MAXIMAL FAMILY
// =============================================================================

#[test]
fn maximal_diagram_dualizes_the_upper_family() {
    let spheres = vec![
        sphere!([0.0, 0.0], 1.0),
        sphere!([4.0, 0.0], 1.0),
        sphere!([2.0, 3.0], 1.0),
        sphere!([2.0, 1.0], 1.0),
    ];
    let diagram = PowerDiagram::new(ExhaustiveHull)
        .convert_to_lattice(&spheres, DiagramFamily::Maximal)
        .unwrap();

    // The upper hull is the single triangle of the three outer poles; its
    // polar point is where all three outer spheres have equal power.
    let positions = vertex_positions(&diagram);
    assert_eq!(positions.len(), 1);
    assert_relative_eq!(positions[0][0], 2.0, epsilon = 1e-9);
    assert_relative_eq!(positions[0][1], 5.0 / 6.0, epsilon = 1e-9);

    assert_eq!(cell_sites(&diagram), vec![0, 1, 2]);

    let vertex_position = &positions[0];
    let power = spheres[0].power(vertex_position);
    assert_relative_eq!(power, spheres[1].power(vertex_position), epsilon = 1e-9);
    assert_relative_eq!(power, spheres[2].power(vertex_position), epsilon = 1e-9);
}

#[test]
fn flat_configurations_serve_both_families() {
    // Three spheres lift onto a common plane: the minimal and maximal
    // diagrams coincide.
    let spheres = vec![
        sphere!([0.0, 0.0], 1.0),
        sphere!([4.0, 0.0], 1.0),
        sphere!([0.0, 4.0], 1.0),
    ];
    let pipeline = PowerDiagram::new(ExhaustiveHull);
    let minimal = pipeline
        .convert_to_lattice(&spheres, DiagramFamily::Minimal)
        .unwrap();
    let maximal = pipeline
        .convert_to_lattice(&spheres, DiagramFamily::Maximal)
        .unwrap();

    assert_eq!(vertex_positions(&minimal).len(), 1);
    assert_relative_eq!(
        vertex_positions(&minimal)[0],
        vertex_positions(&maximal)[0],
        epsilon = 1e-9
    );
}

// =============================================================================
// DEGENERATE INPUTS
// =============================================================================

#[test]
fn identical_spheres_are_rejected() {
    let spheres = vec![
        sphere!([1.0, 1.0], 0.5),
        sphere!([1.0, 1.0], 0.5),
        sphere!([4.0, 0.0], 1.0),
    ];
    let result = PowerDiagram::new(ExhaustiveHull)
        .convert_to_lattice(&spheres, DiagramFamily::Minimal);

    assert!(matches!(
        result,
        Err(PowerDiagramError::HullConstruction(HullError::CoincidentPoints {
            first: 0,
            second: 1,
        }))
    ));
}

#[test]
fn a_single_sphere_cannot_form_a_diagram() {
    let spheres = vec![sphere!([0.0, 0.0], 1.0)];
    let result = PowerDiagram::new(ExhaustiveHull)
        .convert_to_lattice(&spheres, DiagramFamily::Minimal);

    assert!(matches!(
        result,
        Err(PowerDiagramError::TooFewSpheres { found: 1, needed: 3, .. })
    ));
}

#[test]
fn ragged_centers_are_rejected() {
    let spheres = vec![sphere!([0.0, 0.0], 1.0), sphere!([1.0], 1.0)];
    let result = PowerDiagram::new(ExhaustiveHull)
        .convert_to_lattice(&spheres, DiagramFamily::Minimal);

    assert!(matches!(
        result,
        Err(PowerDiagramError::Lifting(LiftingError::DimensionMismatch {
            index: 1,
            expected: 2,
            found: 1,
        }))
    ));
}

#[test]
fn empty_input_is_rejected() {
    let result =
        PowerDiagram::new(ExhaustiveHull).convert_to_lattice(&[], DiagramFamily::Minimal);
    assert!(matches!(
        result,
        Err(PowerDiagramError::Lifting(LiftingError::EmptyInput))
    ));
}

// =============================================================================
// ORACLE CROSS-CHECK
// =============================================================================

#[test]
fn dual_pipeline_agrees_with_the_naive_oracle() {
    let spheres = vec![
        sphere!([0.0, 0.0], 1.0),
        sphere!([4.0, 0.0], 1.5),
        sphere!([2.0, 3.0], 0.5),
        sphere!([2.0, 1.0], 1.0),
        sphere!([5.0, 4.0], 0.75),
    ];
    let diagram = minimal_diagram(&spheres);
    let oracle = zero_faces(&spheres).unwrap();

    let positions = vertex_positions(&diagram);
    assert_eq!(positions.len(), oracle.len());
    for face in &oracle {
        let hit = positions
            .iter()
            .any(|position| (position - &face.position).norm() <= 1e-6);
        assert!(hit, "oracle 0-face {:?} missing from the dual diagram", face.position);
    }
}
