//! Direct computation of diagram 0-faces, used as a test oracle.
//!
//! Instead of lifting and hulling, this walks every group of `d + 1` spheres,
//! intersects their pairwise chordales (the hyperplanes of equal power), and
//! keeps the intersection point when no other sphere undercuts the group's
//! power there. Exponential in the number of spheres and without incidence
//! information beyond the 0-faces, but independent of the dual pipeline,
//! which makes it a useful cross-check.

#![forbid(unsafe_code)]

use std::collections::BTreeSet;

use nalgebra::{DMatrix, DVector};

use crate::core::sphere::{LiftingError, Sphere, validate_spheres};
use crate::core::util::index_combinations;
use crate::geometry::util::RANK_TOLERANCE;

/// Absolute tolerance when comparing powers and merging coincident 0-faces.
pub const POWER_TOLERANCE: f64 = 1e-6;

/// A 0-face of the power diagram: its position and the spheres meeting
/// there.
#[derive(Clone, Debug, PartialEq)]
pub struct ZeroFace {
    /// Position of the 0-face in `R^d`.
    pub position: DVector<f64>,
    /// Indices of the spheres whose cells meet at this 0-face.
    pub sites: BTreeSet<usize>,
}

/// All 0-faces of the (minimal) power diagram of `spheres`, by exhaustive
/// chordale intersection.
///
/// Groups whose intersection points coincide are merged, so degenerate
/// configurations (more than `d + 1` cells meeting in one point) yield a
/// single 0-face carrying all participating sites.
///
/// # Errors
///
/// Returns a [`LiftingError`] for empty, ragged, or invalid-radius input.
///
/// # Examples
///
/// ```
/// use powerdiagram::core::naive::zero_faces;
/// use powerdiagram::sphere;
///
/// let spheres = vec![sphere!([0.0], 1.0), sphere!([4.0], 1.0)];
/// let faces = zero_faces(&spheres).unwrap();
/// assert_eq!(faces.len(), 1);
/// assert!((faces[0].position[0] - 2.0).abs() < 1e-9);
/// ```
pub fn zero_faces(spheres: &[Sphere]) -> Result<Vec<ZeroFace>, LiftingError> {
    let dimension = validate_spheres(spheres)?;
    let mut faces: Vec<ZeroFace> = Vec::new();

    for group in index_combinations(spheres.len(), dimension + 1) {
        let Some(position) = chordale_intersection(spheres, &group, dimension) else {
            continue;
        };
        if !has_minimal_power(spheres, group[0], &position) {
            continue;
        }

        let existing = faces
            .iter()
            .position(|face| (&face.position - &position).norm() <= POWER_TOLERANCE);
        match existing {
            Some(index) => faces[index].sites.extend(group.iter().copied()),
            None => faces.push(ZeroFace {
                position,
                sites: group.into_iter().collect(),
            }),
        }
    }

    Ok(faces)
}

/// Intersection point of the chordales between the first group member and
/// every other, if the system has a solution.
fn chordale_intersection(
    spheres: &[Sphere],
    group: &[usize],
    dimension: usize,
) -> Option<DVector<f64>> {
    let lead = &spheres[group[0]];
    let lead_weight = lead.center().norm_squared() - lead.radius() * lead.radius();

    let mut matrix = DMatrix::<f64>::zeros(dimension, dimension);
    let mut rhs = DVector::<f64>::zeros(dimension);
    for (row, &other_index) in group[1..].iter().enumerate() {
        let other = &spheres[other_index];
        let normal = (lead.center() - other.center()) * 2.0;
        matrix.row_mut(row).copy_from(&normal.transpose());
        rhs[row] = lead_weight
            - (other.center().norm_squared() - other.radius() * other.radius());
    }

    let svd = matrix.clone().svd(true, true);
    let solution = svd.solve(&rhs, RANK_TOLERANCE).ok()?;

    // Underdetermined or inconsistent systems solve only in the least-squares
    // sense; accept true intersections only.
    let residual = (&matrix * &solution - &rhs).norm();
    let scale = rhs.norm().max(1.0);
    (residual <= POWER_TOLERANCE * scale).then_some(solution)
}

/// Whether the group's power at `position` is minimal over all spheres.
fn has_minimal_power(spheres: &[Sphere], member: usize, position: &DVector<f64>) -> bool {
    let group_power = spheres[member].power(position);
    let minimum = spheres
        .iter()
        .map(|sphere| sphere.power(position))
        .fold(f64::INFINITY, f64::min);
    (group_power - minimum).abs() <= POWER_TOLERANCE * group_power.abs().max(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    use crate::sphere;

    #[test]
    fn bisector_of_two_spheres_on_the_line() {
        let spheres = vec![sphere!([0.0], 1.0), sphere!([4.0], 1.0)];
        let faces = zero_faces(&spheres).unwrap();

        assert_eq!(faces.len(), 1);
        assert_relative_eq!(faces[0].position[0], 2.0, epsilon = 1e-9);
        assert_eq!(faces[0].sites, [0, 1].into());
    }

    #[test]
    fn unequal_radii_shift_the_bisector() {
        // Power bisector of (0, r=2) and (4, r=0): x² - 4 = (x - 4)² at
        // x = 2.5.
        let spheres = vec![sphere!([0.0], 2.0), sphere!([4.0], 0.0)];
        let faces = zero_faces(&spheres).unwrap();

        assert_eq!(faces.len(), 1);
        assert_relative_eq!(faces[0].position[0], 2.5, epsilon = 1e-9);
    }

    #[test]
    fn four_cocircular_spheres_merge_into_one_face() {
        let spheres = vec![
            sphere!([0.0, 0.0], 1.0),
            sphere!([4.0, 0.0], 1.0),
            sphere!([0.0, 4.0], 1.0),
            sphere!([4.0, 4.0], 1.0),
        ];
        let faces = zero_faces(&spheres).unwrap();

        assert_eq!(faces.len(), 1);
        assert_relative_eq!(faces[0].position[0], 2.0, epsilon = 1e-9);
        assert_relative_eq!(faces[0].position[1], 2.0, epsilon = 1e-9);
        assert_eq!(faces[0].sites, [0, 1, 2, 3].into());
    }

    #[test]
    fn superseded_intersections_are_dropped() {
        // The vertex of the three outer spheres is undercut by the inner
        // one, so only three 0-faces remain.
        let spheres = vec![
            sphere!([0.0, 0.0], 1.0),
            sphere!([4.0, 0.0], 1.0),
            sphere!([2.0, 3.0], 1.0),
            sphere!([2.0, 1.0], 1.0),
        ];
        let faces = zero_faces(&spheres).unwrap();

        assert_eq!(faces.len(), 3);
        assert!(faces.iter().all(|face| face.sites.contains(&3)));
    }

    #[test]
    fn too_few_spheres_yield_no_faces() {
        let spheres = vec![sphere!([0.0, 0.0], 1.0), sphere!([4.0, 0.0], 1.0)];
        assert!(zero_faces(&spheres).unwrap().is_empty());
    }

    #[test]
    fn input_validation_matches_the_pipeline() {
        assert!(matches!(zero_faces(&[]), Err(LiftingError::EmptyInput)));
    }
}
