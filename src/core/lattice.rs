//! The face-incidence lattice of a polytope or cell complex.
//!
//! An [`IncidenceLattice`] is a DAG whose nodes are faces tagged with a
//! dimension and whose edges encode direct containment between faces of
//! consecutive dimension: an edge `A → B` means `dim(A) + 1 == dim(B)` and
//! `A ⊂ B`. Roots (faces with no incoming edge) are the 0-faces, leafs
//! (faces with no outgoing edge) are the top faces.
//!
//! Faces live in an arena ([`slotmap`]) and refer to each other through
//! [`FaceKey`] index lists, so the bidirectional incidence structure carries
//! no ownership cycles. Every face caches the set of 0-faces below it; this
//! is what facet hyperplane fitting, sub-lattice restriction, and duality
//! all operate on.
//!
//! Lattices are append-only: restriction and edge reversal produce new
//! lattices instead of mutating in place. Iteration order over faces is the
//! insertion order and is therefore stable for any given lattice instance.

#![forbid(unsafe_code)]

use std::collections::BTreeSet;

use nalgebra::DVector;
use serde::{Deserialize, Serialize};
use slotmap::{SlotMap, new_key_type};
use thiserror::Error;

use crate::core::collections::{FastHashMap, FastHashSet, SmallBuffer};
use crate::geometry::hyperplane::{Hyperplane, HyperplaneError};

new_key_type! {
    /// Arena key identifying a face within one lattice instance.
    pub struct FaceKey;
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors raised by lattice construction, queries, and validation.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum LatticeError {
    /// The face key does not belong to this lattice.
    #[error("face {face:?} is not part of this lattice")]
    UnknownFace {
        /// The unknown key.
        face: FaceKey,
    },
    /// A face expected to be a 0-face is not.
    #[error("face {face:?} has dimension {dim}, expected a vertex (0-face)")]
    NotAVertex {
        /// The offending face.
        face: FaceKey,
        /// Its actual dimension.
        dim: usize,
    },
    /// A face was added with no vertices.
    #[error("cannot add a face with an empty vertex set")]
    EmptyFace,
    /// A face dimension outside `1..=ambient_dim` was requested.
    #[error("face dimension {dim} is invalid in ambient dimension {ambient_dim}")]
    InvalidDimension {
        /// Requested face dimension.
        dim: usize,
        /// Ambient dimension of the lattice.
        ambient_dim: usize,
    },
    /// A face of dimension `k` needs at least `k + 1` incident vertices.
    #[error("a face of dimension {dim} needs more than {dim} vertices, got {found}")]
    TooFewVertices {
        /// Requested face dimension.
        dim: usize,
        /// Number of vertices supplied.
        found: usize,
    },
    /// Vertex coordinates have the wrong dimensionality for this lattice.
    #[error("coordinates have dimension {found}, expected {expected}")]
    CoordinateArityMismatch {
        /// Ambient dimension of the lattice.
        expected: usize,
        /// Dimension of the supplied coordinates.
        found: usize,
    },
    /// A vertex carries no coordinates although they are required.
    #[error("vertex {vertex:?} carries no coordinates")]
    MissingCoordinates {
        /// The coordinate-less vertex.
        vertex: FaceKey,
    },
    /// The incident vertices of a face do not span a hyperplane.
    #[error("face {face:?} with {vertex_count} vertices is degenerate: {source}")]
    DegenerateFace {
        /// The degenerate face.
        face: FaceKey,
        /// How many vertices it has.
        vertex_count: usize,
        /// The underlying fitting failure.
        #[source]
        source: HyperplaneError,
    },
    /// Edge reversal is undefined because a face dimension exceeds
    /// `ambient_dim - 1`.
    #[error("face {face:?} of dimension {dim} cannot be dualized in ambient dimension {ambient_dim}")]
    NotDualizable {
        /// The offending face.
        face: FaceKey,
        /// Its dimension.
        dim: usize,
        /// Ambient dimension of the lattice.
        ambient_dim: usize,
    },
    /// Validation found a root that is not a 0-face.
    #[error("root face {face:?} has dimension {dim}, expected 0")]
    RootIsNotVertex {
        /// The offending root.
        face: FaceKey,
        /// Its dimension.
        dim: usize,
    },
    /// Validation found an incidence edge skipping a dimension.
    #[error(
        "edge from {child:?} (dim {child_dim}) to {parent:?} (dim {parent_dim}) is not between consecutive dimensions"
    )]
    NonConsecutiveEdge {
        /// Lower face of the edge.
        child: FaceKey,
        /// Upper face of the edge.
        parent: FaceKey,
        /// Dimension of the lower face.
        child_dim: usize,
        /// Dimension of the upper face.
        parent_dim: usize,
    },
    /// Validation found mismatched up/down adjacency lists.
    #[error("adjacency of {child:?} and {parent:?} is not mutual")]
    InconsistentAdjacency {
        /// Lower face of the edge.
        child: FaceKey,
        /// Upper face of the edge.
        parent: FaceKey,
    },
    /// Validation found a cached vertex set that is not the union of its
    /// children's vertex sets.
    #[error("cached vertex set of face {face:?} is inconsistent with its children")]
    InconsistentVertexSet {
        /// The offending face.
        face: FaceKey,
    },
    /// Validation (with the simplicial bound enabled) found a face with too
    /// few incident vertices.
    #[error("face {face:?} of dimension {dim} has only {found} incident vertices")]
    SimplicialBoundViolated {
        /// The offending face.
        face: FaceKey,
        /// Its dimension.
        dim: usize,
        /// Number of incident vertices found.
        found: usize,
    },
}

// =============================================================================
// FACE
// =============================================================================

/// A single face of an [`IncidenceLattice`].
///
/// 0-faces may carry coordinates; any face may carry a `site`, the index of
/// the input sphere (or hull input point) it originates from.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Face {
    pub(crate) dim: usize,
    pub(crate) coordinates: Option<DVector<f64>>,
    pub(crate) site: Option<usize>,
    pub(crate) up: Vec<FaceKey>,
    pub(crate) down: Vec<FaceKey>,
    pub(crate) verts: BTreeSet<FaceKey>,
}

impl Face {
    /// Dimension tag of the face.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Coordinates, if this face is a positioned 0-face.
    #[must_use]
    pub fn coordinates(&self) -> Option<&DVector<f64>> {
        self.coordinates.as_ref()
    }

    /// External site index this face originates from, if any.
    #[must_use]
    pub fn site(&self) -> Option<usize> {
        self.site
    }
}

// =============================================================================
// VALIDATION OPTIONS
// =============================================================================

/// Options for [`IncidenceLattice::validate_with`].
#[derive(Clone, Copy, Debug, Default)]
pub struct LatticeValidationOptions {
    /// Require every `k`-face to have at least `k + 1` incident vertices.
    ///
    /// This holds for face lattices of polytopes (hull output) but not in
    /// general for their duals: the dual of an unbounded cell complex has
    /// top faces with arbitrarily few incident 0-faces.
    pub require_simplicial_bound: bool,
}

// =============================================================================
// INCIDENCE LATTICE
// =============================================================================

/// The result of reversing all incidence edges of a lattice.
///
/// Reversal is topology-only: the dual lattice carries no coordinates. The
/// `dual_of` map links every primal face to its dual so a second pass can
/// position the dual 0-faces (see the duality stage).
#[derive(Clone, Debug)]
pub struct ReversedLattice {
    /// The reversed lattice.
    pub lattice: IncidenceLattice,
    /// Map from primal face key to the corresponding dual face key.
    pub dual_of: FastHashMap<FaceKey, FaceKey>,
}

/// DAG of faces of a polytope or cell complex, ordered by direct containment.
///
/// See the [module documentation](self) for the invariants.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IncidenceLattice {
    ambient_dim: usize,
    faces: SlotMap<FaceKey, Face>,
    order: Vec<FaceKey>,
}

impl IncidenceLattice {
    /// An empty lattice in the given ambient dimension.
    #[must_use]
    pub fn new(ambient_dim: usize) -> Self {
        Self {
            ambient_dim,
            faces: SlotMap::with_key(),
            order: Vec::new(),
        }
    }

    /// Ambient dimension the faces are labeled against.
    #[must_use]
    pub fn ambient_dim(&self) -> usize {
        self.ambient_dim
    }

    /// Number of faces across all dimensions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the lattice has no faces.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// All faces with their keys, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (FaceKey, &Face)> + '_ {
        self.order.iter().map(move |&key| (key, &self.faces[key]))
    }

    /// Look up a face.
    ///
    /// # Errors
    ///
    /// Returns [`LatticeError::UnknownFace`] for keys from other lattices.
    pub fn face(&self, key: FaceKey) -> Result<&Face, LatticeError> {
        self.faces.get(key).ok_or(LatticeError::UnknownFace { face: key })
    }

    /// The root faces: 0-faces with no incoming containment edges.
    #[must_use]
    pub fn vertices(&self) -> Vec<FaceKey> {
        self.iter()
            .filter(|(_, face)| face.down.is_empty())
            .map(|(key, _)| key)
            .collect()
    }

    /// The leaf faces: faces no higher-dimensional face contains.
    #[must_use]
    pub fn facets(&self) -> Vec<FaceKey> {
        self.iter()
            .filter(|(_, face)| face.up.is_empty())
            .map(|(key, _)| key)
            .collect()
    }

    /// All faces of one dimension, in insertion order.
    #[must_use]
    pub fn faces_of_dim(&self, dim: usize) -> Vec<FaceKey> {
        self.iter()
            .filter(|(_, face)| face.dim == dim)
            .map(|(key, _)| key)
            .collect()
    }

    /// Face counts per dimension, indexed `0..=ambient_dim`.
    #[must_use]
    pub fn dim_census(&self) -> Vec<usize> {
        let mut census = vec![0; self.ambient_dim + 1];
        for (_, face) in self.iter() {
            census[face.dim] += 1;
        }
        census
    }

    /// Direct super-faces of `key`.
    ///
    /// # Errors
    ///
    /// Returns [`LatticeError::UnknownFace`] for foreign keys.
    pub fn parents(&self, key: FaceKey) -> Result<&[FaceKey], LatticeError> {
        Ok(&self.face(key)?.up)
    }

    /// Direct sub-faces of `key`.
    ///
    /// # Errors
    ///
    /// Returns [`LatticeError::UnknownFace`] for foreign keys.
    pub fn children(&self, key: FaceKey) -> Result<&[FaceKey], LatticeError> {
        Ok(&self.face(key)?.down)
    }

    /// The 0-faces incident to `key` (its down-closure roots).
    ///
    /// # Errors
    ///
    /// Returns [`LatticeError::UnknownFace`] for foreign keys.
    pub fn vertex_set(&self, key: FaceKey) -> Result<&BTreeSet<FaceKey>, LatticeError> {
        Ok(&self.face(key)?.verts)
    }

    /// The leaf faces reachable upwards from `key`.
    ///
    /// For a diagram lattice this is the set of cells a face borders.
    ///
    /// # Errors
    ///
    /// Returns [`LatticeError::UnknownFace`] for foreign keys.
    pub fn leafs_above(&self, key: FaceKey) -> Result<BTreeSet<FaceKey>, LatticeError> {
        self.face(key)?;
        let mut visited: FastHashSet<FaceKey> = FastHashSet::default();
        let mut queue: SmallBuffer<FaceKey, 8> = SmallBuffer::new();
        let mut leafs = BTreeSet::new();

        visited.insert(key);
        queue.push(key);
        while let Some(current) = queue.pop() {
            let face = &self.faces[current];
            if face.up.is_empty() {
                leafs.insert(current);
            }
            for &parent in &face.up {
                if visited.insert(parent) {
                    queue.push(parent);
                }
            }
        }
        Ok(leafs)
    }

    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    /// Add a 0-face with coordinates and an optional site label.
    ///
    /// # Errors
    ///
    /// Returns [`LatticeError::CoordinateArityMismatch`] if the coordinates
    /// do not match the ambient dimension.
    pub fn add_vertex(
        &mut self,
        coordinates: DVector<f64>,
        site: Option<usize>,
    ) -> Result<FaceKey, LatticeError> {
        if coordinates.len() != self.ambient_dim {
            return Err(LatticeError::CoordinateArityMismatch {
                expected: self.ambient_dim,
                found: coordinates.len(),
            });
        }

        let key = self.insert_raw(Face {
            dim: 0,
            coordinates: Some(coordinates),
            site,
            up: Vec::new(),
            down: Vec::new(),
            verts: BTreeSet::new(),
        });
        self.faces[key].verts.insert(key);
        Ok(key)
    }

    /// Add a face of dimension `dim` spanning the given 0-faces.
    ///
    /// If a face with the same dimension and vertex set already exists its
    /// key is returned instead. Containment edges to existing faces of the
    /// neighboring dimensions are wired automatically, so faces should be
    /// inserted from low to high dimension.
    ///
    /// # Errors
    ///
    /// - [`LatticeError::InvalidDimension`] if `dim` is 0 or exceeds the
    ///   ambient dimension,
    /// - [`LatticeError::EmptyFace`] / [`LatticeError::TooFewVertices`] if
    ///   the vertex set is too small for `dim`,
    /// - [`LatticeError::UnknownFace`] / [`LatticeError::NotAVertex`] if a
    ///   key does not name a 0-face of this lattice.
    pub fn add_face(
        &mut self,
        dim: usize,
        vertices: &BTreeSet<FaceKey>,
    ) -> Result<FaceKey, LatticeError> {
        if dim == 0 || dim > self.ambient_dim {
            return Err(LatticeError::InvalidDimension {
                dim,
                ambient_dim: self.ambient_dim,
            });
        }
        if vertices.is_empty() {
            return Err(LatticeError::EmptyFace);
        }
        if vertices.len() < dim + 1 {
            return Err(LatticeError::TooFewVertices {
                dim,
                found: vertices.len(),
            });
        }
        for &vertex in vertices {
            let face = self.face(vertex)?;
            if face.dim != 0 {
                return Err(LatticeError::NotAVertex {
                    face: vertex,
                    dim: face.dim,
                });
            }
        }

        if let Some(existing) = self.find_face(dim, vertices) {
            return Ok(existing);
        }

        let key = self.insert_raw(Face {
            dim,
            coordinates: None,
            site: None,
            up: Vec::new(),
            down: Vec::new(),
            verts: vertices.clone(),
        });

        // Wire direct containment against both neighboring dimensions.
        for index in 0..self.order.len() {
            let other = self.order[index];
            if other == key {
                continue;
            }
            let other_dim = self.faces[other].dim;
            if other_dim + 1 == dim {
                let is_child = if other_dim == 0 {
                    vertices.contains(&other)
                } else {
                    self.faces[other].verts.is_subset(vertices)
                };
                if is_child {
                    self.faces[other].up.push(key);
                    self.faces[key].down.push(other);
                }
            } else if dim + 1 == other_dim && vertices.is_subset(&self.faces[other].verts) {
                self.faces[key].up.push(other);
                self.faces[other].down.push(key);
            }
        }

        Ok(key)
    }

    /// Key of the face with this dimension and vertex set, if present.
    #[must_use]
    pub fn find_face(&self, dim: usize, vertices: &BTreeSet<FaceKey>) -> Option<FaceKey> {
        self.iter()
            .find(|(_, face)| face.dim == dim && face.verts == *vertices)
            .map(|(key, _)| key)
    }

    /// Assign coordinates to an existing 0-face.
    pub(crate) fn set_vertex_coordinates(
        &mut self,
        key: FaceKey,
        coordinates: DVector<f64>,
    ) -> Result<(), LatticeError> {
        if coordinates.len() != self.ambient_dim {
            return Err(LatticeError::CoordinateArityMismatch {
                expected: self.ambient_dim,
                found: coordinates.len(),
            });
        }
        let dim = self.face(key)?.dim;
        if dim != 0 {
            return Err(LatticeError::NotAVertex { face: key, dim });
        }
        self.faces[key].coordinates = Some(coordinates);
        Ok(())
    }

    /// Remove the last coordinate of every positioned 0-face and shrink the
    /// ambient dimension by one. Purely a coordinate transform; the edge set
    /// is untouched.
    pub(crate) fn project_out_last_axis(&mut self) -> Result<(), LatticeError> {
        let target = self
            .ambient_dim
            .checked_sub(1)
            .ok_or(LatticeError::InvalidDimension { dim: 0, ambient_dim: 0 })?;
        if let Some((_, face)) = self.iter().find(|(_, face)| face.dim > target) {
            return Err(LatticeError::InvalidDimension {
                dim: face.dim,
                ambient_dim: target,
            });
        }

        self.ambient_dim = target;
        for &key in &self.order {
            if let Some(coordinates) = self.faces[key].coordinates.take() {
                self.faces[key].coordinates = Some(coordinates.rows(0, target).clone_owned());
            }
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Geometry
    // -------------------------------------------------------------------------

    /// The hyperplane spanned by the coordinates of a facet's incident
    /// 0-faces.
    ///
    /// The sign of the returned normal is arbitrary; orientation against the
    /// surrounding hull is the caller's concern.
    ///
    /// # Errors
    ///
    /// - [`LatticeError::MissingCoordinates`] if an incident 0-face is
    ///   unpositioned,
    /// - [`LatticeError::DegenerateFace`] if the incident 0-faces are not
    ///   affinely independent enough to span a hyperplane.
    pub fn containing_hyperplane(&self, facet: FaceKey) -> Result<Hyperplane, LatticeError> {
        let face = self.face(facet)?;
        let mut points = Vec::with_capacity(face.verts.len());
        for &vertex in &face.verts {
            let coordinates = self.faces[vertex]
                .coordinates
                .as_ref()
                .ok_or(LatticeError::MissingCoordinates { vertex })?;
            points.push(coordinates.clone());
        }

        Hyperplane::spanning(&points).map_err(|source| LatticeError::DegenerateFace {
            face: facet,
            vertex_count: points.len(),
            source,
        })
    }

    // -------------------------------------------------------------------------
    // Restriction and duality
    // -------------------------------------------------------------------------

    /// The induced sub-lattice spanned by a subset of leaf faces: the kept
    /// faces together with their entire down-closure.
    ///
    /// # Errors
    ///
    /// Returns [`LatticeError::UnknownFace`] if a key does not belong to
    /// this lattice.
    pub fn restrict_to_facets(&self, keep: &[FaceKey]) -> Result<Self, LatticeError> {
        let mut kept: FastHashSet<FaceKey> = FastHashSet::default();
        let mut queue: Vec<FaceKey> = Vec::new();
        for &face in keep {
            self.face(face)?;
            if kept.insert(face) {
                queue.push(face);
            }
        }
        while let Some(face) = queue.pop() {
            for &child in &self.faces[face].down {
                if kept.insert(child) {
                    queue.push(child);
                }
            }
        }

        let mut sub = Self::new(self.ambient_dim);
        let mut remap: FastHashMap<FaceKey, FaceKey> = FastHashMap::default();
        for &key in &self.order {
            if !kept.contains(&key) {
                continue;
            }
            let face = &self.faces[key];
            let new_key = sub.insert_raw(Face {
                dim: face.dim,
                coordinates: face.coordinates.clone(),
                site: face.site,
                up: Vec::new(),
                down: Vec::new(),
                verts: BTreeSet::new(),
            });
            remap.insert(key, new_key);
        }

        for &key in &self.order {
            let Some(&new_key) = remap.get(&key) else {
                continue;
            };
            for &parent in &self.faces[key].up {
                if let Some(&new_parent) = remap.get(&parent) {
                    sub.faces[new_key].up.push(new_parent);
                    sub.faces[new_parent].down.push(new_key);
                }
            }
            sub.faces[new_key].verts = self.faces[key]
                .verts
                .iter()
                .map(|vertex| remap_key(&remap, *vertex))
                .collect();
        }

        Ok(sub)
    }

    /// Reverse every containment edge, relabeling face dimensions as
    /// `ambient_dim - 1 - dim` (face-lattice duality).
    ///
    /// The reversal is topology-only: no coordinates are assigned to the new
    /// 0-faces. Site labels are carried over, so primal 0-faces keep their
    /// site on the dual leaf they become.
    ///
    /// # Errors
    ///
    /// Returns [`LatticeError::NotDualizable`] if a face has dimension
    /// `ambient_dim` or higher (such lattices, e.g. already-projected
    /// diagrams, have no standard dual labeling).
    pub fn revert_edges(&self) -> Result<ReversedLattice, LatticeError> {
        for (key, face) in self.iter() {
            if face.dim >= self.ambient_dim {
                return Err(LatticeError::NotDualizable {
                    face: key,
                    dim: face.dim,
                    ambient_dim: self.ambient_dim,
                });
            }
        }

        let mut dual = Self::new(self.ambient_dim);
        let mut dual_of: FastHashMap<FaceKey, FaceKey> = FastHashMap::default();
        for &key in &self.order {
            let face = &self.faces[key];
            let dual_key = dual.insert_raw(Face {
                dim: self.ambient_dim - 1 - face.dim,
                coordinates: None,
                site: face.site,
                up: Vec::new(),
                down: Vec::new(),
                verts: BTreeSet::new(),
            });
            dual_of.insert(key, dual_key);
        }

        for &key in &self.order {
            let dual_key = remap_key(&dual_of, key);
            for &parent in &self.faces[key].up {
                // The primal edge key → parent reverses into parent' → key'.
                let dual_parent = remap_key(&dual_of, parent);
                dual.faces[dual_parent].up.push(dual_key);
                dual.faces[dual_key].down.push(dual_parent);
            }
        }

        // Rebuild the cached vertex sets bottom-up in the dual orientation.
        let mut by_dim: Vec<FaceKey> = dual.order.clone();
        by_dim.sort_by_key(|&key| dual.faces[key].dim);
        for key in by_dim {
            if dual.faces[key].dim == 0 {
                dual.faces[key].verts.insert(key);
            } else {
                let mut verts = BTreeSet::new();
                for child in dual.faces[key].down.clone() {
                    verts.extend(dual.faces[child].verts.iter().copied());
                }
                dual.faces[key].verts = verts;
            }
        }

        Ok(ReversedLattice { lattice: dual, dual_of })
    }

    // -------------------------------------------------------------------------
    // Validation
    // -------------------------------------------------------------------------

    /// Check the structural invariants: roots are 0-faces, edges connect
    /// consecutive dimensions with mutual adjacency (which also rules out
    /// cycles), cached vertex sets are consistent, dimensions fit the
    /// ambient space.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), LatticeError> {
        self.validate_with(LatticeValidationOptions::default())
    }

    /// [`validate`](Self::validate) with extra, opt-in invariants.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate_with(&self, options: LatticeValidationOptions) -> Result<(), LatticeError> {
        for (key, face) in self.iter() {
            if face.dim > self.ambient_dim {
                return Err(LatticeError::InvalidDimension {
                    dim: face.dim,
                    ambient_dim: self.ambient_dim,
                });
            }
            if face.down.is_empty() && face.dim != 0 {
                return Err(LatticeError::RootIsNotVertex { face: key, dim: face.dim });
            }
            if let Some(coordinates) = &face.coordinates {
                if coordinates.len() != self.ambient_dim {
                    return Err(LatticeError::CoordinateArityMismatch {
                        expected: self.ambient_dim,
                        found: coordinates.len(),
                    });
                }
            }

            for &parent in &face.up {
                let parent_face = self.face(parent)?;
                if face.dim + 1 != parent_face.dim {
                    return Err(LatticeError::NonConsecutiveEdge {
                        child: key,
                        parent,
                        child_dim: face.dim,
                        parent_dim: parent_face.dim,
                    });
                }
                if !parent_face.down.contains(&key) {
                    return Err(LatticeError::InconsistentAdjacency { child: key, parent });
                }
            }

            if face.dim == 0 {
                if !(face.verts.len() == 1 && face.verts.contains(&key)) {
                    return Err(LatticeError::InconsistentVertexSet { face: key });
                }
            } else {
                let mut expected = BTreeSet::new();
                for &child in &face.down {
                    expected.extend(self.face(child)?.verts.iter().copied());
                }
                if expected != face.verts {
                    return Err(LatticeError::InconsistentVertexSet { face: key });
                }
            }

            if options.require_simplicial_bound && face.verts.len() < face.dim + 1 {
                return Err(LatticeError::SimplicialBoundViolated {
                    face: key,
                    dim: face.dim,
                    found: face.verts.len(),
                });
            }
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn insert_raw(&mut self, face: Face) -> FaceKey {
        let key = self.faces.insert(face);
        self.order.push(key);
        key
    }
}

fn remap_key(map: &FastHashMap<FaceKey, FaceKey>, key: FaceKey) -> FaceKey {
    map.get(&key)
        .copied()
        .unwrap_or_else(|| unreachable!("face {key:?} was remapped before edge wiring"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(coords: &[f64]) -> DVector<f64> {
        DVector::from_column_slice(coords)
    }

    /// Tetrahedron-shaped lattice in ambient dimension 3.
    fn tetrahedron() -> (IncidenceLattice, Vec<FaceKey>) {
        let mut lattice = IncidenceLattice::new(3);
        let vertices = vec![
            lattice.add_vertex(v(&[0.0, 0.0, 0.0]), Some(0)).unwrap(),
            lattice.add_vertex(v(&[1.0, 0.0, 0.0]), Some(1)).unwrap(),
            lattice.add_vertex(v(&[0.0, 1.0, 0.0]), Some(2)).unwrap(),
            lattice.add_vertex(v(&[0.0, 0.0, 1.0]), Some(3)).unwrap(),
        ];

        for pair in [(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)] {
            let edge: BTreeSet<_> = [vertices[pair.0], vertices[pair.1]].into();
            lattice.add_face(1, &edge).unwrap();
        }
        for triple in [(0, 1, 2), (0, 1, 3), (0, 2, 3), (1, 2, 3)] {
            let facet: BTreeSet<_> =
                [vertices[triple.0], vertices[triple.1], vertices[triple.2]].into();
            lattice.add_face(2, &facet).unwrap();
        }

        (lattice, vertices)
    }

    #[test]
    fn tetrahedron_has_the_expected_census() {
        let (lattice, _) = tetrahedron();
        assert_eq!(lattice.dim_census(), vec![4, 6, 4, 0]);
        assert_eq!(lattice.vertices().len(), 4);
        assert_eq!(lattice.facets().len(), 4);
        lattice
            .validate_with(LatticeValidationOptions { require_simplicial_bound: true })
            .unwrap();
    }

    #[test]
    fn add_face_deduplicates_by_vertex_set() {
        let (mut lattice, vertices) = tetrahedron();
        let facet: BTreeSet<_> = [vertices[0], vertices[1], vertices[2]].into();
        let before = lattice.len();
        let key_a = lattice.add_face(2, &facet).unwrap();
        let key_b = lattice.add_face(2, &facet).unwrap();
        assert_eq!(key_a, key_b);
        assert_eq!(lattice.len(), before);
    }

    #[test]
    fn add_face_rejects_undersized_vertex_sets() {
        let (mut lattice, vertices) = tetrahedron();
        let pair: BTreeSet<_> = [vertices[0], vertices[1]].into();
        assert_eq!(
            lattice.add_face(2, &pair),
            Err(LatticeError::TooFewVertices { dim: 2, found: 2 })
        );
    }

    #[test]
    fn add_face_rejects_non_vertex_members() {
        let (mut lattice, vertices) = tetrahedron();
        let edge: BTreeSet<_> = [vertices[0], vertices[1]].into();
        let edge_key = lattice.add_face(1, &edge).unwrap();
        let bogus: BTreeSet<_> = [edge_key, vertices[2], vertices[3]].into();
        assert!(matches!(
            lattice.add_face(2, &bogus),
            Err(LatticeError::NotAVertex { .. })
        ));
    }

    #[test]
    fn foreign_keys_are_rejected() {
        let (lattice, _) = tetrahedron();
        let foreign = FaceKey::default();
        assert!(matches!(
            lattice.face(foreign),
            Err(LatticeError::UnknownFace { .. })
        ));
    }

    #[test]
    fn vertex_sets_propagate_through_faces() {
        let (lattice, vertices) = tetrahedron();
        let facet = lattice.facets()[0];
        let set = lattice.vertex_set(facet).unwrap();
        assert_eq!(set.len(), 3);
        assert!(set.iter().all(|key| vertices.contains(key)));
    }

    #[test]
    fn leafs_above_a_vertex_are_its_facets() {
        let (lattice, vertices) = tetrahedron();
        let leafs = lattice.leafs_above(vertices[0]).unwrap();
        // Vertex 0 lies on three of the four triangles.
        assert_eq!(leafs.len(), 3);
    }

    #[test]
    fn containing_hyperplane_of_a_triangle() {
        let (lattice, vertices) = tetrahedron();
        let facet: BTreeSet<_> = [vertices[0], vertices[1], vertices[2]].into();
        let key = lattice.find_face(2, &facet).unwrap();
        let plane = lattice.containing_hyperplane(key).unwrap();
        // The z = 0 plane.
        assert!(plane.contains(&v(&[0.3, 0.3, 0.0])));
        assert!(!plane.contains(&v(&[0.3, 0.3, 0.5])));
    }

    #[test]
    fn containing_hyperplane_flags_degenerate_faces() {
        let mut lattice = IncidenceLattice::new(2);
        let a = lattice.add_vertex(v(&[0.0, 0.0]), None).unwrap();
        let b = lattice.add_vertex(v(&[1.0, 0.0]), None).unwrap();
        let c = lattice.add_vertex(v(&[0.0, 1.0]), None).unwrap();
        let face: BTreeSet<_> = [a, b, c].into();
        let key = lattice.add_face(1, &face).unwrap();
        // The three vertices span the whole plane, so no line contains this
        // 1-face.
        assert!(matches!(
            lattice.containing_hyperplane(key),
            Err(LatticeError::DegenerateFace { face, .. }) if face == key
        ));
    }

    #[test]
    fn restriction_keeps_the_down_closure() {
        let (lattice, _) = tetrahedron();
        let kept = lattice.facets()[0];
        let sub = lattice.restrict_to_facets(&[kept]).unwrap();

        // One triangle, its three edges and three vertices.
        assert_eq!(sub.dim_census(), vec![3, 3, 1, 0]);
        sub.validate_with(LatticeValidationOptions { require_simplicial_bound: true })
            .unwrap();
    }

    #[test]
    fn restriction_to_nothing_is_empty() {
        let (lattice, _) = tetrahedron();
        let sub = lattice.restrict_to_facets(&[]).unwrap();
        assert!(sub.is_empty());
    }

    #[test]
    fn reversal_swaps_roots_and_leafs() {
        let (lattice, _) = tetrahedron();
        let reversed = lattice.revert_edges().unwrap();

        assert_eq!(reversed.lattice.dim_census(), vec![4, 6, 4, 0]);
        assert_eq!(reversed.lattice.vertices().len(), 4);
        reversed.lattice.validate().unwrap();

        for facet in lattice.facets() {
            let dual = reversed.dual_of[&facet];
            assert_eq!(reversed.lattice.face(dual).unwrap().dim(), 0);
        }
    }

    #[test]
    fn double_reversal_restores_the_census() {
        let (lattice, _) = tetrahedron();
        let once = lattice.revert_edges().unwrap().lattice;
        let twice = once.revert_edges().unwrap().lattice;
        assert_eq!(lattice.dim_census(), twice.dim_census());
    }

    #[test]
    fn reversal_requires_dualizable_dimensions() {
        let mut lattice = IncidenceLattice::new(1);
        let a = lattice.add_vertex(v(&[0.0]), None).unwrap();
        let b = lattice.add_vertex(v(&[1.0]), None).unwrap();
        let cell: BTreeSet<_> = [a, b].into();
        lattice.add_face(1, &cell).unwrap();
        // A 1-face in ambient dimension 1 would dualize to dimension -1.
        assert!(matches!(
            lattice.revert_edges(),
            Err(LatticeError::NotDualizable { .. })
        ));
    }

    #[test]
    fn serialization_round_trip_preserves_structure() {
        let (lattice, _) = tetrahedron();
        let json = serde_json::to_string(&lattice).unwrap();
        let back: IncidenceLattice = serde_json::from_str(&json).unwrap();
        assert_eq!(back.dim_census(), lattice.dim_census());
        back.validate().unwrap();
    }
}
