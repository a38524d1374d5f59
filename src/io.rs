//! Text boundary formats: sphere input parsing and diagram record output.
//!
//! These are the de facto interchange formats of the surrounding tooling,
//! not part of the geometric core. Input is two parallel streams, one line
//! of comma-separated center coordinates per sphere and one radius line.
//! Output is one record per line, the leading tag selecting the entity:
//!
//! ```text
//! s<i> <center...> <radius>     sphere
//! p<j> <coordinates...>         diagram 0-face
//! ei p<a> p<b> s<i> s<j> ...    internal edge between two 0-faces
//! ee p<a> s<i> s<j> ... d <x..> extremal edge with outward direction
//! ```

#![forbid(unsafe_code)]

use std::io::{BufRead, Write};

use nalgebra::DVector;
use thiserror::Error;

use crate::core::collections::FastHashMap;
use crate::core::lattice::{FaceKey, IncidenceLattice, LatticeError};
use crate::core::skeleton::{DiagramEdge, EdgeKind};
use crate::core::sphere::Sphere;

/// Errors raised while reading sphere input.
#[derive(Debug, Error)]
pub enum ReadError {
    /// An underlying stream failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// A token could not be parsed as a number.
    #[error("line {line}: cannot parse {token:?} as a number")]
    Parse {
        /// 1-based line number in the offending stream.
        line: usize,
        /// The unparseable token.
        token: String,
    },
}

/// Read spheres from parallel center and radius streams.
///
/// Reading stops when either stream ends; blank center lines are skipped
/// together with their radius line.
///
/// # Errors
///
/// Returns a [`ReadError`] on I/O failures or unparseable numbers.
///
/// # Examples
///
/// ```
/// use powerdiagram::io::read_spheres;
///
/// let centers = "0.0,0.0\n4.0,0.0\n";
/// let radii = "1.0\n1.0\n";
/// let spheres = read_spheres(centers.as_bytes(), radii.as_bytes()).unwrap();
/// assert_eq!(spheres.len(), 2);
/// assert_eq!(spheres[1].radius(), 1.0);
/// ```
pub fn read_spheres<C: BufRead, R: BufRead>(
    centers: C,
    radii: R,
) -> Result<Vec<Sphere>, ReadError> {
    let mut spheres = Vec::new();

    for (number, (center_line, radius_line)) in centers.lines().zip(radii.lines()).enumerate() {
        let line = number + 1;
        let center_line = center_line?;
        let radius_line = radius_line?;
        if center_line.trim().is_empty() {
            continue;
        }

        let mut coordinates = Vec::new();
        for token in center_line.split(',') {
            coordinates.push(parse_number(token, line)?);
        }
        let radius = parse_number(&radius_line, line)?;

        spheres.push(Sphere::new(DVector::from_vec(coordinates), radius));
    }

    Ok(spheres)
}

fn parse_number(token: &str, line: usize) -> Result<f64, ReadError> {
    token
        .trim()
        .parse()
        .map_err(|_| ReadError::Parse { line, token: token.trim().to_owned() })
}

/// Errors raised while writing diagram records.
#[derive(Debug, Error)]
pub enum WriteError {
    /// The underlying writer failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// The diagram lattice was malformed.
    #[error(transparent)]
    Lattice(#[from] LatticeError),
}

/// Write a finished diagram as tagged records.
///
/// `edges` is the 1-skeleton as computed by
/// [`diagram_edges`](crate::core::skeleton::diagram_edges); pass an empty
/// slice for 1-dimensional diagrams. Sphere indices are the cell site labels
/// plus one; 0-face indices follow the lattice's vertex order, also 1-based.
///
/// # Errors
///
/// Returns a [`WriteError`] on writer failures or malformed lattices.
pub fn write_records<W: Write>(
    mut out: W,
    diagram: &IncidenceLattice,
    spheres: &[Sphere],
    edges: &[DiagramEdge],
) -> Result<(), WriteError> {
    for (index, sphere) in spheres.iter().enumerate() {
        write!(out, "s{}", index + 1)?;
        for coordinate in sphere.center().iter() {
            write!(out, " {coordinate}")?;
        }
        writeln!(out, " {}", sphere.radius())?;
    }
    writeln!(out)?;

    let mut point_numbers: FastHashMap<FaceKey, usize> = FastHashMap::default();
    for (number, vertex) in diagram.vertices().into_iter().enumerate() {
        point_numbers.insert(vertex, number + 1);
        write!(out, "p{}", number + 1)?;
        let face = diagram.face(vertex)?;
        let coordinates = face
            .coordinates()
            .ok_or(LatticeError::MissingCoordinates { vertex })?;
        for coordinate in coordinates.iter() {
            write!(out, " {coordinate}")?;
        }
        writeln!(out)?;
    }
    writeln!(out)?;

    for edge in edges {
        match edge.kind {
            EdgeKind::Internal => write!(out, "ei")?,
            EdgeKind::Extremal => write!(out, "ee")?,
        }
        for endpoint in &edge.endpoints {
            let number = point_numbers
                .get(endpoint)
                .ok_or(LatticeError::UnknownFace { face: *endpoint })?;
            write!(out, " p{number}")?;
        }
        for site in &edge.sites {
            write!(out, " s{}", site + 1)?;
        }
        if edge.kind == EdgeKind::Extremal {
            write!(out, " d")?;
            for coordinate in edge.direction.iter() {
                write!(out, " {coordinate}")?;
            }
        }
        writeln!(out)?;
    }

    Ok(())
}
