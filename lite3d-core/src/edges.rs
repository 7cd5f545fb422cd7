/// Edge tables and per-frame visible edge selection
use std::collections::HashSet;
use std::fmt;

use crate::config::FillStyle;
use crate::mesh::Face;
use crate::shading::VisibleFace;

/// An undirected edge identity: the two vertex indices in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey(usize, usize);

impl EdgeKey {
    pub fn new(a: usize, b: usize) -> Self {
        if a <= b {
            Self(a, b)
        } else {
            Self(b, a)
        }
    }

    pub fn pair(&self) -> [usize; 2] {
        [self.0, self.1]
    }
}

impl fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{}]", self.0, self.1)
    }
}

/// A face edge in declared direction with its canonical key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub vertices: [usize; 2],
    pub key: EdgeKey,
}

impl Edge {
    pub fn new(from: usize, to: usize) -> Self {
        Self {
            vertices: [from, to],
            key: EdgeKey::new(from, to),
        }
    }
}

/// Per-face edges plus the model-wide list of distinct edges.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgeTable {
    face_edges: Vec<Vec<Edge>>,
    unique: Vec<[usize; 2]>,
}

impl EdgeTable {
    /// Slot `i` of each face connects to slot `(i + 1) mod k`.
    pub fn build(faces: &[Face]) -> Self {
        let face_edges: Vec<Vec<Edge>> = faces
            .iter()
            .map(|face| {
                let k = face.len();
                (0..k)
                    .map(|i| Edge::new(face.vertices[i], face.vertices[(i + 1) % k]))
                    .collect()
            })
            .collect();

        let mut seen = HashSet::new();
        let unique = face_edges
            .iter()
            .flatten()
            .filter(|edge| seen.insert(edge.key))
            .map(|edge| edge.key.pair())
            .collect();

        Self { face_edges, unique }
    }

    pub fn face_edges(&self, face: usize) -> &[Edge] {
        self.face_edges.get(face).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Distinct edges in order of first appearance, each as an ascending pair.
    pub fn unique_edges(&self) -> &[[usize; 2]] {
        &self.unique
    }

    pub fn face_count(&self) -> usize {
        self.face_edges.len()
    }
}

/// Edges drawn together, optionally owned by a mesh face.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeGroup {
    pub face: Option<usize>,
    pub edges: Vec<[usize; 2]>,
}

/// Decide which edges to draw this frame.
///
/// With [`FillStyle::WireframeFull`] every model edge is its own group.
/// Otherwise there is one group per visible face, index-aligned with
/// `visible`: faces are scanned nearest first so a shared edge lands in the
/// bucket of the nearest visible face that uses it, and is never emitted twice.
pub fn select_visible_edges(
    table: &EdgeTable,
    visible: &[VisibleFace],
    fill: FillStyle,
) -> Vec<EdgeGroup> {
    if fill == FillStyle::WireframeFull {
        return table
            .unique_edges()
            .iter()
            .map(|&edge| EdgeGroup {
                face: None,
                edges: vec![edge],
            })
            .collect();
    }

    let mut registry = HashSet::new();
    let mut groups: Vec<EdgeGroup> = visible
        .iter()
        .rev()
        .map(|face| EdgeGroup {
            face: Some(face.face),
            edges: table
                .face_edges(face.face)
                .iter()
                .filter(|edge| registry.insert(edge.key))
                .map(|edge| edge.vertices)
                .collect(),
        })
        .collect();

    groups.reverse();
    groups
}
