/// Mesh data, built-in models and the named mesh source
use std::f64::consts::TAU;

use crate::error::{RenderError, Result};
use crate::math::{mean, normalize_or_zero, Vec3};

/// A polygon given as an ordered list of indices into the mesh's vertex list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Face {
    pub vertices: Vec<usize>,
}

impl Face {
    pub fn new(vertices: Vec<usize>) -> Self {
        Self { vertices }
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

impl From<&[usize]> for Face {
    fn from(vertices: &[usize]) -> Self {
        Self::new(vertices.to_vec())
    }
}

/// An immutable polygon mesh with one normal per face
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vec3>,
    pub faces: Vec<Face>,
    pub normals: Vec<Vec3>,
}

impl Mesh {
    pub fn new(vertices: Vec<Vec3>, faces: Vec<Face>, normals: Vec<Vec3>) -> Self {
        Self {
            vertices,
            faces,
            normals,
        }
    }

    /// Build a closed convex solid, deriving outward face normals.
    pub fn convex(vertices: Vec<Vec3>, faces: Vec<Face>) -> Self {
        let normals = convex_normals(&vertices, &faces);
        Self::new(vertices, faces, normals)
    }

    /// True when every face has a normal, which shading needs.
    pub fn has_face_normals(&self) -> bool {
        self.normals.len() == self.faces.len()
    }

    /// Check the mesh can be fed to the pipeline.
    pub fn validate(&self, name: &str) -> Result<()> {
        if self.vertices.is_empty() || self.faces.is_empty() {
            return Err(RenderError::EmptyMesh(name.to_string()));
        }

        for (face_index, face) in self.faces.iter().enumerate() {
            if face.len() < 3 {
                return Err(RenderError::InvalidFace {
                    model: name.to_string(),
                    face: face_index,
                    index: face.len(),
                });
            }
            if let Some(&bad) = face.vertices.iter().find(|&&i| i >= self.vertices.len()) {
                return Err(RenderError::InvalidFace {
                    model: name.to_string(),
                    face: face_index,
                    index: bad,
                });
            }
        }

        Ok(())
    }

    /// Unit cube centred at the origin
    pub fn cube() -> Self {
        let vertices = vec![
            Vec3::new(-1.0, -1.0, -1.0),
            Vec3::new(1.0, -1.0, -1.0),
            Vec3::new(1.0, 1.0, -1.0),
            Vec3::new(-1.0, 1.0, -1.0),
            Vec3::new(-1.0, -1.0, 1.0),
            Vec3::new(1.0, -1.0, 1.0),
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(-1.0, 1.0, 1.0),
        ];
        let faces = [
            [0, 3, 2, 1], // back
            [4, 5, 6, 7], // front
            [0, 1, 5, 4], // bottom
            [3, 7, 6, 2], // top
            [1, 2, 6, 5], // right
            [0, 4, 7, 3], // left
        ]
        .iter()
        .map(|f| Face::from(&f[..]))
        .collect();

        Self::convex(vertices, faces)
    }

    /// Square pyramid with its apex on +y
    pub fn pyramid() -> Self {
        let vertices = vec![
            Vec3::new(-1.0, -1.0, -1.0),
            Vec3::new(1.0, -1.0, -1.0),
            Vec3::new(1.0, -1.0, 1.0),
            Vec3::new(-1.0, -1.0, 1.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        let faces = vec![
            Face::new(vec![0, 1, 2, 3]),
            Face::new(vec![0, 4, 1]),
            Face::new(vec![1, 4, 2]),
            Face::new(vec![2, 4, 3]),
            Face::new(vec![3, 4, 0]),
        ];

        Self::convex(vertices, faces)
    }

    /// Regular dodecahedron; each face is the set of vertices furthest
    /// along one of the twelve face directions.
    pub fn dodecahedron() -> Self {
        let phi = (1.0 + 5f64.sqrt()) / 2.0;
        let inv = 1.0 / phi;

        let mut vertices = Vec::with_capacity(20);
        for x in [-1.0, 1.0] {
            for y in [-1.0, 1.0] {
                for z in [-1.0, 1.0] {
                    vertices.push(Vec3::new(x, y, z));
                }
            }
        }
        for a in [-inv, inv] {
            for b in [-phi, phi] {
                vertices.push(Vec3::new(0.0, a, b));
                vertices.push(Vec3::new(a, b, 0.0));
                vertices.push(Vec3::new(b, 0.0, a));
            }
        }

        let mut directions = Vec::with_capacity(12);
        for a in [-phi, phi] {
            for b in [-1.0, 1.0] {
                directions.push(Vec3::new(0.0, a, b));
                directions.push(Vec3::new(b, 0.0, a));
                directions.push(Vec3::new(a, b, 0.0));
            }
        }

        let faces = supporting_faces(&vertices, &directions);
        Self::convex(vertices, faces)
    }

    pub fn icosahedron() -> Self {
        let phi = (1.0 + 5f64.sqrt()) / 2.0;
        let mut vertices = Vec::with_capacity(12);
        for a in [-1.0, 1.0] {
            for b in [-phi, phi] {
                vertices.push(Vec3::new(0.0, a, b));
                vertices.push(Vec3::new(a, b, 0.0));
                vertices.push(Vec3::new(b, 0.0, a));
            }
        }
        let faces = equilateral_faces(&vertices, 2.0);
        Self::convex(vertices, faces)
    }

    /// Quad-faced torus around the y axis.
    ///
    /// `rings` segments run around the main circle, `sides` around the tube.
    pub fn torus(major: f64, minor: f64, rings: usize, sides: usize) -> Self {
        let rings = rings.max(3);
        let sides = sides.max(3);
        let index = |i: usize, j: usize| (i % rings) * sides + (j % sides);

        let point = |u: f64, v: f64| {
            let radial = major + minor * v.cos();
            Vec3::new(radial * u.cos(), minor * v.sin(), radial * u.sin())
        };

        let mut vertices = Vec::with_capacity(rings * sides);
        for i in 0..rings {
            for j in 0..sides {
                let u = TAU * i as f64 / rings as f64;
                let v = TAU * j as f64 / sides as f64;
                vertices.push(point(u, v));
            }
        }

        let mut faces = Vec::with_capacity(rings * sides);
        let mut normals = Vec::with_capacity(rings * sides);
        for i in 0..rings {
            for j in 0..sides {
                faces.push(Face::new(vec![
                    index(i, j),
                    index(i + 1, j),
                    index(i + 1, j + 1),
                    index(i, j + 1),
                ]));

                // Outward tube direction at the quad's centre
                let u = TAU * (i as f64 + 0.5) / rings as f64;
                let v = TAU * (j as f64 + 0.5) / sides as f64;
                normals.push(Vec3::new(v.cos() * u.cos(), v.sin(), v.cos() * u.sin()));
            }
        }

        Self::new(vertices, faces, normals)
    }
}

/// Newell normal of each face, flipped to point away from the solid's centroid.
fn convex_normals(vertices: &[Vec3], faces: &[Face]) -> Vec<Vec3> {
    let solid_centre = mean(vertices);

    faces
        .iter()
        .map(|face| {
            let points: Vec<Vec3> = face.vertices.iter().map(|&i| vertices[i]).collect();
            let mut normal = Vec3::zeros();
            for (k, p) in points.iter().enumerate() {
                normal += p.cross(&points[(k + 1) % points.len()]);
            }
            let normal = normalize_or_zero(&normal);
            if normal.dot(&(mean(&points) - solid_centre)) < 0.0 {
                -normal
            } else {
                normal
            }
        })
        .collect()
}

/// For each direction, the vertices furthest along it, in cyclic order.
fn supporting_faces(vertices: &[Vec3], directions: &[Vec3]) -> Vec<Face> {
    directions
        .iter()
        .filter_map(|d| {
            let top = vertices.iter().map(|v| v.dot(d)).fold(f64::MIN, f64::max);
            let mut members: Vec<usize> = (0..vertices.len())
                .filter(|&i| top - vertices[i].dot(d) < 1e-9)
                .collect();

            let centre = mean(members.iter().map(|&i| &vertices[i]));
            let u = normalize_or_zero(&(vertices[*members.first()?] - centre));
            let w = normalize_or_zero(&d.cross(&u));
            let angle = |i: usize| {
                let r = vertices[i] - centre;
                r.dot(&w).atan2(r.dot(&u))
            };
            members.sort_by(|&a, &b| angle(a).total_cmp(&angle(b)));
            Some(Face::new(members))
        })
        .collect()
}

/// Every vertex triple whose three sides all have length `edge`.
///
/// Recovers the faces of a regular triangle-faced solid from its vertices.
fn equilateral_faces(vertices: &[Vec3], edge: f64) -> Vec<Face> {
    let adjacent = |a: usize, b: usize| ((vertices[a] - vertices[b]).norm() - edge).abs() < 1e-9;
    let n = vertices.len();
    let mut faces = Vec::new();
    for a in 0..n {
        for b in a + 1..n {
            if !adjacent(a, b) {
                continue;
            }
            for c in b + 1..n {
                if adjacent(a, c) && adjacent(b, c) {
                    faces.push(Face::new(vec![a, b, c]));
                }
            }
        }
    }
    faces
}

/// Supplies immutable meshes by name
pub trait MeshSource {
    fn mesh(&self, name: &str) -> Option<&Mesh>;

    /// Registered model names in display order.
    fn names(&self) -> Vec<String>;
}

/// Insertion-ordered collection of named meshes
#[derive(Debug, Clone, Default)]
pub struct MeshLibrary {
    entries: Vec<(String, Mesh)>,
}

impl MeshLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Library holding the built-in models.
    pub fn with_presets() -> Self {
        let mut library = Self::new();
        library.insert("cube", Mesh::cube());
        library.insert("pyramid", Mesh::pyramid());
        library.insert("dodecahedron", Mesh::dodecahedron());
        library.insert("icosahedron", Mesh::icosahedron());
        library.insert("torus", Mesh::torus(2.0, 1.0, 16, 8));
        library.insert("wideTorus", Mesh::torus(3.0, 0.6, 20, 6));
        library
    }

    /// Insert or replace a mesh.
    pub fn insert(&mut self, name: impl Into<String>, mesh: Mesh) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = mesh,
            None => self.entries.push((name, mesh)),
        }
    }

    /// Insert under `name`, appending 2, 3, ... if the name is taken. Returns the name used.
    pub fn insert_unique(&mut self, name: &str, mesh: Mesh) -> String {
        let mut candidate = name.to_string();
        let mut suffix = 1;
        while self.contains(&candidate) {
            suffix += 1;
            candidate = format!("{name}{suffix}");
        }
        self.entries.push((candidate.clone(), mesh));
        candidate
    }

    /// Parse OBJ text and register it. Returns the name it was stored under.
    pub fn load_obj(&mut self, name: &str, text: &str) -> Result<String> {
        let mesh = crate::obj::parse_obj(text)?;
        mesh.validate(name)?;
        let stored = self.insert_unique(name, mesh);
        log::debug!("registered OBJ model `{}`", stored);
        Ok(stored)
    }

    pub fn remove(&mut self, name: &str) -> Option<Mesh> {
        let position = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(position).1)
    }

    pub fn rename(&mut self, from: &str, to: &str) -> Result<()> {
        if to.is_empty() || self.contains(to) {
            return Err(RenderError::InvalidConfig(format!(
                "cannot rename `{from}` to `{to}`"
            )));
        }
        let entry = self
            .entries
            .iter_mut()
            .find(|(n, _)| n == from)
            .ok_or_else(|| RenderError::ModelNotFound(from.to_string()))?;
        entry.0 = to.to_string();
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl MeshSource for MeshLibrary {
    fn mesh(&self, name: &str) -> Option<&Mesh> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, m)| m)
    }

    fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(n, _)| n.clone()).collect()
    }
}
