/// Live and static model geometry
use nalgebra::Quaternion;

use crate::edges::EdgeTable;
use crate::error::{RenderError, Result};
use crate::math::{mean, Vec3};
use crate::mesh::{Face, Mesh};
use crate::transform::derive_from_snapshot;

/// Scale factor and centroid that place a raw vertex cloud in camera space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub scale: f64,
    pub centroid: Vec3,
}

impl Placement {
    /// Scale so the largest axis extent equals `camera_distance`, then centre
    /// on the mean of the scaled points.
    pub fn fit(name: &str, vertices: &[Vec3], camera_distance: f64) -> Result<Self> {
        let first = vertices
            .first()
            .ok_or_else(|| RenderError::EmptyMesh(name.to_string()))?;

        let (min, max) = vertices
            .iter()
            .fold((*first, *first), |(min, max), v| (min.inf(v), max.sup(v)));
        let largest = (max - min).max();

        if !(largest.is_finite() && largest > 0.0) {
            return Err(RenderError::DegenerateModel(name.to_string()));
        }

        let scale = camera_distance / largest;
        let centroid = mean(vertices) * scale;
        Ok(Self { scale, centroid })
    }

    pub fn apply(&self, v: &Vec3) -> Vec3 {
        v * self.scale - self.centroid
    }
}

/// The per-instance state for the loaded model
#[derive(Debug, Clone)]
pub struct ModelState {
    name: String,
    mesh: Mesh,
    placement: Placement,
    /// Scaled and centred, never rotated.
    static_vertices: Vec<Vec3>,
    static_normals: Vec<Vec3>,
    /// Rotated and pushed back by the focal length; rebuilt every pass.
    vertices: Vec<Vec3>,
    normals: Vec<Vec3>,
    edges: Option<EdgeTable>,
}

impl ModelState {
    /// Load a mesh, placing it for `camera_distance`. The edge table is only
    /// built when `with_edges` is set; otherwise it is built on first use.
    pub fn load(name: &str, mesh: &Mesh, camera_distance: f64, with_edges: bool) -> Result<Self> {
        mesh.validate(name)?;
        let placement = Placement::fit(name, &mesh.vertices, camera_distance)?;

        let mut state = Self {
            name: name.to_string(),
            mesh: mesh.clone(),
            placement,
            static_vertices: Vec::new(),
            static_normals: mesh.normals.clone(),
            vertices: Vec::new(),
            normals: mesh.normals.clone(),
            edges: None,
        };
        state.write_static();
        state.reset_live(camera_distance);

        if with_edges {
            state.edges();
        }

        log::debug!(
            "loaded model `{}`: {} vertices, {} faces, scale {:.4}",
            name,
            mesh.vertices.len(),
            mesh.faces.len(),
            placement.scale
        );
        Ok(state)
    }

    /// Re-place the model for a new camera distance. Edges are kept.
    pub fn rescale(&mut self, camera_distance: f64) -> Result<()> {
        self.placement = Placement::fit(&self.name, &self.mesh.vertices, camera_distance)?;
        self.write_static();
        self.reset_live(camera_distance);
        Ok(())
    }

    fn write_static(&mut self) {
        let placement = self.placement;
        self.static_vertices = self.mesh.vertices.iter().map(|v| placement.apply(v)).collect();
    }

    /// Live lists back to the static snapshot, pushed back by `focal_length`.
    pub fn reset_live(&mut self, focal_length: f64) {
        derive_from_snapshot(None, &self.static_vertices, focal_length, &mut self.vertices);
        self.normals.clone_from(&self.static_normals);
    }

    /// Rebuild the live lists from the snapshot under `rotation`.
    ///
    /// Normals are left alone when `rotate_normals` is false.
    pub fn apply_rotation(
        &mut self,
        rotation: &Quaternion<f64>,
        focal_length: f64,
        rotate_normals: bool,
    ) {
        derive_from_snapshot(Some(rotation), &self.static_vertices, focal_length, &mut self.vertices);
        if rotate_normals {
            derive_from_snapshot(Some(rotation), &self.static_normals, 0.0, &mut self.normals);
        }
    }

    /// The edge table, building it if needed.
    pub fn edges(&mut self) -> &EdgeTable {
        let faces = &self.mesh.faces;
        self.edges.get_or_insert_with(|| {
            log::debug!("building edge table ({} faces)", faces.len());
            EdgeTable::build(faces)
        })
    }

    pub fn edges_built(&self) -> bool {
        self.edges.is_some()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn faces(&self) -> &[Face] {
        &self.mesh.faces
    }

    pub fn has_normals(&self) -> bool {
        self.mesh.has_face_normals()
    }

    pub fn placement(&self) -> Placement {
        self.placement
    }

    pub fn static_vertices(&self) -> &[Vec3] {
        &self.static_vertices
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_placement_fits_camera_distance() {
        let cube = Mesh::cube();
        let placement = Placement::fit("cube", &cube.vertices, 15.0).unwrap();
        assert_relative_eq!(placement.scale, 7.5);
        assert_relative_eq!(placement.centroid, Vec3::zeros());
    }

    #[test]
    fn test_load_centres_and_offsets() {
        let pyramid = Mesh::pyramid();
        let state = ModelState::load("pyramid", &pyramid, 15.0, false).unwrap();

        // Largest extent maps to the camera distance
        let statics = state.static_vertices();
        let height = statics.iter().map(|v| v.y).fold(f64::MIN, f64::max)
            - statics.iter().map(|v| v.y).fold(f64::MAX, f64::min);
        assert_relative_eq!(height, 15.0, epsilon = 1e-9);
        assert_relative_eq!(mean(statics), Vec3::zeros(), epsilon = 1e-9);

        for (live, fixed) in state.vertices().iter().zip(statics) {
            assert_relative_eq!(*live, fixed - Vec3::new(0.0, 0.0, 15.0));
        }
        assert!(!state.edges_built());
    }

    #[test]
    fn test_degenerate_model_rejected() {
        let point = Mesh::new(
            vec![Vec3::new(1.0, 1.0, 1.0); 3],
            vec![Face::new(vec![0, 1, 2])],
            vec![Vec3::z()],
        );
        assert_eq!(
            ModelState::load("point", &point, 15.0, false).unwrap_err(),
            RenderError::DegenerateModel("point".into())
        );
    }

    #[test]
    fn test_lazy_edges() {
        let mut state = ModelState::load("cube", &Mesh::cube(), 15.0, false).unwrap();
        assert!(!state.edges_built());
        assert_eq!(state.edges().unique_edges().len(), 12);
        assert!(state.edges_built());
    }

    #[test]
    fn test_normals_follow_rotation_from_snapshot() {
        let mut state = ModelState::load("cube", &Mesh::cube(), 15.0, false).unwrap();
        let snapshot = Mesh::cube().normals;
        let q = crate::math::rotation_quaternion(std::f64::consts::FRAC_PI_2, &Vec3::y());
        let q_inv = q.conjugate();

        // Applied twice to check nothing accumulates between passes
        for _ in 0..2 {
            state.apply_rotation(&q, 15.0, true);
            for (live, fixed) in state.normals().iter().zip(&snapshot) {
                assert_relative_eq!(*live, crate::math::rotate_vector(&q, &q_inv, fixed), epsilon = 1e-12);
            }
        }
        // Front (+z) normal turns to +x
        assert_relative_eq!(state.normals()[1], Vec3::x(), epsilon = 1e-12);

        state.reset_live(15.0);
        state.apply_rotation(&q, 15.0, false);
        assert_eq!(state.normals(), snapshot.as_slice());
        assert_relative_eq!(
            state.vertices()[6],
            crate::math::rotate_vector(&q, &q_inv, &Vec3::new(7.5, 7.5, 7.5)) - Vec3::new(0.0, 0.0, 15.0),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_rescale_keeps_edges() {
        let mut state = ModelState::load("cube", &Mesh::cube(), 15.0, true).unwrap();
        state.rescale(20.0).unwrap();
        assert!(state.edges_built());
        assert_relative_eq!(state.placement().scale, 10.0);
        assert_relative_eq!(state.vertices()[0], Vec3::new(-10.0, -10.0, -30.0));
    }
}
