/// Back-face culling, flat shading and painter's ordering
use crate::math::{mean, normalize_or_zero, Vec3};
use crate::mesh::Face;

/// Light sources used for flat shading (intensities on a 0..255 scale)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lighting {
    pub ambient: f64,
    pub camera: f64,
}

impl Lighting {
    pub fn new(ambient: f64, camera: f64) -> Self {
        Self { ambient, camera }
    }

    /// `ambient + camera · shade`
    pub fn color(&self, shade: f64) -> f64 {
        self.ambient + self.camera * shade
    }
}

/// A face that survived back-face culling this frame
#[derive(Debug, Clone, PartialEq)]
pub struct VisibleFace {
    /// Index into the mesh's face list.
    pub face: usize,
    /// `normal · view`, in (0, 1].
    pub shade: f64,
    pub color: f64,
    /// The face's vertex indices in slot order.
    pub vertices: Vec<usize>,
    /// Centroid depth; ascending order paints back to front.
    pub depth: f64,
}

/// Cull and shade every face, returning the survivors sorted back to front.
///
/// `vertices` and `normals` are the live (rotated, camera-space) lists.
/// Faces without a normal are skipped.
pub fn shade_faces(
    vertices: &[Vec3],
    faces: &[Face],
    normals: &[Vec3],
    camera: &Vec3,
    lighting: &Lighting,
) -> Vec<VisibleFace> {
    let mut visible: Vec<VisibleFace> = faces
        .iter()
        .zip(normals)
        .enumerate()
        .filter_map(|(index, (face, normal))| {
            let centroid = mean(face.vertices.iter().map(|&v| &vertices[v]));
            let view = normalize_or_zero(&(camera - centroid));
            let shade = normal.dot(&view);

            (shade > 0.0).then(|| VisibleFace {
                face: index,
                shade,
                color: lighting.color(shade),
                vertices: face.vertices.clone(),
                depth: centroid.z,
            })
        })
        .collect();

    // Stable, so faces at equal depth keep declaration order
    visible.sort_by(|a, b| a.depth.total_cmp(&b.depth));
    visible
}
