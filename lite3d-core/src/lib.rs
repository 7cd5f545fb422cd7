/// lite3d core library - the software mesh rendering pipeline
///
/// Everything here is independent of any drawing surface: meshes go in,
/// a [`Frame`] of screen-space polygons and strokes comes out.

pub mod config;
pub mod edges;
pub mod error;
pub mod math;
pub mod mesh;
pub mod model;
pub mod obj;
pub mod projection;
pub mod raster;
pub mod renderer;
pub mod shading;
pub mod transform;

// Re-export commonly used types
pub use config::{FillStyle, RenderStyle, RendererConfig, ViewStyle};
pub use error::{RenderError, Result};
pub use math::Vec3;
pub use mesh::{Face, Mesh, MeshLibrary, MeshSource};
pub use obj::parse_obj;
pub use projection::{Camera, Viewport};
pub use renderer::{Command, FacePolygon, Frame, Layer, Renderer, Stroke};
pub use transform::RotationState;
