/// Error types for the rendering pipeline
use thiserror::Error;

/// Errors that can occur while loading a model or running a render pass.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    /// No mesh is registered under the requested name.
    #[error("model `{0}` not found")]
    ModelNotFound(String),

    /// The mesh has no vertices or no faces.
    #[error("model `{0}` has no vertices or no faces")]
    EmptyMesh(String),

    /// A face references a vertex that does not exist, or has too few slots.
    #[error("model `{model}`: face {face} has invalid vertex index {index}")]
    InvalidFace {
        model: String,
        face: usize,
        index: usize,
    },

    /// Every axis-aligned extent of the vertex cloud is zero.
    #[error("model `{0}` is degenerate (zero extent on every axis)")]
    DegenerateModel(String),

    /// A shading style was requested for a model without one normal per face.
    #[error("model `{model}` has {normals} normals for {faces} faces; shading is unavailable")]
    MissingNormals {
        model: String,
        faces: usize,
        normals: usize,
    },

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// An OBJ statement could not be parsed.
    #[error("OBJ parse error on line {line}: {message}")]
    ObjParse { line: usize, message: String },
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, RenderError>;
