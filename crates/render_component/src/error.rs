//! Renderable error type

use crate::gpu::DeviceError;
use crate::renderable::LifecycleState;
use crate::resources::{GeometryError, ShaderError, TextureError};
use thiserror::Error;

/// Errors reported by renderable lifecycle stages and buffer updates
#[derive(Error, Debug)]
pub enum RenderableError {
    /// Geometry file could not be read
    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    /// Texture could not be loaded
    #[error("Texture error: {0}")]
    Texture(#[from] TextureError),

    /// Program could not be created
    #[error("Shader error: {0}")]
    Shader(#[from] ShaderError),

    /// Device refused a buffer or texture
    #[error("Device error: {0}")]
    Device(#[from] DeviceError),

    /// A stage was called from the wrong lifecycle state
    #[error("Invalid lifecycle transition: expected {expected:?}, found {actual:?}")]
    InvalidLifecycle {
        /// State the stage requires
        expected: LifecycleState,
        /// State the renderable was in
        actual: LifecycleState,
    },

    /// A buffer update tried to change the vertex count
    #[error("Vertex count mismatch: expected {expected}, got {actual}")]
    VertexCountMismatch {
        /// Vertices the renderable was created with
        expected: usize,
        /// Vertices supplied
        actual: usize,
    },

    /// Vertex data has a length that is not a whole number of vertices
    #[error("Vertex data length {len} is not a multiple of {components}")]
    MalformedVertexData {
        /// Floats supplied
        len: usize,
        /// Floats per vertex
        components: usize,
    },

    /// A shared buffer lock was poisoned by a panicking writer
    #[error("Shared vertex buffer lock poisoned")]
    PoisonedBuffer,
}

/// Result type for renderable operations
pub type RenderableResult<T> = Result<T, RenderableError>;
