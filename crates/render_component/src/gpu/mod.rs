//! GPU device abstraction
//!
//! Renderables never talk to a graphics API directly. They issue GL-style
//! immediate calls against a [`GraphicsDevice`], which keeps them testable on the
//! [`HeadlessDevice`] and portable to a real context (`GlDevice`, behind the
//! `gl` feature).
//!
//! All calls are synchronous and must happen on the thread that owns the
//! context. Handles are exclusively owned by whoever created them; the device
//! does no reference counting.

mod headless;
#[cfg(feature = "gl")]
mod gl;

pub use headless::{DrawCall, HeadlessDevice, UniformValue};
#[cfg(feature = "gl")]
pub use gl::GlDevice;

use crate::foundation::math::{Mat4, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

slotmap::new_key_type! {
    /// Handle to a linked GPU program (vertex + fragment stage)
    pub struct ProgramHandle;
    /// Handle to a GPU vertex buffer
    pub struct BufferHandle;
    /// Handle to a GPU 2D texture
    pub struct TextureHandle;
}

/// Slot of a per-vertex input on a program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttributeLocation(pub u32);

/// Slot of a per-draw constant on a program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UniformLocation(pub u32);

/// Topology used to interpret a vertex buffer during a draw call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Primitive {
    /// Independent points
    Points,
    /// Independent line segments
    Lines,
    /// Connected line segments
    LineStrip,
    /// Closed connected line segments
    LineLoop,
    /// Independent triangles
    #[default]
    Triangles,
    /// Triangle strip
    TriangleStrip,
    /// Triangle fan
    TriangleFan,
}

/// Upload policy hint for buffer contents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    /// Uploaded once at allocation and drawn many times
    Static,
    /// Overwritten frequently (vertex/colour updates)
    Dynamic,
}

/// Errors reported by a graphics device
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// Shader stage compilation or program linking failed
    #[error("Program creation failed: {0}")]
    ProgramCreation(String),

    /// Buffer or texture creation failed
    #[error("Resource creation failed: {0}")]
    ResourceCreation(String),

    /// Texture pixel data does not match the requested size
    #[error("Invalid texture data: expected {expected} bytes, got {actual}")]
    InvalidTextureData {
        /// Bytes required by width * height * 4
        expected: usize,
        /// Bytes supplied
        actual: usize,
    },
}

/// Result type for device operations
pub type DeviceResult<T> = Result<T, DeviceError>;

/// GL-style immediate-mode graphics device
///
/// Locations that a program does not expose resolve to `None`; callers skip
/// them, the same way GL ignores a `-1` location.
pub trait GraphicsDevice {
    /// Compile both stages and link them into a program
    fn create_program(&mut self, vertex_source: &str, fragment_source: &str) -> DeviceResult<ProgramHandle>;

    /// Delete a program created by [`create_program`](Self::create_program)
    fn delete_program(&mut self, program: ProgramHandle);

    /// Resolve a named vertex attribute on a program
    fn attribute_location(&mut self, program: ProgramHandle, name: &str) -> Option<AttributeLocation>;

    /// Resolve a named uniform on a program
    fn uniform_location(&mut self, program: ProgramHandle, name: &str) -> Option<UniformLocation>;

    /// Make a program current (or none)
    fn use_program(&mut self, program: Option<ProgramHandle>);

    /// Allocate an empty vertex buffer
    fn create_buffer(&mut self) -> DeviceResult<BufferHandle>;

    /// Replace the whole contents of a buffer
    fn buffer_data(&mut self, buffer: BufferHandle, data: &[u8], usage: BufferUsage);

    /// Free a buffer
    fn delete_buffer(&mut self, buffer: BufferHandle);

    /// Create a 2D texture from tightly packed RGBA8 pixels
    fn create_texture_rgba8(&mut self, width: u32, height: u32, pixels: &[u8]) -> DeviceResult<TextureHandle>;

    /// Bind a texture to a texture unit
    fn bind_texture(&mut self, unit: u32, texture: Option<TextureHandle>);

    /// Free a texture
    fn delete_texture(&mut self, texture: TextureHandle);

    /// Upload a 4x4 matrix uniform on the current program
    fn set_uniform_mat4(&mut self, location: UniformLocation, value: &Mat4);

    /// Upload a vec3 uniform on the current program
    fn set_uniform_vec3(&mut self, location: UniformLocation, value: &Vec3);

    /// Upload a float uniform on the current program
    fn set_uniform_f32(&mut self, location: UniformLocation, value: f32);

    /// Upload an int uniform (e.g. sampler unit) on the current program
    fn set_uniform_i32(&mut self, location: UniformLocation, value: i32);

    /// Enable a vertex attribute slot
    fn enable_vertex_attribute(&mut self, location: AttributeLocation);

    /// Feed `buffer` into an attribute slot as tightly packed f32 tuples of `components`
    fn vertex_attribute_pointer(&mut self, location: AttributeLocation, buffer: BufferHandle, components: u32);

    /// Disable a vertex attribute slot
    fn disable_vertex_attribute(&mut self, location: AttributeLocation);

    /// Toggle back-face culling
    fn set_face_culling(&mut self, enabled: bool);

    /// Draw `count` vertices starting at `first`
    fn draw_arrays(&mut self, primitive: Primitive, first: u32, count: u32);
}
