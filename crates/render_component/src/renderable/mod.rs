//! Renderable components
//!
//! A renderable moves through a fixed resource lifecycle:
//!
//! ```text
//! Uninitialized -> MainMemoryLoaded -> GpuAllocated -> Released
//!       ^                                                  |
//!       +------------------- (load again) ----------------+
//! ```
//!
//! - [`Renderable::load_resources_to_main_memory`] reads geometry into CPU
//!   buffers and computes the local bounding box. It never touches the GPU.
//! - [`Renderable::allocate_gpu_resources`] links the program, resolves
//!   attribute/uniform locations, loads textures and uploads every buffer.
//!   A failure part way through deletes whatever that attempt created.
//! - [`Renderable::render`] issues exactly one draw call per invocation and
//!   leaves no vertex attribute enabled afterwards.
//! - [`Renderable::unallocate_all_resources`] frees every handle the
//!   renderable created. Externally supplied textures are left alone.
//!
//! The provided trait methods enforce the ordering; variants only implement
//! the per-stage hooks.

pub mod bindings;
mod directional_light;
mod per_vertex_colour;
mod phong;
mod single_colour;
mod textured;
mod textured_obj;
mod unit_polygon;

pub use directional_light::DirectionalLightObjMesh;
pub use per_vertex_colour::{PerVertexColourMesh, SharedVertexBuffer};
pub use phong::{PhongMaterial, PhongShadingObjMesh, PointLight};
pub use single_colour::SingleColourMesh;
pub use textured_obj::TexturedObjMesh;
pub use unit_polygon::UnitPolygonTextured;

use crate::bounds::BoundingBox;
use crate::config::ShaderProgramConfig;
use crate::error::{RenderableError, RenderableResult};
use crate::foundation::math::Mat4;
use crate::gpu::{
    AttributeLocation, BufferHandle, BufferUsage, GraphicsDevice, Primitive, ProgramHandle,
    TextureHandle, UniformLocation,
};
use crate::resources::ResourceManager;
use crate::scene::Component;
use bitflags::bitflags;

/// Where a renderable is in its resource lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    /// Constructed, nothing loaded
    Uninitialized,
    /// CPU buffers filled, bounding box computed
    MainMemoryLoaded,
    /// GPU program, buffers and textures live; render is allowed
    GpuAllocated,
    /// GPU resources freed
    Released,
}

/// Camera matrices threaded through a frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraMatrices {
    /// Projection matrix (P)
    pub projection: Mat4,
    /// View matrix (V)
    pub view: Mat4,
}

impl Default for CameraMatrices {
    fn default() -> Self {
        Self::identity()
    }
}

impl CameraMatrices {
    /// Create from P and V
    pub fn new(projection: Mat4, view: Mat4) -> Self {
        Self { projection, view }
    }

    /// Identity P and V
    pub fn identity() -> Self {
        Self::new(Mat4::identity(), Mat4::identity())
    }

    /// P * V * model
    pub fn mvp(&self, model: &Mat4) -> Mat4 {
        self.projection * self.view * model
    }
}

bitflags! {
    /// Per-vertex streams a renderable feeds to its program
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct VertexAttributes: u8 {
        /// Positions
        const POSITION = 1 << 0;
        /// Texture coordinates
        const UV = 1 << 1;
        /// Normals
        const NORMAL = 1 << 2;
        /// Per-vertex colours
        const COLOUR = 1 << 3;
    }
}

/// State every renderable carries regardless of variant
#[derive(Debug, Clone, PartialEq)]
pub struct RenderableBase {
    enabled: bool,
    primitive: Primitive,
    bounding_box: BoundingBox,
    state: LifecycleState,
}

impl Default for RenderableBase {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderableBase {
    /// Enabled, drawing triangles, with the default [-1, 1] bounding box
    pub fn new() -> Self {
        Self {
            enabled: true,
            primitive: Primitive::Triangles,
            bounding_box: BoundingBox::default(),
            state: LifecycleState::Uninitialized,
        }
    }

    /// Start with a fixed bounding box
    #[must_use]
    pub fn with_bounding_box(mut self, bounding_box: BoundingBox) -> Self {
        self.bounding_box = bounding_box;
        self
    }

    /// Whether render issues GPU work
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Toggle rendering
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Current lifecycle state
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Replace the local bounding box
    pub fn set_bounding_box(&mut self, bounding_box: BoundingBox) {
        self.bounding_box = bounding_box;
    }
}

/// Drawable component with a GPU resource lifecycle
///
/// Implementors provide the four `*_gpu_*`/`*_cpu_*` hooks; callers use the
/// provided lifecycle methods, which reject out-of-order calls with
/// [`RenderableError::InvalidLifecycle`] before any hook runs.
pub trait Renderable: Component {
    /// Shared renderable state
    fn base(&self) -> &RenderableBase;

    /// Shared renderable state, mutably
    fn base_mut(&mut self) -> &mut RenderableBase;

    /// Number of vertices drawn per call
    fn vertex_count(&self) -> usize;

    /// Streams fed to the program
    fn vertex_attributes(&self) -> VertexAttributes;

    /// Fill CPU buffers and refresh the bounding box
    fn load_cpu_data(&mut self, resources: &ResourceManager) -> RenderableResult<()>;

    /// Create and upload every GPU resource. On error nothing may remain allocated.
    fn create_gpu_resources(
        &mut self,
        device: &mut dyn GraphicsDevice,
        resources: &mut ResourceManager,
    ) -> RenderableResult<()>;

    /// Issue the draw call. Only invoked while GPU-allocated and enabled.
    fn draw(&self, device: &mut dyn GraphicsDevice, camera: &CameraMatrices, model: &Mat4);

    /// Free every GPU resource this renderable created
    fn release_gpu_resources(&mut self, device: &mut dyn GraphicsDevice);

    /// Current lifecycle state
    fn lifecycle_state(&self) -> LifecycleState {
        self.base().state
    }

    /// Topology used for draw calls
    fn primitive(&self) -> Primitive {
        self.base().primitive
    }

    /// Change the topology, returning the previous one
    fn set_primitive(&mut self, primitive: Primitive) -> Primitive {
        std::mem::replace(&mut self.base_mut().primitive, primitive)
    }

    /// Bounding box in the renderable's local frame
    fn local_bounding_box(&self) -> BoundingBox {
        self.base().bounding_box
    }

    /// `Uninitialized | Released -> MainMemoryLoaded`
    fn load_resources_to_main_memory(&mut self, resources: &ResourceManager) -> RenderableResult<()> {
        let actual = self.lifecycle_state();
        if !matches!(actual, LifecycleState::Uninitialized | LifecycleState::Released) {
            log::warn!("Load requested in state {:?}", actual);
            return Err(RenderableError::InvalidLifecycle {
                expected: LifecycleState::Uninitialized,
                actual,
            });
        }

        self.load_cpu_data(resources)?;
        self.base_mut().state = LifecycleState::MainMemoryLoaded;
        log::debug!("Loaded {} vertices to main memory", self.vertex_count());
        Ok(())
    }

    /// `MainMemoryLoaded -> GpuAllocated`
    fn allocate_gpu_resources(
        &mut self,
        device: &mut dyn GraphicsDevice,
        resources: &mut ResourceManager,
    ) -> RenderableResult<()> {
        expect_state(self.lifecycle_state(), LifecycleState::MainMemoryLoaded)?;
        self.create_gpu_resources(device, resources)?;
        self.base_mut().state = LifecycleState::GpuAllocated;
        Ok(())
    }

    /// Draw once. Returns `false` when disabled or not GPU-allocated.
    fn render(&self, device: &mut dyn GraphicsDevice, camera: &CameraMatrices, model: &Mat4) -> bool {
        if !self.is_enabled() {
            return false;
        }
        if self.lifecycle_state() != LifecycleState::GpuAllocated {
            log::warn!("Render skipped: renderable is {:?}", self.lifecycle_state());
            return false;
        }
        self.draw(device, camera, model);
        true
    }

    /// `GpuAllocated -> Released`
    fn unallocate_all_resources(&mut self, device: &mut dyn GraphicsDevice) -> RenderableResult<()> {
        expect_state(self.lifecycle_state(), LifecycleState::GpuAllocated)?;
        self.release_gpu_resources(device);
        self.base_mut().state = LifecycleState::Released;
        Ok(())
    }
}

fn expect_state(actual: LifecycleState, expected: LifecycleState) -> RenderableResult<()> {
    if actual == expected {
        Ok(())
    } else {
        log::warn!("Lifecycle stage requires {:?}, renderable is {:?}", expected, actual);
        Err(RenderableError::InvalidLifecycle { expected, actual })
    }
}

/// Texture a textured variant samples from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextureSource {
    /// Load from a file, routed by extension. An empty name loads nothing and
    /// binds no texture.
    File(String),
    /// Caller-owned texture; never deleted by the renderable
    External(TextureHandle),
}

impl From<&str> for TextureSource {
    fn from(name: &str) -> Self {
        Self::File(name.to_string())
    }
}

impl From<String> for TextureSource {
    fn from(name: String) -> Self {
        Self::File(name)
    }
}

impl From<TextureHandle> for TextureSource {
    fn from(handle: TextureHandle) -> Self {
        Self::External(handle)
    }
}

/// A texture as held while GPU-allocated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct BoundTexture {
    pub handle: Option<TextureHandle>,
    pub owned: bool,
}

impl BoundTexture {
    pub fn bind(self, device: &mut dyn GraphicsDevice, sampler: Option<UniformLocation>) {
        device.bind_texture(bindings::TEXTURE_UNIT, self.handle);
        if let Some(sampler) = sampler {
            device.set_uniform_i32(sampler, bindings::TEXTURE_UNIT as i32);
        }
    }

    pub fn release(self, device: &mut dyn GraphicsDevice) {
        if let (Some(handle), true) = (self.handle, self.owned) {
            device.delete_texture(handle);
        }
    }
}

/// A GPU buffer wired to a program attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct VertexStream {
    pub location: Option<AttributeLocation>,
    pub buffer: BufferHandle,
    pub components: u32,
}

impl VertexStream {
    /// Overwrite the buffer contents with the frequent-update policy
    pub fn update<T: bytemuck::Pod>(&self, device: &mut dyn GraphicsDevice, data: &[T]) {
        device.buffer_data(self.buffer, bytemuck::cast_slice(data), BufferUsage::Dynamic);
    }
}

/// Enable `streams`, draw, then disable them again
pub(crate) fn draw_streams(
    device: &mut dyn GraphicsDevice,
    streams: &[VertexStream],
    primitive: Primitive,
    vertex_count: usize,
) {
    for stream in streams {
        if let Some(location) = stream.location {
            device.enable_vertex_attribute(location);
            device.vertex_attribute_pointer(location, stream.buffer, stream.components);
        }
    }

    device.draw_arrays(primitive, 0, u32::try_from(vertex_count).unwrap_or(u32::MAX));

    for stream in streams {
        if let Some(location) = stream.location {
            device.disable_vertex_attribute(location);
        }
    }
}

/// Handles created during one allocation attempt
///
/// Everything requested through the tracker is deleted again when the attempt
/// ends in an error (see [`PendingAllocation::finish`]).
#[derive(Debug, Default)]
pub(crate) struct PendingAllocation {
    program: Option<ProgramHandle>,
    buffers: Vec<BufferHandle>,
    textures: Vec<TextureHandle>,
}

impl PendingAllocation {
    pub fn program(
        &mut self,
        device: &mut dyn GraphicsDevice,
        resources: &mut ResourceManager,
        config: &ShaderProgramConfig,
    ) -> RenderableResult<ProgramHandle> {
        let program = resources.load_program(device, config)?;
        self.program = Some(program);
        Ok(program)
    }

    /// Create a buffer, upload `data` once and resolve the attribute `name`
    pub fn stream<T: bytemuck::Pod>(
        &mut self,
        device: &mut dyn GraphicsDevice,
        program: ProgramHandle,
        name: &str,
        data: &[T],
        components: u32,
    ) -> RenderableResult<VertexStream> {
        let buffer = device.create_buffer()?;
        self.buffers.push(buffer);
        device.buffer_data(buffer, bytemuck::cast_slice(data), BufferUsage::Static);

        let location = device.attribute_location(program, name);
        if location.is_none() {
            log::debug!("Program {:?} has no attribute '{}'", program, name);
        }
        Ok(VertexStream { location, buffer, components })
    }

    pub fn texture(
        &mut self,
        device: &mut dyn GraphicsDevice,
        resources: &mut ResourceManager,
        source: &TextureSource,
    ) -> RenderableResult<BoundTexture> {
        match source {
            TextureSource::External(handle) => Ok(BoundTexture {
                handle: Some(*handle),
                owned: false,
            }),
            TextureSource::File(name) => match resources.load_texture_by_name(device, name)? {
                Some(handle) => {
                    self.textures.push(handle);
                    Ok(BoundTexture { handle: Some(handle), owned: true })
                }
                None => Ok(BoundTexture::default()),
            },
        }
    }

    /// Pass a successful result through, or delete every tracked handle
    pub fn finish<T>(self, device: &mut dyn GraphicsDevice, result: RenderableResult<T>) -> RenderableResult<T> {
        if let Err(e) = &result {
            log::warn!(
                "Allocation failed ({}), releasing {} buffer(s) and {} texture(s)",
                e,
                self.buffers.len(),
                self.textures.len()
            );
            for buffer in self.buffers {
                device.delete_buffer(buffer);
            }
            for texture in self.textures {
                device.delete_texture(texture);
            }
            if let Some(program) = self.program {
                device.delete_program(program);
            }
        }
        result
    }
}

/// Check that `data` holds exactly `expected` vertices of `components` floats
pub(crate) fn check_vertex_data(data: &[f32], components: usize, expected: usize) -> RenderableResult<()> {
    if data.len() % components != 0 {
        return Err(RenderableError::MalformedVertexData {
            len: data.len(),
            components,
        });
    }
    let actual = data.len() / components;
    if actual == expected {
        Ok(())
    } else {
        Err(RenderableError::VertexCountMismatch { expected, actual })
    }
}
