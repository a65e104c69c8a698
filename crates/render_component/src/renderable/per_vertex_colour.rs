//! Mesh with one RGB colour per vertex, placed in the world through its MVP
//!
//! Data is either owned by the mesh or shared with the caller through a
//! [`SharedVertexBuffer`]. Shared buffers suit data rewritten every frame (a
//! depth-camera point cloud, for instance): the caller writes into the buffer
//! and calls [`PerVertexColourMesh::sync_shared_buffers`] to re-upload.

use super::{
    bindings, check_vertex_data, draw_streams, CameraMatrices, PendingAllocation, Renderable,
    RenderableBase, VertexAttributes, VertexStream,
};
use crate::bounds::BoundingBox;
use crate::error::{RenderableError, RenderableResult};
use crate::foundation::math::Mat4;
use crate::gpu::{GraphicsDevice, ProgramHandle, UniformLocation};
use crate::resources::ResourceManager;
use std::sync::{Arc, RwLock};

/// Vertex data shared between a mesh and its caller
pub type SharedVertexBuffer = Arc<RwLock<Vec<f32>>>;

#[derive(Debug)]
enum VertexData {
    Owned(Vec<f32>),
    Shared(SharedVertexBuffer),
}

impl VertexData {
    fn read<R>(&self, f: impl FnOnce(&[f32]) -> R) -> RenderableResult<R> {
        match self {
            Self::Owned(data) => Ok(f(data)),
            Self::Shared(buffer) => {
                let data = buffer.read().map_err(|_| RenderableError::PoisonedBuffer)?;
                Ok(f(&data))
            }
        }
    }

    /// Copy `values` over the current contents. A shared buffer resized by its
    /// other owner is reported rather than overwritten.
    fn overwrite(&mut self, values: &[f32]) -> RenderableResult<()> {
        match self {
            Self::Owned(data) => copy_same_len(data, values),
            Self::Shared(buffer) => {
                let mut data = buffer.write().map_err(|_| RenderableError::PoisonedBuffer)?;
                copy_same_len(&mut data, values)
            }
        }
    }
}

fn copy_same_len(data: &mut [f32], values: &[f32]) -> RenderableResult<()> {
    if data.len() != values.len() {
        return Err(RenderableError::VertexCountMismatch {
            expected: values.len() / 3,
            actual: data.len() / 3,
        });
    }
    data.copy_from_slice(values);
    Ok(())
}

#[derive(Debug)]
struct PerVertexColourGpu {
    program: ProgramHandle,
    mvp: Option<UniformLocation>,
    position: VertexStream,
    colour: VertexStream,
}

/// Mesh with per-vertex colours
#[derive(Debug)]
pub struct PerVertexColourMesh {
    base: RenderableBase,
    vertices: VertexData,
    colours: VertexData,
    vertex_count: usize,
    gpu: Option<PerVertexColourGpu>,
}

impl PerVertexColourMesh {
    /// Own copies of flat `x, y, z` positions and `r, g, b` colours
    pub fn new(vertices: Vec<f32>, colours: Vec<f32>) -> RenderableResult<Self> {
        let vertex_count = vertices.len() / 3;
        check_vertex_data(&vertices, 3, vertex_count)?;
        check_vertex_data(&colours, 3, vertex_count)?;
        Ok(Self::from_data(VertexData::Owned(vertices), VertexData::Owned(colours), vertex_count))
    }

    /// Share position and colour buffers with the caller. The vertex count is
    /// fixed by the buffer contents at construction.
    pub fn with_shared_buffers(vertices: SharedVertexBuffer, colours: SharedVertexBuffer) -> RenderableResult<Self> {
        let vertices = VertexData::Shared(vertices);
        let colours = VertexData::Shared(colours);
        let vertex_count = vertices.read(<[f32]>::len)? / 3;
        vertices.read(|v| check_vertex_data(v, 3, vertex_count))??;
        colours.read(|c| check_vertex_data(c, 3, vertex_count))??;
        Ok(Self::from_data(vertices, colours, vertex_count))
    }

    fn from_data(vertices: VertexData, colours: VertexData, vertex_count: usize) -> Self {
        Self {
            base: RenderableBase::new(),
            vertices,
            colours,
            vertex_count,
            gpu: None,
        }
    }

    /// Whether the buffers are shared with the caller
    pub fn is_shared(&self) -> bool {
        matches!(self.vertices, VertexData::Shared(_))
    }

    /// Replace every position; see [`SingleColourMesh::set_vertices`](super::SingleColourMesh::set_vertices)
    pub fn set_vertices(&mut self, device: &mut dyn GraphicsDevice, vertices: &[f32]) -> RenderableResult<()> {
        check_vertex_data(vertices, 3, self.vertex_count)?;
        self.vertices.overwrite(vertices)?;
        self.base.set_bounding_box(BoundingBox::from_flat(vertices));
        if let Some(gpu) = &self.gpu {
            gpu.position.update(device, vertices);
        }
        Ok(())
    }

    /// Replace every colour, keeping the vertex count
    pub fn set_colours(&mut self, device: &mut dyn GraphicsDevice, colours: &[f32]) -> RenderableResult<()> {
        check_vertex_data(colours, 3, self.vertex_count)?;
        self.colours.overwrite(colours)?;
        if let Some(gpu) = &self.gpu {
            gpu.colour.update(device, colours);
        }
        Ok(())
    }

    /// Re-upload both buffers from their current contents, e.g. after the
    /// caller wrote into shared buffers.
    pub fn sync_shared_buffers(&mut self, device: &mut dyn GraphicsDevice) -> RenderableResult<()> {
        let vertex_count = self.vertex_count;
        let bounding_box = self.vertices.read(|v| {
            check_vertex_data(v, 3, vertex_count).map(|()| BoundingBox::from_flat(v))
        })??;
        self.colours.read(|c| check_vertex_data(c, 3, vertex_count))??;
        self.base.set_bounding_box(bounding_box);

        if let Some(gpu) = &self.gpu {
            self.vertices.read(|v| gpu.position.update(device, v))?;
            self.colours.read(|c| gpu.colour.update(device, c))?;
        }
        Ok(())
    }

    fn allocate(
        &self,
        pending: &mut PendingAllocation,
        device: &mut dyn GraphicsDevice,
        resources: &mut ResourceManager,
    ) -> RenderableResult<PerVertexColourGpu> {
        let config = resources.config().shaders.per_vertex_colour.clone();
        let program = pending.program(device, resources, &config)?;
        let position = self
            .vertices
            .read(|v| pending.stream(device, program, bindings::VERTEX_POSITION, v, 3))??;
        let colour = self
            .colours
            .read(|c| pending.stream(device, program, bindings::VERTEX_COLOUR, c, 3))??;
        Ok(PerVertexColourGpu {
            program,
            mvp: device.uniform_location(program, bindings::MVP),
            position,
            colour,
        })
    }
}

crate::impl_renderable_component!(PerVertexColourMesh);

impl Renderable for PerVertexColourMesh {
    fn base(&self) -> &RenderableBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut RenderableBase {
        &mut self.base
    }

    fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    fn vertex_attributes(&self) -> VertexAttributes {
        VertexAttributes::POSITION | VertexAttributes::COLOUR
    }

    fn load_cpu_data(&mut self, _resources: &ResourceManager) -> RenderableResult<()> {
        let bounding_box = self.vertices.read(BoundingBox::from_flat)?;
        self.base.set_bounding_box(bounding_box);
        Ok(())
    }

    fn create_gpu_resources(
        &mut self,
        device: &mut dyn GraphicsDevice,
        resources: &mut ResourceManager,
    ) -> RenderableResult<()> {
        let mut pending = PendingAllocation::default();
        let result = self.allocate(&mut pending, device, resources);
        self.gpu = Some(pending.finish(device, result)?);
        Ok(())
    }

    fn draw(&self, device: &mut dyn GraphicsDevice, camera: &CameraMatrices, model: &Mat4) {
        let Some(gpu) = &self.gpu else {
            return;
        };
        device.use_program(Some(gpu.program));
        if let Some(mvp) = gpu.mvp {
            device.set_uniform_mat4(mvp, &camera.mvp(model));
        }
        draw_streams(device, &[gpu.position, gpu.colour], self.primitive(), self.vertex_count);
    }

    fn release_gpu_resources(&mut self, device: &mut dyn GraphicsDevice) {
        if let Some(gpu) = self.gpu.take() {
            device.delete_buffer(gpu.position.buffer);
            device.delete_buffer(gpu.colour.buffer);
            device.delete_program(gpu.program);
        }
    }
}
