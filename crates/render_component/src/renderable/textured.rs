//! GPU state shared by the textured variants

use super::{bindings, draw_streams, BoundTexture, PendingAllocation, TextureSource, VertexAttributes, VertexStream};
use crate::bounds::BoundingBox;
use crate::config::ShaderProgramConfig;
use crate::error::{RenderableError, RenderableResult};
use crate::foundation::math::Mat4;
use crate::gpu::{GraphicsDevice, Primitive, ProgramHandle, UniformLocation};
use crate::renderable::CameraMatrices;
use crate::resources::{MeshData, ResourceManager};

/// Program, texture and vertex streams of a textured mesh
#[derive(Debug)]
pub(crate) struct TexturedGpu {
    pub program: ProgramHandle,
    mvp: Option<UniformLocation>,
    sampler: Option<UniformLocation>,
    texture: BoundTexture,
    streams: Vec<VertexStream>,
}

impl TexturedGpu {
    /// Texture first, so an unsupported file name fails before anything else
    /// is created. One stream is uploaded per flag in `attributes`.
    pub fn allocate(
        pending: &mut PendingAllocation,
        device: &mut dyn GraphicsDevice,
        resources: &mut ResourceManager,
        config: &ShaderProgramConfig,
        texture: &TextureSource,
        mesh: &MeshData,
        attributes: VertexAttributes,
    ) -> RenderableResult<Self> {
        let texture = pending.texture(device, resources, texture)?;
        let program = pending.program(device, resources, config)?;

        let inputs: [(VertexAttributes, &str, &[f32], u32); 3] = [
            (VertexAttributes::POSITION, bindings::VERTEX_POSITION, bytemuck::cast_slice(&mesh.positions), 3),
            (VertexAttributes::UV, bindings::VERTEX_UV, bytemuck::cast_slice(&mesh.uvs), 2),
            (VertexAttributes::NORMAL, bindings::VERTEX_NORMAL, bytemuck::cast_slice(&mesh.normals), 3),
        ];
        let mut streams = Vec::with_capacity(inputs.len());
        for (flag, name, data, components) in inputs {
            if attributes.contains(flag) {
                streams.push(pending.stream(device, program, name, data, components)?);
            }
        }

        Ok(Self {
            program,
            mvp: device.uniform_location(program, bindings::MVP),
            sampler: device.uniform_location(program, bindings::TEXTURE_SAMPLER),
            texture,
            streams,
        })
    }

    /// Bind the program, upload the MVP and bind the texture to unit 0
    pub fn bind(&self, device: &mut dyn GraphicsDevice, camera: &CameraMatrices, model: &Mat4) {
        device.use_program(Some(self.program));
        if let Some(mvp) = self.mvp {
            device.set_uniform_mat4(mvp, &camera.mvp(model));
        }
        self.texture.bind(device, self.sampler);
    }

    pub fn draw(&self, device: &mut dyn GraphicsDevice, primitive: Primitive, vertex_count: usize) {
        draw_streams(device, &self.streams, primitive, vertex_count);
    }

    pub fn release(self, device: &mut dyn GraphicsDevice) {
        for stream in &self.streams {
            device.delete_buffer(stream.buffer);
        }
        device.delete_program(self.program);
        self.texture.release(device);
    }
}

/// Fill `mesh` from `model` (unless empty) and return its bounding box
pub(crate) fn load_mesh(resources: &ResourceManager, model: &str, mesh: &mut MeshData) -> RenderableResult<BoundingBox> {
    if !model.is_empty() {
        *mesh = resources.load_geometry_file(model)?;
        log::debug!("Loaded {} vertices from {}", mesh.vertex_count(), model);
    }
    check_mesh(mesh)?;
    Ok(BoundingBox::from_positions(&mesh.positions))
}

/// Every stream must hold one entry per position
pub(crate) fn check_mesh(mesh: &MeshData) -> RenderableResult<()> {
    let expected = mesh.vertex_count();
    for actual in [mesh.uvs.len(), mesh.normals.len()] {
        if actual != expected {
            return Err(RenderableError::VertexCountMismatch { expected, actual });
        }
    }
    Ok(())
}
