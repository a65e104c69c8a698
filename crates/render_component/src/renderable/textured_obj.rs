//! Unlit textured mesh loaded from an OBJ file

use super::textured::{check_mesh, load_mesh, TexturedGpu};
use super::{CameraMatrices, PendingAllocation, Renderable, RenderableBase, TextureSource, VertexAttributes};
use crate::error::RenderableResult;
use crate::foundation::math::Mat4;
use crate::gpu::GraphicsDevice;
use crate::resources::{MeshData, ResourceManager};

/// OBJ geometry with a texture and no lighting
#[derive(Debug)]
pub struct TexturedObjMesh {
    base: RenderableBase,
    model: String,
    texture: TextureSource,
    mesh: MeshData,
    gpu: Option<TexturedGpu>,
}

impl TexturedObjMesh {
    /// Mesh read from `model` when loaded to main memory
    pub fn new(model: impl Into<String>, texture: impl Into<TextureSource>) -> Self {
        Self {
            base: RenderableBase::new(),
            model: model.into(),
            texture: texture.into(),
            mesh: MeshData::default(),
            gpu: None,
        }
    }

    /// Mesh built from geometry already in memory
    pub fn from_mesh(mesh: MeshData, texture: impl Into<TextureSource>) -> RenderableResult<Self> {
        check_mesh(&mesh)?;
        Ok(Self {
            mesh,
            ..Self::new(String::new(), texture)
        })
    }

    /// CPU-side geometry
    pub fn mesh(&self) -> &MeshData {
        &self.mesh
    }
}

crate::impl_renderable_component!(TexturedObjMesh);

impl Renderable for TexturedObjMesh {
    fn base(&self) -> &RenderableBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut RenderableBase {
        &mut self.base
    }

    fn vertex_count(&self) -> usize {
        self.mesh.vertex_count()
    }

    fn vertex_attributes(&self) -> VertexAttributes {
        VertexAttributes::POSITION | VertexAttributes::UV
    }

    fn load_cpu_data(&mut self, resources: &ResourceManager) -> RenderableResult<()> {
        let bounding_box = load_mesh(resources, &self.model, &mut self.mesh)?;
        self.base.set_bounding_box(bounding_box);
        Ok(())
    }

    fn create_gpu_resources(
        &mut self,
        device: &mut dyn GraphicsDevice,
        resources: &mut ResourceManager,
    ) -> RenderableResult<()> {
        let config = resources.config().shaders.textured.clone();
        let mut pending = PendingAllocation::default();
        let attributes = self.vertex_attributes();
        let result = TexturedGpu::allocate(&mut pending, device, resources, &config, &self.texture, &self.mesh, attributes);
        self.gpu = Some(pending.finish(device, result)?);
        Ok(())
    }

    fn draw(&self, device: &mut dyn GraphicsDevice, camera: &CameraMatrices, model: &Mat4) {
        if let Some(gpu) = &self.gpu {
            gpu.bind(device, camera, model);
            gpu.draw(device, self.primitive(), self.vertex_count());
        }
    }

    fn release_gpu_resources(&mut self, device: &mut dyn GraphicsDevice) {
        if let Some(gpu) = self.gpu.take() {
            gpu.release(device);
        }
    }
}
