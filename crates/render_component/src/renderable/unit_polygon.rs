//! Textured unit square on the XY plane, facing +Z
//!
//! Spans [-0.5, 0.5] in X and Y. Size and placement come from the owner's
//! transform. Both faces are drawn.

use super::textured::TexturedGpu;
use super::{CameraMatrices, PendingAllocation, Renderable, RenderableBase, TextureSource, VertexAttributes};
use crate::bounds::BoundingBox;
use crate::error::RenderableResult;
use crate::foundation::math::{Mat4, Vec3};
use crate::gpu::GraphicsDevice;
use crate::resources::{MeshData, ResourceManager};

/// Texture used when none is named
pub const DEFAULT_TEXTURE: &str = "uvtemplate.bmp";

const POSITIONS: [[f32; 3]; 6] = [
    [-0.5, 0.5, 0.0],
    [-0.5, -0.5, 0.0],
    [0.5, -0.5, 0.0],
    [0.5, 0.5, 0.0],
    [-0.5, 0.5, 0.0],
    [0.5, -0.5, 0.0],
];

const UVS: [[f32; 2]; 6] = [[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0], [1.0, 1.0]];

/// Two triangles with a texture applied
#[derive(Debug)]
pub struct UnitPolygonTextured {
    base: RenderableBase,
    texture: TextureSource,
    mesh: MeshData,
    gpu: Option<TexturedGpu>,
}

impl Default for UnitPolygonTextured {
    fn default() -> Self {
        Self::new(DEFAULT_TEXTURE)
    }
}

impl UnitPolygonTextured {
    /// Polygon sampling `texture`: a `.bmp`/`.dds` file name or a caller-owned handle
    pub fn new(texture: impl Into<TextureSource>) -> Self {
        // Thin in Z so the box still has volume
        let bounding_box = BoundingBox::new(Vec3::new(-0.5, -0.5, -0.01), Vec3::new(0.5, 0.5, 0.01));
        Self {
            base: RenderableBase::new().with_bounding_box(bounding_box),
            texture: texture.into(),
            mesh: MeshData {
                positions: POSITIONS.to_vec(),
                uvs: UVS.to_vec(),
                normals: vec![[0.0, 0.0, 1.0]; POSITIONS.len()],
            },
            gpu: None,
        }
    }

    /// Texture this polygon samples from
    pub fn texture(&self) -> &TextureSource {
        &self.texture
    }
}

crate::impl_renderable_component!(UnitPolygonTextured);

impl Renderable for UnitPolygonTextured {
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

    fn load_cpu_data(&mut self, _resources: &ResourceManager) -> RenderableResult<()> {
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
        let Some(gpu) = &self.gpu else {
            return;
        };
        gpu.bind(device, camera, model);
        device.set_face_culling(false);
        gpu.draw(device, self.primitive(), self.vertex_count());
        device.set_face_culling(true);
    }

    fn release_gpu_resources(&mut self, device: &mut dyn GraphicsDevice) {
        if let Some(gpu) = self.gpu.take() {
            gpu.release(device);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::HeadlessDevice;
    use crate::renderable::{bindings, LifecycleState};

    #[test]
    fn test_bounding_box_is_constant() {
        let resources = ResourceManager::default();
        let mut polygon = UnitPolygonTextured::default();
        let before = polygon.local_bounding_box();
        polygon.load_resources_to_main_memory(&resources).unwrap();

        assert_eq!(polygon.local_bounding_box(), before);
        assert_eq!((before.xmin, before.ymax), (-0.5, 0.5));
        assert_eq!((before.zmin, before.zmax), (-0.01, 0.01));
        assert_eq!(polygon.texture(), &TextureSource::File(DEFAULT_TEXTURE.to_string()));
    }

    #[test]
    fn test_external_texture_is_bound_and_kept() {
        let mut device = HeadlessDevice::new();
        let mut resources = ResourceManager::default();
        let texture = device.create_texture_rgba8(2, 2, &[128; 16]).unwrap();

        let mut polygon = UnitPolygonTextured::new(texture);
        polygon.load_resources_to_main_memory(&resources).unwrap();
        polygon.allocate_gpu_resources(&mut device, &mut resources).unwrap();
        assert!(polygon.render(&mut device, &CameraMatrices::identity(), &Mat4::identity()));

        let call = &device.draw_calls()[0];
        assert_eq!(call.count, 6);
        assert_eq!(call.textures.get(&bindings::TEXTURE_UNIT), Some(&texture));
        assert!(!call.face_culling);
        assert!(call.uniforms.contains_key(bindings::MVP));
        assert!(!call.attributes.contains_key(bindings::VERTEX_NORMAL));

        polygon.unallocate_all_resources(&mut device).unwrap();
        assert!(device.is_texture_live(texture));
        assert_eq!(device.live_buffers(), 0);
    }

    #[test]
    fn test_empty_name_loads_nothing() {
        let mut device = HeadlessDevice::new();
        let mut resources = ResourceManager::default();
        let mut polygon = UnitPolygonTextured::new("");
        polygon.load_resources_to_main_memory(&resources).unwrap();
        polygon.allocate_gpu_resources(&mut device, &mut resources).unwrap();

        assert_eq!(polygon.lifecycle_state(), LifecycleState::GpuAllocated);
        assert_eq!(device.live_textures(), 0);
    }
}
