//! Single-colour mesh drawn directly in clip space
//!
//! Positions bypass the model/view/projection chain: they are already
//! clip-space coordinates, so the mesh stays fixed in front of the camera
//! wherever its owner is placed. Back-face culling is disabled for the draw so
//! both windings are visible.

use super::{
    bindings, check_vertex_data, draw_streams, CameraMatrices, PendingAllocation, Renderable,
    RenderableBase, VertexAttributes, VertexStream,
};
use crate::bounds::BoundingBox;
use crate::error::RenderableResult;
use crate::foundation::math::Mat4;
use crate::gpu::{GraphicsDevice, ProgramHandle};
use crate::resources::ResourceManager;

#[derive(Debug)]
struct SingleColourGpu {
    program: ProgramHandle,
    position: VertexStream,
}

/// Mesh filled with one fixed colour, in clip space
#[derive(Debug)]
pub struct SingleColourMesh {
    base: RenderableBase,
    vertices: Vec<f32>,
    vertex_count: usize,
    gpu: Option<SingleColourGpu>,
}

impl SingleColourMesh {
    /// Create from flat `x, y, z` triples
    pub fn new(vertices: Vec<f32>) -> RenderableResult<Self> {
        let vertex_count = vertices.len() / 3;
        check_vertex_data(&vertices, 3, vertex_count)?;
        Ok(Self {
            base: RenderableBase::new(),
            vertices,
            vertex_count,
            gpu: None,
        })
    }

    /// Current CPU-side positions
    pub fn vertices(&self) -> &[f32] {
        &self.vertices
    }

    /// Replace every position. The vertex count cannot change. When GPU
    /// resources exist the buffer is re-uploaded for frequent updates.
    pub fn set_vertices(&mut self, device: &mut dyn GraphicsDevice, vertices: &[f32]) -> RenderableResult<()> {
        check_vertex_data(vertices, 3, self.vertex_count)?;
        self.vertices.copy_from_slice(vertices);
        self.base.set_bounding_box(BoundingBox::from_flat(&self.vertices));
        if let Some(gpu) = &self.gpu {
            gpu.position.update(device, &self.vertices);
        }
        Ok(())
    }

    fn allocate(
        &self,
        pending: &mut PendingAllocation,
        device: &mut dyn GraphicsDevice,
        resources: &mut ResourceManager,
    ) -> RenderableResult<SingleColourGpu> {
        let config = resources.config().shaders.single_colour.clone();
        let program = pending.program(device, resources, &config)?;
        let position = pending.stream(device, program, bindings::VERTEX_POSITION, &self.vertices, 3)?;
        Ok(SingleColourGpu { program, position })
    }
}

crate::impl_renderable_component!(SingleColourMesh);

impl Renderable for SingleColourMesh {
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
        VertexAttributes::POSITION
    }

    fn load_cpu_data(&mut self, _resources: &ResourceManager) -> RenderableResult<()> {
        self.base.set_bounding_box(BoundingBox::from_flat(&self.vertices));
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

    fn draw(&self, device: &mut dyn GraphicsDevice, _camera: &CameraMatrices, _model: &Mat4) {
        let Some(gpu) = &self.gpu else {
            return;
        };
        device.use_program(Some(gpu.program));
        device.set_face_culling(false);
        draw_streams(device, &[gpu.position], self.primitive(), self.vertex_count);
        device.set_face_culling(true);
    }

    fn release_gpu_resources(&mut self, device: &mut dyn GraphicsDevice) {
        if let Some(gpu) = self.gpu.take() {
            device.delete_buffer(gpu.position.buffer);
            device.delete_program(gpu.program);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::{BufferUsage, HeadlessDevice, Primitive};
    use crate::renderable::LifecycleState;
    use crate::scene::Component;

    const TRIANGLE: [f32; 9] = [-1.0, -1.0, 0.0, 1.0, -1.0, 0.0, 0.0, 1.0, 0.0];

    fn allocated(device: &mut HeadlessDevice) -> SingleColourMesh {
        let mut resources = ResourceManager::default();
        let mut mesh = SingleColourMesh::new(TRIANGLE.to_vec()).unwrap();
        mesh.load_resources_to_main_memory(&resources).unwrap();
        mesh.allocate_gpu_resources(device, &mut resources).unwrap();
        mesh
    }

    #[test]
    fn test_triangle_draws_three_vertices_without_uniforms() {
        let mut device = HeadlessDevice::new();
        let mesh = allocated(&mut device);

        assert!(mesh.render(&mut device, &CameraMatrices::identity(), &Mat4::identity()));

        let calls = device.draw_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].count, 3);
        assert_eq!(calls[0].primitive, Primitive::Triangles);
        assert!(calls[0].uniforms.is_empty());
        assert!(calls[0].textures.is_empty());
        assert!(!calls[0].face_culling);
        assert!(device.face_culling());
        assert_eq!(device.enabled_attribute_count(), 0);
    }

    #[test]
    fn test_bounding_box_is_computed_at_load() {
        let resources = ResourceManager::default();
        let mut mesh = SingleColourMesh::new(vec![0.0, 0.0, 0.0, 0.5, 0.25, -0.5]).unwrap();
        assert_eq!(mesh.local_bounding_box(), BoundingBox::default());

        mesh.load_resources_to_main_memory(&resources).unwrap();
        let bb = mesh.local_bounding_box();
        assert_eq!((bb.xmin, bb.xmax), (0.0, 0.5));
        assert_eq!((bb.zmin, bb.zmax), (-0.5, 0.0));
    }

    #[test]
    fn test_set_vertices_reuploads_dynamically() {
        let mut device = HeadlessDevice::new();
        let mut mesh = allocated(&mut device);
        let moved: Vec<f32> = TRIANGLE.iter().map(|v| v * 0.5).collect();

        mesh.set_vertices(&mut device, &moved).unwrap();
        mesh.render(&mut device, &CameraMatrices::identity(), &Mat4::identity());

        let buffer = device.draw_calls()[0].attributes[bindings::VERTEX_POSITION];
        assert_eq!(device.buffer_floats(buffer).unwrap(), moved);
        assert_eq!(device.buffer_usage(buffer), Some(BufferUsage::Dynamic));
        assert!((mesh.local_bounding_box().xmax - 0.5).abs() < f32::EPSILON);

        assert!(mesh.set_vertices(&mut device, &moved[..6]).is_err());
        assert_eq!(mesh.vertices(), moved.as_slice());
    }

    #[test]
    fn test_primitive_and_enable_flag() {
        let mut device = HeadlessDevice::new();
        let mut mesh = allocated(&mut device);

        assert_eq!(mesh.set_primitive(Primitive::Points), Primitive::Triangles);
        mesh.set_enabled(false);
        assert!(!mesh.render(&mut device, &CameraMatrices::identity(), &Mat4::identity()));
        assert!(device.draw_calls().is_empty());

        mesh.set_enabled(true);
        assert!(mesh.render(&mut device, &CameraMatrices::identity(), &Mat4::identity()));
        assert_eq!(device.draw_calls()[0].primitive, Primitive::Points);
    }

    #[test]
    fn test_release_frees_everything_once() {
        let mut device = HeadlessDevice::new();
        let mut mesh = allocated(&mut device);
        assert_eq!(device.live_buffers(), 1);

        mesh.unallocate_all_resources(&mut device).unwrap();
        assert_eq!(mesh.lifecycle_state(), LifecycleState::Released);
        assert_eq!(device.live_buffers(), 0);
        assert_eq!(device.live_programs(), 0);
        assert!(mesh.unallocate_all_resources(&mut device).is_err());
    }

    #[test]
    fn test_malformed_input_is_rejected() {
        assert!(SingleColourMesh::new(vec![0.0; 4]).is_err());
    }
}
