//! Textured OBJ mesh shaded by a single directional light
//!
//! The vertex stage moves normals into world space with the model matrix; the
//! fragment stage adds a small ambient term to the Lambert diffuse term.

use super::textured::{check_mesh, load_mesh, TexturedGpu};
use super::{
    bindings, CameraMatrices, PendingAllocation, Renderable, RenderableBase, TextureSource,
    VertexAttributes,
};
use crate::config::LightingConfig;
use crate::error::RenderableResult;
use crate::foundation::math::{Mat4, Vec3};
use crate::gpu::{GraphicsDevice, UniformLocation};
use crate::resources::{MeshData, ResourceManager};

#[derive(Debug)]
struct DirectionalLightGpu {
    textured: TexturedGpu,
    model: Option<UniformLocation>,
    light_direction: Option<UniformLocation>,
    light_colour: Option<UniformLocation>,
}

/// OBJ geometry lit by a directional light
#[derive(Debug)]
pub struct DirectionalLightObjMesh {
    base: RenderableBase,
    model: String,
    texture: TextureSource,
    mesh: MeshData,
    light_direction: Vec3,
    light_colour: Vec3,
    gpu: Option<DirectionalLightGpu>,
}

impl DirectionalLightObjMesh {
    /// Mesh read from `model`, lit along +X by white light
    pub fn new(model: impl Into<String>, texture: impl Into<TextureSource>) -> Self {
        Self {
            base: RenderableBase::new(),
            model: model.into(),
            texture: texture.into(),
            mesh: MeshData::default(),
            light_direction: Vec3::new(1.0, 0.0, 0.0),
            light_colour: Vec3::new(1.0, 1.0, 1.0),
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

    /// Replace direction and colour
    #[must_use]
    pub fn with_light(mut self, direction: Vec3, colour: Vec3) -> Self {
        self.configure_directional_light(direction, colour);
        self
    }

    /// Take direction and colour from configuration
    #[must_use]
    pub fn with_lighting_config(self, lighting: &LightingConfig) -> Self {
        self.with_light(Vec3::from(lighting.light_direction), Vec3::from(lighting.light_colour))
    }

    /// Change the light; takes effect on the next render
    pub fn configure_directional_light(&mut self, direction: Vec3, colour: Vec3) {
        self.light_direction = direction;
        self.light_colour = colour;
    }

    /// World-space light direction
    pub fn light_direction(&self) -> Vec3 {
        self.light_direction
    }

    /// Light colour
    pub fn light_colour(&self) -> Vec3 {
        self.light_colour
    }
}

crate::impl_renderable_component!(DirectionalLightObjMesh);

impl Renderable for DirectionalLightObjMesh {
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
        VertexAttributes::POSITION | VertexAttributes::UV | VertexAttributes::NORMAL
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
        let config = resources.config().shaders.directional_light.clone();
        let mut pending = PendingAllocation::default();
        let attributes = self.vertex_attributes();
        let result = TexturedGpu::allocate(&mut pending, device, resources, &config, &self.texture, &self.mesh, attributes);
        let textured = pending.finish(device, result)?;

        let program = textured.program;
        self.gpu = Some(DirectionalLightGpu {
            model: device.uniform_location(program, bindings::MODEL),
            light_direction: device.uniform_location(program, bindings::LIGHT_DIRECTION_WORLD),
            light_colour: device.uniform_location(program, bindings::LIGHT_COLOUR),
            textured,
        });
        Ok(())
    }

    fn draw(&self, device: &mut dyn GraphicsDevice, camera: &CameraMatrices, model: &Mat4) {
        let Some(gpu) = &self.gpu else {
            return;
        };
        gpu.textured.bind(device, camera, model);
        if let Some(location) = gpu.model {
            device.set_uniform_mat4(location, model);
        }
        if let Some(location) = gpu.light_direction {
            device.set_uniform_vec3(location, &self.light_direction);
        }
        if let Some(location) = gpu.light_colour {
            device.set_uniform_vec3(location, &self.light_colour);
        }
        gpu.textured.draw(device, self.primitive(), self.vertex_count());
    }

    fn release_gpu_resources(&mut self, device: &mut dyn GraphicsDevice) {
        if let Some(gpu) = self.gpu.take() {
            gpu.textured.release(device);
        }
    }
}
