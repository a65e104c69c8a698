//! Textured OBJ mesh with Phong shading from a point light
//!
//! Light falls off with the squared distance between the light and the
//! fragment. Material coefficients scale the ambient, diffuse and specular
//! terms; shininess is the specular exponent.

use super::textured::{check_mesh, load_mesh, TexturedGpu};
use super::{
    bindings, CameraMatrices, PendingAllocation, Renderable, RenderableBase, TextureSource,
    VertexAttributes,
};
use crate::config::LightingConfig;
use crate::error::{RenderableError, RenderableResult};
use crate::foundation::math::{Mat4, Vec3};
use crate::gpu::{GraphicsDevice, UniformLocation};
use crate::resources::{MeshData, ResourceManager};

/// Point light in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    /// World-space position
    pub position: Vec3,
    /// RGB colour
    pub colour: Vec3,
    /// Power before distance attenuation
    pub power: f32,
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            position: Vec3::new(4.0, 4.0, 4.0),
            colour: Vec3::new(1.0, 1.0, 1.0),
            power: 75.0,
        }
    }
}

impl PointLight {
    /// Point light described by a lighting configuration
    pub fn from_config(lighting: &LightingConfig) -> Self {
        Self {
            position: Vec3::from(lighting.light_position),
            colour: Vec3::from(lighting.light_colour),
            power: lighting.light_power,
        }
    }
}

/// Phong material coefficients
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhongMaterial {
    /// Ambient coefficient (Ka)
    pub ambient: Vec3,
    /// Diffuse coefficient (Kd)
    pub diffuse: Vec3,
    /// Specular coefficient (Ks)
    pub specular: Vec3,
    /// Specular exponent (Ns)
    pub shininess: f32,
}

impl Default for PhongMaterial {
    fn default() -> Self {
        Self {
            ambient: Vec3::repeat(0.1),
            diffuse: Vec3::repeat(1.0),
            specular: Vec3::repeat(0.3),
            shininess: 5.0,
        }
    }
}

impl PhongMaterial {
    /// Grey material from `[ka, kd, ks, ns]` in a lighting configuration
    pub fn from_config(lighting: &LightingConfig) -> Self {
        let [ka, kd, ks, ns] = lighting.material;
        Self {
            ambient: Vec3::repeat(ka),
            diffuse: Vec3::repeat(kd),
            specular: Vec3::repeat(ks),
            shininess: ns,
        }
    }
}

#[derive(Debug, Default)]
struct PhongUniforms {
    model: Option<UniformLocation>,
    view: Option<UniformLocation>,
    light_position: Option<UniformLocation>,
    light_colour: Option<UniformLocation>,
    light_power: Option<UniformLocation>,
    ambient: Option<UniformLocation>,
    diffuse: Option<UniformLocation>,
    specular: Option<UniformLocation>,
    shininess: Option<UniformLocation>,
}

#[derive(Debug)]
struct PhongGpu {
    textured: TexturedGpu,
    uniforms: PhongUniforms,
}

/// OBJ geometry lit by a point light with a Phong material
#[derive(Debug)]
pub struct PhongShadingObjMesh {
    base: RenderableBase,
    model: String,
    texture: TextureSource,
    mesh: MeshData,
    light: PointLight,
    material: PhongMaterial,
    gpu: Option<PhongGpu>,
}

impl PhongShadingObjMesh {
    /// Mesh read from `model` when loaded to main memory
    pub fn from_file(model: impl Into<String>, texture: impl Into<TextureSource>) -> Self {
        Self {
            base: RenderableBase::new(),
            model: model.into(),
            texture: texture.into(),
            mesh: MeshData::default(),
            light: PointLight::default(),
            material: PhongMaterial::default(),
            gpu: None,
        }
    }

    /// Mesh from per-vertex vectors; every vector needs one entry per position
    pub fn from_vectors(
        positions: Vec<[f32; 3]>,
        uvs: Vec<[f32; 2]>,
        normals: Vec<[f32; 3]>,
        texture: impl Into<TextureSource>,
    ) -> RenderableResult<Self> {
        let mesh = MeshData { positions, uvs, normals };
        check_mesh(&mesh)?;
        Ok(Self {
            mesh,
            ..Self::from_file(String::new(), texture)
        })
    }

    /// Mesh from flat arrays holding `vertex_count` entries each
    pub fn from_flat(
        vertex_count: usize,
        positions: &[f32],
        uvs: &[f32],
        normals: &[f32],
        texture: impl Into<TextureSource>,
    ) -> RenderableResult<Self> {
        let mesh = MeshData::from_flat(vertex_count, positions, uvs, normals);
        if mesh.vertex_count() != vertex_count {
            return Err(RenderableError::VertexCountMismatch {
                expected: vertex_count,
                actual: mesh.vertex_count(),
            });
        }
        check_mesh(&mesh)?;
        Ok(Self {
            mesh,
            ..Self::from_file(String::new(), texture)
        })
    }

    /// Replace the light
    #[must_use]
    pub fn with_light(mut self, light: PointLight) -> Self {
        self.light = light;
        self
    }

    /// Replace the material
    #[must_use]
    pub fn with_material(mut self, material: PhongMaterial) -> Self {
        self.material = material;
        self
    }

    /// Take light and material from configuration
    #[must_use]
    pub fn with_lighting_config(self, lighting: &LightingConfig) -> Self {
        self.with_light(PointLight::from_config(lighting))
            .with_material(PhongMaterial::from_config(lighting))
    }

    /// Change the light; takes effect on the next render
    pub fn set_light(&mut self, position: Vec3, colour: Vec3, power: f32) {
        self.light = PointLight { position, colour, power };
    }

    /// Change the material; takes effect on the next render
    pub fn set_material(&mut self, material: PhongMaterial) {
        self.material = material;
    }

    /// Current light
    pub fn light(&self) -> &PointLight {
        &self.light
    }

    /// Current material
    pub fn material(&self) -> &PhongMaterial {
        &self.material
    }
}

crate::impl_renderable_component!(PhongShadingObjMesh);

impl Renderable for PhongShadingObjMesh {
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
        let config = resources.config().shaders.phong.clone();
        let mut pending = PendingAllocation::default();
        let attributes = self.vertex_attributes();
        let result = TexturedGpu::allocate(&mut pending, device, resources, &config, &self.texture, &self.mesh, attributes);
        let textured = pending.finish(device, result)?;

        let program = textured.program;
        let mut uniform = |name: &str| device.uniform_location(program, name);
        let uniforms = PhongUniforms {
            model: uniform(bindings::MODEL),
            view: uniform(bindings::VIEW),
            light_position: uniform(bindings::LIGHT_POSITION_WORLD),
            light_colour: uniform(bindings::LIGHT_COLOUR),
            light_power: uniform(bindings::LIGHT_POWER),
            ambient: uniform(bindings::MATERIAL_AMBIENT),
            diffuse: uniform(bindings::MATERIAL_DIFFUSE),
            specular: uniform(bindings::MATERIAL_SPECULAR),
            shininess: uniform(bindings::MATERIAL_SHININESS),
        };
        self.gpu = Some(PhongGpu { textured, uniforms });
        Ok(())
    }

    fn draw(&self, device: &mut dyn GraphicsDevice, camera: &CameraMatrices, model: &Mat4) {
        let Some(gpu) = &self.gpu else {
            return;
        };
        gpu.textured.bind(device, camera, model);

        let u = &gpu.uniforms;
        let matrices = [(u.model, model), (u.view, &camera.view)];
        for (location, value) in matrices {
            if let Some(location) = location {
                device.set_uniform_mat4(location, value);
            }
        }
        let vectors = [
            (u.light_position, &self.light.position),
            (u.light_colour, &self.light.colour),
            (u.ambient, &self.material.ambient),
            (u.diffuse, &self.material.diffuse),
            (u.specular, &self.material.specular),
        ];
        for (location, value) in vectors {
            if let Some(location) = location {
                device.set_uniform_vec3(location, value);
            }
        }
        for (location, value) in [(u.light_power, self.light.power), (u.shininess, self.material.shininess)] {
            if let Some(location) = location {
                device.set_uniform_f32(location, value);
            }
        }

        gpu.textured.draw(device, self.primitive(), self.vertex_count());
    }

    fn release_gpu_resources(&mut self, device: &mut dyn GraphicsDevice) {
        if let Some(gpu) = self.gpu.take() {
            gpu.textured.release(device);
        }
    }
}
