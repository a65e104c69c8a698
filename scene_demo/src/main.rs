//! Scene demo
//!
//! Builds a small scene holding every renderable variant, drives it through
//! the full lifecycle on the in-memory device and renders a few frames,
//! logging what was drawn.
//!
//! Usage: `scene_demo [config.toml|config.ron]`

use render_component::config::{Config, ConfigError, RenderComponentConfig};
use render_component::foundation::logging;
use render_component::foundation::math::{Quat, Vec3};
use render_component::prelude::*;
use render_component::renderable::SharedVertexBuffer;
use render_component::resources::{ImageData, TextureError};
use render_component::scene::SceneElement;
use std::sync::{Arc, RwLock};
use thiserror::Error;

const FRAMES: u32 = 3;

#[derive(Error, Debug)]
enum DemoError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Renderable error: {0}")]
    Renderable(#[from] RenderableError),
    #[error("Texture error: {0}")]
    Texture(#[from] TextureError),
    #[error("{stage} failed for {count} renderable(s)")]
    Lifecycle { stage: &'static str, count: usize },
    #[error("GPU resources leaked: {programs} program(s), {buffers} buffer(s), {textures} texture(s)")]
    Leak {
        programs: usize,
        buffers: usize,
        textures: usize,
    },
}

const GRADIENT_KEY: u32 = 1;
const SPINNER_KEY: u32 = 3;

struct Demo {
    device: HeadlessDevice,
    resources: ResourceManager,
    root: SceneNode,
    shared_vertices: SharedVertexBuffer,
    camera: CameraMatrices,
    external_texture: render_component::gpu::TextureHandle,
}

impl Demo {
    fn new(config: RenderComponentConfig) -> Result<Self, DemoError> {
        let mut device = HeadlessDevice::new();
        let lighting = config.lighting.clone();
        let resources = ResourceManager::new(config);

        // The demo owns this texture; the polygon using it only borrows it
        let external_texture = ImageData::solid_color(4, 4, [200, 180, 40, 255]).upload(&mut device)?;

        let triangle = vec![-1.0, -1.0, 0.0, 1.0, -1.0, 0.0, 0.0, 1.0, 0.0];
        let shared_vertices: SharedVertexBuffer = Arc::new(RwLock::new(triangle.clone()));
        let shared_colours: SharedVertexBuffer =
            Arc::new(RwLock::new(vec![1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]));

        let quad = quad_mesh();

        let mut root = SceneNode::new("root");
        root.add_child(0, VirtualObject::new("overlay").with_component(SingleColourMesh::new(triangle)?));
        root.add_child(
            GRADIENT_KEY,
            VirtualObject::new("gradient")
                .with_transform(Transform::from_position(Vec3::new(-2.0, 0.0, 0.0)))
                .with_component(PerVertexColourMesh::with_shared_buffers(
                    Arc::clone(&shared_vertices),
                    shared_colours,
                )?),
        );
        root.add_child(
            2,
            SceneNode::new("lit")
                .with_transform(Transform::from_position(Vec3::new(0.0, 0.0, -2.0)))
                .with_child(
                    VirtualObject::new("sun-lit").with_component(
                        DirectionalLightObjMesh::from_mesh(quad.clone(), "")?.with_lighting_config(&lighting),
                    ),
                )
                .with_child(
                    VirtualObject::new("lamp-lit")
                        .with_transform(Transform::from_position(Vec3::new(2.0, 0.0, 0.0)))
                        .with_component(
                            PhongShadingObjMesh::from_vectors(
                                quad.positions.clone(),
                                quad.uvs.clone(),
                                quad.normals.clone(),
                                "",
                            )?
                            .with_lighting_config(&lighting),
                        ),
                ),
        );
        root.add_child(
            SPINNER_KEY,
            VirtualObject::new("spinner")
                .with_transform(Transform::from_position(Vec3::new(0.0, 2.0, 0.0)))
                .with_component(UnitPolygonTextured::new(external_texture)),
        );
        root.add_child(
            4,
            VirtualObject::new("plain").with_component(TexturedObjMesh::from_mesh(quad, external_texture)?),
        );

        let camera = CameraMatrices::new(
            Mat4::perspective(45.0_f32.to_radians(), 800.0 / 600.0, 0.1, 100.0),
            Mat4::look_at(Vec3::new(4.0, 3.0, 3.0), Vec3::zeros(), Vec3::y()),
        );

        Ok(Self {
            device,
            resources,
            root,
            shared_vertices,
            camera,
            external_texture,
        })
    }

    fn initialize(&mut self) -> Result<(), DemoError> {
        let loaded = load_scene(&mut self.root, &self.resources);
        if !loaded.is_ok() {
            return Err(DemoError::Lifecycle {
                stage: "load",
                count: loaded.failed.len(),
            });
        }
        let allocated = allocate_scene(&mut self.root, &mut self.device, &mut self.resources);
        if !allocated.is_ok() {
            return Err(DemoError::Lifecycle {
                stage: "allocate",
                count: allocated.failed.len(),
            });
        }
        log::info!(
            "Scene allocated: {} program(s), {} buffer(s), {} texture(s)",
            self.device.live_programs(),
            self.device.live_buffers(),
            self.device.live_textures()
        );
        Ok(())
    }

    fn update(&mut self, frame: u32) -> Result<(), DemoError> {
        let angle = frame as f32 * 0.5;
        if let Some(SceneElement::Object(spinner)) = self.root.child_mut(SPINNER_KEY) {
            spinner.transform.rotation = Quat::from_axis_angle(&Vec3::y_axis(), angle);
        }

        // Another owner edits the shared vertices; the mesh pulls them in
        if let Ok(mut vertices) = self.shared_vertices.write() {
            vertices[7] = 1.0 + 0.25 * frame as f32;
        }
        if let Some(SceneElement::Object(gradient)) = self.root.child_mut(GRADIENT_KEY) {
            if let Some(mesh) = gradient.get_component_mut::<PerVertexColourMesh>() {
                mesh.sync_shared_buffers(&mut self.device)?;
            }
        }
        Ok(())
    }

    fn render(&mut self, frame: u32) {
        self.device.clear_draw_calls();
        RenderVisitor::with_camera(&mut self.device, self.camera).render_scene(&self.root);

        let vertices: u32 = self.device.draw_calls().iter().map(|call| call.count).sum();
        log::info!(
            "Frame {}: {} draw call(s), {} vertices",
            frame,
            self.device.draw_calls().len(),
            vertices
        );
        for call in self.device.draw_calls() {
            log::debug!(
                "  {:?} x{} uniforms={:?} textures={}",
                call.primitive,
                call.count,
                call.uniforms.keys().collect::<Vec<_>>(),
                call.textures.len()
            );
        }
    }

    fn pick(&self) {
        let mut bounds = BoundsVisitor::new();
        bounds.collect(&self.root);
        if let Some(scene) = bounds.scene_bounds() {
            log::info!("Scene bounds: {:?} .. {:?}", scene.min(), scene.max());
        }
        match bounds.pick(Vec3::new(0.0, 2.0, 10.0), Vec3::new(0.0, 0.0, -1.0)) {
            Some(hit) => log::info!("Ray hit '{}' at distance {:.2}", hit.object, hit.distance),
            None => log::info!("Ray hit nothing"),
        }
    }

    fn cleanup(mut self) -> Result<(), DemoError> {
        release_scene(&mut self.root, &mut self.device);
        self.device.delete_texture(self.external_texture);

        let (programs, buffers, textures) = (
            self.device.live_programs(),
            self.device.live_buffers(),
            self.device.live_textures(),
        );
        if programs + buffers + textures > 0 {
            return Err(DemoError::Leak {
                programs,
                buffers,
                textures,
            });
        }
        log::info!("All GPU resources released");
        Ok(())
    }
}

fn quad_mesh() -> MeshData {
    let positions = [
        [-0.5, -0.5, 0.0],
        [0.5, -0.5, 0.0],
        [0.5, 0.5, 0.0],
        [-0.5, -0.5, 0.0],
        [0.5, 0.5, 0.0],
        [-0.5, 0.5, 0.0],
    ];
    let uvs = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
    MeshData {
        positions: positions.to_vec(),
        uvs: uvs.to_vec(),
        normals: vec![[0.0, 0.0, 1.0]; positions.len()],
    }
}

fn load_config() -> Result<RenderComponentConfig, DemoError> {
    let config = match std::env::args().nth(1) {
        Some(path) => RenderComponentConfig::load_from_file(&path)?,
        None => RenderComponentConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    logging::init_with_level(&config.logging.level);

    log::info!("Starting scene demo");
    let mut demo = Demo::new(config)?;
    demo.initialize()?;

    for frame in 0..FRAMES {
        demo.update(frame)?;
        demo.render(frame);
    }
    demo.pick();

    demo.cleanup()?;
    log::info!("Scene demo finished");
    Ok(())
}
