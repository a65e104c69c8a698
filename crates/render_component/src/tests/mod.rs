//! Whole-scene scenarios exercising lifecycle, traversal and texture routing together

use crate::foundation::math::{Mat4, Mat4Ext, Transform, Vec3};
use crate::gpu::{GraphicsDevice, HeadlessDevice, Primitive, TextureHandle, UniformValue};
use crate::renderable::{
    bindings, CameraMatrices, DirectionalLightObjMesh, LifecycleState, PerVertexColourMesh,
    PhongShadingObjMesh, Renderable, SingleColourMesh, TexturedObjMesh, UnitPolygonTextured,
    VertexAttributes,
};
use crate::resources::{ImageData, MeshData, ResourceManager, TextureError, TextureLoader};
use crate::scene::{allocate_scene, load_scene, release_scene, Component, SceneNode, VirtualObject, RENDERABLE_COMPONENT_TYPE};
use crate::visitor::RenderVisitor;
use approx::assert_relative_eq;
use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

const TRIANGLE: [f32; 9] = [-1.0, -1.0, 0.0, 1.0, -1.0, 0.0, 0.0, 1.0, 0.0];

/// Texture loader recording which route each file took
#[derive(Clone, Default)]
struct RecordingLoader {
    calls: Rc<RefCell<Vec<(&'static str, String)>>>,
}

impl TextureLoader for RecordingLoader {
    fn load_bitmap_texture(&mut self, device: &mut dyn GraphicsDevice, path: &str) -> Result<TextureHandle, TextureError> {
        self.calls.borrow_mut().push(("bitmap", path.to_string()));
        ImageData::solid_color(1, 1, [255, 0, 0, 255]).upload(device)
    }

    fn load_compressed_texture(&mut self, device: &mut dyn GraphicsDevice, path: &str) -> Result<TextureHandle, TextureError> {
        self.calls.borrow_mut().push(("compressed", path.to_string()));
        ImageData::solid_color(1, 1, [0, 0, 255, 255]).upload(device)
    }
}

/// Claims the renderable tag without being renderable
struct Impostor {
    enabled: bool,
}

impl Component for Impostor {
    fn component_type(&self) -> &str {
        RENDERABLE_COMPONENT_TYPE
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

fn quad_mesh() -> MeshData {
    let positions: [f32; 18] = [
        -1.0, -1.0, 0.0, 1.0, -1.0, 0.0, 1.0, 1.0, 0.0, //
        -1.0, -1.0, 0.0, 1.0, 1.0, 0.0, -1.0, 1.0, 0.0,
    ];
    let uvs: [f32; 12] = [0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 1.0];
    let normals = [0.0_f32, 0.0, 1.0].repeat(6);
    MeshData::from_flat(6, &positions, &uvs, &normals)
}

fn lit_quad() -> PhongShadingObjMesh {
    let mesh = quad_mesh();
    PhongShadingObjMesh::from_vectors(mesh.positions, mesh.uvs, mesh.normals, "").unwrap()
}

fn mixed_scene() -> SceneNode {
    let colours = vec![1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];
    let lit = SceneNode::new("lit")
        .with_transform(Transform::from_position(Vec3::new(0.0, 2.0, 0.0)))
        .with_child(
            VirtualObject::new("teapot")
                .with_component(lit_quad()),
        )
        .with_child(VirtualObject::new("card").with_component(UnitPolygonTextured::new("card.bmp")));

    SceneNode::new("root")
        .with_child(VirtualObject::new("hud").with_component(SingleColourMesh::new(TRIANGLE.to_vec()).unwrap()))
        .with_child(
            VirtualObject::new("gradient")
                .with_transform(Transform::from_position(Vec3::new(-3.0, 0.0, 0.0)))
                .with_component(PerVertexColourMesh::new(TRIANGLE.to_vec(), colours).unwrap()),
        )
        .with_child(lit)
}

fn frame(device: &mut HeadlessDevice, root: &SceneNode, camera: CameraMatrices) {
    RenderVisitor::with_camera(device, camera).render_scene(root);
}

#[test]
fn test_full_lifecycle_leaves_no_gpu_resources() {
    let mut device = HeadlessDevice::new();
    let mut resources = ResourceManager::default().with_texture_loader(RecordingLoader::default());
    let mut root = mixed_scene();

    let loaded = load_scene(&mut root, &resources);
    assert_eq!((loaded.succeeded, loaded.failed.len()), (4, 0));
    let allocated = allocate_scene(&mut root, &mut device, &mut resources);
    assert_eq!((allocated.succeeded, allocated.failed.len()), (4, 0));
    assert_eq!(device.live_programs(), 4);
    assert_eq!(device.live_textures(), 1);

    frame(&mut device, &root, CameraMatrices::identity());
    assert_eq!(device.draw_calls().len(), 4);
    assert_eq!(device.enabled_attribute_count(), 0);
    assert!(device.face_culling());

    let released = release_scene(&mut root, &mut device);
    assert_eq!(released.succeeded, 4);
    assert_eq!(device.live_programs(), 0);
    assert_eq!(device.live_buffers(), 0);
    assert_eq!(device.live_textures(), 0);

    device.clear_draw_calls();
    frame(&mut device, &root, CameraMatrices::identity());
    assert!(device.draw_calls().is_empty());
}

#[test]
fn test_render_visits_children_in_key_order() {
    let mut device = HeadlessDevice::new();
    let mut resources = ResourceManager::default();
    let mut root = SceneNode::new("root");
    for (key, x) in [(30, 3.0), (10, 1.0), (20, 2.0)] {
        root.add_child(
            key,
            VirtualObject::new(format!("tri{key}"))
                .with_transform(Transform::from_position(Vec3::new(x, 0.0, 0.0)))
                .with_component(PerVertexColourMesh::new(TRIANGLE.to_vec(), vec![1.0; 9]).unwrap()),
        );
    }
    load_scene(&mut root, &resources);
    allocate_scene(&mut root, &mut device, &mut resources);
    frame(&mut device, &root, CameraMatrices::identity());

    let xs: Vec<f32> = device
        .draw_calls()
        .iter()
        .filter_map(|call| match call.uniforms.get(bindings::MVP) {
            Some(UniformValue::Mat4(m)) => Some(m[(0, 3)]),
            _ => None,
        })
        .collect();
    assert_eq!(xs, [1.0, 2.0, 3.0]);
}

#[test]
fn test_mvp_is_projection_view_world() {
    let mut device = HeadlessDevice::new();
    let mut resources = ResourceManager::default();
    let parent = Transform::from_position(Vec3::new(0.0, 0.0, -5.0));
    let local = Transform::from_position(Vec3::new(1.0, 0.0, 0.0)).with_scale(Vec3::new(2.0, 2.0, 2.0));
    let mut root = SceneNode::new("root").with_child(
        SceneNode::new("group").with_transform(parent.clone()).with_child(
            VirtualObject::new("tri")
                .with_transform(local.clone())
                .with_component(PerVertexColourMesh::new(TRIANGLE.to_vec(), vec![0.5; 9]).unwrap()),
        ),
    );
    load_scene(&mut root, &resources);
    allocate_scene(&mut root, &mut device, &mut resources);

    let projection = Mat4::perspective(45.0_f32.to_radians(), 4.0 / 3.0, 0.1, 100.0);
    let view = Mat4::look_at(Vec3::new(4.0, 3.0, 3.0), Vec3::zeros(), Vec3::y());
    frame(&mut device, &root, CameraMatrices::new(projection, view));

    let expected = projection * view * parent.to_matrix() * local.to_matrix();
    match device.draw_calls()[0].uniforms.get(bindings::MVP) {
        Some(UniformValue::Mat4(mvp)) => assert_relative_eq!(*mvp, expected, epsilon = 1e-4),
        other => panic!("mvp not set: {other:?}"),
    }
}

#[test]
fn test_disabled_and_impostor_components_are_skipped() {
    let mut device = HeadlessDevice::new();
    let mut resources = ResourceManager::default();
    let mut hidden = SingleColourMesh::new(TRIANGLE.to_vec()).unwrap();
    hidden.set_enabled(false);
    let mut root = SceneNode::new("root").with_child(
        VirtualObject::new("mixed")
            .with_component(Impostor { enabled: true })
            .with_component(hidden)
            .with_component(SingleColourMesh::new(TRIANGLE.to_vec()).unwrap()),
    );

    let loaded = load_scene(&mut root, &resources);
    assert_eq!(loaded.succeeded, 2);
    let allocated = allocate_scene(&mut root, &mut device, &mut resources);
    assert_eq!(allocated.succeeded, 1);

    frame(&mut device, &root, CameraMatrices::identity());
    assert_eq!(device.draw_calls().len(), 1);
}

#[test]
fn test_texture_routing_by_extension() {
    let loader = RecordingLoader::default();
    let calls = Rc::clone(&loader.calls);
    let mut device = HeadlessDevice::new();
    let mut resources = ResourceManager::default().with_texture_loader(loader);

    let mut root = SceneNode::new("root");
    for name in ["a.bmp", "B.BMP", "c.dds", "D.DDS", "", "e.png", "noext"] {
        root.push_child(VirtualObject::new(name).with_component(UnitPolygonTextured::new(name)));
    }
    load_scene(&mut root, &resources);
    let report = allocate_scene(&mut root, &mut device, &mut resources);

    assert_eq!(
        *calls.borrow(),
        [
            ("bitmap", "a.bmp".to_string()),
            ("bitmap", "B.BMP".to_string()),
            ("compressed", "c.dds".to_string()),
            ("compressed", "D.DDS".to_string()),
        ]
    );
    let failed: Vec<&str> = report.failed.iter().map(|f| f.object.as_str()).collect();
    assert_eq!(failed, ["e.png", "noext"]);
    assert_eq!(device.live_textures(), 4);
    // the two failures hold nothing on the device
    assert_eq!(device.live_programs(), 5);

    frame(&mut device, &root, CameraMatrices::identity());
    let textured = device.draw_calls().iter().filter(|c| !c.textures.is_empty()).count();
    assert_eq!(device.draw_calls().len(), 5);
    assert_eq!(textured, 4);
}

#[test]
fn test_failed_allocation_disables_only_that_renderable() {
    let mut device = HeadlessDevice::new();
    let mut resources = ResourceManager::default();
    let mut root = SceneNode::new("root")
        .with_child(VirtualObject::new("bad").with_component(TexturedObjMesh::from_mesh(quad_mesh(), "skin.png").unwrap()))
        .with_child(VirtualObject::new("good").with_component(SingleColourMesh::new(TRIANGLE.to_vec()).unwrap()));

    load_scene(&mut root, &resources);
    let report = allocate_scene(&mut root, &mut device, &mut resources);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].object, "bad");
    assert_eq!(device.live_buffers(), 1);

    frame(&mut device, &root, CameraMatrices::identity());
    assert_eq!(device.draw_calls().len(), 1);

    let bad = root
        .child(0)
        .and_then(|e| match e {
            crate::scene::SceneElement::Object(o) => o.get_component::<TexturedObjMesh>(),
            crate::scene::SceneElement::Node(_) => None,
        })
        .unwrap();
    assert!(!bad.is_enabled());
    assert_eq!(bad.lifecycle_state(), LifecycleState::MainMemoryLoaded);
}

#[test]
fn test_repeated_frames_issue_identical_draws() {
    let mut device = HeadlessDevice::new();
    let mut resources = ResourceManager::default().with_texture_loader(RecordingLoader::default());
    let mut root = mixed_scene();
    load_scene(&mut root, &resources);
    allocate_scene(&mut root, &mut device, &mut resources);

    frame(&mut device, &root, CameraMatrices::identity());
    let first = device.draw_calls().to_vec();
    device.clear_draw_calls();
    frame(&mut device, &root, CameraMatrices::identity());

    assert_eq!(device.draw_calls(), first.as_slice());
    assert_eq!(device.enabled_attribute_count(), 0);
}

#[test]
fn test_scene_reloads_after_release() {
    let mut device = HeadlessDevice::new();
    let mut resources = ResourceManager::default().with_texture_loader(RecordingLoader::default());
    let mut root = mixed_scene();

    for _ in 0..2 {
        assert!(load_scene(&mut root, &resources).is_ok());
        assert!(allocate_scene(&mut root, &mut device, &mut resources).is_ok());
        assert_eq!(release_scene(&mut root, &mut device).succeeded, 4);
    }
    assert_eq!(device.live_buffers(), 0);
}

#[test]
fn test_leaf_renders_components_in_insertion_order() {
    let mut device = HeadlessDevice::new();
    let mut resources = ResourceManager::default();
    let mut points = SingleColourMesh::new(vec![0.0; 12]).unwrap();
    points.set_primitive(Primitive::Points);
    let mut root = SceneNode::new("root").with_child(
        VirtualObject::new("stack")
            .with_component(SingleColourMesh::new(TRIANGLE.to_vec()).unwrap())
            .with_component(points)
            .with_component(PerVertexColourMesh::new(vec![0.0; 6], vec![1.0; 6]).unwrap()),
    );
    load_scene(&mut root, &resources);
    allocate_scene(&mut root, &mut device, &mut resources);
    frame(&mut device, &root, CameraMatrices::identity());

    let draws: Vec<(Primitive, u32)> = device.draw_calls().iter().map(|c| (c.primitive, c.count)).collect();
    assert_eq!(
        draws,
        [(Primitive::Triangles, 3), (Primitive::Points, 4), (Primitive::Triangles, 2)]
    );
}

#[test]
fn test_draw_feeds_exactly_the_declared_attributes() {
    let declared_names = |attributes: VertexAttributes| -> Vec<&'static str> {
        let mut names: Vec<&str> = [
            (VertexAttributes::POSITION, bindings::VERTEX_POSITION),
            (VertexAttributes::UV, bindings::VERTEX_UV),
            (VertexAttributes::NORMAL, bindings::VERTEX_NORMAL),
            (VertexAttributes::COLOUR, bindings::VERTEX_COLOUR),
        ]
        .into_iter()
        .filter(|(flag, _)| attributes.contains(*flag))
        .map(|(_, name)| name)
        .collect();
        names.sort_unstable();
        names
    };

    let mut variants: Vec<Box<dyn Renderable>> = vec![
        Box::new(SingleColourMesh::new(TRIANGLE.to_vec()).unwrap()),
        Box::new(PerVertexColourMesh::new(TRIANGLE.to_vec(), vec![1.0; 9]).unwrap()),
        Box::new(UnitPolygonTextured::new("")),
        Box::new(TexturedObjMesh::from_mesh(quad_mesh(), "").unwrap()),
        Box::new(DirectionalLightObjMesh::from_mesh(quad_mesh(), "").unwrap()),
        Box::new(lit_quad()),
    ];

    let mut device = HeadlessDevice::new();
    let mut resources = ResourceManager::default();
    for renderable in &mut variants {
        let declared = declared_names(renderable.vertex_attributes());
        let buffers_before = device.live_buffers();
        renderable.load_resources_to_main_memory(&resources).unwrap();
        renderable.allocate_gpu_resources(&mut device, &mut resources).unwrap();
        assert_eq!(device.live_buffers() - buffers_before, declared.len());

        assert!(renderable.render(&mut device, &CameraMatrices::identity(), &Mat4::identity()));
        let fed: Vec<&str> = device.draw_calls().last().unwrap().attributes.keys().map(String::as_str).collect();
        assert_eq!(fed, declared);
    }
}
