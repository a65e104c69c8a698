//! Render traversal

use super::{visit_children, SceneVisitor};
use crate::foundation::math::Mat4;
use crate::gpu::GraphicsDevice;
use crate::renderable::CameraMatrices;
use crate::scene::{SceneNode, VirtualObject, RENDERABLE_COMPONENT_TYPE};

/// Renders every enabled renderable reachable from the visited node
///
/// Holds the frame's projection and view, which no renderable may change.
/// Each renderable gets `projection * view * local_to_world` of its object.
pub struct RenderVisitor<'a> {
    device: &'a mut dyn GraphicsDevice,
    camera: CameraMatrices,
}

impl<'a> RenderVisitor<'a> {
    /// Visitor drawing through `device` with the given camera
    pub fn new(device: &'a mut dyn GraphicsDevice, projection: Mat4, view: Mat4) -> Self {
        Self::with_camera(device, CameraMatrices::new(projection, view))
    }

    /// Visitor drawing through `device` with prebuilt camera matrices
    pub fn with_camera(device: &'a mut dyn GraphicsDevice, camera: CameraMatrices) -> Self {
        Self { device, camera }
    }

    /// Camera used for this frame
    pub fn camera(&self) -> &CameraMatrices {
        &self.camera
    }

    /// Render the scene rooted at `root`
    pub fn render_scene(&mut self, root: &SceneNode) -> bool {
        root.accept(self, &Mat4::identity())
    }
}

impl SceneVisitor for RenderVisitor<'_> {
    fn visit_scene_node(&mut self, node: &SceneNode, local_to_world: &Mat4) -> bool {
        visit_children(self, node, local_to_world);
        true
    }

    fn visit_virtual_object(&mut self, object: &VirtualObject, local_to_world: &Mat4) -> bool {
        for component in object.get_all_components_of_type(RENDERABLE_COMPONENT_TYPE) {
            let Some(renderable) = component.as_renderable() else {
                log::trace!(
                    "Component on '{}' is tagged renderable but cannot render, skipping",
                    object.name()
                );
                continue;
            };
            if !component.is_enabled() {
                continue;
            }
            renderable.render(&mut *self.device, &self.camera, local_to_world);
        }
        true
    }
}
