//! World-space bounds collection and ray picking

use super::{visit_children, SceneVisitor};
use crate::bounds::BoundingBox;
use crate::foundation::math::{Mat4, Vec3};
use crate::scene::{SceneNode, VirtualObject, RENDERABLE_COMPONENT_TYPE};

/// World-space box of one renderable
#[derive(Debug, Clone, PartialEq)]
pub struct WorldBounds {
    /// Owning object
    pub object: String,
    /// Local box mapped through the object's local-to-world matrix
    pub bounds: BoundingBox,
}

/// Closest box hit by a ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickHit<'a> {
    /// Owning object
    pub object: &'a str,
    /// Distance along the ray to the box entry point
    pub distance: f32,
}

/// Collects the world-space bounding box of every enabled renderable
#[derive(Debug, Default)]
pub struct BoundsVisitor {
    bounds: Vec<WorldBounds>,
}

impl BoundsVisitor {
    /// Empty collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect bounds for the scene rooted at `root`, replacing earlier results
    pub fn collect(&mut self, root: &SceneNode) -> &[WorldBounds] {
        self.bounds.clear();
        root.accept(self, &Mat4::identity());
        &self.bounds
    }

    /// Boxes collected so far, in traversal order
    pub fn bounds(&self) -> &[WorldBounds] {
        &self.bounds
    }

    /// Union of every collected box
    pub fn scene_bounds(&self) -> Option<BoundingBox> {
        self.bounds
            .iter()
            .map(|b| b.bounds)
            .reduce(|acc, b| acc.union(&b))
    }

    /// Nearest collected box hit by the ray; ties keep the earlier box
    pub fn pick(&self, ray_origin: Vec3, ray_dir: Vec3) -> Option<PickHit<'_>> {
        self.bounds
            .iter()
            .filter_map(|b| {
                b.bounds.intersect_ray(ray_origin, ray_dir).map(|distance| PickHit {
                    object: &b.object,
                    distance,
                })
            })
            .fold(None, |best: Option<PickHit<'_>>, hit| match best {
                Some(b) if b.distance <= hit.distance => Some(b),
                _ => Some(hit),
            })
    }
}

impl SceneVisitor for BoundsVisitor {
    fn visit_scene_node(&mut self, node: &SceneNode, local_to_world: &Mat4) -> bool {
        visit_children(self, node, local_to_world);
        true
    }

    fn visit_virtual_object(&mut self, object: &VirtualObject, local_to_world: &Mat4) -> bool {
        for component in object.get_all_components_of_type(RENDERABLE_COMPONENT_TYPE) {
            if !component.is_enabled() {
                continue;
            }
            if let Some(renderable) = component.as_renderable() {
                let local = renderable.local_bounding_box();
                if local.is_valid() {
                    self.bounds.push(WorldBounds {
                        object: object.name().to_string(),
                        bounds: local.transformed(local_to_world),
                    });
                }
            }
        }
        true
    }
}
