//! Scene traversal by double dispatch
//!
//! [`SceneElement::accept`](crate::scene::SceneElement::accept) selects the
//! visit method by element kind; the visitor selects the behaviour. Adding a
//! traversal means adding a visitor, not touching the graph types.

mod bounds;
mod render;

pub use bounds::{BoundsVisitor, PickHit, WorldBounds};
pub use render::RenderVisitor;

use crate::foundation::math::Mat4;
use crate::scene::{SceneNode, VirtualObject};

/// Per-kind callbacks for a scene traversal
///
/// `local_to_world` is the element's own transform already composed with all
/// of its ancestors'. Both methods return whether the element was handled.
pub trait SceneVisitor {
    /// Called for each enabled internal node
    fn visit_scene_node(&mut self, node: &SceneNode, local_to_world: &Mat4) -> bool;

    /// Called for each enabled leaf
    fn visit_virtual_object(&mut self, object: &VirtualObject, local_to_world: &Mat4) -> bool;
}

/// Accept `visitor` on every child of `node` in ascending key order.
///
/// Returns `true` when at least one child was visited.
pub fn visit_children(visitor: &mut dyn SceneVisitor, node: &SceneNode, local_to_world: &Mat4) -> bool {
    let mut any = false;
    for (_, child) in node.children() {
        any |= child.accept(visitor, local_to_world);
    }
    any
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Transform, Vec3};
    use crate::scene::SceneElement;
    use approx::assert_relative_eq;

    #[derive(Default)]
    struct Recorder {
        visits: Vec<(String, Vec3)>,
    }

    impl SceneVisitor for Recorder {
        fn visit_scene_node(&mut self, node: &SceneNode, local_to_world: &Mat4) -> bool {
            self.visits.push((node.name().to_string(), local_to_world.column(3).xyz()));
            visit_children(self, node, local_to_world);
            true
        }

        fn visit_virtual_object(&mut self, object: &VirtualObject, local_to_world: &Mat4) -> bool {
            self.visits.push((object.name().to_string(), local_to_world.column(3).xyz()));
            true
        }
    }

    #[test]
    fn test_children_visited_once_in_key_order() {
        let mut root = SceneNode::new("root");
        root.add_child(7, VirtualObject::new("seven"));
        root.add_child(2, VirtualObject::new("two"));
        root.add_child(
            5,
            SceneNode::new("five").with_child(VirtualObject::new("five.leaf")),
        );

        let mut recorder = Recorder::default();
        assert!(root.accept(&mut recorder, &Mat4::identity()));

        let names: Vec<&str> = recorder.visits.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["root", "two", "five", "five.leaf", "seven"]);
    }

    #[test]
    fn test_world_transform_composes_parent_first() {
        let leaf = VirtualObject::new("leaf").with_transform(Transform::from_position(Vec3::new(0.0, 1.0, 0.0)));
        let root = SceneNode::new("root")
            .with_transform(Transform::from_position(Vec3::new(2.0, 0.0, 0.0)))
            .with_child(SceneNode::new("mid").with_transform(Transform::from_position(Vec3::new(0.0, 0.0, 3.0))).with_child(leaf));

        let mut recorder = Recorder::default();
        SceneElement::from(root).accept(&mut recorder, &Mat4::identity());

        let leaf_origin = recorder.visits.last().map(|(_, p)| *p).unwrap();
        assert_relative_eq!(leaf_origin, Vec3::new(2.0, 1.0, 3.0));
    }

    #[test]
    fn test_disabled_subtree_is_skipped() {
        let mut hidden = SceneNode::new("hidden").with_child(VirtualObject::new("inside"));
        hidden.set_enabled(false);
        let mut off = VirtualObject::new("off");
        off.set_enabled(false);
        let root = SceneNode::new("root")
            .with_child(hidden)
            .with_child(off)
            .with_child(VirtualObject::new("on"));

        let mut recorder = Recorder::default();
        root.accept(&mut recorder, &Mat4::identity());

        let names: Vec<&str> = recorder.visits.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["root", "on"]);
    }
}
