//! Internal scene nodes and the element sum type

use super::VirtualObject;
use crate::foundation::math::{Mat4, Transform};
use crate::visitor::SceneVisitor;
use std::collections::BTreeMap;

/// Either kind of scene graph entry
#[derive(Debug)]
pub enum SceneElement {
    /// Internal node with children
    Node(SceneNode),
    /// Leaf with components
    Object(VirtualObject),
}

impl SceneElement {
    /// Dispatch `visitor` to the matching visit method with this element's
    /// local-to-world matrix. Returns `false` without visiting when the
    /// element is disabled, which also skips its whole subtree.
    pub fn accept(&self, visitor: &mut dyn SceneVisitor, parent_to_world: &Mat4) -> bool {
        match self {
            Self::Node(node) => node.accept(visitor, parent_to_world),
            Self::Object(object) => {
                if !object.is_enabled() {
                    return false;
                }
                let world = parent_to_world * object.transform.to_matrix();
                visitor.visit_virtual_object(object, &world)
            }
        }
    }

    /// Element name
    pub fn name(&self) -> &str {
        match self {
            Self::Node(node) => node.name(),
            Self::Object(object) => object.name(),
        }
    }

    /// Local transform
    pub fn transform(&self) -> &Transform {
        match self {
            Self::Node(node) => &node.transform,
            Self::Object(object) => &object.transform,
        }
    }
}

impl From<SceneNode> for SceneElement {
    fn from(node: SceneNode) -> Self {
        Self::Node(node)
    }
}

impl From<VirtualObject> for SceneElement {
    fn from(object: VirtualObject) -> Self {
        Self::Object(object)
    }
}

/// Internal scene node owning its children by key
///
/// Children are visited in ascending key order. The graph is a tree by
/// construction: every child is owned by exactly one node.
#[derive(Debug)]
pub struct SceneNode {
    name: String,
    enabled: bool,
    /// Transform relative to the parent node
    pub transform: Transform,
    children: BTreeMap<u32, SceneElement>,
}

impl SceneNode {
    /// Enabled node with an identity transform and no children
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            transform: Transform::identity(),
            children: BTreeMap::new(),
        }
    }

    /// Set the local transform
    #[must_use]
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Append a child (builder form)
    #[must_use]
    pub fn with_child(mut self, child: impl Into<SceneElement>) -> Self {
        self.push_child(child);
        self
    }

    /// Node name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether traversals enter this node
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable the node and, for traversals, its subtree
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Insert a child under `key`, returning any child it replaces
    pub fn add_child(&mut self, key: u32, child: impl Into<SceneElement>) -> Option<SceneElement> {
        self.children.insert(key, child.into())
    }

    /// Insert a child under the key after the current largest, returning that key
    pub fn push_child(&mut self, child: impl Into<SceneElement>) -> u32 {
        let key = self
            .children
            .keys()
            .next_back()
            .map_or(0, |last| last.saturating_add(1));
        self.children.insert(key, child.into());
        key
    }

    /// Detach a child
    pub fn remove_child(&mut self, key: u32) -> Option<SceneElement> {
        self.children.remove(&key)
    }

    /// Child under `key`
    pub fn child(&self, key: u32) -> Option<&SceneElement> {
        self.children.get(&key)
    }

    /// Child under `key`, mutably
    pub fn child_mut(&mut self, key: u32) -> Option<&mut SceneElement> {
        self.children.get_mut(&key)
    }

    /// Children in ascending key order
    pub fn children(&self) -> impl Iterator<Item = (u32, &SceneElement)> {
        self.children.iter().map(|(key, child)| (*key, child))
    }

    /// Children in ascending key order, mutably
    pub fn children_mut(&mut self) -> impl Iterator<Item = (u32, &mut SceneElement)> {
        self.children.iter_mut().map(|(key, child)| (*key, child))
    }

    /// Number of direct children
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Dispatch `visitor` to this node; see [`SceneElement::accept`]
    pub fn accept(&self, visitor: &mut dyn SceneVisitor, parent_to_world: &Mat4) -> bool {
        if !self.enabled {
            return false;
        }
        let world = parent_to_world * self.transform.to_matrix();
        visitor.visit_scene_node(self, &world)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_child_appends_after_largest_key() {
        let mut root = SceneNode::new("root");
        assert_eq!(root.push_child(VirtualObject::new("a")), 0);
        assert!(root.add_child(10, VirtualObject::new("b")).is_none());
        assert_eq!(root.push_child(VirtualObject::new("c")), 11);

        let names: Vec<&str> = root.children().map(|(_, c)| c.name()).collect();
        assert_eq!(names, ["a", "b", "c"]);

        assert_eq!(root.remove_child(10).map(|c| c.name().to_string()), Some("b".to_string()));
        assert_eq!(root.child_count(), 2);
    }

    #[test]
    fn test_add_child_replaces_existing_key() {
        let mut root = SceneNode::new("root");
        root.add_child(3, VirtualObject::new("old"));
        let replaced = root.add_child(3, SceneNode::new("new"));
        assert_eq!(replaced.map(|c| c.name().to_string()), Some("old".to_string()));
        assert!(matches!(root.child(3), Some(SceneElement::Node(_))));
    }
}
