//! Scene graph
//!
//! A tree of [`SceneNode`]s (internal, keyed children) and [`VirtualObject`]s
//! (leaves, ordered components). Transforms are local to the parent; the
//! local-to-world matrix of each element is computed during traversal and
//! handed to the visitor.

mod component;
mod lifecycle;
mod node;
mod object;

pub use component::{Component, RENDERABLE_COMPONENT_TYPE};
pub use lifecycle::{allocate_scene, load_scene, release_scene, LifecycleFailure, LifecycleReport};
pub use node::{SceneElement, SceneNode};
pub use object::VirtualObject;
