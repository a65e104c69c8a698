//! # Render Component
//!
//! Renderable scene components with an explicit GPU resource lifecycle and a
//! visitor-driven render traversal.
//!
//! ## Features
//!
//! - **Renderable variants**: single colour, per-vertex colour, textured quad,
//!   textured OBJ mesh, directional light and Phong point-light shading
//! - **Four-stage lifecycle**: load to main memory, allocate GPU, render,
//!   unallocate, with partial allocations rolled back
//! - **Scene graph**: keyed nodes and component-carrying objects, traversed by
//!   double dispatch
//! - **Device abstraction**: an in-memory device for tests and tools, and an
//!   OpenGL device behind the `gl` feature
//!
//! ## Quick Start
//!
//! ```rust
//! use render_component::prelude::*;
//!
//! let mut device = HeadlessDevice::new();
//! let mut resources = ResourceManager::default();
//!
//! let triangle = SingleColourMesh::new(vec![
//!     -1.0, -1.0, 0.0,
//!      1.0, -1.0, 0.0,
//!      0.0,  1.0, 0.0,
//! ]).unwrap();
//! let mut root = SceneNode::new("root")
//!     .with_child(VirtualObject::new("triangle").with_component(triangle));
//!
//! assert!(load_scene(&mut root, &resources).is_ok());
//! assert!(allocate_scene(&mut root, &mut device, &mut resources).is_ok());
//!
//! RenderVisitor::new(&mut device, Mat4::identity(), Mat4::identity()).render_scene(&root);
//! assert_eq!(device.draw_calls().len(), 1);
//!
//! release_scene(&mut root, &mut device);
//! assert_eq!(device.live_buffers(), 0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;
pub mod config;
pub mod bounds;
pub mod error;
pub mod gpu;
pub mod resources;
pub mod renderable;
pub mod scene;
pub mod visitor;

#[cfg(test)]
mod tests;

/// Common imports for users of the crate
pub mod prelude {
    pub use crate::{
        bounds::BoundingBox,
        config::{Config, RenderComponentConfig},
        error::{RenderableError, RenderableResult},
        foundation::math::{Mat4, Mat4Ext, Transform, Vec3},
        gpu::{GraphicsDevice, HeadlessDevice, Primitive},
        renderable::{
            CameraMatrices, DirectionalLightObjMesh, LifecycleState, PerVertexColourMesh,
            PhongMaterial, PhongShadingObjMesh, PointLight, Renderable, SingleColourMesh,
            TextureSource, TexturedObjMesh, UnitPolygonTextured,
        },
        resources::{MeshData, ResourceManager},
        scene::{
            allocate_scene, load_scene, release_scene, Component, LifecycleReport, SceneElement,
            SceneNode, VirtualObject,
        },
        visitor::{BoundsVisitor, RenderVisitor, SceneVisitor},
    };
}
