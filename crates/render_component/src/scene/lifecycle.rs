//! Drive renderable lifecycles across a whole scene
//!
//! Each stage is attempted on every renderable that is in the right state for
//! it. A renderable whose stage fails is disabled so later stages and
//! traversals leave it alone; the failure is reported, never retried.

use super::{SceneElement, SceneNode};
use crate::error::RenderableError;
use crate::gpu::GraphicsDevice;
use crate::renderable::{LifecycleState, Renderable};
use crate::resources::ResourceManager;

/// A renderable whose stage failed
#[derive(Debug)]
pub struct LifecycleFailure {
    /// Name of the owning object
    pub object: String,
    /// Why the stage failed
    pub error: RenderableError,
}

/// Outcome of one stage across a scene
#[derive(Debug, Default)]
pub struct LifecycleReport {
    /// Renderables that completed the stage
    pub succeeded: usize,
    /// Renderables that failed and were disabled
    pub failed: Vec<LifecycleFailure>,
}

impl LifecycleReport {
    /// True when nothing failed
    pub fn is_ok(&self) -> bool {
        self.failed.is_empty()
    }

    fn record(&mut self, object: &str, renderable: &mut dyn Renderable, result: Result<(), RenderableError>) {
        match result {
            Ok(()) => self.succeeded += 1,
            Err(error) => {
                log::warn!("Renderable on '{}' failed and was disabled: {}", object, error);
                renderable.set_enabled(false);
                self.failed.push(LifecycleFailure {
                    object: object.to_string(),
                    error,
                });
            }
        }
    }
}

/// Load every `Uninitialized` or `Released` renderable to main memory
pub fn load_scene(root: &mut SceneNode, resources: &ResourceManager) -> LifecycleReport {
    let mut report = LifecycleReport::default();
    for_each_renderable(root, &mut |object, renderable| {
        if matches!(
            renderable.lifecycle_state(),
            LifecycleState::Uninitialized | LifecycleState::Released
        ) {
            let result = renderable.load_resources_to_main_memory(resources);
            report.record(object, renderable, result);
        }
    });
    log::info!("Loaded {} renderable(s), {} failed", report.succeeded, report.failed.len());
    report
}

/// Allocate GPU resources for every `MainMemoryLoaded` renderable
pub fn allocate_scene(
    root: &mut SceneNode,
    device: &mut dyn GraphicsDevice,
    resources: &mut ResourceManager,
) -> LifecycleReport {
    let mut report = LifecycleReport::default();
    for_each_renderable(root, &mut |object, renderable| {
        if renderable.lifecycle_state() == LifecycleState::MainMemoryLoaded && renderable.is_enabled() {
            let result = renderable.allocate_gpu_resources(device, resources);
            report.record(object, renderable, result);
        }
    });
    log::info!("Allocated {} renderable(s), {} failed", report.succeeded, report.failed.len());
    report
}

/// Release every `GpuAllocated` renderable
pub fn release_scene(root: &mut SceneNode, device: &mut dyn GraphicsDevice) -> LifecycleReport {
    let mut report = LifecycleReport::default();
    for_each_renderable(root, &mut |object, renderable| {
        if renderable.lifecycle_state() == LifecycleState::GpuAllocated {
            let result = renderable.unallocate_all_resources(device);
            report.record(object, renderable, result);
        }
    });
    log::info!("Released {} renderable(s)", report.succeeded);
    report
}

/// Every renderable component in the tree, disabled ones included
fn for_each_renderable(node: &mut SceneNode, f: &mut dyn FnMut(&str, &mut dyn Renderable)) {
    for (_, child) in node.children_mut() {
        match child {
            SceneElement::Node(inner) => for_each_renderable(inner, f),
            SceneElement::Object(object) => {
                let name = object.name().to_string();
                for component in object.components_mut() {
                    if let Some(renderable) = component.as_renderable_mut() {
                        f(&name, renderable);
                    }
                }
            }
        }
    }
}
