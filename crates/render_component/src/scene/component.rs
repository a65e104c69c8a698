//! Components attached to virtual objects

use crate::renderable::Renderable;
use std::any::Any;

/// Type tag every renderable reports
pub const RENDERABLE_COMPONENT_TYPE: &str = "Renderable";

/// Behaviour attached to a [`VirtualObject`](super::VirtualObject)
///
/// Components are found by their type tag. A component that reports a tag but
/// does not expose the matching capability (e.g. `as_renderable` returns
/// `None`) is skipped by visitors.
pub trait Component: 'static {
    /// Tag used by [`VirtualObject::get_all_components_of_type`](super::VirtualObject::get_all_components_of_type)
    fn component_type(&self) -> &str;

    /// Whether the component takes part in traversals
    fn is_enabled(&self) -> bool;

    /// Enable or disable the component
    fn set_enabled(&mut self, enabled: bool);

    /// Concrete-type access
    fn as_any(&self) -> &dyn Any;

    /// Concrete-type access, mutably
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Renderable capability, if implemented
    fn as_renderable(&self) -> Option<&dyn Renderable> {
        None
    }

    /// Renderable capability, mutably
    fn as_renderable_mut(&mut self) -> Option<&mut dyn Renderable> {
        None
    }
}

/// Implement [`Component`] for a type implementing [`Renderable`], tagged
/// `"Renderable"` and delegating the enable flag to its base.
#[macro_export]
macro_rules! impl_renderable_component {
    ($ty:ty) => {
        impl $crate::scene::Component for $ty {
            fn component_type(&self) -> &str {
                $crate::scene::RENDERABLE_COMPONENT_TYPE
            }

            fn is_enabled(&self) -> bool {
                $crate::renderable::Renderable::base(self).is_enabled()
            }

            fn set_enabled(&mut self, enabled: bool) {
                $crate::renderable::Renderable::base_mut(self).set_enabled(enabled);
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }

            fn as_renderable(&self) -> Option<&dyn $crate::renderable::Renderable> {
                Some(self)
            }

            fn as_renderable_mut(&mut self) -> Option<&mut dyn $crate::renderable::Renderable> {
                Some(self)
            }
        }
    };
}
