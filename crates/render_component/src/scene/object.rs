//! Leaf scene elements

use super::Component;
use crate::foundation::math::Transform;

/// Leaf of the scene graph holding an ordered list of components
pub struct VirtualObject {
    name: String,
    enabled: bool,
    /// Transform relative to the parent node
    pub transform: Transform,
    components: Vec<Box<dyn Component>>,
}

impl std::fmt::Debug for VirtualObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let types: Vec<&str> = self.components.iter().map(|c| c.component_type()).collect();
        f.debug_struct("VirtualObject")
            .field("name", &self.name)
            .field("enabled", &self.enabled)
            .field("transform", &self.transform)
            .field("components", &types)
            .finish()
    }
}

impl VirtualObject {
    /// Enabled object with an identity transform and no components
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            transform: Transform::identity(),
            components: Vec::new(),
        }
    }

    /// Set the local transform
    #[must_use]
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Attach a component (builder form)
    #[must_use]
    pub fn with_component(mut self, component: impl Component) -> Self {
        self.add_component(component);
        self
    }

    /// Object name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether traversals visit this object
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable the object
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Attach a component after the existing ones
    pub fn add_component(&mut self, component: impl Component) {
        self.components.push(Box::new(component));
    }

    /// Attach an already boxed component
    pub fn add_boxed_component(&mut self, component: Box<dyn Component>) {
        self.components.push(component);
    }

    /// All components, in insertion order
    pub fn components(&self) -> &[Box<dyn Component>] {
        &self.components
    }

    /// All components, mutably
    pub fn components_mut(&mut self) -> &mut [Box<dyn Component>] {
        &mut self.components
    }

    /// Components reporting `component_type`, in insertion order
    pub fn get_all_components_of_type<'a>(&'a self, component_type: &'a str) -> impl Iterator<Item = &'a dyn Component> + 'a {
        self.components
            .iter()
            .filter(move |c| c.component_type() == component_type)
            .map(|c| &**c)
    }

    /// Components reporting `component_type`, mutably
    pub fn get_all_components_of_type_mut<'a>(
        &'a mut self,
        component_type: &'a str,
    ) -> impl Iterator<Item = &'a mut dyn Component> + 'a {
        self.components
            .iter_mut()
            .filter(move |c| c.component_type() == component_type)
            .map(|c| &mut **c)
    }

    /// First component of concrete type `T`
    pub fn get_component<T: Component>(&self) -> Option<&T> {
        self.components.iter().find_map(|c| c.as_any().downcast_ref::<T>())
    }

    /// First component of concrete type `T`, mutably
    pub fn get_component_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.components.iter_mut().find_map(|c| c.as_any_mut().downcast_mut::<T>())
    }
}
