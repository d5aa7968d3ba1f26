//! Typed registry of named [`Component`] implementations, keyed by
//! `component_type()` the same way a backend registry keys its entries
//! by backend name.

use std::collections::HashMap;
use std::sync::Arc;

use gst_component::Component;

/// A registry of [`Component`]s keyed by their `component_type()`.
#[derive(Default)]
pub struct ComponentRegistry {
    components: HashMap<String, Arc<dyn Component>>,
}

impl ComponentRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component under its own `component_type()`, replacing
    /// any previous entry with the same key.
    pub fn register(&mut self, component: Arc<dyn Component>) {
        self.components.insert(component.component_type().to_string(), component);
    }

    #[must_use]
    pub fn get_arc(&self, component_type: &str) -> Option<Arc<dyn Component>> {
        self.components.get(component_type).cloned()
    }

    #[must_use]
    pub fn list(&self) -> Vec<&str> {
        let mut v: Vec<&str> = self.components.keys().map(String::as_str).collect();
        v.sort_unstable();
        v
    }

    #[must_use]
    pub fn contains(&self, component_type: &str) -> bool {
        self.components.contains_key(component_type)
    }
}
