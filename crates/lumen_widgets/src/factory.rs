//! Named component constructors
//!
//! Toolbars are described by configuration as lists of names; the
//! [`ComponentFactory`] turns those names into fresh views.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use lumen_view::{Dom, View};

use crate::error::{Result, WidgetError};

pub type ComponentConstructor = Rc<dyn Fn(&Dom) -> Result<View>>;

pub struct ComponentFactory {
    dom: Dom,
    components: IndexMap<String, ComponentConstructor>,
}

impl ComponentFactory {
    pub fn new(dom: &Dom) -> Self {
        Self {
            dom: dom.clone(),
            components: IndexMap::new(),
        }
    }

    /// Register a constructor under `name`
    pub fn add<F>(&mut self, name: &str, constructor: F) -> Result<()>
    where
        F: Fn(&Dom) -> Result<View> + 'static,
    {
        if self.components.contains_key(name) {
            return Err(WidgetError::DuplicateComponent {
                name: name.to_string(),
            });
        }
        self.components.insert(name.to_string(), Rc::new(constructor));
        tracing::debug!(component = name, "component registered");
        Ok(())
    }

    /// Build a new instance of the component registered under `name`
    pub fn create(&self, name: &str) -> Result<View> {
        let constructor = self
            .components
            .get(name)
            .ok_or_else(|| WidgetError::UnknownComponent {
                name: name.to_string(),
            })?;
        constructor(&self.dom)
    }

    pub fn has(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    /// Registered names, in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.components.keys().map(String::as_str)
    }
}

impl fmt::Debug for ComponentFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentFactory")
            .field("components", &self.components.keys().collect::<Vec<_>>())
            .finish()
    }
}
