//! Observable attribute models
//!
//! An [`Observable`] stores named [`Value`]s and announces every change
//! through its [`Emitter`]: first a generic `change` event with
//! `[name, new, old]`, then a specific `change:<name>` event with
//! `[new, old]`. Both fire synchronously on the call stack of the mutation.
//!
//! Attributes of one observable can track attributes of others:
//!
//! ```rust
//! use lumen_core::{Observable, Value};
//!
//! let car = Observable::with_attributes([("color", Value::from("red"))]);
//! let vehicle = Observable::new();
//!
//! vehicle.bind(&["color"]).unwrap().to(&car, &[]).unwrap();
//! assert_eq!(vehicle.get("color"), Value::from("red"));
//!
//! car.set("color", "blue").unwrap();
//! assert_eq!(vehicle.get("color"), Value::from("blue"));
//! ```
//!
//! Bookkeeping is kept in two explicit registries: `bound` (per bound
//! attribute, the ordered list of sources plus an optional combining
//! callback) and `bound_to` (per source emitter id, which source attribute
//! feeds which bound attributes). A source is unsubscribed as soon as no
//! binding references it anymore.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxHashSet;

use crate::emitter::{
    Emitter, EmitterId, EventInfo, ListenerRegistry, Priority, Subscription,
};
use crate::error::{ObservableError, Result};
use crate::value::{Callback, Value};

#[derive(Clone)]
struct BindingSource {
    observable: WeakObservable,
    emitter: EmitterId,
    attribute: String,
}

#[derive(Default)]
struct Binding {
    to: Vec<BindingSource>,
    callback: Option<Callback>,
}

struct SourceLinks {
    /// Source attribute -> bound attributes it feeds
    attributes: IndexMap<String, IndexSet<String>>,
    subscription: Subscription,
}

struct ObservableInner {
    emitter: Emitter,
    attributes: RefCell<IndexMap<String, Value>>,
    members: RefCell<FxHashSet<String>>,
    bound: RefCell<IndexMap<String, Binding>>,
    bound_to: RefCell<IndexMap<EmitterId, SourceLinks>>,
    listeners: RefCell<ListenerRegistry>,
}

impl Drop for ObservableInner {
    fn drop(&mut self) {
        self.listeners.get_mut().stop_listening();
    }
}

/// A shared handle to an attribute model
#[derive(Clone)]
pub struct Observable {
    inner: Rc<ObservableInner>,
}

impl Observable {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(ObservableInner {
                emitter: Emitter::new(),
                attributes: RefCell::new(IndexMap::new()),
                members: RefCell::new(FxHashSet::default()),
                bound: RefCell::new(IndexMap::new()),
                bound_to: RefCell::new(IndexMap::new()),
                listeners: RefCell::new(ListenerRegistry::new()),
            }),
        }
    }

    /// Create a model seeded with initial attributes (no events fire)
    pub fn with_attributes<I, K>(attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let observable = Self::new();
        observable
            .inner
            .attributes
            .borrow_mut()
            .extend(attributes.into_iter().map(|(k, v)| (k.into(), v)));
        observable
    }

    pub fn id(&self) -> EmitterId {
        self.inner.emitter.id()
    }

    pub fn emitter(&self) -> &Emitter {
        &self.inner.emitter
    }

    pub fn downgrade(&self) -> WeakObservable {
        WeakObservable {
            inner: Rc::downgrade(&self.inner),
            id: self.id(),
        }
    }

    /// Reserve a name for a non-attribute member
    ///
    /// Reserved names can neither be set nor bound.
    pub fn declare_member(&self, name: &str) {
        self.inner.members.borrow_mut().insert(name.to_string());
    }

    pub fn is_member(&self, name: &str) -> bool {
        self.inner.members.borrow().contains(name)
    }

    /// Set an attribute, creating it if needed
    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        if self.is_member(name) {
            return Err(ObservableError::AttributeCollision {
                name: name.to_string(),
            });
        }

        let old = {
            let mut attributes = self.inner.attributes.borrow_mut();
            match attributes.get_mut(name) {
                Some(current) if *current == value => return Ok(()),
                Some(current) => std::mem::replace(current, value.clone()),
                None => {
                    attributes.insert(name.to_string(), value.clone());
                    if value.is_undefined() {
                        return Ok(());
                    }
                    Value::Undefined
                }
            }
        };

        tracing::trace!(attribute = name, ?value, "attribute changed");
        self.inner
            .emitter
            .fire("change", &[Value::from(name), value.clone(), old.clone()]);
        self.inner
            .emitter
            .fire(&format!("change:{name}"), &[value, old]);
        Ok(())
    }

    /// Set several attributes in order
    pub fn set_many<I, K>(&self, attributes: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        for (name, value) in attributes {
            self.set(name.as_ref(), value)?;
        }
        Ok(())
    }

    /// Current value of an attribute, `Undefined` when absent
    pub fn get(&self, name: &str) -> Value {
        self.inner
            .attributes
            .borrow()
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    pub fn has(&self, name: &str) -> bool {
        self.inner.attributes.borrow().contains_key(name)
    }

    pub fn attribute_names(&self) -> Vec<String> {
        self.inner.attributes.borrow().keys().cloned().collect()
    }

    /// Subscribe to an event on this model
    pub fn on<F>(&self, event: &str, callback: F) -> Subscription
    where
        F: Fn(&mut EventInfo, &[Value]) + 'static,
    {
        self.inner.emitter.on(event, callback)
    }

    pub fn on_with_priority<F>(&self, event: &str, priority: Priority, callback: F) -> Subscription
    where
        F: Fn(&mut EventInfo, &[Value]) + 'static,
    {
        self.inner.emitter.on_with_priority(event, priority, callback)
    }

    pub fn fire(&self, event: &str, args: &[Value]) -> EventInfo {
        self.inner.emitter.fire(event, args)
    }

    /// Subscribe to another emitter and remember the subscription
    pub fn listen_to<F>(&self, source: &Emitter, event: &str, callback: F) -> Subscription
    where
        F: Fn(&mut EventInfo, &[Value]) + 'static,
    {
        self.inner
            .listeners
            .borrow_mut()
            .listen_to(source, event, callback)
    }

    pub fn stop_listening_to(&self, source: EmitterId) {
        self.inner.listeners.borrow_mut().stop_listening_to(source);
    }

    pub fn stop_listening(&self) {
        self.inner.listeners.borrow_mut().stop_listening();
    }

    pub fn is_listening_to(&self, source: EmitterId) -> bool {
        self.inner.listeners.borrow().is_listening_to(source)
    }

    /// Begin binding own attributes to other models
    pub fn bind(&self, names: &[&str]) -> Result<BindChain> {
        if names.is_empty() || names.iter().any(|n| n.is_empty()) {
            return Err(ObservableError::InvalidBindNames);
        }

        let mut seen = FxHashSet::default();
        for name in names {
            if !seen.insert(*name) {
                return Err(ObservableError::DuplicateBindNames {
                    name: name.to_string(),
                });
            }
        }

        {
            let bound = self.inner.bound.borrow();
            if let Some(name) = names.iter().find(|n| bound.contains_key(**n)) {
                return Err(ObservableError::Rebind {
                    name: name.to_string(),
                });
            }
        }

        if let Some(name) = names.iter().find(|n| self.is_member(n)) {
            return Err(ObservableError::AttributeCollision {
                name: name.to_string(),
            });
        }

        let mut created = Vec::new();
        {
            let mut bound = self.inner.bound.borrow_mut();
            let mut attributes = self.inner.attributes.borrow_mut();
            for name in names {
                bound.insert(name.to_string(), Binding::default());
                if !attributes.contains_key(*name) {
                    attributes.insert(name.to_string(), Value::Undefined);
                    created.push(name.to_string());
                }
            }
        }

        Ok(BindChain {
            target: self.clone(),
            names: names.iter().map(|n| n.to_string()).collect(),
            created,
            sources: 0,
        })
    }

    /// Remove bindings of the given attributes, or of all attributes when
    /// `names` is empty
    ///
    /// Current values are kept.
    pub fn unbind(&self, names: &[&str]) -> Result<()> {
        if names.iter().any(|n| n.is_empty()) {
            return Err(ObservableError::InvalidUnbindNames);
        }

        let targets: Vec<String> = if names.is_empty() {
            self.inner.bound.borrow().keys().cloned().collect()
        } else {
            names.iter().map(|n| n.to_string()).collect()
        };

        for name in &targets {
            self.remove_binding(name);
        }
        Ok(())
    }

    /// Tear the model down: drop every binding and subscription
    ///
    /// No change events fire afterwards.
    pub fn destroy(&self) {
        let names: Vec<String> = self.inner.bound.borrow().keys().cloned().collect();
        for name in &names {
            self.remove_binding(name);
        }
        self.stop_listening();
        self.inner.emitter.clear();
        tracing::debug!(model = self.id().as_u64(), "observable destroyed");
    }

    /// Names of attributes currently under a binding
    pub fn bound_attributes(&self) -> Vec<String> {
        self.inner.bound.borrow().keys().cloned().collect()
    }

    /// Emitter ids of every model this one is bound to
    pub fn bound_sources(&self) -> Vec<EmitterId> {
        self.inner.bound_to.borrow().keys().copied().collect()
    }

    /// For one source: source attribute -> bound attributes it feeds
    pub fn bindings_to(&self, source: &Observable) -> IndexMap<String, Vec<String>> {
        self.inner
            .bound_to
            .borrow()
            .get(&source.id())
            .map(|links| {
                links
                    .attributes
                    .iter()
                    .map(|(attr, bound)| (attr.clone(), bound.iter().cloned().collect()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn remove_binding(&self, name: &str) {
        let Some(binding) = self.inner.bound.borrow_mut().shift_remove(name) else {
            return;
        };

        let mut released = Vec::new();
        {
            let mut bound_to = self.inner.bound_to.borrow_mut();
            for source in &binding.to {
                let Some(links) = bound_to.get_mut(&source.emitter) else {
                    continue;
                };
                if let Some(names) = links.attributes.get_mut(&source.attribute) {
                    names.shift_remove(name);
                    if names.is_empty() {
                        links.attributes.shift_remove(&source.attribute);
                    }
                }
                if links.attributes.is_empty() {
                    if let Some(links) = bound_to.shift_remove(&source.emitter) {
                        released.push(links.subscription);
                    }
                }
            }
        }

        for subscription in released {
            self.inner.listeners.borrow_mut().release(&subscription);
        }
        tracing::trace!(attribute = name, "binding removed");
    }

    fn refresh_binding(&self, name: &str) -> Result<()> {
        let (sources, callback) = {
            let bound = self.inner.bound.borrow();
            let Some(binding) = bound.get(name) else {
                return Ok(());
            };
            (binding.to.clone(), binding.callback.clone())
        };

        let values: Vec<Value> = sources
            .iter()
            .map(|source| {
                source
                    .observable
                    .upgrade()
                    .map(|o| o.get(&source.attribute))
                    .unwrap_or_default()
            })
            .collect();

        let value = match (callback, values.len()) {
            (Some(callback), _) => callback.call(&values),
            (None, 1) => values.into_iter().next().unwrap_or_default(),
            (None, _) => Value::Undefined,
        };

        self.set(name, value)
    }

    fn on_source_change(&self, source: EmitterId, attribute: &str) {
        let affected: Vec<String> = {
            let bound_to = self.inner.bound_to.borrow();
            match bound_to
                .get(&source)
                .and_then(|links| links.attributes.get(attribute))
            {
                Some(names) => names.iter().cloned().collect(),
                None => return,
            }
        };

        for name in affected {
            if let Err(err) = self.refresh_binding(&name) {
                tracing::warn!(attribute = %name, %err, "failed to propagate bound attribute");
            }
        }
    }
}

impl Default for Observable {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Observable {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Observable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("id", &self.id())
            .field("attributes", &*self.inner.attributes.borrow())
            .finish()
    }
}

/// Non-owning observable handle
#[derive(Clone)]
pub struct WeakObservable {
    inner: Weak<ObservableInner>,
    id: EmitterId,
}

impl WeakObservable {
    pub fn upgrade(&self) -> Option<Observable> {
        self.inner.upgrade().map(|inner| Observable { inner })
    }

    pub fn id(&self) -> EmitterId {
        self.id
    }
}

/// Pending binding declaration returned by [`Observable::bind`]
///
/// A failing step rolls back every registration the chain made.
#[derive(Debug)]
pub struct BindChain {
    target: Observable,
    names: Vec<String>,
    created: Vec<String>,
    sources: usize,
}

impl BindChain {
    /// Bind to `source`
    ///
    /// With no attribute names the bound names are reused. A single source
    /// name feeds every bound attribute; otherwise the counts must match.
    pub fn to(mut self, source: &Observable, attributes: &[&str]) -> Result<BindChain> {
        match self.try_to(source, attributes) {
            Ok(()) => Ok(self),
            Err(err) => {
                self.rollback();
                Err(err)
            }
        }
    }

    /// Combine the per-source values with `f`
    pub fn as_fn<F>(self, f: F) -> Result<()>
    where
        F: Fn(&[Value]) -> Value + 'static,
    {
        self.as_callback(Value::Callback(Callback::new(f)))
    }

    /// Combine the per-source values with a callback value
    pub fn as_callback(self, callback: Value) -> Result<()> {
        let Value::Callback(callback) = callback else {
            self.rollback();
            return Err(ObservableError::CallbackType);
        };

        {
            let mut bound = self.target.inner.bound.borrow_mut();
            for name in &self.names {
                if let Some(binding) = bound.get_mut(name) {
                    binding.callback = Some(callback.clone());
                }
            }
        }
        self.refresh()
    }

    fn try_to(&mut self, source: &Observable, attributes: &[&str]) -> Result<()> {
        if attributes.iter().any(|a| a.is_empty()) {
            return Err(ObservableError::InvalidToNames);
        }

        let source_attributes: Vec<String> = if attributes.is_empty() {
            self.names.clone()
        } else {
            attributes.iter().map(|a| a.to_string()).collect()
        };

        if source_attributes.len() != 1 && source_attributes.len() != self.names.len() {
            return Err(ObservableError::BindingLength {
                bound: self.names.len(),
                sources: source_attributes.len(),
            });
        }

        if self.sources > 0 && self.names.len() > 1 {
            return Err(ObservableError::Chain);
        }

        if let Some(missing) = source_attributes.iter().find(|a| !source.has(a)) {
            return Err(ObservableError::MissingAttribute {
                name: missing.clone(),
            });
        }

        let source_id = source.id();
        for (index, name) in self.names.iter().enumerate() {
            let attribute = if source_attributes.len() == 1 {
                &source_attributes[0]
            } else {
                &source_attributes[index]
            };

            if let Some(binding) = self.target.inner.bound.borrow_mut().get_mut(name) {
                binding.to.push(BindingSource {
                    observable: source.downgrade(),
                    emitter: source_id,
                    attribute: attribute.clone(),
                });
            }

            let linked = self.target.inner.bound_to.borrow().contains_key(&source_id);
            if !linked {
                let subscription = self.subscribe(source);
                self.target.inner.bound_to.borrow_mut().insert(
                    source_id,
                    SourceLinks {
                        attributes: IndexMap::new(),
                        subscription,
                    },
                );
            }

            if let Some(links) = self.target.inner.bound_to.borrow_mut().get_mut(&source_id) {
                links
                    .attributes
                    .entry(attribute.clone())
                    .or_default()
                    .insert(name.clone());
            }
        }

        self.sources += 1;
        tracing::trace!(
            attributes = ?self.names,
            source = source_id.as_u64(),
            "attributes bound"
        );
        self.refresh()
    }

    fn subscribe(&self, source: &Observable) -> Subscription {
        let target = self.target.downgrade();
        let source_id = source.id();
        self.target
            .inner
            .listeners
            .borrow_mut()
            .listen_to(source.emitter(), "change", move |_, args| {
                let Some(target) = target.upgrade() else {
                    return;
                };
                if let Some(attribute) = args.first().and_then(Value::as_str) {
                    target.on_source_change(source_id, attribute);
                }
            })
    }

    fn refresh(&self) -> Result<()> {
        for name in &self.names {
            self.target.refresh_binding(name)?;
        }
        Ok(())
    }

    fn rollback(&self) {
        for name in &self.names {
            self.target.remove_binding(name);
        }
        let mut attributes = self.target.inner.attributes.borrow_mut();
        for name in &self.created {
            if attributes.get(name).is_some_and(Value::is_undefined) {
                attributes.shift_remove(name);
            }
        }
    }
}
