//! Views
//!
//! A [`View`] pairs a model with a [`Template`]. Rendering builds the DOM
//! once; afterwards the template's bindings keep it in sync with the
//! model. Views own named regions, each an ordered list of child views
//! mounted into an element of the parent (or into nothing at all, for
//! purely logical regions).
//!
//! Lifecycle: `Created -> Rendered -> Destroyed`. `render()` is idempotent
//! and `destroy()` may be called in any state, any number of times.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use lumen_core::{BindChain, Emitter, EventInfo, ListenerRegistry, Observable, Subscription, Value};

use crate::collection::ViewCollection;
use crate::dom::{Dom, NodeId, SelectorList};
use crate::error::{RegionOp, Result, ViewError};
use crate::template::{RenderedTemplate, Template};

/// Names a view reserves on the model it owns
const VIEW_MEMBERS: &[&str] = &[
    "render",
    "destroy",
    "element",
    "register",
    "add_child",
    "remove_child",
    "get_child",
    "template",
    "model",
    "regions",
];

type Resolver = Rc<dyn Fn(&Dom, NodeId) -> Option<NodeId>>;
type RenderHook = Rc<dyn Fn(&View) -> Result<()>>;
type DestroyHook = Rc<dyn Fn(&View)>;

/// Where a region mounts its child views
#[derive(Clone)]
pub enum RegionSelector {
    /// First descendant of the view element matching the selector
    Css(String),
    /// Custom lookup from the view element
    Resolver(Resolver),
    /// No element: children are tracked but never mounted
    Detached,
}

impl RegionSelector {
    pub fn css(selector: &str) -> Self {
        RegionSelector::Css(selector.to_string())
    }

    pub fn resolver<F>(resolve: F) -> Self
    where
        F: Fn(&Dom, NodeId) -> Option<NodeId> + 'static,
    {
        RegionSelector::Resolver(Rc::new(resolve))
    }
}

impl PartialEq for RegionSelector {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (RegionSelector::Css(a), RegionSelector::Css(b)) => a == b,
            (RegionSelector::Resolver(a), RegionSelector::Resolver(b)) => Rc::ptr_eq(a, b),
            (RegionSelector::Detached, RegionSelector::Detached) => true,
            _ => false,
        }
    }
}

impl fmt::Debug for RegionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionSelector::Css(selector) => f.debug_tuple("Css").field(selector).finish(),
            RegionSelector::Resolver(_) => f.write_str("Resolver(..)"),
            RegionSelector::Detached => f.write_str("Detached"),
        }
    }
}

struct Region {
    selector: RegionSelector,
    parsed: Option<SelectorList>,
    element: Option<NodeId>,
    views: Vec<View>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ViewState {
    Created,
    Rendered,
    Destroyed,
}

struct ViewInner {
    dom: Dom,
    model: Observable,
    owns_model: bool,
    template: RefCell<Option<Template>>,
    rendered: RefCell<Option<RenderedTemplate>>,
    element: Cell<Option<NodeId>>,
    regions: RefCell<IndexMap<String, Region>>,
    collections: RefCell<Vec<ViewCollection>>,
    listeners: RefCell<ListenerRegistry>,
    render_hooks: RefCell<Vec<RenderHook>>,
    destroy_hooks: RefCell<Vec<DestroyHook>>,
    state: Cell<ViewState>,
}

/// Shared handle to a view
#[derive(Clone)]
pub struct View {
    inner: Rc<ViewInner>,
}

impl View {
    /// A view owning a fresh model
    pub fn new(dom: &Dom) -> Self {
        Self::with_attributes(dom, std::iter::empty::<(String, Value)>())
    }

    /// A view owning a model seeded with `attributes`
    pub fn with_attributes<I, K>(dom: &Dom, attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let model = Observable::with_attributes(attributes);
        for member in VIEW_MEMBERS {
            model.declare_member(member);
        }
        Self::build(dom, model, true)
    }

    /// A view owning a seeded model, with the template built from the view
    ///
    /// `build` runs before the template is installed, so it may create
    /// collections that the template then embeds.
    pub fn with_template<I, K, F>(dom: &Dom, attributes: I, build: F) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
        F: FnOnce(&View) -> Template,
    {
        let view = Self::with_attributes(dom, attributes);
        let template = build(&view);
        *view.inner.template.borrow_mut() = Some(template);
        view
    }

    /// A view sharing `model` with other owners
    pub fn with_model(dom: &Dom, model: &Observable) -> Self {
        Self::build(dom, model.clone(), false)
    }

    fn build(dom: &Dom, model: Observable, owns_model: bool) -> Self {
        Self {
            inner: Rc::new(ViewInner {
                dom: dom.clone(),
                model,
                owns_model,
                template: RefCell::new(None),
                rendered: RefCell::new(None),
                element: Cell::new(None),
                regions: RefCell::new(IndexMap::new()),
                collections: RefCell::new(Vec::new()),
                listeners: RefCell::new(ListenerRegistry::new()),
                render_hooks: RefCell::new(Vec::new()),
                destroy_hooks: RefCell::new(Vec::new()),
                state: Cell::new(ViewState::Created),
            }),
        }
    }

    pub fn dom(&self) -> &Dom {
        &self.inner.dom
    }

    pub fn model(&self) -> &Observable {
        &self.inner.model
    }

    pub fn downgrade(&self) -> WeakView {
        WeakView {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn set_template(&self, template: Template) -> Result<()> {
        self.ensure_unrendered()?;
        *self.inner.template.borrow_mut() = Some(template);
        Ok(())
    }

    /// Modify the template before the first render
    pub fn extend_template<F>(&self, extend: F) -> Result<()>
    where
        F: FnOnce(&mut Template),
    {
        self.ensure_unrendered()?;
        match self.inner.template.borrow_mut().as_mut() {
            Some(template) => {
                extend(template);
                Ok(())
            }
            None => Err(ViewError::NoTemplate),
        }
    }

    pub fn has_template(&self) -> bool {
        self.inner.template.borrow().is_some()
    }

    fn ensure_unrendered(&self) -> Result<()> {
        match self.inner.state.get() {
            ViewState::Created => Ok(()),
            ViewState::Rendered => Err(ViewError::AlreadyRendered),
            ViewState::Destroyed => Err(ViewError::Destroyed),
        }
    }

    /// Build the element, mount region children and run render hooks
    ///
    /// Returns the existing element when already rendered.
    pub fn render(&self) -> Result<NodeId> {
        match self.inner.state.get() {
            ViewState::Destroyed => return Err(ViewError::Destroyed),
            ViewState::Rendered => {
                if let Some(element) = self.inner.element.get() {
                    return Ok(element);
                }
            }
            ViewState::Created => {}
        }

        let template = self
            .inner
            .template
            .borrow()
            .clone()
            .ok_or(ViewError::NoTemplate)?;
        let rendered = template.render(&self.inner.dom, &self.inner.model)?;
        let element = rendered.root().ok_or(ViewError::NoTemplate)?;
        *self.inner.rendered.borrow_mut() = Some(rendered);
        self.inner.element.set(Some(element));
        self.inner.state.set(ViewState::Rendered);

        let names: Vec<String> = self.inner.regions.borrow().keys().cloned().collect();
        for name in names {
            self.mount_region(&name)?;
        }

        let hooks = self.inner.render_hooks.borrow().clone();
        for hook in hooks {
            hook(self)?;
        }

        tracing::debug!(element = ?element, "view rendered");
        Ok(element)
    }

    pub fn element(&self) -> Option<NodeId> {
        self.inner.element.get()
    }

    pub fn is_rendered(&self) -> bool {
        self.inner.state.get() == ViewState::Rendered
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.state.get() == ViewState::Destroyed
    }

    /// Run `hook` after every successful first render
    pub fn on_render<F>(&self, hook: F)
    where
        F: Fn(&View) -> Result<()> + 'static,
    {
        self.inner.render_hooks.borrow_mut().push(Rc::new(hook));
    }

    /// Run `hook` at the start of `destroy()`
    pub fn on_destroy<F>(&self, hook: F)
    where
        F: Fn(&View) + 'static,
    {
        self.inner.destroy_hooks.borrow_mut().push(Rc::new(hook));
    }

    /// Declare a named region
    ///
    /// Re-registering an existing name requires `override_existing`. An
    /// override with the same selector changes nothing; a different one
    /// moves the existing children to the new mount point.
    pub fn register(&self, name: &str, selector: RegionSelector, override_existing: bool) -> Result<()> {
        if name.is_empty() {
            return Err(ViewError::BadRegionName {
                op: RegionOp::Register,
            });
        }
        let parsed = match &selector {
            RegionSelector::Css(css) => Some(SelectorList::parse(css).map_err(ViewError::BadSelector)?),
            RegionSelector::Resolver(_) | RegionSelector::Detached => None,
        };

        {
            let mut regions = self.inner.regions.borrow_mut();
            match regions.get_mut(name) {
                Some(_) if !override_existing => {
                    return Err(ViewError::RegionOverride {
                        name: name.to_string(),
                    });
                }
                Some(region) if region.selector == selector => return Ok(()),
                Some(region) => {
                    region.selector = selector;
                    region.parsed = parsed;
                    region.element = None;
                }
                None => {
                    regions.insert(
                        name.to_string(),
                        Region {
                            selector,
                            parsed,
                            element: None,
                            views: Vec::new(),
                        },
                    );
                }
            }
        }

        tracing::debug!(region = name, override_existing, "region registered");
        if self.is_rendered() {
            self.mount_region(name)?;
        }
        Ok(())
    }

    pub fn has_region(&self, name: &str) -> bool {
        self.inner.regions.borrow().contains_key(name)
    }

    pub fn region_names(&self) -> Vec<String> {
        self.inner.regions.borrow().keys().cloned().collect()
    }

    pub fn region_element(&self, name: &str) -> Option<NodeId> {
        self.inner.regions.borrow().get(name)?.element
    }

    pub fn region_views(&self, name: &str) -> Vec<View> {
        self.inner
            .regions
            .borrow()
            .get(name)
            .map(|region| region.views.clone())
            .unwrap_or_default()
    }

    /// Resolve the region element and place every child in it
    fn mount_region(&self, name: &str) -> Result<()> {
        let Some(root) = self.inner.element.get() else {
            return Ok(());
        };
        let (element, views) = {
            let regions = self.inner.regions.borrow();
            let Some(region) = regions.get(name) else {
                return Ok(());
            };
            let element = match (&region.selector, &region.parsed) {
                (RegionSelector::Css(_), Some(parsed)) => {
                    self.inner.dom.query_selector_parsed(root, parsed)
                }
                (RegionSelector::Resolver(resolve), _) => resolve(&self.inner.dom, root),
                _ => None,
            };
            (element, region.views.clone())
        };

        if let Some(region) = self.inner.regions.borrow_mut().get_mut(name) {
            region.element = element;
        }
        for view in views {
            let child = view.render()?;
            match element {
                Some(element) => self.inner.dom.append_child(element, child)?,
                None => self.inner.dom.detach(child),
            }
        }
        Ok(())
    }

    fn region_lookup(&self, op: RegionOp, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(ViewError::BadRegionName { op });
        }
        if !self.has_region(name) {
            return Err(ViewError::NoRegion {
                op,
                name: name.to_string(),
            });
        }
        Ok(())
    }

    /// Add `child` to a region, at `index` or at the end
    pub fn add_child(&self, region: &str, child: &View, index: Option<usize>) -> Result<()> {
        self.region_lookup(RegionOp::AddChild, region)?;

        let (element, next) = {
            let mut regions = self.inner.regions.borrow_mut();
            let Some(entry) = regions.get_mut(region) else {
                return Ok(());
            };
            if entry.views.contains(child) {
                return Err(ViewError::DuplicateChild {
                    region: region.to_string(),
                });
            }
            let len = entry.views.len();
            let index = index.unwrap_or(len);
            if index > len {
                return Err(ViewError::ChildIndex { index, len });
            }
            entry.views.insert(index, child.clone());
            (entry.element, entry.views.get(index + 1).and_then(View::element))
        };

        if !self.is_rendered() {
            return Ok(());
        }
        let Some(element) = element else {
            return Ok(());
        };
        let node = child.render()?;
        let position = next.and_then(|next| {
            self.inner
                .dom
                .children(element)
                .iter()
                .position(|node| *node == next)
        });
        match position {
            Some(position) => self.inner.dom.insert_child(element, position, node)?,
            None => self.inner.dom.append_child(element, node)?,
        }
        Ok(())
    }

    /// Take `child` out of a region; its element is detached, not destroyed
    pub fn remove_child(&self, region: &str, child: &View) -> Result<()> {
        self.region_lookup(RegionOp::RemoveChild, region)?;
        {
            let mut regions = self.inner.regions.borrow_mut();
            let Some(entry) = regions.get_mut(region) else {
                return Ok(());
            };
            let Some(position) = entry.views.iter().position(|view| view == child) else {
                return Err(ViewError::ChildNotFound {
                    region: region.to_string(),
                });
            };
            entry.views.remove(position);
        }
        if let Some(node) = child.element() {
            self.inner.dom.detach(node);
        }
        Ok(())
    }

    pub fn get_child(&self, region: &str, index: usize) -> Result<Option<View>> {
        self.region_lookup(RegionOp::GetChild, region)?;
        Ok(self
            .inner
            .regions
            .borrow()
            .get(region)
            .and_then(|entry| entry.views.get(index).cloned()))
    }

    /// A collection destroyed together with this view
    pub fn create_collection(&self) -> ViewCollection {
        let collection = ViewCollection::new();
        self.inner
            .collections
            .borrow_mut()
            .push(collection.clone());
        collection
    }

    /// Tear down children, bindings and listeners, then free the element
    pub fn destroy(&self) {
        if self.is_destroyed() {
            return;
        }
        self.inner.state.set(ViewState::Destroyed);

        let hooks = self.inner.destroy_hooks.borrow_mut().split_off(0);
        for hook in hooks {
            hook(self);
        }
        self.inner.render_hooks.borrow_mut().clear();

        let regions = std::mem::take(&mut *self.inner.regions.borrow_mut());
        for (_, region) in regions {
            for view in region.views {
                view.destroy();
            }
        }

        let collections = std::mem::take(&mut *self.inner.collections.borrow_mut());
        for collection in collections {
            collection.destroy();
        }

        if let Some(mut rendered) = self.inner.rendered.borrow_mut().take() {
            rendered.release(&self.inner.dom);
            for view in rendered.views() {
                view.destroy();
            }
            for collection in rendered.collections() {
                collection.destroy();
            }
        }
        self.inner.template.borrow_mut().take();

        if let Some(element) = self.inner.element.get() {
            self.inner.dom.destroy_node(element);
        }

        self.inner.listeners.borrow_mut().stop_listening();
        if self.inner.owns_model {
            self.inner.model.destroy();
        }
        tracing::debug!("view destroyed");
    }

    /// Focus the root element
    pub fn focus(&self) {
        if let Some(element) = self.inner.element.get() {
            self.inner.dom.focus(element);
        }
    }

    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        Ok(self.inner.model.set(name, value)?)
    }

    pub fn get(&self, name: &str) -> Value {
        self.inner.model.get(name)
    }

    pub fn bind(&self, names: &[&str]) -> Result<BindChain> {
        Ok(self.inner.model.bind(names)?)
    }

    pub fn on<F>(&self, event: &str, callback: F) -> Subscription
    where
        F: Fn(&mut EventInfo, &[Value]) + 'static,
    {
        self.inner.model.on(event, callback)
    }

    pub fn fire(&self, event: &str, args: &[Value]) -> EventInfo {
        self.inner.model.fire(event, args)
    }

    /// Subscribe to `source`; released when the view is destroyed
    pub fn listen_to<F>(&self, source: &Emitter, event: &str, callback: F) -> Subscription
    where
        F: Fn(&mut EventInfo, &[Value]) + 'static,
    {
        self.inner
            .listeners
            .borrow_mut()
            .listen_to(source, event, callback)
    }

    pub fn stop_listening_to(&self, source: &Emitter) {
        self.inner
            .listeners
            .borrow_mut()
            .stop_listening_to(source.id());
    }
}

impl PartialEq for View {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("state", &self.inner.state.get())
            .field("element", &self.inner.element.get())
            .field("regions", &self.region_names())
            .finish()
    }
}

/// Non-owning view handle for closures the view itself keeps alive
#[derive(Clone)]
pub struct WeakView {
    inner: Weak<ViewInner>,
}

impl WeakView {
    pub fn upgrade(&self) -> Option<View> {
        self.inner.upgrade().map(|inner| View { inner })
    }
}

/// Widgets built on top of a [`View`]
pub trait AsView {
    fn view(&self) -> &View;

    fn render(&self) -> Result<NodeId> {
        self.view().render()
    }

    fn element(&self) -> Option<NodeId> {
        self.view().element()
    }

    fn destroy(&self) {
        self.view().destroy()
    }
}

impl AsView for View {
    fn view(&self) -> &View {
        self
    }
}
