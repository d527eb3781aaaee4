//! Declarative element templates
//!
//! A [`Template`] describes one element: tag, namespace, attribute values,
//! text, children and DOM event handlers. Rendering it against an
//! [`Observable`] produces live DOM. Bound values subscribe to
//! `change:<attribute>` on the model and patch the DOM in place.
//!
//! ```ignore
//! let template = Template::new("button")
//!     .attr("class", "ck-button")
//!     .attr("class", Bind::when_with("isEnabled", "ck-disabled", |v| !v.is_truthy()))
//!     .child(Template::new("span").text(Bind::to("label")))
//!     .on("click", "execute");
//! ```

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use lumen_core::{Observable, Subscription, Value, WeakObservable};
use smallvec::SmallVec;

use crate::collection::{MountAnchor, ViewCollection};
use crate::dom::{Dom, DomEvent, DomListenerId, NodeId, SelectorList, WeakDom, SVG_NAMESPACE};
use crate::error::{Result, ViewError};
use crate::view::View;

/// Value transform applied before a binding reaches the DOM
pub type Transform = Rc<dyn Fn(&Value) -> Value>;

/// Condition deciding whether an `if` binding is present
pub type Predicate = Rc<dyn Fn(&Value) -> bool>;

#[derive(Clone)]
pub enum BindMode {
    /// Render the (optionally transformed) attribute value
    To(Option<Transform>),
    /// Render `value_if_true` (or a bare attribute) when the condition holds
    If {
        value_if_true: Option<String>,
        predicate: Option<Predicate>,
    },
}

/// A template value tied to a model attribute
#[derive(Clone)]
pub struct AttributeBinding {
    pub attribute: String,
    pub mode: BindMode,
}

impl AttributeBinding {
    fn resolve(&self, model: &Observable) -> Resolved {
        let value = model.get(&self.attribute);
        match &self.mode {
            BindMode::To(transform) => {
                let value = match transform {
                    Some(transform) => transform(&value),
                    None => value,
                };
                if value.is_template_falsy() {
                    Resolved::Absent
                } else {
                    Resolved::Text(value.to_text())
                }
            }
            BindMode::If {
                value_if_true,
                predicate,
            } => {
                let holds = match predicate {
                    Some(predicate) => predicate(&value),
                    None => !value.is_template_falsy(),
                };
                match (holds, value_if_true) {
                    (false, _) => Resolved::Absent,
                    (true, Some(text)) if !text.is_empty() => Resolved::Text(text.clone()),
                    (true, _) => Resolved::Present,
                }
            }
        }
    }
}

impl fmt::Debug for AttributeBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match &self.mode {
            BindMode::To(_) => "to",
            BindMode::If { .. } => "if",
        };
        f.debug_struct("AttributeBinding")
            .field("attribute", &self.attribute)
            .field("mode", &mode)
            .finish()
    }
}

/// Binding constructors
pub struct Bind;

impl Bind {
    /// Follow the attribute value
    pub fn to(attribute: &str) -> AttributeBinding {
        AttributeBinding {
            attribute: attribute.to_string(),
            mode: BindMode::To(None),
        }
    }

    /// Follow the attribute value through `transform`
    pub fn to_with<F>(attribute: &str, transform: F) -> AttributeBinding
    where
        F: Fn(&Value) -> Value + 'static,
    {
        AttributeBinding {
            attribute: attribute.to_string(),
            mode: BindMode::To(Some(Rc::new(transform))),
        }
    }

    /// Render `value` while the attribute is truthy
    pub fn when(attribute: &str, value: &str) -> AttributeBinding {
        AttributeBinding {
            attribute: attribute.to_string(),
            mode: BindMode::If {
                value_if_true: Some(value.to_string()),
                predicate: None,
            },
        }
    }

    /// Render a value-less attribute while the attribute is truthy
    pub fn when_present(attribute: &str) -> AttributeBinding {
        AttributeBinding {
            attribute: attribute.to_string(),
            mode: BindMode::If {
                value_if_true: None,
                predicate: None,
            },
        }
    }

    /// Render `value` while `predicate` holds for the attribute
    pub fn when_with<F>(attribute: &str, value: &str, predicate: F) -> AttributeBinding
    where
        F: Fn(&Value) -> bool + 'static,
    {
        AttributeBinding {
            attribute: attribute.to_string(),
            mode: BindMode::If {
                value_if_true: Some(value.to_string()),
                predicate: Some(Rc::new(predicate)),
            },
        }
    }
}

/// One entry of an attribute or text value list
#[derive(Clone, Debug)]
pub enum TemplateValue {
    Literal(String),
    Bound(AttributeBinding),
}

impl TemplateValue {
    fn resolve(&self, model: &Observable) -> Resolved {
        match self {
            TemplateValue::Literal(text) => Resolved::Text(text.clone()),
            TemplateValue::Bound(binding) => binding.resolve(model),
        }
    }

    fn bound_attribute(&self) -> Option<&str> {
        match self {
            TemplateValue::Literal(_) => None,
            TemplateValue::Bound(binding) => Some(&binding.attribute),
        }
    }
}

impl From<&str> for TemplateValue {
    fn from(value: &str) -> Self {
        TemplateValue::Literal(value.to_string())
    }
}

impl From<String> for TemplateValue {
    fn from(value: String) -> Self {
        TemplateValue::Literal(value)
    }
}

impl From<AttributeBinding> for TemplateValue {
    fn from(binding: AttributeBinding) -> Self {
        TemplateValue::Bound(binding)
    }
}

enum Resolved {
    Text(String),
    Present,
    Absent,
}

/// Attribute value: `None` removes the attribute
fn join_attribute(parts: &[TemplateValue], model: &Observable) -> Option<String> {
    let mut any_present = false;
    let mut texts: SmallVec<[String; 4]> = SmallVec::new();
    for part in parts {
        match part.resolve(model) {
            Resolved::Text(text) => {
                any_present = true;
                if !text.is_empty() {
                    texts.push(text);
                }
            }
            Resolved::Present => any_present = true,
            Resolved::Absent => {}
        }
    }
    any_present.then(|| texts.join(" "))
}

fn join_text(parts: &[TemplateValue], model: &Observable) -> String {
    parts
        .iter()
        .filter_map(|part| match part.resolve(model) {
            Resolved::Text(text) => Some(text),
            Resolved::Present | Resolved::Absent => None,
        })
        .collect()
}

/// Handler attached to a DOM event of a template element
#[derive(Clone)]
pub enum EventHandler {
    /// Fire the named event on the model with a [`DomEventInfo`] payload
    Emit(String),
    Call(Rc<dyn Fn(&mut DomEvent)>),
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventHandler::Emit(name) => f.debug_tuple("Emit").field(name).finish(),
            EventHandler::Call(_) => f.write_str("Call(..)"),
        }
    }
}

/// Payload of model events re-emitted from the DOM
#[derive(Clone, Debug, PartialEq)]
pub struct DomEventInfo {
    pub event_type: String,
    pub target: NodeId,
}

#[derive(Clone, Debug)]
pub enum TemplateChild {
    Element(Template),
    Text(Vec<TemplateValue>),
    View(View),
    /// Live placeholder: the collection's views are mounted at this position
    Collection(ViewCollection),
}

/// Description of an element and its subtree
#[derive(Clone, Debug, Default)]
pub struct Template {
    tag: String,
    namespace: Option<String>,
    attributes: IndexMap<String, Vec<TemplateValue>>,
    text: Vec<TemplateValue>,
    children: Vec<TemplateChild>,
    on: IndexMap<String, Vec<EventHandler>>,
}

impl Template {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            ..Default::default()
        }
    }

    /// An element in the SVG namespace
    pub fn svg(tag: &str) -> Self {
        Self::new(tag).namespace(SVG_NAMESPACE)
    }

    /// A tagless template carrying additions for [`Template::extend`]
    pub fn extension() -> Self {
        Self::default()
    }

    pub fn namespace(mut self, namespace: &str) -> Self {
        self.namespace = Some(namespace.to_string());
        self
    }

    /// Append a value to an attribute; repeated values are space-joined
    pub fn attr(mut self, name: &str, value: impl Into<TemplateValue>) -> Self {
        self.attributes
            .entry(name.to_string())
            .or_default()
            .push(value.into());
        self
    }

    pub fn text(mut self, value: impl Into<TemplateValue>) -> Self {
        self.text.push(value.into());
        self
    }

    pub fn child(mut self, child: Template) -> Self {
        self.children.push(TemplateChild::Element(child));
        self
    }

    pub fn text_child(mut self, value: impl Into<TemplateValue>) -> Self {
        self.children.push(TemplateChild::Text(vec![value.into()]));
        self
    }

    pub fn view(mut self, view: &View) -> Self {
        self.children.push(TemplateChild::View(view.clone()));
        self
    }

    pub fn collection(mut self, collection: &ViewCollection) -> Self {
        self.children
            .push(TemplateChild::Collection(collection.clone()));
        self
    }

    /// Re-emit a DOM event as a model event
    ///
    /// `event` is `type` or `type@selector`; with a selector only events
    /// whose target matches it are handled.
    pub fn on(mut self, event: &str, emit: &str) -> Self {
        self.on
            .entry(event.to_string())
            .or_default()
            .push(EventHandler::Emit(emit.to_string()));
        self
    }

    pub fn on_call<F>(mut self, event: &str, callback: F) -> Self
    where
        F: Fn(&mut DomEvent) + 'static,
    {
        self.on
            .entry(event.to_string())
            .or_default()
            .push(EventHandler::Call(Rc::new(callback)));
        self
    }

    /// Merge attribute values, text, children and handlers of `extension`
    pub fn extend(&mut self, extension: Template) {
        for (name, values) in extension.attributes {
            self.attributes.entry(name).or_default().extend(values);
        }
        self.text.extend(extension.text);
        self.children.extend(extension.children);
        for (event, handlers) in extension.on {
            self.on.entry(event).or_default().extend(handlers);
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attribute_values(&self, name: &str) -> &[TemplateValue] {
        self.attributes.get(name).map_or(&[], Vec::as_slice)
    }

    pub fn children(&self) -> &[TemplateChild] {
        &self.children
    }

    /// Build the element and wire its bindings to `model`
    pub fn render(&self, dom: &Dom, model: &Observable) -> Result<RenderedTemplate> {
        let mut rendered = RenderedTemplate::default();
        match self.render_element(dom, model, None, &mut rendered) {
            Ok(root) => {
                rendered.root = Some(root);
                tracing::trace!(tag = %self.tag, bindings = rendered.subscriptions.len(), "template rendered");
                Ok(rendered)
            }
            Err(err) => {
                rendered.discard(dom);
                Err(err)
            }
        }
    }

    fn render_element(
        &self,
        dom: &Dom,
        model: &Observable,
        inherited_namespace: Option<&str>,
        rendered: &mut RenderedTemplate,
    ) -> Result<NodeId> {
        let namespace = self.namespace.as_deref().or(inherited_namespace);
        let node = dom.create_element_ns(&self.tag, namespace);
        if let Err(err) = self.fill_element(dom, model, node, namespace, rendered) {
            rendered.partial.push(node);
            return Err(err);
        }
        Ok(node)
    }

    fn fill_element(
        &self,
        dom: &Dom,
        model: &Observable,
        node: NodeId,
        namespace: Option<&str>,
        rendered: &mut RenderedTemplate,
    ) -> Result<()> {
        for (name, parts) in &self.attributes {
            let updater = Rc::new(Updater {
                dom: dom.downgrade(),
                model: model.downgrade(),
                node,
                target: UpdateTarget::Attribute(name.clone()),
                parts: parts.clone(),
            });
            updater.apply_to(dom, model);
            updater.subscribe(model, rendered);
        }

        if !self.text.is_empty() {
            let updater = Rc::new(Updater {
                dom: dom.downgrade(),
                model: model.downgrade(),
                node,
                target: UpdateTarget::ElementText,
                parts: self.text.clone(),
            });
            updater.apply_to(dom, model);
            updater.subscribe(model, rendered);
        }

        let mut previous = None;
        for child in &self.children {
            match child {
                TemplateChild::Element(template) => {
                    let child = template.render_element(dom, model, namespace, rendered)?;
                    dom.append_child(node, child)?;
                    previous = Some(MountAnchor::Node(child));
                }
                TemplateChild::Text(parts) => {
                    let text = dom.create_text("");
                    let updater = Rc::new(Updater {
                        dom: dom.downgrade(),
                        model: model.downgrade(),
                        node: text,
                        target: UpdateTarget::TextNode,
                        parts: parts.clone(),
                    });
                    updater.apply_to(dom, model);
                    updater.subscribe(model, rendered);
                    dom.append_child(node, text)?;
                    previous = Some(MountAnchor::Node(text));
                }
                TemplateChild::View(view) => {
                    let element = view.render()?;
                    dom.append_child(node, element)?;
                    rendered.views.push(view.clone());
                    previous = Some(MountAnchor::Node(element));
                }
                TemplateChild::Collection(collection) => {
                    collection.mount(dom, node, previous.take())?;
                    rendered.collections.push(collection.clone());
                    previous = Some(MountAnchor::Collection(collection.downgrade()));
                }
            }
        }

        for (key, handlers) in &self.on {
            let (event_type, selector) = match key.split_once('@') {
                Some((event_type, selector)) => (
                    event_type,
                    Some(SelectorList::parse(selector).map_err(ViewError::EventSelector)?),
                ),
                None => (key.as_str(), None),
            };
            let weak_dom = dom.downgrade();
            let weak_model = model.downgrade();
            let handlers = handlers.clone();
            let id = dom.add_event_listener(node, event_type, move |event| {
                if let Some(selector) = &selector {
                    let Some(dom) = weak_dom.upgrade() else {
                        return;
                    };
                    if !dom.matches(event.target, selector) {
                        return;
                    }
                }
                for handler in &handlers {
                    match handler {
                        EventHandler::Emit(name) => {
                            let Some(model) = weak_model.upgrade() else {
                                continue;
                            };
                            let info = DomEventInfo {
                                event_type: event.event_type.clone(),
                                target: event.target,
                            };
                            model.fire(name, &[Value::opaque(info)]);
                        }
                        EventHandler::Call(callback) => callback(event),
                    }
                }
            });
            rendered.dom_listeners.push(id);
        }

        Ok(())
    }
}

enum UpdateTarget {
    Attribute(String),
    /// Replaces every child of the element, bound or not
    ElementText,
    TextNode,
}

struct Updater {
    dom: WeakDom,
    model: WeakObservable,
    node: NodeId,
    target: UpdateTarget,
    parts: Vec<TemplateValue>,
}

impl Updater {
    fn apply(&self) {
        let (Some(dom), Some(model)) = (self.dom.upgrade(), self.model.upgrade()) else {
            return;
        };
        self.apply_to(&dom, &model);
    }

    fn apply_to(&self, dom: &Dom, model: &Observable) {
        let outcome = match &self.target {
            UpdateTarget::Attribute(name) => match join_attribute(&self.parts, model) {
                Some(value) => dom.set_attribute(self.node, name, &value),
                None => {
                    dom.remove_attribute(self.node, name);
                    Ok(())
                }
            },
            UpdateTarget::ElementText => {
                dom.set_text_content(self.node, &join_text(&self.parts, model))
            }
            UpdateTarget::TextNode => dom.set_text(self.node, &join_text(&self.parts, model)),
        };
        if let Err(err) = outcome {
            tracing::warn!(error = %err, "template update skipped");
        }
    }

    fn subscribe(self: &Rc<Self>, model: &Observable, rendered: &mut RenderedTemplate) {
        let mut seen: SmallVec<[&str; 4]> = SmallVec::new();
        for attribute in self.parts.iter().filter_map(TemplateValue::bound_attribute) {
            if seen.contains(&attribute) {
                continue;
            }
            seen.push(attribute);
            let updater = Rc::clone(self);
            let subscription = model.on(&format!("change:{attribute}"), move |_, _| {
                tracing::trace!(node = ?updater.node, "binding update");
                updater.apply();
            });
            rendered.subscriptions.push(subscription);
        }
    }
}

/// Result of [`Template::render`]: the root node plus everything that
/// keeps it live
#[derive(Debug, Default)]
pub struct RenderedTemplate {
    root: Option<NodeId>,
    subscriptions: Vec<Subscription>,
    dom_listeners: Vec<DomListenerId>,
    views: Vec<View>,
    collections: Vec<ViewCollection>,
    /// Elements of a failed render, innermost first
    partial: Vec<NodeId>,
}

impl RenderedTemplate {
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Views embedded directly in the template
    pub fn views(&self) -> &[View] {
        &self.views
    }

    pub fn collections(&self) -> &[ViewCollection] {
        &self.collections
    }

    pub fn binding_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Cancel model subscriptions, remove DOM listeners and unmount collections
    pub fn release(&mut self, dom: &Dom) {
        for subscription in self.subscriptions.drain(..) {
            subscription.cancel();
        }
        for id in self.dom_listeners.drain(..) {
            dom.remove_event_listener(id);
        }
        for collection in &self.collections {
            collection.unmount();
        }
    }

    /// Undo a render that failed halfway
    fn discard(&mut self, dom: &Dom) {
        self.release(dom);
        for element in self.views.drain(..).filter_map(|view| view.element()) {
            dom.detach(element);
        }
        self.collections.clear();
        for node in self.partial.drain(..) {
            dom.destroy_node(node);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn model(pairs: &[(&str, Value)]) -> Observable {
        Observable::with_attributes(pairs.iter().map(|(k, v)| (k.to_string(), v.clone())))
    }

    #[test]
    fn test_literal_render() {
        let dom = Dom::new();
        let rendered = Template::new("p")
            .attr("class", "a")
            .attr("class", "b")
            .text("abc")
            .render(&dom, &Observable::new())
            .unwrap();
        assert_eq!(
            dom.outer_html(rendered.root().unwrap()),
            "<p class=\"a b\">abc</p>"
        );
        assert_eq!(rendered.binding_count(), 0);
    }

    #[test]
    fn test_class_list_bindings() {
        let dom = Dom::new();
        let m = model(&[("isOn", Value::from(false)), ("isEnabled", Value::from(true))]);
        let rendered = Template::new("a")
            .attr("class", "ck-button")
            .attr("class", Bind::when("isOn", "ck-on"))
            .attr("class", Bind::when_with("isEnabled", "ck-disabled", |v| !v.is_truthy()))
            .render(&dom, &m)
            .unwrap();
        let root = rendered.root().unwrap();
        assert_eq!(dom.get_attribute(root, "class").as_deref(), Some("ck-button"));

        m.set("isOn", true).unwrap();
        m.set("isEnabled", false).unwrap();
        assert_eq!(
            dom.get_attribute(root, "class").as_deref(),
            Some("ck-button ck-on ck-disabled")
        );
    }

    #[test]
    fn test_falsy_binding_removes_attribute() {
        let dom = Dom::new();
        let m = model(&[("title", Value::from("t")), ("tabindex", Value::from(0))]);
        let rendered = Template::new("a")
            .attr("title", Bind::to("title"))
            .attr("tabindex", Bind::to("tabindex"))
            .attr("disabled", Bind::when_present("title"))
            .render(&dom, &m)
            .unwrap();
        let root = rendered.root().unwrap();
        assert_eq!(dom.get_attribute(root, "tabindex").as_deref(), Some("0"));
        assert_eq!(dom.get_attribute(root, "disabled").as_deref(), Some(""));

        m.set("title", "").unwrap();
        assert!(!dom.has_attribute(root, "title"));
        assert!(!dom.has_attribute(root, "disabled"));
    }

    #[test]
    fn test_svg_namespace_inherited() {
        let dom = Dom::new();
        let rendered = Template::svg("svg")
            .child(Template::new("g"))
            .child(Template::new("foreignObject").namespace("urn:x"))
            .render(&dom, &Observable::new())
            .unwrap();
        let children = dom.children(rendered.root().unwrap());
        assert_eq!(dom.namespace(children[0]).as_deref(), Some(SVG_NAMESPACE));
        assert_eq!(dom.namespace(children[1]).as_deref(), Some("urn:x"));
    }

    #[test]
    fn test_text_child_binding_keeps_siblings() {
        let dom = Dom::new();
        let m = model(&[("label", Value::from("Bold"))]);
        let rendered = Template::new("p")
            .text_child(Bind::to("label"))
            .child(Template::new("i"))
            .render(&dom, &m)
            .unwrap();
        m.set("label", "Italic").unwrap();
        assert_eq!(dom.outer_html(rendered.root().unwrap()), "<p>Italic<i></i></p>");
    }

    #[test]
    fn test_extend_merges() {
        let dom = Dom::new();
        let mut template = Template::new("div").attr("class", "ck-toolbar");
        template.extend(
            Template::extension()
                .attr("class", "ck-toolbar_floating")
                .child(Template::new("span")),
        );
        let rendered = template.render(&dom, &Observable::new()).unwrap();
        assert_eq!(
            dom.outer_html(rendered.root().unwrap()),
            "<div class=\"ck-toolbar ck-toolbar_floating\"><span></span></div>"
        );
    }

    #[test]
    fn test_release_stops_updates_and_events() {
        let dom = Dom::new();
        let m = model(&[("foo", Value::from("a"))]);
        let calls = Rc::new(RefCell::new(0));
        let calls_clone = calls.clone();
        let mut rendered = Template::new("p")
            .attr("class", Bind::to("foo"))
            .on_call("x", move |_| *calls_clone.borrow_mut() += 1)
            .render(&dom, &m)
            .unwrap();
        let root = rendered.root().unwrap();

        rendered.release(&dom);
        m.set("foo", "b").unwrap();
        dom.dispatch_event(root, "x");
        assert_eq!(dom.get_attribute(root, "class").as_deref(), Some("a"));
        assert_eq!(*calls.borrow(), 0);
    }

    #[test]
    fn test_bad_event_selector() {
        let dom = Dom::new();
        let err = Template::new("p")
            .on("x@[", "a")
            .render(&dom, &Observable::new())
            .unwrap_err();
        assert_eq!(err.code(), "ui-template-badselector");
    }

    #[test]
    fn test_failed_render_leaves_nothing_behind() {
        let dom = Dom::new();
        let m = model(&[("foo", Value::from("a"))]);
        let err = Template::new("div")
            .attr("class", Bind::to("foo"))
            .child(Template::new("span").text(Bind::to("foo")).on("x@[", "y"))
            .render(&dom, &m)
            .unwrap_err();

        assert_eq!(err.code(), "ui-template-badselector");
        assert_eq!(m.emitter().listener_count("change:foo"), 0);
        assert!(dom.is_empty());
    }

    #[test]
    fn test_collections_follow_their_placeholders() {
        let dom = Dom::new();
        let first = ViewCollection::new();
        let second = ViewCollection::new();
        let rendered = Template::new("div")
            .collection(&first)
            .child(Template::new("hr"))
            .collection(&second)
            .render(&dom, &Observable::new())
            .unwrap();
        let root = rendered.root().unwrap();

        let item = |tag: &str| {
            let view = View::new(&dom);
            view.set_template(Template::new(tag)).unwrap();
            view
        };
        second.add(&item("b1")).unwrap();
        first.add(&item("a1")).unwrap();
        second.add(&item("b2")).unwrap();
        first.add(&item("a2")).unwrap();
        assert_eq!(
            dom.inner_html(root),
            "<a1></a1><a2></a2><hr></hr><b1></b1><b2></b2>"
        );
    }
}
