//! In-memory DOM
//!
//! A slotmap arena of element and text nodes with the subset of DOM
//! behaviour views rely on: namespaced elements, ordered attributes,
//! selector queries, bubbling event dispatch with `preventDefault`, focus
//! tracking and HTML serialisation.
//!
//! [`Dom`] is a cheaply clonable handle. No internal borrow is held while
//! event listeners run, so listeners may mutate the tree.

mod markup;
mod selector;

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;
use thiserror::Error;

pub use markup::{MarkupError, SvgFragment};
pub use selector::{
    Combinator, ComplexSelector, CompoundSelector, SelectorError, SelectorList, SelectorPart,
};

/// Namespace of SVG elements
pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

new_key_type! {
    /// Identifier of a DOM node
    pub struct NodeId;

    /// Identifier of a DOM event listener
    pub struct DomListenerId;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    #[error("node does not exist")]
    NodeNotFound,

    #[error("node is not an element")]
    NotAnElement,

    #[error("cannot insert a node into itself or its descendant")]
    HierarchyRequest,

    #[error("child index {index} out of bounds (len {len})")]
    IndexOutOfBounds { index: usize, len: usize },
}

/// Element payload
#[derive(Debug, Clone, PartialEq)]
pub struct ElementData {
    pub tag: String,
    pub namespace: Option<String>,
    pub attributes: IndexMap<String, String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Element(ElementData),
    Text(String),
}

#[derive(Debug)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// An event travelling through the tree
#[derive(Debug, Clone)]
pub struct DomEvent {
    pub event_type: String,
    pub target: NodeId,
    pub current_target: NodeId,
    default_prevented: bool,
    propagation_stopped: bool,
}

impl DomEvent {
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }

    /// Stop bubbling after the listeners of the current node
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

type DomListener = Rc<dyn Fn(&mut DomEvent)>;

struct ListenerEntry {
    node: NodeId,
    event_type: String,
    callback: DomListener,
}

#[derive(Default)]
struct DomInner {
    nodes: SlotMap<NodeId, Node>,
    listeners: SlotMap<DomListenerId, ListenerEntry>,
    by_node: FxHashMap<NodeId, SmallVec<[DomListenerId; 2]>>,
    focused: Option<NodeId>,
}

impl DomInner {
    fn element(&self, node: NodeId) -> Option<&ElementData> {
        match &self.nodes.get(node)?.kind {
            NodeKind::Element(data) => Some(data),
            NodeKind::Text(_) => None,
        }
    }

    fn element_mut(&mut self, node: NodeId) -> Result<&mut ElementData, DomError> {
        match &mut self.nodes.get_mut(node).ok_or(DomError::NodeNotFound)?.kind {
            NodeKind::Element(data) => Ok(data),
            NodeKind::Text(_) => Err(DomError::NotAnElement),
        }
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeId, mut node: NodeId) -> bool {
        loop {
            if node == ancestor {
                return true;
            }
            match self.nodes.get(node).and_then(|n| n.parent) {
                Some(parent) => node = parent,
                None => return false,
            }
        }
    }

    fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.nodes.get_mut(node).and_then(|n| n.parent.take()) else {
            return;
        };
        if let Some(parent) = self.nodes.get_mut(parent) {
            parent.children.retain(|child| *child != node);
        }
    }

    fn insert(&mut self, parent: NodeId, index: Option<usize>, child: NodeId) -> Result<(), DomError> {
        if !self.nodes.contains_key(child) {
            return Err(DomError::NodeNotFound);
        }
        self.element(parent).ok_or_else(|| {
            if self.nodes.contains_key(parent) {
                DomError::NotAnElement
            } else {
                DomError::NodeNotFound
            }
        })?;
        if self.is_inclusive_ancestor(child, parent) {
            return Err(DomError::HierarchyRequest);
        }

        let reparenting = self.nodes[child].parent == Some(parent);
        let len = self.nodes[parent].children.len() - usize::from(reparenting);
        let index = index.unwrap_or(len);
        if index > len {
            return Err(DomError::IndexOutOfBounds { index, len });
        }

        self.detach(child);
        self.nodes[parent].children.insert(index, child);
        self.nodes[child].parent = Some(parent);
        Ok(())
    }

    fn remove_subtree(&mut self, node: NodeId) {
        self.detach(node);
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            if let Some(removed) = self.nodes.remove(id) {
                stack.extend(removed.children);
            }
            if let Some(listeners) = self.by_node.remove(&id) {
                for listener in listeners {
                    self.listeners.remove(listener);
                }
            }
            if self.focused == Some(id) {
                self.focused = None;
            }
        }
    }

    fn text_content(&self, node: NodeId, out: &mut String) {
        let Some(n) = self.nodes.get(node) else {
            return;
        };
        match &n.kind {
            NodeKind::Text(text) => out.push_str(text),
            NodeKind::Element(_) => {
                for child in &n.children {
                    self.text_content(*child, out);
                }
            }
        }
    }

    fn matches_compound(&self, node: NodeId, compound: &CompoundSelector) -> bool {
        let Some(element) = self.element(node) else {
            return false;
        };
        compound.parts.iter().all(|part| match part {
            SelectorPart::Universal => true,
            SelectorPart::Type(tag) => element.tag.eq_ignore_ascii_case(tag),
            SelectorPart::Id(id) => element.attributes.get("id") == Some(id),
            SelectorPart::Class(class) => element
                .attributes
                .get("class")
                .is_some_and(|classes| classes.split_whitespace().any(|c| c == class)),
            SelectorPart::Attribute { name, value } => match value {
                Some(value) => element.attributes.get(name) == Some(value),
                None => element.attributes.contains_key(name),
            },
        })
    }

    fn matches_from(&self, node: NodeId, selector: &ComplexSelector, index: usize) -> bool {
        let (compound, _) = &selector.segments[index];
        if !self.matches_compound(node, compound) {
            return false;
        }
        if index == 0 {
            return true;
        }

        let combinator = selector.segments[index - 1].1;
        let mut ancestor = self.nodes.get(node).and_then(|n| n.parent);
        while let Some(candidate) = ancestor {
            if self.matches_from(candidate, selector, index - 1) {
                return true;
            }
            if combinator == Some(Combinator::Child) {
                return false;
            }
            ancestor = self.nodes.get(candidate).and_then(|n| n.parent);
        }
        false
    }

    fn matches(&self, node: NodeId, list: &SelectorList) -> bool {
        list.selectors.iter().any(|selector| {
            !selector.segments.is_empty()
                && self.matches_from(node, selector, selector.segments.len() - 1)
        })
    }

    /// Descendants of `root` in document order, excluding `root`
    fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self
            .nodes
            .get(root)
            .map(|n| n.children.iter().rev().copied().collect())
            .unwrap_or_default();
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(n) = self.nodes.get(id) {
                stack.extend(n.children.iter().rev().copied());
            }
        }
        out
    }

    fn serialize(&self, node: NodeId, out: &mut String) {
        let Some(n) = self.nodes.get(node) else {
            return;
        };
        match &n.kind {
            NodeKind::Text(text) => escape_into(text, false, out),
            NodeKind::Element(element) => {
                out.push('<');
                out.push_str(&element.tag);
                for (name, value) in &element.attributes {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    escape_into(value, true, out);
                    out.push('"');
                }
                out.push('>');
                for child in &n.children {
                    self.serialize(*child, out);
                }
                out.push_str("</");
                out.push_str(&element.tag);
                out.push('>');
            }
        }
    }
}

fn escape_into(text: &str, attribute: bool, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

/// Shared handle to a DOM arena
#[derive(Clone, Default)]
pub struct Dom {
    inner: Rc<RefCell<DomInner>>,
}

impl Dom {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn downgrade(&self) -> WeakDom {
        WeakDom {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn create_element(&self, tag: &str) -> NodeId {
        self.create_element_ns(tag, None)
    }

    pub fn create_element_ns(&self, tag: &str, namespace: Option<&str>) -> NodeId {
        self.inner.borrow_mut().nodes.insert(Node {
            kind: NodeKind::Element(ElementData {
                tag: tag.to_string(),
                namespace: namespace.map(str::to_string),
                attributes: IndexMap::new(),
            }),
            parent: None,
            children: Vec::new(),
        })
    }

    pub fn create_text(&self, text: &str) -> NodeId {
        self.inner.borrow_mut().nodes.insert(Node {
            kind: NodeKind::Text(text.to_string()),
            parent: None,
            children: Vec::new(),
        })
    }

    /// Whether the node is still alive in the arena
    pub fn exists(&self, node: NodeId) -> bool {
        self.inner.borrow().nodes.contains_key(node)
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().nodes.is_empty()
    }

    pub fn append_child(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.inner.borrow_mut().insert(parent, None, child)
    }

    pub fn insert_child(&self, parent: NodeId, index: usize, child: NodeId) -> Result<(), DomError> {
        self.inner.borrow_mut().insert(parent, Some(index), child)
    }

    /// Remove a node from its parent, keeping it in the arena
    pub fn detach(&self, node: NodeId) {
        self.inner.borrow_mut().detach(node);
    }

    /// Remove a node and its descendants from the arena
    pub fn destroy_node(&self, node: NodeId) {
        self.inner.borrow_mut().remove_subtree(node);
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.inner.borrow().nodes.get(node)?.parent
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.inner
            .borrow()
            .nodes
            .get(node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    pub fn child_count(&self, node: NodeId) -> usize {
        self.inner
            .borrow()
            .nodes
            .get(node)
            .map_or(0, |n| n.children.len())
    }

    /// Position of `child` among the children of `parent`
    pub fn child_index(&self, parent: NodeId, child: NodeId) -> Option<usize> {
        self.inner
            .borrow()
            .nodes
            .get(parent)?
            .children
            .iter()
            .position(|id| *id == child)
    }

    /// Whether `node` is `ancestor` or one of its descendants
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.inner.borrow().is_inclusive_ancestor(ancestor, node)
    }

    pub fn kind(&self, node: NodeId) -> Option<NodeKind> {
        self.inner.borrow().nodes.get(node).map(|n| n.kind.clone())
    }

    pub fn is_element(&self, node: NodeId) -> bool {
        self.inner.borrow().element(node).is_some()
    }

    pub fn tag_name(&self, node: NodeId) -> Option<String> {
        self.inner.borrow().element(node).map(|e| e.tag.clone())
    }

    pub fn namespace(&self, node: NodeId) -> Option<String> {
        self.inner.borrow().element(node)?.namespace.clone()
    }

    pub fn set_attribute(&self, node: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        let mut inner = self.inner.borrow_mut();
        let element = inner.element_mut(node)?;
        match element.attributes.get_mut(name) {
            Some(current) => {
                if current != value {
                    *current = value.to_string();
                }
            }
            None => {
                element.attributes.insert(name.to_string(), value.to_string());
            }
        }
        Ok(())
    }

    pub fn get_attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.inner.borrow().element(node)?.attributes.get(name).cloned()
    }

    pub fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.inner
            .borrow()
            .element(node)
            .is_some_and(|e| e.attributes.contains_key(name))
    }

    pub fn remove_attribute(&self, node: NodeId, name: &str) {
        if let Ok(element) = self.inner.borrow_mut().element_mut(node) {
            element.attributes.shift_remove(name);
        }
    }

    pub fn attribute_names(&self, node: NodeId) -> Vec<String> {
        self.inner
            .borrow()
            .element(node)
            .map(|e| e.attributes.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn class_list(&self, node: NodeId) -> Vec<String> {
        self.get_attribute(node, "class")
            .map(|classes| classes.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.class_list(node).iter().any(|c| c == class)
    }

    /// Data of a text node
    pub fn text(&self, node: NodeId) -> Option<String> {
        match &self.inner.borrow().nodes.get(node)?.kind {
            NodeKind::Text(text) => Some(text.clone()),
            NodeKind::Element(_) => None,
        }
    }

    /// Replace the data of a text node
    pub fn set_text(&self, node: NodeId, text: &str) -> Result<(), DomError> {
        let mut inner = self.inner.borrow_mut();
        match &mut inner.nodes.get_mut(node).ok_or(DomError::NodeNotFound)?.kind {
            NodeKind::Text(data) => {
                *data = text.to_string();
                Ok(())
            }
            NodeKind::Element(_) => Err(DomError::NotAnElement),
        }
    }

    /// Replace everything inside `node` with a single text node
    ///
    /// Previous children are destroyed, not detached. An empty string
    /// leaves the element empty.
    pub fn set_text_content(&self, node: NodeId, text: &str) -> Result<(), DomError> {
        if self.text(node).is_some() {
            return self.set_text(node, text);
        }
        let children = {
            let inner = self.inner.borrow();
            inner.element(node).ok_or(DomError::NodeNotFound)?;
            inner.nodes[node].children.clone()
        };
        {
            let mut inner = self.inner.borrow_mut();
            for child in children {
                inner.remove_subtree(child);
            }
        }
        if !text.is_empty() {
            let text_node = self.create_text(text);
            self.append_child(node, text_node)?;
        }
        Ok(())
    }

    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.inner.borrow().text_content(node, &mut out);
        out
    }

    pub fn matches(&self, node: NodeId, selector: &SelectorList) -> bool {
        self.inner.borrow().matches(node, selector)
    }

    /// First descendant of `root` matching `selector`
    pub fn query_selector(&self, root: NodeId, selector: &str) -> Result<Option<NodeId>, SelectorError> {
        let list = SelectorList::parse(selector)?;
        Ok(self.query_selector_parsed(root, &list))
    }

    pub fn query_selector_parsed(&self, root: NodeId, selector: &SelectorList) -> Option<NodeId> {
        let inner = self.inner.borrow();
        inner
            .descendants(root)
            .into_iter()
            .find(|node| inner.matches(*node, selector))
    }

    pub fn query_selector_all(&self, root: NodeId, selector: &str) -> Result<Vec<NodeId>, SelectorError> {
        let list = SelectorList::parse(selector)?;
        let inner = self.inner.borrow();
        Ok(inner
            .descendants(root)
            .into_iter()
            .filter(|node| inner.matches(*node, &list))
            .collect())
    }

    pub fn add_event_listener<F>(&self, node: NodeId, event_type: &str, callback: F) -> DomListenerId
    where
        F: Fn(&mut DomEvent) + 'static,
    {
        let mut inner = self.inner.borrow_mut();
        let id = inner.listeners.insert(ListenerEntry {
            node,
            event_type: event_type.to_string(),
            callback: Rc::new(callback),
        });
        inner.by_node.entry(node).or_default().push(id);
        id
    }

    pub fn remove_event_listener(&self, id: DomListenerId) {
        let mut inner = self.inner.borrow_mut();
        if let Some(entry) = inner.listeners.remove(id) {
            if let Some(ids) = inner.by_node.get_mut(&entry.node) {
                ids.retain(|other| *other != id);
            }
        }
    }

    pub fn listener_count(&self, node: NodeId) -> usize {
        self.inner
            .borrow()
            .by_node
            .get(&node)
            .map_or(0, |ids| ids.len())
    }

    /// Dispatch a bubbling event at `target`
    ///
    /// Returns `false` when a listener prevented the default action.
    pub fn dispatch_event(&self, target: NodeId, event_type: &str) -> bool {
        let path: Vec<NodeId> = {
            let inner = self.inner.borrow();
            let mut path = Vec::new();
            let mut current = inner.nodes.contains_key(target).then_some(target);
            while let Some(node) = current {
                path.push(node);
                current = inner.nodes.get(node).and_then(|n| n.parent);
            }
            path
        };

        let mut event = DomEvent {
            event_type: event_type.to_string(),
            target,
            current_target: target,
            default_prevented: false,
            propagation_stopped: false,
        };

        for node in path {
            let callbacks: SmallVec<[(DomListenerId, DomListener); 2]> = {
                let inner = self.inner.borrow();
                inner
                    .by_node
                    .get(&node)
                    .map(|ids| {
                        ids.iter()
                            .filter_map(|id| {
                                let entry = inner.listeners.get(*id)?;
                                (entry.event_type == event_type)
                                    .then(|| (*id, entry.callback.clone()))
                            })
                            .collect()
                    })
                    .unwrap_or_default()
            };

            event.current_target = node;
            for (id, callback) in callbacks {
                if !self.inner.borrow().listeners.contains_key(id) {
                    continue;
                }
                callback(&mut event);
            }
            if event.propagation_stopped {
                break;
            }
        }

        tracing::trace!(event_type, prevented = event.default_prevented, "dom event dispatched");
        !event.default_prevented
    }

    pub fn focus(&self, node: NodeId) {
        if self.exists(node) {
            self.inner.borrow_mut().focused = Some(node);
        }
    }

    pub fn blur(&self) {
        self.inner.borrow_mut().focused = None;
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.inner.borrow().focused
    }

    pub fn outer_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.inner.borrow().serialize(node, &mut out);
        out
    }

    pub fn inner_html(&self, node: NodeId) -> String {
        let inner = self.inner.borrow();
        let mut out = String::new();
        if let Some(n) = inner.nodes.get(node) {
            for child in &n.children {
                inner.serialize(*child, &mut out);
            }
        }
        out
    }
}

/// Non-owning DOM handle, held by closures the DOM itself may own
#[derive(Clone)]
pub struct WeakDom {
    inner: Weak<RefCell<DomInner>>,
}

impl WeakDom {
    pub fn upgrade(&self) -> Option<Dom> {
        self.inner.upgrade().map(|inner| Dom { inner })
    }
}

impl PartialEq for Dom {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Dom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dom").field("nodes", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn list(dom: &Dom) -> (NodeId, NodeId, NodeId) {
        let ul = dom.create_element("ul");
        let li = dom.create_element("li");
        let span = dom.create_element("span");
        dom.set_attribute(li, "class", "ck-list__item active").unwrap();
        dom.set_attribute(span, "id", "label").unwrap();
        dom.append_child(ul, li).unwrap();
        dom.append_child(li, span).unwrap();
        (ul, li, span)
    }

    #[test]
    fn test_tree_structure() {
        let dom = Dom::new();
        let (ul, li, span) = list(&dom);

        assert_eq!(dom.children(ul), vec![li]);
        assert_eq!(dom.parent(span), Some(li));
        assert!(dom.contains(ul, span));
        assert!(!dom.contains(span, ul));

        let first = dom.create_element("li");
        dom.insert_child(ul, 0, first).unwrap();
        assert_eq!(dom.children(ul), vec![first, li]);

        assert_eq!(
            dom.insert_child(ul, 5, dom.create_element("li")),
            Err(DomError::IndexOutOfBounds { index: 5, len: 2 })
        );
        assert_eq!(dom.append_child(span, ul), Err(DomError::HierarchyRequest));

        dom.detach(li);
        assert_eq!(dom.children(ul), vec![first]);
        assert!(dom.exists(li));
    }

    #[test]
    fn test_bad_index_keeps_child_in_place() {
        let dom = Dom::new();
        let (ul, li, span) = list(&dom);
        let other = dom.create_element("ol");

        assert_eq!(
            dom.insert_child(other, 1, li),
            Err(DomError::IndexOutOfBounds { index: 1, len: 0 })
        );
        assert_eq!(dom.parent(li), Some(ul));
        assert_eq!(dom.children(ul), vec![li]);

        dom.append_child(li, dom.create_text("x")).unwrap();
        assert_eq!(
            dom.insert_child(li, 2, span),
            Err(DomError::IndexOutOfBounds { index: 2, len: 1 })
        );
        dom.insert_child(li, 1, span).unwrap();
        assert_eq!(dom.child_index(li, span), Some(1));
        assert_eq!(dom.child_index(ul, span), None);
    }

    #[test]
    fn test_destroy_node_frees_subtree() {
        let dom = Dom::new();
        let (ul, li, span) = list(&dom);
        dom.add_event_listener(span, "click", |_| {});
        dom.focus(span);

        dom.destroy_node(li);
        assert!(!dom.exists(li));
        assert!(!dom.exists(span));
        assert_eq!(dom.focused(), None);
        assert_eq!(dom.listener_count(span), 0);
        assert!(dom.children(ul).is_empty());
    }

    #[test]
    fn test_set_text_content_replaces_children() {
        let dom = Dom::new();
        let (_, li, span) = list(&dom);

        dom.set_text_content(li, "Bold").unwrap();
        assert_eq!(dom.text_content(li), "Bold");
        assert_eq!(dom.child_count(li), 1);
        assert!(!dom.exists(span));

        dom.set_text_content(li, "").unwrap();
        assert_eq!(dom.child_count(li), 0);
    }

    #[test]
    fn test_selector_queries() {
        let dom = Dom::new();
        let (ul, li, span) = list(&dom);

        assert_eq!(dom.query_selector(ul, "#label").unwrap(), Some(span));
        assert_eq!(dom.query_selector(ul, "ul span").unwrap(), Some(span));
        assert_eq!(dom.query_selector(ul, "ul > span").unwrap(), None);
        assert_eq!(dom.query_selector(ul, "li.active > span").unwrap(), Some(span));
        assert_eq!(dom.query_selector(ul, ".ck-list__item").unwrap(), Some(li));
        assert_eq!(dom.query_selector(ul, "ul").unwrap(), None);
        assert_eq!(
            dom.query_selector_all(ul, "li, span").unwrap(),
            vec![li, span]
        );
        assert!(dom.query_selector(ul, "li[").is_err());
    }

    #[test]
    fn test_event_bubbling_and_prevent_default() {
        let dom = Dom::new();
        let (ul, li, span) = list(&dom);
        let log = Rc::new(RefCell::new(Vec::new()));

        for (node, name) in [(span, "span"), (li, "li"), (ul, "ul")] {
            let log = log.clone();
            dom.add_event_listener(node, "click", move |event| {
                log.borrow_mut().push((name, event.target, event.current_target));
            });
        }
        dom.add_event_listener(li, "click", |event| event.prevent_default());

        assert!(!dom.dispatch_event(span, "click"));
        assert_eq!(
            *log.borrow(),
            vec![("span", span, span), ("li", span, li), ("ul", span, ul)]
        );
    }

    #[test]
    fn test_stop_propagation() {
        let dom = Dom::new();
        let (ul, li, span) = list(&dom);
        let reached = Rc::new(RefCell::new(false));

        dom.add_event_listener(li, "click", |event| event.stop_propagation());
        let reached_clone = reached.clone();
        dom.add_event_listener(ul, "click", move |_| *reached_clone.borrow_mut() = true);

        assert!(dom.dispatch_event(span, "click"));
        assert!(!*reached.borrow());
    }

    #[test]
    fn test_outer_html_escapes() {
        let dom = Dom::new();
        let button = dom.create_element("button");
        dom.set_attribute(button, "title", "Say \"hi\"").unwrap();
        let text = dom.create_text("a < b & c");
        dom.append_child(button, text).unwrap();

        assert_eq!(
            dom.outer_html(button),
            "<button title=\"Say &quot;hi&quot;\">a &lt; b &amp; c</button>"
        );
        assert_eq!(dom.inner_html(button), "a &lt; b &amp; c");
    }
}
