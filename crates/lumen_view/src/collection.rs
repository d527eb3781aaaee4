//! Ordered view collections
//!
//! A [`ViewCollection`] keeps an ordered list of views and can be mounted
//! inside a DOM element after a [`MountAnchor`]. While mounted, adding a
//! view renders it and inserts its element next to its neighbours;
//! removing a view detaches its element.
//!
//! Positions are resolved against live DOM nodes on every insert, so
//! siblings that grow or shrink before the collection do not shift it.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use lumen_core::{Emitter, EventInfo, Subscription, Value};

use crate::dom::{Dom, NodeId, WeakDom};
use crate::error::{Result, ViewError};
use crate::view::View;

/// What a mounted collection follows inside its parent
#[derive(Clone, Debug)]
pub enum MountAnchor {
    /// A fixed sibling node
    Node(NodeId),
    /// Whatever another collection mounted in the same parent currently shows
    Collection(WeakViewCollection),
}

struct Mount {
    dom: WeakDom,
    parent: NodeId,
    after: Option<MountAnchor>,
}

struct CollectionInner {
    emitter: Emitter,
    items: RefCell<Vec<View>>,
    mount: RefCell<Option<Mount>>,
}

/// Shared handle to an ordered list of views
///
/// Fires `add` and `remove` with `[view, index]`; the view travels as an
/// opaque [`Value`] holding a [`View`].
#[derive(Clone)]
pub struct ViewCollection {
    inner: Rc<CollectionInner>,
}

impl ViewCollection {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(CollectionInner {
                emitter: Emitter::new(),
                items: RefCell::new(Vec::new()),
                mount: RefCell::new(None),
            }),
        }
    }

    pub fn add(&self, view: &View) -> Result<()> {
        self.add_at(view, self.len())
    }

    pub fn add_at(&self, view: &View, index: usize) -> Result<()> {
        let len = self.len();
        if self.contains(view) {
            return Err(ViewError::DuplicateItem);
        }
        if index > len {
            return Err(ViewError::ItemIndex { index, len });
        }

        if let Some((dom, parent)) = self.mounted() {
            let element = view.render()?;
            let position = self.position_after(&dom, parent, index);
            dom.insert_child(parent, position, element)?;
        }
        self.inner.items.borrow_mut().insert(index, view.clone());
        self.inner
            .emitter
            .fire("add", &[Value::opaque(view.clone()), Value::from(index as i64)]);
        Ok(())
    }

    /// Remove `view`, returning the index it had
    pub fn remove(&self, view: &View) -> Option<usize> {
        let index = self.index_of(view)?;
        self.remove_at(index);
        Some(index)
    }

    pub fn remove_at(&self, index: usize) -> Option<View> {
        let view = {
            let mut items = self.inner.items.borrow_mut();
            (index < items.len()).then(|| items.remove(index))?
        };
        if let (Some((dom, _)), Some(element)) = (self.mounted(), view.element()) {
            dom.detach(element);
        }
        self.inner
            .emitter
            .fire("remove", &[Value::opaque(view.clone()), Value::from(index as i64)]);
        Some(view)
    }

    pub fn get(&self, index: usize) -> Option<View> {
        self.inner.items.borrow().get(index).cloned()
    }

    pub fn index_of(&self, view: &View) -> Option<usize> {
        self.inner.items.borrow().iter().position(|item| item == view)
    }

    pub fn contains(&self, view: &View) -> bool {
        self.index_of(view).is_some()
    }

    pub fn len(&self) -> usize {
        self.inner.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.items.borrow().is_empty()
    }

    /// Snapshot of the current items
    pub fn views(&self) -> Vec<View> {
        self.inner.items.borrow().clone()
    }

    /// Remove every item, firing `remove` for each
    pub fn clear(&self) {
        while !self.is_empty() {
            self.remove_at(self.len() - 1);
        }
    }

    /// Place item elements inside `parent`, right after `after`
    ///
    /// Without an anchor the items start at the first child.
    pub fn mount(&self, dom: &Dom, parent: NodeId, after: Option<MountAnchor>) -> Result<()> {
        let start = anchor_end(dom, parent, after.as_ref());
        for (index, view) in self.views().into_iter().enumerate() {
            let element = view.render()?;
            dom.insert_child(parent, start + index, element)?;
        }
        *self.inner.mount.borrow_mut() = Some(Mount {
            dom: dom.downgrade(),
            parent,
            after,
        });
        Ok(())
    }

    /// Detach item elements and forget the mount point
    pub fn unmount(&self) {
        let Some(mount) = self.inner.mount.borrow_mut().take() else {
            return;
        };
        let Some(dom) = mount.dom.upgrade() else {
            return;
        };
        for view in self.views() {
            if let Some(element) = view.element() {
                dom.detach(element);
            }
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted().is_some()
    }

    /// Destroy every item and drop all listeners
    pub fn destroy(&self) {
        self.inner.mount.borrow_mut().take();
        let items = std::mem::take(&mut *self.inner.items.borrow_mut());
        for view in items {
            view.destroy();
        }
        self.inner.emitter.clear();
    }

    pub fn on<F>(&self, event: &str, callback: F) -> Subscription
    where
        F: Fn(&mut EventInfo, &[Value]) + 'static,
    {
        self.inner.emitter.on(event, callback)
    }

    pub fn emitter(&self) -> &Emitter {
        &self.inner.emitter
    }

    pub fn downgrade(&self) -> WeakViewCollection {
        WeakViewCollection {
            inner: Rc::downgrade(&self.inner),
        }
    }

    fn mounted(&self) -> Option<(Dom, NodeId)> {
        let mount = self.inner.mount.borrow();
        let mount = mount.as_ref()?;
        Some((mount.dom.upgrade()?, mount.parent))
    }

    /// Child index just past the last mounted element among the first
    /// `upto` items, falling back to the end of the anchor
    fn position_after(&self, dom: &Dom, parent: NodeId, upto: usize) -> usize {
        let placed = self.inner.items.borrow()[..upto]
            .iter()
            .rev()
            .find_map(|view| dom.child_index(parent, view.element()?));
        if let Some(position) = placed {
            return position + 1;
        }
        let after = self
            .inner
            .mount
            .borrow()
            .as_ref()
            .and_then(|mount| mount.after.clone());
        anchor_end(dom, parent, after.as_ref())
    }
}

fn anchor_end(dom: &Dom, parent: NodeId, after: Option<&MountAnchor>) -> usize {
    match after {
        None => 0,
        Some(MountAnchor::Node(node)) => dom.child_index(parent, *node).map_or(0, |i| i + 1),
        Some(MountAnchor::Collection(weak)) => weak
            .upgrade()
            .filter(|collection| collection.mounted().is_some_and(|(_, p)| p == parent))
            .map_or(0, |collection| {
                collection.position_after(dom, parent, collection.len())
            }),
    }
}

/// Non-owning handle to a [`ViewCollection`]
#[derive(Clone)]
pub struct WeakViewCollection {
    inner: Weak<CollectionInner>,
}

impl WeakViewCollection {
    pub fn upgrade(&self) -> Option<ViewCollection> {
        self.inner.upgrade().map(|inner| ViewCollection { inner })
    }
}

impl fmt::Debug for WeakViewCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WeakViewCollection")
    }
}

impl Default for ViewCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for ViewCollection {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for ViewCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewCollection")
            .field("len", &self.len())
            .field("mounted", &self.is_mounted())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::Template;
    use std::cell::Cell;

    fn item(dom: &Dom, tag: &str) -> View {
        let view = View::new(dom);
        view.set_template(Template::new(tag)).unwrap();
        view
    }

    #[test]
    fn test_add_and_remove_unmounted() {
        let dom = Dom::new();
        let collection = ViewCollection::new();
        let a = item(&dom, "a");
        let b = item(&dom, "b");

        collection.add(&a).unwrap();
        collection.add_at(&b, 0).unwrap();
        assert_eq!(collection.views(), vec![b.clone(), a.clone()]);
        assert!(!a.is_rendered());

        assert_eq!(collection.add(&a).unwrap_err().code(), "ui-collection-add-item-exists");
        let c = item(&dom, "c");
        assert_eq!(
            collection.add_at(&c, 5).unwrap_err().code(),
            "ui-collection-add-item-bad-index"
        );

        assert_eq!(collection.remove(&b), Some(0));
        assert_eq!(collection.remove(&b), None);
        assert_eq!(collection.len(), 1);
    }

    #[test]
    fn test_mounted_membership_follows_dom() {
        let dom = Dom::new();
        let parent = dom.create_element("ul");
        let header = dom.create_element("h");
        dom.append_child(parent, header).unwrap();

        let collection = ViewCollection::new();
        collection.add(&item(&dom, "li")).unwrap();
        collection
            .mount(&dom, parent, Some(MountAnchor::Node(header)))
            .unwrap();
        assert_eq!(dom.inner_html(parent), "<h></h><li></li>");

        let first = item(&dom, "b");
        collection.add_at(&first, 0).unwrap();
        assert_eq!(dom.inner_html(parent), "<h></h><b></b><li></li>");

        collection.remove_at(1);
        assert_eq!(dom.inner_html(parent), "<h></h><b></b>");

        collection.unmount();
        assert_eq!(dom.inner_html(parent), "<h></h>");
        assert_eq!(collection.len(), 1);
    }

    #[test]
    fn test_sibling_collections_keep_order() {
        let dom = Dom::new();
        let parent = dom.create_element("div");
        let first = ViewCollection::new();
        let second = ViewCollection::new();
        first.mount(&dom, parent, None).unwrap();
        second
            .mount(&dom, parent, Some(MountAnchor::Collection(first.downgrade())))
            .unwrap();

        second.add(&item(&dom, "b1")).unwrap();
        let a1 = item(&dom, "a1");
        first.add(&a1).unwrap();
        second.add(&item(&dom, "b2")).unwrap();
        assert_eq!(dom.inner_html(parent), "<a1></a1><b1></b1><b2></b2>");

        first.add_at(&item(&dom, "a0"), 0).unwrap();
        first.remove(&a1);
        second.add_at(&item(&dom, "b0"), 0).unwrap();
        assert_eq!(dom.inner_html(parent), "<a0></a0><b0></b0><b1></b1><b2></b2>");
    }

    #[test]
    fn test_events_carry_view_and_index() {
        let dom = Dom::new();
        let collection = ViewCollection::new();
        let seen = Rc::new(Cell::new(None));
        let seen_clone = seen.clone();
        collection.on("add", move |_, args| {
            let view = args[0].downcast_ref::<View>().cloned();
            seen_clone.set(Some((view.is_some(), args[1].as_i64())));
        });

        collection.add(&item(&dom, "a")).unwrap();
        assert_eq!(seen.get(), Some((true, Some(0))));
    }

    #[test]
    fn test_destroy_destroys_items() {
        let dom = Dom::new();
        let collection = ViewCollection::new();
        let a = item(&dom, "a");
        collection.add(&a).unwrap();
        collection.destroy();
        assert!(collection.is_empty());
        assert!(a.is_destroyed());
    }
}
