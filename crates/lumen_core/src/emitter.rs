//! Event emitter
//!
//! Publish/subscribe with per-event ordered listener lists. Listeners are
//! ordered by [`Priority`] first and registration order second. Every
//! listener receives a mutable [`EventInfo`]; calling [`EventInfo::stop`]
//! ends the dispatch early.
//!
//! Dispatch never holds a borrow of the emitter while a listener runs, so
//! listeners may freely subscribe, unsubscribe or fire further events.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;

use crate::value::Value;

new_key_type! {
    /// Identifier for a registered listener
    pub struct ListenerId;
}

static NEXT_EMITTER_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identifier of an emitter, used as a registry key
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EmitterId(u64);

impl EmitterId {
    fn next() -> Self {
        Self(NEXT_EMITTER_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Listener priority
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Priority {
    Highest,
    High,
    #[default]
    Normal,
    Low,
    Lowest,
}

impl Priority {
    fn rank(self) -> u8 {
        match self {
            Priority::Highest => 0,
            Priority::High => 1,
            Priority::Normal => 2,
            Priority::Low => 3,
            Priority::Lowest => 4,
        }
    }
}

/// Information about the event being dispatched
#[derive(Clone, Debug)]
pub struct EventInfo {
    pub name: String,
    pub source: EmitterId,
    stopped: bool,
}

impl EventInfo {
    fn new(name: &str, source: EmitterId) -> Self {
        Self {
            name: name.to_string(),
            source,
            stopped: false,
        }
    }

    /// Stop the event; remaining listeners are not called
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}

/// Listener callback
pub type Listener = Rc<dyn Fn(&mut EventInfo, &[Value])>;

struct ListenerEntry {
    event: String,
    priority: Priority,
    callback: Listener,
}

struct EmitterInner {
    id: EmitterId,
    listeners: RefCell<SlotMap<ListenerId, ListenerEntry>>,
    by_event: RefCell<FxHashMap<String, SmallVec<[ListenerId; 4]>>>,
}

/// A cheaply clonable emitter handle
#[derive(Clone)]
pub struct Emitter {
    inner: Rc<EmitterInner>,
}

impl Emitter {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(EmitterInner {
                id: EmitterId::next(),
                listeners: RefCell::new(SlotMap::with_key()),
                by_event: RefCell::new(FxHashMap::default()),
            }),
        }
    }

    pub fn id(&self) -> EmitterId {
        self.inner.id
    }

    pub fn downgrade(&self) -> WeakEmitter {
        WeakEmitter {
            inner: Rc::downgrade(&self.inner),
            id: self.inner.id,
        }
    }

    /// Register a listener with normal priority
    pub fn on<F>(&self, event: &str, callback: F) -> Subscription
    where
        F: Fn(&mut EventInfo, &[Value]) + 'static,
    {
        self.on_with_priority(event, Priority::Normal, callback)
    }

    /// Register a listener with an explicit priority
    pub fn on_with_priority<F>(&self, event: &str, priority: Priority, callback: F) -> Subscription
    where
        F: Fn(&mut EventInfo, &[Value]) + 'static,
    {
        let id = self.inner.listeners.borrow_mut().insert(ListenerEntry {
            event: event.to_string(),
            priority,
            callback: Rc::new(callback),
        });

        let listeners = self.inner.listeners.borrow();
        let mut by_event = self.inner.by_event.borrow_mut();
        let ids = by_event.entry(event.to_string()).or_default();
        let rank = priority.rank();
        let position = ids
            .iter()
            .position(|other| {
                listeners
                    .get(*other)
                    .is_some_and(|entry| entry.priority.rank() > rank)
            })
            .unwrap_or(ids.len());
        ids.insert(position, id);

        Subscription {
            emitter: Rc::downgrade(&self.inner),
            emitter_id: self.inner.id,
            listener: id,
        }
    }

    /// Fire an event, returning the final event info
    pub fn fire(&self, event: &str, args: &[Value]) -> EventInfo {
        let mut info = EventInfo::new(event, self.inner.id);

        let snapshot: SmallVec<[(ListenerId, Listener); 4]> = {
            let listeners = self.inner.listeners.borrow();
            let by_event = self.inner.by_event.borrow();
            match by_event.get(event) {
                Some(ids) => ids
                    .iter()
                    .filter_map(|id| listeners.get(*id).map(|e| (*id, e.callback.clone())))
                    .collect(),
                None => return info,
            }
        };

        for (id, callback) in snapshot {
            if !self.inner.listeners.borrow().contains_key(id) {
                continue;
            }
            callback(&mut info, args);
            if info.is_stopped() {
                tracing::trace!(event, "event stopped");
                break;
            }
        }

        info
    }

    /// Remove all listeners of a single event
    pub fn off(&self, event: &str) {
        let removed = self.inner.by_event.borrow_mut().remove(event);
        if let Some(ids) = removed {
            let mut listeners = self.inner.listeners.borrow_mut();
            for id in ids {
                listeners.remove(id);
            }
        }
    }

    /// Remove every listener
    pub fn clear(&self) {
        self.inner.by_event.borrow_mut().clear();
        self.inner.listeners.borrow_mut().clear();
    }

    /// Number of listeners registered for an event
    pub fn listener_count(&self, event: &str) -> usize {
        self.inner
            .by_event
            .borrow()
            .get(event)
            .map_or(0, |ids| ids.len())
    }

    pub fn has_listeners(&self) -> bool {
        !self.inner.listeners.borrow().is_empty()
    }
}

impl Default for Emitter {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Emitter {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Emitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("id", &self.inner.id)
            .field("listeners", &self.inner.listeners.borrow().len())
            .finish()
    }
}

fn remove_listener(inner: &EmitterInner, listener: ListenerId) {
    let Some(entry) = inner.listeners.borrow_mut().remove(listener) else {
        return;
    };
    let mut by_event = inner.by_event.borrow_mut();
    if let Some(ids) = by_event.get_mut(&entry.event) {
        ids.retain(|id| *id != listener);
        if ids.is_empty() {
            by_event.remove(&entry.event);
        }
    }
}

/// Non-owning emitter handle
#[derive(Clone)]
pub struct WeakEmitter {
    inner: Weak<EmitterInner>,
    id: EmitterId,
}

impl WeakEmitter {
    pub fn upgrade(&self) -> Option<Emitter> {
        self.inner.upgrade().map(|inner| Emitter { inner })
    }

    pub fn id(&self) -> EmitterId {
        self.id
    }
}

/// Handle to a registered listener
///
/// Dropping the handle does not unsubscribe; call [`Subscription::cancel`].
#[derive(Clone)]
pub struct Subscription {
    emitter: Weak<EmitterInner>,
    emitter_id: EmitterId,
    listener: ListenerId,
}

impl Subscription {
    pub fn emitter_id(&self) -> EmitterId {
        self.emitter_id
    }

    pub fn listener_id(&self) -> ListenerId {
        self.listener
    }

    /// Remove the listener from its emitter
    pub fn cancel(&self) {
        if let Some(inner) = self.emitter.upgrade() {
            remove_listener(&inner, self.listener);
        }
    }

    pub fn is_active(&self) -> bool {
        self.emitter
            .upgrade()
            .is_some_and(|inner| inner.listeners.borrow().contains_key(self.listener))
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("emitter", &self.emitter_id)
            .field("listener", &self.listener)
            .finish()
    }
}

/// Bookkeeping of the subscriptions an owner holds on other emitters
///
/// Keyed by the source emitter's id so that everything registered on one
/// source can be released at once.
#[derive(Default)]
pub struct ListenerRegistry {
    links: IndexMap<EmitterId, Vec<Subscription>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to `event` on `source` and record the subscription
    pub fn listen_to<F>(&mut self, source: &Emitter, event: &str, callback: F) -> Subscription
    where
        F: Fn(&mut EventInfo, &[Value]) + 'static,
    {
        let subscription = source.on(event, callback);
        self.track(subscription.clone());
        subscription
    }

    /// Record an existing subscription
    pub fn track(&mut self, subscription: Subscription) {
        self.links
            .entry(subscription.emitter_id())
            .or_default()
            .push(subscription);
    }

    /// Cancel and forget every subscription on one source
    pub fn stop_listening_to(&mut self, source: EmitterId) {
        if let Some(subscriptions) = self.links.shift_remove(&source) {
            for subscription in subscriptions {
                subscription.cancel();
            }
        }
    }

    /// Cancel one subscription and forget it
    pub fn release(&mut self, subscription: &Subscription) {
        subscription.cancel();
        let source = subscription.emitter_id();
        if let Some(subscriptions) = self.links.get_mut(&source) {
            subscriptions.retain(|s| s.listener_id() != subscription.listener_id());
            if subscriptions.is_empty() {
                self.links.shift_remove(&source);
            }
        }
    }

    /// Cancel and forget everything
    pub fn stop_listening(&mut self) {
        for (_, subscriptions) in self.links.drain(..) {
            for subscription in subscriptions {
                subscription.cancel();
            }
        }
    }

    pub fn is_listening_to(&self, source: EmitterId) -> bool {
        self.links.contains_key(&source)
    }

    pub fn sources(&self) -> impl Iterator<Item = EmitterId> + '_ {
        self.links.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}
