//! Selection-following toolbar
//!
//! The contextual toolbar appears in the shared balloon once a
//! non-collapsed selection has been stable for the debounce period while
//! the editing view has focus, and disappears as soon as the selection
//! starts changing, collapses, or the editor loses focus.
//!
//! ```text
//!            settled && focused && !collapsed
//!   Hidden ----------------------------------> Shown
//!     ^                                          |
//!     +------------------------------------------+
//!        direct change | collapsed | focus lost
//! ```
//!
//! Showing goes through a cancelable `show` event. The listener that
//! actually populates the balloon runs at [`Priority::Low`], so observers at
//! normal or higher priority can stop the event to veto it.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use lumen_core::{
    Debouncer, Emitter, EventInfo, ListenerRegistry, Priority, StateMachine, Subscription,
    TimerQueue, Transition, Value,
};
use lumen_view::{AsView, Dom, Template, View};

use super::ToolbarView;
use crate::balloon::{BalloonContent, BalloonPosition, ContextualBalloon, PositionOptions, Rect};
use crate::config::ContextualToolbarConfig;
use crate::editing::EditingHost;
use crate::error::Result;
use crate::factory::ComponentFactory;

/// Internal event fired once the selection stops changing
pub const SELECTION_SETTLED_EVENT: &str = "_selectionChangeDebounced";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ToolbarState {
    Hidden,
    Shown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ToolbarEvent {
    Show,
    Hide,
}

struct ToolbarInner {
    host: Rc<dyn EditingHost>,
    balloon: ContextualBalloon,
    toolbar: ToolbarView,
    config: ContextualToolbarConfig,
    emitter: Emitter,
    debouncer: Debouncer,
    listeners: RefCell<ListenerRegistry>,
    render_listener: RefCell<Option<Subscription>>,
    fsm: RefCell<StateMachine<ToolbarState, ToolbarEvent>>,
    destroyed: Cell<bool>,
}

/// Shared handle to a contextual toolbar
#[derive(Clone)]
pub struct ContextualToolbar {
    inner: Rc<ToolbarInner>,
}

impl ContextualToolbar {
    /// Build the toolbar from `config.items` and start following the
    /// host's selection
    pub fn new(
        dom: &Dom,
        host: Rc<dyn EditingHost>,
        balloon: &ContextualBalloon,
        factory: &ComponentFactory,
        config: ContextualToolbarConfig,
        timers: &TimerQueue,
    ) -> Result<Self> {
        let toolbar = ToolbarView::new(dom)?;
        toolbar.view().extend_template(|template| {
            template.extend(
                Template::extension()
                    .attr("class", "ck-editor-toolbar")
                    .attr("class", "ck-toolbar_floating"),
            )
        })?;
        toolbar.fill_from_config(&config.items, factory)?;

        let in_balloon = {
            let balloon = balloon.clone();
            let view = toolbar.view().clone();
            move || balloon.has_view(&view)
        };
        let out_of_balloon = {
            let in_balloon = in_balloon.clone();
            move || !in_balloon()
        };
        let fsm = StateMachine::builder(ToolbarState::Hidden)
            .transition(
                Transition::new(ToolbarState::Hidden, ToolbarEvent::Show, ToolbarState::Shown)
                    .with_guard(in_balloon),
            )
            .transition(
                Transition::new(ToolbarState::Shown, ToolbarEvent::Hide, ToolbarState::Hidden)
                    .with_guard(out_of_balloon),
            )
            .on_enter(ToolbarState::Shown, || tracing::debug!("contextual toolbar shown"))
            .on_enter(ToolbarState::Hidden, || tracing::debug!("contextual toolbar hidden"))
            .build();

        let wait = config.debounce();
        let inner = Rc::new_cyclic(|weak: &Weak<ToolbarInner>| {
            let weak = weak.clone();
            let debouncer = Debouncer::new(timers, wait, move || {
                if let Some(inner) = weak.upgrade() {
                    tracing::debug!("selection settled");
                    inner.emitter.fire(SELECTION_SETTLED_EVENT, &[]);
                }
            });
            ToolbarInner {
                host,
                balloon: balloon.clone(),
                toolbar,
                config,
                emitter: Emitter::new(),
                debouncer,
                listeners: RefCell::new(ListenerRegistry::new()),
                render_listener: RefCell::new(None),
                fsm: RefCell::new(fsm),
                destroyed: Cell::new(false),
            }
        });

        let contextual = Self { inner };
        contextual.attach_listeners();
        Ok(contextual)
    }

    fn attach_listeners(&self) {
        let inner = &self.inner;
        let mut listeners = inner.listeners.borrow_mut();

        let weak = Rc::downgrade(inner);
        listeners.listen_to(inner.host.selection(), "change:range", move |_, args| {
            let Some(toolbar) = upgrade(&weak) else {
                return;
            };
            let direct_change = args.first().is_some_and(Value::is_truthy);
            if direct_change || toolbar.inner.host.is_selection_collapsed() {
                toolbar.hide_or_warn();
            }
            toolbar.inner.debouncer.call();
        });

        let weak = Rc::downgrade(inner);
        listeners.listen_to(&inner.emitter, SELECTION_SETTLED_EVENT, move |_, _| {
            let Some(toolbar) = upgrade(&weak) else {
                return;
            };
            let host = &toolbar.inner.host;
            if host.editing_view().get("isFocused").is_truthy() && !host.is_selection_collapsed() {
                toolbar.show();
            }
        });

        let weak = Rc::downgrade(inner);
        listeners.listen_to(
            inner.host.focus_tracker().emitter(),
            "change:isFocused",
            move |_, args| {
                let Some(toolbar) = upgrade(&weak) else {
                    return;
                };
                let focused = args.first().is_some_and(Value::is_truthy);
                let visible = toolbar.inner.balloon.visible_view();
                if !focused && visible.as_ref() == Some(toolbar.inner.toolbar.view()) {
                    toolbar.hide_or_warn();
                }
            },
        );

        let weak = Rc::downgrade(inner);
        listeners.listen_to(inner.balloon.emitter(), "remove", move |_, args| {
            let Some(toolbar) = upgrade(&weak) else {
                return;
            };
            let removed = args.first().and_then(|value| value.downcast_ref::<View>());
            if removed == Some(toolbar.inner.toolbar.view()) {
                toolbar.forget_display();
            }
        });

        let weak = Rc::downgrade(inner);
        let display = inner
            .emitter
            .on_with_priority("show", Priority::Low, move |_, _| {
                let Some(toolbar) = upgrade(&weak) else {
                    return;
                };
                if let Err(err) = toolbar.display() {
                    tracing::warn!(%err, "failed to show contextual toolbar");
                }
            });
        listeners.track(display);
    }

    /// Ask to show the toolbar
    ///
    /// Does nothing while the toolbar is already in the balloon. Otherwise
    /// fires `show`; stopping that event keeps the toolbar hidden.
    pub fn show(&self) {
        if self.inner.destroyed.get() || self.inner.balloon.has_view(self.inner.toolbar.view()) {
            return;
        }
        let info = self.inner.emitter.fire("show", &[]);
        if info.is_stopped() && !self.is_shown() {
            tracing::debug!("contextual toolbar show vetoed");
        }
    }

    /// Take the toolbar out of the balloon
    pub fn hide(&self) -> Result<()> {
        let view = self.inner.toolbar.view();
        if self.inner.balloon.has_view(view) {
            self.inner.balloon.remove(view)?;
        }
        self.forget_display();
        Ok(())
    }

    /// Drop the reposition listener once the toolbar left the balloon
    fn forget_display(&self) {
        let render_listener = self.inner.render_listener.borrow_mut().take();
        if let Some(subscription) = render_listener {
            self.inner.listeners.borrow_mut().release(&subscription);
        }
        self.inner.fsm.borrow_mut().send(ToolbarEvent::Hide);
    }

    fn hide_or_warn(&self) {
        if let Err(err) = self.hide() {
            tracing::warn!(%err, "failed to hide contextual toolbar");
        }
    }

    /// Put the toolbar into the balloon unless no item is enabled
    fn display(&self) -> Result<()> {
        let items = self.inner.toolbar.items().views();
        if items.iter().all(|item| !item.get("isEnabled").is_truthy()) {
            tracing::debug!(items = items.len(), "no enabled toolbar items");
            return Ok(());
        }

        let content = BalloonContent::new(self.inner.toolbar.view(), self.position_options())
            .with_class_name(&self.inner.config.balloon_class_name);
        self.inner.balloon.add(content)?;

        let weak = Rc::downgrade(&self.inner);
        let render_listener = self.inner.host.editing_view().on("render", move |_, _| {
            let Some(toolbar) = upgrade(&weak) else {
                return;
            };
            let options = toolbar.position_options();
            if let Err(err) = toolbar.inner.balloon.update_position(Some(options)) {
                tracing::warn!(%err, "failed to reposition contextual toolbar");
            }
        });
        self.inner.listeners.borrow_mut().track(render_listener.clone());
        let previous = self.inner.render_listener.replace(Some(render_listener));
        if let Some(previous) = previous {
            self.inner.listeners.borrow_mut().release(&previous);
        }

        self.inner.fsm.borrow_mut().send(ToolbarEvent::Show);
        Ok(())
    }

    /// Position request following the current selection
    fn position_options(&self) -> PositionOptions {
        let host = &self.inner.host;
        let backward = host.is_selection_backward();
        let weak_host = Rc::downgrade(host);
        PositionOptions::new(
            move || {
                weak_host
                    .upgrade()
                    .map(|host| selection_target(&host.selection_rects(), backward))
                    .unwrap_or_default()
            },
            BalloonPosition::for_selection(backward),
        )
        .with_limiter(host.limiter())
    }

    /// Cancel the pending debounce and stop reacting to the host
    pub fn destroy(&self) {
        if self.inner.destroyed.replace(true) {
            return;
        }
        self.inner.debouncer.cancel();
        self.inner.render_listener.borrow_mut().take();
        self.inner.listeners.borrow_mut().stop_listening();
        tracing::debug!("contextual toolbar destroyed");
    }

    pub fn toolbar_view(&self) -> &ToolbarView {
        &self.inner.toolbar
    }

    pub fn state(&self) -> ToolbarState {
        self.inner.fsm.borrow().current_state()
    }

    pub fn is_shown(&self) -> bool {
        self.inner.fsm.borrow().is_in(ToolbarState::Shown)
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.get()
    }

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

    pub fn emitter(&self) -> &Emitter {
        &self.inner.emitter
    }
}

impl fmt::Debug for ContextualToolbar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextualToolbar")
            .field("state", &self.state())
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}

fn upgrade(weak: &Weak<ToolbarInner>) -> Option<ContextualToolbar> {
    let inner = weak.upgrade()?;
    (!inner.destroyed.get()).then_some(ContextualToolbar { inner })
}

/// The rectangle the balloon points at
///
/// A forward selection ending at the start of a line reports an empty
/// trailing rectangle; the one before it is used instead.
fn selection_target(rects: &[Rect], backward: bool) -> Rect {
    if backward {
        return rects.first().copied().unwrap_or_default();
    }
    match rects {
        [.., previous, last] if last.width == 0.0 => *previous,
        [.., last] => *last,
        [] => Rect::default(),
    }
}
