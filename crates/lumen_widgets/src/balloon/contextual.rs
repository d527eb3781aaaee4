//! Shared contextual balloon

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use lumen_core::{Emitter, EventInfo, Subscription, Value};
use lumen_view::{AsView, Dom, View};
use smallvec::SmallVec;

use super::{BalloonPanelView, PositionOptions};
use crate::error::{Result, WidgetError};

/// A view to show in the balloon, with where and how to show it
#[derive(Clone, Debug)]
pub struct BalloonContent {
    pub view: View,
    pub position: PositionOptions,
    pub balloon_class_name: Option<String>,
}

impl BalloonContent {
    pub fn new(view: &View, position: PositionOptions) -> Self {
        Self {
            view: view.clone(),
            position,
            balloon_class_name: None,
        }
    }

    pub fn with_class_name(mut self, class_name: &str) -> Self {
        self.balloon_class_name = Some(class_name.to_string());
        self
    }
}

struct BalloonInner {
    panel: BalloonPanelView,
    stack: RefCell<SmallVec<[BalloonContent; 4]>>,
    emitter: Emitter,
}

/// One balloon panel shared as a stack of contents
///
/// Only the top of the stack is visible. Fires `add`, `remove` (with the
/// view as an opaque value) and `updatePosition`.
#[derive(Clone)]
pub struct ContextualBalloon {
    inner: Rc<BalloonInner>,
}

impl ContextualBalloon {
    pub fn new(dom: &Dom) -> Result<Self> {
        Ok(Self {
            inner: Rc::new(BalloonInner {
                panel: BalloonPanelView::new(dom)?,
                stack: RefCell::new(SmallVec::new()),
                emitter: Emitter::new(),
            }),
        })
    }

    pub fn panel(&self) -> &BalloonPanelView {
        &self.inner.panel
    }

    /// Push `content` and show it in place of the current view
    pub fn add(&self, content: BalloonContent) -> Result<()> {
        if self.has_view(&content.view) {
            return Err(WidgetError::BalloonDuplicate);
        }
        self.inner.panel.render()?;

        if let Some(current) = self.visible_view() {
            self.inner.panel.content().remove(&current);
        }
        let view = content.view.clone();
        self.inner.stack.borrow_mut().push(content.clone());
        self.reveal(&content)?;

        tracing::debug!("balloon view added");
        self.inner.emitter.fire("add", &[Value::opaque(view)]);
        Ok(())
    }

    /// Take `view` off the stack, revealing the previous content if it was
    /// visible
    pub fn remove(&self, view: &View) -> Result<()> {
        let (index, was_visible) = {
            let stack = self.inner.stack.borrow();
            let index = stack
                .iter()
                .position(|entry| entry.view == *view)
                .ok_or(WidgetError::BalloonMissing)?;
            (index, index + 1 == stack.len())
        };

        self.inner.stack.borrow_mut().remove(index);
        if was_visible {
            self.inner.panel.content().remove(view);
            let previous = self.inner.stack.borrow().last().cloned();
            match previous {
                Some(previous) => self.reveal(&previous)?,
                None => {
                    self.inner.panel.hide()?;
                    self.inner.panel.view().set("className", Value::Undefined)?;
                }
            }
        }

        tracing::debug!(was_visible, "balloon view removed");
        self.inner
            .emitter
            .fire("remove", &[Value::opaque(view.clone())]);
        Ok(())
    }

    /// Re-attach the panel, optionally replacing the visible content's
    /// position options first
    pub fn update_position(&self, position: Option<PositionOptions>) -> Result<()> {
        if let Some(position) = position {
            if let Some(top) = self.inner.stack.borrow_mut().last_mut() {
                top.position = position;
            }
        }
        let options = self.visible_position();
        if let Some(options) = options {
            self.inner.panel.attach_to(&options)?;
        }
        self.inner.emitter.fire("updatePosition", &[]);
        Ok(())
    }

    pub fn has_view(&self, view: &View) -> bool {
        self.inner.stack.borrow().iter().any(|entry| entry.view == *view)
    }

    pub fn visible_view(&self) -> Option<View> {
        self.inner.stack.borrow().last().map(|entry| entry.view.clone())
    }

    pub fn visible_position(&self) -> Option<PositionOptions> {
        self.inner
            .stack
            .borrow()
            .last()
            .map(|entry| entry.position.clone())
    }

    pub fn len(&self) -> usize {
        self.inner.stack.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.stack.borrow().is_empty()
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

    fn reveal(&self, content: &BalloonContent) -> Result<()> {
        let panel = &self.inner.panel;
        panel.content().add(&content.view)?;
        let class_name = content
            .balloon_class_name
            .as_deref()
            .map(Value::from)
            .unwrap_or_default();
        panel.view().set("className", class_name)?;
        panel.attach_to(&content.position)?;
        Ok(())
    }
}

impl fmt::Debug for ContextualBalloon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextualBalloon")
            .field("stack", &self.len())
            .field("visible", &self.inner.panel.is_visible())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balloon::{BalloonPosition, Rect};
    use lumen_view::Template;

    fn content(dom: &Dom, tag: &str) -> View {
        let view = View::new(dom);
        view.set_template(Template::new(tag)).unwrap();
        view
    }

    fn at(top: f64) -> PositionOptions {
        PositionOptions::new(
            move || Rect::new(top, 0.0, 10.0, 10.0),
            [BalloonPosition::SouthEastArrowNorth],
        )
    }

    #[test]
    fn test_stack_shows_top_view() {
        let dom = Dom::new();
        let balloon = ContextualBalloon::new(&dom).unwrap();
        let a = content(&dom, "a");
        let b = content(&dom, "b");

        balloon
            .add(BalloonContent::new(&a, at(0.0)).with_class_name("first"))
            .unwrap();
        balloon.add(BalloonContent::new(&b, at(100.0))).unwrap();

        let panel = balloon.panel().element().unwrap();
        assert_eq!(balloon.visible_view(), Some(b.clone()));
        assert_eq!(dom.inner_html(panel), "<b></b>");
        assert_eq!(balloon.panel().view().get("top"), Value::from(120.0));

        balloon.remove(&b).unwrap();
        assert_eq!(balloon.visible_view(), Some(a.clone()));
        assert_eq!(dom.inner_html(panel), "<a></a>");
        assert!(dom.has_class(panel, "first"));

        balloon.remove(&a).unwrap();
        assert!(balloon.is_empty());
        assert!(!balloon.panel().is_visible());
        assert!(!dom.has_class(panel, "first"));
    }

    #[test]
    fn test_removing_hidden_view_keeps_visible_one() {
        let dom = Dom::new();
        let balloon = ContextualBalloon::new(&dom).unwrap();
        let a = content(&dom, "a");
        let b = content(&dom, "b");
        balloon.add(BalloonContent::new(&a, at(0.0))).unwrap();
        balloon.add(BalloonContent::new(&b, at(0.0))).unwrap();

        balloon.remove(&a).unwrap();
        assert_eq!(balloon.visible_view(), Some(b));
        assert!(balloon.panel().is_visible());
    }

    #[test]
    fn test_stack_errors() {
        let dom = Dom::new();
        let balloon = ContextualBalloon::new(&dom).unwrap();
        let a = content(&dom, "a");
        balloon.add(BalloonContent::new(&a, at(0.0))).unwrap();

        let err = balloon.add(BalloonContent::new(&a, at(0.0))).unwrap_err();
        assert_eq!(err.code(), "contextualballoon-add-view-exist");
        let err = balloon.remove(&content(&dom, "b")).unwrap_err();
        assert_eq!(err.code(), "contextualballoon-remove-view-not-exist");
    }

    #[test]
    fn test_update_position_replaces_options() {
        let dom = Dom::new();
        let balloon = ContextualBalloon::new(&dom).unwrap();
        let a = content(&dom, "a");
        balloon.add(BalloonContent::new(&a, at(0.0))).unwrap();

        let fired = Rc::new(std::cell::Cell::new(0));
        let counter = fired.clone();
        balloon.on("updatePosition", move |_, _| counter.set(counter.get() + 1));

        balloon.update_position(Some(at(50.0))).unwrap();
        assert_eq!(balloon.panel().view().get("top"), Value::from(70.0));
        balloon.update_position(None).unwrap();
        assert_eq!(fired.get(), 2);
    }
}
