//! Floating balloon panels
//!
//! [`BalloonPanelView`] is a positioned panel with an arrow pointing at
//! its target. [`ContextualBalloon`] shares one panel between several
//! widgets as a stack of contents, showing only the most recent one.

pub mod contextual;
pub mod position;

use std::cell::Cell;
use std::rc::Rc;

use lumen_core::Value;
use lumen_view::{AsView, Bind, Dom, Result, Template, View, ViewCollection};

pub use contextual::{BalloonContent, ContextualBalloon};
pub use position::{
    BalloonPosition, Placement, PositionOptions, Rect, ARROW_HORIZONTAL_OFFSET,
    ARROW_VERTICAL_OFFSET,
};

/// A positioned panel with `content`
///
/// Attributes: `top`, `left` (px), `position` (arrow class suffix),
/// `isVisible`, `className`.
#[derive(Clone, Debug)]
pub struct BalloonPanelView {
    view: View,
    content: ViewCollection,
    size: Rc<Cell<(f64, f64)>>,
}

impl BalloonPanelView {
    pub fn new(dom: &Dom) -> Result<Self> {
        let view = View::with_attributes(
            dom,
            [
                ("top", Value::from(0)),
                ("left", Value::from(0)),
                ("position", Value::from("arrow_nw")),
                ("isVisible", Value::from(false)),
                ("className", Value::Undefined),
            ],
        );
        let content = view.create_collection();
        view.set_template(
            Template::new("div")
                .attr("class", "ck-balloon-panel")
                .attr(
                    "class",
                    Bind::to_with("position", |position| {
                        Value::from(format!("ck-balloon-panel_{}", position.to_text()))
                    }),
                )
                .attr("class", Bind::when("isVisible", "ck-balloon-panel_visible"))
                .attr("class", Bind::to("className"))
                .attr(
                    "style",
                    Bind::to_with("top", |top| Value::from(format!("top: {}px;", top.to_text()))),
                )
                .attr(
                    "style",
                    Bind::to_with("left", |left| Value::from(format!("left: {}px;", left.to_text()))),
                )
                .collection(&content),
        )?;
        Ok(Self {
            view,
            content,
            size: Rc::new(Cell::new((0.0, 0.0))),
        })
    }

    pub fn content(&self) -> &ViewCollection {
        &self.content
    }

    /// Rendered size used when choosing a position
    pub fn set_size(&self, width: f64, height: f64) {
        self.size.set((width, height));
    }

    pub fn size(&self) -> (f64, f64) {
        self.size.get()
    }

    /// Place the panel against the target of `options` and show it
    pub fn attach_to(&self, options: &PositionOptions) -> Result<BalloonPosition> {
        let (width, height) = self.size.get();
        let placement = options.choose(width, height);
        self.view.set("top", placement.top)?;
        self.view.set("left", placement.left)?;
        self.view.set("position", placement.position.arrow_name())?;
        self.view.set("isVisible", true)?;
        tracing::debug!(position = placement.position.name(), "balloon attached");
        Ok(placement.position)
    }

    pub fn show(&self) -> Result<()> {
        self.view.set("isVisible", true)
    }

    pub fn hide(&self) -> Result<()> {
        self.view.set("isVisible", false)
    }

    pub fn is_visible(&self) -> bool {
        self.view.get("isVisible").is_truthy()
    }
}

impl AsView for BalloonPanelView {
    fn view(&self) -> &View {
        &self.view
    }
}
