//! Lumen Widgets
//!
//! Ready-made views built on [`lumen_view`]:
//!
//! - [`IconView`], [`TooltipView`], [`ButtonView`]
//! - [`ListView`] / [`ListItemView`], [`ToolbarView`] filled through a
//!   [`ComponentFactory`]
//! - [`BalloonPanelView`] and the shared [`ContextualBalloon`]
//! - [`ContextualToolbar`], following an [`EditingHost`] selection
//!
//! # Example
//!
//! ```rust
//! use lumen_view::{AsView, Dom};
//! use lumen_widgets::ButtonView;
//!
//! let dom = Dom::new();
//! let button = ButtonView::new(&dom).unwrap();
//! button.view().set("label", "Bold").unwrap();
//! button.view().set("withText", true).unwrap();
//!
//! let element = button.render().unwrap();
//! assert!(dom.has_class(element, "ck-button_with-text"));
//! ```

pub mod balloon;
pub mod button;
pub mod config;
pub mod editing;
pub mod error;
pub mod factory;
pub mod icon;
pub mod list;
pub mod toolbar;
pub mod tooltip;

pub use balloon::{
    BalloonContent, BalloonPanelView, BalloonPosition, ContextualBalloon, Placement,
    PositionOptions, Rect,
};
pub use button::ButtonView;
pub use config::{ContextualToolbarConfig, UiConfig};
pub use editing::{EditingHost, MemoryHost};
pub use error::{Result, WidgetError};
pub use factory::{ComponentConstructor, ComponentFactory};
pub use icon::IconView;
pub use list::{ListItemView, ListView};
pub use toolbar::contextual::{ContextualToolbar, ToolbarEvent, ToolbarState};
pub use toolbar::ToolbarView;
pub use tooltip::TooltipView;
