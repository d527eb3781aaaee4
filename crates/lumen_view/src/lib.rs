//! Lumen View
//!
//! The view layer of the Lumen UI toolkit:
//!
//! - **DOM**: an in-memory element tree with selectors, bubbling events and
//!   SVG markup import
//! - **Templates**: declarative element descriptions whose bound values
//!   follow model attributes
//! - **Views**: a model plus a template, with named regions of child views
//! - **Collections**: ordered child views mounted live into the DOM
//!
//! # Example
//!
//! ```rust
//! use lumen_view::{Bind, Dom, Template, View};
//!
//! let dom = Dom::new();
//! let view = View::new(&dom);
//! view.set("label", "Bold").unwrap();
//! view.set_template(Template::new("p").attr("class", Bind::to("label"))).unwrap();
//!
//! let element = view.render().unwrap();
//! view.set("label", "Italic").unwrap();
//! assert_eq!(dom.outer_html(element), "<p class=\"Italic\"></p>");
//! ```

pub mod collection;
pub mod dom;
pub mod error;
pub mod template;
pub mod view;

pub use collection::{MountAnchor, ViewCollection, WeakViewCollection};
pub use dom::{
    Dom, DomError, DomEvent, DomListenerId, MarkupError, NodeId, NodeKind, SelectorError,
    SelectorList, SvgFragment, WeakDom, SVG_NAMESPACE,
};
pub use error::{RegionOp, Result, ViewError, ViewErrorKind};
pub use template::{
    AttributeBinding, Bind, BindMode, DomEventInfo, EventHandler, RenderedTemplate, Template,
    TemplateChild, TemplateValue,
};
pub use view::{AsView, RegionSelector, View, WeakView};
