//! Buttons

use lumen_core::Value;
use lumen_view::{AsView, Bind, Dom, Template, View, ViewCollection};

use crate::error::Result;
use crate::icon::IconView;
use crate::tooltip::TooltipView;

/// A clickable button with an optional icon, label and tooltip
///
/// Attributes:
/// - `label`, `keystroke`, `icon` (SVG markup)
/// - `tooltip`: `true` for "label (keystroke)", a string, or a callback
///   receiving `[label, keystroke]`
/// - `tooltipPosition` (`"s"`), `type` (`"button"` when unset)
/// - `isOn`, `isEnabled`, `isVisible`, `withText`, `tabindex` (`-1`)
///
/// Fires `execute` on click while enabled.
#[derive(Clone, Debug)]
pub struct ButtonView {
    view: View,
    children: ViewCollection,
    tooltip: TooltipView,
    label: View,
}

impl ButtonView {
    pub fn new(dom: &Dom) -> Result<Self> {
        let view = View::with_attributes(
            dom,
            [
                ("label", Value::Undefined),
                ("keystroke", Value::Undefined),
                ("tooltip", Value::Undefined),
                ("tooltipPosition", Value::from("s")),
                ("type", Value::Undefined),
                ("isOn", Value::from(false)),
                ("isEnabled", Value::from(true)),
                ("isVisible", Value::from(true)),
                ("withText", Value::from(false)),
                ("icon", Value::Undefined),
                ("tabindex", Value::from(-1)),
            ],
        );
        let children = view.create_collection();
        view.set_template(button_template(&view, &children))?;

        let tooltip = TooltipView::new(dom);
        let model = view.model();
        tooltip
            .view()
            .bind(&["text"])?
            .to(model, &["tooltip"])?
            .to(model, &["label"])?
            .to(model, &["keystroke"])?
            .as_fn(tooltip_text)?;
        tooltip
            .view()
            .bind(&["position"])?
            .to(model, &["tooltipPosition"])?;

        let label = View::with_model(dom, model);
        label.set_template(
            Template::new("span")
                .attr("class", "ck-button__label")
                .text(Bind::to("label")),
        )?;

        children.add(tooltip.view())?;
        children.add(&label)?;

        let icon_children = children.clone();
        view.on_render(move |view| {
            if !view.get("icon").is_truthy() {
                return Ok(());
            }
            let icon = IconView::new(view.dom());
            icon.view().bind(&["content"])?.to(view.model(), &["icon"])?;
            icon.view()
                .extend_template(|template| template.extend(Template::extension().attr("class", "ck-button__icon")))?;
            icon_children.add_at(icon.view(), 0)?;
            Ok(())
        });

        Ok(Self {
            view,
            children,
            tooltip,
            label,
        })
    }

    /// Focus the button element
    pub fn focus(&self) {
        self.view.focus();
    }

    pub fn children(&self) -> &ViewCollection {
        &self.children
    }

    pub fn tooltip_view(&self) -> &TooltipView {
        &self.tooltip
    }

    pub fn label_view(&self) -> &View {
        &self.label
    }

    /// The icon, once rendered with an `icon` set
    pub fn icon_view(&self) -> Option<View> {
        self.children
            .get(0)
            .filter(|first| first != self.tooltip.view() && *first != self.label)
    }
}

impl AsView for ButtonView {
    fn view(&self) -> &View {
        &self.view
    }
}

fn button_template(view: &View, children: &ViewCollection) -> Template {
    let model = view.model().downgrade();
    Template::new("button")
        .attr("class", "ck-button")
        .attr(
            "class",
            Bind::to_with("isEnabled", |enabled| {
                Value::from(if enabled.is_truthy() { "ck-enabled" } else { "ck-disabled" })
            }),
        )
        .attr(
            "class",
            Bind::to_with("isOn", |on| Value::from(if on.is_truthy() { "ck-on" } else { "ck-off" })),
        )
        .attr(
            "class",
            Bind::when_with("isVisible", "ck-hidden", |visible| !visible.is_truthy()),
        )
        .attr("class", Bind::when("withText", "ck-button_with-text"))
        .attr(
            "type",
            Bind::to_with("type", |kind| {
                if kind.is_template_falsy() {
                    Value::from("button")
                } else {
                    kind.clone()
                }
            }),
        )
        .attr("tabindex", Bind::to("tabindex"))
        .collection(children)
        // Keep the editing focus where it is.
        .on_call("mousedown", |event| event.prevent_default())
        .on_call("click", move |event| {
            let Some(model) = model.upgrade() else {
                return;
            };
            if model.get("isEnabled").is_truthy() {
                model.fire("execute", &[]);
            } else {
                event.prevent_default();
            }
        })
}

/// Tooltip text from `[tooltip, label, keystroke]`
fn tooltip_text(values: &[Value]) -> Value {
    let [tooltip, label, keystroke] = values else {
        return Value::from("");
    };
    match tooltip {
        Value::Callback(callback) => callback.call(&[label.clone(), keystroke.clone()]),
        Value::Str(text) => Value::from(text.as_str()),
        Value::Bool(true) if keystroke.is_truthy() => {
            Value::from(format!("{} ({})", label.to_text(), keystroke.to_text()))
        }
        Value::Bool(true) => Value::from(label.to_text()),
        _ => Value::from(""),
    }
}
