//! Tooltips

use lumen_core::Value;
use lumen_view::{AsView, Bind, Dom, Template, View};

#[derive(Clone, Debug)]
pub struct TooltipView {
    view: View,
}

impl TooltipView {
    /// A tooltip below its owner (`position = "s"`); `"n"` places it above
    pub fn new(dom: &Dom) -> Self {
        let view = View::with_template(
            dom,
            [("text", Value::from("")), ("position", Value::from("s"))],
            |_| {
                Template::new("span")
                    .attr("class", "ck-tooltip")
                    .attr(
                        "class",
                        Bind::to_with("position", |position| {
                            Value::from(format!("ck-tooltip_{}", position.to_text()))
                        }),
                    )
                    .attr(
                        "class",
                        Bind::when_with("text", "ck-hidden", |text| !text.is_truthy()),
                    )
                    .child(
                        Template::new("span")
                            .attr("class", "ck-tooltip__text")
                            .text(Bind::to("text")),
                    )
            },
        );
        Self { view }
    }
}

impl AsView for TooltipView {
    fn view(&self) -> &View {
        &self.view
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_until_text_is_set() {
        let dom = Dom::new();
        let tooltip = TooltipView::new(&dom);
        let el = tooltip.render().unwrap();
        assert_eq!(
            dom.outer_html(el),
            "<span class=\"ck-tooltip ck-tooltip_s ck-hidden\">\
             <span class=\"ck-tooltip__text\"></span></span>"
        );

        tooltip.view().set("text", "Bold").unwrap();
        tooltip.view().set("position", "n").unwrap();
        assert_eq!(
            dom.outer_html(el),
            "<span class=\"ck-tooltip ck-tooltip_n\">\
             <span class=\"ck-tooltip__text\">Bold</span></span>"
        );
    }
}
