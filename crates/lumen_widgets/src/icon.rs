//! SVG icons

use lumen_core::Value;
use lumen_view::{AsView, Bind, Dom, Result, Template, View};

/// Renders SVG markup held in its `content` attribute
///
/// Every content change re-parses the markup and replaces the element's
/// children. A `viewBox` on the parsed `<svg>` is adopted by the element.
#[derive(Clone, Debug)]
pub struct IconView {
    view: View,
}

impl IconView {
    pub fn new(dom: &Dom) -> Self {
        let view = View::with_template(
            dom,
            [
                ("content", Value::from("")),
                ("viewBox", Value::from("0 0 20 20")),
            ],
            |_| {
                Template::svg("svg")
                    .attr("class", "ck-icon")
                    .attr("viewBox", Bind::to("viewBox"))
            },
        );

        view.on_render(|view| {
            update_content(view)?;
            let weak = view.downgrade();
            view.on("change:content", move |_, _| {
                let Some(view) = weak.upgrade() else {
                    return;
                };
                if let Err(err) = update_content(&view) {
                    tracing::warn!(%err, "icon content rejected");
                }
            });
            Ok(())
        });

        Self { view }
    }

    pub fn set_content(&self, markup: &str) -> Result<()> {
        self.view.set("content", markup)
    }
}

impl AsView for IconView {
    fn view(&self) -> &View {
        &self.view
    }
}

fn update_content(view: &View) -> Result<()> {
    let Some(element) = view.element() else {
        return Ok(());
    };
    let content = view.get("content").to_text();
    let markup = content.trim();
    if markup.is_empty() {
        return Ok(());
    }

    let dom = view.dom();
    let fragment = dom.import_svg(markup)?;
    if let Some(view_box) = fragment.view_box.filter(|view_box| !view_box.is_empty()) {
        view.set("viewBox", view_box)?;
    }
    dom.set_text_content(element, "")?;
    for node in fragment.nodes {
        dom.append_child(element, node)?;
    }
    tracing::trace!(?element, "icon content updated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_view::SVG_NAMESPACE;

    #[test]
    fn test_renders_svg_element() {
        let dom = Dom::new();
        let icon = IconView::new(&dom);
        let el = icon.render().unwrap();

        assert_eq!(dom.tag_name(el).as_deref(), Some("svg"));
        assert_eq!(dom.namespace(el).as_deref(), Some(SVG_NAMESPACE));
        assert_eq!(dom.get_attribute(el, "class").as_deref(), Some("ck-icon"));
        assert_eq!(dom.get_attribute(el, "viewBox").as_deref(), Some("0 0 20 20"));
        assert_eq!(dom.child_count(el), 0);
    }

    #[test]
    fn test_content_adopts_view_box() {
        let dom = Dom::new();
        let icon = IconView::new(&dom);
        icon.set_content(r#"<svg viewBox="10 20 30 40"><g id="t"/></svg>"#)
            .unwrap();
        let el = icon.render().unwrap();

        assert_eq!(dom.get_attribute(el, "viewBox").as_deref(), Some("10 20 30 40"));
        let children = dom.children(el);
        assert_eq!(children.len(), 1);
        assert_eq!(dom.tag_name(children[0]).as_deref(), Some("g"));
        assert_eq!(dom.get_attribute(children[0], "id").as_deref(), Some("t"));
    }

    #[test]
    fn test_content_change_replaces_children() {
        let dom = Dom::new();
        let icon = IconView::new(&dom);
        let el = icon.render().unwrap();

        icon.set_content(r#"<svg><g id="a"/><g id="b"/></svg>"#).unwrap();
        assert_eq!(dom.child_count(el), 2);

        icon.set_content(r#"<svg viewBox="1 2 3 4"><circle/></svg>"#).unwrap();
        let children = dom.children(el);
        assert_eq!(children.len(), 1);
        assert_eq!(dom.tag_name(children[0]).as_deref(), Some("circle"));
        assert_eq!(dom.get_attribute(el, "viewBox").as_deref(), Some("1 2 3 4"));
    }

    #[test]
    fn test_empty_view_box_is_not_adopted() {
        let dom = Dom::new();
        let icon = IconView::new(&dom);
        let el = icon.render().unwrap();

        icon.set_content(r#"<svg viewBox=""><circle/></svg>"#).unwrap();
        assert_eq!(dom.get_attribute(el, "viewBox").as_deref(), Some("0 0 20 20"));
        assert_eq!(icon.view().get("viewBox"), Value::from("0 0 20 20"));
        assert_eq!(dom.child_count(el), 1);
    }

    #[test]
    fn test_malformed_content_is_rejected_on_render() {
        let dom = Dom::new();
        let icon = IconView::new(&dom);
        icon.set_content("<svg><g></svg>").unwrap();
        assert!(icon.render().is_err());
    }
}
