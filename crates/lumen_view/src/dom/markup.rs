//! SVG markup import

use thiserror::Error;

use super::{Dom, DomError, NodeId, SVG_NAMESPACE};

const XLINK_NAMESPACE: &str = "http://www.w3.org/1999/xlink";

#[derive(Debug, Error)]
pub enum MarkupError {
    #[error("malformed markup: {0}")]
    Parse(#[from] roxmltree::Error),

    #[error("markup has no <svg> element")]
    MissingSvg,

    #[error(transparent)]
    Dom(#[from] DomError),
}

/// Nodes imported from the inside of an `<svg>` element
#[derive(Debug, Clone, PartialEq)]
pub struct SvgFragment {
    /// The `viewBox` declared on the parsed `<svg>`, if any
    pub view_box: Option<String>,
    /// Detached top-level nodes, in document order
    pub nodes: Vec<NodeId>,
}

impl Dom {
    /// Parse SVG markup and import the children of its `<svg>` element
    ///
    /// Elements without an explicit namespace are placed in the SVG
    /// namespace. Whitespace-only text, comments and processing
    /// instructions are dropped.
    pub fn import_svg(&self, markup: &str) -> Result<SvgFragment, MarkupError> {
        let document = roxmltree::Document::parse(markup)?;
        let svg = document
            .descendants()
            .find(|node| node.is_element() && node.tag_name().name() == "svg")
            .ok_or(MarkupError::MissingSvg)?;

        let mut nodes = Vec::new();
        for child in svg.children() {
            if let Some(id) = self.import_node(child)? {
                nodes.push(id);
            }
        }

        Ok(SvgFragment {
            view_box: svg.attribute("viewBox").map(str::to_string),
            nodes,
        })
    }

    fn import_node(&self, node: roxmltree::Node<'_, '_>) -> Result<Option<NodeId>, MarkupError> {
        if node.is_text() {
            return Ok(node
                .text()
                .filter(|text| !text.trim().is_empty())
                .map(|text| self.create_text(text)));
        }
        if !node.is_element() {
            return Ok(None);
        }

        let namespace = node.tag_name().namespace().unwrap_or(SVG_NAMESPACE);
        let element = self.create_element_ns(node.tag_name().name(), Some(namespace));
        for attribute in node.attributes() {
            let name = match attribute.namespace() {
                Some(XLINK_NAMESPACE) => format!("xlink:{}", attribute.name()),
                _ => attribute.name().to_string(),
            };
            self.set_attribute(element, &name, attribute.value())?;
        }
        for child in node.children() {
            if let Some(id) = self.import_node(child)? {
                self.append_child(element, id)?;
            }
        }
        Ok(Some(element))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_svg_children() {
        let dom = Dom::new();
        let fragment = dom
            .import_svg(r#"<svg viewBox="10 20 30 40"><g id="t"><path d="M0 0"/></g></svg>"#)
            .unwrap();

        assert_eq!(fragment.view_box.as_deref(), Some("10 20 30 40"));
        assert_eq!(fragment.nodes.len(), 1);

        let g = fragment.nodes[0];
        assert_eq!(dom.tag_name(g).as_deref(), Some("g"));
        assert_eq!(dom.namespace(g).as_deref(), Some(SVG_NAMESPACE));
        assert_eq!(dom.get_attribute(g, "id").as_deref(), Some("t"));
        assert_eq!(dom.child_count(g), 1);
        assert_eq!(dom.parent(g), None);
    }

    #[test]
    fn test_import_with_declaration_and_whitespace() {
        let dom = Dom::new();
        let fragment = dom
            .import_svg(
                "<?xml version=\"1.0\"?>\n<svg xmlns=\"http://www.w3.org/2000/svg\">\n  <circle r=\"2\"/>\n  <!-- c -->\n</svg>",
            )
            .unwrap();

        assert_eq!(fragment.view_box, None);
        assert_eq!(fragment.nodes.len(), 1);
        assert_eq!(dom.outer_html(fragment.nodes[0]), "<circle r=\"2\"></circle>");
    }

    #[test]
    fn test_import_errors() {
        let dom = Dom::new();
        assert!(matches!(dom.import_svg("<svg>"), Err(MarkupError::Parse(_))));
        assert!(matches!(
            dom.import_svg("<div><span/></div>"),
            Err(MarkupError::MissingSvg)
        ));
    }
}
