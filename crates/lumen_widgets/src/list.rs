//! Lists

use lumen_view::{AsView, Dom, Result, Template, View, ViewCollection};

/// `ul.ck-reset.ck-list` rendering its `items`
#[derive(Clone, Debug)]
pub struct ListView {
    view: View,
    items: ViewCollection,
}

impl ListView {
    pub fn new(dom: &Dom) -> Result<Self> {
        let view = View::new(dom);
        let items = view.create_collection();
        view.set_template(
            Template::new("ul")
                .attr("class", "ck-reset")
                .attr("class", "ck-list")
                .collection(&items),
        )?;
        Ok(Self { view, items })
    }

    pub fn items(&self) -> &ViewCollection {
        &self.items
    }
}

impl AsView for ListView {
    fn view(&self) -> &View {
        &self.view
    }
}

/// `li.ck-list__item` rendering its `children`
#[derive(Clone, Debug)]
pub struct ListItemView {
    view: View,
    children: ViewCollection,
}

impl ListItemView {
    pub fn new(dom: &Dom) -> Result<Self> {
        let view = View::new(dom);
        let children = view.create_collection();
        view.set_template(
            Template::new("li")
                .attr("class", "ck-list__item")
                .collection(&children),
        )?;
        Ok(Self { view, children })
    }

    pub fn children(&self) -> &ViewCollection {
        &self.children
    }
}

impl AsView for ListItemView {
    fn view(&self) -> &View {
        &self.view
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_items_follow_collection() {
        let dom = Dom::new();
        let list = ListView::new(&dom).unwrap();
        let el = list.render().unwrap();
        assert_eq!(dom.outer_html(el), "<ul class=\"ck-reset ck-list\"></ul>");

        let first = ListItemView::new(&dom).unwrap();
        let second = ListItemView::new(&dom).unwrap();
        list.items().add(first.view()).unwrap();
        list.items().add_at(second.view(), 0).unwrap();
        assert_eq!(dom.child_count(el), 2);
        assert_eq!(dom.children(el)[0], second.element().unwrap());

        list.items().remove(second.view());
        assert_eq!(
            dom.inner_html(el),
            "<li class=\"ck-list__item\"></li>"
        );
    }

    #[test]
    fn test_destroy_reaches_items() {
        let dom = Dom::new();
        let list = ListView::new(&dom).unwrap();
        let item = ListItemView::new(&dom).unwrap();
        list.items().add(item.view()).unwrap();
        list.render().unwrap();

        list.destroy();
        assert!(item.view().is_destroyed());
    }
}
