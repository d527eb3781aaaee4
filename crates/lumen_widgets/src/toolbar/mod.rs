//! Toolbars

pub mod contextual;

use lumen_view::{AsView, Dom, Template, View, ViewCollection};

use crate::error::Result;
use crate::factory::ComponentFactory;

/// `div.ck-toolbar` rendering its `items`
#[derive(Clone, Debug)]
pub struct ToolbarView {
    view: View,
    items: ViewCollection,
}

impl ToolbarView {
    pub fn new(dom: &Dom) -> Result<Self> {
        let view = View::new(dom);
        let items = view.create_collection();
        view.set_template(
            Template::new("div")
                .attr("class", "ck-toolbar")
                .collection(&items),
        )?;
        Ok(Self { view, items })
    }

    pub fn items(&self) -> &ViewCollection {
        &self.items
    }

    /// Append one component per configured name
    ///
    /// Stops at the first name the factory does not know.
    pub fn fill_from_config<S: AsRef<str>>(&self, names: &[S], factory: &ComponentFactory) -> Result<()> {
        for name in names {
            let item = factory.create(name.as_ref())?;
            self.items.add(&item)?;
        }
        tracing::debug!(items = self.items.len(), "toolbar filled");
        Ok(())
    }
}

impl AsView for ToolbarView {
    fn view(&self) -> &View {
        &self.view
    }
}
