use crate::dom::{NodeId, Page};
use crate::fetch::FieldType;
use crate::geometry::px;

pub const CURSOR_CLASS: &str = "visual-builder__cursor";
pub const CURSOR_ICON_CLASS: &str = "visual-builder__cursor-icon";
const CURSOR_VISIBLE_CLASS: &str = "visible";
const CURSOR_DISABLED_CLASS: &str = "visual-builder__cursor--disabled";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorIcon {
    /// Shown while the schema of the hovered field is still being fetched.
    Loading,
    Field(FieldType),
    Disabled(FieldType),
}

impl CursorIcon {
    pub fn label(self) -> &'static str {
        match self {
            Self::Loading => "Loading",
            Self::Field(field_type) | Self::Disabled(field_type) => field_type.cursor_label(),
        }
    }

    fn key(self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Field(_) => "field",
            Self::Disabled(_) => "disabled",
        }
    }
}

/// The custom pointer that follows the mouse over editable fields.
#[derive(Debug)]
pub struct Cursor {
    root: NodeId,
    icon: NodeId,
}

impl Cursor {
    pub fn mount(page: &dyn Page) -> Self {
        let root = page.create_element("div");
        page.add_class(root, CURSOR_CLASS);
        let icon = page.create_element("span");
        page.add_class(icon, CURSOR_ICON_CLASS);
        page.append_child(root, icon);
        page.append_child(page.body(), root);
        Self { root, icon }
    }

    pub fn is_visible(&self, page: &dyn Page) -> bool {
        page.has_class(self.root, CURSOR_VISIBLE_CLASS)
    }

    pub fn show(&self, page: &dyn Page, x: f64, y: f64, icon: CursorIcon) {
        self.move_to(page, x, y);
        self.set_icon(page, icon);
        page.add_class(self.root, CURSOR_VISIBLE_CLASS);
    }

    pub fn move_to(&self, page: &dyn Page, x: f64, y: f64) {
        page.set_style(self.root, "top", &px(y));
        page.set_style(self.root, "left", &px(x));
    }

    /// Swaps the icon in place; the cursor keeps its position and visibility.
    pub fn set_icon(&self, page: &dyn Page, icon: CursorIcon) {
        page.set_attribute(self.icon, "data-icon", icon.key());
        page.set_text_content(self.icon, icon.label());
        if matches!(icon, CursorIcon::Disabled(_)) {
            page.add_class(self.root, CURSOR_DISABLED_CLASS);
        } else {
            page.remove_class(self.root, CURSOR_DISABLED_CLASS);
        }
    }

    pub fn icon(&self, page: &dyn Page) -> Option<String> {
        page.attribute(self.icon, "data-icon")
    }

    pub fn hide(&self, page: &dyn Page) {
        page.remove_class(self.root, CURSOR_VISIBLE_CLASS);
    }

    pub fn unmount(&self, page: &dyn Page) {
        page.remove_node(self.root);
    }
}
