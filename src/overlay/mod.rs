//! Focus mask, outline, toolbar and the other page-level affordances.

mod comments;
mod cursor;
mod instances;

pub use comments::{CommentHighlights, COMMENT_ICON_CLASS};
pub use cursor::{Cursor, CursorIcon, CURSOR_CLASS, CURSOR_ICON_CLASS};
pub use instances::{
    empty_block_of, empty_block_target, find_instance_buttons, instance_direction,
    render_empty_block, InstanceButtons, InstanceDirection, ADD_INSTANCE_BUTTON_CLASS,
    EMPTY_BLOCK_CLASS, INSTANCE_BUTTONS_CLASS,
};

use crate::dom::{NodeId, Page};
use crate::geometry::{compute_overlay, px, MaskPanel, OutlineTint, OverlayGeometry, StyleBox};

pub const OVERLAY_WRAPPER_CLASS: &str = "visual-builder__overlay__wrapper";
pub const OVERLAY_PANEL_CLASS: &str = "visual-builder__overlay";
pub const OVERLAY_OUTLINE_CLASS: &str = "visual-builder__overlay--outline";
pub const TOOLBAR_CLASS: &str = "visual-builder__focused-toolbar";
pub const VISIBLE_CLASS: &str = "visible";

const TOOLBAR_HEIGHT: f64 = 32.0;

/// Mask panels, outline and toolbar around the focused field.
#[derive(Debug)]
pub struct FocusOverlay {
    wrapper: NodeId,
    panels: [(MaskPanel, NodeId); 4],
    outline: NodeId,
    toolbar: NodeId,
    tint: OutlineTint,
}

impl FocusOverlay {
    pub fn mount(page: &dyn Page) -> Self {
        let wrapper = page.create_element("div");
        page.add_class(wrapper, OVERLAY_WRAPPER_CLASS);
        page.append_child(page.body(), wrapper);

        let panels = MaskPanel::ALL.map(|panel| {
            let node = page.create_element("div");
            page.add_class(node, OVERLAY_PANEL_CLASS);
            page.add_class(node, panel.class_name());
            page.append_child(wrapper, node);
            (panel, node)
        });

        let outline = page.create_element("div");
        page.add_class(outline, OVERLAY_OUTLINE_CLASS);
        page.append_child(wrapper, outline);

        let toolbar = page.create_element("div");
        page.add_class(toolbar, TOOLBAR_CLASS);
        page.append_child(page.body(), toolbar);

        Self {
            wrapper,
            panels,
            outline,
            toolbar,
            tint: OutlineTint::Enabled,
        }
    }

    pub fn is_visible(&self, page: &dyn Page) -> bool {
        page.has_class(self.wrapper, VISIBLE_CLASS)
    }

    /// Clicking one of the dimmed panels releases focus.
    pub fn is_mask_panel(&self, node: NodeId) -> bool {
        self.panels.iter().any(|(_, panel)| *panel == node)
    }

    pub fn is_toolbar(&self, page: &dyn Page, node: NodeId) -> bool {
        crate::dom::is_descendant_of(page, node, self.toolbar)
    }

    /// Renders the mask around `target`. A degenerate target hides the
    /// overlay instead; returns whether the overlay is now visible.
    pub fn show(&mut self, page: &dyn Page, target: NodeId, tint: OutlineTint, label: &str) -> bool {
        self.tint = tint;
        page.set_text_content(self.toolbar, label);
        if matches!(tint, OutlineTint::Disabled) {
            page.set_attribute(self.toolbar, "data-disabled", "true");
        } else {
            page.remove_attribute(self.toolbar, "data-disabled");
        }
        self.reposition(page, target)
    }

    /// Re-reads the target's box and rewrites the styles; idempotent.
    pub fn reposition(&self, page: &dyn Page, target: NodeId) -> bool {
        let Some(geometry) = compute_overlay(page.bounding_rect(target), page.viewport(), self.tint)
        else {
            tracing::debug!(?target, "focus target has no layout; hiding overlay");
            self.hide(page);
            return false;
        };
        self.apply(page, &geometry);
        page.add_class(self.wrapper, VISIBLE_CLASS);
        page.add_class(self.toolbar, VISIBLE_CLASS);
        true
    }

    fn apply(&self, page: &dyn Page, geometry: &OverlayGeometry) {
        for (panel, node) in self.panels {
            apply_box(page, node, geometry.panel(panel));
        }
        apply_box(page, self.outline, geometry.outline);
        page.set_style(self.outline, "outline-color", geometry.tint.color());

        let toolbar_top = (geometry.outline.top - TOOLBAR_HEIGHT).max(0.0);
        page.set_style(self.toolbar, "top", &px(toolbar_top));
        page.set_style(self.toolbar, "left", &px(geometry.outline.left));
    }

    pub fn hide(&self, page: &dyn Page) {
        page.remove_class(self.wrapper, VISIBLE_CLASS);
        page.remove_class(self.toolbar, VISIBLE_CLASS);
    }

    pub fn unmount(&self, page: &dyn Page) {
        page.remove_node(self.wrapper);
        page.remove_node(self.toolbar);
    }

    #[cfg(test)]
    pub(crate) fn panel_node(&self, panel: MaskPanel) -> NodeId {
        self.panels
            .iter()
            .find(|(candidate, _)| *candidate == panel)
            .map(|(_, node)| *node)
            .unwrap_or(self.outline)
    }
}

pub(crate) fn apply_box(page: &dyn Page, node: NodeId, style: StyleBox) {
    for (property, value) in style.declarations() {
        page.set_style(node, property, &value);
    }
}
