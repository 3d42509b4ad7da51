use std::rc::Rc;

use super::{Inner, PointerSample};
use crate::dom::{closest_with_attribute, NodeId};
use crate::overlay::{instance_direction, CursorIcon};
use crate::path::FieldLocator;

impl Inner {
    pub(super) fn handle_hover(self: &Rc<Self>, sample: PointerSample) {
        if self.destroyed.get() {
            return;
        }
        let page = self.page();

        if self.buttons.borrow().contains(page, sample.target) {
            self.cursor.hide(page);
            return;
        }

        let Some((node, locator)) = self.field_at(sample.target) else {
            self.clear_hover();
            return;
        };

        let entered = self.state.borrow_mut().hover(node);
        if !entered {
            self.cursor.move_to(page, sample.x, sample.y);
            return;
        }

        self.buttons.borrow_mut().clear(page);
        self.cursor.show(page, sample.x, sample.y, CursorIcon::Loading);
        self.spawn(Rc::clone(self).resolve_hover(node, locator));
    }

    /// The nearest field root at or above `target` and its parsed location.
    pub(super) fn field_at(&self, target: NodeId) -> Option<(NodeId, FieldLocator)> {
        let page = self.page();
        let node = closest_with_attribute(page, target, self.identity_attribute())?;
        let raw = page.attribute(node, self.identity_attribute())?;
        let locator = FieldLocator::parse(&raw);
        if !locator.is_valid() {
            tracing::debug!(path = %raw, "ignoring node with malformed field path");
            return None;
        }
        Some((node, locator))
    }

    pub(super) fn clear_hover(&self) {
        let page = self.page();
        self.state.borrow_mut().unhover();
        self.cursor.hide(page);
        self.buttons.borrow_mut().clear(page);
    }

    /// Re-checked after every await; a hover target the page dropped in the
    /// meantime clears the hover affordances.
    fn is_still_hovered(&self, node: NodeId) -> bool {
        if self.destroyed.get() || self.state.borrow().hovered() != Some(node) {
            return false;
        }
        if !self.page().is_connected(node) {
            tracing::debug!(?node, "hovered node left the document");
            self.clear_hover();
            return false;
        }
        true
    }

    async fn resolve_hover(self: Rc<Self>, node: NodeId, locator: FieldLocator) {
        let schema = self.store.field_schema(&locator).await;
        if !self.is_still_hovered(node) {
            return;
        }
        let page = self.page();
        let Some(schema) = schema else {
            self.cursor.hide(page);
            return;
        };

        let audience = self.mode.borrow().audience;
        let disabled = self.store.disabled_state(&schema, &locator, audience).await;
        if !self.is_still_hovered(node) {
            return;
        }

        let field_type = schema.field_type();
        let icon = if disabled.is_disabled() {
            CursorIcon::Disabled(field_type)
        } else {
            CursorIcon::Field(field_type)
        };
        self.cursor.set_icon(page, icon);

        if schema.is_multi_instance() && locator.is_instance() && !disabled.is_disabled() {
            let direction = instance_direction(page, node, self.identity_attribute());
            let rendered = self
                .buttons
                .borrow_mut()
                .render(page, node, &locator, direction);
            tracing::trace!(path = %locator.cslp_value, rendered, "instance buttons");
        }
    }
}
