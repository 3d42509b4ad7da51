use std::rc::Rc;

use serde_json::{json, Value};

use super::{Inner, PointerSample};
use crate::channel::events;
use crate::commit::{
    discard_pseudo_editable, finish_edit, make_editable, needs_pseudo_editable, spawn_pseudo_editable,
};
use crate::dom::{is_descendant_of, MutationRecord, NodeId};
use crate::geometry::OutlineTint;
use crate::overlay::empty_block_target;
use crate::path::FieldLocator;
use crate::state::{EditTarget, SelectedField};

impl Inner {
    pub(super) fn handle_click(self: &Rc<Self>, click: PointerSample) {
        if self.destroyed.get() {
            return;
        }
        let page = self.page();
        let target = click.target;

        if self.mode.borrow().collab {
            self.create_thread(click);
            return;
        }

        let (on_toolbar, on_mask) = {
            let overlay = self.overlay.borrow();
            (overlay.is_toolbar(page, target), overlay.is_mask_panel(target))
        };
        if on_toolbar {
            return;
        }
        if on_mask {
            self.release_focus();
            return;
        }

        if let Some(field) = empty_block_target(page, target) {
            self.add_instance(&field, 0);
            return;
        }
        let button = self.buttons.borrow().target(page, target);
        if let Some((field, index)) = button {
            self.add_instance(&field, index);
            return;
        }
        if self.is_inside_edit_target(target) {
            return;
        }

        match self.field_at(target) {
            Some((node, _)) => self.focus_node(node, false),
            None => self.release_focus(),
        }
    }

    fn is_inside_edit_target(&self, target: NodeId) -> bool {
        let editable = self
            .state
            .borrow()
            .selected()
            .and_then(|field| field.edit.as_ref())
            .map(|edit| edit.editable);
        editable.is_some_and(|editable| is_descendant_of(self.page(), target, editable))
    }

    fn create_thread(&self, click: PointerSample) {
        let mut payload = json!({ "position": { "x": click.x, "y": click.y } });
        if let Some((_, locator)) = self.field_at(click.target) {
            payload["fieldMetadata"] = json!(locator);
        }
        self.notify(events::COLLAB_CREATE_THREAD, payload);
    }

    fn add_instance(&self, field: &FieldLocator, index: usize) {
        tracing::debug!(path = %field.cslp_value, index, "add instance requested");
        self.notify(
            events::ADD_INSTANCE,
            json!({ "fieldMetadata": field, "index": index }),
        );
    }

    /// Focuses `node`. Re-evaluation releases and re-focuses the already
    /// selected node after the host re-rendered it.
    pub(super) fn focus_node(self: &Rc<Self>, node: NodeId, re_evaluate: bool) {
        let Some(raw) = self.page().attribute(node, self.identity_attribute()) else {
            self.release_focus();
            return;
        };
        let locator = FieldLocator::parse(&raw);
        let already_selected = self.state.borrow().is_selected(node);
        if already_selected && !re_evaluate {
            return;
        }

        self.release_focus();
        if !locator.is_valid() {
            tracing::debug!(path = %raw, "clicked node has a malformed field path");
            return;
        }

        let focused = self
            .state
            .borrow_mut()
            .focus(SelectedField::new(node, locator.clone()));
        if let Err(err) = focused {
            tracing::warn!(%err, "focus refused");
            return;
        }

        self.page.observe_resize(node);
        self.watch_mutations();
        self.notify(
            events::MOUSE_CLICK,
            json!({ "cslpData": raw, "fieldMetadata": locator }),
        );
        self.spawn(Rc::clone(self).complete_focus(node, locator));
    }

    fn is_still_selected(&self, node: NodeId) -> bool {
        !self.destroyed.get() && self.state.borrow().is_selected(node)
    }

    async fn complete_focus(self: Rc<Self>, node: NodeId, locator: FieldLocator) {
        let schema = self.store.field_schema(&locator).await;
        if !self.is_still_selected(node) {
            return;
        }
        let Some(schema) = schema else {
            tracing::debug!(path = %locator.cslp_value, "no schema for focused field; dropping focus");
            self.release_focus();
            return;
        };

        let audience = self.mode.borrow().audience;
        let disabled = self.store.disabled_state(&schema, &locator, audience).await;
        if !self.is_still_selected(node) {
            return;
        }

        let field_type = schema.field_type();
        let described = self.state.borrow_mut().describe(node, field_type, disabled);
        if let Err(err) = described {
            tracing::debug!(%err, "selection changed while focusing");
            return;
        }

        let page = self.page();
        let (tint, label) = match disabled.reason {
            Some(reason) => (OutlineTint::Disabled, reason.message()),
            None => (OutlineTint::Enabled, field_type.cursor_label()),
        };
        self.overlay.borrow_mut().show(page, node, tint, label);
        self.notify(
            events::FOCUS_FIELD,
            json!({
                "fieldMetadata": locator,
                "disabled": disabled.is_disabled(),
                "reason": disabled.reason.map(|reason| reason.message()),
            }),
        );

        if disabled.is_disabled() || !self.config.inline_editing || !field_type.is_inline_editable() {
            return;
        }

        let stored = self.store.field_data(&locator).await;
        if !self.is_still_selected(node) {
            return;
        }
        let page = self.page();
        let multiline = field_type.is_multiline();
        let stored = stored.as_ref().and_then(stored_text);
        let rendered = page.text_content(node);

        let edit = match stored {
            Some(value) if needs_pseudo_editable(&rendered, Some(value.as_str())) => {
                EditTarget::pseudo(spawn_pseudo_editable(page, node, &value), multiline)
            }
            _ => {
                make_editable(page, node);
                EditTarget::inline(node, multiline)
            }
        };
        let pseudo = edit.pseudo;
        let attached = self.state.borrow_mut().attach_edit(node, edit);
        if let Err(err) = attached {
            tracing::debug!(%err, "selection changed before editing started");
            match pseudo {
                Some(pseudo) => discard_pseudo_editable(page, node, pseudo),
                None => page.remove_attribute(node, "contenteditable"),
            }
        }
    }

    pub(super) fn handle_input(&self, target: NodeId) {
        let editable = self
            .state
            .borrow()
            .selected()
            .and_then(|field| field.edit.as_ref())
            .map(|edit| edit.editable);
        let Some(editable) = editable else {
            return;
        };
        if is_descendant_of(self.page(), target, editable) {
            self.state.borrow_mut().mark_input(editable);
            self.reposition();
        }
    }

    /// Commits and clears the selection; a no-op when nothing is focused.
    pub(super) fn release_focus(&self) {
        let released = self.state.borrow_mut().release();
        let Ok(field) = released else {
            return;
        };
        let page = self.page();
        self.stop_watching();
        page.unobserve_resize(field.node);

        if let Some(edit) = field.edit.as_ref() {
            if let Some(payload) = finish_edit(page, field.node, edit, &field.locator) {
                tracing::debug!(path = %field.locator.cslp_value, "committing field edit");
                self.notify(events::UPDATE_FIELD, json!(payload));
            }
            if edit.pseudo.is_some() {
                self.overlay.borrow().reposition(page, field.node);
            }
        }
        self.overlay.borrow().hide(page);
    }

    pub(super) fn handle_mutations(self: &Rc<Self>, records: &[MutationRecord]) {
        if self.destroyed.get() {
            return;
        }
        let page = self.page();
        let selected = self.state.borrow().selected_node();

        let mut re_evaluate = false;
        let mut children_changed = false;
        for record in records {
            match record {
                MutationRecord::Attribute { target, name } => {
                    if Some(*target) == selected && *name == self.config.identity_attribute {
                        re_evaluate = true;
                    }
                }
                MutationRecord::ChildList { .. } => children_changed = true,
            }
        }

        let detached = self.state.borrow().is_selection_detached(page);
        if detached {
            tracing::debug!(?selected, "focused node left the document; unfocusing");
            self.release_focus();
        } else if let Some(node) = selected.filter(|_| re_evaluate) {
            tracing::debug!(?node, "focused node re-rendered; re-evaluating");
            self.stop_watching();
            self.focus_node(node, true);
        }

        let forgotten = self.state.borrow_mut().forget_detached_hover(page);
        if forgotten.is_some() {
            self.cursor.hide(page);
            self.buttons.borrow_mut().clear(page);
        }

        if children_changed && self.config.empty_block_placeholders {
            self.spawn(Rc::clone(self).refresh_empty_blocks());
        }
    }

    pub(super) fn reposition(&self) {
        if self.destroyed.get() {
            return;
        }
        let page = self.page();
        // Until the schema resolves the overlay has no tint or label to show.
        let described = self
            .state
            .borrow()
            .selected()
            .filter(|field| field.field_type.is_some())
            .map(|field| field.node);
        if let Some(node) = described {
            self.overlay.borrow().reposition(page, node);
        }
        self.comments.borrow().reposition(page);
    }
}

/// Stored values that can be typed into as text.
fn stored_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}
