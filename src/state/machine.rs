use super::error::{StateError, StateResult};
use super::{EditTarget, FocusEvent, FocusPhase, FocusTransition, SelectedField};
use crate::dom::{NodeId, Page};
use crate::fetch::{FieldDisabledState, FieldType};

const TRANSITION_HISTORY_LIMIT: usize = 64;

/// The single "what is hovered / focused now" fact shared by every handler.
///
/// All writes go through the mutators below; at most one field is selected at
/// any instant, and a new selection is refused until the previous one has been
/// released.
#[derive(Debug, Default)]
pub struct FocusState {
    hovered: Option<NodeId>,
    selected: Option<SelectedField>,
    transition_history: Vec<FocusTransition>,
}

impl FocusState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> FocusPhase {
        if self.selected.is_some() {
            FocusPhase::Focused
        } else if self.hovered.is_some() {
            FocusPhase::Hovering
        } else {
            FocusPhase::Idle
        }
    }

    pub fn hovered(&self) -> Option<NodeId> {
        self.hovered
    }

    pub fn selected(&self) -> Option<&SelectedField> {
        self.selected.as_ref()
    }

    pub fn selected_node(&self) -> Option<NodeId> {
        self.selected.as_ref().map(|field| field.node)
    }

    pub fn is_selected(&self, node: NodeId) -> bool {
        self.selected_node() == Some(node)
    }

    fn record(&mut self, from: FocusPhase, event: FocusEvent) {
        let to = self.phase();
        tracing::trace!(?from, ?event, ?to, "focus transition");
        if self.transition_history.len() == TRANSITION_HISTORY_LIMIT {
            self.transition_history.remove(0);
        }
        self.transition_history
            .push(FocusTransition::new(from, event, to));
    }

    /// Returns `false` when `node` was already the hovered element.
    pub fn hover(&mut self, node: NodeId) -> bool {
        if self.hovered == Some(node) {
            return false;
        }
        let from = self.phase();
        self.hovered = Some(node);
        self.record(from, FocusEvent::Hover);
        true
    }

    pub fn unhover(&mut self) -> Option<NodeId> {
        let from = self.phase();
        let previous = self.hovered.take()?;
        self.record(from, FocusEvent::Unhover);
        Some(previous)
    }

    pub fn focus(&mut self, field: SelectedField) -> StateResult<()> {
        if let Some(current) = self.selected_node() {
            tracing::warn!(?current, requested = ?field.node, "focus requested while another field is focused");
            return Err(StateError::AlreadyFocused { current });
        }
        let from = self.phase();
        self.selected = Some(field);
        self.record(from, FocusEvent::Focus);
        Ok(())
    }

    pub fn release(&mut self) -> StateResult<SelectedField> {
        let from = self.phase();
        let field = self.selected.take().ok_or(StateError::NotFocused)?;
        self.record(from, FocusEvent::Release);
        Ok(field)
    }

    fn selected_mut(&mut self, node: NodeId) -> StateResult<&mut SelectedField> {
        match self.selected.as_mut() {
            Some(field) if field.node == node => Ok(field),
            Some(_) => Err(StateError::StaleSelection { expected: node }),
            None => Err(StateError::NotFocused),
        }
    }

    /// Records what the async focus setup resolved, if `node` is still the
    /// selected element.
    pub fn describe(
        &mut self,
        node: NodeId,
        field_type: FieldType,
        disabled: FieldDisabledState,
    ) -> StateResult<()> {
        let field = self.selected_mut(node)?;
        field.field_type = Some(field_type);
        field.disabled = disabled;
        Ok(())
    }

    pub fn attach_edit(&mut self, node: NodeId, edit: EditTarget) -> StateResult<()> {
        self.selected_mut(node)?.edit = Some(edit);
        Ok(())
    }

    /// Flags the edit target that received user input; returns whether
    /// `editable` belongs to the focused field.
    pub fn mark_input(&mut self, editable: NodeId) -> bool {
        match self.selected.as_mut().and_then(|field| field.edit.as_mut()) {
            Some(edit) if edit.editable == editable => {
                edit.received_input = true;
                true
            }
            _ => false,
        }
    }

    /// Drops a hovered reference whose node left the document.
    pub fn forget_detached_hover(&mut self, page: &dyn Page) -> Option<NodeId> {
        match self.hovered {
            Some(node) if !page.is_connected(node) => self.unhover(),
            _ => None,
        }
    }

    pub fn is_selection_detached(&self, page: &dyn Page) -> bool {
        self.selected_node()
            .is_some_and(|node| !page.is_connected(node))
    }
}

#[cfg(test)]
impl FocusState {
    fn history(&self) -> &[FocusTransition] {
        &self.transition_history
    }
}

impl std::fmt::Display for FocusState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FocusPhase::{:?}", self.phase())
    }
}
