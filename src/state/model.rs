use crate::dom::NodeId;
use crate::fetch::{FieldDisabledState, FieldType};
use crate::path::FieldLocator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusPhase {
    #[default]
    Idle,
    Hovering,
    Focused,
}

/// Where typing happens for the focused field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditTarget {
    /// The content-editable node: the field itself or its pseudo-editable stand-in.
    pub editable: NodeId,
    pub pseudo: Option<NodeId>,
    pub multiline: bool,
    pub received_input: bool,
}

impl EditTarget {
    pub const fn inline(editable: NodeId, multiline: bool) -> Self {
        Self {
            editable,
            pseudo: None,
            multiline,
            received_input: false,
        }
    }

    pub const fn pseudo(pseudo: NodeId, multiline: bool) -> Self {
        Self {
            editable: pseudo,
            pseudo: Some(pseudo),
            multiline,
            received_input: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedField {
    pub node: NodeId,
    pub locator: FieldLocator,
    pub field_type: Option<FieldType>,
    pub disabled: FieldDisabledState,
    pub edit: Option<EditTarget>,
}

impl SelectedField {
    pub fn new(node: NodeId, locator: FieldLocator) -> Self {
        Self {
            node,
            locator,
            field_type: None,
            disabled: FieldDisabledState::default(),
            edit: None,
        }
    }
}
