use super::model::FocusPhase;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusEvent {
    Hover,
    Unhover,
    Focus,
    Release,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusTransition {
    pub from: FocusPhase,
    pub event: FocusEvent,
    pub to: FocusPhase,
}

impl FocusTransition {
    pub const fn new(from: FocusPhase, event: FocusEvent, to: FocusPhase) -> Self {
        Self { from, event, to }
    }
}
