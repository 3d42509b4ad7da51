use crate::dom::NodeId;
use thiserror::Error;

pub type StateResult<T> = std::result::Result<T, StateError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("{current:?} is still focused; release it before focusing another field")]
    AlreadyFocused { current: NodeId },
    #[error("no field is focused")]
    NotFocused,
    #[error("focus moved away from {expected:?}")]
    StaleSelection { expected: NodeId },
}
