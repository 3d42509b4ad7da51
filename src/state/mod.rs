pub mod error;
pub mod event;
pub mod machine;
pub mod model;

pub use error::{StateError, StateResult};
pub use event::{FocusEvent, FocusTransition};
pub use machine::FocusState;
pub use model::{EditTarget, FocusPhase, SelectedField};
