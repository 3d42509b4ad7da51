use crate::channel::ChannelError;
use thiserror::Error;

pub type VisualEditorResult<T> = std::result::Result<T, VisualEditorError>;

#[derive(Debug, Error)]
pub enum VisualEditorError {
    #[error(transparent)]
    Channel(#[from] ChannelError),
    #[error("visual editor session has been destroyed")]
    Destroyed,
}
