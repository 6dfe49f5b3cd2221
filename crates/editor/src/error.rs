use guidebook_core::autosave::AutoSaveError;
use guidebook_core::document::IdError;
use guidebook_core::{PublishError, ValidationError};

/// Console command error, printed back to the user.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("unknown command '{0}' (try 'help')")]
    UnknownCommand(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("invalid block id: {0}")]
    InvalidId(#[from] IdError),

    #[error("no block at position {0}")]
    NoSuchPosition(usize),

    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("expected a JSON object")]
    NotAnObject,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error(transparent)]
    Save(#[from] AutoSaveError),
}

/// Convenience type alias for command handlers.
pub type CommandResult<T> = Result<T, CommandError>;
