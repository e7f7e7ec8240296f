//! Error taxonomy shared by the engine, the API layer and the transports

use crate::checklist::{ItemId, NoteId};
use crate::storage::StorageError;
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur in keep-mcp operations
#[derive(Debug, Error)]
pub enum KeepError {
    #[error("Note not found: {0}")]
    NoteNotFound(NoteId),

    #[error("Item not found: {0}")]
    ItemNotFound(ItemId),

    #[error("Invalid parent: {0}")]
    InvalidParent(String),

    #[error("Note {0} cannot be modified (missing protective label and unsafe mode is not enabled)")]
    Forbidden(NoteId),

    #[error("Note {0} was modified concurrently; reload and retry")]
    Conflict(NoteId),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Note {0} is not a checklist")]
    NotChecklist(NoteId),

    #[error("Note {0} is in the trash and cannot be modified")]
    Trashed(NoteId),

    #[error("Collaborator {email} not found for note {note_id}")]
    CollaboratorNotFound { note_id: NoteId, email: String },

    #[error("Timed out waiting for the note store during {0}")]
    Timeout(&'static str),

    #[error("Storage error: {0}")]
    Storage(StorageError),
}

/// Result type for keep-mcp operations
pub type KeepResult<T> = Result<T, KeepError>;

/// Coarse error category that transports map onto their own representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    NotFound,
    InvalidParent,
    Forbidden,
    Conflict,
    Validation,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::InvalidParent => "INVALID_PARENT",
            Self::Forbidden => "FORBIDDEN",
            Self::Conflict => "CONFLICT",
            Self::Validation => "VALIDATION_ERROR",
            Self::Internal => "INTERNAL_ERROR",
        }
    }
}

impl KeepError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NoteNotFound(_) | Self::ItemNotFound(_) | Self::CollaboratorNotFound { .. } => {
                ErrorKind::NotFound
            }
            Self::InvalidParent(_) => ErrorKind::InvalidParent,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Validation(_) | Self::NotChecklist(_) | Self::Trashed(_) => ErrorKind::Validation,
            Self::Timeout(_) | Self::Storage(_) => ErrorKind::Internal,
        }
    }
}

impl From<StorageError> for KeepError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(id) => KeepError::NoteNotFound(id),
            StorageError::Conflict { note_id, .. } => KeepError::Conflict(note_id),
            other => KeepError::Storage(other),
        }
    }
}
