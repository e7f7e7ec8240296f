//! Storage trait definitions

use crate::checklist::{Note, NoteId};
use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Note not found: {0}")]
    NotFound(NoteId),

    #[error("Note {note_id} changed concurrently (expected revision {expected}, found {actual})")]
    Conflict {
        note_id: NoteId,
        expected: u64,
        actual: u64,
    },

    #[error("Note already exists: {0}")]
    AlreadyExists(NoteId),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Date parsing error: {0}")]
    DateParse(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Persistence boundary for notes and their item trees
///
/// Implementations must be thread-safe (Send + Sync); the API layer holds
/// one per process and serializes writers per note on its own side.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Load a note with its items
    async fn load(&self, id: &NoteId) -> StorageResult<Note>;

    /// Persist a note whose `revision` is the one it was loaded at.
    ///
    /// Returns the new revision. Fails with `Conflict` when the stored
    /// revision moved on in the meantime; the stored note is then untouched.
    async fn save(&self, note: &Note) -> StorageResult<u64>;

    /// Create a note; the returned copy carries its first revision
    async fn insert(&self, note: Note) -> StorageResult<Note>;

    /// All notes, including archived and trashed ones
    async fn list(&self) -> StorageResult<Vec<Note>>;

    /// Cheap reachability check used by health checks
    async fn ping(&self) -> StorageResult<()> {
        Ok(())
    }
}

/// Extension trait for opening stores from paths
pub trait OpenStore: NoteStore + Sized {
    /// Open or create a store at the given path
    fn open(path: impl AsRef<Path>) -> StorageResult<Self>;

    /// Create an in-memory store (useful for testing)
    fn open_in_memory() -> StorageResult<Self>;
}
