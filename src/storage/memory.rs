//! In-process note store

use super::traits::{NoteStore, StorageError, StorageResult};
use crate::checklist::{Note, NoteId};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Note store backed by a concurrent map
///
/// Nothing survives the process; used for tests and `--memory` runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    notes: DashMap<NoteId, Note>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            notes: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

#[async_trait]
impl NoteStore for MemoryStore {
    async fn load(&self, id: &NoteId) -> StorageResult<Note> {
        self.notes
            .get(id)
            .map(|r| r.clone())
            .ok_or_else(|| StorageError::NotFound(id.clone()))
    }

    async fn save(&self, note: &Note) -> StorageResult<u64> {
        let mut stored = self
            .notes
            .get_mut(&note.id)
            .ok_or_else(|| StorageError::NotFound(note.id.clone()))?;

        if stored.revision != note.revision {
            return Err(StorageError::Conflict {
                note_id: note.id.clone(),
                expected: note.revision,
                actual: stored.revision,
            });
        }

        let revision = note.revision + 1;
        *stored = Note {
            revision,
            ..note.clone()
        };
        Ok(revision)
    }

    async fn insert(&self, mut note: Note) -> StorageResult<Note> {
        match self.notes.entry(note.id.clone()) {
            Entry::Occupied(_) => Err(StorageError::AlreadyExists(note.id)),
            Entry::Vacant(slot) => {
                note.revision = 1;
                slot.insert(note.clone());
                Ok(note)
            }
        }
    }

    async fn list(&self) -> StorageResult<Vec<Note>> {
        let mut notes: Vec<Note> = self.notes.iter().map(|r| r.value().clone()).collect();
        notes.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(notes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_assigns_first_revision() {
        let store = MemoryStore::new();
        let note = store.insert(Note::new("t", "x")).await.unwrap();
        assert_eq!(note.revision, 1);
        assert_eq!(store.load(&note.id).await.unwrap(), note);
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_ids() {
        let store = MemoryStore::new();
        store.insert(Note::new("t", "x").with_id("dup")).await.unwrap();
        let err = store.insert(Note::new("t", "y").with_id("dup")).await.unwrap_err();
        assert!(matches!(err, StorageError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn save_bumps_revision() {
        let store = MemoryStore::new();
        let mut note = store.insert(Note::new("t", "x")).await.unwrap();
        note.title = "changed".into();

        let revision = store.save(&note).await.unwrap();
        assert_eq!(revision, 2);

        let loaded = store.load(&note.id).await.unwrap();
        assert_eq!(loaded.title, "changed");
        assert_eq!(loaded.revision, 2);
    }

    #[tokio::test]
    async fn stale_save_is_a_conflict_and_leaves_store_untouched() {
        let store = MemoryStore::new();
        let original = store.insert(Note::new("t", "x")).await.unwrap();

        let mut first = original.clone();
        first.title = "first".into();
        store.save(&first).await.unwrap();

        let mut stale = original.clone();
        stale.title = "stale".into();
        let err = store.save(&stale).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict { expected: 1, actual: 2, .. }));
        assert_eq!(store.load(&original.id).await.unwrap().title, "first");
    }

    #[tokio::test]
    async fn load_missing_note_is_not_found() {
        let store = MemoryStore::new();
        let err = store.load(&NoteId::from("nope")).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }
}
