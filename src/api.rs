//! Transport-independent API layer.
//!
//! `KeepApi` is the single entry point for note and checklist operations.
//! Transports (MCP, REST, the CLI) call `KeepApi` methods; they never reach
//! into a `NoteStore` directly.
//!
//! Every mutation runs load → policy gate → mutate → save while holding a
//! per-note async mutex, so two writers on one note are serialized and
//! writers on different notes are not. The note is mutated as an owned copy;
//! when anything after the load fails, the copy is dropped and the store
//! keeps the previous state. A note's lock lives in the map only while some
//! writer holds or waits on it.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use crate::checklist::{cascade, ItemId, ItemUpdate, ListItem, NewItem, Note, NoteId};
use crate::config::{Settings, DEFAULT_STORE_TIMEOUT};
use crate::error::{KeepError, KeepResult};
use crate::policy::AccessPolicy;
use crate::storage::{NoteStore, StorageResult};

/// Outcome of adding an item: the new id and the note as saved
#[derive(Debug, Clone, Serialize)]
pub struct ItemChange {
    pub item_id: ItemId,
    pub note: Note,
}

type LockMap = DashMap<NoteId, Arc<Mutex<()>>>;

/// Held write lock on one note
///
/// Dropping the lease releases the lock and forgets the map entry when no
/// other writer holds or waits on the same lock.
struct NoteLease {
    locks: Arc<LockMap>,
    note_id: NoteId,
    lock: Arc<Mutex<()>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for NoteLease {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Owners left: the map and this lease
        self.locks.remove_if(&self.note_id, |_, lock| {
            Arc::ptr_eq(lock, &self.lock) && Arc::strong_count(lock) == 2
        });
    }
}

/// Single entry point for all consumer-facing operations.
#[derive(Clone)]
pub struct KeepApi {
    store: Arc<dyn NoteStore>,
    policy: AccessPolicy,
    locks: Arc<LockMap>,
    store_timeout: Duration,
}

impl KeepApi {
    /// Create a new API instance.
    pub fn new(store: Arc<dyn NoteStore>, policy: AccessPolicy) -> Self {
        Self {
            store,
            policy,
            locks: Arc::new(DashMap::new()),
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    pub fn from_settings(store: Arc<dyn NoteStore>, settings: &Settings) -> Self {
        Self::new(store, AccessPolicy::from_settings(settings))
            .with_store_timeout(settings.store_timeout)
    }

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    // --- Store access ---

    async fn bounded<T>(
        &self,
        op: &'static str,
        fut: impl Future<Output = StorageResult<T>>,
    ) -> KeepResult<T> {
        match tokio::time::timeout(self.store_timeout, fut).await {
            Ok(result) => result.map_err(KeepError::from),
            Err(_) => {
                warn!(operation = op, timeout_ms = self.store_timeout.as_millis() as u64, "note store timed out");
                Err(KeepError::Timeout(op))
            }
        }
    }

    async fn load(&self, id: &NoteId) -> KeepResult<Note> {
        self.bounded("load", self.store.load(id)).await
    }

    async fn lock_note(&self, id: &NoteId) -> NoteLease {
        let mut lease = NoteLease {
            locks: Arc::clone(&self.locks),
            note_id: id.clone(),
            lock: self.locks.entry(id.clone()).or_default().clone(),
            guard: None,
        };
        lease.guard = Some(Arc::clone(&lease.lock).lock_owned().await);
        lease
    }

    #[cfg(test)]
    fn tracked_locks(&self) -> usize {
        self.locks.len()
    }

    /// Run `apply` against a fresh copy of the note and persist the result.
    async fn mutate<T, F>(&self, note_id: &NoteId, op: &'static str, apply: F) -> KeepResult<(Note, T)>
    where
        F: FnOnce(&mut Note) -> KeepResult<T>,
    {
        let _lease = self.lock_note(note_id).await;

        let mut note = self.load(note_id).await?;
        if let Err(e) = self.policy.check(&note) {
            warn!(note_id = %note_id, operation = op, "refused: note lacks protective label");
            return Err(e);
        }

        let value = apply(&mut note).inspect_err(|e| {
            warn!(note_id = %note_id, operation = op, error = %e, "rejected");
        })?;

        note.touch();
        note.revision = self
            .bounded("save", self.store.save(&note))
            .await
            .inspect_err(|e| {
                warn!(note_id = %note_id, operation = op, error = %e, "save failed, change discarded");
            })?;
        Ok((note, value))
    }

    // --- Notes ---

    /// Active notes whose title, text or item text contains `query`
    /// (case-insensitive). An empty query lists every active note.
    pub async fn find_notes(&self, query: Option<&str>) -> KeepResult<Vec<Note>> {
        let notes = self.bounded("list", self.store.list()).await?;
        let query = query.map(str::trim).filter(|q| !q.is_empty());

        Ok(notes
            .into_iter()
            .filter(Note::is_active)
            .filter(|note| query.map_or(true, |q| note.matches(q)))
            .collect())
    }

    pub async fn get_note(&self, note_id: &NoteId) -> KeepResult<Note> {
        self.load(note_id).await
    }

    /// Create a plain note carrying the protective label.
    pub async fn create_note(&self, title: &str, text: &str) -> KeepResult<Note> {
        let note = Note::new(title, text).with_label(self.policy.label());
        let note = self.bounded("insert", self.store.insert(note)).await?;
        info!(note_id = %note.id, "created note");
        Ok(note)
    }

    /// Create a labeled checklist, adding `items` in order.
    pub async fn create_list(&self, title: &str, items: Vec<NewItem>) -> KeepResult<Note> {
        let mut note = Note::new_checklist(title).with_label(self.policy.label());
        for item in items {
            cascade::add_item(&mut note.items, item)?;
        }

        let note = self.bounded("insert", self.store.insert(note)).await?;
        info!(note_id = %note.id, items = note.items.len(), "created list");
        Ok(note)
    }

    /// Replace the title and/or text of a note.
    pub async fn update_note(
        &self,
        note_id: &NoteId,
        title: Option<String>,
        text: Option<String>,
    ) -> KeepResult<Note> {
        let (note, ()) = self
            .mutate(note_id, "update_note", |note| {
                note.ensure_editable()?;
                if let Some(title) = title {
                    note.title = title;
                }
                if let Some(text) = text {
                    note.text = text;
                }
                Ok(())
            })
            .await?;
        info!(note_id = %note_id, "updated note");
        Ok(note)
    }

    /// Move a note to the trash. Trashing a trashed note is a no-op save.
    pub async fn delete_note(&self, note_id: &NoteId) -> KeepResult<Note> {
        let (note, ()) = self
            .mutate(note_id, "delete_note", |note| {
                note.trashed = true;
                Ok(())
            })
            .await?;
        info!(note_id = %note_id, "trashed note");
        Ok(note)
    }

    // --- Collaborators ---

    pub async fn share_note(&self, note_id: &NoteId, email: &str) -> KeepResult<Note> {
        let (note, (email, added)) = self
            .mutate(note_id, "share_note", |note| {
                note.ensure_editable()?;
                let email = validate_email(email)?;
                let added = note.collaborators.insert(email.clone());
                Ok((email, added))
            })
            .await?;
        info!(note_id = %note_id, email = %email, added, "shared note");
        Ok(note)
    }

    pub async fn unshare_note(&self, note_id: &NoteId, email: &str) -> KeepResult<Note> {
        let (note, email) = self
            .mutate(note_id, "unshare_note", |note| {
                note.ensure_editable()?;
                let email = validate_email(email)?;
                if note.collaborators.remove(&email) {
                    Ok(email)
                } else {
                    Err(KeepError::CollaboratorNotFound {
                        note_id: note.id.clone(),
                        email,
                    })
                }
            })
            .await?;
        info!(note_id = %note_id, email = %email, "unshared note");
        Ok(note)
    }

    pub async fn list_collaborators(&self, note_id: &NoteId) -> KeepResult<Vec<String>> {
        let note = self.load(note_id).await?;
        Ok(note.collaborators.into_iter().collect())
    }

    // --- Checklist items ---

    /// Add an item; a plain note becomes a checklist on its first item.
    pub async fn add_item(&self, note_id: &NoteId, new: NewItem) -> KeepResult<ItemChange> {
        let (note, item_id) = self
            .mutate(note_id, "add_item", |note| {
                note.ensure_editable()?;
                if note.promote_to_checklist() {
                    debug!(note_id = %note.id, "promoted note to checklist");
                }
                cascade::add_item(&mut note.items, new)
            })
            .await?;
        info!(note_id = %note_id, item_id = %item_id, "added item");
        Ok(ItemChange { item_id, note })
    }

    /// Apply text, checked state and placement changes to one item.
    pub async fn update_item(
        &self,
        note_id: &NoteId,
        item_id: &ItemId,
        update: ItemUpdate,
    ) -> KeepResult<Note> {
        let (note, ()) = self
            .mutate(note_id, "update_item", |note| {
                note.ensure_editable()?;
                note.ensure_checklist()?;
                cascade::update_item(&mut note.items, item_id, &update)
            })
            .await?;
        info!(note_id = %note_id, item_id = %item_id, "updated item");
        Ok(note)
    }

    /// Delete an item together with its descendants.
    pub async fn delete_item(&self, note_id: &NoteId, item_id: &ItemId) -> KeepResult<Note> {
        let (note, removed) = self
            .mutate(note_id, "delete_item", |note| {
                note.ensure_editable()?;
                note.ensure_checklist()?;
                cascade::delete_item(&mut note.items, item_id)
            })
            .await?;
        info!(note_id = %note_id, item_id = %item_id, removed = removed.len(), "deleted item");
        Ok(note)
    }

    pub async fn get_item(&self, note_id: &NoteId, item_id: &ItemId) -> KeepResult<ListItem> {
        let note = self.load(note_id).await?;
        note.ensure_checklist()?;
        note.items
            .get(item_id)
            .cloned()
            .ok_or_else(|| KeepError::ItemNotFound(item_id.clone()))
    }

    // --- Health ---

    /// Whether the note store answers within the store timeout
    pub async fn health(&self) -> bool {
        match self.bounded("ping", self.store.ping()).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "health check failed");
                false
            }
        }
    }
}

/// Trim and sanity-check a collaborator address.
fn validate_email(email: &str) -> KeepResult<String> {
    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };

    if valid {
        Ok(email.to_string())
    } else {
        Err(KeepError::Validation(format!("invalid email address: {:?}", email)))
    }
}
