//! SQLite storage backend for keep-mcp

use super::traits::{NoteStore, OpenStore, StorageError, StorageResult};
use crate::checklist::{ItemTree, Note, NoteId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

const NOTE_COLUMNS: &str = "id, revision, title, text, kind, pinned, color, archived, trashed,
     labels_json, collaborators_json, items_json, created_at, updated_at";

/// SQLite-backed note store
///
/// One row per note; labels, collaborators and the item tree are JSON
/// columns so a note loads and saves as a unit. Thread-safe via an internal
/// mutex on the connection; every query runs on the blocking pool so a busy
/// database never stalls the async runtime.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

/// Column values of one `notes` row
struct NoteRow {
    id: String,
    revision: i64,
    title: String,
    text: String,
    kind: String,
    pinned: bool,
    color: String,
    archived: bool,
    trashed: bool,
    labels_json: String,
    collaborators_json: String,
    items_json: String,
    created_at: String,
    updated_at: String,
}

impl SqliteStore {
    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS notes (
                id TEXT PRIMARY KEY,
                revision INTEGER NOT NULL,
                title TEXT NOT NULL,
                text TEXT NOT NULL,
                kind TEXT NOT NULL,
                pinned INTEGER NOT NULL DEFAULT 0,
                color TEXT NOT NULL,
                archived INTEGER NOT NULL DEFAULT 0,
                trashed INTEGER NOT NULL DEFAULT 0,
                labels_json TEXT NOT NULL DEFAULT '[]',
                collaborators_json TEXT NOT NULL DEFAULT '[]',
                items_json TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_notes_created
                ON notes(created_at);

            -- Readers are not blocked by a writer
            PRAGMA journal_mode = WAL;
            "#,
        )?;
        Ok(())
    }

    #[cfg(test)]
    fn conn(&self) -> MutexGuard<'_, Connection> {
        lock_conn(&self.conn)
    }

    /// Run `f` against the connection on tokio's blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> StorageResult<T>
    where
        F: FnOnce(&Connection) -> StorageResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || f(&lock_conn(&conn)))
            .await
            .map_err(|err| StorageError::Io(std::io::Error::other(format!("join sqlite task: {err}"))))?
    }

    fn note_to_row(note: &Note) -> StorageResult<NoteRow> {
        Ok(NoteRow {
            id: note.id.as_str().to_string(),
            revision: note.revision as i64,
            title: note.title.clone(),
            text: note.text.clone(),
            kind: serde_json::to_string(&note.kind)?,
            pinned: note.pinned,
            color: serde_json::to_string(&note.color)?,
            archived: note.archived,
            trashed: note.trashed,
            labels_json: serde_json::to_string(&note.labels)?,
            collaborators_json: serde_json::to_string(&note.collaborators)?,
            items_json: serde_json::to_string(&note.items)?,
            created_at: note.created_at.to_rfc3339(),
            updated_at: note.updated_at.to_rfc3339(),
        })
    }

    fn read_row(row: &Row<'_>) -> rusqlite::Result<NoteRow> {
        Ok(NoteRow {
            id: row.get(0)?,
            revision: row.get(1)?,
            title: row.get(2)?,
            text: row.get(3)?,
            kind: row.get(4)?,
            pinned: row.get(5)?,
            color: row.get(6)?,
            archived: row.get(7)?,
            trashed: row.get(8)?,
            labels_json: row.get(9)?,
            collaborators_json: row.get(10)?,
            items_json: row.get(11)?,
            created_at: row.get(12)?,
            updated_at: row.get(13)?,
        })
    }

    fn row_to_note(row: NoteRow) -> StorageResult<Note> {
        let items: ItemTree = serde_json::from_str(&row.items_json)?;
        Ok(Note {
            id: NoteId::from(row.id),
            title: row.title,
            text: row.text,
            kind: serde_json::from_str(&row.kind)?,
            pinned: row.pinned,
            color: serde_json::from_str(&row.color)?,
            archived: row.archived,
            trashed: row.trashed,
            labels: serde_json::from_str(&row.labels_json)?,
            collaborators: serde_json::from_str(&row.collaborators_json)?,
            items,
            revision: row.revision as u64,
            created_at: parse_date(&row.created_at)?,
            updated_at: parse_date(&row.updated_at)?,
        })
    }
}

fn lock_conn(conn: &Mutex<Connection>) -> MutexGuard<'_, Connection> {
    conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn parse_date(raw: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|date| date.with_timezone(&Utc))
        .map_err(|e| StorageError::DateParse(e.to_string()))
}

impl OpenStore for SqliteStore {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

#[async_trait]
impl NoteStore for SqliteStore {
    async fn load(&self, id: &NoteId) -> StorageResult<Note> {
        let id = id.clone();
        self.with_conn(move |conn| {
            let row = conn
                .query_row(
                    &format!("SELECT {} FROM notes WHERE id = ?1", NOTE_COLUMNS),
                    params![id.as_str()],
                    Self::read_row,
                )
                .optional()?;

            match row {
                Some(row) => Self::row_to_note(row),
                None => Err(StorageError::NotFound(id)),
            }
        })
        .await
    }

    async fn save(&self, note: &Note) -> StorageResult<u64> {
        let row = Self::note_to_row(note)?;
        let note_id = note.id.clone();
        let expected = note.revision;

        self.with_conn(move |conn| {
            // Compare-and-swap on revision
            let updated = conn.execute(
                r#"
                UPDATE notes SET
                    revision = revision + 1,
                    title = ?3,
                    text = ?4,
                    kind = ?5,
                    pinned = ?6,
                    color = ?7,
                    archived = ?8,
                    trashed = ?9,
                    labels_json = ?10,
                    collaborators_json = ?11,
                    items_json = ?12,
                    updated_at = ?13
                WHERE id = ?1 AND revision = ?2
                "#,
                params![
                    row.id,
                    row.revision,
                    row.title,
                    row.text,
                    row.kind,
                    row.pinned,
                    row.color,
                    row.archived,
                    row.trashed,
                    row.labels_json,
                    row.collaborators_json,
                    row.items_json,
                    row.updated_at,
                ],
            )?;

            if updated == 0 {
                let actual: Option<i64> = conn
                    .query_row(
                        "SELECT revision FROM notes WHERE id = ?1",
                        params![row.id],
                        |r| r.get(0),
                    )
                    .optional()?;
                return Err(match actual {
                    Some(actual) => StorageError::Conflict {
                        note_id,
                        expected,
                        actual: actual as u64,
                    },
                    None => StorageError::NotFound(note_id),
                });
            }

            Ok(expected + 1)
        })
        .await
    }

    async fn insert(&self, mut note: Note) -> StorageResult<Note> {
        note.revision = 1;
        let row = Self::note_to_row(&note)?;

        let inserted = self
            .with_conn(move |conn| {
                Ok(conn.execute(
                    &format!(
                        "INSERT OR IGNORE INTO notes ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                        NOTE_COLUMNS
                    ),
                    params![
                        row.id,
                        row.revision,
                        row.title,
                        row.text,
                        row.kind,
                        row.pinned,
                        row.color,
                        row.archived,
                        row.trashed,
                        row.labels_json,
                        row.collaborators_json,
                        row.items_json,
                        row.created_at,
                        row.updated_at,
                    ],
                )?)
            })
            .await?;

        if inserted == 0 {
            return Err(StorageError::AlreadyExists(note.id));
        }
        Ok(note)
    }

    async fn list(&self) -> StorageResult<Vec<Note>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM notes ORDER BY created_at, id",
                NOTE_COLUMNS
            ))?;
            let rows = stmt.query_map([], Self::read_row)?;

            let mut notes = Vec::new();
            for row in rows {
                notes.push(Self::row_to_note(row?)?);
            }
            Ok(notes)
        })
        .await
    }

    async fn ping(&self) -> StorageResult<()> {
        self.with_conn(|conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checklist::{cascade, NewItem};

    fn create_test_store() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

    fn create_test_list() -> Note {
        let mut note = Note::new_checklist("Groceries")
            .with_label("keep-mcp")
            .with_id("list-1");
        let parent = cascade::add_item(&mut note.items, NewItem::new("dairy")).unwrap();
        cascade::add_item(&mut note.items, NewItem::new("milk").checked(true).under(parent))
            .unwrap();
        note.collaborators.insert("friend@example.com".into());
        note
    }

    #[tokio::test]
    async fn test_insert_and_load_note_with_items() {
        let store = create_test_store();
        let inserted = store.insert(create_test_list()).await.unwrap();

        let loaded = store.load(&inserted.id).await.unwrap();
        assert_eq!(loaded.revision, 1);
        assert_eq!(loaded.items, inserted.items);
        assert_eq!(loaded.labels, inserted.labels);
        assert_eq!(loaded.collaborators, inserted.collaborators);
        assert!(loaded.is_checklist());
        assert_eq!(loaded.created_at, inserted.created_at);
    }

    #[tokio::test]
    async fn test_insert_duplicate_is_rejected() {
        let store = create_test_store();
        store.insert(create_test_list()).await.unwrap();
        let err = store.insert(create_test_list()).await.unwrap_err();
        assert!(matches!(err, StorageError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_save_compare_and_swap() {
        let store = create_test_store();
        let original = store.insert(create_test_list()).await.unwrap();

        let mut first = original.clone();
        first.title = "Weekly groceries".into();
        assert_eq!(store.save(&first).await.unwrap(), 2);

        let mut stale = original.clone();
        stale.title = "lost update".into();
        let err = store.save(&stale).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict { expected: 1, actual: 2, .. }));

        let loaded = store.load(&original.id).await.unwrap();
        assert_eq!(loaded.title, "Weekly groceries");
        assert_eq!(loaded.revision, 2);
    }

    #[tokio::test]
    async fn test_save_missing_note_is_not_found() {
        let store = create_test_store();
        let err = store.save(&Note::new("ghost", "")).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_returns_all_notes() {
        let store = create_test_store();
        store.insert(create_test_list()).await.unwrap();
        store.insert(Note::new("plain", "text")).await.unwrap();

        let notes = store.list().await.unwrap();
        assert_eq!(notes.len(), 2);
    }

    #[tokio::test]
    async fn test_notes_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested").join("notes.db");

        let id = {
            let store = SqliteStore::open(&db_path).unwrap();
            store.insert(create_test_list()).await.unwrap().id
        };

        let store = SqliteStore::open(&db_path).unwrap();
        let loaded = store.load(&id).await.unwrap();
        assert_eq!(loaded.items.len(), 2);
        store.ping().await.unwrap();
    }

    #[test]
    fn test_wal_mode_enabled_at_connection() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("wal.db")).unwrap();

        let journal_mode: String = store
            .conn()
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();

        assert_eq!(journal_mode, "wal");
    }

    #[tokio::test]
    async fn test_corrupt_items_fail_to_load() {
        let store = create_test_store();
        let note = store.insert(create_test_list()).await.unwrap();
        store
            .conn()
            .execute(
                "UPDATE notes SET items_json = ?2 WHERE id = ?1",
                params![note.id.as_str(), r#"[{"id":"x","text":"x","parent_item_id":"x"}]"#],
            )
            .unwrap();

        assert!(matches!(
            store.load(&note.id).await,
            Err(StorageError::Serialization(_))
        ));
    }
}
