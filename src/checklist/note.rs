//! Notes: flat text or a checklist of nested items

use super::tree::ItemTree;
use crate::error::{KeepError, KeepResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Unique identifier for a note
///
/// Serializes as a plain string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    /// Create a new random NoteId
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for NoteId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NoteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NoteId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NoteId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Body classification of a note
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoteKind {
    #[default]
    #[serde(rename = "note", alias = "plain")]
    Plain,
    #[serde(rename = "list", alias = "checklist")]
    Checklist,
}

impl NoteKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plain => "note",
            Self::Checklist => "list",
        }
    }
}

/// Note color tag (Keep palette)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Color {
    #[default]
    Default,
    Red,
    Orange,
    Yellow,
    Green,
    Teal,
    Blue,
    Cerulean,
    Purple,
    Pink,
    Brown,
    Gray,
}

/// A note, owning its checklist items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(rename = "type", default)]
    pub kind: NoteKind,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub color: Color,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub trashed: bool,
    #[serde(default)]
    pub labels: BTreeSet<String>,
    #[serde(default)]
    pub collaborators: BTreeSet<String>,
    #[serde(default)]
    pub items: ItemTree,
    /// Store-assigned version, compared on save to detect concurrent writes
    #[serde(default)]
    pub revision: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    /// Create a plain text note
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: NoteId::new(),
            title: title.into(),
            text: text.into(),
            kind: NoteKind::Plain,
            pinned: false,
            color: Color::Default,
            archived: false,
            trashed: false,
            labels: BTreeSet::new(),
            collaborators: BTreeSet::new(),
            items: ItemTree::new(),
            revision: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create an empty checklist note
    pub fn new_checklist(title: impl Into<String>) -> Self {
        Self {
            kind: NoteKind::Checklist,
            ..Self::new(title, "")
        }
    }

    pub fn with_id(mut self, id: impl Into<NoteId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.labels.insert(label.into());
        self
    }

    pub fn with_items(mut self, items: ItemTree) -> Self {
        self.kind = NoteKind::Checklist;
        self.items = items;
        self
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    pub fn is_checklist(&self) -> bool {
        self.kind == NoteKind::Checklist
    }

    /// Fail unless the note holds a checklist
    pub fn ensure_checklist(&self) -> KeepResult<()> {
        if self.is_checklist() {
            Ok(())
        } else {
            Err(KeepError::NotChecklist(self.id.clone()))
        }
    }

    /// Trashed notes only accept being trashed again.
    pub fn ensure_editable(&self) -> KeepResult<()> {
        if self.trashed {
            Err(KeepError::Trashed(self.id.clone()))
        } else {
            Ok(())
        }
    }

    /// Flip a plain note to a checklist; the first added item does this.
    pub fn promote_to_checklist(&mut self) -> bool {
        let promoted = !self.is_checklist();
        self.kind = NoteKind::Checklist;
        promoted
    }

    /// Whether the note is visible in listings (neither archived nor trashed)
    pub fn is_active(&self) -> bool {
        !self.archived && !self.trashed
    }

    /// Case-insensitive match against title, text and item text
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.title.to_lowercase().contains(&query)
            || self.text.to_lowercase().contains(&query)
            || self
                .items
                .iter()
                .any(|item| item.text.to_lowercase().contains(&query))
    }

    /// Update the modification timestamp
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
