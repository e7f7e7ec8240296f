//! Checklist items and the change requests that target them

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a list item within its note
///
/// Serializes as a plain string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Create a new random ItemId
    pub fn new() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A single checkable line of a checklist note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListItem {
    pub id: ItemId,
    pub text: String,
    #[serde(default)]
    pub checked: bool,
    /// Sibling ordering key, ascending
    #[serde(default)]
    pub sort: i64,
    /// Parent item; `None` means top level
    #[serde(default, rename = "parent_item_id")]
    pub parent: Option<ItemId>,
}

impl ListItem {
    /// Create a top-level, unchecked item with a fresh id
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: ItemId::new(),
            text: text.into(),
            checked: false,
            sort: 0,
            parent: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<ItemId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_checked(mut self, checked: bool) -> Self {
        self.checked = checked;
        self
    }

    pub fn with_sort(mut self, sort: i64) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_parent(mut self, parent: impl Into<ItemId>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn is_indented(&self) -> bool {
        self.parent.is_some()
    }
}

/// Where an item should live in the tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    TopLevel,
    Under(ItemId),
}

impl Placement {
    pub fn parent(&self) -> Option<&ItemId> {
        match self {
            Self::TopLevel => None,
            Self::Under(id) => Some(id),
        }
    }

    pub fn into_parent(self) -> Option<ItemId> {
        match self {
            Self::TopLevel => None,
            Self::Under(id) => Some(id),
        }
    }

    /// Interpret a parent id received from a client.
    ///
    /// Agents spell "no parent" in many ways; blank strings and the words
    /// `null`, `none` and `undefined` (any case) all mean top level.
    pub fn from_wire(raw: &str) -> Self {
        if is_null_like(raw) {
            Self::TopLevel
        } else {
            Self::Under(ItemId::from(raw.trim()))
        }
    }
}

fn is_null_like(raw: &str) -> bool {
    let raw = raw.trim();
    raw.is_empty()
        || ["null", "none", "undefined"]
            .iter()
            .any(|word| raw.eq_ignore_ascii_case(word))
}

impl From<Option<ItemId>> for Placement {
    fn from(parent: Option<ItemId>) -> Self {
        match parent {
            Some(id) => Self::Under(id),
            None => Self::TopLevel,
        }
    }
}

/// Request to add an item to a checklist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    /// Caller-chosen id; a fresh one is generated when absent
    pub id: Option<ItemId>,
    pub text: String,
    pub checked: bool,
    pub parent: Option<ItemId>,
}

impl NewItem {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: None,
            text: text.into(),
            checked: false,
            parent: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<ItemId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn checked(mut self, checked: bool) -> Self {
        self.checked = checked;
        self
    }

    pub fn under(mut self, parent: impl Into<ItemId>) -> Self {
        self.parent = Some(parent.into());
        self
    }
}

/// Partial update of an existing item; `None` fields stay unchanged
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemUpdate {
    pub text: Option<String>,
    pub checked: Option<bool>,
    pub placement: Option<Placement>,
}

impl ItemUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn checked(mut self, checked: bool) -> Self {
        self.checked = Some(checked);
        self
    }

    pub fn placement(mut self, placement: Placement) -> Self {
        self.placement = Some(placement);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.checked.is_none() && self.placement.is_none()
    }
}
