//! MCP tool parameter structs with schemars-derived JSON schemas.

use schemars::JsonSchema;
use serde::Deserialize;

use crate::checklist::{ItemId, ItemUpdate, NewItem, Placement};

// ── Note params ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, JsonSchema)]
pub struct FindNoteParams {
    #[schemars(description = "Text to search for in titles, bodies and list items (omit to list all)")]
    pub query: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct NoteIdParams {
    #[schemars(description = "The note ID")]
    pub note_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateNoteParams {
    #[schemars(description = "Title of the new note")]
    pub title: String,
    #[schemars(description = "Body text of the new note")]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListItemInput {
    #[schemars(description = "Optional id so later items in the same request can nest under this one")]
    pub id: Option<String>,
    #[schemars(description = "Text of the item")]
    pub text: String,
    #[schemars(description = "Whether the item starts checked")]
    pub checked: Option<bool>,
    #[schemars(description = "Id of an earlier item in this request to nest under (omit for top level)")]
    pub parent_item_id: Option<String>,
}

impl ListItemInput {
    pub fn into_new_item(self) -> NewItem {
        NewItem {
            id: self.id.filter(|id| !id.trim().is_empty()).map(ItemId::from),
            text: self.text,
            checked: self.checked.unwrap_or(false),
            parent: self
                .parent_item_id
                .as_deref()
                .and_then(|raw| Placement::from_wire(raw).into_parent()),
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateListParams {
    #[schemars(description = "Title of the new checklist")]
    pub title: String,
    #[schemars(description = "Initial items, in order; parents must come before their children")]
    pub items: Option<Vec<ListItemInput>>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateNoteParams {
    #[schemars(description = "The note ID")]
    pub note_id: String,
    #[schemars(description = "New title (omit to keep)")]
    pub title: Option<String>,
    #[schemars(description = "New body text (omit to keep)")]
    pub text: Option<String>,
}

// ── Collaborator params ─────────────────────────────────────────────────

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CollaboratorParams {
    #[schemars(description = "The note ID")]
    pub note_id: String,
    #[schemars(description = "Email address of the collaborator")]
    pub email: String,
}

// ── List item params ────────────────────────────────────────────────────

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AddListItemParams {
    #[schemars(description = "The note ID")]
    pub note_id: String,
    #[schemars(description = "Text of the new item")]
    pub text: String,
    #[schemars(description = "Whether the item starts checked")]
    pub checked: Option<bool>,
    #[schemars(description = "Item to nest under; omit, empty or 'null' for top level")]
    pub parent_item_id: Option<String>,
}

impl AddListItemParams {
    pub fn new_item(&self) -> NewItem {
        NewItem {
            id: None,
            text: self.text.clone(),
            checked: self.checked.unwrap_or(false),
            parent: self
                .parent_item_id
                .as_deref()
                .and_then(|raw| Placement::from_wire(raw).into_parent()),
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListItemParams {
    #[schemars(description = "The note ID")]
    pub note_id: String,
    #[schemars(description = "The list item ID")]
    pub item_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateListItemParams {
    #[schemars(description = "The note ID")]
    pub note_id: String,
    #[schemars(description = "The list item ID")]
    pub item_id: String,
    #[schemars(description = "New text (omit to keep)")]
    pub text: Option<String>,
    #[schemars(description = "New checked state; applies to the whole subtree")]
    pub checked: Option<bool>,
    #[schemars(
        description = "New parent item; omit to keep, empty or 'null' to move to top level"
    )]
    pub parent_item_id: Option<String>,
}

impl UpdateListItemParams {
    pub fn update(&self) -> ItemUpdate {
        ItemUpdate {
            text: self.text.clone(),
            checked: self.checked,
            placement: self.parent_item_id.as_deref().map(Placement::from_wire),
        }
    }
}
