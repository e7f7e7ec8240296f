//! Checklist item endpoints
//!
//! - `POST /api/notes/:note_id/lists/items` - Add an item
//! - `GET /api/notes/:note_id/lists/items/:item_id` - Get an item
//! - `PUT /api/notes/:note_id/lists/items/:item_id` - Update text, checked or parent
//! - `DELETE /api/notes/:note_id/lists/items/:item_id` - Delete an item and its subtree

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Deserializer};

use super::{HttpError, JsonBody};
use crate::api::{ItemChange, KeepApi};
use crate::checklist::{ItemId, ItemUpdate, ListItem, NewItem, Note, NoteId, Placement};

/// Distinguish an explicit `null` (`Some(None)`) from an absent field (`None`).
fn explicit_null<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    text: String,
    #[serde(default)]
    checked: bool,
    #[serde(default)]
    parent_item_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateItemRequest {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    checked: Option<bool>,
    /// Absent keeps the parent; `null` or a null-like string unindents.
    #[serde(default, deserialize_with = "explicit_null")]
    parent_item_id: Option<Option<String>>,
}

impl UpdateItemRequest {
    fn into_update(self) -> ItemUpdate {
        ItemUpdate {
            text: self.text,
            checked: self.checked,
            placement: self.parent_item_id.map(|parent| match parent {
                Some(raw) => Placement::from_wire(&raw),
                None => Placement::TopLevel,
            }),
        }
    }
}

async fn add_item(
    State(api): State<KeepApi>,
    Path(note_id): Path<String>,
    JsonBody(body): JsonBody<AddItemRequest>,
) -> Result<(StatusCode, Json<ItemChange>), HttpError> {
    let new = NewItem {
        id: None,
        text: body.text,
        checked: body.checked,
        parent: body
            .parent_item_id
            .as_deref()
            .and_then(|raw| Placement::from_wire(raw).into_parent()),
    };
    let change = api.add_item(&NoteId::from(note_id), new).await?;
    Ok((StatusCode::CREATED, Json(change)))
}

async fn get_item(
    State(api): State<KeepApi>,
    Path((note_id, item_id)): Path<(String, String)>,
) -> Result<Json<ListItem>, HttpError> {
    let item = api
        .get_item(&NoteId::from(note_id), &ItemId::from(item_id))
        .await?;
    Ok(Json(item))
}

async fn update_item(
    State(api): State<KeepApi>,
    Path((note_id, item_id)): Path<(String, String)>,
    JsonBody(body): JsonBody<UpdateItemRequest>,
) -> Result<Json<Note>, HttpError> {
    let note = api
        .update_item(&NoteId::from(note_id), &ItemId::from(item_id), body.into_update())
        .await?;
    Ok(Json(note))
}

async fn delete_item(
    State(api): State<KeepApi>,
    Path((note_id, item_id)): Path<(String, String)>,
) -> Result<Json<Note>, HttpError> {
    let note = api
        .delete_item(&NoteId::from(note_id), &ItemId::from(item_id))
        .await?;
    Ok(Json(note))
}

pub fn routes(api: KeepApi) -> Router {
    Router::new()
        .route("/api/notes/:note_id/lists/items", post(add_item))
        .route(
            "/api/notes/:note_id/lists/items/:item_id",
            get(get_item).put(update_item).delete(delete_item),
        )
        .with_state(api)
}
