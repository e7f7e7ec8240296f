//! Note and collaborator endpoints
//!
//! - `GET /` - Service index
//! - `GET /api/health` - Health check
//! - `GET /api/notes` - All active notes
//! - `GET /api/notes/search?query=` - Search active notes
//! - `POST /api/notes` - Create a text note
//! - `POST /api/lists` - Create a checklist
//! - `GET|PUT|DELETE /api/notes/:note_id` - Read, edit or trash a note
//! - `GET|POST /api/notes/:note_id/collaborators` - List or add collaborators
//! - `DELETE /api/notes/:note_id/collaborators/:email` - Remove a collaborator

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post},
    Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{HttpError, JsonBody};
use crate::api::KeepApi;
use crate::checklist::{ItemId, NewItem, Note, NoteId, Placement};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    query: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateNoteRequest {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateNoteRequest {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListItemInput {
    /// Lets later items in the same request nest under this one
    #[serde(default)]
    id: Option<String>,
    text: String,
    #[serde(default)]
    checked: bool,
    #[serde(default)]
    parent_item_id: Option<String>,
}

impl ListItemInput {
    fn into_new_item(self) -> NewItem {
        NewItem {
            id: self.id.filter(|id| !id.trim().is_empty()).map(ItemId::from),
            text: self.text,
            checked: self.checked,
            parent: self
                .parent_item_id
                .as_deref()
                .and_then(|raw| Placement::from_wire(raw).into_parent()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateListRequest {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    items: Vec<ListItemInput>,
}

#[derive(Debug, Deserialize)]
pub struct CollaboratorRequest {
    email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CollaboratorResponse {
    pub note_id: String,
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CollaboratorsListResponse {
    pub note_id: String,
    pub collaborators: Vec<String>,
    pub count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: String,
    pub service: String,
    pub store_connected: bool,
    pub version: String,
}

async fn index() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "service": "keep-mcp REST API",
        "version": crate::VERSION,
        "endpoints": {
            "health": "GET /api/health",
            "list": "GET /api/notes",
            "search": "GET /api/notes/search?query=...",
            "create_note": "POST /api/notes",
            "create_list": "POST /api/lists",
            "get": "GET /api/notes/{note_id}",
            "update_note": "PUT /api/notes/{note_id}",
            "delete_note": "DELETE /api/notes/{note_id}",
            "add_item": "POST /api/notes/{note_id}/lists/items",
            "get_item": "GET /api/notes/{note_id}/lists/items/{item_id}",
            "update_item": "PUT /api/notes/{note_id}/lists/items/{item_id}",
            "delete_item": "DELETE /api/notes/{note_id}/lists/items/{item_id}",
            "get_collaborators": "GET /api/notes/{note_id}/collaborators",
            "add_collaborator": "POST /api/notes/{note_id}/collaborators",
            "remove_collaborator": "DELETE /api/notes/{note_id}/collaborators/{email}",
        },
    }))
}

/// Health check endpoint
///
/// Always answers 200; `status` reports whether the note store responds.
async fn health_check(State(api): State<KeepApi>) -> Json<HealthStatus> {
    let connected = api.health().await;
    Json(HealthStatus {
        status: if connected { "healthy" } else { "unhealthy" }.to_string(),
        timestamp: Utc::now().to_rfc3339(),
        service: "keep-mcp-rest-api".to_string(),
        store_connected: connected,
        version: crate::VERSION.to_string(),
    })
}

async fn list_notes(State(api): State<KeepApi>) -> Result<Json<Vec<Note>>, HttpError> {
    Ok(Json(api.find_notes(None).await?))
}

async fn search_notes(
    State(api): State<KeepApi>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Vec<Note>>, HttpError> {
    Ok(Json(api.find_notes(Some(params.query.as_str())).await?))
}

async fn create_note(
    State(api): State<KeepApi>,
    JsonBody(body): JsonBody<CreateNoteRequest>,
) -> Result<(StatusCode, Json<Note>), HttpError> {
    let note = api
        .create_note(
            body.title.as_deref().unwrap_or_default(),
            body.text.as_deref().unwrap_or_default(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(note)))
}

async fn create_list(
    State(api): State<KeepApi>,
    JsonBody(body): JsonBody<CreateListRequest>,
) -> Result<(StatusCode, Json<Note>), HttpError> {
    let items = body
        .items
        .into_iter()
        .map(ListItemInput::into_new_item)
        .collect();
    let note = api
        .create_list(body.title.as_deref().unwrap_or_default(), items)
        .await?;
    Ok((StatusCode::CREATED, Json(note)))
}

async fn get_note(
    State(api): State<KeepApi>,
    Path(note_id): Path<String>,
) -> Result<Json<Note>, HttpError> {
    Ok(Json(api.get_note(&NoteId::from(note_id)).await?))
}

async fn update_note(
    State(api): State<KeepApi>,
    Path(note_id): Path<String>,
    JsonBody(body): JsonBody<UpdateNoteRequest>,
) -> Result<Json<Note>, HttpError> {
    let note = api
        .update_note(&NoteId::from(note_id), body.title, body.text)
        .await?;
    Ok(Json(note))
}

async fn delete_note(
    State(api): State<KeepApi>,
    Path(note_id): Path<String>,
) -> Result<Json<Note>, HttpError> {
    Ok(Json(api.delete_note(&NoteId::from(note_id)).await?))
}

async fn list_collaborators(
    State(api): State<KeepApi>,
    Path(note_id): Path<String>,
) -> Result<Json<CollaboratorsListResponse>, HttpError> {
    let collaborators = api.list_collaborators(&NoteId::from(note_id.as_str())).await?;
    Ok(Json(CollaboratorsListResponse {
        note_id,
        count: collaborators.len(),
        collaborators,
    }))
}

async fn add_collaborator(
    State(api): State<KeepApi>,
    Path(note_id): Path<String>,
    JsonBody(body): JsonBody<CollaboratorRequest>,
) -> Result<Json<CollaboratorResponse>, HttpError> {
    api.share_note(&NoteId::from(note_id.as_str()), &body.email).await?;
    Ok(Json(CollaboratorResponse {
        note_id,
        email: body.email.trim().to_string(),
    }))
}

async fn remove_collaborator(
    State(api): State<KeepApi>,
    Path((note_id, email)): Path<(String, String)>,
) -> Result<Json<CollaboratorResponse>, HttpError> {
    api.unshare_note(&NoteId::from(note_id.as_str()), &email).await?;
    Ok(Json(CollaboratorResponse { note_id, email }))
}

pub fn routes(api: KeepApi) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/health", get(health_check))
        .route("/api/notes", get(list_notes).post(create_note))
        .route("/api/notes/search", get(search_notes))
        .route("/api/lists", post(create_list))
        .route(
            "/api/notes/:note_id",
            get(get_note).put(update_note).delete(delete_note),
        )
        .route(
            "/api/notes/:note_id/collaborators",
            get(list_collaborators).post(add_collaborator),
        )
        .route(
            "/api/notes/:note_id/collaborators/:email",
            delete(remove_collaborator),
        )
        .with_state(api)
}
