//! MCP server for keep-mcp: exposes notes and nested checklists to agents
//! via the Model Context Protocol.

pub mod params;

use params::*;
use crate::api::KeepApi;
use crate::checklist::{ItemId, NoteId};
use crate::error::KeepError;
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt,
};
use serde::Serialize;
use tracing::{error, info};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn ok_json<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    match serde_json::to_string_pretty(value) {
        Ok(text) => Ok(CallToolResult::success(vec![Content::text(text)])),
        Err(e) => Err(McpError::internal_error(e.to_string(), None)),
    }
}

/// Domain failures are tool results, not protocol errors, so the agent sees
/// the message and can react to it.
fn err_result(e: KeepError) -> Result<CallToolResult, McpError> {
    let body = serde_json::json!({
        "error": e.to_string(),
        "code": e.kind().as_str(),
    });
    Ok(CallToolResult::error(vec![Content::text(body.to_string())]))
}

fn respond<T: Serialize>(result: Result<T, KeepError>) -> Result<CallToolResult, McpError> {
    match result {
        Ok(value) => ok_json(&value),
        Err(e) => err_result(e),
    }
}

// ---------------------------------------------------------------------------
// KeepMcpServer
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct KeepMcpServer {
    api: KeepApi,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl KeepMcpServer {
    pub fn new(api: KeepApi) -> Self {
        Self {
            api,
            tool_router: Self::tool_router(),
        }
    }

    // ── Note tools ──────────────────────────────────────────────────────

    #[tool(description = "Find notes whose title, text or list items contain the query (case-insensitive); archived and trashed notes are skipped")]
    async fn find_note(
        &self,
        Parameters(p): Parameters<FindNoteParams>,
    ) -> Result<CallToolResult, McpError> {
        respond(self.api.find_notes(p.query.as_deref()).await)
    }

    #[tool(description = "Get a note with all of its list items")]
    async fn get_note(
        &self,
        Parameters(p): Parameters<NoteIdParams>,
    ) -> Result<CallToolResult, McpError> {
        respond(self.api.get_note(&NoteId::from(p.note_id)).await)
    }

    #[tool(description = "Create a text note; it is labeled so this server may modify it later")]
    async fn create_note(
        &self,
        Parameters(p): Parameters<CreateNoteParams>,
    ) -> Result<CallToolResult, McpError> {
        let text = p.text.unwrap_or_default();
        respond(self.api.create_note(&p.title, &text).await)
    }

    #[tool(description = "Create a checklist note with optional initial items")]
    async fn create_list(
        &self,
        Parameters(p): Parameters<CreateListParams>,
    ) -> Result<CallToolResult, McpError> {
        let items = p
            .items
            .unwrap_or_default()
            .into_iter()
            .map(ListItemInput::into_new_item)
            .collect();
        respond(self.api.create_list(&p.title, items).await)
    }

    #[tool(description = "Update the title and/or text of a note (requires the protective label unless unsafe mode is on)")]
    async fn update_note(
        &self,
        Parameters(p): Parameters<UpdateNoteParams>,
    ) -> Result<CallToolResult, McpError> {
        let note_id = NoteId::from(p.note_id);
        respond(self.api.update_note(&note_id, p.title, p.text).await)
    }

    #[tool(description = "Move a note to the trash (requires the protective label unless unsafe mode is on)")]
    async fn delete_note(
        &self,
        Parameters(p): Parameters<NoteIdParams>,
    ) -> Result<CallToolResult, McpError> {
        respond(self.api.delete_note(&NoteId::from(p.note_id)).await)
    }

    // ── Collaborator tools ──────────────────────────────────────────────

    #[tool(description = "Share a note with a collaborator by email")]
    async fn share_note(
        &self,
        Parameters(p): Parameters<CollaboratorParams>,
    ) -> Result<CallToolResult, McpError> {
        respond(self.api.share_note(&NoteId::from(p.note_id), &p.email).await)
    }

    #[tool(description = "Remove a collaborator from a note")]
    async fn unshare_note(
        &self,
        Parameters(p): Parameters<CollaboratorParams>,
    ) -> Result<CallToolResult, McpError> {
        respond(self.api.unshare_note(&NoteId::from(p.note_id), &p.email).await)
    }

    #[tool(description = "List the collaborators of a note")]
    async fn list_collaborators(
        &self,
        Parameters(p): Parameters<NoteIdParams>,
    ) -> Result<CallToolResult, McpError> {
        respond(self.api.list_collaborators(&NoteId::from(p.note_id)).await)
    }

    // ── List item tools ─────────────────────────────────────────────────

    #[tool(description = "Add an item to a checklist, optionally nested under another item. Parent and ancestors are re-checked automatically")]
    async fn note_add_list_item(
        &self,
        Parameters(p): Parameters<AddListItemParams>,
    ) -> Result<CallToolResult, McpError> {
        let note_id = NoteId::from(p.note_id.as_str());
        respond(self.api.add_item(&note_id, p.new_item()).await)
    }

    #[tool(description = "Get a single checklist item")]
    async fn note_get_list_item(
        &self,
        Parameters(p): Parameters<ListItemParams>,
    ) -> Result<CallToolResult, McpError> {
        let note_id = NoteId::from(p.note_id);
        respond(self.api.get_item(&note_id, &ItemId::from(p.item_id)).await)
    }

    #[tool(description = "Update a checklist item's text, checked state or parent. Checking cascades to children; parents follow their children")]
    async fn note_update_list_item(
        &self,
        Parameters(p): Parameters<UpdateListItemParams>,
    ) -> Result<CallToolResult, McpError> {
        let update = p.update();
        let note_id = NoteId::from(p.note_id);
        respond(
            self.api
                .update_item(&note_id, &ItemId::from(p.item_id), update)
                .await,
        )
    }

    #[tool(description = "Delete a checklist item together with all of its nested items")]
    async fn note_delete_list_item(
        &self,
        Parameters(p): Parameters<ListItemParams>,
    ) -> Result<CallToolResult, McpError> {
        let note_id = NoteId::from(p.note_id);
        respond(self.api.delete_item(&note_id, &ItemId::from(p.item_id)).await)
    }
}

#[tool_handler]
impl ServerHandler for KeepMcpServer {
    fn get_info(&self) -> ServerInfo {
        let mut instructions = String::from(
            "keep-mcp: notes and nested checklists. Only notes labeled '",
        );
        instructions.push_str(self.api.policy().label());
        instructions.push_str("' can be modified");
        if self.api.policy().is_unsafe() {
            instructions.push_str(" (unsafe mode: every note is writable)");
        }
        instructions.push('.');

        ServerInfo {
            instructions: Some(instructions),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Serve MCP over stdio until the client disconnects; returns an exit code.
pub async fn run_mcp_server(api: KeepApi) -> i32 {
    let server = KeepMcpServer::new(api);

    info!("keep-mcp server starting on stdio");

    let service = match server.serve(rmcp::transport::stdio()).await {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "failed to start MCP server");
            return 1;
        }
    };

    if let Err(e) = service.waiting().await {
        error!(error = %e, "MCP server error");
        return 1;
    }

    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checklist::{ListItem, Note};
    use crate::policy::AccessPolicy;
    use crate::storage::{MemoryStore, NoteStore};
    use std::sync::Arc;

    fn server() -> KeepMcpServer {
        KeepMcpServer::new(KeepApi::new(
            Arc::new(MemoryStore::new()),
            AccessPolicy::default(),
        ))
    }

    fn text_of(result: &CallToolResult) -> String {
        result
            .content
            .iter()
            .filter_map(|c| c.as_text().map(|t| t.text.clone()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn parse<T: serde::de::DeserializeOwned>(result: &CallToolResult) -> T {
        assert!(!result.is_error.unwrap_or(false), "tool failed: {}", text_of(result));
        serde_json::from_str(&text_of(result)).unwrap()
    }

    async fn new_list(server: &KeepMcpServer) -> Note {
        let result = server
            .create_list(Parameters(CreateListParams {
                title: "Groceries".into(),
                items: None,
            }))
            .await
            .unwrap();
        parse(&result)
    }

    async fn add(server: &KeepMcpServer, note: &Note, text: &str, parent: Option<&str>) -> String {
        let result = server
            .note_add_list_item(Parameters(AddListItemParams {
                note_id: note.id.to_string(),
                text: text.into(),
                checked: None,
                parent_item_id: parent.map(str::to_string),
            }))
            .await
            .unwrap();
        let change: serde_json::Value = parse(&result);
        change["item_id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn add_item_with_null_like_parent_goes_top_level() {
        let server = server();
        let note = new_list(&server).await;

        let id = add(&server, &note, "milk", Some("undefined")).await;
        let result = server
            .note_get_list_item(Parameters(ListItemParams {
                note_id: note.id.to_string(),
                item_id: id,
            }))
            .await
            .unwrap();
        let item: ListItem = parse(&result);
        assert!(item.parent.is_none());
    }

    #[tokio::test]
    async fn update_moves_and_cascades() {
        let server = server();
        let note = new_list(&server).await;
        let parent = add(&server, &note, "dairy", None).await;
        let child = add(&server, &note, "milk", Some(&parent)).await;

        // check the only child: parent follows
        let result = server
            .note_update_list_item(Parameters(UpdateListItemParams {
                note_id: note.id.to_string(),
                item_id: child.clone(),
                text: None,
                checked: Some(true),
                parent_item_id: None,
            }))
            .await
            .unwrap();
        let updated: Note = parse(&result);
        assert!(updated.items.get(&ItemId::from(parent.as_str())).unwrap().checked);

        // "null" moves the child back to the top level
        let result = server
            .note_update_list_item(Parameters(UpdateListItemParams {
                note_id: note.id.to_string(),
                item_id: child.clone(),
                text: None,
                checked: None,
                parent_item_id: Some("null".into()),
            }))
            .await
            .unwrap();
        let updated: Note = parse(&result);
        assert!(updated.items.get(&ItemId::from(child.as_str())).unwrap().parent.is_none());
    }

    #[tokio::test]
    async fn errors_come_back_as_tool_errors_with_a_code() {
        let server = server();
        let note = new_list(&server).await;

        let result = server
            .note_delete_list_item(Parameters(ListItemParams {
                note_id: note.id.to_string(),
                item_id: "missing".into(),
            }))
            .await
            .unwrap();
        assert!(result.is_error.unwrap_or(false));
        let body: serde_json::Value = serde_json::from_str(&text_of(&result)).unwrap();
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn unlabeled_note_is_forbidden() {
        let store = Arc::new(MemoryStore::new());
        let foreign = store.insert(Note::new("private", "")).await.unwrap();
        let server = KeepMcpServer::new(KeepApi::new(store, AccessPolicy::default()));

        let result = server
            .update_note(Parameters(UpdateNoteParams {
                note_id: foreign.id.to_string(),
                title: Some("mine now".into()),
                text: None,
            }))
            .await
            .unwrap();
        assert!(result.is_error.unwrap_or(false));
        assert!(text_of(&result).contains("FORBIDDEN"));
    }

    #[tokio::test]
    async fn create_list_nests_items_under_earlier_ones() {
        let server = server();
        let items: Vec<ListItemInput> = serde_json::from_value(serde_json::json!([
            {"id": "dairy", "text": "dairy"},
            {"text": "milk", "checked": true, "parent_item_id": "dairy"},
            {"text": "bread", "parent_item_id": "null"},
        ]))
        .unwrap();
        let result = server
            .create_list(Parameters(CreateListParams {
                title: "Groceries".into(),
                items: Some(items),
            }))
            .await
            .unwrap();
        let note: Note = parse(&result);

        let dairy = ItemId::from("dairy");
        assert!(note.items.get(&dairy).unwrap().checked);
        assert_eq!(note.items.children_of(Some(&dairy)).unwrap().len(), 1);
        assert_eq!(note.items.children_of(None).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn find_and_share_round_trip() {
        let server = server();
        new_list(&server).await;
        let result = server
            .find_note(Parameters(FindNoteParams {
                query: Some("grocer".into()),
            }))
            .await
            .unwrap();
        let found: Vec<Note> = parse(&result);
        assert_eq!(found.len(), 1);

        let note_id = found[0].id.to_string();
        server
            .share_note(Parameters(CollaboratorParams {
                note_id: note_id.clone(),
                email: "friend@example.com".into(),
            }))
            .await
            .unwrap();
        let result = server
            .list_collaborators(Parameters(NoteIdParams { note_id }))
            .await
            .unwrap();
        let collaborators: Vec<String> = parse(&result);
        assert_eq!(collaborators, vec!["friend@example.com"]);
    }

    #[test]
    fn server_info_names_the_label() {
        let info = server().get_info();
        assert!(info.instructions.unwrap().contains("keep-mcp"));
    }
}
