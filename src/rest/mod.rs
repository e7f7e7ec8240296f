//! REST API over the same operations the MCP server exposes
//!
//! Endpoints are split by resource:
//! - `note_endpoints`: notes, search, health and collaborators
//! - `item_endpoints`: checklist items

use axum::{
    http::Method,
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::api::KeepApi;

mod http_error;
mod item_endpoints;
mod note_endpoints;

pub use http_error::{HttpError, JsonBody};

/// Create the application router with all endpoint modules
pub fn create_router(api: KeepApi) -> Router {
    Router::new()
        .merge(note_endpoints::routes(api.clone()))
        .merge(item_endpoints::routes(api))
        .layer(cors_layer())
}

/// Browser clients on any origin may call the API
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any)
}

/// Bind `addr` (`host:port`) and serve until the process is stopped
pub async fn serve(api: KeepApi, addr: &str) -> std::io::Result<()> {
    let app = create_router(api);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, "keep-mcp REST API listening");
    axum::serve(listener, app).await
}
