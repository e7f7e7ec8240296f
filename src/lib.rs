//! keep-mcp: notes and nested checklists for AI agents
//!
//! Notes hold either flat text or a checklist whose items nest under one
//! another. The checklist engine keeps the tree consistent on every change:
//!
//! - **Check-down**: checking or unchecking an item applies to its subtree
//! - **Check-up**: a parent is checked exactly when all its children are
//! - **Reparenting** and **deletion** repair the affected parent chains
//!
//! The same operations are served over MCP (stdio) and REST, through
//! [`KeepApi`], which serializes writers per note and only modifies notes
//! that carry the protective label unless unsafe mode is on.
//!
//! # Example
//!
//! ```
//! use keep_mcp::checklist::{cascade, ItemTree, ItemUpdate, NewItem};
//!
//! let mut tree = ItemTree::new();
//! let parent = cascade::add_item(&mut tree, NewItem::new("dairy")).unwrap();
//! let child = cascade::add_item(&mut tree, NewItem::new("milk").under(parent.clone())).unwrap();
//!
//! cascade::update_item(&mut tree, &child, &ItemUpdate::new().checked(true)).unwrap();
//! assert!(tree.get(&parent).unwrap().checked);
//! ```

pub mod api;
pub mod checklist;
pub mod config;
pub mod error;
pub mod mcp;
pub mod policy;
pub mod rest;
pub mod storage;

pub use api::{ItemChange, KeepApi};
pub use checklist::{
    Color, ItemId, ItemTree, ItemUpdate, ListItem, NewItem, Note, NoteId, NoteKind, Placement,
};
pub use config::Settings;
pub use error::{ErrorKind, KeepError, KeepResult};
pub use policy::AccessPolicy;
pub use storage::{MemoryStore, NoteStore, OpenStore, SqliteStore, StorageError, StorageResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
