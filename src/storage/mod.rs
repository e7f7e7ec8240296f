//! Storage backends for keep-mcp
//!
//! Notes are persisted through the `NoteStore` trait. `SqliteStore` is the
//! durable backend; `MemoryStore` keeps everything in-process.

mod memory;
mod sqlite;
mod traits;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{NoteStore, OpenStore, StorageError, StorageResult};
