//! Notes and their checklist item trees

pub mod cascade;
mod item;
mod note;
mod tree;


pub use item::{ItemId, ItemUpdate, ListItem, NewItem, Placement};
pub use note::{Color, Note, NoteId, NoteKind};
pub use tree::{ItemTree, DEFAULT_SORT, SORT_STEP};
