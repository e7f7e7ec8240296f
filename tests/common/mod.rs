//! Common test utilities for keep-mcp integration tests
//!
//! Builds APIs over fresh stores and checks checklist trees for the
//! consistency rules every operation must preserve.

#![allow(dead_code)]

use keep_mcp::{
    AccessPolicy, ItemId, ItemTree, KeepApi, MemoryStore, NewItem, Note, NoteId, OpenStore,
    SqliteStore,
};
use std::path::Path;
use std::sync::Arc;

/// API over an in-process store with the default policy
pub fn memory_api() -> KeepApi {
    KeepApi::new(Arc::new(MemoryStore::new()), AccessPolicy::default())
}

/// API over a SQLite file at `path`
pub fn sqlite_api(path: &Path) -> KeepApi {
    let store = SqliteStore::open(path).expect("open sqlite store");
    KeepApi::new(Arc::new(store), AccessPolicy::default())
}

/// Create a checklist from `(key, parent_key)` pairs, in order.
///
/// Returns the note id and the item ids in the same order as `layout`.
pub async fn seed_list(api: &KeepApi, layout: &[(&str, Option<usize>)]) -> (NoteId, Vec<ItemId>) {
    let note = api.create_list("seeded", vec![]).await.expect("create list");
    let mut ids: Vec<ItemId> = Vec::new();
    for (text, parent) in layout {
        let mut new = NewItem::new(*text);
        if let Some(parent) = parent {
            new = new.under(ids[*parent].clone());
        }
        let change = api.add_item(&note.id, new).await.expect("add item");
        ids.push(change.item_id);
    }
    (note.id, ids)
}

/// Every item with children is checked iff all of its children are.
pub fn assert_consistent(tree: &ItemTree) {
    tree.validate().expect("tree structure");
    for item in tree.iter() {
        let children = tree.children_of(Some(&item.id)).expect("children");
        if children.is_empty() {
            continue;
        }
        let all_checked = children.iter().all(|c| c.checked);
        assert_eq!(
            item.checked, all_checked,
            "item {} ({}) is checked={} but all_children_checked={}",
            item.id, item.text, item.checked, all_checked
        );
    }
}

pub fn checked(note: &Note, id: &ItemId) -> bool {
    note.items.get(id).expect("item present").checked
}
