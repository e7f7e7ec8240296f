//! Checklist semantics on top of ItemTree
//!
//! Checking or unchecking an item applies to its whole subtree, and every
//! parent is checked exactly when all of its direct children are. Each entry
//! point validates its whole request before touching the tree, so a failed
//! call leaves the tree as it was.

use super::item::{ItemId, ItemUpdate, ListItem, NewItem, Placement};
use super::tree::ItemTree;
use crate::error::{KeepError, KeepResult};

fn validate_text(text: &str) -> KeepResult<()> {
    if text.trim().is_empty() {
        return Err(KeepError::Validation("item text must not be empty".into()));
    }
    Ok(())
}

/// Add a new item, then re-aggregate its parent chain.
pub fn add_item(tree: &mut ItemTree, new: NewItem) -> KeepResult<ItemId> {
    validate_text(&new.text)?;
    if let Some(parent) = &new.parent {
        if !tree.contains(parent) {
            return Err(KeepError::InvalidParent(format!("parent item {} not found", parent)));
        }
    }

    let parent = new.parent.clone();
    let mut item = ListItem::new(new.text).with_checked(new.checked);
    if let Some(id) = new.id {
        if id.as_str().trim().is_empty() {
            return Err(KeepError::Validation("item id cannot be empty".into()));
        }
        item = item.with_id(id);
    }
    let id = tree.insert(item, new.parent)?;
    reaggregate(tree, parent.as_ref())?;
    Ok(id)
}

/// Set `checked` on an item and its whole subtree, then walk upward.
pub fn set_checked(tree: &mut ItemTree, id: &ItemId, checked: bool) -> KeepResult<()> {
    let descendants = tree.descendants_of(id)?;

    tree.set_checked(id, checked)?;
    for descendant in &descendants {
        tree.set_checked(descendant, checked)?;
    }

    let parent = tree.get(id).and_then(|item| item.parent.clone());
    reaggregate(tree, parent.as_ref())?;
    Ok(())
}

/// Move an item under a new parent (or to the top level) and repair both
/// the old and the new parent chains.
pub fn move_item(tree: &mut ItemTree, id: &ItemId, placement: Placement) -> KeepResult<()> {
    let old_parent = tree
        .get(id)
        .ok_or_else(|| KeepError::ItemNotFound(id.clone()))?
        .parent
        .clone();
    let new_parent = placement.into_parent();

    tree.validate_reparent(id, new_parent.as_ref())?;
    if old_parent == new_parent {
        return Ok(());
    }

    tree.reparent(id, new_parent.clone())?;
    reaggregate(tree, old_parent.as_ref())?;
    reaggregate(tree, new_parent.as_ref())?;
    Ok(())
}

/// Delete an item with all of its descendants, then repair the surviving
/// parent chain. Returns the removed items in pre-order.
pub fn delete_item(tree: &mut ItemTree, id: &ItemId) -> KeepResult<Vec<ListItem>> {
    let parent = tree
        .get(id)
        .ok_or_else(|| KeepError::ItemNotFound(id.clone()))?
        .parent
        .clone();

    let removed = tree.remove_subtree(id)?;
    reaggregate(tree, parent.as_ref())?;
    Ok(removed)
}

/// Check every part of an update against the current tree.
pub fn validate_update(tree: &ItemTree, id: &ItemId, update: &ItemUpdate) -> KeepResult<()> {
    if !tree.contains(id) {
        return Err(KeepError::ItemNotFound(id.clone()));
    }
    if let Some(text) = &update.text {
        validate_text(text)?;
    }
    if let Some(placement) = &update.placement {
        tree.validate_reparent(id, placement.parent())?;
    }
    Ok(())
}

/// Apply text, then checked state, then placement.
pub fn update_item(tree: &mut ItemTree, id: &ItemId, update: &ItemUpdate) -> KeepResult<()> {
    validate_update(tree, id, update)?;

    if let Some(text) = &update.text {
        tree.set_text(id, text.clone())?;
    }
    if let Some(checked) = update.checked {
        set_checked(tree, id, checked)?;
    }
    if let Some(placement) = &update.placement {
        move_item(tree, id, placement.clone())?;
    }
    Ok(())
}

/// Walk upward from `start`, making each ancestor checked iff all of its
/// direct children are.
///
/// Stops at the top level, at an item whose state is already right, or at
/// an item with no children left (its state is kept). Returns how many
/// items changed.
pub fn reaggregate(tree: &mut ItemTree, start: Option<&ItemId>) -> KeepResult<usize> {
    let mut changed = 0;
    let mut current = start.cloned();

    while let Some(id) = current {
        let children = tree.children_of(Some(&id))?;
        if children.is_empty() {
            break;
        }
        let all_checked = children.iter().all(|child| child.checked);

        let item = tree.get(&id).ok_or_else(|| KeepError::ItemNotFound(id.clone()))?;
        if item.checked == all_checked {
            break;
        }
        let next = item.parent.clone();

        tree.set_checked(&id, all_checked)?;
        changed += 1;
        current = next;
    }

    Ok(changed)
}
