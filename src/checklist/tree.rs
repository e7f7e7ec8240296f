//! ItemTree: the checklist items of one note
//!
//! Items live in a flat arena in insertion order, with an id index on the
//! side. Parent links are id lookups into the same arena, never references,
//! so the tree can be cloned, mutated and discarded freely.

use super::item::{ItemId, ListItem};
use crate::error::{KeepError, KeepResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Sort key given to the first item placed under a parent
pub const DEFAULT_SORT: i64 = 0;

/// Gap between a newly placed item and its last sibling
pub const SORT_STEP: i64 = 1;

/// The checklist items of one note
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ListItem>", into = "Vec<ListItem>")]
pub struct ItemTree {
    items: Vec<ListItem>,
    index: HashMap<ItemId, usize>,
}

impl ItemTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from stored items, rejecting duplicate ids, dangling
    /// parents and cycles.
    pub fn from_items(items: Vec<ListItem>) -> KeepResult<Self> {
        let mut index = HashMap::with_capacity(items.len());
        for (pos, item) in items.iter().enumerate() {
            if index.insert(item.id.clone(), pos).is_some() {
                return Err(KeepError::Validation(format!("duplicate item id: {}", item.id)));
            }
        }

        let tree = Self { items, index };
        tree.validate()?;
        Ok(tree)
    }

    /// Check referential integrity and acyclicity of every parent link
    pub fn validate(&self) -> KeepResult<()> {
        for item in &self.items {
            self.ancestors_of(&item.id)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &ItemId) -> Option<&ListItem> {
        self.index.get(id).map(|&pos| &self.items[pos])
    }

    fn get_mut(&mut self, id: &ItemId) -> KeepResult<&mut ListItem> {
        match self.index.get(id) {
            Some(&pos) => Ok(&mut self.items[pos]),
            None => Err(KeepError::ItemNotFound(id.clone())),
        }
    }

    /// Items in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &ListItem> {
        self.items.iter()
    }

    pub fn into_items(self) -> Vec<ListItem> {
        self.items
    }

    /// Direct children ordered by ascending sort key, ties by insertion order.
    ///
    /// `None` names the top level.
    pub fn children_of(&self, parent: Option<&ItemId>) -> KeepResult<Vec<&ListItem>> {
        if let Some(id) = parent {
            if !self.contains(id) {
                return Err(KeepError::ItemNotFound(id.clone()));
            }
        }
        Ok(self.sorted_children(parent))
    }

    fn sorted_children(&self, parent: Option<&ItemId>) -> Vec<&ListItem> {
        let mut children: Vec<&ListItem> = self
            .items
            .iter()
            .filter(|item| item.parent.as_ref() == parent)
            .collect();
        children.sort_by_key(|item| item.sort);
        children
    }

    /// Parent chain from the immediate parent up to the top-level root.
    pub fn ancestors_of(&self, id: &ItemId) -> KeepResult<Vec<ItemId>> {
        let mut current = self.get(id).ok_or_else(|| KeepError::ItemNotFound(id.clone()))?;
        let mut ancestors = Vec::new();

        while let Some(parent_id) = current.parent.clone() {
            if ancestors.len() >= self.items.len() {
                return Err(KeepError::InvalidParent(format!("cycle detected above item {}", id)));
            }
            current = self.get(&parent_id).ok_or_else(|| {
                KeepError::InvalidParent(format!(
                    "item {} references missing parent {}",
                    current.id, parent_id
                ))
            })?;
            ancestors.push(parent_id);
        }

        Ok(ancestors)
    }

    /// All transitive descendants in pre-order.
    pub fn descendants_of(&self, id: &ItemId) -> KeepResult<Vec<ItemId>> {
        if !self.contains(id) {
            return Err(KeepError::ItemNotFound(id.clone()));
        }

        let mut descendants = Vec::new();
        let mut stack: Vec<ItemId> = self
            .sorted_children(Some(id))
            .iter()
            .rev()
            .map(|child| child.id.clone())
            .collect();

        while let Some(next) = stack.pop() {
            stack.extend(
                self.sorted_children(Some(&next))
                    .iter()
                    .rev()
                    .map(|child| child.id.clone()),
            );
            descendants.push(next);
        }

        Ok(descendants)
    }

    /// Whether `candidate` sits somewhere below `ancestor`
    pub fn is_descendant(&self, candidate: &ItemId, ancestor: &ItemId) -> bool {
        self.ancestors_of(candidate)
            .map(|chain| chain.contains(ancestor))
            .unwrap_or(false)
    }

    /// Every item with its depth, walking top-level items and their
    /// subtrees in sibling order.
    pub fn outline(&self) -> Vec<(usize, &ListItem)> {
        let mut out = Vec::with_capacity(self.items.len());
        let mut stack: Vec<(usize, &ListItem)> = self
            .sorted_children(None)
            .into_iter()
            .rev()
            .map(|item| (0, item))
            .collect();

        while let Some((depth, item)) = stack.pop() {
            stack.extend(
                self.sorted_children(Some(&item.id))
                    .into_iter()
                    .rev()
                    .map(|child| (depth + 1, child)),
            );
            out.push((depth, item));
        }

        out
    }

    fn next_sort(&self, parent: Option<&ItemId>, exclude: Option<&ItemId>) -> i64 {
        self.items
            .iter()
            .filter(|item| item.parent.as_ref() == parent && Some(&item.id) != exclude)
            .map(|item| item.sort)
            .max()
            .map(|max| max.saturating_add(SORT_STEP))
            .unwrap_or(DEFAULT_SORT)
    }

    /// Attach a new item under `parent`, last among its siblings.
    pub fn insert(&mut self, mut item: ListItem, parent: Option<ItemId>) -> KeepResult<ItemId> {
        if self.contains(&item.id) {
            return Err(KeepError::Validation(format!("duplicate item id: {}", item.id)));
        }
        if let Some(parent_id) = &parent {
            if !self.contains(parent_id) {
                return Err(KeepError::InvalidParent(format!("parent item {} not found", parent_id)));
            }
        }

        item.sort = self.next_sort(parent.as_ref(), None);
        item.parent = parent;

        let id = item.id.clone();
        self.index.insert(id.clone(), self.items.len());
        self.items.push(item);
        Ok(id)
    }

    /// Check that `id` may be moved under `new_parent` without mutating anything.
    pub fn validate_reparent(&self, id: &ItemId, new_parent: Option<&ItemId>) -> KeepResult<()> {
        if !self.contains(id) {
            return Err(KeepError::ItemNotFound(id.clone()));
        }
        let Some(target) = new_parent else {
            return Ok(());
        };
        if !self.contains(target) {
            return Err(KeepError::InvalidParent(format!("parent item {} not found", target)));
        }
        if target == id {
            return Err(KeepError::InvalidParent(format!("item {} cannot be its own parent", id)));
        }
        if self.is_descendant(target, id) {
            return Err(KeepError::InvalidParent(format!(
                "item {} is a descendant of {} and cannot become its parent",
                target, id
            )));
        }
        Ok(())
    }

    /// Move an item (with its subtree) under `new_parent`, last among its
    /// new siblings.
    pub fn reparent(&mut self, id: &ItemId, new_parent: Option<ItemId>) -> KeepResult<()> {
        self.validate_reparent(id, new_parent.as_ref())?;
        let sort = self.next_sort(new_parent.as_ref(), Some(id));
        let item = self.get_mut(id)?;
        item.parent = new_parent;
        item.sort = sort;
        Ok(())
    }

    /// Remove an item and all of its descendants, returned in pre-order.
    pub fn remove_subtree(&mut self, id: &ItemId) -> KeepResult<Vec<ListItem>> {
        let mut doomed = vec![id.clone()];
        doomed.extend(self.descendants_of(id)?);

        let order: HashMap<ItemId, usize> = doomed
            .into_iter()
            .enumerate()
            .map(|(pos, id)| (id, pos))
            .collect();

        let (mut removed, kept): (Vec<ListItem>, Vec<ListItem>) = std::mem::take(&mut self.items)
            .into_iter()
            .partition(|item| order.contains_key(&item.id));
        removed.sort_by_key(|item| order[&item.id]);

        self.items = kept;
        self.reindex();
        Ok(removed)
    }

    fn reindex(&mut self) {
        self.index = self
            .items
            .iter()
            .enumerate()
            .map(|(pos, item)| (item.id.clone(), pos))
            .collect();
    }

    pub(crate) fn set_text(&mut self, id: &ItemId, text: String) -> KeepResult<()> {
        self.get_mut(id)?.text = text;
        Ok(())
    }

    pub(crate) fn set_checked(&mut self, id: &ItemId, checked: bool) -> KeepResult<()> {
        self.get_mut(id)?.checked = checked;
        Ok(())
    }
}

impl TryFrom<Vec<ListItem>> for ItemTree {
    type Error = KeepError;

    fn try_from(items: Vec<ListItem>) -> Result<Self, Self::Error> {
        Self::from_items(items)
    }
}

impl From<ItemTree> for Vec<ListItem> {
    fn from(tree: ItemTree) -> Self {
        tree.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> ItemId {
        ItemId::from(s)
    }

    /// root
    /// ├── a
    /// │   └── a1
    /// └── b
    fn sample_tree() -> ItemTree {
        let mut tree = ItemTree::new();
        tree.insert(ListItem::new("root").with_id("root"), None).unwrap();
        tree.insert(ListItem::new("a").with_id("a"), Some(id("root"))).unwrap();
        tree.insert(ListItem::new("b").with_id("b"), Some(id("root"))).unwrap();
        tree.insert(ListItem::new("a1").with_id("a1"), Some(id("a"))).unwrap();
        tree
    }

    fn ids(items: &[&ListItem]) -> Vec<String> {
        items.iter().map(|i| i.id.to_string()).collect()
    }

    #[test]
    fn insert_assigns_increasing_sort_keys_per_parent() {
        let tree = sample_tree();
        assert_eq!(tree.get(&id("root")).unwrap().sort, DEFAULT_SORT);
        assert_eq!(tree.get(&id("a")).unwrap().sort, DEFAULT_SORT);
        assert_eq!(tree.get(&id("b")).unwrap().sort, DEFAULT_SORT + SORT_STEP);
        assert_eq!(tree.get(&id("a1")).unwrap().sort, DEFAULT_SORT);
    }

    #[test]
    fn insert_rejects_missing_parent() {
        let mut tree = sample_tree();
        let err = tree.insert(ListItem::new("x"), Some(id("ghost"))).unwrap_err();
        assert!(matches!(err, KeepError::InvalidParent(_)));
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn insert_rejects_duplicate_id() {
        let mut tree = sample_tree();
        let err = tree.insert(ListItem::new("again").with_id("a"), None).unwrap_err();
        assert!(matches!(err, KeepError::Validation(_)));
    }

    #[test]
    fn children_are_ordered_by_sort_key() {
        let tree = ItemTree::from_items(vec![
            ListItem::new("late").with_id("late").with_sort(30),
            ListItem::new("early").with_id("early").with_sort(10),
            ListItem::new("mid").with_id("mid").with_sort(20),
        ])
        .unwrap();
        assert_eq!(ids(&tree.children_of(None).unwrap()), vec!["early", "mid", "late"]);
    }

    #[test]
    fn sort_ties_fall_back_to_insertion_order() {
        let tree = ItemTree::from_items(vec![
            ListItem::new("first").with_id("first").with_sort(5),
            ListItem::new("second").with_id("second").with_sort(5),
        ])
        .unwrap();
        assert_eq!(ids(&tree.children_of(None).unwrap()), vec!["first", "second"]);
    }

    #[test]
    fn children_of_unknown_item_is_not_found() {
        let tree = sample_tree();
        assert!(matches!(
            tree.children_of(Some(&id("ghost"))),
            Err(KeepError::ItemNotFound(_))
        ));
        assert!(tree.children_of(Some(&id("b"))).unwrap().is_empty());
    }

    #[test]
    fn ancestors_run_from_parent_to_root() {
        let tree = sample_tree();
        assert_eq!(tree.ancestors_of(&id("a1")).unwrap(), vec![id("a"), id("root")]);
        assert!(tree.ancestors_of(&id("root")).unwrap().is_empty());
    }

    #[test]
    fn descendants_are_pre_order() {
        let tree = sample_tree();
        assert_eq!(
            tree.descendants_of(&id("root")).unwrap(),
            vec![id("a"), id("a1"), id("b")]
        );
    }

    #[test]
    fn reparent_moves_item_last_among_new_siblings() {
        let mut tree = sample_tree();
        tree.reparent(&id("a1"), Some(id("root"))).unwrap();
        assert_eq!(
            ids(&tree.children_of(Some(&id("root"))).unwrap()),
            vec!["a", "b", "a1"]
        );
        assert!(tree.children_of(Some(&id("a"))).unwrap().is_empty());
    }

    #[test]
    fn reparent_to_top_level() {
        let mut tree = sample_tree();
        tree.reparent(&id("a"), None).unwrap();
        assert_eq!(ids(&tree.children_of(None).unwrap()), vec!["root", "a"]);
        // subtree travels with the item
        assert_eq!(tree.ancestors_of(&id("a1")).unwrap(), vec![id("a")]);
    }

    #[test]
    fn reparent_under_own_descendant_is_rejected() {
        let mut tree = sample_tree();
        let before = tree.clone();
        let err = tree.reparent(&id("root"), Some(id("a1"))).unwrap_err();
        assert!(matches!(err, KeepError::InvalidParent(_)));
        assert_eq!(tree, before);
    }

    #[test]
    fn reparent_under_itself_is_rejected() {
        let mut tree = sample_tree();
        assert!(matches!(
            tree.reparent(&id("a"), Some(id("a"))),
            Err(KeepError::InvalidParent(_))
        ));
    }

    #[test]
    fn reparent_unknown_item_is_not_found() {
        let mut tree = sample_tree();
        assert!(matches!(
            tree.reparent(&id("ghost"), None),
            Err(KeepError::ItemNotFound(_))
        ));
    }

    #[test]
    fn remove_subtree_returns_removed_items_in_pre_order() {
        let mut tree = sample_tree();
        let removed = tree.remove_subtree(&id("a")).unwrap();
        let removed_ids: Vec<ItemId> = removed.into_iter().map(|i| i.id).collect();
        assert_eq!(removed_ids, vec![id("a"), id("a1")]);
        assert_eq!(tree.len(), 2);
        assert!(!tree.contains(&id("a1")));
        // index stays consistent after compaction
        assert_eq!(tree.get(&id("b")).unwrap().text, "b");
        tree.validate().unwrap();
    }

    #[test]
    fn from_items_rejects_dangling_parent() {
        let err = ItemTree::from_items(vec![ListItem::new("x").with_id("x").with_parent("ghost")])
            .unwrap_err();
        assert!(matches!(err, KeepError::InvalidParent(_)));
    }

    #[test]
    fn from_items_rejects_cycles() {
        let err = ItemTree::from_items(vec![
            ListItem::new("x").with_id("x").with_parent("y"),
            ListItem::new("y").with_id("y").with_parent("x"),
        ])
        .unwrap_err();
        assert!(matches!(err, KeepError::InvalidParent(_)));
    }

    #[test]
    fn deserialization_validates() {
        let json = r#"[{"id":"x","text":"x","parent_item_id":"x"}]"#;
        assert!(serde_json::from_str::<ItemTree>(json).is_err());
    }

    #[test]
    fn outline_reports_depths() {
        let tree = sample_tree();
        let outline: Vec<(usize, String)> = tree
            .outline()
            .into_iter()
            .map(|(depth, item)| (depth, item.id.to_string()))
            .collect();
        assert_eq!(
            outline,
            vec![
                (0, "root".to_string()),
                (1, "a".to_string()),
                (2, "a1".to_string()),
                (1, "b".to_string()),
            ]
        );
    }
}
