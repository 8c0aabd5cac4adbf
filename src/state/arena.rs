//! Normalized backlog arena.
//!
//! Instead of a 5-level nested tree, every node kind lives in a flat map
//! keyed by id, with sibling ordering kept as id lists (one root list for
//! products, one list per parent for everything else). Locating a node is
//! O(1) and a mutation patches exactly one record plus at most one order
//! list; the nested view is rebuilt on demand by [`Arena::tree`].
//!
//! Invariants maintained by every operation:
//! - a record's parent back-reference always equals the id of the parent
//!   whose order list contains it
//! - every id in an order list resolves to a record of the right kind
//! - ids never repeat across kinds, so lookup by id alone is well-defined

use std::collections::HashMap;

use crate::models::tree::{EpicTree, FeatureTree, ProductTree, StoryTree};
use crate::models::{Epic, Feature, Node, NodeKind, Product, Task, UserStory};
use crate::{Error, Result};

/// Flat per-kind storage plus sibling order indices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arena {
    products: HashMap<String, Product>,
    features: HashMap<String, Feature>,
    epics: HashMap<String, Epic>,
    stories: HashMap<String, UserStory>,
    tasks: HashMap<String, Task>,

    /// Root-level product ordering
    product_order: Vec<String>,
    /// product id -> ordered feature ids
    feature_order: HashMap<String, Vec<String>>,
    /// feature id -> ordered epic ids
    epic_order: HashMap<String, Vec<String>>,
    /// epic id -> ordered story ids
    story_order: HashMap<String, Vec<String>>,
    /// story id -> ordered task ids
    task_order: HashMap<String, Vec<String>>,
}

impl Arena {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of nodes across all kinds.
    pub fn len(&self) -> usize {
        self.products.len()
            + self.features.len()
            + self.epics.len()
            + self.stories.len()
            + self.tasks.len()
    }

    /// Check if the arena holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Node count per kind, outermost first.
    pub fn counts(&self) -> Vec<(NodeKind, usize)> {
        vec![
            (NodeKind::Product, self.products.len()),
            (NodeKind::Feature, self.features.len()),
            (NodeKind::Epic, self.epics.len()),
            (NodeKind::UserStory, self.stories.len()),
            (NodeKind::Task, self.tasks.len()),
        ]
    }

    // === Accessors ===

    pub fn product(&self, id: &str) -> Option<&Product> {
        self.products.get(id)
    }

    pub fn feature(&self, id: &str) -> Option<&Feature> {
        self.features.get(id)
    }

    pub fn epic(&self, id: &str) -> Option<&Epic> {
        self.epics.get(id)
    }

    pub fn story(&self, id: &str) -> Option<&UserStory> {
        self.stories.get(id)
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.get(id)
    }

    pub(crate) fn story_mut(&mut self, id: &str) -> Option<&mut UserStory> {
        self.stories.get_mut(id)
    }

    pub(crate) fn task_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.get_mut(id)
    }

    pub(crate) fn features_mut(&mut self) -> impl Iterator<Item = &mut Feature> {
        self.features.values_mut()
    }

    pub(crate) fn epics_mut(&mut self) -> impl Iterator<Item = &mut Epic> {
        self.epics.values_mut()
    }

    pub(crate) fn stories_mut(&mut self) -> impl Iterator<Item = &mut UserStory> {
        self.stories.values_mut()
    }

    pub(crate) fn tasks_mut(&mut self) -> impl Iterator<Item = &mut Task> {
        self.tasks.values_mut()
    }

    /// Whether a node of the given kind exists.
    pub fn contains(&self, kind: NodeKind, id: &str) -> bool {
        match kind {
            NodeKind::Product => self.products.contains_key(id),
            NodeKind::Feature => self.features.contains_key(id),
            NodeKind::Epic => self.epics.contains_key(id),
            NodeKind::UserStory => self.stories.contains_key(id),
            NodeKind::Task => self.tasks.contains_key(id),
        }
    }

    /// The kind of the node with this id, if present in any map.
    pub fn kind_of(&self, id: &str) -> Option<NodeKind> {
        NodeKind::all()
            .iter()
            .copied()
            .find(|kind| self.contains(*kind, id))
    }

    /// Get a node as the tagged union.
    pub fn node(&self, kind: NodeKind, id: &str) -> Option<Node> {
        match kind {
            NodeKind::Product => self.products.get(id).cloned().map(Node::Product),
            NodeKind::Feature => self.features.get(id).cloned().map(Node::Feature),
            NodeKind::Epic => self.epics.get(id).cloned().map(Node::Epic),
            NodeKind::UserStory => self.stories.get(id).cloned().map(Node::UserStory),
            NodeKind::Task => self.tasks.get(id).cloned().map(Node::Task),
        }
    }

    /// Lookup by id alone, scanning the per-kind maps.
    ///
    /// Ids are globally unique, so at most one map can hold the id. This is
    /// what makes kind-less surfaces (drag-and-drop, `show <id>`) safe.
    pub fn find_by_id(&self, id: &str) -> Option<Node> {
        self.kind_of(id).and_then(|kind| self.node(kind, id))
    }

    /// Products in display order.
    pub fn products_in_order(&self) -> Vec<&Product> {
        self.product_order
            .iter()
            .filter_map(|id| self.products.get(id))
            .collect()
    }

    /// Ordered child ids of a parent for the given child kind.
    pub fn child_ids(&self, kind: NodeKind, parent: Option<&str>) -> &[String] {
        match (kind, parent) {
            (NodeKind::Product, None) => &self.product_order,
            (NodeKind::Feature, Some(p)) => ids_or_empty(&self.feature_order, p),
            (NodeKind::Epic, Some(p)) => ids_or_empty(&self.epic_order, p),
            (NodeKind::UserStory, Some(p)) => ids_or_empty(&self.story_order, p),
            (NodeKind::Task, Some(p)) => ids_or_empty(&self.task_order, p),
            _ => &[],
        }
    }

    /// The parent slot a node sits in: `None` for the product root list,
    /// `Some(parent_id)` otherwise. Outer `None` when the node is absent.
    pub fn parent_of(&self, kind: NodeKind, id: &str) -> Option<Option<String>> {
        match kind {
            NodeKind::Product => self.products.contains_key(id).then_some(None),
            NodeKind::Feature => self.features.get(id).map(|f| Some(f.product_id.clone())),
            NodeKind::Epic => self.epics.get(id).map(|e| Some(e.feature_id.clone())),
            NodeKind::UserStory => self.stories.get(id).map(|s| Some(s.epic_id.clone())),
            NodeKind::Task => self.tasks.get(id).map(|t| Some(t.user_story_id.clone())),
        }
    }

    /// All stories in hierarchy display order.
    pub fn stories_in_order(&self) -> Vec<&UserStory> {
        let mut out = Vec::with_capacity(self.stories.len());
        for product in &self.product_order {
            for feature in self.child_ids(NodeKind::Feature, Some(product.as_str())) {
                for epic in self.child_ids(NodeKind::Epic, Some(feature.as_str())) {
                    for story in self.child_ids(NodeKind::UserStory, Some(epic.as_str())) {
                        if let Some(s) = self.stories.get(story) {
                            out.push(s);
                        }
                    }
                }
            }
        }
        out
    }

    /// All tasks in hierarchy display order.
    pub fn tasks_in_order(&self) -> Vec<&Task> {
        let mut out = Vec::with_capacity(self.tasks.len());
        for story in self.stories_in_order() {
            for task in self.child_ids(NodeKind::Task, Some(story.id.as_str())) {
                if let Some(t) = self.tasks.get(task) {
                    out.push(t);
                }
            }
        }
        out
    }

    // === Mutations ===

    /// Insert a node under the parent named by its back-reference.
    ///
    /// Fails with `ParentNotFound` when no parent of the expected kind has
    /// that id, and with `InvalidInput` on a duplicate id (ids are never
    /// reused).
    pub fn insert(&mut self, node: Node) -> Result<()> {
        let id = node.id().to_string();
        if self.kind_of(&id).is_some() {
            return Err(Error::InvalidInput(format!("Duplicate id: {}", id)));
        }

        match node {
            Node::Product(p) => {
                self.product_order.push(p.id.clone());
                self.products.insert(p.id.clone(), p);
            }
            Node::Feature(f) => {
                if !self.products.contains_key(&f.product_id) {
                    return Err(Error::ParentNotFound(format!(
                        "product {} for feature {}",
                        f.product_id, f.id
                    )));
                }
                self.feature_order
                    .entry(f.product_id.clone())
                    .or_default()
                    .push(f.id.clone());
                self.features.insert(f.id.clone(), f);
            }
            Node::Epic(e) => {
                if !self.features.contains_key(&e.feature_id) {
                    return Err(Error::ParentNotFound(format!(
                        "feature {} for epic {}",
                        e.feature_id, e.id
                    )));
                }
                self.epic_order
                    .entry(e.feature_id.clone())
                    .or_default()
                    .push(e.id.clone());
                self.epics.insert(e.id.clone(), e);
            }
            Node::UserStory(s) => {
                if !self.epics.contains_key(&s.epic_id) {
                    return Err(Error::ParentNotFound(format!(
                        "epic {} for user-story {}",
                        s.epic_id, s.id
                    )));
                }
                self.story_order
                    .entry(s.epic_id.clone())
                    .or_default()
                    .push(s.id.clone());
                self.stories.insert(s.id.clone(), s);
            }
            Node::Task(t) => {
                if !self.stories.contains_key(&t.user_story_id) {
                    return Err(Error::ParentNotFound(format!(
                        "user-story {} for task {}",
                        t.user_story_id, t.id
                    )));
                }
                self.task_order
                    .entry(t.user_story_id.clone())
                    .or_default()
                    .push(t.id.clone());
                self.tasks.insert(t.id.clone(), t);
            }
        }
        Ok(())
    }

    /// Replace a node wholly, keeping its children, creation timestamp, and
    /// parent back-reference (there is no move operation, so the existing
    /// containment always wins).
    pub fn replace(&mut self, node: Node) -> Result<()> {
        match node {
            Node::Product(mut p) => {
                let existing = self
                    .products
                    .get(&p.id)
                    .ok_or_else(|| Error::NodeNotFound(format!("product {}", p.id)))?;
                p.created_at = existing.created_at;
                self.products.insert(p.id.clone(), p);
            }
            Node::Feature(mut f) => {
                let existing = self
                    .features
                    .get(&f.id)
                    .ok_or_else(|| Error::NodeNotFound(format!("feature {}", f.id)))?;
                f.created_at = existing.created_at;
                f.product_id = existing.product_id.clone();
                self.features.insert(f.id.clone(), f);
            }
            Node::Epic(mut e) => {
                let existing = self
                    .epics
                    .get(&e.id)
                    .ok_or_else(|| Error::NodeNotFound(format!("epic {}", e.id)))?;
                e.created_at = existing.created_at;
                e.feature_id = existing.feature_id.clone();
                self.epics.insert(e.id.clone(), e);
            }
            Node::UserStory(mut s) => {
                let existing = self
                    .stories
                    .get(&s.id)
                    .ok_or_else(|| Error::NodeNotFound(format!("user-story {}", s.id)))?;
                s.created_at = existing.created_at;
                s.epic_id = existing.epic_id.clone();
                self.stories.insert(s.id.clone(), s);
            }
            Node::Task(mut t) => {
                let existing = self
                    .tasks
                    .get(&t.id)
                    .ok_or_else(|| Error::NodeNotFound(format!("task {}", t.id)))?;
                t.created_at = existing.created_at;
                t.user_story_id = existing.user_story_id.clone();
                self.tasks.insert(t.id.clone(), t);
            }
        }
        Ok(())
    }

    /// Remove a node and its entire subtree.
    ///
    /// Returns every removed (kind, id) pair, the node itself first.
    /// Removing an absent id returns an empty vec; deletion is idempotent.
    pub fn remove(&mut self, kind: NodeKind, id: &str) -> Vec<(NodeKind, String)> {
        let mut removed = Vec::new();
        match kind {
            NodeKind::Product => {
                if !self.products.contains_key(id) {
                    return removed;
                }
                self.product_order.retain(|x| x != id);
                self.remove_product_subtree(id, &mut removed);
            }
            NodeKind::Feature => {
                let Some(parent) = self.features.get(id).map(|f| f.product_id.clone()) else {
                    return removed;
                };
                detach(&mut self.feature_order, &parent, id);
                self.remove_feature_subtree(id, &mut removed);
            }
            NodeKind::Epic => {
                let Some(parent) = self.epics.get(id).map(|e| e.feature_id.clone()) else {
                    return removed;
                };
                detach(&mut self.epic_order, &parent, id);
                self.remove_epic_subtree(id, &mut removed);
            }
            NodeKind::UserStory => {
                let Some(parent) = self.stories.get(id).map(|s| s.epic_id.clone()) else {
                    return removed;
                };
                detach(&mut self.story_order, &parent, id);
                self.remove_story_subtree(id, &mut removed);
            }
            NodeKind::Task => {
                let Some(parent) = self.tasks.get(id).map(|t| t.user_story_id.clone()) else {
                    return removed;
                };
                detach(&mut self.task_order, &parent, id);
                if let Some(t) = self.tasks.remove(id) {
                    removed.push((NodeKind::Task, t.id));
                }
            }
        }
        removed
    }

    fn remove_product_subtree(&mut self, id: &str, removed: &mut Vec<(NodeKind, String)>) {
        if let Some(p) = self.products.remove(id) {
            removed.push((NodeKind::Product, p.id));
            for fid in self.feature_order.remove(id).unwrap_or_default() {
                self.remove_feature_subtree(&fid, removed);
            }
        }
    }

    fn remove_feature_subtree(&mut self, id: &str, removed: &mut Vec<(NodeKind, String)>) {
        if let Some(f) = self.features.remove(id) {
            removed.push((NodeKind::Feature, f.id));
            for eid in self.epic_order.remove(id).unwrap_or_default() {
                self.remove_epic_subtree(&eid, removed);
            }
        }
    }

    fn remove_epic_subtree(&mut self, id: &str, removed: &mut Vec<(NodeKind, String)>) {
        if let Some(e) = self.epics.remove(id) {
            removed.push((NodeKind::Epic, e.id));
            for sid in self.story_order.remove(id).unwrap_or_default() {
                self.remove_story_subtree(&sid, removed);
            }
        }
    }

    fn remove_story_subtree(&mut self, id: &str, removed: &mut Vec<(NodeKind, String)>) {
        if let Some(s) = self.stories.remove(id) {
            removed.push((NodeKind::UserStory, s.id));
            for tid in self.task_order.remove(id).unwrap_or_default() {
                if let Some(t) = self.tasks.remove(&tid) {
                    removed.push((NodeKind::Task, t.id));
                }
            }
        }
    }

    /// Reorder siblings: remove `dragged` and reinsert it immediately before
    /// `target`, scoped to same parent and same kind.
    ///
    /// Returns whether anything changed. Every mismatch - unknown ids, a
    /// self-target, nodes of the stated kind under different parents - is a
    /// silent no-op.
    pub fn reorder(&mut self, kind: NodeKind, dragged: &str, target: &str) -> bool {
        if dragged == target {
            return false;
        }

        if kind == NodeKind::Product {
            if !self.products.contains_key(dragged) || !self.products.contains_key(target) {
                return false;
            }
            return reorder_before(&mut self.product_order, dragged, target);
        }

        let (Some(Some(dragged_parent)), Some(Some(target_parent))) =
            (self.parent_of(kind, dragged), self.parent_of(kind, target))
        else {
            return false;
        };
        if dragged_parent != target_parent {
            return false;
        }

        let list = match kind {
            NodeKind::Feature => self.feature_order.get_mut(&dragged_parent),
            NodeKind::Epic => self.epic_order.get_mut(&dragged_parent),
            NodeKind::UserStory => self.story_order.get_mut(&dragged_parent),
            NodeKind::Task => self.task_order.get_mut(&dragged_parent),
            NodeKind::Product => unreachable!("handled above"),
        };
        match list {
            Some(list) => reorder_before(list, dragged, target),
            None => false,
        }
    }

    // === Tree projection ===

    /// Build the full nested view.
    pub fn tree(&self) -> Vec<ProductTree> {
        self.product_order
            .iter()
            .filter_map(|id| self.product_tree(id))
            .collect()
    }

    /// Nested view of a single product subtree.
    pub fn product_tree(&self, id: &str) -> Option<ProductTree> {
        let product = self.products.get(id)?.clone();
        let features = self
            .child_ids(NodeKind::Feature, Some(id))
            .iter()
            .filter_map(|fid| self.feature_tree(fid))
            .collect();
        Some(ProductTree { product, features })
    }

    /// Nested view of a single feature subtree.
    pub fn feature_tree(&self, id: &str) -> Option<FeatureTree> {
        let feature = self.features.get(id)?.clone();
        let epics = self
            .child_ids(NodeKind::Epic, Some(id))
            .iter()
            .filter_map(|eid| self.epic_tree(eid))
            .collect();
        Some(FeatureTree { feature, epics })
    }

    /// Nested view of a single epic subtree.
    pub fn epic_tree(&self, id: &str) -> Option<EpicTree> {
        let epic = self.epics.get(id)?.clone();
        let user_stories = self
            .child_ids(NodeKind::UserStory, Some(id))
            .iter()
            .filter_map(|sid| self.story_tree(sid))
            .collect();
        Some(EpicTree { epic, user_stories })
    }

    /// Nested view of a single story with its tasks.
    pub fn story_tree(&self, id: &str) -> Option<StoryTree> {
        let story = self.stories.get(id)?.clone();
        let tasks = self
            .child_ids(NodeKind::Task, Some(id))
            .iter()
            .filter_map(|tid| self.tasks.get(tid).cloned())
            .collect();
        Some(StoryTree { story, tasks })
    }

    /// Normalize a nested tree into a fresh arena.
    ///
    /// Parent back-references are forced to match actual containment, so a
    /// store that returns inconsistent back-refs cannot break the invariant.
    pub fn from_tree(trees: Vec<ProductTree>) -> Self {
        let mut arena = Self::new();
        for ProductTree { product, features } in trees {
            let product_id = product.id.clone();
            arena.product_order.push(product_id.clone());
            arena.products.insert(product_id.clone(), product);
            for FeatureTree { mut feature, epics } in features {
                feature.product_id = product_id.clone();
                let feature_id = feature.id.clone();
                arena
                    .feature_order
                    .entry(product_id.clone())
                    .or_default()
                    .push(feature_id.clone());
                arena.features.insert(feature_id.clone(), feature);
                for EpicTree {
                    mut epic,
                    user_stories,
                } in epics
                {
                    epic.feature_id = feature_id.clone();
                    let epic_id = epic.id.clone();
                    arena
                        .epic_order
                        .entry(feature_id.clone())
                        .or_default()
                        .push(epic_id.clone());
                    arena.epics.insert(epic_id.clone(), epic);
                    for StoryTree { mut story, tasks } in user_stories {
                        story.epic_id = epic_id.clone();
                        let story_id = story.id.clone();
                        arena
                            .story_order
                            .entry(epic_id.clone())
                            .or_default()
                            .push(story_id.clone());
                        arena.stories.insert(story_id.clone(), story);
                        for mut task in tasks {
                            task.user_story_id = story_id.clone();
                            arena
                                .task_order
                                .entry(story_id.clone())
                                .or_default()
                                .push(task.id.clone());
                            arena.tasks.insert(task.id.clone(), task);
                        }
                    }
                }
            }
        }
        arena
    }
}

fn ids_or_empty<'a>(map: &'a HashMap<String, Vec<String>>, key: &str) -> &'a [String] {
    map.get(key).map(Vec::as_slice).unwrap_or(&[])
}

fn detach(map: &mut HashMap<String, Vec<String>>, parent: &str, id: &str) {
    if let Some(list) = map.get_mut(parent) {
        list.retain(|x| x != id);
    }
}

fn reorder_before(list: &mut Vec<String>, dragged: &str, target: &str) -> bool {
    let Some(from) = list.iter().position(|x| x == dragged) else {
        return false;
    };
    if !list.iter().any(|x| x == target) {
        return false;
    }
    list.remove(from);
    // Target index after the removal; insert directly before it.
    let to = list
        .iter()
        .position(|x| x == target)
        .unwrap_or(list.len());
    list.insert(to, dragged.to_string());
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Epic, Feature, Product, Task, UserStory};

    fn arena_with_chain() -> Arena {
        let mut arena = Arena::new();
        arena
            .insert(Node::Product(Product::new("pd-1".into(), "Shop".into())))
            .unwrap();
        arena
            .insert(Node::Feature(Feature::new(
                "ft-1".into(),
                "Auth".into(),
                "pd-1".into(),
            )))
            .unwrap();
        arena
            .insert(Node::Epic(Epic::new(
                "ep-1".into(),
                "Login".into(),
                "ft-1".into(),
            )))
            .unwrap();
        arena
            .insert(Node::UserStory(UserStory::new(
                "us-1".into(),
                "Sign in".into(),
                "ep-1".into(),
            )))
            .unwrap();
        arena
            .insert(Node::Task(Task::new("tk-1".into(), "Form".into(), "us-1".into())))
            .unwrap();
        arena
            .insert(Node::Task(Task::new(
                "tk-2".into(),
                "Validate".into(),
                "us-1".into(),
            )))
            .unwrap();
        arena
    }

    #[test]
    fn test_insert_and_locate() {
        let mut arena = Arena::new();
        arena
            .insert(Node::Product(Product::new("pd-1".into(), "P1".into())))
            .unwrap();
        arena
            .insert(Node::Feature(Feature::new(
                "ft-1".into(),
                "F1".into(),
                "pd-1".into(),
            )))
            .unwrap();

        let tree = arena.product_tree("pd-1").unwrap();
        assert_eq!(tree.features.len(), 1);
        assert_eq!(tree.features[0].feature.name, "F1");
    }

    #[test]
    fn test_insert_parent_not_found() {
        let mut arena = Arena::new();
        let err = arena
            .insert(Node::Feature(Feature::new(
                "ft-1".into(),
                "F1".into(),
                "pd-missing".into(),
            )))
            .unwrap_err();
        assert!(matches!(err, Error::ParentNotFound(_)));
        assert!(arena.is_empty());
    }

    #[test]
    fn test_insert_duplicate_id_rejected() {
        let mut arena = arena_with_chain();
        let err = arena
            .insert(Node::Product(Product::new("pd-1".into(), "Again".into())))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_replace_preserves_children_and_backref() {
        let mut arena = arena_with_chain();
        let mut story = UserStory::new("us-1".into(), "Renamed".into(), "ep-wrong".into());
        story.priority = 9;
        arena.replace(Node::UserStory(story)).unwrap();

        let story = arena.story("us-1").unwrap();
        assert_eq!(story.title, "Renamed");
        assert_eq!(story.priority, 9);
        // Back-reference forced to actual containment
        assert_eq!(story.epic_id, "ep-1");
        // Children untouched
        assert_eq!(arena.child_ids(NodeKind::Task, Some("us-1")).len(), 2);
    }

    #[test]
    fn test_replace_missing_node() {
        let mut arena = arena_with_chain();
        let err = arena
            .replace(Node::Epic(Epic::new(
                "ep-missing".into(),
                "X".into(),
                "ft-1".into(),
            )))
            .unwrap_err();
        assert!(matches!(err, Error::NodeNotFound(_)));
    }

    #[test]
    fn test_remove_cascades_whole_subtree() {
        let mut arena = arena_with_chain();
        let before = arena.len();
        let removed = arena.remove(NodeKind::Feature, "ft-1");

        // feature + epic + story + two tasks
        assert_eq!(removed.len(), 5);
        assert_eq!(arena.len(), before - 5);
        assert!(arena.feature("ft-1").is_none());
        assert!(arena.epic("ep-1").is_none());
        assert!(arena.story("us-1").is_none());
        assert!(arena.task("tk-1").is_none());
        assert!(arena.task("tk-2").is_none());
        // The product is unaffected
        assert!(arena.product("pd-1").is_some());
        assert!(arena.child_ids(NodeKind::Feature, Some("pd-1")).is_empty());
    }

    #[test]
    fn test_remove_absent_is_idempotent() {
        let mut arena = arena_with_chain();
        let snapshot = arena.clone();
        let removed = arena.remove(NodeKind::Task, "tk-nope");
        assert!(removed.is_empty());
        assert_eq!(arena, snapshot);
    }

    #[test]
    fn test_remove_twice() {
        let mut arena = arena_with_chain();
        assert_eq!(arena.remove(NodeKind::Task, "tk-1").len(), 1);
        assert!(arena.remove(NodeKind::Task, "tk-1").is_empty());
    }

    #[test]
    fn test_reorder_moves_before_target() {
        let mut arena = arena_with_chain();
        arena
            .insert(Node::Task(Task::new("tk-3".into(), "Style".into(), "us-1".into())))
            .unwrap();
        // [tk-1, tk-2, tk-3] -> drag tk-3 before tk-1
        assert!(arena.reorder(NodeKind::Task, "tk-3", "tk-1"));
        assert_eq!(
            arena.child_ids(NodeKind::Task, Some("us-1")),
            ["tk-3".to_string(), "tk-1".to_string(), "tk-2".to_string()]
        );
    }

    #[test]
    fn test_reorder_round_trip() {
        let mut arena = arena_with_chain();
        let original = arena.child_ids(NodeKind::Task, Some("us-1")).to_vec();
        assert!(arena.reorder(NodeKind::Task, "tk-1", "tk-2"));
        assert!(arena.reorder(NodeKind::Task, "tk-2", "tk-1"));
        assert_eq!(arena.child_ids(NodeKind::Task, Some("us-1")), original);
    }

    #[test]
    fn test_reorder_self_target_noop() {
        let mut arena = arena_with_chain();
        let snapshot = arena.clone();
        assert!(!arena.reorder(NodeKind::Task, "tk-1", "tk-1"));
        assert_eq!(arena, snapshot);
    }

    #[test]
    fn test_reorder_cross_kind_noop() {
        let mut arena = arena_with_chain();
        let snapshot = arena.clone();
        // us-1 is not an epic id, so nothing may move
        assert!(!arena.reorder(NodeKind::Epic, "ep-1", "us-1"));
        assert_eq!(arena, snapshot);
    }

    #[test]
    fn test_reorder_cross_parent_noop() {
        let mut arena = arena_with_chain();
        arena
            .insert(Node::UserStory(UserStory::new(
                "us-2".into(),
                "Other".into(),
                "ep-1".into(),
            )))
            .unwrap();
        arena
            .insert(Node::Task(Task::new("tk-9".into(), "Far".into(), "us-2".into())))
            .unwrap();
        let snapshot = arena.clone();
        assert!(!arena.reorder(NodeKind::Task, "tk-1", "tk-9"));
        assert_eq!(arena, snapshot);
    }

    #[test]
    fn test_find_by_id_alone() {
        let arena = arena_with_chain();
        let node = arena.find_by_id("us-1").unwrap();
        assert_eq!(node.kind(), NodeKind::UserStory);
        assert_eq!(node.title(), "Sign in");
        assert!(arena.find_by_id("zz-0").is_none());
    }

    #[test]
    fn test_tree_round_trip() {
        let arena = arena_with_chain();
        let rebuilt = Arena::from_tree(arena.tree());
        assert_eq!(rebuilt, arena);
    }

    #[test]
    fn test_from_tree_forces_backrefs() {
        let mut tree = arena_with_chain().tree();
        // Corrupt a back-reference in the nested form
        tree[0].features[0].epics[0].epic.feature_id = "ft-bogus".into();
        let arena = Arena::from_tree(tree);
        assert_eq!(arena.epic("ep-1").unwrap().feature_id, "ft-1");
    }

    #[test]
    fn test_orders_follow_hierarchy() {
        let arena = arena_with_chain();
        let tasks: Vec<&str> = arena.tasks_in_order().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(tasks, ["tk-1", "tk-2"]);
        let stories: Vec<&str> = arena
            .stories_in_order()
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(stories, ["us-1"]);
    }
}
