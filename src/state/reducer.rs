//! Pure state transitions.
//!
//! `reduce` applies one [`Action`] to the state and returns the list of
//! [`Effect`]s the store driver should mirror outward. It performs no I/O
//! and takes the clock as an argument, so every transition is deterministic
//! and testable in isolation. Validation happens before any mutation: a
//! returned error means the state was not touched.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use super::{cascade, Arena, BacklogState, SelectLevel, ViewMode};
use crate::models::tree::ProductTree;
use crate::models::{ItemKind, Node, NodeKind, Sprint, SprintStatus, User};
use crate::{Error, Result};

/// A command accepted by the state engine.
#[derive(Debug, Clone)]
pub enum Action {
    /// Replace the whole tree (initial load).
    SetTree(Vec<ProductTree>),
    /// Replace the user list (initial load).
    SetUsers(Vec<User>),
    /// Replace the sprint list (initial load).
    SetSprints(Vec<Sprint>),
    /// Insert a freshly-created node under the parent named by its
    /// back-reference.
    AddNode(Node),
    /// Replace a node wholly; children and creation time are preserved.
    UpdateNode(Node),
    /// Delete a node and its subtree. Idempotent.
    DeleteNode { kind: NodeKind, id: String },
    /// Drag-and-drop sibling reorder: put `dragged` before `target`.
    ReorderSiblings {
        kind: NodeKind,
        dragged: String,
        target: String,
    },
    /// Select (or clear) one hierarchy level.
    Select {
        level: SelectLevel,
        id: Option<String>,
    },
    /// Switch the active view.
    SetView(ViewMode),
    /// Move a story/task to a kanban column.
    MoveToColumn {
        kind: ItemKind,
        id: String,
        status: SprintStatus,
    },
    /// Attach a story/task to a sprint, or detach with `None`.
    AssignToSprint {
        kind: ItemKind,
        id: String,
        sprint: Option<String>,
    },
    /// Make one sprint current, clearing the flag everywhere else.
    SetCurrentSprint { id: String },
    AddUser(User),
    UpdateUser(User),
    /// Delete a user and clear every assignment referencing it. Idempotent.
    DeleteUser { id: String },
    AddSprint(Sprint),
}

/// A store write the driver should attempt after a successful transition.
///
/// Effects carry ids, not payloads; the driver reads the post-transition
/// state to build the actual write.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    CreateNode { kind: NodeKind, id: String },
    UpdateNode { kind: NodeKind, id: String },
    DeleteNode { kind: NodeKind, id: String },
    /// Re-write sibling positions under one parent (`None` = product root).
    PersistOrder {
        kind: NodeKind,
        parent: Option<String>,
    },
    SetSprintStatus {
        kind: ItemKind,
        id: String,
        status: SprintStatus,
    },
    AssignSprint {
        kind: ItemKind,
        id: String,
        sprint: Option<String>,
    },
    SetCurrentSprint { id: String },
    CreateUser { id: String },
    UpdateUser { id: String },
    DeleteUser { id: String },
    CreateSprint { id: String },
}

/// Apply one action, returning the effects to mirror outward.
pub fn reduce(
    state: &mut BacklogState,
    action: Action,
    now: DateTime<Utc>,
) -> Result<Vec<Effect>> {
    match action {
        Action::SetTree(trees) => {
            state.arena = Arena::from_tree(trees);
            prune_selection(state);
            Ok(Vec::new())
        }

        Action::SetUsers(users) => {
            state.users = users;
            Ok(Vec::new())
        }

        Action::SetSprints(sprints) => {
            state.sprints = sprints;
            Ok(Vec::new())
        }

        Action::AddNode(node) => {
            let kind = node.kind();
            let id = node.id().to_string();
            state.arena.insert(node)?;
            Ok(vec![Effect::CreateNode { kind, id }])
        }

        Action::UpdateNode(mut node) => {
            let kind = node.kind();
            let id = node.id().to_string();
            node.set_updated_at(now);
            state.arena.replace(node)?;
            Ok(vec![Effect::UpdateNode { kind, id }])
        }

        Action::DeleteNode { kind, id } => {
            let removed = state.arena.remove(kind, &id);
            if removed.is_empty() {
                // Already absent: success, nothing to do
                return Ok(Vec::new());
            }
            let removed_ids: HashSet<String> =
                removed.iter().map(|(_, id)| id.clone()).collect();
            cascade::reset_selection(&mut state.selection, &removed_ids);
            Ok(removed
                .into_iter()
                .map(|(kind, id)| Effect::DeleteNode { kind, id })
                .collect())
        }

        Action::ReorderSiblings {
            kind,
            dragged,
            target,
        } => {
            if !state.arena.reorder(kind, &dragged, &target) {
                return Ok(Vec::new());
            }
            let parent = state.arena.parent_of(kind, &dragged).unwrap_or(None);
            Ok(vec![Effect::PersistOrder { kind, parent }])
        }

        Action::Select { level, id } => {
            if let Some(id) = &id {
                if !state.arena.contains(level.node_kind(), id) {
                    return Err(Error::NodeNotFound(format!("{} {}", level, id)));
                }
            }
            state.selection.select(level, id);
            Ok(Vec::new())
        }

        Action::SetView(view) => {
            state.view = view;
            Ok(Vec::new())
        }

        Action::MoveToColumn { kind, id, status } => {
            match kind {
                ItemKind::UserStory => {
                    let story = state
                        .arena
                        .story_mut(&id)
                        .ok_or_else(|| Error::NodeNotFound(format!("user-story {}", id)))?;
                    story.sprint_status = status;
                    if status == SprintStatus::Done {
                        story.completed_at = Some(now);
                    }
                    story.updated_at = now;
                }
                ItemKind::Task => {
                    let task = state
                        .arena
                        .task_mut(&id)
                        .ok_or_else(|| Error::NodeNotFound(format!("task {}", id)))?;
                    task.sprint_status = status;
                    if status == SprintStatus::Done {
                        task.completed_at = Some(now);
                    }
                    task.updated_at = now;
                }
            }
            Ok(vec![Effect::SetSprintStatus { kind, id, status }])
        }

        Action::AssignToSprint { kind, id, sprint } => {
            if let Some(sprint_id) = &sprint {
                if state.sprint(sprint_id).is_none() {
                    return Err(Error::NodeNotFound(format!("sprint {}", sprint_id)));
                }
            }
            match kind {
                ItemKind::UserStory => {
                    let story = state
                        .arena
                        .story_mut(&id)
                        .ok_or_else(|| Error::NodeNotFound(format!("user-story {}", id)))?;
                    story.sprint_id = sprint.clone();
                    story.updated_at = now;
                }
                ItemKind::Task => {
                    let task = state
                        .arena
                        .task_mut(&id)
                        .ok_or_else(|| Error::NodeNotFound(format!("task {}", id)))?;
                    task.sprint_id = sprint.clone();
                    task.updated_at = now;
                }
            }
            Ok(vec![Effect::AssignSprint { kind, id, sprint }])
        }

        Action::SetCurrentSprint { id } => {
            if state.sprint(&id).is_none() {
                return Err(Error::NodeNotFound(format!("sprint {}", id)));
            }
            // Clear everywhere first, then set: at most one sprint is current
            for sprint in &mut state.sprints {
                sprint.is_current = sprint.id == id;
            }
            Ok(vec![Effect::SetCurrentSprint { id }])
        }

        Action::AddUser(user) => {
            if state.user(&user.id).is_some() {
                return Err(Error::InvalidInput(format!("Duplicate user id: {}", user.id)));
            }
            let id = user.id.clone();
            state.users.push(user);
            Ok(vec![Effect::CreateUser { id }])
        }

        Action::UpdateUser(user) => {
            let slot = state
                .users
                .iter_mut()
                .find(|u| u.id == user.id)
                .ok_or_else(|| Error::NodeNotFound(format!("user {}", user.id)))?;
            let id = user.id.clone();
            *slot = user;
            Ok(vec![Effect::UpdateUser { id }])
        }

        Action::DeleteUser { id } => {
            let existed = state.users.iter().any(|u| u.id == id);
            if !existed {
                return Ok(Vec::new());
            }
            state.users.retain(|u| u.id != id);
            let touched = cascade::unassign_user(&mut state.arena, &id, now);
            let mut effects = vec![Effect::DeleteUser { id }];
            effects.extend(
                touched
                    .into_iter()
                    .map(|(kind, id)| Effect::UpdateNode { kind, id }),
            );
            Ok(effects)
        }

        Action::AddSprint(sprint) => {
            if state.sprint(&sprint.id).is_some() {
                return Err(Error::InvalidInput(format!(
                    "Duplicate sprint id: {}",
                    sprint.id
                )));
            }
            let id = sprint.id.clone();
            state.sprints.push(sprint);
            Ok(vec![Effect::CreateSprint { id }])
        }
    }
}

/// After a tree swap, drop selections that no longer resolve.
fn prune_selection(state: &mut BacklogState) {
    for level in SelectLevel::all() {
        let stale = state
            .selection
            .get(*level)
            .is_some_and(|id| !state.arena.contains(level.node_kind(), id));
        if stale {
            state.selection.clear_level(*level);
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Epic, Feature, Product, Task, UserStory};

    fn seeded_state() -> BacklogState {
        let mut state = BacklogState::new();
        let now = Utc::now();
        for action in [
            Action::AddNode(Node::Product(Product::new("pd-1".into(), "Shop".into()))),
            Action::AddNode(Node::Feature(Feature::new(
                "ft-1".into(),
                "Auth".into(),
                "pd-1".into(),
            ))),
            Action::AddNode(Node::Epic(Epic::new(
                "ep-1".into(),
                "Login".into(),
                "ft-1".into(),
            ))),
            Action::AddNode(Node::UserStory(UserStory::new(
                "us-1".into(),
                "Sign in".into(),
                "ep-1".into(),
            ))),
            Action::AddNode(Node::Task(Task::new(
                "tk-1".into(),
                "Form".into(),
                "us-1".into(),
            ))),
            Action::AddNode(Node::Task(Task::new(
                "tk-2".into(),
                "Validate".into(),
                "us-1".into(),
            ))),
        ] {
            reduce(&mut state, action, now).unwrap();
        }
        state
    }

    #[test]
    fn test_add_node_emits_create_effect() {
        let mut state = BacklogState::new();
        let effects = reduce(
            &mut state,
            Action::AddNode(Node::Product(Product::new("pd-1".into(), "P1".into()))),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(
            effects,
            vec![Effect::CreateNode {
                kind: NodeKind::Product,
                id: "pd-1".into()
            }]
        );
    }

    #[test]
    fn test_add_node_parent_not_found() {
        let mut state = BacklogState::new();
        let err = reduce(
            &mut state,
            Action::AddNode(Node::Epic(Epic::new(
                "ep-1".into(),
                "Orphan".into(),
                "ft-none".into(),
            ))),
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::ParentNotFound(_)));
        assert!(state.arena.is_empty());
    }

    #[test]
    fn test_delete_missing_is_success_and_silent() {
        let mut state = seeded_state();
        let snapshot = state.clone();
        let effects = reduce(
            &mut state,
            Action::DeleteNode {
                kind: NodeKind::Epic,
                id: "ep-ghost".into(),
            },
            Utc::now(),
        )
        .unwrap();
        assert!(effects.is_empty());
        assert_eq!(state, snapshot);
    }

    #[test]
    fn test_delete_cascades_and_resets_selection() {
        let mut state = seeded_state();
        state.selection.select(SelectLevel::Product, Some("pd-1".into()));
        state.selection.select(SelectLevel::Feature, Some("ft-1".into()));
        state.selection.select(SelectLevel::Epic, Some("ep-1".into()));
        state
            .selection
            .select(SelectLevel::UserStory, Some("us-1".into()));

        let effects = reduce(
            &mut state,
            Action::DeleteNode {
                kind: NodeKind::Epic,
                id: "ep-1".into(),
            },
            Utc::now(),
        )
        .unwrap();

        // epic + story + two tasks
        assert_eq!(effects.len(), 4);
        assert!(state.arena.epic("ep-1").is_none());
        assert!(state.arena.story("us-1").is_none());
        assert!(state.arena.task("tk-1").is_none());
        // Selection cleared from the deleted epic downward
        assert_eq!(state.selection.feature.as_deref(), Some("ft-1"));
        assert_eq!(state.selection.epic, None);
        assert_eq!(state.selection.user_story, None);
    }

    #[test]
    fn test_update_node_preserves_children() {
        let mut state = seeded_state();
        let mut story = UserStory::new("us-1".into(), "Renamed".into(), "ep-1".into());
        story.story_points = Some(8);
        reduce(&mut state, Action::UpdateNode(Node::UserStory(story)), Utc::now()).unwrap();

        assert_eq!(state.arena.story("us-1").unwrap().title, "Renamed");
        assert_eq!(
            state.arena.child_ids(NodeKind::Task, Some("us-1")).len(),
            2
        );
    }

    #[test]
    fn test_update_missing_node_errors() {
        let mut state = seeded_state();
        let err = reduce(
            &mut state,
            Action::UpdateNode(Node::Task(Task::new(
                "tk-ghost".into(),
                "X".into(),
                "us-1".into(),
            ))),
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::NodeNotFound(_)));
    }

    #[test]
    fn test_reorder_emits_persist_order() {
        let mut state = seeded_state();
        let effects = reduce(
            &mut state,
            Action::ReorderSiblings {
                kind: NodeKind::Task,
                dragged: "tk-2".into(),
                target: "tk-1".into(),
            },
            Utc::now(),
        )
        .unwrap();
        assert_eq!(
            effects,
            vec![Effect::PersistOrder {
                kind: NodeKind::Task,
                parent: Some("us-1".into())
            }]
        );
        assert_eq!(
            state.arena.child_ids(NodeKind::Task, Some("us-1")),
            ["tk-2".to_string(), "tk-1".to_string()]
        );
    }

    #[test]
    fn test_reorder_noop_emits_nothing() {
        let mut state = seeded_state();
        let effects = reduce(
            &mut state,
            Action::ReorderSiblings {
                kind: NodeKind::Task,
                dragged: "tk-1".into(),
                target: "tk-1".into(),
            },
            Utc::now(),
        )
        .unwrap();
        assert!(effects.is_empty());
    }

    #[test]
    fn test_select_cascade() {
        let mut state = seeded_state();
        state.selection.select(SelectLevel::Product, Some("pd-1".into()));
        state.selection.select(SelectLevel::Feature, Some("ft-1".into()));
        state.selection.select(SelectLevel::Epic, Some("ep-1".into()));

        reduce(
            &mut state,
            Action::Select {
                level: SelectLevel::Product,
                id: Some("pd-1".into()),
            },
            Utc::now(),
        )
        .unwrap();

        assert_eq!(state.selection.product.as_deref(), Some("pd-1"));
        assert_eq!(state.selection.feature, None);
        assert_eq!(state.selection.epic, None);
        assert_eq!(state.selection.user_story, None);
    }

    #[test]
    fn test_select_unknown_id_errors() {
        let mut state = seeded_state();
        let err = reduce(
            &mut state,
            Action::Select {
                level: SelectLevel::Epic,
                id: Some("ep-ghost".into()),
            },
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::NodeNotFound(_)));
    }

    #[test]
    fn test_move_to_done_stamps_completion() {
        let mut state = seeded_state();
        let before = Utc::now();
        reduce(
            &mut state,
            Action::MoveToColumn {
                kind: ItemKind::Task,
                id: "tk-1".into(),
                status: SprintStatus::Done,
            },
            before,
        )
        .unwrap();

        let task = state.arena.task("tk-1").unwrap();
        assert_eq!(task.sprint_status, SprintStatus::Done);
        assert_eq!(task.completed_at, Some(before));

        // Moving back out leaves the stamp untouched
        reduce(
            &mut state,
            Action::MoveToColumn {
                kind: ItemKind::Task,
                id: "tk-1".into(),
                status: SprintStatus::Review,
            },
            Utc::now(),
        )
        .unwrap();
        let task = state.arena.task("tk-1").unwrap();
        assert_eq!(task.sprint_status, SprintStatus::Review);
        assert_eq!(task.completed_at, Some(before));
    }

    #[test]
    fn test_assign_to_missing_sprint_errors() {
        let mut state = seeded_state();
        let err = reduce(
            &mut state,
            Action::AssignToSprint {
                kind: ItemKind::UserStory,
                id: "us-1".into(),
                sprint: Some("sp-ghost".into()),
            },
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::NodeNotFound(_)));
        assert!(state.arena.story("us-1").unwrap().sprint_id.is_none());
    }

    #[test]
    fn test_assign_and_clear_sprint() {
        let mut state = seeded_state();
        let now = Utc::now();
        reduce(
            &mut state,
            Action::AddSprint(Sprint::new("sp-1".into(), "S1".into(), now, now)),
            now,
        )
        .unwrap();

        reduce(
            &mut state,
            Action::AssignToSprint {
                kind: ItemKind::Task,
                id: "tk-1".into(),
                sprint: Some("sp-1".into()),
            },
            now,
        )
        .unwrap();
        assert_eq!(
            state.arena.task("tk-1").unwrap().sprint_id.as_deref(),
            Some("sp-1")
        );

        reduce(
            &mut state,
            Action::AssignToSprint {
                kind: ItemKind::Task,
                id: "tk-1".into(),
                sprint: None,
            },
            now,
        )
        .unwrap();
        assert!(state.arena.task("tk-1").unwrap().sprint_id.is_none());
    }

    #[test]
    fn test_set_current_sprint_is_exclusive() {
        let mut state = BacklogState::new();
        let now = Utc::now();
        reduce(
            &mut state,
            Action::AddSprint(Sprint::new("sp-1".into(), "S1".into(), now, now)),
            now,
        )
        .unwrap();
        reduce(
            &mut state,
            Action::AddSprint(Sprint::new("sp-2".into(), "S2".into(), now, now)),
            now,
        )
        .unwrap();

        reduce(&mut state, Action::SetCurrentSprint { id: "sp-1".into() }, now).unwrap();
        reduce(&mut state, Action::SetCurrentSprint { id: "sp-2".into() }, now).unwrap();

        let current: Vec<&str> = state
            .sprints
            .iter()
            .filter(|s| s.is_current)
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(current, ["sp-2"]);
    }

    #[test]
    fn test_delete_user_clears_assignments_everywhere() {
        let mut state = seeded_state();
        let now = Utc::now();
        reduce(
            &mut state,
            Action::AddUser(User::new(
                "ur-1".into(),
                "Ada".into(),
                "ada@example.com".into(),
            )),
            now,
        )
        .unwrap();

        let mut feature = state.arena.feature("ft-1").unwrap().clone();
        feature.assigned_user_id = Some("ur-1".into());
        reduce(&mut state, Action::UpdateNode(Node::Feature(feature)), now).unwrap();
        let mut task = state.arena.task("tk-2").unwrap().clone();
        task.assigned_user_id = Some("ur-1".into());
        reduce(&mut state, Action::UpdateNode(Node::Task(task)), now).unwrap();

        let effects =
            reduce(&mut state, Action::DeleteUser { id: "ur-1".into() }, now).unwrap();

        assert!(state.users.is_empty());
        assert!(state.arena.feature("ft-1").unwrap().assigned_user_id.is_none());
        assert!(state.arena.task("tk-2").unwrap().assigned_user_id.is_none());
        // delete + two rewrites
        assert_eq!(effects.len(), 3);
    }

    #[test]
    fn test_delete_unknown_user_is_noop() {
        let mut state = seeded_state();
        let effects = reduce(
            &mut state,
            Action::DeleteUser {
                id: "ur-ghost".into(),
            },
            Utc::now(),
        )
        .unwrap();
        assert!(effects.is_empty());
    }

    #[test]
    fn test_set_tree_prunes_stale_selection() {
        let mut state = seeded_state();
        state.selection.select(SelectLevel::Product, Some("pd-1".into()));
        state.selection.select(SelectLevel::Feature, Some("ft-1".into()));

        // New tree keeps the product but drops the feature
        let tree = vec![ProductTree::leaf(Product::new(
            "pd-1".into(),
            "Shop".into(),
        ))];
        reduce(&mut state, Action::SetTree(tree), Utc::now()).unwrap();

        assert_eq!(state.selection.product.as_deref(), Some("pd-1"));
        assert_eq!(state.selection.feature, None);
    }
}
