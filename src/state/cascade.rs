//! Cascade policies.
//!
//! Three rules ripple through the state beyond the directly-targeted node:
//! - deleting a node resets any UI selection that pointed into its subtree
//! - deleting a user clears every `assigned_user_id` referencing it,
//!   tree-wide (a full rewrite pass; no reverse index is kept)
//! - selecting a node clears all deeper selections (implemented on
//!   [`Selection`](super::Selection) itself and exercised by the reducer)

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use super::{Arena, SelectLevel, Selection};
use crate::models::NodeKind;

/// Clear every selection level whose id fell inside a removed subtree,
/// together with all levels deeper than the shallowest hit.
pub fn reset_selection(selection: &mut Selection, removed: &HashSet<String>) {
    for level in SelectLevel::all() {
        if selection
            .get(*level)
            .is_some_and(|id| removed.contains(id))
        {
            selection.clear_level(*level);
            return;
        }
    }
}

/// Clear `assigned_user_id == user_id` on every feature, epic, story, and
/// task in the arena. Returns the (kind, id) of each rewritten node so the
/// driver can write the changes through.
pub fn unassign_user(
    arena: &mut Arena,
    user_id: &str,
    now: DateTime<Utc>,
) -> Vec<(NodeKind, String)> {
    let mut touched = Vec::new();

    for feature in arena.features_mut() {
        if feature.assigned_user_id.as_deref() == Some(user_id) {
            feature.assigned_user_id = None;
            feature.updated_at = now;
            touched.push((NodeKind::Feature, feature.id.clone()));
        }
    }
    for epic in arena.epics_mut() {
        if epic.assigned_user_id.as_deref() == Some(user_id) {
            epic.assigned_user_id = None;
            epic.updated_at = now;
            touched.push((NodeKind::Epic, epic.id.clone()));
        }
    }
    for story in arena.stories_mut() {
        if story.assigned_user_id.as_deref() == Some(user_id) {
            story.assigned_user_id = None;
            story.updated_at = now;
            touched.push((NodeKind::UserStory, story.id.clone()));
        }
    }
    for task in arena.tasks_mut() {
        if task.assigned_user_id.as_deref() == Some(user_id) {
            task.assigned_user_id = None;
            task.updated_at = now;
            touched.push((NodeKind::Task, task.id.clone()));
        }
    }

    touched
}
