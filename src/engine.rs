//! Engine driver.
//!
//! The reducer is pure; this is the impure shell around it. The engine owns
//! the in-memory state plus an optional store, loads state at startup
//! (falling back to sample data when the store cannot serve it), and after
//! every successful transition mirrors the returned effects outward. Store
//! failures are logged and swallowed: the in-memory mutation always stands
//! and is never rolled back.

use chrono::Utc;
use tracing::warn;

use crate::seed;
use crate::state::{reduce, Action, BacklogState, Effect, UiState};
use crate::store::RemoteStore;
use crate::Result;

/// The state engine plus its write-through store.
pub struct Engine {
    pub state: BacklogState,
    store: Option<Box<dyn RemoteStore>>,
}

impl Engine {
    /// Create an engine with no store; mutations live only in memory.
    pub fn in_memory() -> Self {
        Self {
            state: BacklogState::new(),
            store: None,
        }
    }

    /// Create an engine backed by a store and load state from it.
    ///
    /// When any fetch fails the engine falls back to the sample dataset so
    /// the core stays usable with the store entirely unavailable.
    pub fn load(store: Box<dyn RemoteStore>) -> Self {
        let mut engine = Self {
            state: BacklogState::new(),
            store: Some(store),
        };

        let fetched = engine.fetch_all();
        match fetched {
            Ok(()) => {}
            Err(e) => {
                warn!(error = %e, "store unavailable, falling back to sample data");
                engine.install_sample_data();
            }
        }

        if let Some(store) = &engine.store {
            match store.load_ui_state() {
                Ok(Some(ui)) => {
                    engine.state.selection = ui.selection;
                    engine.state.view = ui.view;
                    // Drop selections that no longer resolve
                    let tree = engine.state.arena.tree();
                    let _ = reduce(&mut engine.state, Action::SetTree(tree), Utc::now());
                }
                Ok(None) => {}
                Err(e) => warn!(error = %e, "could not restore UI state"),
            }
        }

        engine
    }

    fn fetch_all(&mut self) -> Result<()> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        let tree = store.fetch_tree()?;
        let users = store.fetch_users()?;
        let sprints = store.fetch_sprints()?;

        let now = Utc::now();
        reduce(&mut self.state, Action::SetTree(tree), now)?;
        reduce(&mut self.state, Action::SetUsers(users), now)?;
        reduce(&mut self.state, Action::SetSprints(sprints), now)?;
        Ok(())
    }

    /// Install the sample dataset into the in-memory state only.
    pub fn install_sample_data(&mut self) {
        let data = seed::sample_data();
        let now = Utc::now();
        // These cannot fail on a fresh dataset
        let _ = reduce(&mut self.state, Action::SetTree(data.products), now);
        let _ = reduce(&mut self.state, Action::SetUsers(data.users), now);
        let _ = reduce(&mut self.state, Action::SetSprints(data.sprints), now);
    }

    /// Dispatch one command: run the pure reducer, then mirror each effect
    /// to the store best-effort.
    pub fn dispatch(&mut self, action: Action) -> Result<Vec<Effect>> {
        let effects = reduce(&mut self.state, action, Utc::now())?;
        if let Some(store) = &mut self.store {
            for effect in &effects {
                if let Err(e) = apply_effect(store.as_mut(), &self.state, effect) {
                    warn!(error = %e, ?effect, "remote sync failed; in-memory state stands");
                }
            }
        }
        Ok(effects)
    }

    /// Persist selection and view for the next invocation. Best-effort.
    pub fn save_ui_state(&mut self) {
        let ui = UiState {
            selection: self.state.selection.clone(),
            view: self.state.view,
        };
        if let Some(store) = &mut self.store {
            if let Err(e) = store.save_ui_state(&ui) {
                warn!(error = %e, "could not persist UI state");
            }
        }
    }

    /// Store location and type for display, if a store is attached.
    pub fn store_info(&self) -> Option<(String, &'static str)> {
        self.store
            .as_ref()
            .map(|s| (s.location(), s.store_type()))
    }

    /// Write the current in-memory dataset through to the store (used by
    /// `system seed`).
    pub fn write_through_all(&mut self) -> Result<()> {
        let Some(store) = &mut self.store else {
            return Ok(());
        };
        for user in &self.state.users {
            store.create_user(user)?;
        }
        for sprint in &self.state.sprints {
            store.create_sprint(sprint)?;
        }
        for tree in self.state.arena.tree() {
            store.create_node(&crate::models::Node::Product(tree.product.clone()))?;
            for feature in &tree.features {
                store.create_node(&crate::models::Node::Feature(feature.feature.clone()))?;
                for epic in &feature.epics {
                    store.create_node(&crate::models::Node::Epic(epic.epic.clone()))?;
                    for story in &epic.user_stories {
                        store.create_node(&crate::models::Node::UserStory(story.story.clone()))?;
                        for task in &story.tasks {
                            store.create_node(&crate::models::Node::Task(task.clone()))?;
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

/// Mirror one effect to the store.
fn apply_effect(
    store: &mut dyn RemoteStore,
    state: &BacklogState,
    effect: &Effect,
) -> Result<()> {
    match effect {
        Effect::CreateNode { kind, id } => {
            if let Some(node) = state.arena.node(*kind, id) {
                store.create_node(&node)?;
            }
        }
        Effect::UpdateNode { kind, id } => {
            if let Some(node) = state.arena.node(*kind, id) {
                store.update_node(&node)?;
            }
        }
        Effect::DeleteNode { kind, id } => {
            store.delete_node(*kind, id)?;
        }
        Effect::PersistOrder { kind, parent } => {
            let siblings = state.arena.child_ids(*kind, parent.as_deref()).to_vec();
            for (position, id) in siblings.iter().enumerate() {
                store.update_field(
                    id,
                    *kind,
                    &serde_json::json!({ "position": position }),
                )?;
            }
        }
        Effect::SetSprintStatus { kind, id, status } => {
            store.set_sprint_status(id, *kind, *status)?;
        }
        Effect::AssignSprint { kind, id, sprint } => {
            store.assign_to_sprint(id, *kind, sprint.as_deref())?;
        }
        Effect::SetCurrentSprint { id } => {
            store.set_current_sprint(id)?;
        }
        Effect::CreateUser { id } => {
            if let Some(user) = state.user(id) {
                store.create_user(user)?;
            }
        }
        Effect::UpdateUser { id } => {
            if let Some(user) = state.user(id) {
                store.update_user(user)?;
            }
        }
        Effect::DeleteUser { id } => {
            store.delete_user(id)?;
        }
        Effect::CreateSprint { id } => {
            if let Some(sprint) = state.sprint(id) {
                store.create_sprint(sprint)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Node, Product};
    use crate::store::SqliteStore;
    use tempfile::TempDir;

    fn sqlite_engine() -> (TempDir, Engine) {
        let dir = TempDir::new().unwrap();
        let store = SqliteStore::open_at(dir.path().to_path_buf()).unwrap();
        (dir, Engine::load(Box::new(store)))
    }

    #[test]
    fn test_in_memory_engine_dispatches() {
        let mut engine = Engine::in_memory();
        engine
            .dispatch(Action::AddNode(Node::Product(Product::new(
                "pd-1".into(),
                "Shop".into(),
            ))))
            .unwrap();
        assert_eq!(engine.state.arena.len(), 1);
    }

    #[test]
    fn test_dispatch_writes_through_and_reloads() {
        let dir = TempDir::new().unwrap();
        {
            let store = SqliteStore::open_at(dir.path().to_path_buf()).unwrap();
            let mut engine = Engine::load(Box::new(store));
            engine
                .dispatch(Action::AddNode(Node::Product(Product::new(
                    "pd-1".into(),
                    "Shop".into(),
                ))))
                .unwrap();
        }
        // A second engine over the same store sees the product
        let store = SqliteStore::open_at(dir.path().to_path_buf()).unwrap();
        let engine = Engine::load(Box::new(store));
        assert!(engine.state.arena.product("pd-1").is_some());
    }

    #[test]
    fn test_delete_is_written_through() {
        let (dir, mut engine) = sqlite_engine();
        engine
            .dispatch(Action::AddNode(Node::Product(Product::new(
                "pd-1".into(),
                "Shop".into(),
            ))))
            .unwrap();
        engine
            .dispatch(Action::DeleteNode {
                kind: crate::models::NodeKind::Product,
                id: "pd-1".into(),
            })
            .unwrap();

        let store = SqliteStore::open_at(dir.path().to_path_buf()).unwrap();
        let engine = Engine::load(Box::new(store));
        assert!(engine.state.arena.is_empty());
    }

    #[test]
    fn test_ui_state_survives_reload() {
        let dir = TempDir::new().unwrap();
        {
            let store = SqliteStore::open_at(dir.path().to_path_buf()).unwrap();
            let mut engine = Engine::load(Box::new(store));
            engine
                .dispatch(Action::AddNode(Node::Product(Product::new(
                    "pd-1".into(),
                    "Shop".into(),
                ))))
                .unwrap();
            engine
                .dispatch(Action::Select {
                    level: crate::state::SelectLevel::Product,
                    id: Some("pd-1".into()),
                })
                .unwrap();
            engine.save_ui_state();
        }
        let store = SqliteStore::open_at(dir.path().to_path_buf()).unwrap();
        let engine = Engine::load(Box::new(store));
        assert_eq!(engine.state.selection.product.as_deref(), Some("pd-1"));
    }

    #[test]
    fn test_seed_write_through() {
        let (dir, mut engine) = sqlite_engine();
        engine.install_sample_data();
        engine.write_through_all().unwrap();

        let store = SqliteStore::open_at(dir.path().to_path_buf()).unwrap();
        let engine = Engine::load(Box::new(store));
        assert_eq!(engine.state.users.len(), 5);
        assert_eq!(engine.state.sprints.len(), 1);
        assert_eq!(engine.state.arena.len(), 6);
    }
}
