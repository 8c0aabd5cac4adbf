//! In-memory backlog state.
//!
//! `BacklogState` is the single snapshot every command reads and the pure
//! reducer mutates: the normalized node arena, the user and sprint lists,
//! plus the navigation state (hierarchical selection and active view).

pub mod arena;
pub mod cascade;
pub mod reducer;

pub use arena::Arena;
pub use reducer::{reduce, Action, Effect};

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{Sprint, User};
use crate::{Error, Result};

/// Which view the UI is showing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewMode {
    #[default]
    Backlog,
    Kanban,
    Hierarchy,
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ViewMode::Backlog => "backlog",
            ViewMode::Kanban => "kanban",
            ViewMode::Hierarchy => "hierarchy",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for ViewMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "backlog" => Ok(ViewMode::Backlog),
            "kanban" => Ok(ViewMode::Kanban),
            "hierarchy" => Ok(ViewMode::Hierarchy),
            _ => Err(Error::InvalidInput(format!("Unknown view: {}", s))),
        }
    }
}

/// The four selectable levels of the hierarchy.
///
/// Tasks are never selected; they are leaves of the detail view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectLevel {
    Product,
    Feature,
    Epic,
    UserStory,
}

impl SelectLevel {
    /// All levels, outermost first.
    pub fn all() -> &'static [SelectLevel] {
        &[
            SelectLevel::Product,
            SelectLevel::Feature,
            SelectLevel::Epic,
            SelectLevel::UserStory,
        ]
    }

    /// The node kind selected at this level.
    pub fn node_kind(&self) -> crate::models::NodeKind {
        match self {
            SelectLevel::Product => crate::models::NodeKind::Product,
            SelectLevel::Feature => crate::models::NodeKind::Feature,
            SelectLevel::Epic => crate::models::NodeKind::Epic,
            SelectLevel::UserStory => crate::models::NodeKind::UserStory,
        }
    }
}

impl fmt::Display for SelectLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SelectLevel::Product => "product",
            SelectLevel::Feature => "feature",
            SelectLevel::Epic => "epic",
            SelectLevel::UserStory => "user-story",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for SelectLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "product" => Ok(SelectLevel::Product),
            "feature" => Ok(SelectLevel::Feature),
            "epic" => Ok(SelectLevel::Epic),
            "user-story" | "story" => Ok(SelectLevel::UserStory),
            _ => Err(Error::InvalidInput(format!("Not a selectable level: {}", s))),
        }
    }
}

/// Hierarchical UI selection.
///
/// A deeper selection is meaningless without its ancestor chain, so every
/// mutation goes through [`Selection::select`], which clears all deeper
/// levels, or [`Selection::clear_level`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub product: Option<String>,
    pub feature: Option<String>,
    pub epic: Option<String>,
    pub user_story: Option<String>,
}

impl Selection {
    /// Selected id at a level.
    pub fn get(&self, level: SelectLevel) -> Option<&str> {
        match level {
            SelectLevel::Product => self.product.as_deref(),
            SelectLevel::Feature => self.feature.as_deref(),
            SelectLevel::Epic => self.epic.as_deref(),
            SelectLevel::UserStory => self.user_story.as_deref(),
        }
    }

    /// Set (or clear, with `None`) the selection at a level, cascading a
    /// clear through every deeper level.
    pub fn select(&mut self, level: SelectLevel, id: Option<String>) {
        match level {
            SelectLevel::Product => {
                self.product = id;
                self.feature = None;
                self.epic = None;
                self.user_story = None;
            }
            SelectLevel::Feature => {
                self.feature = id;
                self.epic = None;
                self.user_story = None;
            }
            SelectLevel::Epic => {
                self.epic = id;
                self.user_story = None;
            }
            SelectLevel::UserStory => {
                self.user_story = id;
            }
        }
    }

    /// Clear a level and everything deeper.
    pub fn clear_level(&mut self, level: SelectLevel) {
        self.select(level, None);
    }
}

/// Selection + view, persisted between CLI invocations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UiState {
    #[serde(default)]
    pub selection: Selection,
    #[serde(default)]
    pub view: ViewMode,
}

/// The full in-memory backlog snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BacklogState {
    pub arena: Arena,
    pub users: Vec<User>,
    pub sprints: Vec<Sprint>,
    pub selection: Selection,
    pub view: ViewMode,
}

impl BacklogState {
    /// Create an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// The sprint flagged current, if any.
    pub fn current_sprint(&self) -> Option<&Sprint> {
        self.sprints.iter().find(|s| s.is_current)
    }

    /// Look up a user by id.
    pub fn user(&self, id: &str) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    /// Look up a sprint by id.
    pub fn sprint(&self, id: &str) -> Option<&Sprint> {
        self.sprints.iter().find(|s| s.id == id)
    }
}
