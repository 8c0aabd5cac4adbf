//! Data models for Tiller entities.
//!
//! This module defines the core data structures:
//! - `Product` - Top-level product with a version string
//! - `Feature` - Functional area inside a product
//! - `Epic` - Large body of work inside a feature
//! - `UserStory` - Story with acceptance criteria and story points
//! - `Task` - Smallest unit of work, with hour estimates
//! - `User` - Team member referenced by weak `assigned_user_id` ids
//! - `Sprint` - Time-boxed iteration that stories/tasks join via `sprint_id`
//!
//! Records are flat (normalized): each tree node carries only its parent
//! back-reference. Sibling ordering lives in the state arena, never here.

pub mod tree;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Error, Result};

/// The five kinds of backlog tree nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    Product,
    Feature,
    Epic,
    UserStory,
    Task,
}

impl NodeKind {
    /// ID prefix for this kind (e.g., "ft" for features).
    pub fn prefix(&self) -> &'static str {
        match self {
            NodeKind::Product => "pd",
            NodeKind::Feature => "ft",
            NodeKind::Epic => "ep",
            NodeKind::UserStory => "us",
            NodeKind::Task => "tk",
        }
    }

    /// The kind of children this kind contains, if any.
    pub fn child_kind(&self) -> Option<NodeKind> {
        match self {
            NodeKind::Product => Some(NodeKind::Feature),
            NodeKind::Feature => Some(NodeKind::Epic),
            NodeKind::Epic => Some(NodeKind::UserStory),
            NodeKind::UserStory => Some(NodeKind::Task),
            NodeKind::Task => None,
        }
    }

    /// Get all node kinds, outermost first.
    pub fn all() -> &'static [NodeKind] {
        &[
            NodeKind::Product,
            NodeKind::Feature,
            NodeKind::Epic,
            NodeKind::UserStory,
            NodeKind::Task,
        ]
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeKind::Product => "product",
            NodeKind::Feature => "feature",
            NodeKind::Epic => "epic",
            NodeKind::UserStory => "user-story",
            NodeKind::Task => "task",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for NodeKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "product" => Ok(NodeKind::Product),
            "feature" => Ok(NodeKind::Feature),
            "epic" => Ok(NodeKind::Epic),
            "user-story" | "story" => Ok(NodeKind::UserStory),
            "task" => Ok(NodeKind::Task),
            _ => Err(Error::InvalidInput(format!("Unknown node kind: {}", s))),
        }
    }
}

/// The two kinds that participate in sprint planning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ItemKind {
    UserStory,
    Task,
}

impl ItemKind {
    /// Widen to the corresponding tree node kind.
    pub fn node_kind(&self) -> NodeKind {
        match self {
            ItemKind::UserStory => NodeKind::UserStory,
            ItemKind::Task => NodeKind::Task,
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.node_kind())
    }
}

/// Epic status in the planning workflow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EpicStatus {
    #[default]
    Planning,
    InProgress,
    Done,
}

impl std::str::FromStr for EpicStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "planning" => Ok(EpicStatus::Planning),
            "in-progress" => Ok(EpicStatus::InProgress),
            "done" => Ok(EpicStatus::Done),
            _ => Err(Error::InvalidInput(format!("Unknown epic status: {}", s))),
        }
    }
}

/// User story status in the refinement workflow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StoryStatus {
    #[default]
    Backlog,
    Ready,
    InProgress,
    Done,
}

impl std::str::FromStr for StoryStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "backlog" => Ok(StoryStatus::Backlog),
            "ready" => Ok(StoryStatus::Ready),
            "in-progress" => Ok(StoryStatus::InProgress),
            "done" => Ok(StoryStatus::Done),
            _ => Err(Error::InvalidInput(format!("Unknown story status: {}", s))),
        }
    }
}

/// Task status in the execution workflow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
}

impl std::str::FromStr for TaskStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "todo" => Ok(TaskStatus::Todo),
            "in-progress" => Ok(TaskStatus::InProgress),
            "done" => Ok(TaskStatus::Done),
            _ => Err(Error::InvalidInput(format!("Unknown task status: {}", s))),
        }
    }
}

/// Kanban column for sprint planning, shared by stories and tasks.
///
/// This is a classification label driven by drag-and-drop, not a strictly
/// ordered workflow: any column can transition to any other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SprintStatus {
    #[default]
    Backlog,
    SprintBacklog,
    InProgress,
    Review,
    Done,
}

impl SprintStatus {
    /// All columns in board display order.
    pub fn columns() -> &'static [SprintStatus] {
        &[
            SprintStatus::Backlog,
            SprintStatus::SprintBacklog,
            SprintStatus::InProgress,
            SprintStatus::Review,
            SprintStatus::Done,
        ]
    }

    /// Human-readable column title.
    pub fn title(&self) -> &'static str {
        match self {
            SprintStatus::Backlog => "Backlog",
            SprintStatus::SprintBacklog => "Sprint Backlog",
            SprintStatus::InProgress => "In Progress",
            SprintStatus::Review => "Review",
            SprintStatus::Done => "Done",
        }
    }
}

impl fmt::Display for SprintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SprintStatus::Backlog => "backlog",
            SprintStatus::SprintBacklog => "sprint-backlog",
            SprintStatus::InProgress => "in-progress",
            SprintStatus::Review => "review",
            SprintStatus::Done => "done",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for SprintStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "backlog" => Ok(SprintStatus::Backlog),
            "sprint-backlog" => Ok(SprintStatus::SprintBacklog),
            "in-progress" => Ok(SprintStatus::InProgress),
            "review" => Ok(SprintStatus::Review),
            "done" => Ok(SprintStatus::Done),
            _ => Err(Error::InvalidInput(format!("Unknown sprint column: {}", s))),
        }
    }
}

/// Sprint lifecycle phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SprintPhase {
    #[default]
    Planning,
    Active,
    Completed,
}

impl std::str::FromStr for SprintPhase {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "planning" => Ok(SprintPhase::Planning),
            "active" => Ok(SprintPhase::Active),
            "completed" => Ok(SprintPhase::Completed),
            _ => Err(Error::InvalidInput(format!("Unknown sprint phase: {}", s))),
        }
    }
}

/// Team member role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UserRole {
    ProductOwner,
    ScrumMaster,
    #[default]
    Developer,
    Designer,
    Qa,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UserRole::ProductOwner => "product-owner",
            UserRole::ScrumMaster => "scrum-master",
            UserRole::Developer => "developer",
            UserRole::Designer => "designer",
            UserRole::Qa => "qa",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for UserRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "product-owner" => Ok(UserRole::ProductOwner),
            "scrum-master" => Ok(UserRole::ScrumMaster),
            "developer" => Ok(UserRole::Developer),
            "designer" => Ok(UserRole::Designer),
            "qa" => Ok(UserRole::Qa),
            _ => Err(Error::InvalidInput(format!("Unknown role: {}", s))),
        }
    }
}

/// A top-level product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Unique identifier (e.g., "pd-a1b2c3d4")
    pub id: String,

    /// Product name
    pub name: String,

    /// Detailed description
    #[serde(default)]
    pub description: String,

    /// Version string (e.g., "1.0.0")
    #[serde(default)]
    pub version: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Create a new product with the given ID and name.
    pub fn new(id: String, name: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            name,
            description: String::new(),
            version: "1.0.0".to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// A functional area inside a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    /// Unique identifier (e.g., "ft-a1b2c3d4")
    pub id: String,

    /// Feature name
    pub name: String,

    /// Detailed description
    #[serde(default)]
    pub description: String,

    /// Priority (1-10, higher is more important)
    #[serde(default = "default_priority")]
    pub priority: u8,

    /// Containing product
    pub product_id: String,

    /// Assigned team member (weak reference, cleared on user deletion)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_user_id: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Feature {
    /// Create a new feature under the given product.
    pub fn new(id: String, name: String, product_id: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            name,
            description: String::new(),
            priority: default_priority(),
            product_id,
            assigned_user_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A large body of work inside a feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Epic {
    /// Unique identifier (e.g., "ep-a1b2c3d4")
    pub id: String,

    /// Epic title
    pub title: String,

    /// Detailed description
    #[serde(default)]
    pub description: String,

    /// Current status
    #[serde(default)]
    pub status: EpicStatus,

    /// Priority (1-10, higher is more important)
    #[serde(default = "default_priority")]
    pub priority: u8,

    /// Containing feature
    pub feature_id: String,

    /// Assigned team member (weak reference)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_user_id: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Epic {
    /// Create a new epic under the given feature.
    pub fn new(id: String, title: String, feature_id: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            title,
            description: String::new(),
            status: EpicStatus::default(),
            priority: default_priority(),
            feature_id,
            assigned_user_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A user story with acceptance criteria and story points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStory {
    /// Unique identifier (e.g., "us-a1b2c3d4")
    pub id: String,

    /// Story title
    pub title: String,

    /// Detailed description
    #[serde(default)]
    pub description: String,

    /// Acceptance criteria, in order
    #[serde(default)]
    pub acceptance_criteria: Vec<String>,

    /// Relative-sizing estimate (1-21)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub story_points: Option<u8>,

    /// Priority (1-10, higher is more important)
    #[serde(default = "default_priority")]
    pub priority: u8,

    /// Refinement status
    #[serde(default)]
    pub status: StoryStatus,

    /// Kanban column on the sprint board
    #[serde(default)]
    pub sprint_status: SprintStatus,

    /// Containing epic
    pub epic_id: String,

    /// Assigned team member (weak reference)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_user_id: Option<String>,

    /// Sprint membership (weak reference, independent of `sprint_status`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sprint_id: Option<String>,

    /// Set when the story enters the done column; never cleared on moving
    /// back to an earlier column (preserved completion record)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl UserStory {
    /// Create a new story under the given epic.
    pub fn new(id: String, title: String, epic_id: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            title,
            description: String::new(),
            acceptance_criteria: Vec::new(),
            story_points: None,
            priority: default_priority(),
            status: StoryStatus::default(),
            sprint_status: SprintStatus::default(),
            epic_id,
            assigned_user_id: None,
            sprint_id: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// The smallest unit of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier (e.g., "tk-a1b2c3d4")
    pub id: String,

    /// Task title
    pub title: String,

    /// Detailed description
    #[serde(default)]
    pub description: String,

    /// Current status
    #[serde(default)]
    pub status: TaskStatus,

    /// Priority (1-10, higher is more important)
    #[serde(default = "default_priority")]
    pub priority: u8,

    /// Hour estimate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_hours: Option<f64>,

    /// Containing user story
    pub user_story_id: String,

    /// Assigned team member (weak reference)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_user_id: Option<String>,

    /// Sprint membership (weak reference)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sprint_id: Option<String>,

    /// Kanban column on the sprint board
    #[serde(default)]
    pub sprint_status: SprintStatus,

    /// Set when the task enters the done column; never cleared on moving
    /// back to an earlier column
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Create a new task under the given story.
    pub fn new(id: String, title: String, user_story_id: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            title,
            description: String::new(),
            status: TaskStatus::default(),
            priority: default_priority(),
            estimated_hours: None,
            user_story_id,
            assigned_user_id: None,
            sprint_id: None,
            sprint_status: SprintStatus::default(),
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A team member.
///
/// Users are referenced by weak `assigned_user_id` ids from tree nodes and
/// never owned by them; deleting a user clears every reference tree-wide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier (e.g., "ur-a1b2c3d4")
    pub id: String,

    /// Display name
    pub name: String,

    /// Email address
    pub email: String,

    /// Team role
    #[serde(default)]
    pub role: UserRole,

    /// Avatar URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl User {
    /// Create a new user with the given ID, name, and email.
    pub fn new(id: String, name: String, email: String) -> Self {
        Self {
            id,
            name,
            email,
            role: UserRole::default(),
            avatar: None,
        }
    }
}

/// A time-boxed iteration.
///
/// At most one sprint is current at a time; the set-current operation clears
/// the flag on every other sprint before setting it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sprint {
    /// Unique identifier (e.g., "sp-a1b2c3d4")
    pub id: String,

    /// Sprint name
    pub name: String,

    /// Start of the sprint window
    pub start_date: DateTime<Utc>,

    /// End of the sprint window
    pub end_date: DateTime<Utc>,

    /// Lifecycle phase
    #[serde(default)]
    pub status: SprintPhase,

    /// Whether this is the current sprint
    #[serde(default)]
    pub is_current: bool,
}

impl Sprint {
    /// Create a new sprint with the given ID, name, and window.
    pub fn new(
        id: String,
        name: String,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            start_date,
            end_date,
            status: SprintPhase::default(),
            is_current: false,
        }
    }
}

/// A tree node of any kind.
///
/// Closed variant type used wherever the engine dispatches on kind
/// (generic create/update/show, store write-through).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Node {
    Product(Product),
    Feature(Feature),
    Epic(Epic),
    UserStory(UserStory),
    Task(Task),
}

impl Node {
    /// The node's id.
    pub fn id(&self) -> &str {
        match self {
            Node::Product(p) => &p.id,
            Node::Feature(f) => &f.id,
            Node::Epic(e) => &e.id,
            Node::UserStory(s) => &s.id,
            Node::Task(t) => &t.id,
        }
    }

    /// The node's kind.
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Product(_) => NodeKind::Product,
            Node::Feature(_) => NodeKind::Feature,
            Node::Epic(_) => NodeKind::Epic,
            Node::UserStory(_) => NodeKind::UserStory,
            Node::Task(_) => NodeKind::Task,
        }
    }

    /// The node's display title (name for products/features).
    pub fn title(&self) -> &str {
        match self {
            Node::Product(p) => &p.name,
            Node::Feature(f) => &f.name,
            Node::Epic(e) => &e.title,
            Node::UserStory(s) => &s.title,
            Node::Task(t) => &t.title,
        }
    }

    /// The id of the containing parent, if any (products are roots).
    pub fn parent_id(&self) -> Option<&str> {
        match self {
            Node::Product(_) => None,
            Node::Feature(f) => Some(&f.product_id),
            Node::Epic(e) => Some(&e.feature_id),
            Node::UserStory(s) => Some(&s.epic_id),
            Node::Task(t) => Some(&t.user_story_id),
        }
    }

    /// Overwrite the last-update timestamp.
    pub fn set_updated_at(&mut self, at: DateTime<Utc>) {
        match self {
            Node::Product(p) => p.updated_at = at,
            Node::Feature(f) => f.updated_at = at,
            Node::Epic(e) => e.updated_at = at,
            Node::UserStory(s) => s.updated_at = at,
            Node::Task(t) => t.updated_at = at,
        }
    }
}

fn default_priority() -> u8 {
    5
}

/// Validate a priority value (1-10 scale).
pub fn validate_priority(priority: u8) -> Result<()> {
    if !(1..=10).contains(&priority) {
        return Err(Error::InvalidInput(format!(
            "Priority must be 1-10, got: {}",
            priority
        )));
    }
    Ok(())
}

/// Validate a story point value (1-21 scale).
pub fn validate_story_points(points: u8) -> Result<()> {
    if !(1..=21).contains(&points) {
        return Err(Error::InvalidInput(format!(
            "Story points must be 1-21, got: {}",
            points
        )));
    }
    Ok(())
}

/// Validate a title or name: must be non-empty after trimming.
pub fn validate_title(title: &str, what: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(Error::InvalidInput(format!("{} must not be empty", what)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_kind_serialization() {
        let kind = NodeKind::UserStory;
        let json = serde_json::to_string(&kind).unwrap();
        assert_eq!(json, r#""user-story""#);
    }

    #[test]
    fn test_node_kind_from_str() {
        assert_eq!("product".parse::<NodeKind>().unwrap(), NodeKind::Product);
        assert_eq!(
            "user-story".parse::<NodeKind>().unwrap(),
            NodeKind::UserStory
        );
        assert_eq!("story".parse::<NodeKind>().unwrap(), NodeKind::UserStory);
        assert!("sprint".parse::<NodeKind>().is_err());
    }

    #[test]
    fn test_node_kind_child_chain() {
        // Product > Feature > Epic > UserStory > Task, exactly five levels
        let mut kind = NodeKind::Product;
        let mut depth = 1;
        while let Some(child) = kind.child_kind() {
            kind = child;
            depth += 1;
        }
        assert_eq!(depth, 5);
        assert_eq!(kind, NodeKind::Task);
    }

    #[test]
    fn test_sprint_status_serialization() {
        let status = SprintStatus::SprintBacklog;
        let json = serde_json::to_string(&status).unwrap();
        assert_eq!(json, r#""sprint-backlog""#);

        let deserialized: SprintStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, SprintStatus::SprintBacklog);
    }

    #[test]
    fn test_sprint_status_from_str() {
        assert_eq!(
            "sprint-backlog".parse::<SprintStatus>().unwrap(),
            SprintStatus::SprintBacklog
        );
        assert_eq!("done".parse::<SprintStatus>().unwrap(), SprintStatus::Done);
        assert!("doing".parse::<SprintStatus>().is_err());
    }

    #[test]
    fn test_user_role_roundtrip() {
        for role in [
            UserRole::ProductOwner,
            UserRole::ScrumMaster,
            UserRole::Developer,
            UserRole::Designer,
            UserRole::Qa,
        ] {
            let parsed: UserRole = role.to_string().parse().unwrap();
            assert_eq!(parsed, role);
        }
    }

    #[test]
    fn test_task_serialization_roundtrip() {
        let task = Task::new(
            "tk-test0001".to_string(),
            "Test task".to_string(),
            "us-parent01".to_string(),
        );
        let json = serde_json::to_string(&task).unwrap();
        let deserialized: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(task, deserialized);
    }

    #[test]
    fn test_story_defaults() {
        let story = UserStory::new(
            "us-test0001".to_string(),
            "Story".to_string(),
            "ep-parent01".to_string(),
        );
        assert_eq!(story.sprint_status, SprintStatus::Backlog);
        assert_eq!(story.priority, 5);
        assert!(story.completed_at.is_none());
        assert!(story.sprint_id.is_none());
        assert!(story.acceptance_criteria.is_empty());
    }

    #[test]
    fn test_node_tagged_serialization() {
        let node = Node::Epic(Epic::new(
            "ep-test0001".to_string(),
            "Checkout".to_string(),
            "ft-parent01".to_string(),
        ));
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["kind"], "epic");
        assert_eq!(json["title"], "Checkout");
        assert_eq!(json["feature_id"], "ft-parent01");
    }

    #[test]
    fn test_node_parent_id() {
        let node = Node::Task(Task::new(
            "tk-test0001".to_string(),
            "T".to_string(),
            "us-parent01".to_string(),
        ));
        assert_eq!(node.parent_id(), Some("us-parent01"));

        let root = Node::Product(Product::new("pd-test0001".to_string(), "P".to_string()));
        assert_eq!(root.parent_id(), None);
    }

    #[test]
    fn test_validate_priority_bounds() {
        assert!(validate_priority(1).is_ok());
        assert!(validate_priority(10).is_ok());
        assert!(validate_priority(0).is_err());
        assert!(validate_priority(11).is_err());
    }

    #[test]
    fn test_validate_story_points_bounds() {
        assert!(validate_story_points(1).is_ok());
        assert!(validate_story_points(21).is_ok());
        assert!(validate_story_points(0).is_err());
        assert!(validate_story_points(22).is_err());
    }

    #[test]
    fn test_validate_title_rejects_blank() {
        assert!(validate_title("Login", "Title").is_ok());
        assert!(validate_title("   ", "Title").is_err());
        assert!(validate_title("", "Name").is_err());
    }
}
