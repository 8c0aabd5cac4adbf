//! CLI argument definitions for Tiller.

use clap::{Parser, Subcommand};

/// Tiller - a backlog manager for products, features, epics, stories, and tasks.
///
/// Start with `tl system init`, then `tl tree` to see the hierarchy and
/// `tl board` for sprint planning.
#[derive(Parser, Debug)]
#[command(name = "tl")]
#[command(author, version, about = "A CLI backlog manager with sprint planning", long_about = None)]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// Run as if tl was started in <path> instead of the current directory.
    /// Storage is keyed by this path. Can also be set via TL_WORKSPACE.
    #[arg(short = 'C', long = "workspace", global = true, env = "TL_WORKSPACE")]
    pub workspace: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Product management commands
    Product {
        #[command(subcommand)]
        command: ProductCommands,
    },

    /// Feature management commands
    Feature {
        #[command(subcommand)]
        command: FeatureCommands,
    },

    /// Epic management commands
    Epic {
        #[command(subcommand)]
        command: EpicCommands,
    },

    /// User story management commands
    Story {
        #[command(subcommand)]
        command: StoryCommands,
    },

    /// Task management commands
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },

    /// Team member management commands
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Sprint management commands
    Sprint {
        #[command(subcommand)]
        command: SprintCommands,
    },

    /// Select a hierarchy level (clears all deeper selections)
    Select {
        /// Level: product, feature, epic, or story
        level: String,

        /// Id to select; omit together with --none to clear
        id: Option<String>,

        /// Clear the selection at this level
        #[arg(long)]
        none: bool,
    },

    /// Switch the active view (backlog, kanban, hierarchy)
    View {
        /// View name
        mode: String,
    },

    /// Show the backlog hierarchy, scoped to the current selection
    Tree {
        /// Ignore the selection and show everything
        #[arg(long)]
        all: bool,
    },

    /// Show the sprint board, or move an item between columns
    Board {
        /// Include items regardless of current-sprint membership
        #[arg(long)]
        all: bool,

        #[command(subcommand)]
        command: Option<BoardCommands>,
    },

    /// Show any entity by ID (auto-detects kind)
    Show {
        /// Entity ID (e.g., us-3fa92c1d)
        id: String,
    },

    /// System administration commands
    System {
        #[command(subcommand)]
        command: SystemCommands,
    },
}

/// Product subcommands
#[derive(Subcommand, Debug)]
pub enum ProductCommands {
    /// Create a new product
    Create {
        /// Product name
        name: String,

        /// Product description
        #[arg(short, long)]
        description: Option<String>,

        /// Version string
        #[arg(long)]
        version: Option<String>,
    },

    /// List products
    List,

    /// Show product details
    Show {
        /// Product ID
        id: String,
    },

    /// Update a product
    Update {
        /// Product ID
        id: String,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New description
        #[arg(short, long)]
        description: Option<String>,

        /// New version
        #[arg(long)]
        version: Option<String>,
    },

    /// Delete a product and its whole subtree
    Delete {
        /// Product ID
        id: String,
    },

    /// Move a product immediately before another product
    Reorder {
        /// Product ID to move
        id: String,

        /// Sibling to land in front of
        #[arg(long)]
        before: String,
    },
}

/// Feature subcommands
#[derive(Subcommand, Debug)]
pub enum FeatureCommands {
    /// Create a new feature under a product
    Create {
        /// Feature name
        name: String,

        /// Containing product ID
        #[arg(short = 'P', long)]
        product: String,

        /// Feature description
        #[arg(short, long)]
        description: Option<String>,

        /// Priority (1-10)
        #[arg(short, long)]
        priority: Option<u8>,

        /// Assigned user ID
        #[arg(short, long)]
        assignee: Option<String>,
    },

    /// List features
    List {
        /// Filter by product
        #[arg(long)]
        product: Option<String>,
    },

    /// Show feature details
    Show {
        /// Feature ID
        id: String,
    },

    /// Update a feature
    Update {
        /// Feature ID
        id: String,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New description
        #[arg(short, long)]
        description: Option<String>,

        /// New priority (1-10)
        #[arg(short, long)]
        priority: Option<u8>,

        /// Assign to user ID
        #[arg(short, long)]
        assignee: Option<String>,

        /// Clear the assignment
        #[arg(long)]
        unassign: bool,
    },

    /// Delete a feature and its whole subtree
    Delete {
        /// Feature ID
        id: String,
    },

    /// Move a feature immediately before a sibling feature
    Reorder {
        /// Feature ID to move
        id: String,

        /// Sibling to land in front of
        #[arg(long)]
        before: String,
    },
}

/// Epic subcommands
#[derive(Subcommand, Debug)]
pub enum EpicCommands {
    /// Create a new epic under a feature
    Create {
        /// Epic title
        title: String,

        /// Containing feature ID
        #[arg(short = 'F', long)]
        feature: String,

        /// Epic description
        #[arg(short, long)]
        description: Option<String>,

        /// Priority (1-10)
        #[arg(short, long)]
        priority: Option<u8>,

        /// Assigned user ID
        #[arg(short, long)]
        assignee: Option<String>,
    },

    /// List epics
    List {
        /// Filter by feature
        #[arg(long)]
        feature: Option<String>,
    },

    /// Show epic details
    Show {
        /// Epic ID
        id: String,
    },

    /// Update an epic (status: planning, in-progress, done)
    Update {
        /// Epic ID
        id: String,

        /// New title
        #[arg(long)]
        title: Option<String>,

        /// New description
        #[arg(short, long)]
        description: Option<String>,

        /// New status (planning, in-progress, done)
        #[arg(short, long)]
        status: Option<String>,

        /// New priority (1-10)
        #[arg(short, long)]
        priority: Option<u8>,

        /// Assign to user ID
        #[arg(short, long)]
        assignee: Option<String>,

        /// Clear the assignment
        #[arg(long)]
        unassign: bool,
    },

    /// Delete an epic and its whole subtree
    Delete {
        /// Epic ID
        id: String,
    },

    /// Move an epic immediately before a sibling epic
    Reorder {
        /// Epic ID to move
        id: String,

        /// Sibling to land in front of
        #[arg(long)]
        before: String,
    },
}

/// User story subcommands
#[derive(Subcommand, Debug)]
pub enum StoryCommands {
    /// Create a new user story under an epic
    Create {
        /// Story title
        title: String,

        /// Containing epic ID
        #[arg(short = 'E', long)]
        epic: String,

        /// Story description
        #[arg(short, long)]
        description: Option<String>,

        /// Priority (1-10)
        #[arg(short, long)]
        priority: Option<u8>,

        /// Story points (1-21)
        #[arg(long)]
        points: Option<u8>,

        /// Acceptance criterion (repeatable)
        #[arg(short = 'c', long = "criterion")]
        criteria: Vec<String>,

        /// Assigned user ID
        #[arg(short, long)]
        assignee: Option<String>,
    },

    /// List user stories
    List {
        /// Filter by epic
        #[arg(long)]
        epic: Option<String>,
    },

    /// Show story details
    Show {
        /// Story ID
        id: String,
    },

    /// Update a story (status: backlog, ready, in-progress, done)
    Update {
        /// Story ID
        id: String,

        /// New title
        #[arg(long)]
        title: Option<String>,

        /// New description
        #[arg(short, long)]
        description: Option<String>,

        /// New status (backlog, ready, in-progress, done)
        #[arg(short, long)]
        status: Option<String>,

        /// New priority (1-10)
        #[arg(short, long)]
        priority: Option<u8>,

        /// New story points (1-21)
        #[arg(long)]
        points: Option<u8>,

        /// Replace acceptance criteria (repeatable)
        #[arg(short = 'c', long = "criterion")]
        criteria: Vec<String>,

        /// Assign to user ID
        #[arg(short, long)]
        assignee: Option<String>,

        /// Clear the assignment
        #[arg(long)]
        unassign: bool,
    },

    /// Delete a story and its tasks
    Delete {
        /// Story ID
        id: String,
    },

    /// Move a story immediately before a sibling story
    Reorder {
        /// Story ID to move
        id: String,

        /// Sibling to land in front of
        #[arg(long)]
        before: String,
    },
}

/// Task subcommands
#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Create a new task under a user story
    Create {
        /// Task title
        title: String,

        /// Containing story ID
        #[arg(short = 'S', long)]
        story: String,

        /// Task description
        #[arg(short, long)]
        description: Option<String>,

        /// Priority (1-10)
        #[arg(short, long)]
        priority: Option<u8>,

        /// Hour estimate
        #[arg(long)]
        hours: Option<f64>,

        /// Assigned user ID
        #[arg(short, long)]
        assignee: Option<String>,
    },

    /// List tasks
    List {
        /// Filter by story
        #[arg(long)]
        story: Option<String>,
    },

    /// Show task details
    Show {
        /// Task ID
        id: String,
    },

    /// Update a task (status: todo, in-progress, done)
    Update {
        /// Task ID
        id: String,

        /// New title
        #[arg(long)]
        title: Option<String>,

        /// New description
        #[arg(short, long)]
        description: Option<String>,

        /// New status (todo, in-progress, done)
        #[arg(short, long)]
        status: Option<String>,

        /// New priority (1-10)
        #[arg(short, long)]
        priority: Option<u8>,

        /// New hour estimate
        #[arg(long)]
        hours: Option<f64>,

        /// Assign to user ID
        #[arg(short, long)]
        assignee: Option<String>,

        /// Clear the assignment
        #[arg(long)]
        unassign: bool,
    },

    /// Delete a task
    Delete {
        /// Task ID
        id: String,
    },

    /// Move a task immediately before a sibling task
    Reorder {
        /// Task ID to move
        id: String,

        /// Sibling to land in front of
        #[arg(long)]
        before: String,
    },
}

/// Team member subcommands
#[derive(Subcommand, Debug)]
pub enum UserCommands {
    /// Add a team member
    Create {
        /// Display name
        name: String,

        /// Email address
        #[arg(short, long)]
        email: String,

        /// Role (product-owner, scrum-master, developer, designer, qa)
        #[arg(short, long)]
        role: Option<String>,

        /// Avatar URL
        #[arg(long)]
        avatar: Option<String>,
    },

    /// List team members with assignment counts
    List,

    /// Update a team member
    Update {
        /// User ID
        id: String,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New email
        #[arg(short, long)]
        email: Option<String>,

        /// New role
        #[arg(short, long)]
        role: Option<String>,

        /// New avatar URL
        #[arg(long)]
        avatar: Option<String>,
    },

    /// Delete a team member and unassign them everywhere
    Delete {
        /// User ID
        id: String,
    },
}

/// Sprint subcommands
#[derive(Subcommand, Debug)]
pub enum SprintCommands {
    /// Create a sprint
    Create {
        /// Sprint name
        name: String,

        /// Start date (RFC 3339 or YYYY-MM-DD; defaults to now)
        #[arg(long)]
        start: Option<String>,

        /// End date (RFC 3339 or YYYY-MM-DD; defaults to start + 14 days)
        #[arg(long)]
        end: Option<String>,

        /// Phase (planning, active, completed)
        #[arg(short, long)]
        status: Option<String>,
    },

    /// List sprints
    List,

    /// Make a sprint the current one (exclusive)
    SetCurrent {
        /// Sprint ID
        id: String,
    },

    /// Assign a story or task to a sprint (kind auto-detected)
    Assign {
        /// Story or task ID
        item_id: String,

        /// Sprint ID; omit together with --none to detach
        sprint_id: Option<String>,

        /// Detach the item from any sprint
        #[arg(long)]
        none: bool,
    },
}

/// Board subcommands
#[derive(Subcommand, Debug)]
pub enum BoardCommands {
    /// Move a story or task to a kanban column (kind auto-detected)
    Move {
        /// Story or task ID
        id: String,

        /// Target column (backlog, sprint-backlog, in-progress, review, done)
        column: String,
    },
}

/// System subcommands
#[derive(Subcommand, Debug)]
pub enum SystemCommands {
    /// Initialize storage for this workspace
    Init,

    /// Load the sample dataset and write it through to the store
    Seed,

    /// Show storage location, build info, and entity counts
    Info,
}
