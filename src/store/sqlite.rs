//! Local SQLite store backend.
//!
//! One table per entity kind, with a `position` column carrying sibling
//! order and `ON DELETE CASCADE` foreign keys mirroring tree containment.
//! Timestamps are stored as RFC 3339 text, status enums as their
//! kebab-case wire strings.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use super::{get_storage_dir, RemoteStore};
use crate::models::tree::{EpicTree, FeatureTree, ProductTree, StoryTree};
use crate::models::{
    Epic, Feature, ItemKind, Node, NodeKind, Product, Sprint, SprintStatus, Task, User, UserStory,
};
use crate::state::UiState;
use crate::{Error, Result};

/// SQLite-backed store for a single workspace.
pub struct SqliteStore {
    /// Root directory for this workspace's data
    pub root: PathBuf,
    conn: Connection,
}

impl SqliteStore {
    /// Open (creating on first use) the store for the given workspace.
    pub fn open(workspace: &Path) -> Result<Self> {
        let root = get_storage_dir(workspace)?;
        fs::create_dir_all(&root)?;
        Self::open_at(root)
    }

    /// Open a store rooted at an explicit directory (dependency injection
    /// for tests).
    pub fn open_at(root: PathBuf) -> Result<Self> {
        fs::create_dir_all(&root)?;
        let conn = Connection::open(root.join("backlog.db"))?;
        conn.execute_batch("PRAGMA foreign_keys = ON")?;
        Self::init_schema(&conn)?;
        Ok(Self { root, conn })
    }

    /// Check if a store already exists for the workspace.
    pub fn exists(workspace: &Path) -> Result<bool> {
        let root = get_storage_dir(workspace)?;
        Ok(root.join("backlog.db").exists())
    }

    /// Initialize the SQLite schema.
    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS products (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                version TEXT NOT NULL DEFAULT '1.0.0',
                position INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS features (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                priority INTEGER NOT NULL DEFAULT 5,
                product_id TEXT NOT NULL,
                assigned_user_id TEXT,
                position INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (product_id) REFERENCES products(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS epics (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                status TEXT NOT NULL DEFAULT 'planning',
                priority INTEGER NOT NULL DEFAULT 5,
                feature_id TEXT NOT NULL,
                assigned_user_id TEXT,
                position INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (feature_id) REFERENCES features(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS user_stories (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                acceptance_criteria TEXT NOT NULL DEFAULT '[]',
                story_points INTEGER,
                priority INTEGER NOT NULL DEFAULT 5,
                status TEXT NOT NULL DEFAULT 'backlog',
                sprint_status TEXT NOT NULL DEFAULT 'backlog',
                epic_id TEXT NOT NULL,
                assigned_user_id TEXT,
                sprint_id TEXT,
                completed_at TEXT,
                position INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (epic_id) REFERENCES epics(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS tasks (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                status TEXT NOT NULL DEFAULT 'todo',
                priority INTEGER NOT NULL DEFAULT 5,
                estimated_hours REAL,
                user_story_id TEXT NOT NULL,
                assigned_user_id TEXT,
                sprint_id TEXT,
                sprint_status TEXT NOT NULL DEFAULT 'backlog',
                completed_at TEXT,
                position INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (user_story_id) REFERENCES user_stories(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT 'developer',
                avatar TEXT
            );

            CREATE TABLE IF NOT EXISTS sprints (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'planning',
                is_current INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_features_product ON features(product_id);
            CREATE INDEX IF NOT EXISTS idx_epics_feature ON epics(feature_id);
            CREATE INDEX IF NOT EXISTS idx_stories_epic ON user_stories(epic_id);
            CREATE INDEX IF NOT EXISTS idx_tasks_story ON tasks(user_story_id);
            CREATE INDEX IF NOT EXISTS idx_stories_sprint_status ON user_stories(sprint_status);
            CREATE INDEX IF NOT EXISTS idx_tasks_sprint_status ON tasks(sprint_status);

            CREATE TABLE IF NOT EXISTS config (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    /// Get a configuration value.
    pub fn get_config(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM config WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Set a configuration value.
    pub fn set_config(&mut self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO config (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    fn fetch_features(&self, product_id: &str) -> Result<Vec<FeatureTree>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, description, priority, product_id, assigned_user_id,
                    created_at, updated_at
             FROM features WHERE product_id = ?1 ORDER BY position, created_at",
        )?;
        let features = stmt
            .query_map([product_id], feature_from_row)?
            .collect::<rusqlite::Result<Vec<Feature>>>()?;

        features
            .into_iter()
            .map(|feature| {
                let epics = self.fetch_epics(&feature.id)?;
                Ok(FeatureTree { feature, epics })
            })
            .collect()
    }

    fn fetch_epics(&self, feature_id: &str) -> Result<Vec<EpicTree>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, description, status, priority, feature_id, assigned_user_id,
                    created_at, updated_at
             FROM epics WHERE feature_id = ?1 ORDER BY position, created_at",
        )?;
        let epics = stmt
            .query_map([feature_id], epic_from_row)?
            .collect::<rusqlite::Result<Vec<Epic>>>()?;

        epics
            .into_iter()
            .map(|epic| {
                let user_stories = self.fetch_stories(&epic.id)?;
                Ok(EpicTree { epic, user_stories })
            })
            .collect()
    }

    fn fetch_stories(&self, epic_id: &str) -> Result<Vec<StoryTree>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, description, acceptance_criteria, story_points, priority,
                    status, sprint_status, epic_id, assigned_user_id, sprint_id,
                    completed_at, created_at, updated_at
             FROM user_stories WHERE epic_id = ?1 ORDER BY position, created_at",
        )?;
        let stories = stmt
            .query_map([epic_id], story_from_row)?
            .collect::<rusqlite::Result<Vec<UserStory>>>()?;

        stories
            .into_iter()
            .map(|story| {
                let tasks = self.fetch_tasks(&story.id)?;
                Ok(StoryTree { story, tasks })
            })
            .collect()
    }

    fn fetch_tasks(&self, story_id: &str) -> Result<Vec<Task>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, description, status, priority, estimated_hours, user_story_id,
                    assigned_user_id, sprint_id, sprint_status, completed_at,
                    created_at, updated_at
             FROM tasks WHERE user_story_id = ?1 ORDER BY position, created_at",
        )?;
        let tasks = stmt
            .query_map([story_id], task_from_row)?
            .collect::<rusqlite::Result<Vec<Task>>>()?;
        Ok(tasks)
    }

    fn next_position(&self, table: &str, parent_col: Option<(&str, &str)>) -> Result<i64> {
        let count: i64 = match parent_col {
            Some((col, parent)) => self.conn.query_row(
                &format!("SELECT COUNT(*) FROM {} WHERE {} = ?1", table, col),
                [parent],
                |row| row.get(0),
            )?,
            None => self
                .conn
                .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                    row.get(0)
                })?,
        };
        Ok(count)
    }
}

impl RemoteStore for SqliteStore {
    fn fetch_tree(&self) -> Result<Vec<ProductTree>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, description, version, created_at, updated_at
             FROM products ORDER BY position, created_at",
        )?;
        let products = stmt
            .query_map([], product_from_row)?
            .collect::<rusqlite::Result<Vec<Product>>>()?;

        products
            .into_iter()
            .map(|product| {
                let features = self.fetch_features(&product.id)?;
                Ok(ProductTree { product, features })
            })
            .collect()
    }

    fn fetch_users(&self) -> Result<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, email, role, avatar FROM users ORDER BY name")?;
        let users = stmt
            .query_map([], |row| {
                Ok(User {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    email: row.get(2)?,
                    role: enum_from_sql(row, 3)?,
                    avatar: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<User>>>()?;
        Ok(users)
    }

    fn fetch_sprints(&self) -> Result<Vec<Sprint>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, start_date, end_date, status, is_current
             FROM sprints ORDER BY start_date",
        )?;
        let sprints = stmt
            .query_map([], |row| {
                Ok(Sprint {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    start_date: datetime_from_sql(row, 2)?,
                    end_date: datetime_from_sql(row, 3)?,
                    status: enum_from_sql(row, 4)?,
                    is_current: row.get::<_, i64>(5)? != 0,
                })
            })?
            .collect::<rusqlite::Result<Vec<Sprint>>>()?;
        Ok(sprints)
    }

    fn create_node(&mut self, node: &Node) -> Result<()> {
        match node {
            Node::Product(p) => {
                let position = self.next_position("products", None)?;
                self.conn.execute(
                    "INSERT OR REPLACE INTO products
                     (id, name, description, version, position, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        p.id,
                        p.name,
                        p.description,
                        p.version,
                        position,
                        p.created_at.to_rfc3339(),
                        p.updated_at.to_rfc3339(),
                    ],
                )?;
            }
            Node::Feature(f) => {
                let position =
                    self.next_position("features", Some(("product_id", &f.product_id)))?;
                self.conn.execute(
                    "INSERT OR REPLACE INTO features
                     (id, name, description, priority, product_id, assigned_user_id,
                      position, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    params![
                        f.id,
                        f.name,
                        f.description,
                        f.priority,
                        f.product_id,
                        f.assigned_user_id,
                        position,
                        f.created_at.to_rfc3339(),
                        f.updated_at.to_rfc3339(),
                    ],
                )?;
            }
            Node::Epic(e) => {
                let position = self.next_position("epics", Some(("feature_id", &e.feature_id)))?;
                self.conn.execute(
                    "INSERT OR REPLACE INTO epics
                     (id, title, description, status, priority, feature_id, assigned_user_id,
                      position, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                    params![
                        e.id,
                        e.title,
                        e.description,
                        enum_to_sql(&e.status)?,
                        e.priority,
                        e.feature_id,
                        e.assigned_user_id,
                        position,
                        e.created_at.to_rfc3339(),
                        e.updated_at.to_rfc3339(),
                    ],
                )?;
            }
            Node::UserStory(s) => {
                let position =
                    self.next_position("user_stories", Some(("epic_id", &s.epic_id)))?;
                self.conn.execute(
                    "INSERT OR REPLACE INTO user_stories
                     (id, title, description, acceptance_criteria, story_points, priority,
                      status, sprint_status, epic_id, assigned_user_id, sprint_id,
                      completed_at, position, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
                    params![
                        s.id,
                        s.title,
                        s.description,
                        serde_json::to_string(&s.acceptance_criteria)?,
                        s.story_points,
                        s.priority,
                        enum_to_sql(&s.status)?,
                        enum_to_sql(&s.sprint_status)?,
                        s.epic_id,
                        s.assigned_user_id,
                        s.sprint_id,
                        s.completed_at.map(|t| t.to_rfc3339()),
                        position,
                        s.created_at.to_rfc3339(),
                        s.updated_at.to_rfc3339(),
                    ],
                )?;
            }
            Node::Task(t) => {
                let position =
                    self.next_position("tasks", Some(("user_story_id", &t.user_story_id)))?;
                self.conn.execute(
                    "INSERT OR REPLACE INTO tasks
                     (id, title, description, status, priority, estimated_hours, user_story_id,
                      assigned_user_id, sprint_id, sprint_status, completed_at, position,
                      created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                    params![
                        t.id,
                        t.title,
                        t.description,
                        enum_to_sql(&t.status)?,
                        t.priority,
                        t.estimated_hours,
                        t.user_story_id,
                        t.assigned_user_id,
                        t.sprint_id,
                        enum_to_sql(&t.sprint_status)?,
                        t.completed_at.map(|ts| ts.to_rfc3339()),
                        position,
                        t.created_at.to_rfc3339(),
                        t.updated_at.to_rfc3339(),
                    ],
                )?;
            }
        }
        Ok(())
    }

    fn update_node(&mut self, node: &Node) -> Result<()> {
        let changed = match node {
            Node::Product(p) => self.conn.execute(
                "UPDATE products SET name = ?2, description = ?3, version = ?4, updated_at = ?5
                 WHERE id = ?1",
                params![
                    p.id,
                    p.name,
                    p.description,
                    p.version,
                    p.updated_at.to_rfc3339()
                ],
            )?,
            Node::Feature(f) => self.conn.execute(
                "UPDATE features SET name = ?2, description = ?3, priority = ?4,
                        assigned_user_id = ?5, updated_at = ?6
                 WHERE id = ?1",
                params![
                    f.id,
                    f.name,
                    f.description,
                    f.priority,
                    f.assigned_user_id,
                    f.updated_at.to_rfc3339()
                ],
            )?,
            Node::Epic(e) => self.conn.execute(
                "UPDATE epics SET title = ?2, description = ?3, status = ?4, priority = ?5,
                        assigned_user_id = ?6, updated_at = ?7
                 WHERE id = ?1",
                params![
                    e.id,
                    e.title,
                    e.description,
                    enum_to_sql(&e.status)?,
                    e.priority,
                    e.assigned_user_id,
                    e.updated_at.to_rfc3339()
                ],
            )?,
            Node::UserStory(s) => self.conn.execute(
                "UPDATE user_stories SET title = ?2, description = ?3,
                        acceptance_criteria = ?4, story_points = ?5, priority = ?6,
                        status = ?7, sprint_status = ?8, assigned_user_id = ?9,
                        sprint_id = ?10, completed_at = ?11, updated_at = ?12
                 WHERE id = ?1",
                params![
                    s.id,
                    s.title,
                    s.description,
                    serde_json::to_string(&s.acceptance_criteria)?,
                    s.story_points,
                    s.priority,
                    enum_to_sql(&s.status)?,
                    enum_to_sql(&s.sprint_status)?,
                    s.assigned_user_id,
                    s.sprint_id,
                    s.completed_at.map(|t| t.to_rfc3339()),
                    s.updated_at.to_rfc3339()
                ],
            )?,
            Node::Task(t) => self.conn.execute(
                "UPDATE tasks SET title = ?2, description = ?3, status = ?4, priority = ?5,
                        estimated_hours = ?6, assigned_user_id = ?7, sprint_id = ?8,
                        sprint_status = ?9, completed_at = ?10, updated_at = ?11
                 WHERE id = ?1",
                params![
                    t.id,
                    t.title,
                    t.description,
                    enum_to_sql(&t.status)?,
                    t.priority,
                    t.estimated_hours,
                    t.assigned_user_id,
                    t.sprint_id,
                    enum_to_sql(&t.sprint_status)?,
                    t.completed_at.map(|ts| ts.to_rfc3339()),
                    t.updated_at.to_rfc3339()
                ],
            )?,
        };
        if changed == 0 {
            return Err(Error::NodeNotFound(format!(
                "{} {}",
                node.kind(),
                node.id()
            )));
        }
        Ok(())
    }

    fn update_field(
        &mut self,
        id: &str,
        kind: NodeKind,
        fields: &serde_json::Value,
    ) -> Result<()> {
        let table = table_for(kind);
        let Some(map) = fields.as_object() else {
            return Err(Error::InvalidInput(
                "update_field expects a JSON object".to_string(),
            ));
        };
        for (key, value) in map {
            match key.as_str() {
                "position" => {
                    let position = value.as_i64().ok_or_else(|| {
                        Error::InvalidInput("position must be an integer".to_string())
                    })?;
                    self.conn.execute(
                        &format!("UPDATE {} SET position = ?2 WHERE id = ?1", table),
                        params![id, position],
                    )?;
                }
                other => {
                    return Err(Error::InvalidInput(format!(
                        "Unsupported field patch: {}",
                        other
                    )));
                }
            }
        }
        Ok(())
    }

    fn delete_node(&mut self, kind: NodeKind, id: &str) -> Result<()> {
        // Child rows fall out via ON DELETE CASCADE; deleting an
        // already-absent row is fine.
        self.conn.execute(
            &format!("DELETE FROM {} WHERE id = ?1", table_for(kind)),
            [id],
        )?;
        Ok(())
    }

    fn create_user(&mut self, user: &User) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO users (id, name, email, role, avatar)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                user.id,
                user.name,
                user.email,
                enum_to_sql(&user.role)?,
                user.avatar
            ],
        )?;
        Ok(())
    }

    fn update_user(&mut self, user: &User) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE users SET name = ?2, email = ?3, role = ?4, avatar = ?5 WHERE id = ?1",
            params![
                user.id,
                user.name,
                user.email,
                enum_to_sql(&user.role)?,
                user.avatar
            ],
        )?;
        if changed == 0 {
            return Err(Error::NodeNotFound(format!("user {}", user.id)));
        }
        Ok(())
    }

    fn delete_user(&mut self, id: &str) -> Result<()> {
        self.conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
        Ok(())
    }

    fn create_sprint(&mut self, sprint: &Sprint) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO sprints (id, name, start_date, end_date, status, is_current)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                sprint.id,
                sprint.name,
                sprint.start_date.to_rfc3339(),
                sprint.end_date.to_rfc3339(),
                enum_to_sql(&sprint.status)?,
                sprint.is_current as i64,
            ],
        )?;
        Ok(())
    }

    fn update_sprint(&mut self, sprint: &Sprint) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE sprints SET name = ?2, start_date = ?3, end_date = ?4, status = ?5,
                    is_current = ?6
             WHERE id = ?1",
            params![
                sprint.id,
                sprint.name,
                sprint.start_date.to_rfc3339(),
                sprint.end_date.to_rfc3339(),
                enum_to_sql(&sprint.status)?,
                sprint.is_current as i64,
            ],
        )?;
        if changed == 0 {
            return Err(Error::NodeNotFound(format!("sprint {}", sprint.id)));
        }
        Ok(())
    }

    fn set_sprint_status(
        &mut self,
        id: &str,
        kind: ItemKind,
        status: SprintStatus,
    ) -> Result<()> {
        let table = table_for(kind.node_kind());
        let now = Utc::now().to_rfc3339();
        // Mirror the reducer's completion stamp so reloads see it
        let changed = if status == SprintStatus::Done {
            self.conn.execute(
                &format!(
                    "UPDATE {} SET sprint_status = ?2, completed_at = ?3, updated_at = ?3
                     WHERE id = ?1",
                    table
                ),
                params![id, enum_to_sql(&status)?, now],
            )?
        } else {
            self.conn.execute(
                &format!(
                    "UPDATE {} SET sprint_status = ?2, updated_at = ?3 WHERE id = ?1",
                    table
                ),
                params![id, enum_to_sql(&status)?, now],
            )?
        };
        if changed == 0 {
            return Err(Error::NodeNotFound(format!("{} {}", kind, id)));
        }
        Ok(())
    }

    fn assign_to_sprint(&mut self, id: &str, kind: ItemKind, sprint: Option<&str>) -> Result<()> {
        let table = table_for(kind.node_kind());
        let changed = self.conn.execute(
            &format!(
                "UPDATE {} SET sprint_id = ?2, updated_at = ?3 WHERE id = ?1",
                table
            ),
            params![id, sprint, Utc::now().to_rfc3339()],
        )?;
        if changed == 0 {
            return Err(Error::NodeNotFound(format!("{} {}", kind, id)));
        }
        Ok(())
    }

    fn set_current_sprint(&mut self, id: &str) -> Result<()> {
        // Clear-all plus set-one must not be observable half-done
        let tx = self.conn.transaction()?;
        tx.execute("UPDATE sprints SET is_current = 0", [])?;
        let changed = tx.execute("UPDATE sprints SET is_current = 1 WHERE id = ?1", [id])?;
        if changed == 0 {
            return Err(Error::NodeNotFound(format!("sprint {}", id)));
        }
        tx.commit()?;
        Ok(())
    }

    fn load_ui_state(&self) -> Result<Option<UiState>> {
        match self.get_config("ui_state")? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn save_ui_state(&mut self, ui: &UiState) -> Result<()> {
        let json = serde_json::to_string(ui)?;
        self.set_config("ui_state", &json)
    }

    fn location(&self) -> String {
        self.root.display().to_string()
    }

    fn store_type(&self) -> &'static str {
        "sqlite"
    }
}

fn table_for(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Product => "products",
        NodeKind::Feature => "features",
        NodeKind::Epic => "epics",
        NodeKind::UserStory => "user_stories",
        NodeKind::Task => "tasks",
    }
}

/// Serialize a status enum to its kebab-case wire string.
fn enum_to_sql<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?.trim_matches('"').to_string())
}

/// Parse a status enum column from its kebab-case wire string.
fn enum_from_sql<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let s: String = row.get(idx)?;
    serde_json::from_str(&format!("\"{}\"", s)).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn datetime_from_sql(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let s: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn opt_datetime_from_sql(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let s: Option<String> = row.get(idx)?;
    match s {
        Some(s) => DateTime::parse_from_rfc3339(&s)
            .map(|t| Some(t.with_timezone(&Utc)))
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    idx,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            }),
        None => Ok(None),
    }
}

fn product_from_row(row: &Row<'_>) -> rusqlite::Result<Product> {
    Ok(Product {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        version: row.get(3)?,
        created_at: datetime_from_sql(row, 4)?,
        updated_at: datetime_from_sql(row, 5)?,
    })
}

fn feature_from_row(row: &Row<'_>) -> rusqlite::Result<Feature> {
    Ok(Feature {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        priority: row.get(3)?,
        product_id: row.get(4)?,
        assigned_user_id: row.get(5)?,
        created_at: datetime_from_sql(row, 6)?,
        updated_at: datetime_from_sql(row, 7)?,
    })
}

fn epic_from_row(row: &Row<'_>) -> rusqlite::Result<Epic> {
    Ok(Epic {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        status: enum_from_sql(row, 3)?,
        priority: row.get(4)?,
        feature_id: row.get(5)?,
        assigned_user_id: row.get(6)?,
        created_at: datetime_from_sql(row, 7)?,
        updated_at: datetime_from_sql(row, 8)?,
    })
}

fn story_from_row(row: &Row<'_>) -> rusqlite::Result<UserStory> {
    let criteria_json: String = row.get(3)?;
    let acceptance_criteria = serde_json::from_str(&criteria_json).unwrap_or_default();
    Ok(UserStory {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        acceptance_criteria,
        story_points: row.get(4)?,
        priority: row.get(5)?,
        status: enum_from_sql(row, 6)?,
        sprint_status: enum_from_sql(row, 7)?,
        epic_id: row.get(8)?,
        assigned_user_id: row.get(9)?,
        sprint_id: row.get(10)?,
        completed_at: opt_datetime_from_sql(row, 11)?,
        created_at: datetime_from_sql(row, 12)?,
        updated_at: datetime_from_sql(row, 13)?,
    })
}

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        status: enum_from_sql(row, 3)?,
        priority: row.get(4)?,
        estimated_hours: row.get(5)?,
        user_story_id: row.get(6)?,
        assigned_user_id: row.get(7)?,
        sprint_id: row.get(8)?,
        sprint_status: enum_from_sql(row, 9)?,
        completed_at: opt_datetime_from_sql(row, 10)?,
        created_at: datetime_from_sql(row, 11)?,
        updated_at: datetime_from_sql(row, 12)?,
    })
}
