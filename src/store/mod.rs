//! Remote store boundary.
//!
//! The state engine treats persistence as a best-effort write-through
//! cache behind the [`RemoteStore`] trait: every mutation that survives the
//! reducer is mirrored outward, failures are logged and swallowed, and the
//! in-memory state always stands. Two backends are provided:
//!
//! - `SqliteStore` (default) - local SQLite database under the platform
//!   data dir, keyed by a hash of the workspace path
//! - `HttpStore` - blocking JSON client for a hosted backend, selected via
//!   the `TL_REMOTE` environment variable

pub mod http;
pub mod sqlite;

pub use http::HttpStore;
pub use sqlite::SqliteStore;

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

use crate::models::tree::ProductTree;
use crate::models::{ItemKind, Node, NodeKind, Sprint, SprintStatus, User};
use crate::state::UiState;
use crate::{Error, Result};

/// Trait for store backends that persist the backlog.
///
/// Reads happen once at startup; writes mirror individual reducer effects.
/// Every method is best-effort from the engine's point of view.
pub trait RemoteStore {
    /// Fetch the full nested tree.
    fn fetch_tree(&self) -> Result<Vec<ProductTree>>;

    /// Fetch all users.
    fn fetch_users(&self) -> Result<Vec<User>>;

    /// Fetch all sprints.
    fn fetch_sprints(&self) -> Result<Vec<Sprint>>;

    /// Persist a newly-created node.
    fn create_node(&mut self, node: &Node) -> Result<()>;

    /// Persist a full node replacement.
    fn update_node(&mut self, node: &Node) -> Result<()>;

    /// Patch individual fields on a node (used for sibling positions).
    fn update_field(&mut self, id: &str, kind: NodeKind, fields: &serde_json::Value)
        -> Result<()>;

    /// Remove a node. The subtree is deleted by the caller one node at a
    /// time, so implementations only need to drop the single row.
    fn delete_node(&mut self, kind: NodeKind, id: &str) -> Result<()>;

    fn create_user(&mut self, user: &User) -> Result<()>;
    fn update_user(&mut self, user: &User) -> Result<()>;
    fn delete_user(&mut self, id: &str) -> Result<()>;

    fn create_sprint(&mut self, sprint: &Sprint) -> Result<()>;
    fn update_sprint(&mut self, sprint: &Sprint) -> Result<()>;

    /// Persist a kanban column move.
    fn set_sprint_status(&mut self, id: &str, kind: ItemKind, status: SprintStatus)
        -> Result<()>;

    /// Persist sprint membership (or clear it with `None`).
    fn assign_to_sprint(&mut self, id: &str, kind: ItemKind, sprint: Option<&str>)
        -> Result<()>;

    /// Make one sprint current, clearing the flag on all others first.
    /// Implementations must make the two steps atomic.
    fn set_current_sprint(&mut self, id: &str) -> Result<()>;

    /// Load persisted UI state (selection + view), if any.
    fn load_ui_state(&self) -> Result<Option<UiState>>;

    /// Persist UI state between invocations.
    fn save_ui_state(&mut self, ui: &UiState) -> Result<()>;

    /// Get the storage location description (for display purposes).
    fn location(&self) -> String;

    /// Get the backend type name.
    fn store_type(&self) -> &'static str;
}

/// Open the configured store for a workspace.
///
/// `TL_REMOTE` selects the HTTP backend; otherwise the local SQLite store
/// is opened (and created on first use).
pub fn open_default_store(workspace: &Path) -> Result<Box<dyn RemoteStore>> {
    if let Ok(url) = std::env::var("TL_REMOTE") {
        if !url.trim().is_empty() {
            return Ok(Box::new(HttpStore::new(url)));
        }
    }
    Ok(Box::new(SqliteStore::open(workspace)?))
}

/// Get the storage directory for a workspace.
///
/// Uses a hash of the workspace path to create a unique directory under
/// `~/.local/share/tiller/`. `TL_DATA_DIR` overrides the base directory
/// (used by tests for isolation).
pub fn get_storage_dir(workspace: &Path) -> Result<PathBuf> {
    let data_dir = match std::env::var("TL_DATA_DIR") {
        Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => dirs::data_dir()
            .ok_or_else(|| Error::InvalidInput("Could not determine data directory".to_string()))?
            .join("tiller"),
    };

    let canonical = workspace
        .canonicalize()
        .unwrap_or_else(|_| workspace.to_path_buf());

    let mut hasher = Sha256::new();
    hasher.update(canonical.to_string_lossy().as_bytes());
    let hash = hasher.finalize();
    let hash_hex = format!("{:x}", hash);
    let short_hash = &hash_hex[..12];

    Ok(data_dir.join(short_hash))
}

/// Generate a unique ID for an entity.
///
/// Format: `<prefix>-<8 hex chars>`, e.g. "us-3fa92c1d". The hash mixes the
/// seed with a nanosecond timestamp so independently-generated ids stay
/// globally unique across kinds.
pub fn generate_id(prefix: &str, seed: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(seed.as_bytes());
    hasher.update(
        chrono::Utc::now()
            .timestamp_nanos_opt()
            .unwrap_or(0)
            .to_le_bytes(),
    );
    let hash = hasher.finalize();
    let hash_hex = format!("{:x}", hash);
    format!("{}-{}", prefix, &hash_hex[..8])
}

/// Generate an id for a tree node of the given kind.
pub fn generate_node_id(kind: NodeKind, seed: &str) -> String {
    generate_id(kind.prefix(), seed)
}

/// Validate that an ID matches the expected `<prefix>-<8 hex>` format.
pub fn validate_id(id: &str, prefix: &str) -> Result<()> {
    if !id.starts_with(&format!("{}-", prefix)) {
        return Err(Error::InvalidInput(format!(
            "ID must start with '{}-', got: {}",
            prefix, id
        )));
    }

    let suffix = &id[prefix.len() + 1..];
    if suffix.len() != 8 || !suffix.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(Error::InvalidInput(format!(
            "ID suffix must be 8 hex characters, got: {}",
            suffix
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_id_format() {
        let id = generate_id("us", "test seed");
        assert!(id.starts_with("us-"));
        assert_eq!(id.len(), 3 + 8);
        validate_id(&id, "us").unwrap();
    }

    #[test]
    fn test_generate_id_uniqueness() {
        let id1 = generate_id("tk", "seed1");
        let id2 = generate_id("tk", "seed2");
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_generate_node_id_uses_kind_prefix() {
        let id = generate_node_id(NodeKind::Epic, "Checkout");
        assert!(id.starts_with("ep-"));
    }

    #[test]
    fn test_validate_id_rejects_bad_prefix() {
        assert!(validate_id("tk-0123abcd", "us").is_err());
        assert!(validate_id("us-0123abcd", "us").is_ok());
    }

    #[test]
    fn test_validate_id_rejects_bad_suffix() {
        assert!(validate_id("us-xyz", "us").is_err());
        assert!(validate_id("us-0123abcg", "us").is_err());
    }

    #[test]
    fn test_storage_dir_is_stable_per_workspace() {
        let tmp = tempfile::tempdir().unwrap();
        let a = get_storage_dir(tmp.path()).unwrap();
        let b = get_storage_dir(tmp.path()).unwrap();
        assert_eq!(a, b);

        let other = tempfile::tempdir().unwrap();
        let c = get_storage_dir(other.path()).unwrap();
        assert_ne!(a, c);
    }
}
