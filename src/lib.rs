//! Tiller - a hierarchical product-backlog manager.
//!
//! This library provides the core functionality for the `tl` CLI tool:
//! a five-level backlog tree (Product > Feature > Epic > UserStory > Task)
//! held in a normalized in-memory state engine, with user assignment,
//! sprint planning, and a pluggable best-effort remote store.

pub mod action_log;
pub mod cli;
pub mod commands;
pub mod engine;
pub mod models;
pub mod seed;
pub mod state;
pub mod store;

/// Library-level error type for Tiller operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Not initialized: run `tl system init` first")]
    NotInitialized,

    #[error("Parent not found: {0}")]
    ParentNotFound(String),

    #[error("Not found: {0}")]
    NodeNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Remote sync failed: {0}")]
    RemoteSync(String),
}

/// Result type alias for Tiller operations.
pub type Result<T> = std::result::Result<T, Error>;
