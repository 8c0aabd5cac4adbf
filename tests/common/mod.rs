//! Common test utilities for tiller integration tests.
//!
//! Provides `TestEnv` for isolated test environments that don't pollute
//! the user's `~/.local/share/tiller/` directory.

#![allow(dead_code)]

use assert_cmd::Command;
pub use tempfile::TempDir;

/// A test environment with isolated data storage.
///
/// Each `TestEnv` creates two temporary directories:
/// - `workspace`: the directory storage is keyed by
/// - `data_dir`: holds tiller's data (via the `TL_DATA_DIR` env var)
///
/// The `tl()` method returns a `Command` that sets `TL_DATA_DIR`
/// per-invocation, making tests parallel-safe.
pub struct TestEnv {
    pub workspace: TempDir,
    pub data_dir: TempDir,
}

impl TestEnv {
    /// Create a new test environment with isolated directories.
    pub fn new() -> Self {
        Self {
            workspace: TempDir::new().unwrap(),
            data_dir: TempDir::new().unwrap(),
        }
    }

    /// Create a new test environment and initialize tiller.
    pub fn init() -> Self {
        let env = Self::new();
        env.tl().args(["system", "init"]).assert().success();
        env
    }

    /// Get a Command for the tl binary with isolated data directory.
    pub fn tl(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_tl"));
        cmd.current_dir(self.workspace.path());
        cmd.env("TL_DATA_DIR", self.data_dir.path());
        cmd.env_remove("TL_REMOTE");
        cmd.env_remove("TL_WORKSPACE");
        cmd
    }

    /// Run a command expecting success and parse its stdout as JSON.
    pub fn json(&self, args: &[&str]) -> serde_json::Value {
        let output = self.tl().args(args).output().unwrap();
        assert!(
            output.status.success(),
            "command {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
            panic!(
                "command {:?} printed invalid JSON ({}): {}",
                args,
                e,
                String::from_utf8_lossy(&output.stdout)
            )
        })
    }

    /// Create the standard chain product -> feature -> epic -> story -> task,
    /// returning the five ids.
    pub fn chain(&self) -> (String, String, String, String, String) {
        let product = self.json(&["product", "create", "Shop"]);
        let product_id = product["id"].as_str().unwrap().to_string();
        let feature = self.json(&["feature", "create", "Auth", "--product", &product_id]);
        let feature_id = feature["id"].as_str().unwrap().to_string();
        let epic = self.json(&["epic", "create", "Login", "--feature", &feature_id]);
        let epic_id = epic["id"].as_str().unwrap().to_string();
        let story = self.json(&["story", "create", "Sign in", "--epic", &epic_id]);
        let story_id = story["id"].as_str().unwrap().to_string();
        let task = self.json(&["task", "create", "Form", "--story", &story_id]);
        let task_id = task["id"].as_str().unwrap().to_string();
        (product_id, feature_id, epic_id, story_id, task_id)
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
