//! Action logging for Tiller commands.
//!
//! Every CLI invocation is appended as one JSONL entry to a log file under
//! the data directory. Logging never fails a command: any error here is
//! reported as a warning and swallowed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

/// Represents a single action log entry.
#[derive(Debug, Serialize, Deserialize)]
pub struct ActionLog {
    /// ISO 8601 timestamp when the action occurred
    pub timestamp: DateTime<Utc>,

    /// Workspace the command ran against
    pub workspace: String,

    /// Command name (e.g., "task create", "board move")
    pub command: String,

    /// Command arguments as JSON
    pub args: serde_json::Value,

    /// Whether the command succeeded
    pub success: bool,

    /// Error message if the command failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Command execution duration in milliseconds
    pub duration_ms: u64,

    /// User who executed the command
    pub user: String,
}

/// Log an action to the log file.
///
/// Disabled by setting `TL_ACTION_LOG` to `off`, `0`, or `false`.
pub fn log_action(
    workspace: &std::path::Path,
    command: &str,
    args: serde_json::Value,
    success: bool,
    error: Option<String>,
    duration_ms: u64,
) {
    if !enabled() {
        return;
    }

    let entry = ActionLog {
        timestamp: Utc::now(),
        workspace: workspace.to_string_lossy().to_string(),
        command: command.to_string(),
        args: sanitize_args(&args),
        success,
        error,
        duration_ms,
        user: current_user(),
    };

    if let Err(e) = write_log_entry(&entry) {
        eprintln!("Warning: Failed to write action log: {}", e);
    }
}

fn enabled() -> bool {
    match std::env::var("TL_ACTION_LOG") {
        Ok(v) => !matches!(v.to_lowercase().as_str(), "off" | "0" | "false"),
        Err(_) => true,
    }
}

/// The log file path: `<base>/action.log` under `TL_DATA_DIR` or the
/// platform data dir.
fn log_path() -> Option<PathBuf> {
    let base = match std::env::var("TL_DATA_DIR") {
        Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => dirs::data_dir()?.join("tiller"),
    };
    Some(base.join("action.log"))
}

fn write_log_entry(entry: &ActionLog) -> Result<(), Box<dyn std::error::Error>> {
    let Some(path) = log_path() else {
        return Err("Could not determine data directory".into());
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string(entry)?;
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", json)?;
    Ok(())
}

/// Sanitize arguments: redact sensitive keys, truncate long strings,
/// summarize large arrays.
fn sanitize_args(args: &serde_json::Value) -> serde_json::Value {
    match args {
        serde_json::Value::Object(map) => {
            let mut sanitized = serde_json::Map::new();
            for (key, value) in map {
                let key_lower = key.to_lowercase();
                if key_lower.contains("password")
                    || key_lower.contains("token")
                    || key_lower.contains("secret")
                {
                    sanitized.insert(
                        key.clone(),
                        serde_json::Value::String("[REDACTED]".to_string()),
                    );
                } else {
                    sanitized.insert(key.clone(), sanitize_args(value));
                }
            }
            serde_json::Value::Object(sanitized)
        }
        serde_json::Value::Array(arr) => {
            if arr.len() > 10 {
                serde_json::Value::String(format!("[Array with {} items]", arr.len()))
            } else {
                serde_json::Value::Array(arr.iter().map(sanitize_args).collect())
            }
        }
        serde_json::Value::String(s) => {
            if s.len() > 100 {
                serde_json::Value::String(format!("{}... ({} chars)", &s[..97], s.len()))
            } else {
                args.clone()
            }
        }
        _ => args.clone(),
    }
}

/// Get the current user's username.
fn current_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}
