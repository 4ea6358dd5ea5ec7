use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::db::default_database_path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    /// Folder analyzed when no explicit path is given.
    pub root_directory: String,
    /// Allow-listed extensions, compared case-insensitively.
    #[serde(default = "default_extensions")]
    pub file_extensions: Vec<String>,
    /// Upper bound on concurrently analyzed files; `None` means unbounded.
    #[serde(default)]
    pub max_concurrent_files: Option<usize>,
    /// Pause after each analyzed file.
    #[serde(default)]
    pub file_delay_ms: u64,
    #[serde(default = "default_estimate_per_file_ms")]
    pub estimate_per_file_ms: u64,
    #[serde(default)]
    pub database_path: Option<String>,
    #[serde(default = "default_progress_channel_capacity")]
    pub progress_channel_capacity: usize,
}

fn default_extensions() -> Vec<String> {
    vec!["txt".to_string()]
}

fn default_estimate_per_file_ms() -> u64 {
    100
}

fn default_progress_channel_capacity() -> usize {
    100
}

impl Config {
    /// A configuration for `root_directory` with every other field defaulted.
    pub fn with_root<S: Into<String>>(root_directory: S) -> Self {
        Self {
            version: "1.0".to_string(),
            root_directory: root_directory.into(),
            file_extensions: default_extensions(),
            max_concurrent_files: None,
            file_delay_ms: 0,
            estimate_per_file_ms: default_estimate_per_file_ms(),
            database_path: None,
            progress_channel_capacity: default_progress_channel_capacity(),
        }
    }

    /// Configured database path, falling back to the per-user default.
    pub fn resolved_database_path(&self) -> Option<PathBuf> {
        self.database_path
            .as_ref()
            .map(PathBuf::from)
            .or_else(default_database_path)
    }
}
