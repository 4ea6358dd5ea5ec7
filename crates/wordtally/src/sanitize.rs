//! Helpers for keeping full paths out of logs and results.

use std::path::Path;

/// Returns only the filename component of a path (no directory).
///
/// Used for span fields and for `filesProcessed` entries.
pub fn redact_path(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "<unknown>".to_string())
}
