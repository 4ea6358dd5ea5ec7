use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::AnalysisError;

/// Enumerates eligible files below a root folder.
pub struct FolderScanner {
    root: PathBuf,
    allowed_extensions: Vec<String>,
}

impl FolderScanner {
    pub fn new<P: AsRef<Path>>(root: P, allowed_extensions: &[String]) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            allowed_extensions: allowed_extensions
                .iter()
                .map(|ext| normalize_extension(ext))
                .filter(|ext| !ext.is_empty())
                .collect(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether `path` carries one of the allowed extensions (case-insensitive).
    pub fn is_eligible(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| {
                let ext = ext.to_lowercase();
                self.allowed_extensions.iter().any(|allowed| *allowed == ext)
            })
            .unwrap_or(false)
    }

    /// Recursively collects eligible regular files, sorted by path.
    ///
    /// Fails with `InvalidPath` when the root is missing or not a directory.
    /// Unreadable entries below the root are skipped with a warning.
    pub fn scan(&self) -> Result<Vec<PathBuf>, AnalysisError> {
        if !self.root.is_dir() {
            return Err(AnalysisError::InvalidPath(self.root.clone()));
        }

        let mut files = Vec::new();

        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => {
                    return Err(AnalysisError::ScanFailed {
                        path: self.root.clone(),
                        source: e,
                    });
                }
                Err(e) => {
                    warn!("Skipping unreadable entry under {}: {}", self.root.display(), e);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            if self.is_eligible(entry.path()) {
                debug!("Found file: {}", entry.path().display());
                files.push(entry.into_path());
            }
        }

        info!("Scanned {} files in {}", files.len(), self.root.display());
        Ok(files)
    }
}

/// Convenience wrapper around [`FolderScanner::scan`].
pub fn scan<P: AsRef<Path>>(
    root: P,
    allowed_extensions: &[String],
) -> Result<Vec<PathBuf>, AnalysisError> {
    FolderScanner::new(root, allowed_extensions).scan()
}

/// Lowercases an extension and strips a leading dot.
pub fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn exts(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_scan_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        let files = scan(temp_dir.path(), &exts(&["txt"])).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_scan_filters_by_extension() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("a.txt"), b"alpha").unwrap();
        std::fs::write(temp_dir.path().join("b.TXT"), b"beta").unwrap();
        std::fs::write(temp_dir.path().join("c.md"), b"gamma").unwrap();
        std::fs::write(temp_dir.path().join("noext"), b"delta").unwrap();

        let files = scan(temp_dir.path(), &exts(&["txt"])).unwrap();
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_scan_recurses_into_subdirectories() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("one").join("two");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("deep.log"), b"deep").unwrap();
        std::fs::write(temp_dir.path().join("top.txt"), b"top").unwrap();

        let files = scan(temp_dir.path(), &exts(&["txt", ".LOG"])).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.iter().any(|p| p.ends_with("one/two/deep.log")));
    }

    #[test]
    fn test_scan_ignores_directories_named_like_files() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir(temp_dir.path().join("folder.txt")).unwrap();

        let files = scan(temp_dir.path(), &exts(&["txt"])).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_scan_missing_root() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing");

        let err = scan(&missing, &exts(&["txt"])).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidPath(p) if p == missing));
    }

    #[test]
    fn test_scan_root_is_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("a.txt");
        std::fs::write(&file, b"alpha").unwrap();

        let err = scan(&file, &exts(&["txt"])).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidPath(_)));
    }

    #[test]
    fn test_normalize_extension() {
        assert_eq!(normalize_extension(".TxT"), "txt");
        assert_eq!(normalize_extension(" md "), "md");
    }
}
