//! Per-file word and line statistics.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::engine::cancellation::{CancellationToken, Checkpoint};
use crate::error::AnalysisError;
use crate::sanitize;

/// Runs of whitespace or ASCII punctuation separate tokens.
static RE_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\s[:punct:]]+").unwrap());

/// Tokens of this many characters or fewer are discarded.
pub const MAX_SHORT_WORD_LEN: usize = 2;

/// Word counts that remember the order in which words first appeared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordFrequency {
    counts: HashMap<String, u64>,
    order: Vec<String>,
}

impl WordFrequency {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, word: &str) {
        self.add_count(word, 1);
    }

    pub fn add_count(&mut self, word: &str, count: u64) {
        match self.counts.get_mut(word) {
            Some(existing) => *existing += count,
            None => {
                self.counts.insert(word.to_string(), count);
                self.order.push(word.to_string());
            }
        }
    }

    pub fn get(&self, word: &str) -> u64 {
        self.counts.get(word).copied().unwrap_or(0)
    }

    /// Number of distinct words.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Words with their counts, in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> + '_ {
        self.order
            .iter()
            .map(move |word| (word.as_str(), self.counts.get(word).copied().unwrap_or(0)))
    }

    /// Plain word → count mapping.
    pub fn to_map(&self) -> HashMap<String, u64> {
        self.counts.clone()
    }
}

/// Statistics for a single file. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAnalysisResult {
    pub file_name: String,
    pub path: PathBuf,
    pub total_words: u64,
    pub total_lines: u64,
    pub word_frequency: WordFrequency,
}

/// Reads files and counts their words and lines.
#[derive(Debug, Clone, Default)]
pub struct FileAnalyzer;

impl FileAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Analyzes one file, polling `token` before and after the read.
    ///
    /// A read failure is returned as `ReadFile`; the supervisor fails the
    /// whole job on it rather than skipping the file.
    pub async fn analyze(
        &self,
        path: &Path,
        token: &CancellationToken,
    ) -> Result<FileAnalysisResult, AnalysisError> {
        token.checkpoint()?;

        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| AnalysisError::ReadFile {
                    path: path.to_path_buf(),
                    source,
                })?;

        token.checkpoint()?;

        Ok(analyze_text(path, &content))
    }
}

/// Computes statistics for already loaded content.
pub fn analyze_text(path: &Path, content: &str) -> FileAnalysisResult {
    let mut word_frequency = WordFrequency::new();
    let mut total_words = 0u64;

    for word in tokenize(content) {
        word_frequency.add(&word);
        total_words += 1;
    }

    FileAnalysisResult {
        file_name: sanitize::redact_path(path),
        path: path.to_path_buf(),
        total_words,
        total_lines: count_lines(content),
        word_frequency,
    }
}

/// Counts lines split on `\r\n`, `\n` or a lone `\r`. The text after the
/// last terminator is a line even when empty, so `""` is one line and
/// `"x\n"` is two.
pub fn count_lines(content: &str) -> u64 {
    let bytes = content.as_bytes();
    let mut terminators = 0u64;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\r' => {
                terminators += 1;
                if bytes.get(i + 1) == Some(&b'\n') {
                    i += 1;
                }
            }
            b'\n' => terminators += 1,
            _ => {}
        }
        i += 1;
    }
    terminators + 1
}

/// Splits `content` into case-folded tokens longer than two characters.
pub fn tokenize(content: &str) -> impl Iterator<Item = String> + '_ {
    RE_SEPARATOR
        .split(content)
        .map(|token| token.to_lowercase())
        .filter(|token| token.chars().count() > MAX_SHORT_WORD_LEN)
}
