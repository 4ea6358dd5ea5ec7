//! Merges per-file statistics into a job summary.
//!
//! Completion order of file tasks is arbitrary, so inputs are first sorted by
//! path. Frequency ties are then broken by the position at which a word was
//! first seen in that order, which makes the top list reproducible.

use std::cmp::Reverse;

use crate::engine::job::AnalysisResults;
use crate::worker::analyzer::{FileAnalysisResult, WordFrequency};

/// Size of the most-frequent-words list.
pub const TOP_WORDS: usize = 10;

/// Totals before the top list is cut.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub total_words: u64,
    pub total_lines: u64,
    pub word_frequency: WordFrequency,
    pub files_processed: Vec<String>,
}

/// Sums totals and merges frequency maps over `results`.
pub fn summarize(results: &[FileAnalysisResult]) -> Summary {
    let mut ordered: Vec<&FileAnalysisResult> = results.iter().collect();
    ordered.sort_by(|a, b| a.path.cmp(&b.path));

    let mut summary = Summary::default();
    for result in ordered {
        summary.total_words += result.total_words;
        summary.total_lines += result.total_lines;
        for (word, count) in result.word_frequency.iter() {
            summary.word_frequency.add_count(word, count);
        }
        summary.files_processed.push(result.file_name.clone());
    }
    summary
}

/// Picks the `limit` most frequent words; ties keep first-seen order.
pub fn top_words(frequency: &WordFrequency, limit: usize) -> Vec<String> {
    let mut entries: Vec<(usize, &str, u64)> = frequency
        .iter()
        .enumerate()
        .map(|(position, (word, count))| (position, word, count))
        .collect();

    entries.sort_by_key(|&(position, _, count)| (Reverse(count), position));

    entries
        .into_iter()
        .take(limit)
        .map(|(_, word, _)| word.to_string())
        .collect()
}

/// Builds the job-level results from every file's statistics.
pub fn aggregate(results: &[FileAnalysisResult]) -> AnalysisResults {
    let summary = summarize(results);
    AnalysisResults {
        total_words: summary.total_words,
        total_lines: summary.total_lines,
        most_frequent_words: top_words(&summary.word_frequency, TOP_WORDS),
        files_processed: summary.files_processed,
    }
}
