pub mod analyzer;
pub mod scanner;

pub use analyzer::{FileAnalysisResult, FileAnalyzer, WordFrequency};
pub use scanner::FolderScanner;
