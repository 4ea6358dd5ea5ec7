use std::time::Duration;

use crate::config::Config;

/// Engine knobs derived from [`Config`].
#[derive(Debug, Clone)]
pub struct AnalysisSettings {
    pub file_extensions: Vec<String>,
    /// `None` (or zero) spawns one task per file with no limit.
    pub max_concurrent_files: Option<usize>,
    /// Post-file throttle; cut short by cancellation.
    pub file_delay: Duration,
    /// Used for `estimated_completion`.
    pub estimate_per_file: Duration,
}

impl AnalysisSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            file_extensions: config.file_extensions.clone(),
            max_concurrent_files: config.max_concurrent_files,
            file_delay: Duration::from_millis(config.file_delay_ms),
            estimate_per_file: Duration::from_millis(config.estimate_per_file_ms),
        }
    }

    pub fn with_extensions<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            file_extensions: extensions.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            file_extensions: vec!["txt".to_string()],
            max_concurrent_files: None,
            file_delay: Duration::ZERO,
            estimate_per_file: Duration::from_millis(100),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config() {
        let mut config = Config::with_root("/texts");
        config.file_extensions = vec!["md".to_string()];
        config.max_concurrent_files = Some(4);
        config.file_delay_ms = 250;

        let settings = AnalysisSettings::from_config(&config);
        assert_eq!(settings.file_extensions, vec!["md"]);
        assert_eq!(settings.max_concurrent_files, Some(4));
        assert_eq!(settings.file_delay, Duration::from_millis(250));
        assert_eq!(settings.estimate_per_file, Duration::from_millis(100));
    }
}
