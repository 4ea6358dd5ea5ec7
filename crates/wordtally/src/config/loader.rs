use std::path::Path;

use crate::config::schema::Config;
use crate::error::ConfigError;
use crate::worker::scanner::normalize_extension;

const SCHEMA_JSON: &str = include_str!("../../schema/config-v1.json");

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let config: Config = serde_json::from_value(json_value)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    if config.file_extensions.is_empty() {
        return Err(ConfigError::Validation {
            message: "At least one file extension is required".to_string(),
        });
    }

    for ext in &config.file_extensions {
        let normalized = normalize_extension(ext);
        if normalized.is_empty() {
            return Err(ConfigError::InvalidExtension {
                extension: ext.clone(),
                reason: "Extension is empty".to_string(),
            });
        }
        if normalized.contains(['/', '\\', '.']) {
            return Err(ConfigError::InvalidExtension {
                extension: ext.clone(),
                reason: "Extension must be a single path component without dots".to_string(),
            });
        }
    }

    if config.max_concurrent_files == Some(0) {
        return Err(ConfigError::Validation {
            message: "max_concurrent_files must be at least 1".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_valid_config() {
        let config_json = r#"
        {
            "version": "1.0",
            "root_directory": "/texts",
            "file_extensions": ["txt", ".MD"],
            "max_concurrent_files": 8,
            "file_delay_ms": 5
        }
        "#;

        let config = load_config_from_str(config_json).unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.root_directory, "/texts");
        assert_eq!(config.file_extensions, vec!["txt", ".MD"]);
        assert_eq!(config.max_concurrent_files, Some(8));
        assert_eq!(config.file_delay_ms, 5);
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wordtally.json");
        std::fs::write(&path, r#"{"version": "1.0", "root_directory": "/texts"}"#).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.root_directory, "/texts");
    }

    #[test]
    fn test_missing_file() {
        let result = load_config("/definitely/not/here.json");
        assert!(matches!(result, Err(ConfigError::ReadFile { .. })));
    }

    #[test]
    fn test_invalid_version() {
        let result = load_config_from_str(r#"{"version": "2.0", "root_directory": "/texts"}"#);
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_schema_rejects_unknown_field() {
        let result = load_config_from_str(
            r#"{"version": "1.0", "root_directory": "/texts", "ocr": true}"#,
        );
        assert!(matches!(result, Err(ConfigError::SchemaValidation { .. })));
    }

    #[test]
    fn test_schema_rejects_zero_concurrency() {
        let result = load_config_from_str(
            r#"{"version": "1.0", "root_directory": "/texts", "max_concurrent_files": 0}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_extension_list() {
        let result = load_config_from_str(
            r#"{"version": "1.0", "root_directory": "/texts", "file_extensions": []}"#,
        );
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_invalid_extension() {
        let result = load_config_from_str(
            r#"{"version": "1.0", "root_directory": "/texts", "file_extensions": ["tar.gz"]}"#,
        );
        assert!(matches!(result, Err(ConfigError::InvalidExtension { .. })));
    }

    #[test]
    fn test_malformed_json() {
        let result = load_config_from_str("{ not json");
        assert!(matches!(result, Err(ConfigError::ParseJson(_))));
    }
}
