//! Configuration file discovery and loading

use std::path::{Path, PathBuf};

use super::patchwork_config::PatchworkConfig;
use crate::error::PatchworkError;

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, PatchworkError>;

/// File names searched for, in priority order
pub const CONFIG_FILE_NAMES: &[&str] = &[
    ".patchworkrc.toml",
    ".patchworkrc.json",
    "patchwork.jsonc",
    "patchwork.json",
    "patchwork.yaml",
];

/// Configuration loader for discovering and loading config files
pub struct ConfigLoader;

impl ConfigLoader {
    /// Auto-discover a config file by walking up from `start_path`
    ///
    /// Each directory is searched for [`CONFIG_FILE_NAMES`] in order; the
    /// first match wins. Stops at the filesystem root.
    pub fn auto_discover(start_path: &Path) -> Result<Option<PathBuf>> {
        let mut current = start_path
            .canonicalize()
            .map_err(|e| PatchworkError::config_error(format!("Invalid path: {e}")))?;

        loop {
            for filename in CONFIG_FILE_NAMES {
                let config_path = current.join(filename);
                if config_path.is_file() {
                    tracing::debug!("Found config: {}", config_path.display());
                    return Ok(Some(config_path));
                }
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => break,
            }
        }

        Ok(None)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<PatchworkConfig> {
        let config = PatchworkConfig::load(path)?;
        tracing::info!("Loaded config from: {}", path.display());
        Ok(config)
    }

    /// Load config from `custom_path`, or discover one from `start_dir`
    ///
    /// A missing custom path is an error. When discovery finds nothing the
    /// defaults apply: an absent configuration is a normal setup.
    pub fn load(custom_path: Option<&Path>, start_dir: Option<&Path>) -> Result<PatchworkConfig> {
        if let Some(path) = custom_path {
            if !path.exists() {
                return Err(PatchworkError::config_error(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            return Self::load_from_file(path);
        }

        let search_dir = start_dir.unwrap_or_else(|| Path::new("."));
        match Self::auto_discover(search_dir)? {
            Some(path) => Self::load_from_file(&path),
            None => {
                tracing::debug!(
                    "No config file found from {}, using defaults",
                    search_dir.display()
                );
                Ok(PatchworkConfig::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuleSeverity;
    use std::fs;
    use tempfile::TempDir;

    fn create_temp_config(dir: &Path, filename: &str, content: &str) -> PathBuf {
        let path = dir.join(filename);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_from_file_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_temp_config(
            temp_dir.path(),
            ".patchworkrc.toml",
            r#"
[rules]
RCS1031 = "error"

[options]
blank_line_between_switch_sections = "omit"
"#,
        );

        let config = ConfigLoader::load_from_file(&config_path).unwrap();
        assert_eq!(config.rule_severity("RCS1031"), Some(RuleSeverity::Error));
        assert_eq!(
            config.option("blank_line_between_switch_sections"),
            Some("omit")
        );
    }

    #[test]
    fn test_load_from_file_jsonc() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_temp_config(
            temp_dir.path(),
            "patchwork.jsonc",
            r#"{
                // comments and trailing commas are fine
                "rules": { "RCS0063": "off", },
            }"#,
        );

        let config = ConfigLoader::load_from_file(&config_path).unwrap();
        assert_eq!(config.rule_severity("RCS0063"), Some(RuleSeverity::Off));
    }

    #[test]
    fn test_load_from_file_yaml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_temp_config(
            temp_dir.path(),
            "patchwork.yaml",
            "formatter:\n  indentSize: 2\n",
        );

        let config = ConfigLoader::load_from_file(&config_path).unwrap();
        assert_eq!(config.formatter_config().indent_size(), 2);
    }

    #[test]
    fn test_auto_discover_from_nested_directory() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("src/nested");
        fs::create_dir_all(&nested).unwrap();
        create_temp_config(temp_dir.path(), "patchwork.json", "{}");

        let found = ConfigLoader::auto_discover(&nested).unwrap();
        assert_eq!(found.unwrap().file_name().unwrap(), "patchwork.json");
    }

    #[test]
    fn test_auto_discover_priority() {
        let temp_dir = TempDir::new().unwrap();
        create_temp_config(temp_dir.path(), "patchwork.yaml", "rules: {}\n");
        create_temp_config(temp_dir.path(), "patchwork.json", "{}");
        create_temp_config(temp_dir.path(), ".patchworkrc.toml", "");

        let found = ConfigLoader::auto_discover(temp_dir.path()).unwrap();
        assert_eq!(found.unwrap().file_name().unwrap(), ".patchworkrc.toml");
    }

    #[test]
    fn test_load_without_config_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = ConfigLoader::load(None, Some(temp_dir.path())).unwrap();
        assert_eq!(config, PatchworkConfig::default());
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ConfigLoader::load(Some(Path::new("nonexistent.json")), None);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_invalid_json() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_temp_config(temp_dir.path(), "patchwork.json", "{ invalid json");
        let err = ConfigLoader::load_from_file(&config_path).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Config);
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_temp_config(temp_dir.path(), "patchwork.ini", "");
        assert!(ConfigLoader::load_from_file(&config_path).is_err());
    }
}
