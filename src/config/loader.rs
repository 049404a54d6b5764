//! Configuration Loader
//!
//! Handles loading and merging client settings from multiple sources.

use crate::config::settings::{Settings, SettingsPatch};
use crate::error::{ChatError, Result};
use std::path::{Path, PathBuf};

/// Configuration loader with support for multiple sources
pub struct ConfigLoader {
    settings: Settings,
}

impl ConfigLoader {
    /// Create a new config loader and load from default locations
    pub fn new() -> Result<Self> {
        // Pick up a .env file before reading env overrides
        let _ = dotenvy::dotenv();

        let mut loader = Self {
            settings: Settings::default(),
        };

        loader.load_from_default_paths()?;
        loader.settings.apply_env();

        Ok(loader)
    }

    /// Create a loader with a specific config file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let _ = dotenvy::dotenv();

        let mut loader = Self {
            settings: Settings::default(),
        };

        loader.load_from_file(path)?;
        loader.settings.apply_env();

        Ok(loader)
    }

    /// Load configuration from default paths (later paths override earlier)
    fn load_from_default_paths(&mut self) -> Result<()> {
        for path in Self::get_config_paths() {
            if path.exists() {
                self.load_from_file(&path)?;
            }
        }

        Ok(())
    }

    /// Get list of config paths to check
    fn get_config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // 1. Environment variable
        if let Ok(custom_path) = std::env::var("YAPPER_CONFIG_PATH") {
            paths.push(PathBuf::from(custom_path));
        }

        // 2. Current directory
        paths.push(PathBuf::from("yapper.json"));

        // 3. User config directory
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("yapper").join("config.json"));
        }

        // 4. Home directory
        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".yapper").join("config.json"));
        }

        paths
    }

    /// Load configuration from a specific file
    fn load_from_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ChatError::Config(format!("Failed to read {}: {}", path.display(), e)))?;

        let patch: SettingsPatch = serde_json::from_str(&content)
            .map_err(|e| ChatError::Config(format!("Failed to parse {}: {}", path.display(), e)))?;

        self.settings.apply(patch);
        Ok(())
    }

    /// Get the loaded settings
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Take ownership of the settings
    pub fn into_settings(self) -> Settings {
        self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_from_custom_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{
                "base_url": "http://gpu-box:11434",
                "default_model": "llama3.2"
            }}"#
        )
        .unwrap();

        let loader = ConfigLoader::from_path(file.path()).unwrap();
        assert_eq!(loader.settings().base_url, "http://gpu-box:11434");
        assert_eq!(loader.settings().default_model.as_deref(), Some("llama3.2"));
        // Unset fields keep their defaults
        assert_eq!(loader.settings().request_timeout_secs, 300);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = ConfigLoader::from_path("/definitely/not/here.json");
        assert!(matches!(result, Err(ChatError::Config(_))));
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{{ not json").unwrap();

        let result = ConfigLoader::from_path(file.path());
        assert!(matches!(result, Err(ChatError::Config(_))));
    }
}
