use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Runtime settings. Every field has a default so a missing or partial
/// config file still yields a working setup.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_upload_folder")]
    pub upload_folder: PathBuf,
    #[serde(default = "default_results_folder")]
    pub results_folder: PathBuf,
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: BTreeSet<String>,
    #[serde(default = "default_max_content_length")]
    pub max_content_length: u64,
}

fn default_upload_folder() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_results_folder() -> PathBuf {
    PathBuf::from("results")
}

fn default_allowed_extensions() -> BTreeSet<String> {
    ["docx", "csv", "txt"].iter().map(|e| e.to_string()).collect()
}

fn default_max_content_length() -> u64 {
    16 * 1024 * 1024
}

impl Default for Config {
    fn default() -> Self {
        Self {
            upload_folder: default_upload_folder(),
            results_folder: default_results_folder(),
            allowed_extensions: default_allowed_extensions(),
            max_content_length: default_max_content_length(),
        }
    }
}

impl Config {
    /// Loads settings from a JSON file; absent fields keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = serde_json::from_str(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    /// Defaults with environment overrides for the folder locations.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(folder) = std::env::var("SPLITTER_UPLOAD_FOLDER") {
            config.upload_folder = PathBuf::from(folder);
        }
        if let Ok(folder) = std::env::var("SPLITTER_RESULTS_FOLDER") {
            config.results_folder = PathBuf::from(folder);
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_cover_every_field() {
        let config = Config::default();
        assert_eq!(config.upload_folder, PathBuf::from("uploads"));
        assert_eq!(config.results_folder, PathBuf::from("results"));
        assert!(config.allowed_extensions.contains("docx"));
        assert_eq!(config.max_content_length, 16 * 1024 * 1024);
    }

    #[test]
    fn partial_file_keeps_defaults_for_the_rest() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"results_folder": "out"}"#).unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.results_folder, PathBuf::from("out"));
        assert_eq!(config.upload_folder, PathBuf::from("uploads"));
    }

    #[test]
    fn invalid_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(Config::from_file(&path).is_err());
        assert!(Config::from_file(&dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn environment_overrides_the_folders() {
        std::env::set_var("SPLITTER_UPLOAD_FOLDER", "env_uploads");
        std::env::set_var("SPLITTER_RESULTS_FOLDER", "env_results");
        let config = Config::from_env();
        std::env::remove_var("SPLITTER_UPLOAD_FOLDER");
        std::env::remove_var("SPLITTER_RESULTS_FOLDER");

        assert_eq!(config.upload_folder, PathBuf::from("env_uploads"));
        assert_eq!(config.results_folder, PathBuf::from("env_results"));
    }
}
