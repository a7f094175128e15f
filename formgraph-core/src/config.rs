use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::graph::DEFAULT_PDF_NODE_MARKER;

/// Environment variable overriding the config file location
pub const CONFIG_ENV: &str = "FORMGRAPH_CONFIG";

/// Environment variable naming the document to open
pub const DOCUMENT_ENV: &str = "FORMGRAPH_DOCUMENT";

/// User settings for the editor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Document opened when no path is given
    #[serde(default = "default_document")]
    pub default_document: String,

    /// Keep `/` in sanitized identifiers
    #[serde(default = "default_true")]
    pub preserve_slashes: bool,

    /// Style marker identifying PDF nodes
    #[serde(default = "default_pdf_marker")]
    pub pdf_node_marker: String,

    /// Default log filter when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_document() -> String {
    "form.yaml".to_string()
}

fn default_true() -> bool {
    true
}

fn default_pdf_marker() -> String {
    DEFAULT_PDF_NODE_MARKER.to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            default_document: default_document(),
            preserve_slashes: true,
            pdf_node_marker: default_pdf_marker(),
            log_level: default_log_level(),
        }
    }
}

impl EditorConfig {
    /// Loads the config from the provided path
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))
    }

    /// Loads the config, falling back to defaults when the file is missing
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save the config to the specified path
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(&self)?;

        // Ensure parent directories exist
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write config to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Creates a default config file if it doesn't exist
    pub fn create_default<P: AsRef<Path>>(path: P) -> Result<()> {
        if path.as_ref().exists() {
            return Ok(());
        }
        Self::default().save(path)
    }

    /// Picks the document path: explicit flag, then FORMGRAPH_DOCUMENT, then
    /// the configured default
    pub fn resolve_document_path(&self, explicit: Option<&Path>) -> PathBuf {
        if let Some(path) = explicit {
            return path.to_path_buf();
        }
        if let Ok(path) = std::env::var(DOCUMENT_ENV) {
            if !path.trim().is_empty() {
                return PathBuf::from(path);
            }
        }
        PathBuf::from(&self.default_document)
    }
}

/// Gets the path to the config file
pub fn get_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        return Ok(PathBuf::from(path));
    }

    let base = dirs::config_dir()
        .or_else(dirs::home_dir)
        .context("Failed to determine config directory")?;

    Ok(base.join("formgraph").join("config.yaml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_default_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("formgraph").join("config.yaml");

        EditorConfig::create_default(&path).unwrap();
        let config = EditorConfig::load(&path).unwrap();
        assert_eq!(config, EditorConfig::default());
        assert!(config.preserve_slashes);
        assert_eq!(config.pdf_node_marker, "pdfNode");
    }

    #[test]
    fn test_create_default_keeps_existing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "default_document: intake.yaml\n").unwrap();

        EditorConfig::create_default(&path).unwrap();
        let config = EditorConfig::load(&path).unwrap();
        assert_eq!(config.default_document, "intake.yaml");
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = TempDir::new().unwrap();
        let config = EditorConfig::load_or_default(dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config, EditorConfig::default());
    }

    #[test]
    fn test_explicit_document_path_wins() {
        let config = EditorConfig::default();
        assert_eq!(
            config.resolve_document_path(Some(Path::new("custom.yaml"))),
            PathBuf::from("custom.yaml")
        );
    }
}
