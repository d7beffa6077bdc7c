use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{ChecklistError, Result};

pub const APP_DIR_NAME: &str = "change-checklist";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const HOME_ENV_VAR: &str = "CHANGE_CHECKLIST_HOME";
pub const DEFAULT_CHANGE_URL_TEMPLATE: &str = "https://servicedesk.example.com/change?id={id}";

/// Resolved application settings.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub definition_path: PathBuf,
    pub states_dir: PathBuf,
    /// Used for change links unless the definition carries its own template.
    pub change_url_template: String,
    /// Command used to open the definition and state files.
    pub editor: Option<String>,
}

/// On-disk shape of `config.toml`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    definition_path: Option<PathBuf>,
    states_dir: Option<PathBuf>,
    change_url_template: Option<String>,
    editor: Option<String>,
}

impl AppConfig {
    /// Defaults with all files kept under `root`.
    pub fn rooted(root: &Path) -> Self {
        Self {
            definition_path: root.join("checklist.json"),
            states_dir: root.join("changes"),
            change_url_template: DEFAULT_CHANGE_URL_TEMPLATE.to_string(),
            editor: None,
        }
    }

    /// Resolve settings for this machine.
    ///
    /// `CHANGE_CHECKLIST_HOME` wins over the platform data directory, and
    /// `config.toml` (next to the data when rooted, otherwise in the
    /// platform config directory) overrides individual values.
    pub fn load() -> Result<Self> {
        let (root, config_dir) = match std::env::var_os(HOME_ENV_VAR) {
            Some(home) if !home.is_empty() => {
                let home = PathBuf::from(home);
                (home.clone(), home)
            }
            _ => {
                let data = dirs::data_dir()
                    .ok_or_else(|| ChecklistError::Config("No data directory on this platform".into()))?
                    .join(APP_DIR_NAME);
                let config = dirs::config_dir()
                    .map(|d| d.join(APP_DIR_NAME))
                    .unwrap_or_else(|| data.clone());
                (data, config)
            }
        };

        let config = Self::rooted(&root).with_file(&config_dir.join(CONFIG_FILE_NAME))?;
        info!(
            "Using definition {:?} and state directory {:?}",
            config.definition_path, config.states_dir
        );
        Ok(config)
    }

    /// Apply overrides from a `config.toml`, if it exists.
    pub fn with_file(self, path: &Path) -> Result<Self> {
        if !path.is_file() {
            debug!("No config file at {:?}", path);
            return Ok(self);
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| ChecklistError::Config(format!("Failed to read {:?}: {}", path, e)))?;
        self.with_toml(&content)
            .map_err(|e| ChecklistError::Config(format!("{:?}: {}", path, e)))
    }

    fn with_toml(mut self, content: &str) -> std::result::Result<Self, toml::de::Error> {
        let file: ConfigFile = toml::from_str(content)?;
        if let Some(path) = file.definition_path {
            self.definition_path = path;
        }
        if let Some(dir) = file.states_dir {
            self.states_dir = dir;
        }
        if let Some(template) = file.change_url_template.filter(|t| !t.trim().is_empty()) {
            self.change_url_template = template;
        }
        self.editor = file.editor.filter(|e| !e.trim().is_empty()).or(self.editor);
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_rooted_defaults() {
        let config = AppConfig::rooted(Path::new("/data/cc"));
        assert_eq!(config.definition_path, PathBuf::from("/data/cc/checklist.json"));
        assert_eq!(config.states_dir, PathBuf::from("/data/cc/changes"));
        assert_eq!(config.change_url_template, DEFAULT_CHANGE_URL_TEMPLATE);
        assert!(config.editor.is_none());
    }

    #[test]
    fn test_toml_overrides_selected_fields() {
        let config = AppConfig::rooted(Path::new("/data/cc"))
            .with_toml(
                r#"
                change_url_template = "https://cr.example/{id}"
                editor = "code -w"
                "#,
            )
            .unwrap();

        assert_eq!(config.change_url_template, "https://cr.example/{id}");
        assert_eq!(config.editor.as_deref(), Some("code -w"));
        assert_eq!(config.states_dir, PathBuf::from("/data/cc/changes"));
    }

    #[test]
    fn test_missing_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let base = AppConfig::rooted(dir.path());
        let config = base.clone().with_file(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, base);
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "states_dir = [").unwrap();

        let err = AppConfig::rooted(dir.path()).with_file(&path).unwrap_err();
        assert!(matches!(err, ChecklistError::Config(_)));
    }
}
