use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::types::{Definition, Item, Section, DEFAULT_DEFINITION_ID, DEFAULT_DEFINITION_VERSION};
use super::writer::write_json_atomic;
use crate::error::{ChecklistError, Result};

/// Reads the checklist template from a single JSON file.
pub struct DefinitionStore {
    path: PathBuf,
}

impl DefinitionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file, handed to the editor launcher.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse the definition file.
    ///
    /// A missing or malformed file is fatal: there is no safe fallback
    /// template once the user has one on disk.
    pub fn load(&self) -> Result<Definition> {
        if !self.path.is_file() {
            return Err(ChecklistError::ConfigurationMissing(self.path.clone()));
        }

        let content =
            std::fs::read_to_string(&self.path).map_err(|source| ChecklistError::DefinitionRead {
                path: self.path.clone(),
                source,
            })?;
        let definition: Definition =
            serde_json::from_str(&content).map_err(|source| ChecklistError::DefinitionParse {
                path: self.path.clone(),
                source,
            })?;

        debug!(
            "Read definition '{}' v{} ({} sections, {} items) from {:?}",
            definition.definition_id,
            definition.definition_version,
            definition.sections.len(),
            definition.item_count(),
            self.path
        );
        Ok(definition)
    }

    /// Write the starter template if no definition file exists yet.
    ///
    /// Returns `true` when a file was created. An existing file is never
    /// touched, even if it does not parse.
    pub fn ensure_exists(&self) -> Result<bool> {
        if self.path.exists() {
            return Ok(false);
        }
        write_json_atomic(&starter_definition(), &self.path)?;
        info!("Created starter checklist definition at {:?}", self.path);
        Ok(true)
    }

    /// `ensure_exists` followed by `load`.
    pub fn load_or_create(&self) -> Result<Definition> {
        self.ensure_exists()?;
        self.load()
    }
}

/// Built-in two-section template used on first run.
pub fn starter_definition() -> Definition {
    Definition {
        title: "Change Checklist".to_string(),
        change_url_template: None,
        definition_id: DEFAULT_DEFINITION_ID.to_string(),
        definition_version: DEFAULT_DEFINITION_VERSION,
        sections: vec![
            Section {
                name: "Pre-Change".to_string(),
                items: vec![
                    Item::new("pre-001", "Change request approved and scheduled"),
                    Item::new("pre-002", "Backout plan documented and reviewed"),
                    Item::new("pre-003", "Stakeholders notified of the change window"),
                ],
            },
            Section {
                name: "Post-Change".to_string(),
                items: vec![
                    Item::new("post-001", "Service health verified after the change"),
                    Item::new("post-002", "Monitoring shows no new alerts"),
                    Item::new("post-003", "Change request updated and closed"),
                ],
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_definition_is_configuration_error() {
        let dir = TempDir::new().unwrap();
        let store = DefinitionStore::new(dir.path().join("checklist.json"));

        let err = store.load().unwrap_err();
        assert!(matches!(err, ChecklistError::ConfigurationMissing(_)));
    }

    #[test]
    fn test_malformed_definition_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("checklist.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = DefinitionStore::new(&path).load().unwrap_err();
        assert!(matches!(err, ChecklistError::DefinitionParse { .. }));
    }

    #[test]
    fn test_ensure_exists_writes_starter_once() {
        let dir = TempDir::new().unwrap();
        let store = DefinitionStore::new(dir.path().join("checklist.json"));

        assert!(store.ensure_exists().unwrap());
        let def = store.load().unwrap();
        assert_eq!(def, starter_definition());
        assert_eq!(def.sections.len(), 2);
        assert_eq!(def.sections[0].items.len(), 3);

        assert!(!store.ensure_exists().unwrap());
    }

    #[test]
    fn test_ensure_exists_keeps_broken_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("checklist.json");
        std::fs::write(&path, "broken").unwrap();
        let store = DefinitionStore::new(&path);

        assert!(!store.ensure_exists().unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "broken");
        assert!(store.load_or_create().is_err());
    }

    #[test]
    fn test_url_template_is_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("checklist.json");
        std::fs::write(
            &path,
            r#"{"title":"T","changeUrlTemplate":"https://cr.example/{id}","definitionId":"ops","definitionVersion":4,"sections":[]}"#,
        )
        .unwrap();

        let def = DefinitionStore::new(&path).load().unwrap();
        assert_eq!(def.url_template(), Some("https://cr.example/{id}"));
        assert_eq!(def.definition_id, "ops");
        assert_eq!(def.definition_version, 4);
    }
}
