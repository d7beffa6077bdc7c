use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::types::{ChangeState, Definition};
use super::writer::write_json_atomic;
use crate::error::{ChecklistError, Result};

pub const STATE_FILE_SUFFIX: &str = ".state.json";

/// How a state document came to be in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StateOrigin {
    /// Parsed from an existing file.
    Existing,
    /// No file yet for this identifier.
    Created,
    /// A file existed but could not be parsed and was replaced by a blank state.
    Recovered,
}

#[derive(Debug, Clone)]
pub struct LoadedState {
    pub state: ChangeState,
    pub origin: StateOrigin,
}

/// A state file found on disk, for the "recent changes" list.
#[derive(Debug, Clone, Serialize)]
pub struct StoredChange {
    pub change_id: String,
    pub path: String,
    pub saved_utc: Option<DateTime<Utc>>,
}

/// Reads and writes one JSON document per change identifier.
pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Storage location for `change_id`, or `None` for a blank identifier.
    ///
    /// Distinct identifiers that sanitize to the same key share a file.
    pub fn path(&self, change_id: &str) -> Option<PathBuf> {
        let key = sanitize_change_id(change_id)?;
        Some(self.dir.join(format!("{}{}", key, STATE_FILE_SUFFIX)))
    }

    /// Load the state for `change_id`, creating a blank one when there is
    /// nothing usable on disk. Never fails: a corrupt file is logged and
    /// replaced in memory by a blank state.
    pub fn load(&self, change_id: &str, definition: &Definition) -> LoadedState {
        let change_id = change_id.trim();
        let blank = || ChangeState::blank(change_id, definition);

        let Some(path) = self.path(change_id) else {
            return LoadedState {
                state: blank(),
                origin: StateOrigin::Created,
            };
        };

        if !path.is_file() {
            debug!("No state file for '{}' at {:?}", change_id, path);
            return LoadedState {
                state: blank(),
                origin: StateOrigin::Created,
            };
        }

        let parsed = std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|content| {
                serde_json::from_str::<ChangeState>(&content).map_err(|e| e.to_string())
            });

        match parsed {
            Ok(mut state) => {
                if state.change_id != change_id {
                    if !state.change_id.is_empty() {
                        warn!(
                            "State file {:?} belongs to '{}', reusing it for '{}'",
                            path, state.change_id, change_id
                        );
                    }
                    state.change_id = change_id.to_string();
                }
                info!(
                    "Loaded state for '{}' ({} item entries) from {:?}",
                    change_id,
                    state.item_states.len(),
                    path
                );
                LoadedState {
                    state,
                    origin: StateOrigin::Existing,
                }
            }
            Err(e) => {
                warn!(
                    "State file {:?} is unreadable ({}); starting '{}' from a blank state",
                    path, e, change_id
                );
                LoadedState {
                    state: blank(),
                    origin: StateOrigin::Recovered,
                }
            }
        }
    }

    /// Stamp `saved_utc` and rewrite the whole document.
    pub fn save(&self, state: &mut ChangeState) -> Result<PathBuf> {
        let path = self
            .path(&state.change_id)
            .ok_or(ChecklistError::BlankIdentifier)?;

        state.saved_utc = Some(Utc::now());
        write_json_atomic(&*state, &path)?;

        debug!("Saved state for '{}' to {:?}", state.change_id, path);
        Ok(path)
    }

    /// Every parseable state file in the store, most recently saved first.
    pub fn list(&self) -> Vec<StoredChange> {
        let mut changes: Vec<StoredChange> = WalkDir::new(&self.dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.file_name().to_string_lossy().ends_with(STATE_FILE_SUFFIX))
            .filter_map(|entry| {
                let path = entry.path();
                let content = std::fs::read_to_string(path).ok()?;
                match serde_json::from_str::<ChangeState>(&content) {
                    Ok(state) => Some(StoredChange {
                        change_id: state.change_id,
                        path: path.to_string_lossy().to_string(),
                        saved_utc: state.saved_utc,
                    }),
                    Err(e) => {
                        debug!("Skipping unreadable state file {:?}: {}", path, e);
                        None
                    }
                }
            })
            .collect();

        changes.sort_by(|a, b| b.saved_utc.cmp(&a.saved_utc));
        changes
    }
}

/// Storage key for an identifier: trimmed, with every character outside
/// `[A-Za-z0-9_-]` replaced by `_`. Blank identifiers have no key.
pub fn sanitize_change_id(change_id: &str) -> Option<String> {
    let trimmed = change_id.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(
        trimmed
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checklist::definition::starter_definition;
    use crate::checklist::types::ItemState;
    use tempfile::TempDir;

    fn create_test_store() -> (StateStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path().join("changes"));
        (store, dir)
    }

    #[test]
    fn test_sanitize_change_id() {
        assert_eq!(sanitize_change_id("  chg/1234  ").as_deref(), Some("chg_1234"));
        assert_eq!(sanitize_change_id("CHG-0001_a").as_deref(), Some("CHG-0001_a"));
        assert_eq!(sanitize_change_id("a b.c:d").as_deref(), Some("a_b_c_d"));
        assert_eq!(sanitize_change_id("é").as_deref(), Some("_"));
        assert_eq!(sanitize_change_id("   "), None);
        assert_eq!(sanitize_change_id(""), None);
    }

    #[test]
    fn test_path_uses_state_suffix() {
        let (store, _dir) = create_test_store();
        let path = store.path(" CHG0001234 ").unwrap();
        assert_eq!(path.file_name().unwrap(), "CHG0001234.state.json");
        assert!(store.path("\t").is_none());
    }

    #[test]
    fn test_load_missing_creates_blank() {
        let (store, _dir) = create_test_store();
        let def = starter_definition();

        let loaded = store.load("  CHG1  ", &def);
        assert_eq!(loaded.origin, StateOrigin::Created);
        assert_eq!(loaded.state.change_id, "CHG1");
        assert_eq!(loaded.state.definition_id, def.definition_id);
        assert!(loaded.state.item_states.is_empty());
        assert!(loaded.state.saved_utc.is_none());
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let (store, _dir) = create_test_store();
        let def = starter_definition();
        let mut state = ChangeState::blank("CHG1", &def);
        let mut item = ItemState::default();
        item.set_checked(true, Utc::now());
        item.notes = "done by ops".to_string();
        state.item_states.insert("pre-001".into(), item.clone());

        let path = store.save(&mut state).unwrap();
        assert!(path.ends_with("CHG1.state.json"));
        assert!(state.saved_utc.is_some());

        let loaded = store.load("CHG1", &def);
        assert_eq!(loaded.origin, StateOrigin::Existing);
        assert_eq!(loaded.state.item("pre-001"), Some(&item));
        assert_eq!(loaded.state.saved_utc, state.saved_utc);
    }

    #[test]
    fn test_corrupt_file_recovers_blank() {
        let (store, _dir) = create_test_store();
        let path = store.path("CHG9").unwrap();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{\"changeId\": \"CHG9\", \"itemStates\": [").unwrap();

        let loaded = store.load("CHG9", &starter_definition());
        assert_eq!(loaded.origin, StateOrigin::Recovered);
        assert_eq!(loaded.state.change_id, "CHG9");
        assert!(loaded.state.item_states.is_empty());
    }

    #[test]
    fn test_collision_rewrites_change_id() {
        let (store, _dir) = create_test_store();
        let def = starter_definition();
        let mut state = ChangeState::blank("chg/1234", &def);
        store.save(&mut state).unwrap();

        let loaded = store.load("chg_1234", &def);
        assert_eq!(loaded.origin, StateOrigin::Existing);
        assert_eq!(loaded.state.change_id, "chg_1234");
    }

    #[test]
    fn test_save_blank_identifier_is_rejected() {
        let (store, _dir) = create_test_store();
        let mut state = ChangeState::blank("  ", &starter_definition());
        assert!(matches!(
            store.save(&mut state),
            Err(ChecklistError::BlankIdentifier)
        ));
    }

    #[test]
    fn test_list_skips_unreadable_and_sorts_newest_first() {
        let (store, _dir) = create_test_store();
        let def = starter_definition();

        let mut newer = ChangeState::blank("CHG-B", &def);
        store.save(&mut newer).unwrap();
        let mut older = ChangeState::blank("CHG-A", &def);
        older.saved_utc = Some(Utc::now() - chrono::Duration::hours(1));
        write_json_atomic(&older, &store.path("CHG-A").unwrap()).unwrap();
        std::fs::write(store.dir().join("junk.state.json"), "nope").unwrap();
        std::fs::write(store.dir().join("notes.txt"), "ignored").unwrap();

        let listed = store.list();
        let ids: Vec<_> = listed.iter().map(|c| c.change_id.as_str()).collect();
        assert_eq!(ids, vec!["CHG-B", "CHG-A"]);
    }

    #[test]
    fn test_list_missing_dir_is_empty() {
        let (store, _dir) = create_test_store();
        assert!(store.list().is_empty());
    }
}
