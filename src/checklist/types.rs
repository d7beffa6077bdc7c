use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_DEFINITION_ID: &str = "default";
pub const DEFAULT_DEFINITION_VERSION: u32 = 1;

/// The checklist template: an ordered list of sections, each holding
/// ordered items. Read from the definition file at the start of every
/// session and never mutated by the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Definition {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_url_template: Option<String>,
    #[serde(
        default = "default_definition_id",
        deserialize_with = "definition_id_or_default"
    )]
    pub definition_id: String,
    #[serde(
        default = "default_definition_version",
        deserialize_with = "definition_version_or_default"
    )]
    pub definition_version: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sections: Vec<Section>,
}

impl Definition {
    /// Every item in display order, across all sections.
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.sections.iter().flat_map(|s| s.items.iter())
    }

    pub fn item_count(&self) -> usize {
        self.sections.iter().map(|s| s.items.len()).sum()
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// The link template carried by the definition, if it is non-blank.
    pub fn url_template(&self) -> Option<&str> {
        self.change_url_template
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub link_text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub link_url: String,
}

impl Item {
    pub fn new(id: &str, text: &str) -> Self {
        Self {
            id: id.to_string(),
            text: text.to_string(),
            link_text: String::new(),
            link_url: String::new(),
        }
    }

    pub fn with_link(mut self, link_text: &str, link_url: &str) -> Self {
        self.link_text = link_text.to_string();
        self.link_url = link_url.to_string();
        self
    }

    /// Both link text and URL must be non-blank for the link to count.
    pub fn has_link(&self) -> bool {
        !self.link_url.trim().is_empty() && !self.link_text.trim().is_empty()
    }
}

/// Persisted progress for one change request.
///
/// `item_states` is keyed by item id. Entries for items that no longer
/// exist in the definition are kept as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeState {
    #[serde(default, deserialize_with = "null_as_default")]
    pub change_id: String,
    #[serde(
        default = "default_definition_id",
        deserialize_with = "definition_id_or_default"
    )]
    pub definition_id: String,
    #[serde(
        default = "default_definition_version",
        deserialize_with = "definition_version_or_default"
    )]
    pub definition_version: u32,
    #[serde(default)]
    pub saved_utc: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub item_states: BTreeMap<String, ItemState>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub window: WindowGeometry,
}

impl ChangeState {
    /// A never-saved state for `change_id`, tagged with the definition's
    /// identity.
    pub fn blank(change_id: &str, definition: &Definition) -> Self {
        Self {
            change_id: change_id.to_string(),
            definition_id: definition.definition_id.clone(),
            definition_version: definition.definition_version,
            saved_utc: None,
            item_states: BTreeMap::new(),
            window: WindowGeometry::default(),
        }
    }

    pub fn item(&self, item_id: &str) -> Option<&ItemState> {
        self.item_states.get(item_id)
    }

    pub fn item_mut(&mut self, item_id: &str) -> Option<&mut ItemState> {
        self.item_states.get_mut(item_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemState {
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_checked: bool,
    #[serde(default)]
    pub checked_utc: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub notes: String,
}

impl ItemState {
    /// Apply a checkbox transition.
    ///
    /// Checking an unchecked item stamps `now`; unchecking clears the
    /// timestamp. Setting the current value again changes nothing.
    /// Returns whether the state changed.
    pub fn set_checked(&mut self, checked: bool, now: DateTime<Utc>) -> bool {
        if self.is_checked == checked {
            return false;
        }
        self.is_checked = checked;
        self.checked_utc = if checked { Some(now) } else { None };
        true
    }
}

/// Last known window placement. Any field may be missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowGeometry {
    #[serde(default)]
    pub top: Option<f64>,
    #[serde(default)]
    pub left: Option<f64>,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
}

impl WindowGeometry {
    pub fn new(top: f64, left: f64, width: f64, height: f64) -> Self {
        Self {
            top: Some(top),
            left: Some(left),
            width: Some(width),
            height: Some(height),
        }
    }

    /// Geometry is only restored when all four values are known.
    pub fn is_complete(&self) -> bool {
        self.top.is_some() && self.left.is_some() && self.width.is_some() && self.height.is_some()
    }
}

fn default_definition_id() -> String {
    DEFAULT_DEFINITION_ID.to_string()
}

fn default_definition_version() -> u32 {
    DEFAULT_DEFINITION_VERSION
}

/// Treat an explicit JSON `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn definition_id_or_default<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(default_definition_id))
}

fn definition_version_or_default<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u32>::deserialize(deserializer)?.unwrap_or(DEFAULT_DEFINITION_VERSION))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_definition_defaults_identity_fields() {
        let json = r#"{"title":"T","sections":[{"name":"S","items":[{"id":"a","text":"A"}]}]}"#;
        let def: Definition = serde_json::from_str(json).unwrap();

        assert_eq!(def.definition_id, "default");
        assert_eq!(def.definition_version, 1);
        assert!(def.change_url_template.is_none());
        assert_eq!(def.sections[0].items[0].link_text, "");
        assert_eq!(def.item_count(), 1);
    }

    #[test]
    fn test_change_state_backfills_null_fields() {
        let json = r#"{
            "changeId": "CHG1",
            "definitionId": null,
            "definitionVersion": null,
            "savedUtc": null,
            "itemStates": null,
            "window": null
        }"#;
        let state: ChangeState = serde_json::from_str(json).unwrap();

        assert_eq!(state.change_id, "CHG1");
        assert_eq!(state.definition_id, "default");
        assert_eq!(state.definition_version, 1);
        assert!(state.item_states.is_empty());
        assert_eq!(state.window, WindowGeometry::default());
    }

    #[test]
    fn test_change_state_wire_names() {
        let mut state = ChangeState::blank(
            "CHG1",
            &serde_json::from_str::<Definition>(r#"{"title":"T","sections":[]}"#).unwrap(),
        );
        state.item_states.insert("pre-001".into(), ItemState::default());
        let value = serde_json::to_value(&state).unwrap();

        assert_eq!(value["changeId"], "CHG1");
        assert_eq!(value["savedUtc"], serde_json::Value::Null);
        assert_eq!(value["itemStates"]["pre-001"]["isChecked"], false);
        assert_eq!(value["itemStates"]["pre-001"]["checkedUtc"], serde_json::Value::Null);
        assert_eq!(value["itemStates"]["pre-001"]["notes"], "");
        assert_eq!(value["window"]["top"], serde_json::Value::Null);
    }

    #[test]
    fn test_set_checked_stamps_and_clears() {
        let first = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let second = Utc.with_ymd_and_hms(2024, 5, 1, 11, 0, 0).unwrap();
        let mut item = ItemState::default();

        assert!(item.set_checked(true, first));
        assert_eq!(item.checked_utc, Some(first));

        // Re-checking an already checked item keeps the original stamp.
        assert!(!item.set_checked(true, second));
        assert_eq!(item.checked_utc, Some(first));

        assert!(item.set_checked(false, second));
        assert!(item.checked_utc.is_none());

        assert!(item.set_checked(true, second));
        assert_eq!(item.checked_utc, Some(second));
    }

    #[test]
    fn test_has_link_requires_both_parts() {
        assert!(!Item::new("a", "A").has_link());
        assert!(!Item::new("a", "A").with_link("  ", "https://x").has_link());
        assert!(!Item::new("a", "A").with_link("Docs", "").has_link());
        assert!(Item::new("a", "A").with_link("Docs", "https://x").has_link());
    }

    #[test]
    fn test_window_geometry_completeness() {
        assert!(!WindowGeometry::default().is_complete());
        let partial = WindowGeometry {
            top: Some(1.0),
            left: Some(2.0),
            width: Some(300.0),
            height: None,
        };
        assert!(!partial.is_complete());
        assert!(WindowGeometry::new(1.0, 2.0, 300.0, 400.0).is_complete());
    }
}
