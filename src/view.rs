//! Read model the UI binds to.
//!
//! Each definition item is paired with its persisted state to produce an
//! [`ItemView`]. Edits go through [`ChecklistView`], which updates the view,
//! notifies an [`ItemObserver`] so the backing state can be mirrored and
//! saved, and then refreshes the section progress line.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::checklist::{ChangeState, Definition, Item, ItemState};
use crate::error::{ChecklistError, Result};

pub const NOT_CHECKED_LABEL: &str = "Not checked yet";

/// Receives item edits after the view has applied them.
pub trait ItemObserver {
    fn on_checked_changed(&mut self, item: &ItemView) -> Result<()>;
    fn on_notes_changed(&mut self, item: &ItemView) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemView {
    pub id: String,
    pub text: String,
    pub link_text: String,
    pub link_url: String,
    pub has_link: bool,
    pub is_checked: bool,
    pub notes: String,
    pub checked_utc: Option<DateTime<Utc>>,
    pub checked_label: String,
}

impl ItemView {
    pub fn project(item: &Item, state: &ItemState) -> Self {
        Self {
            id: item.id.clone(),
            text: item.text.clone(),
            link_text: item.link_text.clone(),
            link_url: item.link_url.clone(),
            has_link: item.has_link(),
            is_checked: state.is_checked,
            notes: state.notes.clone(),
            checked_utc: state.checked_utc,
            checked_label: checked_label(state.is_checked, state.checked_utc),
        }
    }

    /// Returns whether the value changed. The transition itself is
    /// [`ItemState::set_checked`].
    fn apply_checked(&mut self, checked: bool, now: DateTime<Utc>) -> bool {
        let mut transition = ItemState {
            is_checked: self.is_checked,
            checked_utc: self.checked_utc,
            notes: String::new(),
        };
        if !transition.set_checked(checked, now) {
            return false;
        }
        self.is_checked = transition.is_checked;
        self.checked_utc = transition.checked_utc;
        self.checked_label = checked_label(self.is_checked, self.checked_utc);
        true
    }

    /// Copy the editable fields into the persisted state.
    pub fn mirror_into(&self, state: &mut ItemState) {
        state.is_checked = self.is_checked;
        state.checked_utc = self.checked_utc;
        state.notes.clone_from(&self.notes);
    }
}

pub fn checked_label(is_checked: bool, checked_utc: Option<DateTime<Utc>>) -> String {
    match (is_checked, checked_utc) {
        (false, _) => NOT_CHECKED_LABEL.to_string(),
        (true, None) => "Checked".to_string(),
        (true, Some(at)) => format!("Checked: {}", at.to_rfc3339_opts(SecondsFormat::Secs, true)),
    }
}

pub fn progress_label(checked: usize, total: usize) -> String {
    format!("Progress: {} / {} completed", checked, total)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionView {
    pub name: String,
    pub items: Vec<ItemView>,
    pub checked: usize,
    pub total: usize,
    pub progress: String,
}

impl SectionView {
    fn new(name: String, items: Vec<ItemView>) -> Self {
        let mut section = Self {
            name,
            items,
            checked: 0,
            total: 0,
            progress: String::new(),
        };
        section.refresh_progress();
        section
    }

    pub fn refresh_progress(&mut self) {
        self.total = self.items.len();
        self.checked = self.items.iter().filter(|i| i.is_checked).count();
        self.progress = progress_label(self.checked, self.total);
    }

    pub fn item(&self, item_id: &str) -> Option<&ItemView> {
        self.items.iter().find(|i| i.id == item_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChecklistView {
    pub title: String,
    pub sections: Vec<SectionView>,
}

impl ChecklistView {
    /// Build the view from a reconciled state.
    ///
    /// Items without a state entry project as unchecked; reconciliation
    /// normally guarantees every item has one.
    pub fn project(definition: &Definition, state: &ChangeState) -> Self {
        let default_state = ItemState::default();
        let sections = definition
            .sections
            .iter()
            .map(|section| {
                let items = section
                    .items
                    .iter()
                    .map(|item| {
                        ItemView::project(item, state.item(&item.id).unwrap_or(&default_state))
                    })
                    .collect();
                SectionView::new(section.name.clone(), items)
            })
            .collect();

        Self {
            title: definition.title.clone(),
            sections,
        }
    }

    pub fn section(&self, name: &str) -> Option<&SectionView> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn item(&self, item_id: &str) -> Option<&ItemView> {
        self.sections.iter().find_map(|s| s.item(item_id))
    }

    pub fn checked_count(&self) -> usize {
        self.sections.iter().map(|s| s.checked).sum()
    }

    pub fn total_count(&self) -> usize {
        self.sections.iter().map(|s| s.total).sum()
    }

    /// Progress line across all sections.
    pub fn progress(&self) -> String {
        progress_label(self.checked_count(), self.total_count())
    }

    fn locate(&self, item_id: &str) -> Result<(usize, usize)> {
        self.sections
            .iter()
            .enumerate()
            .find_map(|(si, s)| s.items.iter().position(|i| i.id == item_id).map(|ii| (si, ii)))
            .ok_or_else(|| ChecklistError::UnknownItem(item_id.to_string()))
    }

    /// Check or uncheck an item.
    ///
    /// On a real transition the observer is notified and the section
    /// progress is recomputed. Returns whether anything changed.
    pub fn set_checked(
        &mut self,
        item_id: &str,
        checked: bool,
        now: DateTime<Utc>,
        observer: &mut dyn ItemObserver,
    ) -> Result<bool> {
        let (si, ii) = self.locate(item_id)?;
        let section = &mut self.sections[si];
        if !section.items[ii].apply_checked(checked, now) {
            return Ok(false);
        }

        let notified = observer.on_checked_changed(&section.items[ii]);
        section.refresh_progress();
        notified.map(|_| true)
    }

    /// Replace an item's notes. Returns whether anything changed.
    pub fn set_notes(
        &mut self,
        item_id: &str,
        notes: &str,
        observer: &mut dyn ItemObserver,
    ) -> Result<bool> {
        let (si, ii) = self.locate(item_id)?;
        let item = &mut self.sections[si].items[ii];
        if item.notes == notes {
            return Ok(false);
        }
        item.notes = notes.to_string();

        observer.on_notes_changed(item)?;
        Ok(true)
    }
}
