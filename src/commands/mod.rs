//! Tauri commands. Each one locks the shared [`ChecklistApp`] for the
//! duration of the call, so edits are applied and saved one at a time.

pub mod change;
pub mod launch;
pub mod window;

use std::sync::{Mutex, MutexGuard};

use crate::session::ChecklistApp;

pub struct ChecklistState(Mutex<ChecklistApp>);

impl ChecklistState {
    pub fn new(app: ChecklistApp) -> Self {
        Self(Mutex::new(app))
    }

    pub fn lock(&self) -> Result<MutexGuard<'_, ChecklistApp>, String> {
        self.0.lock().map_err(|e| format!("Checklist state unavailable: {}", e))
    }
}
