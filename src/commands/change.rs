use serde::Serialize;
use tauri::State;
use tracing::info;

use super::window::apply_geometry;
use super::ChecklistState;
use crate::checklist::StoredChange;
use crate::view::ChecklistView;

/// What the UI needs after a change is loaded.
#[derive(Debug, Clone, Serialize)]
pub struct LoadedChange {
    pub change_id: String,
    pub view: ChecklistView,
    pub state_path: String,
    pub status: String,
}

#[tauri::command]
pub fn load_change(
    window: tauri::Window,
    state: State<'_, ChecklistState>,
    change_id: String,
) -> Result<LoadedChange, String> {
    let mut app = state.lock()?;
    app.load(&change_id)?;

    let session = app
        .session()
        .ok_or_else(|| "Change did not load".to_string())?;
    if let Some(geometry) = session.restored_window() {
        apply_geometry(&window, geometry);
    }
    Ok(LoadedChange {
        change_id: session.change_id().to_string(),
        view: session.view().clone(),
        state_path: session.state_path().to_string_lossy().to_string(),
        status: app.status().to_string(),
    })
}

#[tauri::command]
pub fn save_change(state: State<'_, ChecklistState>) -> Result<String, String> {
    let mut app = state.lock()?;
    app.save()?;
    Ok(app.status().to_string())
}

#[tauri::command]
pub fn get_checklist(state: State<'_, ChecklistState>) -> Result<Option<ChecklistView>, String> {
    let app = state.lock()?;
    Ok(app.view().cloned())
}

/// Returns the refreshed view so the UI can redraw labels and progress.
#[tauri::command]
pub fn set_item_checked(
    state: State<'_, ChecklistState>,
    item_id: String,
    checked: bool,
) -> Result<Option<ChecklistView>, String> {
    let mut app = state.lock()?;
    if app.set_checked(&item_id, checked)? {
        info!("Item {} set to {}", item_id, if checked { "checked" } else { "unchecked" });
    }
    Ok(app.view().cloned())
}

#[tauri::command]
pub fn set_item_notes(
    state: State<'_, ChecklistState>,
    item_id: String,
    notes: String,
) -> Result<(), String> {
    let mut app = state.lock()?;
    app.set_notes(&item_id, &notes)?;
    Ok(())
}

#[tauri::command]
pub fn list_changes(state: State<'_, ChecklistState>) -> Result<Vec<StoredChange>, String> {
    let app = state.lock()?;
    Ok(app.list_changes())
}

#[tauri::command]
pub fn get_status(state: State<'_, ChecklistState>) -> Result<String, String> {
    let app = state.lock()?;
    Ok(app.status().to_string())
}
