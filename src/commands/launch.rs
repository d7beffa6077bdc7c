use tauri::State;

use super::ChecklistState;

/// Returns whether the browser was launched; failures only change the status.
#[tauri::command]
pub fn open_change_link(
    state: State<'_, ChecklistState>,
    change_id: String,
) -> Result<bool, String> {
    let mut app = state.lock()?;
    Ok(app.open_change_link(&change_id))
}

#[tauri::command]
pub fn edit_definition(state: State<'_, ChecklistState>) -> Result<bool, String> {
    let mut app = state.lock()?;
    Ok(app.edit_definition())
}

#[tauri::command]
pub fn open_state_file(state: State<'_, ChecklistState>) -> Result<bool, String> {
    let mut app = state.lock()?;
    Ok(app.open_state_file())
}
