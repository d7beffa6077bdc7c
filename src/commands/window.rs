use tauri::{Manager, PhysicalPosition, PhysicalSize, Runtime, Window};
use tracing::warn;

use super::ChecklistState;
use crate::checklist::WindowGeometry;

/// Move and resize the window to a saved geometry, if it is complete.
pub fn apply_geometry<R: Runtime>(window: &Window<R>, geometry: WindowGeometry) {
    let (Some(top), Some(left), Some(width), Some(height)) =
        (geometry.top, geometry.left, geometry.width, geometry.height)
    else {
        return;
    };

    if let Err(e) = window.set_position(PhysicalPosition::new(left as i32, top as i32)) {
        warn!("Failed to restore window position: {}", e);
    }
    if let Err(e) = window.set_size(PhysicalSize::new(width as u32, height as u32)) {
        warn!("Failed to restore window size: {}", e);
    }
}

fn current_geometry<R: Runtime>(window: &Window<R>) -> Option<WindowGeometry> {
    let position = window.outer_position().ok()?;
    let size = window.outer_size().ok()?;
    Some(WindowGeometry::new(
        f64::from(position.y),
        f64::from(position.x),
        f64::from(size.width),
        f64::from(size.height),
    ))
}

/// Save the current change with the live window geometry before closing.
pub fn save_on_close<R: Runtime>(window: &Window<R>) {
    let Some(geometry) = current_geometry(window) else {
        warn!("Could not read window geometry on close");
        return;
    };

    let state = window.state::<ChecklistState>();
    let result = state.lock().and_then(|mut app| app.close_window(geometry).map_err(String::from));
    if let Err(e) = result {
        warn!("Failed to save change on close: {}", e);
    }
}
