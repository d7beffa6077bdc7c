pub mod checklist;
#[cfg(feature = "desktop")]
mod commands;
pub mod config;
mod error;
pub mod launcher;
pub mod link;
pub mod session;
pub mod view;

pub use checklist::{ChangeState, Definition, DefinitionStore, ItemState, StateStore};
pub use config::AppConfig;
pub use error::{ChecklistError, Result};
pub use session::{ChangeSession, ChecklistApp};
pub use view::{ChecklistView, ItemView, SectionView};

/// Install the global `tracing` subscriber. Honours `RUST_LOG`, defaulting
/// to `info`. Safe to call more than once.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();
}

#[cfg(feature = "desktop")]
pub fn run() {
    init_tracing();

    let config = AppConfig::load().expect("failed to resolve application directories");
    let app = ChecklistApp::start_with_system_opener(&config)
        .expect("checklist definition is missing or invalid");

    tauri::Builder::default()
        .manage(commands::ChecklistState::new(app))
        .invoke_handler(tauri::generate_handler![
            commands::change::load_change,
            commands::change::save_change,
            commands::change::get_checklist,
            commands::change::set_item_checked,
            commands::change::set_item_notes,
            commands::change::list_changes,
            commands::change::get_status,
            commands::launch::open_change_link,
            commands::launch::edit_definition,
            commands::launch::open_state_file,
        ])
        .on_window_event(|window, event| {
            if let tauri::WindowEvent::CloseRequested { .. } = event {
                commands::window::save_on_close(window);
            }
        })
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
