use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{info, warn};

use crate::checklist::{
    reconcile, ChangeState, Definition, DefinitionStore, StateOrigin, StateStore, StoredChange,
    WindowGeometry,
};
use crate::config::AppConfig;
use crate::error::{ChecklistError, Result};
use crate::launcher::{open_best_effort, Opener, SystemOpener};
use crate::link::change_url;
use crate::view::{ChecklistView, ItemObserver, ItemView};

/// The change request currently open, with its state and view.
pub struct ChangeSession {
    change_id: String,
    definition: Definition,
    state: ChangeState,
    view: ChecklistView,
    state_path: PathBuf,
    restored_window: Option<WindowGeometry>,
}

impl ChangeSession {
    pub fn change_id(&self) -> &str {
        &self.change_id
    }

    pub fn definition(&self) -> &Definition {
        &self.definition
    }

    pub fn state(&self) -> &ChangeState {
        &self.state
    }

    pub fn view(&self) -> &ChecklistView {
        &self.view
    }

    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    /// Saved geometry this load restored. `None` when the change had no
    /// complete geometry and the window should stay where it is.
    pub fn restored_window(&self) -> Option<WindowGeometry> {
        self.restored_window
    }
}

/// Mirrors view edits into the change state and saves it.
struct StateMirror<'a> {
    state: &'a mut ChangeState,
    store: &'a StateStore,
}

impl StateMirror<'_> {
    fn mirror(&mut self, item: &ItemView) -> Result<()> {
        let entry = self.state.item_states.entry(item.id.clone()).or_default();
        item.mirror_into(entry);
        self.store.save(self.state)?;
        Ok(())
    }
}

impl ItemObserver for StateMirror<'_> {
    fn on_checked_changed(&mut self, item: &ItemView) -> Result<()> {
        self.mirror(item)
    }

    fn on_notes_changed(&mut self, item: &ItemView) -> Result<()> {
        self.mirror(item)
    }
}

/// Owns the stores and the single live change session.
///
/// Everything runs synchronously on the caller's thread; the desktop shell
/// wraps the app in a mutex.
pub struct ChecklistApp {
    definitions: DefinitionStore,
    states: StateStore,
    default_url_template: String,
    url_template: String,
    opener: Box<dyn Opener>,
    session: Option<ChangeSession>,
    window: WindowGeometry,
    status: String,
}

impl ChecklistApp {
    pub fn new(config: &AppConfig, opener: Box<dyn Opener>) -> Self {
        Self {
            definitions: DefinitionStore::new(&config.definition_path),
            states: StateStore::new(&config.states_dir),
            default_url_template: config.change_url_template.clone(),
            url_template: config.change_url_template.clone(),
            opener,
            session: None,
            window: WindowGeometry::default(),
            status: String::new(),
        }
    }

    /// Create the app and make sure a usable definition exists.
    ///
    /// A definition that cannot be read or parsed aborts startup.
    pub fn start(config: &AppConfig, opener: Box<dyn Opener>) -> Result<Self> {
        let mut app = Self::new(config, opener);
        let definition = app.definitions.load_or_create()?;
        app.apply_url_template(&definition);
        app.set_status(format!("Ready: {}", definition.title));
        Ok(app)
    }

    pub fn start_with_system_opener(config: &AppConfig) -> Result<Self> {
        Self::start(config, Box::new(SystemOpener::new(config.editor.clone())))
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn session(&self) -> Option<&ChangeSession> {
        self.session.as_ref()
    }

    pub fn view(&self) -> Option<&ChecklistView> {
        self.session.as_ref().map(|s| &s.view)
    }

    /// Geometry the window should use. Updated when a loaded change
    /// carries a complete saved geometry.
    pub fn window(&self) -> WindowGeometry {
        self.window
    }

    pub fn change_url_template(&self) -> &str {
        &self.url_template
    }

    pub fn definition_path(&self) -> &Path {
        self.definitions.path()
    }

    fn set_status(&mut self, status: String) {
        info!("{}", status);
        self.status = status;
    }

    fn apply_url_template(&mut self, definition: &Definition) {
        self.url_template = definition
            .url_template()
            .unwrap_or(&self.default_url_template)
            .to_string();
    }

    /// Open the checklist for `identifier`, replacing any current session.
    pub fn load(&mut self, identifier: &str) -> Result<&ChecklistView> {
        let change_id = identifier.trim();
        if change_id.is_empty() {
            self.set_status(ChecklistError::BlankIdentifier.to_string());
            return Err(ChecklistError::BlankIdentifier);
        }

        let definition = match self.definitions.load() {
            Ok(d) => d,
            Err(e) => {
                self.set_status(e.to_string());
                return Err(e);
            }
        };
        self.apply_url_template(&definition);

        let loaded = self.states.load(change_id, &definition);
        let mut state = loaded.state;
        reconcile(&definition, &mut state);
        let view = ChecklistView::project(&definition, &state);

        let restored_window = Some(state.window).filter(WindowGeometry::is_complete);

        let state_path = match self.states.save(&mut state) {
            Ok(path) => path,
            Err(e) => {
                self.set_status(format!("Could not save {}: {}", change_id, e));
                return Err(e);
            }
        };

        let mut status = format!("Loaded: {}", change_id);
        if loaded.origin == StateOrigin::Recovered {
            status.push_str(" (state file was unreadable; started fresh)");
        }
        self.set_status(status);

        if let Some(geometry) = restored_window {
            self.window = geometry;
        }
        let session = self.session.insert(ChangeSession {
            change_id: change_id.to_string(),
            definition,
            state,
            view,
            state_path,
            restored_window,
        });
        Ok(&session.view)
    }

    /// Persist the current change. Returns `None` when nothing is loaded.
    pub fn save(&mut self) -> Result<Option<PathBuf>> {
        let Some(session) = self.session.as_mut() else {
            self.set_status(ChecklistError::NoChangeLoaded.to_string());
            return Ok(None);
        };

        let path = self.states.save(&mut session.state)?;
        let status = format!("Saved: {}", session.change_id);
        self.set_status(status);
        Ok(Some(path))
    }

    /// Record the live window geometry and save before shutdown.
    pub fn close_window(&mut self, geometry: WindowGeometry) -> Result<()> {
        self.window = geometry;
        if let Some(session) = self.session.as_mut() {
            session.state.window = geometry;
            self.states.save(&mut session.state)?;
            info!("Saved {} on window close", session.change_id);
        }
        Ok(())
    }

    pub fn set_checked(&mut self, item_id: &str, checked: bool) -> Result<bool> {
        let Some(session) = self.session.as_mut() else {
            return Err(ChecklistError::NoChangeLoaded);
        };
        let mut mirror = StateMirror {
            state: &mut session.state,
            store: &self.states,
        };
        session
            .view
            .set_checked(item_id, checked, Utc::now(), &mut mirror)
    }

    pub fn set_notes(&mut self, item_id: &str, notes: &str) -> Result<bool> {
        let Some(session) = self.session.as_mut() else {
            return Err(ChecklistError::NoChangeLoaded);
        };
        let mut mirror = StateMirror {
            state: &mut session.state,
            store: &self.states,
        };
        session.view.set_notes(item_id, notes, &mut mirror)
    }

    /// Open the change-request link for `identifier` in the browser.
    pub fn open_change_link(&mut self, identifier: &str) -> bool {
        let url = match change_url(&self.url_template, identifier) {
            Ok(url) => url,
            Err(e) => {
                self.set_status(e.to_string());
                return false;
            }
        };
        let opened = open_best_effort(self.opener.as_ref(), url.as_str());
        if !opened {
            self.set_status(format!("Could not open {}", url));
        }
        opened
    }

    /// Open the definition file in the editor, creating the starter
    /// template first if it is missing.
    pub fn edit_definition(&mut self) -> bool {
        if let Err(e) = self.definitions.ensure_exists() {
            warn!("Could not create definition file: {}", e);
        }
        let path = self.definitions.path().to_string_lossy().to_string();
        let opened = open_best_effort(self.opener.as_ref(), &path);
        if !opened {
            self.set_status(format!("Could not open {}", path));
        }
        opened
    }

    /// Open the current change's state file in the editor.
    pub fn open_state_file(&mut self) -> bool {
        let Some(session) = self.session.as_ref() else {
            self.set_status(ChecklistError::NoChangeLoaded.to_string());
            return false;
        };
        let path = session.state_path.to_string_lossy().to_string();
        let opened = open_best_effort(self.opener.as_ref(), &path);
        if !opened {
            self.set_status(format!("Could not open {}", path));
        }
        opened
    }

    pub fn list_changes(&self) -> Vec<StoredChange> {
        self.states.list()
    }
}
