pub mod definition;
pub mod reconcile;
pub mod state;
pub mod types;
pub mod writer;

pub use definition::DefinitionStore;
pub use reconcile::{ensure_item_state, reconcile};
pub use state::{sanitize_change_id, LoadedState, StateOrigin, StateStore, StoredChange};
pub use types::{ChangeState, Definition, Item, ItemState, Section, WindowGeometry};
