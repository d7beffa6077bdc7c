use tracing::debug;

use super::types::{ChangeState, Definition, ItemState};

/// Insert a default entry for `item_id` if the state has none.
/// Returns whether an entry was added.
pub fn ensure_item_state(state: &mut ChangeState, item_id: &str) -> bool {
    if state.item_states.contains_key(item_id) {
        return false;
    }
    state
        .item_states
        .insert(item_id.to_string(), ItemState::default());
    true
}

/// Give every item of `definition` an entry in `state`.
///
/// Existing entries are left untouched, including entries for items the
/// definition no longer has. Returns the number of entries added.
pub fn reconcile(definition: &Definition, state: &mut ChangeState) -> usize {
    let added = definition
        .items()
        .filter(|item| ensure_item_state(state, &item.id))
        .count();

    if added > 0 {
        debug!(
            "Added {} item entries to state '{}' for definition '{}' v{}",
            added, state.change_id, definition.definition_id, definition.definition_version
        );
    }
    added
}
