use url::Url;

use crate::error::{ChecklistError, Result};

/// Placeholder replaced by the change identifier in link templates.
pub const ID_PLACEHOLDER: &str = "{id}";

/// Build the change-request link for `change_id`.
///
/// Every `{id}` in `template` is replaced by the trimmed, percent-encoded
/// identifier. The result must be an absolute URL.
pub fn change_url(template: &str, change_id: &str) -> Result<Url> {
    let id = change_id.trim();
    if id.is_empty() {
        return Err(ChecklistError::BlankIdentifier);
    }

    let raw = template.trim().replace(ID_PLACEHOLDER, &urlencoding::encode(id));
    Url::parse(&raw).map_err(|e| ChecklistError::Config(format!("Invalid change link {}: {}", raw, e)))
}
