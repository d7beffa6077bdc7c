use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChecklistError {
    #[error("Checklist definition not found at {0:?}")]
    ConfigurationMissing(PathBuf),

    #[error("Could not read checklist definition {path:?}: {source}")]
    DefinitionRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Checklist definition {path:?} is not valid: {source}")]
    DefinitionParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Enter a Change Request identifier first")]
    BlankIdentifier,

    #[error("No change loaded")]
    NoChangeLoaded,

    #[error("Unknown checklist item: {0}")]
    UnknownItem(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Persist error: {0:#}")]
    Persist(#[from] anyhow::Error),
}

impl From<ChecklistError> for String {
    fn from(err: ChecklistError) -> Self {
        err.to_string()
    }
}

pub type Result<T, E = ChecklistError> = std::result::Result<T, E>;
