use orfi_domain::{EntryId, MonthKey};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Month not found: {0}")]
    MonthNotFound(MonthKey),
    #[error("Entry not found: {0}")]
    EntryNotFound(EntryId),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Month {0} is closed")]
    MonthClosed(MonthKey),
    #[error("Persistence error: {0}")]
    Persistence(String),
    #[error("Import failed: {0}")]
    Import(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(String),
}

impl CoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        CoreError::Validation(message.into())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Serde(err.to_string())
    }
}
