use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Duplicate record id in batch: {0}")]
    DuplicateRecordId(String),
    #[error("Record not found: {0}")]
    RecordNotFound(String),
    #[error("Record {id} is invalid: {}", errors.join("; "))]
    InvalidRecord { id: String, errors: Vec<String> },
    #[error("Book not found: {0}")]
    BookNotFound(String),
    #[error("Session not started")]
    SessionNotStarted,
    #[error("Unsupported schema v{found}; newest supported is v{supported}")]
    UnsupportedSchema { found: u8, supported: u8 },
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Serialization error: {0}")]
    Serde(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
