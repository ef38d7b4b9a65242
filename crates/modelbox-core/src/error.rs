//! The error taxonomy shared by every backend and RPC handler.
//!
//! Kinds map directly onto the error propagation rules: `duplicate` and
//! `duplicate-file` are not really failures (callers observe them via
//! `exists`/`file_id` return values, not a thrown error) but are still
//! named here because the persistence layer needs a way to signal them up
//! from the query-registry probe.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelBoxError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("duplicate: {0}")]
    Duplicate(String),

    #[error("duplicate file: {0}")]
    DuplicateFile(String),

    #[error("validation: {0}")]
    Validation(String),

    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("stream protocol violation: {0}")]
    StreamProtocol(String),

    #[error("trigger evaluation failed: {0}")]
    TriggerEvaluation(String),

    #[error("stale update")]
    StaleUpdate,

    #[error("unimplemented: {0}")]
    Unimplemented(String),
}

impl ModelBoxError {
    /// `true` for conditions that the RPC layer treats as a retryable
    /// transient backend fault rather than a caller mistake.
    pub fn is_storage_unavailable(&self) -> bool {
        matches!(self, ModelBoxError::StorageUnavailable(_))
    }
}

pub type ModelBoxResult<T> = Result<T, ModelBoxError>;

impl From<modelbox_domain::DomainError> for ModelBoxError {
    fn from(e: modelbox_domain::DomainError) -> Self {
        match e {
            modelbox_domain::DomainError::Validation(msg) => ModelBoxError::Validation(msg),
        }
    }
}
