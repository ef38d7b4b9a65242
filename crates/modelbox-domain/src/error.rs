//! Validation errors raised while constructing domain entities.
//!
//! This is deliberately narrower than `modelbox_core::error::ModelBoxError`:
//! entity constructors only ever fail on malformed input, never on storage.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("validation: {0}")]
    Validation(String),
}

pub type DomainResult<T> = Result<T, DomainError>;
