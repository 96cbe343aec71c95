pub mod records;
pub mod students;
pub mod subjects;

use std::fmt;

/// Invariant failures surfaced by the collection managers. Mapped to string
/// error codes at the IPC edge.
#[derive(Debug)]
pub enum CollectionError {
    /// Add with an already-present unique key. Nothing is written.
    DuplicateKey { key: String },
    /// Missing or malformed required field. Nothing is written and no
    /// change hint is published.
    Validation { message: String },
    NotFound { message: String },
    Storage(anyhow::Error),
}

impl CollectionError {
    pub fn code(&self) -> &'static str {
        match self {
            CollectionError::DuplicateKey { .. } => "duplicate_key",
            CollectionError::Validation { .. } => "validation_failed",
            CollectionError::NotFound { .. } => "not_found",
            CollectionError::Storage(_) => "storage_failed",
        }
    }

    fn validation(message: impl Into<String>) -> Self {
        CollectionError::Validation {
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        CollectionError::NotFound {
            message: message.into(),
        }
    }
}

impl fmt::Display for CollectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionError::DuplicateKey { key } => write!(f, "duplicate key: {}", key),
            CollectionError::Validation { message } => write!(f, "{}", message),
            CollectionError::NotFound { message } => write!(f, "{}", message),
            CollectionError::Storage(e) => write!(f, "storage failed: {}", e),
        }
    }
}

impl std::error::Error for CollectionError {}

impl From<anyhow::Error> for CollectionError {
    fn from(e: anyhow::Error) -> Self {
        CollectionError::Storage(e)
    }
}
