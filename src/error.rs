//! Library error type.
//!
//! Lookups that miss return [`Error::NotFound`]; anything the SQLite layer
//! reports is carried unchanged in [`Error::Storage`].

use crate::notes::validation::ValidationErrors;

/// The kind of record a lookup was for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Card,
    Book,
    TreeNode,
    Review,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Card => "knowledge card",
            Self::Book => "book",
            Self::TreeNode => "tree node",
            Self::Review => "review record",
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{kind} not found: {id}")]
    NotFound { kind: RecordKind, id: String },

    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub fn not_found(kind: RecordKind, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
