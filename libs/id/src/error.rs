//! Error types for identifier parsing and validation.

use thiserror::Error;

/// Errors that can occur when parsing or validating identifiers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdError {
    /// The identifier string is empty.
    #[error("ID cannot be empty")]
    Empty,

    /// The identifier contains whitespace.
    #[error("ID must not contain whitespace: '{0}'")]
    Whitespace(String),

    /// The resource kind name is not recognized.
    #[error("unknown resource kind '{0}'")]
    UnknownKind(String),

    /// A qualified reference is missing the `:` separator.
    #[error("reference missing ':' separator: '{0}'")]
    MissingSeparator(String),

    /// A typed ID was built from a reference of another kind.
    #[error("kind mismatch: expected '{expected}', got '{actual}'")]
    KindMismatch {
        expected: &'static str,
        actual: &'static str,
    },
}

impl IdError {
    /// Returns true if this error indicates the input was empty.
    pub fn is_empty(&self) -> bool {
        matches!(self, IdError::Empty)
    }

    /// Returns true if this error comes from an unparseable kind name.
    pub fn is_kind_error(&self) -> bool {
        matches!(
            self,
            IdError::UnknownKind(_) | IdError::KindMismatch { .. }
        )
    }
}
