//! Error types for pgstmt

use thiserror::Error;

/// Result type alias for pgstmt operations
pub type StmtResult<T> = Result<T, StmtError>;

/// Faults raised while describing columns or generating statement text.
///
/// Every fault aborts the current call; nothing is retried or recovered internally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StmtError {
    /// An argument has the wrong kind (not an object, not a string, null, ...)
    #[error("Type error: {0}")]
    Type(String),

    /// An argument has the right kind but unusable content
    #[error("Invalid value: {0}")]
    Value(String),

    /// The request cannot produce a statement (no columns, no table, no rows)
    #[error("{0}")]
    Unsatisfiable(String),

    /// The formatting primitive could not render a template
    #[error("Format error: {0}")]
    Format(String),
}

impl StmtError {
    /// Create an invalid-input-shape error
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::Type(message.into())
    }

    /// Create an invalid-value error
    pub fn value(message: impl Into<String>) -> Self {
        Self::Value(message.into())
    }

    /// Create an unsatisfiable-request error
    pub fn unsatisfiable(message: impl Into<String>) -> Self {
        Self::Unsatisfiable(message.into())
    }

    /// Create a formatting error
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format(message.into())
    }

    /// The bare message, without the category prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Type(m) | Self::Value(m) | Self::Unsatisfiable(m) | Self::Format(m) => m,
        }
    }

    /// Check if this is an invalid-input-shape error
    pub fn is_type_error(&self) -> bool {
        matches!(self, Self::Type(_))
    }

    /// Check if this is an invalid-value error
    pub fn is_value_error(&self) -> bool {
        matches!(self, Self::Value(_))
    }

    /// Check if this is an unsatisfiable-request error
    pub fn is_unsatisfiable(&self) -> bool {
        matches!(self, Self::Unsatisfiable(_))
    }

    /// Check if this is a formatting error
    pub fn is_format_error(&self) -> bool {
        matches!(self, Self::Format(_))
    }
}
