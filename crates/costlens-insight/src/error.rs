//! Error types for the cost insight module.

use thiserror::Error;

/// Cost insight errors.
#[derive(Error, Debug)]
pub enum InsightError {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error (file reading)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A referenced entity does not exist
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind (e.g., "recommendation")
        entity: &'static str,
        /// Identifier that failed to resolve
        id: i64,
    },

    /// A monetary amount was negative or not a finite number
    #[error("invalid amount: {value}")]
    InvalidAmount {
        /// The rejected value, as supplied
        value: String,
    },

    /// A date string was not valid ISO-8601 (YYYY-MM-DD)
    #[error("invalid date: {value}")]
    InvalidDate {
        /// The rejected value, as supplied
        value: String,
    },

    /// Invalid record line format
    #[error("invalid record format: {0}")]
    InvalidRecordFormat(String),

    /// Migration error
    #[error("migration error: {0}")]
    Migration(String),

    /// Store error
    #[error("store error: {0}")]
    Store(String),

    /// Recommendation generation error
    #[error("generation error: {0}")]
    Generation(String),
}

impl InsightError {
    /// Create a not-found error for a recommendation id.
    pub fn recommendation_not_found(id: i64) -> Self {
        Self::NotFound {
            entity: "recommendation",
            id,
        }
    }

    /// Check if this error means a referenced entity does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, InsightError::NotFound { .. })
    }

    /// Check if this error was caused by rejected caller input.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            InsightError::InvalidAmount { .. }
                | InsightError::InvalidDate { .. }
                | InsightError::InvalidRecordFormat(_)
        )
    }
}

/// Result type for cost insight operations.
pub type Result<T> = std::result::Result<T, InsightError>;
