//! Error hierarchy for runstatus
//!
//! Analytic functions never surface these for sparse or missing data; they are
//! used for storage, configuration and date parsing failures, and converted to
//! structured result fields where an analytic needs to report them.

use thiserror::Error;

/// Top-level error type for all runstatus operations
#[derive(Debug, Error)]
pub enum RunStatusError {
    /// Snapshot storage errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Calculation errors
    #[error("Calculation error: {0}")]
    Calculation(#[from] CalculationError),

    /// Input rejected at the boundary
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// JSON encoding or decoding failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Snapshot storage errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Opening the SQLite file failed
    #[error("Database connection failed: {reason}")]
    ConnectionFailed { reason: String },

    /// A statement failed to execute
    #[error("Query failed: {0}")]
    QueryFailed(#[from] rusqlite::Error),

    /// A stored snapshot payload could not be encoded or decoded
    #[error("Corrupt payload in {table}: {reason}")]
    CorruptPayload { table: String, reason: String },

    /// Record not found
    #[error("Record not found: {table}.{id}")]
    NotFound { table: String, id: String },
}

/// Calculation errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CalculationError {
    /// Fewer observations than the analytic needs
    #[error("Insufficient data for {calculation}: {reason}")]
    InsufficientData { calculation: String, reason: String },

    /// Parameter outside the range the calculation is defined for
    #[error("Invalid parameter for {calculation}: {parameter}={value}")]
    InvalidParameter {
        calculation: String,
        parameter: String,
        value: String,
    },

    /// Division by zero
    #[error("Division by zero in {calculation}")]
    DivisionByZero { calculation: String },

    /// Date text that could not be parsed
    #[error("Invalid date '{value}', expected YYYY-MM-DD")]
    MalformedDate { value: String },
}

/// Result type alias for runstatus operations
pub type Result<T> = std::result::Result<T, RunStatusError>;

impl RunStatusError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RunStatusError::Database(DatabaseError::ConnectionFailed { .. })
                | RunStatusError::Io(_)
        )
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            RunStatusError::Database(DatabaseError::NotFound { .. }) => ErrorSeverity::Warning,
            RunStatusError::Validation(_) => ErrorSeverity::Warning,
            RunStatusError::Calculation(CalculationError::InsufficientData { .. }) => {
                ErrorSeverity::Info
            }
            RunStatusError::Calculation(CalculationError::MalformedDate { .. }) => {
                ErrorSeverity::Warning
            }
            RunStatusError::Database(_) => ErrorSeverity::Error,
            RunStatusError::Internal(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            RunStatusError::Database(DatabaseError::ConnectionFailed { .. }) => {
                "Unable to open the snapshot database. Check the database path in your config."
                    .to_string()
            }
            RunStatusError::Database(DatabaseError::NotFound { table, id }) => {
                format!("No {} with id {} exists", table.trim_end_matches('s'), id)
            }
            RunStatusError::Calculation(CalculationError::InsufficientData {
                calculation, ..
            }) => {
                format!(
                    "Not enough data to calculate {}. Keep logging snapshots and try again.",
                    calculation
                )
            }
            RunStatusError::Calculation(CalculationError::MalformedDate { value }) => {
                format!("'{}' is not a date, use YYYY-MM-DD", value)
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Critical system error requiring immediate attention
    Critical,
    /// Error that prevents operation but system can continue
    Error,
    /// Warning that doesn't prevent operation
    Warning,
    /// Informational message
    Info,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Critical | ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
            ErrorSeverity::Info => tracing::Level::INFO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_severity() {
        let err = RunStatusError::Database(DatabaseError::NotFound {
            table: "goals".to_string(),
            id: "3".to_string(),
        });
        assert_eq!(err.severity(), ErrorSeverity::Warning);

        let err = RunStatusError::Internal("test".to_string());
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert_eq!(err.severity().to_tracing_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_error_retryable() {
        let err = RunStatusError::Database(DatabaseError::ConnectionFailed {
            reason: "locked".to_string(),
        });
        assert!(err.is_retryable());

        let err = RunStatusError::Validation("test".to_string());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_user_messages() {
        let err: RunStatusError = CalculationError::MalformedDate {
            value: "next friday".to_string(),
        }
        .into();
        assert!(err.user_message().contains("next friday"));

        let err = RunStatusError::Database(DatabaseError::NotFound {
            table: "goals".to_string(),
            id: "7".to_string(),
        });
        assert_eq!(err.user_message(), "No goal with id 7 exists");
    }
}
