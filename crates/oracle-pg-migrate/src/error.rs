//! Error types for the migration library.

use thiserror::Error;

/// Main error type for migration operations.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Configuration error (invalid YAML, missing fields, bad batch size, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection failure to the source or target database.
    #[error("Connection error ({side}): {message}")]
    Connection { side: String, message: String },

    /// Schema translation failed (unsupported mapping, primary key
    /// referencing a nonexistent column).
    #[error("Schema error: {0}")]
    Schema(String),

    /// A fetch or insert call failed for a specific table.
    #[error("Transfer failed for table {table}: {message}")]
    Transfer { table: String, message: String },

    /// Validation phase failure (reserved for the validation extension point).
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Draining a large-object handle failed.
    #[error("Large object error: {0}")]
    LargeObject(String),

    /// A connector operation exceeded its deadline.
    #[error("Operation timed out: {operation}")]
    Timeout { operation: String },

    /// Job store error.
    #[error("Job store error: {0}")]
    Store(String),

    /// Migration was cancelled cooperatively.
    #[error("Migration cancelled")]
    Cancelled,

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MigrateError {
    /// Create a Connection error for one side of the migration.
    pub fn connection(side: impl Into<String>, message: impl Into<String>) -> Self {
        MigrateError::Connection {
            side: side.into(),
            message: message.into(),
        }
    }

    /// Create a Transfer error.
    pub fn transfer(table: impl Into<String>, message: impl Into<String>) -> Self {
        MigrateError::Transfer {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Create a Schema error.
    pub fn schema(message: impl Into<String>) -> Self {
        MigrateError::Schema(message.into())
    }

    /// Create a Timeout error for a named operation.
    pub fn timeout(operation: impl Into<String>) -> Self {
        MigrateError::Timeout {
            operation: operation.into(),
        }
    }
}

/// Result type alias for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MigrateError::transfer("customers", "insert rejected");
        assert_eq!(
            err.to_string(),
            "Transfer failed for table customers: insert rejected"
        );

        let err = MigrateError::connection("source", "refused");
        assert_eq!(err.to_string(), "Connection error (source): refused");
    }

    #[test]
    fn test_timeout_display() {
        let err = MigrateError::timeout("fetch_rows(orders)");
        assert_eq!(err.to_string(), "Operation timed out: fetch_rows(orders)");
    }
}
