//! Error types for sqlbind

use thiserror::Error;

/// Result type alias for sqlbind operations
pub type CrudResult<T> = Result<T, CrudError>;

/// Error types for binding and persistence operations
#[derive(Debug, Error)]
pub enum CrudError {
    /// An enumerator returned different numbers of names and values
    #[error("length mismatch: {names} field names but {values} values")]
    LengthMismatch { names: usize, values: usize },

    /// Update requested for a record whose key column is not enumerated
    #[error("primary key `{key}` is not set for update of `{table}`")]
    UnsetPrimaryKey { table: String, key: String },

    /// SQLite execution error
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// PostgreSQL execution error
    #[cfg(feature = "postgres")]
    #[error("postgres error: {0}")]
    Postgres(#[from] postgres::Error),

    /// Value could not be assigned to its destination
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Result shape does not fit the request
    #[error("Shape error: {0}")]
    Shape(String),

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// The process-wide default dialect was already chosen
    #[error("default dialect is already set")]
    DialectAlreadySet,

    /// Unrecognized dialect name or URL scheme
    #[error("unknown dialect: {0}")]
    UnknownDialect(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl CrudError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a shape error
    pub fn shape(message: impl Into<String>) -> Self {
        Self::Shape(message.into())
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this error came from the database engine
    pub fn is_engine_error(&self) -> bool {
        match self {
            #[cfg(feature = "sqlite")]
            Self::Sqlite(_) => true,
            #[cfg(feature = "postgres")]
            Self::Postgres(_) => true,
            _ => false,
        }
    }
}
