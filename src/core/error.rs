use thiserror::Error;

/// Errors raised by a storage engine.
///
/// The accessor layer never inspects these beyond wrapping them into
/// `AccessorError::StorageEngineFailure`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DbError {
    #[error("Table for object type '{0}' not found")]
    TableNotFound(String),

    #[error("Row {row} not found in table '{table}'")]
    RowNotFound { table: String, row: usize },

    #[error("Property index {index} out of range for table '{table}'")]
    PropertyOutOfRange { table: String, index: usize },

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Transaction error: {0}")]
    TransactionError(String),

    #[error("Execution error: {0}")]
    ExecutionError(String),

    #[error("Lock error: {0}")]
    LockError(String),
}

pub type Result<T> = std::result::Result<T, DbError>;

impl<T> From<std::sync::PoisonError<T>> for DbError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockError(err.to_string())
    }
}
