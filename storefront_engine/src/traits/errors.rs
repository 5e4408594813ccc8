use thiserror::Error;

use crate::db_types::OrderStatusType;

#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("{0} already exists")]
    AlreadyExists(String),
    #[error("{0} does not exist")]
    NotFound(String),
    #[error("Insufficient stock for product {product_id}. Requested {requested}, but only {available} available")]
    InsufficientStock { product_id: i64, requested: i64, available: i64 },
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("Operation is not supported by this backend: {0}")]
    Unsupported(String),
}

impl StorageError {
    /// A conditional status write found the order in a different status than the caller expected.
    pub fn status_conflict(order_id: i64, actual: OrderStatusType, expected: OrderStatusType) -> Self {
        StorageError::InvalidData(format!("Order {order_id} is {actual}, not {expected}"))
    }

    pub fn not_cancellable(order_id: i64, actual: OrderStatusType) -> Self {
        StorageError::InvalidData(format!("Order {order_id} is {actual} and can no longer be cancelled"))
    }
}

impl From<sqlx::Error> for StorageError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                let what = db_err.constraint().map(|c| c.to_string()).unwrap_or_else(|| db_err.message().to_string());
                StorageError::AlreadyExists(what)
            },
            sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                StorageError::NotFound(format!("Referenced record ({})", db_err.message()))
            },
            sqlx::Error::Database(ref db_err) if db_err.is_check_violation() => {
                StorageError::InvalidData(db_err.message().to_string())
            },
            sqlx::Error::RowNotFound => StorageError::NotFound("Row".into()),
            sqlx::Error::ColumnDecode { index, source } => {
                StorageError::InvalidData(format!("Could not decode column {index}: {source}"))
            },
            e => StorageError::DatabaseError(e.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for StorageError {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        StorageError::DatabaseError(format!("Migration failed: {e}"))
    }
}
