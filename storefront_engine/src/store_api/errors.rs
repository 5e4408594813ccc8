use thiserror::Error;

use crate::{
    db_types::{OrderStatusType, Role},
    helpers::{PasswordError, ValidationError},
    traits::StorageError,
};

#[derive(Debug, Clone, Error)]
pub enum AuthApiError {
    #[error("Database error: {0}")]
    DatabaseError(StorageError),
    #[error("{0}")]
    ValidationError(String),
    #[error("The username '{0}' is already taken")]
    UsernameTaken(String),
    #[error("An account with the email '{0}' already exists")]
    EmailTaken(String),
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("The {0} role cannot be assigned this way")]
    RoleNotAllowed(Role),
    #[error("User {0} does not exist")]
    UserNotFound(i64),
    #[error("{0}")]
    Forbidden(String),
    #[error("Password hashing failed: {0}")]
    PasswordHashError(String),
}

impl From<StorageError> for AuthApiError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::AlreadyExists(what) => AuthApiError::ValidationError(format!("{what} already exists")),
            e => AuthApiError::DatabaseError(e),
        }
    }
}

impl From<ValidationError> for AuthApiError {
    fn from(e: ValidationError) -> Self {
        AuthApiError::ValidationError(e.0)
    }
}

impl From<PasswordError> for AuthApiError {
    fn from(e: PasswordError) -> Self {
        AuthApiError::PasswordHashError(e.to_string())
    }
}

/// Errors from the catalog, cart, review and dashboard APIs.
#[derive(Debug, Clone, Error)]
pub enum StoreApiError {
    #[error("Database error: {0}")]
    DatabaseError(StorageError),
    #[error("{0} does not exist")]
    NotFound(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    ValidationError(String),
    #[error("{0} already exists")]
    AlreadyExists(String),
    #[error("Only {available} of product {product_id} in stock, but {requested} were requested")]
    InsufficientStock { product_id: i64, requested: i64, available: i64 },
}

impl From<StorageError> for StoreApiError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(what) => StoreApiError::NotFound(what),
            StorageError::AlreadyExists(what) => StoreApiError::AlreadyExists(what),
            StorageError::InvalidData(msg) => StoreApiError::ValidationError(msg),
            StorageError::InsufficientStock { product_id, requested, available } => {
                StoreApiError::InsufficientStock { product_id, requested, available }
            },
            e => StoreApiError::DatabaseError(e),
        }
    }
}

impl From<ValidationError> for StoreApiError {
    fn from(e: ValidationError) -> Self {
        StoreApiError::ValidationError(e.0)
    }
}

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Database error: {0}")]
    DatabaseError(StorageError),
    #[error("Your cart is empty")]
    EmptyCart,
    #[error("Order {0} does not exist")]
    OrderNotFound(i64),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    ValidationError(String),
    #[error("{0} is no longer available")]
    ProductUnavailable(String),
    #[error("Only {available} of product {product_id} in stock, but {requested} were requested")]
    InsufficientStock { product_id: i64, requested: i64, available: i64 },
    #[error("An order cannot move from {from} to {to}")]
    InvalidTransition { from: OrderStatusType, to: OrderStatusType },
    #[error("A {0} order can no longer be cancelled")]
    NotCancellable(OrderStatusType),
}

impl From<StorageError> for OrderFlowError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::InsufficientStock { product_id, requested, available } => {
                OrderFlowError::InsufficientStock { product_id, requested, available }
            },
            StorageError::InvalidData(msg) => OrderFlowError::ValidationError(msg),
            e => OrderFlowError::DatabaseError(e),
        }
    }
}
