use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::traits::{
    data_objects::StoreCounts,
    CartManagement,
    CatalogManagement,
    OrderManagement,
    ReviewManagement,
    StorageError,
    UserManagement,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    Postgres,
    MySql,
    Memory,
}

impl Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Postgres => write!(f, "PostgreSQL"),
            BackendKind::MySql => write!(f, "MySQL"),
            BackendKind::Memory => write!(f, "in-memory"),
        }
    }
}

/// The complete storage interface of the storefront. Every backend implements this trait, and the engine APIs accept
/// any type that does.
#[allow(async_fn_in_trait)]
pub trait StorefrontDatabase:
    Clone + UserManagement + CatalogManagement + CartManagement + OrderManagement + ReviewManagement
{
    /// The connection URL of the database. Passwords are not included.
    fn url(&self) -> &str;

    fn backend(&self) -> BackendKind;

    async fn store_counts(&self) -> Result<StoreCounts, StorageError>;

    async fn close(&mut self) -> Result<(), StorageError> {
        Ok(())
    }
}
