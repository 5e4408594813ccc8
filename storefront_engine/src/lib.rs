//! Storefront Engine
//!
//! The storefront engine holds the business logic of a multi-role online shop: a product catalog, shopping carts,
//! checkout and order tracking, product reviews, and the admin and seller dashboards. It knows nothing about HTTP.
//!
//! The library is divided into two main sections:
//! 1. Storage ([`mod@traits`] and the backends). Every backend implements the same storage interface. PostgreSQL and
//!    MySQL are supported, as well as an in-memory store that needs no setup at all. [`Storage`] picks one of them at
//!    startup. The records stored by the backends are defined in [`mod@db_types`].
//! 2. The public API ([`mod@store_api`]). This is where the rules live: who may see and change what, how a cart
//!    becomes an order, and how an order moves through its lifecycle.
//!
//! The engine also emits events when orders are placed or change status. Hooks can be registered for these events
//! (see [`mod@events`]).
pub mod db_types;
pub mod events;
pub mod helpers;
pub mod memory;
#[cfg(feature = "mysql")]
pub mod mysql;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod seed;
pub mod storage;
pub mod store_api;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use memory::MemoryDatabase;
#[cfg(feature = "mysql")]
pub use mysql::MySqlDatabase;
#[cfg(feature = "postgres")]
pub use postgres::PostgresDatabase;
pub use storage::{Storage, StorageConfig, StoragePreference};
pub use store_api::{
    auth_api::AuthApi,
    auth_objects,
    cart_api::CartApi,
    cart_objects,
    catalog_api::CatalogApi,
    catalog_objects,
    dashboard_api::DashboardApi,
    dashboard_objects,
    errors::{AuthApiError, OrderFlowError, StoreApiError},
    order_flow_api::OrderFlowApi,
    order_objects,
    review_api::ReviewApi,
};
pub use traits::{
    CartManagement,
    CatalogManagement,
    OrderManagement,
    ReviewManagement,
    StorageError,
    StorefrontDatabase,
    UserManagement,
};
