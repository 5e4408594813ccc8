//! # Storage interface
//!
//! The traits in this module define the contract that every storefront storage backend fulfils. There are three
//! implementations: PostgreSQL, MySQL and an in-memory store. Which one is used is decided once at startup (see
//! [`crate::Storage`]).
//!
//! * [`UserManagement`] stores user accounts and their roles.
//! * [`CatalogManagement`] stores categories and products.
//! * [`CartManagement`] stores each customer's shopping cart.
//! * [`OrderManagement`] runs the order flow and stores orders, order items, payments and shipments.
//! * [`ReviewManagement`] stores product reviews.
//! * [`StorefrontDatabase`] ties them together.
//!
//! The interface is a flat CRUD contract. Business rules (who may do what, order status transitions, validation)
//! live in the [`crate::store_api`] modules, not in the backends.
mod cart_management;
mod catalog_management;
mod errors;
mod order_management;
mod review_management;
mod storefront_database;
mod user_management;

pub mod data_objects;

pub use cart_management::CartManagement;
pub use catalog_management::CatalogManagement;
pub use data_objects::{
    OrderLine,
    OrderPlan,
    OrderQueryFilter,
    Pagination,
    PlacedOrder,
    ProductQueryFilter,
    ProductSort,
    RatingSummary,
    SalesSummary,
    StatusCount,
    StoreCounts,
};
pub use errors::StorageError;
pub use order_management::OrderManagement;
pub use review_management::ReviewManagement;
pub use storefront_database::{BackendKind, StorefrontDatabase};
pub use user_management::UserManagement;
