//! # Storefront engine public API
//!
//! The `store_api` module exposes the programmatic API of the storefront. The API is split by concern, so that a
//! client only needs a backend that implements the storage traits the API actually uses.
//!
//! * [`auth_api`] handles registration, login, profiles and user administration.
//! * [`catalog_api`] manages categories and products, including seller ownership checks.
//! * [`cart_api`] manages each customer's shopping cart.
//! * [`order_flow_api`] runs checkout, and moves orders through their lifecycle afterwards.
//! * [`review_api`] manages product reviews and ratings.
//! * [`dashboard_api`] provides the statistics for the admin and seller dashboards.
//!
//! # API usage
//!
//! Every API is created by handing it a storage backend:
//!
//! ```rust,ignore
//! use storefront_engine::{CartApi, Storage, StorageConfig};
//! let db = Storage::connect(&StorageConfig::in_memory()).await?;
//! let api = CartApi::new(db);
//! let cart = api.view(user_id).await?;
//! ```

pub mod auth_api;
pub mod auth_objects;
pub mod cart_api;
pub mod cart_objects;
pub mod catalog_api;
pub mod catalog_objects;
pub mod dashboard_api;
pub mod dashboard_objects;
pub mod errors;
pub mod order_flow_api;
pub mod order_objects;
pub mod review_api;
