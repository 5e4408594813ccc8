//! # Storefront server
//! This crate hosts the HTTP API of the storefront. It is responsible for:
//! * Selecting a storage backend and preparing it (migrations, the bootstrap admin, demo data).
//! * Issuing and checking access tokens.
//! * Translating requests into calls to the engine APIs in `storefront_engine`, and their results into JSON.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! Public routes live at the root (`/health`, `/auth/*`, `/products`, `/categories`). Everything a signed-in user
//! does lives under `/api`. See [routes](routes/index.html) for the full list.

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
