//! PostgreSQL storage backend.
mod postgres_impl;

pub mod db;
pub use postgres_impl::PostgresDatabase;
