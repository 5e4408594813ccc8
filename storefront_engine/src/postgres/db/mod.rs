//! # PostgreSQL database methods
//!
//! The "low-level" PostgreSQL interactions. Each is a plain function that accepts a `&mut PgConnection`, so callers
//! can pass a pooled connection, or open a transaction and pass `&mut tx` to run several of them atomically.
use std::time::Duration;

use log::info;
use sqlx::{postgres::PgPoolOptions, Error as SqlxError, PgPool};

use crate::helpers::redact_url;

pub mod carts;
pub mod catalog;
pub mod orders;
pub mod reviews;
pub mod users;

pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Unreachable servers are retried until `connect_timeout` has passed.
pub async fn new_pool(url: &str, max_connections: u32, connect_timeout: Duration) -> Result<PgPool, SqlxError> {
    info!("🗃️ Connecting to PostgreSQL at {}", redact_url(url));
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(connect_timeout)
        .connect(url)
        .await?;
    Ok(pool)
}
