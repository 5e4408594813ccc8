//! # MySQL database methods
//!
//! Plain functions over a `&mut MySqlConnection`, mirroring the PostgreSQL module. MySQL has no `RETURNING` clause,
//! so inserts read the new row back using `last_insert_id`, and updates re-select the row they changed.
use std::time::Duration;

use log::info;
use sqlx::{mysql::MySqlPoolOptions, Error as SqlxError, MySqlPool};

use crate::helpers::redact_url;

pub mod carts;
pub mod catalog;
pub mod orders;
pub mod reviews;
pub mod users;

pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Unreachable servers are retried until `connect_timeout` has passed.
pub async fn new_pool(url: &str, max_connections: u32, connect_timeout: Duration) -> Result<MySqlPool, SqlxError> {
    info!("🗃️ Connecting to MySQL at {}", redact_url(url));
    let pool = MySqlPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(connect_timeout)
        .connect(url)
        .await?;
    Ok(pool)
}

/// Converts the `last_insert_id` of a MySQL result into a row id.
pub(crate) fn inserted_id(id: u64) -> i64 {
    i64::try_from(id).unwrap_or(i64::MAX)
}
