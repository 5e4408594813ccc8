//! MySQL storage backend.
mod mysql_impl;

pub mod db;
pub use mysql_impl::MySqlDatabase;
