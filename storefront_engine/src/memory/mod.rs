//! In-memory storage backend. Used when neither SQL database is configured or reachable, and by the test suites.
mod memory_impl;
mod tables;

pub use memory_impl::MemoryDatabase;
