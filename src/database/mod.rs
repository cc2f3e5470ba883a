//! Database access
//!
//! PostgreSQL connection pool and embedded schema migrations.

pub mod migrations;
mod pool;

pub use pool::{Database, PoolStats};
