//! Database layer
//!
//! Everything the site stores lives in one SQLite database reached through
//! the `DatabasePool` trait. Schema changes are applied at start-up by
//! `migrations::run_migrations`, and each entity has a repository under
//! `repositories`.

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{create_pool, create_test_pool, DatabasePool, DynDatabasePool, SqliteDatabase};
