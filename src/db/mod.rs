//! Database layer
//!
//! Supports SQLite (default, for local runs and tests) and PostgreSQL
//! (production). The driver is selected by configuration.
//!
//! # Architecture
//!
//! A trait-based pool abstraction (`DatabasePool`) lets repositories work with
//! either backend. Each repository dispatches on the driver and runs
//! backend-specific SQL.
//!
//! # Usage
//!
//! ```ignore
//! use course_catalog::config::DatabaseConfig;
//! use course_catalog::db::{create_pool, schema};
//!
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! schema::ensure_schema(&pool).await?;
//! pool.ping().await?;
//! ```

pub mod pool;
pub mod position;
pub mod repositories;
pub mod schema;

pub use pool::{
    create_pool, create_test_pool, DatabasePool, DynDatabasePool, PostgresDatabase, SqliteDatabase,
};
pub use position::{PositionedRecord, SequentialPositionAssigner};
