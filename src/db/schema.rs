//! Schema bootstrap
//!
//! Creates the catalog tables and indexes when they are missing. Every
//! statement is idempotent, so this runs on each start. Schema evolution is
//! out of scope; there is no version tracking.
//!
//! The partial unique indexes back the position and link invariants: among
//! rows with `deleted_at IS NULL` no two children of one parent share a
//! position and no (course, group) pair is linked twice.

use anyhow::{Context, Result};

use super::DynDatabasePool;
use crate::config::DatabaseDriver;

const SQLITE_SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS courses (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        access_type TEXT NOT NULL,
        published_at TIMESTAMP,
        owner_id TEXT NOT NULL,
        deleted_at TIMESTAMP
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_courses_owner_id ON courses(owner_id)",
    "CREATE INDEX IF NOT EXISTS idx_courses_deleted_at ON courses(deleted_at)",
    r#"
    CREATE TABLE IF NOT EXISTS modules (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        position INTEGER NOT NULL,
        course_id TEXT NOT NULL,
        deleted_at TIMESTAMP
    )
    "#,
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS idx_modules_course_position
        ON modules(course_id, position) WHERE deleted_at IS NULL
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS lessons (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        content TEXT NOT NULL DEFAULT '',
        position INTEGER NOT NULL,
        module_id TEXT NOT NULL,
        deleted_at TIMESTAMP
    )
    "#,
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS idx_lessons_module_position
        ON lessons(module_id, position) WHERE deleted_at IS NULL
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS group_courses (
        id TEXT PRIMARY KEY,
        course_id TEXT NOT NULL,
        group_id TEXT NOT NULL,
        deleted_at TIMESTAMP
    )
    "#,
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS idx_group_courses_link
        ON group_courses(course_id, group_id) WHERE deleted_at IS NULL
    "#,
    "CREATE INDEX IF NOT EXISTS idx_group_courses_group_id ON group_courses(group_id)",
];

const POSTGRES_SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS courses (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        access_type TEXT NOT NULL,
        published_at TIMESTAMPTZ,
        owner_id TEXT NOT NULL,
        deleted_at TIMESTAMPTZ
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_courses_owner_id ON courses(owner_id)",
    "CREATE INDEX IF NOT EXISTS idx_courses_deleted_at ON courses(deleted_at)",
    r#"
    CREATE TABLE IF NOT EXISTS modules (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        position BIGINT NOT NULL,
        course_id TEXT NOT NULL,
        deleted_at TIMESTAMPTZ
    )
    "#,
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS idx_modules_course_position
        ON modules(course_id, position) WHERE deleted_at IS NULL
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS lessons (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        content TEXT NOT NULL DEFAULT '',
        position BIGINT NOT NULL,
        module_id TEXT NOT NULL,
        deleted_at TIMESTAMPTZ
    )
    "#,
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS idx_lessons_module_position
        ON lessons(module_id, position) WHERE deleted_at IS NULL
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS group_courses (
        id TEXT PRIMARY KEY,
        course_id TEXT NOT NULL,
        group_id TEXT NOT NULL,
        deleted_at TIMESTAMPTZ
    )
    "#,
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS idx_group_courses_link
        ON group_courses(course_id, group_id) WHERE deleted_at IS NULL
    "#,
    "CREATE INDEX IF NOT EXISTS idx_group_courses_group_id ON group_courses(group_id)",
];

/// Create all tables and indexes that don't exist yet
pub async fn ensure_schema(pool: &DynDatabasePool) -> Result<()> {
    let statements = match pool.driver() {
        DatabaseDriver::Sqlite => SQLITE_SCHEMA,
        DatabaseDriver::Postgres => POSTGRES_SCHEMA,
    };

    for statement in statements {
        pool.execute(statement.trim())
            .await
            .with_context(|| format!("Failed to bootstrap schema: {}", truncate_sql(statement)))?;
    }

    tracing::debug!("Schema ready ({} statements)", statements.len());
    Ok(())
}

fn truncate_sql(sql: &str) -> String {
    let sql = sql.split_whitespace().collect::<Vec<_>>().join(" ");
    if sql.len() > 80 {
        let cut = sql
            .char_indices()
            .map(|(i, _)| i)
            .take_while(|&i| i <= 77)
            .last()
            .unwrap_or(0);
        format!("{}...", &sql[..cut])
    } else {
        sql
    }
}
