//! Sequential position assignment
//!
//! Modules are ordered within a course and lessons within a module. A new
//! child always lands at `max(position) + 1` among the parent's non-deleted
//! children (1 for the first child). Reading the maximum and inserting the row
//! happen in one `INSERT ... SELECT` inside one transaction, so two concurrent
//! creations for the same parent can never observe the same maximum:
//!
//! - PostgreSQL: the transaction first takes a transaction-scoped advisory
//!   lock keyed on `table:parent_id`. Writers for one parent queue behind each
//!   other; writers for different parents proceed in parallel.
//! - SQLite: writers are serialized by the database itself. The insert is the
//!   transaction's first statement, so the write lock is taken before the
//!   maximum is read.
//!
//! The transaction guard rolls back when dropped uncommitted. A failed
//! statement, a failed commit, or a cancelled future (deadline expiry, client
//! disconnect) therefore never leaves a row behind.
//!
//! Deleted children are excluded from the maximum, so deleting the last child
//! frees its position for the next one. Gaps in the middle are never closed.

use anyhow::{Context, Result};
use sqlx::{PgPool, Postgres, Sqlite, SqlitePool};

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Lesson, Module};

/// A child row whose position is assigned on insert.
pub trait PositionedRecord: Send + Sync {
    /// Table the record lives in
    const TABLE: &'static str;
    /// Column holding the parent scope id
    const PARENT_COLUMN: &'static str;
    /// Columns written on insert, `position` excluded, in the order of [`Self::values`]
    const COLUMNS: &'static [&'static str];

    fn parent_id(&self) -> &str;
    fn values(&self) -> Vec<&str>;
    fn set_position(&mut self, position: i64);
}

impl PositionedRecord for Module {
    const TABLE: &'static str = "modules";
    const PARENT_COLUMN: &'static str = "course_id";
    const COLUMNS: &'static [&'static str] = &["id", "title", "description", "course_id"];

    fn parent_id(&self) -> &str {
        &self.course_id
    }

    fn values(&self) -> Vec<&str> {
        vec![&self.id, &self.title, &self.description, &self.course_id]
    }

    fn set_position(&mut self, position: i64) {
        self.position = position;
    }
}

impl PositionedRecord for Lesson {
    const TABLE: &'static str = "lessons";
    const PARENT_COLUMN: &'static str = "module_id";
    const COLUMNS: &'static [&'static str] =
        &["id", "title", "description", "content", "module_id"];

    fn parent_id(&self) -> &str {
        &self.module_id
    }

    fn values(&self) -> Vec<&str> {
        vec![
            &self.id,
            &self.title,
            &self.description,
            &self.content,
            &self.module_id,
        ]
    }

    fn set_position(&mut self, position: i64) {
        self.position = position;
    }
}

/// Appends child records at the end of their parent's sequence
pub struct SequentialPositionAssigner {
    pool: DynDatabasePool,
}

impl SequentialPositionAssigner {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Persist `record` with the next free position of its parent and return it
    /// with `position` set. Any position already on `record` is ignored.
    pub async fn append<R: PositionedRecord>(&self, mut record: R) -> Result<R> {
        anyhow::ensure!(
            !record.parent_id().trim().is_empty(),
            "{} requires a non-empty {}",
            R::TABLE,
            R::PARENT_COLUMN
        );

        let position = match self.pool.driver() {
            DatabaseDriver::Sqlite => append_sqlite(self.pool.sqlite()?, &record).await?,
            DatabaseDriver::Postgres => append_postgres(self.pool.postgres()?, &record).await?,
        };

        tracing::debug!(
            table = R::TABLE,
            parent = record.parent_id(),
            position,
            "Assigned position"
        );

        record.set_position(position);
        Ok(record)
    }
}

/// `INSERT ... SELECT` computing the next position; the parent id is bound last.
fn append_sql<R: PositionedRecord>(placeholder: impl Fn(usize) -> String) -> String {
    let values = (1..=R::COLUMNS.len())
        .map(&placeholder)
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "INSERT INTO {table} ({columns}, position) \
         SELECT {values}, COALESCE(MAX(position), 0) + 1 FROM {table} \
         WHERE {parent} = {parent_param} AND deleted_at IS NULL \
         RETURNING position",
        table = R::TABLE,
        columns = R::COLUMNS.join(", "),
        values = values,
        parent = R::PARENT_COLUMN,
        parent_param = placeholder(R::COLUMNS.len() + 1),
    )
}

async fn append_sqlite<R: PositionedRecord>(pool: &SqlitePool, record: &R) -> Result<i64> {
    let sql = append_sql::<R>(|_| "?".to_string());

    let mut tx = pool
        .begin()
        .await
        .context("Failed to begin position transaction")?;

    let mut query = sqlx::query_scalar::<Sqlite, i64>(&sql);
    for value in record.values() {
        query = query.bind(value);
    }
    let position = query
        .bind(record.parent_id())
        .fetch_one(&mut *tx)
        .await
        .with_context(|| format!("Failed to append to {}", R::TABLE))?;

    tx.commit()
        .await
        .context("Failed to commit position transaction")?;

    Ok(position)
}

async fn append_postgres<R: PositionedRecord>(pool: &PgPool, record: &R) -> Result<i64> {
    let sql = append_sql::<R>(|n| format!("${}", n));

    let mut tx = pool
        .begin()
        .await
        .context("Failed to begin position transaction")?;

    sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
        .bind(format!("{}:{}", R::TABLE, record.parent_id()))
        .execute(&mut *tx)
        .await
        .context("Failed to lock parent scope")?;

    let mut query = sqlx::query_scalar::<Postgres, i64>(&sql);
    for value in record.values() {
        query = query.bind(value);
    }
    let position = query
        .bind(record.parent_id())
        .fetch_one(&mut *tx)
        .await
        .with_context(|| format!("Failed to append to {}", R::TABLE))?;

    tx.commit()
        .await
        .context("Failed to commit position transaction")?;

    Ok(position)
}
