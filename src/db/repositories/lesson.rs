//! Lesson repository

use crate::config::DatabaseDriver;
use crate::db::position::SequentialPositionAssigner;
use crate::db::DynDatabasePool;
use crate::models::{Lesson, UpdateLessonInput};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row, SqlitePool};
use std::sync::Arc;

const LESSON_COLUMNS: &str = "id, title, description, content, position, module_id";

#[async_trait]
pub trait LessonRepository: Send + Sync {
    /// Insert `lesson` at the end of its module. The incoming position is ignored.
    async fn create(&self, lesson: Lesson) -> Result<Lesson>;
    async fn get_by_id(&self, id: &str) -> Result<Option<Lesson>>;
    /// Live lessons of a module in position order
    async fn list_by_module(&self, module_id: &str) -> Result<Vec<Lesson>>;
    async fn update(&self, id: &str, input: &UpdateLessonInput) -> Result<Option<Lesson>>;
    async fn delete(&self, id: &str) -> Result<()>;
}

pub struct SqlxLessonRepository {
    pool: DynDatabasePool,
    positions: SequentialPositionAssigner,
}

impl SqlxLessonRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self {
            positions: SequentialPositionAssigner::new(pool.clone()),
            pool,
        }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn LessonRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl LessonRepository for SqlxLessonRepository {
    async fn create(&self, lesson: Lesson) -> Result<Lesson> {
        self.positions.append(lesson).await
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Lesson>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_by_id_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Postgres => get_by_id_postgres(self.pool.postgres()?, id).await,
        }
    }

    async fn list_by_module(&self, module_id: &str) -> Result<Vec<Lesson>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_by_module_sqlite(self.pool.sqlite()?, module_id).await,
            DatabaseDriver::Postgres => {
                list_by_module_postgres(self.pool.postgres()?, module_id).await
            }
        }
    }

    async fn update(&self, id: &str, input: &UpdateLessonInput) -> Result<Option<Lesson>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_sqlite(self.pool.sqlite()?, id, input).await,
            DatabaseDriver::Postgres => update_postgres(self.pool.postgres()?, id, input).await,
        }
    }

    async fn delete(&self, id: &str) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Postgres => delete_postgres(self.pool.postgres()?, id).await,
        }
    }
}

// SQLite implementations
async fn get_by_id_sqlite(pool: &SqlitePool, id: &str) -> Result<Option<Lesson>> {
    let sql = format!(
        "SELECT {} FROM lessons WHERE id = ? AND deleted_at IS NULL",
        LESSON_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get lesson")?;
    row.map(|r| row_to_lesson_sqlite(&r)).transpose()
}

async fn list_by_module_sqlite(pool: &SqlitePool, module_id: &str) -> Result<Vec<Lesson>> {
    let sql = format!(
        "SELECT {} FROM lessons WHERE module_id = ? AND deleted_at IS NULL ORDER BY position",
        LESSON_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(module_id)
        .fetch_all(pool)
        .await
        .context("Failed to list lessons")?;
    rows.iter().map(row_to_lesson_sqlite).collect()
}

async fn update_sqlite(
    pool: &SqlitePool,
    id: &str,
    input: &UpdateLessonInput,
) -> Result<Option<Lesson>> {
    let result = sqlx::query(
        "UPDATE lessons SET title = COALESCE(?, title), description = COALESCE(?, description), \
         content = COALESCE(?, content) WHERE id = ? AND deleted_at IS NULL",
    )
    .bind(input.title.as_deref())
    .bind(input.description.as_deref())
    .bind(input.content.as_deref())
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update lesson")?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    get_by_id_sqlite(pool, id).await
}

async fn delete_sqlite(pool: &SqlitePool, id: &str) -> Result<()> {
    sqlx::query("UPDATE lessons SET deleted_at = ? WHERE id = ? AND deleted_at IS NULL")
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete lesson")?;
    Ok(())
}

fn row_to_lesson_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Lesson> {
    Ok(Lesson {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        content: row.try_get("content")?,
        position: row.try_get("position")?,
        module_id: row.try_get("module_id")?,
    })
}

// PostgreSQL implementations
async fn get_by_id_postgres(pool: &PgPool, id: &str) -> Result<Option<Lesson>> {
    let sql = format!(
        "SELECT {} FROM lessons WHERE id = $1 AND deleted_at IS NULL",
        LESSON_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get lesson")?;
    row.map(|r| row_to_lesson_postgres(&r)).transpose()
}

async fn list_by_module_postgres(pool: &PgPool, module_id: &str) -> Result<Vec<Lesson>> {
    let sql = format!(
        "SELECT {} FROM lessons WHERE module_id = $1 AND deleted_at IS NULL ORDER BY position",
        LESSON_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(module_id)
        .fetch_all(pool)
        .await
        .context("Failed to list lessons")?;
    rows.iter().map(row_to_lesson_postgres).collect()
}

async fn update_postgres(
    pool: &PgPool,
    id: &str,
    input: &UpdateLessonInput,
) -> Result<Option<Lesson>> {
    let result = sqlx::query(
        "UPDATE lessons SET title = COALESCE($1, title), description = COALESCE($2, description), \
         content = COALESCE($3, content) WHERE id = $4 AND deleted_at IS NULL",
    )
    .bind(input.title.as_deref())
    .bind(input.description.as_deref())
    .bind(input.content.as_deref())
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update lesson")?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    get_by_id_postgres(pool, id).await
}

async fn delete_postgres(pool: &PgPool, id: &str) -> Result<()> {
    sqlx::query("UPDATE lessons SET deleted_at = $1 WHERE id = $2 AND deleted_at IS NULL")
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete lesson")?;
    Ok(())
}

fn row_to_lesson_postgres(row: &sqlx::postgres::PgRow) -> Result<Lesson> {
    Ok(Lesson {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        content: row.try_get("content")?,
        position: row.try_get("position")?,
        module_id: row.try_get("module_id")?,
    })
}
