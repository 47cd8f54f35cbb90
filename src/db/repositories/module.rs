//! Module repository

use crate::config::DatabaseDriver;
use crate::db::position::SequentialPositionAssigner;
use crate::db::DynDatabasePool;
use crate::models::{Module, UpdateModuleInput};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row, SqlitePool};
use std::sync::Arc;

#[async_trait]
pub trait ModuleRepository: Send + Sync {
    /// Insert `module` at the end of its course. The incoming position is ignored.
    async fn create(&self, module: Module) -> Result<Module>;
    async fn get_by_id(&self, id: &str) -> Result<Option<Module>>;
    /// Live modules of a course in position order
    async fn list_by_course(&self, course_id: &str) -> Result<Vec<Module>>;
    async fn update(&self, id: &str, input: &UpdateModuleInput) -> Result<Option<Module>>;
    async fn delete(&self, id: &str) -> Result<()>;
}

pub struct SqlxModuleRepository {
    pool: DynDatabasePool,
    positions: SequentialPositionAssigner,
}

impl SqlxModuleRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self {
            positions: SequentialPositionAssigner::new(pool.clone()),
            pool,
        }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ModuleRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ModuleRepository for SqlxModuleRepository {
    async fn create(&self, module: Module) -> Result<Module> {
        self.positions.append(module).await
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Module>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_by_id_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Postgres => get_by_id_postgres(self.pool.postgres()?, id).await,
        }
    }

    async fn list_by_course(&self, course_id: &str) -> Result<Vec<Module>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_by_course_sqlite(self.pool.sqlite()?, course_id).await,
            DatabaseDriver::Postgres => {
                list_by_course_postgres(self.pool.postgres()?, course_id).await
            }
        }
    }

    async fn update(&self, id: &str, input: &UpdateModuleInput) -> Result<Option<Module>> {
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
async fn get_by_id_sqlite(pool: &SqlitePool, id: &str) -> Result<Option<Module>> {
    let row = sqlx::query(
        "SELECT id, title, description, position, course_id FROM modules WHERE id = ? AND deleted_at IS NULL",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get module")?;
    row.map(|r| row_to_module_sqlite(&r)).transpose()
}

async fn list_by_course_sqlite(pool: &SqlitePool, course_id: &str) -> Result<Vec<Module>> {
    let rows = sqlx::query(
        "SELECT id, title, description, position, course_id FROM modules \
         WHERE course_id = ? AND deleted_at IS NULL ORDER BY position",
    )
    .bind(course_id)
    .fetch_all(pool)
    .await
    .context("Failed to list modules")?;
    rows.iter().map(row_to_module_sqlite).collect()
}

async fn update_sqlite(
    pool: &SqlitePool,
    id: &str,
    input: &UpdateModuleInput,
) -> Result<Option<Module>> {
    let result = sqlx::query(
        "UPDATE modules SET title = COALESCE(?, title), description = COALESCE(?, description) \
         WHERE id = ? AND deleted_at IS NULL",
    )
    .bind(input.title.as_deref())
    .bind(input.description.as_deref())
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update module")?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    get_by_id_sqlite(pool, id).await
}

async fn delete_sqlite(pool: &SqlitePool, id: &str) -> Result<()> {
    sqlx::query("UPDATE modules SET deleted_at = ? WHERE id = ? AND deleted_at IS NULL")
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete module")?;
    Ok(())
}

fn row_to_module_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Module> {
    Ok(Module {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        position: row.try_get("position")?,
        course_id: row.try_get("course_id")?,
    })
}

// PostgreSQL implementations
async fn get_by_id_postgres(pool: &PgPool, id: &str) -> Result<Option<Module>> {
    let row = sqlx::query(
        "SELECT id, title, description, position, course_id FROM modules WHERE id = $1 AND deleted_at IS NULL",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get module")?;
    row.map(|r| row_to_module_postgres(&r)).transpose()
}

async fn list_by_course_postgres(pool: &PgPool, course_id: &str) -> Result<Vec<Module>> {
    let rows = sqlx::query(
        "SELECT id, title, description, position, course_id FROM modules \
         WHERE course_id = $1 AND deleted_at IS NULL ORDER BY position",
    )
    .bind(course_id)
    .fetch_all(pool)
    .await
    .context("Failed to list modules")?;
    rows.iter().map(row_to_module_postgres).collect()
}

async fn update_postgres(
    pool: &PgPool,
    id: &str,
    input: &UpdateModuleInput,
) -> Result<Option<Module>> {
    let result = sqlx::query(
        "UPDATE modules SET title = COALESCE($1, title), description = COALESCE($2, description) \
         WHERE id = $3 AND deleted_at IS NULL",
    )
    .bind(input.title.as_deref())
    .bind(input.description.as_deref())
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update module")?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    get_by_id_postgres(pool, id).await
}

async fn delete_postgres(pool: &PgPool, id: &str) -> Result<()> {
    sqlx::query("UPDATE modules SET deleted_at = $1 WHERE id = $2 AND deleted_at IS NULL")
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete module")?;
    Ok(())
}

fn row_to_module_postgres(row: &sqlx::postgres::PgRow) -> Result<Module> {
    Ok(Module {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        position: row.try_get("position")?,
        course_id: row.try_get("course_id")?,
    })
}
