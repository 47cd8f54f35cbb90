//! Group-course link repository

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{GroupCourse, UpdateGroupCourseInput};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row, SqlitePool};
use std::sync::Arc;

#[async_trait]
pub trait GroupCourseRepository: Send + Sync {
    async fn create(&self, link: &GroupCourse) -> Result<GroupCourse>;
    async fn get_by_id(&self, id: &str) -> Result<Option<GroupCourse>>;
    /// The live link between `course_id` and `group_id`, if any
    async fn find_active(&self, course_id: &str, group_id: &str) -> Result<Option<GroupCourse>>;
    async fn list_by_course(&self, course_id: &str) -> Result<Vec<GroupCourse>>;
    async fn list_by_group(&self, group_id: &str) -> Result<Vec<GroupCourse>>;
    async fn update(&self, id: &str, input: &UpdateGroupCourseInput)
        -> Result<Option<GroupCourse>>;
    async fn delete(&self, id: &str) -> Result<()>;
}

pub struct SqlxGroupCourseRepository {
    pool: DynDatabasePool,
}

impl SqlxGroupCourseRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn GroupCourseRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl GroupCourseRepository for SqlxGroupCourseRepository {
    async fn create(&self, link: &GroupCourse) -> Result<GroupCourse> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_sqlite(self.pool.sqlite()?, link).await,
            DatabaseDriver::Postgres => create_postgres(self.pool.postgres()?, link).await,
        }
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<GroupCourse>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_by_id_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Postgres => get_by_id_postgres(self.pool.postgres()?, id).await,
        }
    }

    async fn find_active(&self, course_id: &str, group_id: &str) -> Result<Option<GroupCourse>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                find_active_sqlite(self.pool.sqlite()?, course_id, group_id).await
            }
            DatabaseDriver::Postgres => {
                find_active_postgres(self.pool.postgres()?, course_id, group_id).await
            }
        }
    }

    async fn list_by_course(&self, course_id: &str) -> Result<Vec<GroupCourse>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_by_sqlite(self.pool.sqlite()?, "course_id", course_id).await
            }
            DatabaseDriver::Postgres => {
                list_by_postgres(self.pool.postgres()?, "course_id", course_id).await
            }
        }
    }

    async fn list_by_group(&self, group_id: &str) -> Result<Vec<GroupCourse>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_by_sqlite(self.pool.sqlite()?, "group_id", group_id).await,
            DatabaseDriver::Postgres => {
                list_by_postgres(self.pool.postgres()?, "group_id", group_id).await
            }
        }
    }

    async fn update(
        &self,
        id: &str,
        input: &UpdateGroupCourseInput,
    ) -> Result<Option<GroupCourse>> {
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
async fn create_sqlite(pool: &SqlitePool, link: &GroupCourse) -> Result<GroupCourse> {
    sqlx::query("INSERT INTO group_courses (id, course_id, group_id) VALUES (?, ?, ?)")
        .bind(&link.id)
        .bind(&link.course_id)
        .bind(&link.group_id)
        .execute(pool)
        .await
        .context("Failed to create group course")?;
    Ok(link.clone())
}

async fn get_by_id_sqlite(pool: &SqlitePool, id: &str) -> Result<Option<GroupCourse>> {
    let row = sqlx::query(
        "SELECT id, course_id, group_id FROM group_courses WHERE id = ? AND deleted_at IS NULL",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get group course")?;
    row.map(|r| row_to_group_course_sqlite(&r)).transpose()
}

async fn find_active_sqlite(
    pool: &SqlitePool,
    course_id: &str,
    group_id: &str,
) -> Result<Option<GroupCourse>> {
    let row = sqlx::query(
        "SELECT id, course_id, group_id FROM group_courses \
         WHERE course_id = ? AND group_id = ? AND deleted_at IS NULL",
    )
    .bind(course_id)
    .bind(group_id)
    .fetch_optional(pool)
    .await
    .context("Failed to look up group course")?;
    row.map(|r| row_to_group_course_sqlite(&r)).transpose()
}

/// `column` is one of the fixed names passed by the repository, never user input
async fn list_by_sqlite(pool: &SqlitePool, column: &str, value: &str) -> Result<Vec<GroupCourse>> {
    let sql = format!(
        "SELECT id, course_id, group_id FROM group_courses WHERE {} = ? AND deleted_at IS NULL ORDER BY id",
        column
    );
    let rows = sqlx::query(&sql)
        .bind(value)
        .fetch_all(pool)
        .await
        .context("Failed to list group courses")?;
    rows.iter().map(row_to_group_course_sqlite).collect()
}

async fn update_sqlite(
    pool: &SqlitePool,
    id: &str,
    input: &UpdateGroupCourseInput,
) -> Result<Option<GroupCourse>> {
    let result = sqlx::query(
        "UPDATE group_courses SET course_id = COALESCE(?, course_id), group_id = COALESCE(?, group_id) \
         WHERE id = ? AND deleted_at IS NULL",
    )
    .bind(input.course_id.as_deref())
    .bind(input.group_id.as_deref())
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update group course")?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    get_by_id_sqlite(pool, id).await
}

async fn delete_sqlite(pool: &SqlitePool, id: &str) -> Result<()> {
    sqlx::query("UPDATE group_courses SET deleted_at = ? WHERE id = ? AND deleted_at IS NULL")
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete group course")?;
    Ok(())
}

fn row_to_group_course_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<GroupCourse> {
    Ok(GroupCourse {
        id: row.try_get("id")?,
        course_id: row.try_get("course_id")?,
        group_id: row.try_get("group_id")?,
    })
}

// PostgreSQL implementations
async fn create_postgres(pool: &PgPool, link: &GroupCourse) -> Result<GroupCourse> {
    sqlx::query("INSERT INTO group_courses (id, course_id, group_id) VALUES ($1, $2, $3)")
        .bind(&link.id)
        .bind(&link.course_id)
        .bind(&link.group_id)
        .execute(pool)
        .await
        .context("Failed to create group course")?;
    Ok(link.clone())
}

async fn get_by_id_postgres(pool: &PgPool, id: &str) -> Result<Option<GroupCourse>> {
    let row = sqlx::query(
        "SELECT id, course_id, group_id FROM group_courses WHERE id = $1 AND deleted_at IS NULL",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get group course")?;
    row.map(|r| row_to_group_course_postgres(&r)).transpose()
}

async fn find_active_postgres(
    pool: &PgPool,
    course_id: &str,
    group_id: &str,
) -> Result<Option<GroupCourse>> {
    let row = sqlx::query(
        "SELECT id, course_id, group_id FROM group_courses \
         WHERE course_id = $1 AND group_id = $2 AND deleted_at IS NULL",
    )
    .bind(course_id)
    .bind(group_id)
    .fetch_optional(pool)
    .await
    .context("Failed to look up group course")?;
    row.map(|r| row_to_group_course_postgres(&r)).transpose()
}

async fn list_by_postgres(pool: &PgPool, column: &str, value: &str) -> Result<Vec<GroupCourse>> {
    let sql = format!(
        "SELECT id, course_id, group_id FROM group_courses WHERE {} = $1 AND deleted_at IS NULL ORDER BY id",
        column
    );
    let rows = sqlx::query(&sql)
        .bind(value)
        .fetch_all(pool)
        .await
        .context("Failed to list group courses")?;
    rows.iter().map(row_to_group_course_postgres).collect()
}

async fn update_postgres(
    pool: &PgPool,
    id: &str,
    input: &UpdateGroupCourseInput,
) -> Result<Option<GroupCourse>> {
    let result = sqlx::query(
        "UPDATE group_courses SET course_id = COALESCE($1, course_id), group_id = COALESCE($2, group_id) \
         WHERE id = $3 AND deleted_at IS NULL",
    )
    .bind(input.course_id.as_deref())
    .bind(input.group_id.as_deref())
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update group course")?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    get_by_id_postgres(pool, id).await
}

async fn delete_postgres(pool: &PgPool, id: &str) -> Result<()> {
    sqlx::query("UPDATE group_courses SET deleted_at = $1 WHERE id = $2 AND deleted_at IS NULL")
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete group course")?;
    Ok(())
}

fn row_to_group_course_postgres(row: &sqlx::postgres::PgRow) -> Result<GroupCourse> {
    Ok(GroupCourse {
        id: row.try_get("id")?,
        course_id: row.try_get("course_id")?,
        group_id: row.try_get("group_id")?,
    })
}
