//! Course repository
//!
//! Reads never return soft-deleted rows. `update` and `set_published_at`
//! return `None` when the id is unknown or deleted.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{AccessType, Course, CoursePatch};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, SqlitePool};
use std::sync::Arc;

const COURSE_COLUMNS: &str = "id, title, description, access_type, published_at, owner_id";

#[async_trait]
pub trait CourseRepository: Send + Sync {
    async fn create(&self, course: &Course) -> Result<Course>;
    async fn get_by_id(&self, id: &str) -> Result<Option<Course>>;
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Course>>;
    /// Public courses plus restricted courses linked to any of `group_ids`
    async fn list_available(&self, group_ids: &[String]) -> Result<Vec<Course>>;
    async fn update(&self, id: &str, patch: &CoursePatch) -> Result<Option<Course>>;
    async fn set_published_at(
        &self,
        id: &str,
        published_at: Option<DateTime<Utc>>,
    ) -> Result<Option<Course>>;
    async fn delete(&self, id: &str) -> Result<()>;
}

pub struct SqlxCourseRepository {
    pool: DynDatabasePool,
}

impl SqlxCourseRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CourseRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl CourseRepository for SqlxCourseRepository {
    async fn create(&self, course: &Course) -> Result<Course> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_sqlite(self.pool.sqlite()?, course).await,
            DatabaseDriver::Postgres => create_postgres(self.pool.postgres()?, course).await,
        }
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Course>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_by_id_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Postgres => get_by_id_postgres(self.pool.postgres()?, id).await,
        }
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Course>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_by_owner_sqlite(self.pool.sqlite()?, owner_id).await,
            DatabaseDriver::Postgres => list_by_owner_postgres(self.pool.postgres()?, owner_id).await,
        }
    }

    async fn list_available(&self, group_ids: &[String]) -> Result<Vec<Course>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_available_sqlite(self.pool.sqlite()?, group_ids).await,
            DatabaseDriver::Postgres => {
                list_available_postgres(self.pool.postgres()?, group_ids).await
            }
        }
    }

    async fn update(&self, id: &str, patch: &CoursePatch) -> Result<Option<Course>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_sqlite(self.pool.sqlite()?, id, patch).await,
            DatabaseDriver::Postgres => update_postgres(self.pool.postgres()?, id, patch).await,
        }
    }

    async fn set_published_at(
        &self,
        id: &str,
        published_at: Option<DateTime<Utc>>,
    ) -> Result<Option<Course>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                set_published_at_sqlite(self.pool.sqlite()?, id, published_at).await
            }
            DatabaseDriver::Postgres => {
                set_published_at_postgres(self.pool.postgres()?, id, published_at).await
            }
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
async fn create_sqlite(pool: &SqlitePool, course: &Course) -> Result<Course> {
    sqlx::query(
        "INSERT INTO courses (id, title, description, access_type, published_at, owner_id) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&course.id)
    .bind(&course.title)
    .bind(&course.description)
    .bind(course.access_type.as_str())
    .bind(course.published_at)
    .bind(&course.owner_id)
    .execute(pool)
    .await
    .context("Failed to create course")?;

    Ok(course.clone())
}

async fn get_by_id_sqlite(pool: &SqlitePool, id: &str) -> Result<Option<Course>> {
    let sql = format!(
        "SELECT {} FROM courses WHERE id = ? AND deleted_at IS NULL",
        COURSE_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get course")?;
    row.map(|r| row_to_course_sqlite(&r)).transpose()
}

async fn list_by_owner_sqlite(pool: &SqlitePool, owner_id: &str) -> Result<Vec<Course>> {
    let sql = format!(
        "SELECT {} FROM courses WHERE owner_id = ? AND deleted_at IS NULL ORDER BY title, id",
        COURSE_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(owner_id)
        .fetch_all(pool)
        .await
        .context("Failed to list courses by owner")?;
    rows.iter().map(row_to_course_sqlite).collect()
}

async fn list_available_sqlite(pool: &SqlitePool, group_ids: &[String]) -> Result<Vec<Course>> {
    let sql = if group_ids.is_empty() {
        format!(
            "SELECT {} FROM courses WHERE deleted_at IS NULL AND access_type = 'public' ORDER BY title, id",
            COURSE_COLUMNS
        )
    } else {
        let placeholders = vec!["?"; group_ids.len()].join(", ");
        format!(
            "SELECT {} FROM courses WHERE deleted_at IS NULL AND (access_type = 'public' OR \
             (access_type = 'restricted' AND id IN (SELECT course_id FROM group_courses \
             WHERE deleted_at IS NULL AND group_id IN ({})))) ORDER BY title, id",
            COURSE_COLUMNS, placeholders
        )
    };

    let mut query = sqlx::query(&sql);
    for group_id in group_ids {
        query = query.bind(group_id);
    }
    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to list available courses")?;
    rows.iter().map(row_to_course_sqlite).collect()
}

async fn update_sqlite(pool: &SqlitePool, id: &str, patch: &CoursePatch) -> Result<Option<Course>> {
    let result = sqlx::query(
        "UPDATE courses SET title = COALESCE(?, title), description = COALESCE(?, description), \
         access_type = COALESCE(?, access_type) WHERE id = ? AND deleted_at IS NULL",
    )
    .bind(patch.title.as_deref())
    .bind(patch.description.as_deref())
    .bind(patch.access_type.map(|a| a.as_str()))
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update course")?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    get_by_id_sqlite(pool, id).await
}

async fn set_published_at_sqlite(
    pool: &SqlitePool,
    id: &str,
    published_at: Option<DateTime<Utc>>,
) -> Result<Option<Course>> {
    let result = sqlx::query("UPDATE courses SET published_at = ? WHERE id = ? AND deleted_at IS NULL")
        .bind(published_at)
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update course publication")?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    get_by_id_sqlite(pool, id).await
}

async fn delete_sqlite(pool: &SqlitePool, id: &str) -> Result<()> {
    sqlx::query("UPDATE courses SET deleted_at = ? WHERE id = ? AND deleted_at IS NULL")
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete course")?;
    Ok(())
}

fn row_to_course_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Course> {
    let access_type: String = row.try_get("access_type")?;
    Ok(Course {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        access_type: access_type.parse::<AccessType>()?,
        published_at: row.try_get("published_at")?,
        owner_id: row.try_get("owner_id")?,
    })
}

// PostgreSQL implementations
async fn create_postgres(pool: &PgPool, course: &Course) -> Result<Course> {
    sqlx::query(
        "INSERT INTO courses (id, title, description, access_type, published_at, owner_id) VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(&course.id)
    .bind(&course.title)
    .bind(&course.description)
    .bind(course.access_type.as_str())
    .bind(course.published_at)
    .bind(&course.owner_id)
    .execute(pool)
    .await
    .context("Failed to create course")?;

    Ok(course.clone())
}

async fn get_by_id_postgres(pool: &PgPool, id: &str) -> Result<Option<Course>> {
    let sql = format!(
        "SELECT {} FROM courses WHERE id = $1 AND deleted_at IS NULL",
        COURSE_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get course")?;
    row.map(|r| row_to_course_postgres(&r)).transpose()
}

async fn list_by_owner_postgres(pool: &PgPool, owner_id: &str) -> Result<Vec<Course>> {
    let sql = format!(
        "SELECT {} FROM courses WHERE owner_id = $1 AND deleted_at IS NULL ORDER BY title, id",
        COURSE_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(owner_id)
        .fetch_all(pool)
        .await
        .context("Failed to list courses by owner")?;
    rows.iter().map(row_to_course_postgres).collect()
}

async fn list_available_postgres(pool: &PgPool, group_ids: &[String]) -> Result<Vec<Course>> {
    let sql = format!(
        "SELECT {} FROM courses WHERE deleted_at IS NULL AND (access_type = 'public' OR \
         (access_type = 'restricted' AND id IN (SELECT course_id FROM group_courses \
         WHERE deleted_at IS NULL AND group_id = ANY($1)))) ORDER BY title, id",
        COURSE_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(group_ids)
        .fetch_all(pool)
        .await
        .context("Failed to list available courses")?;
    rows.iter().map(row_to_course_postgres).collect()
}

async fn update_postgres(pool: &PgPool, id: &str, patch: &CoursePatch) -> Result<Option<Course>> {
    let result = sqlx::query(
        "UPDATE courses SET title = COALESCE($1, title), description = COALESCE($2, description), \
         access_type = COALESCE($3, access_type) WHERE id = $4 AND deleted_at IS NULL",
    )
    .bind(patch.title.as_deref())
    .bind(patch.description.as_deref())
    .bind(patch.access_type.map(|a| a.as_str()))
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update course")?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    get_by_id_postgres(pool, id).await
}

async fn set_published_at_postgres(
    pool: &PgPool,
    id: &str,
    published_at: Option<DateTime<Utc>>,
) -> Result<Option<Course>> {
    let result = sqlx::query("UPDATE courses SET published_at = $1 WHERE id = $2 AND deleted_at IS NULL")
        .bind(published_at)
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update course publication")?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    get_by_id_postgres(pool, id).await
}

async fn delete_postgres(pool: &PgPool, id: &str) -> Result<()> {
    sqlx::query("UPDATE courses SET deleted_at = $1 WHERE id = $2 AND deleted_at IS NULL")
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete course")?;
    Ok(())
}

fn row_to_course_postgres(row: &sqlx::postgres::PgRow) -> Result<Course> {
    let access_type: String = row.try_get("access_type")?;
    Ok(Course {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        access_type: access_type.parse::<AccessType>()?,
        published_at: row.try_get("published_at")?,
        owner_id: row.try_get("owner_id")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, schema};

    async fn setup() -> (DynDatabasePool, Arc<dyn CourseRepository>) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        schema::ensure_schema(&pool).await.expect("Failed to bootstrap schema");
        (pool.clone(), SqlxCourseRepository::boxed(pool))
    }

    fn course(id: &str, access_type: AccessType, owner_id: &str) -> Course {
        Course::new(
            id.to_string(),
            format!("Course {}", id),
            "desc".to_string(),
            access_type,
            owner_id.to_string(),
        )
    }

    async fn link(pool: &DynDatabasePool, id: &str, course_id: &str, group_id: &str) {
        sqlx::query("INSERT INTO group_courses (id, course_id, group_id) VALUES (?, ?, ?)")
            .bind(id)
            .bind(course_id)
            .bind(group_id)
            .execute(pool.as_sqlite().unwrap())
            .await
            .unwrap();
    }

    fn ids(courses: &[Course]) -> Vec<&str> {
        let mut ids: Vec<&str> = courses.iter().map(|c| c.id.as_str()).collect();
        ids.sort();
        ids
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (_pool, repo) = setup().await;

        let created = repo.create(&course("c1", AccessType::Public, "o1")).await.unwrap();
        let found = repo.get_by_id("c1").await.unwrap().expect("course exists");

        assert_eq!(found, created);
        assert!(found.published_at.is_none());
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let (_pool, repo) = setup().await;
        assert!(repo.get_by_id("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_id_fails() {
        let (_pool, repo) = setup().await;

        repo.create(&course("c1", AccessType::Public, "o1")).await.unwrap();
        assert!(repo.create(&course("c1", AccessType::Public, "o1")).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_hides_and_is_idempotent() {
        let (_pool, repo) = setup().await;

        repo.create(&course("c1", AccessType::Public, "o1")).await.unwrap();
        repo.delete("c1").await.unwrap();
        repo.delete("c1").await.unwrap();
        repo.delete("never-existed").await.unwrap();

        assert!(repo.get_by_id("c1").await.unwrap().is_none());
        assert!(repo.list_by_owner("o1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_by_owner() {
        let (_pool, repo) = setup().await;

        repo.create(&course("a", AccessType::Public, "o1")).await.unwrap();
        repo.create(&course("b", AccessType::Restricted, "o1")).await.unwrap();
        repo.create(&course("c", AccessType::Public, "o2")).await.unwrap();

        let owned = repo.list_by_owner("o1").await.unwrap();
        assert_eq!(ids(&owned), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_update_patches_only_supplied_fields() {
        let (_pool, repo) = setup().await;

        repo.create(&course("c1", AccessType::Public, "o1")).await.unwrap();
        let patch = CoursePatch {
            access_type: Some(AccessType::Restricted),
            ..CoursePatch::default()
        };
        let updated = repo.update("c1", &patch).await.unwrap().unwrap();

        assert_eq!(updated.access_type, AccessType::Restricted);
        assert_eq!(updated.title, "Course c1");
        assert_eq!(updated.description, "desc");
        assert_eq!(updated.owner_id, "o1");
    }

    #[tokio::test]
    async fn test_update_deleted_returns_none() {
        let (_pool, repo) = setup().await;

        repo.create(&course("c1", AccessType::Public, "o1")).await.unwrap();
        repo.delete("c1").await.unwrap();

        let patch = CoursePatch {
            title: Some("New".to_string()),
            ..CoursePatch::default()
        };
        assert!(repo.update("c1", &patch).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_published_at_round_trip() {
        let (_pool, repo) = setup().await;

        repo.create(&course("c1", AccessType::Public, "o1")).await.unwrap();
        let now = Utc::now();

        let published = repo.set_published_at("c1", Some(now)).await.unwrap().unwrap();
        let stored = published.published_at.expect("timestamp stored");
        assert!((stored - now).num_milliseconds().abs() < 1000);

        let cleared = repo.set_published_at("c1", None).await.unwrap().unwrap();
        assert!(cleared.published_at.is_none());

        assert!(repo.set_published_at("missing", Some(now)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_available_without_groups_is_public_only() {
        let (pool, repo) = setup().await;

        repo.create(&course("pub", AccessType::Public, "o")).await.unwrap();
        repo.create(&course("res", AccessType::Restricted, "o")).await.unwrap();
        link(&pool, "l1", "res", "g1").await;

        let available = repo.list_available(&[]).await.unwrap();
        assert_eq!(ids(&available), vec!["pub"]);
    }

    #[tokio::test]
    async fn test_list_available_is_distinct_union() {
        let (pool, repo) = setup().await;

        repo.create(&course("pub", AccessType::Public, "o")).await.unwrap();
        repo.create(&course("both", AccessType::Restricted, "o")).await.unwrap();
        repo.create(&course("g2only", AccessType::Restricted, "o")).await.unwrap();
        repo.create(&course("other", AccessType::Restricted, "o")).await.unwrap();
        repo.create(&course("gone", AccessType::Restricted, "o")).await.unwrap();
        repo.create(&course("pubgone", AccessType::Public, "o")).await.unwrap();
        link(&pool, "l1", "both", "g1").await;
        link(&pool, "l2", "both", "g2").await;
        link(&pool, "l3", "g2only", "g2").await;
        link(&pool, "l4", "other", "g3").await;
        link(&pool, "l5", "gone", "g1").await;
        // Public course linked to a group must not appear twice
        link(&pool, "l6", "pub", "g1").await;
        repo.delete("gone").await.unwrap();
        repo.delete("pubgone").await.unwrap();

        let groups = vec!["g1".to_string(), "g2".to_string()];
        let available = repo.list_available(&groups).await.unwrap();
        assert_eq!(ids(&available), vec!["both", "g2only", "pub"]);
    }

    #[tokio::test]
    async fn test_list_available_ignores_deleted_links() {
        let (pool, repo) = setup().await;

        repo.create(&course("res", AccessType::Restricted, "o")).await.unwrap();
        link(&pool, "l1", "res", "g1").await;
        sqlx::query("UPDATE group_courses SET deleted_at = CURRENT_TIMESTAMP WHERE id = 'l1'")
            .execute(pool.as_sqlite().unwrap())
            .await
            .unwrap();

        let available = repo.list_available(&["g1".to_string()]).await.unwrap();
        assert!(available.is_empty());
    }
}
