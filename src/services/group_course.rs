//! Group-course link service
//!
//! At most one live link exists per (course, group) pair. The check here
//! gives a clean `AlreadyExists`; the unique index catches the racing case.

use super::{new_id, require, supplied_required, with_deadline, ServiceError, ServiceResult};
use crate::db::repositories::GroupCourseRepository;
use crate::models::{CreateGroupCourseInput, GroupCourse, UpdateGroupCourseInput};
use std::sync::Arc;
use std::time::Duration;

pub struct GroupCourseService {
    repo: Arc<dyn GroupCourseRepository>,
    call_timeout: Duration,
}

impl GroupCourseService {
    pub fn new(repo: Arc<dyn GroupCourseRepository>) -> Self {
        Self::with_call_timeout(repo, super::DEFAULT_CALL_TIMEOUT)
    }

    pub fn with_call_timeout(
        repo: Arc<dyn GroupCourseRepository>,
        call_timeout: Duration,
    ) -> Self {
        Self { repo, call_timeout }
    }

    /// Link a group to a course
    ///
    /// # Errors
    /// - `Validation` if either id is blank
    /// - `AlreadyExists` if the pair is already linked
    pub async fn create(&self, input: CreateGroupCourseInput) -> ServiceResult<GroupCourse> {
        require("course_id", &input.course_id)?;
        require("group_id", &input.group_id)?;

        let link = GroupCourse {
            id: new_id(),
            course_id: input.course_id,
            group_id: input.group_id,
        };

        let repo = &self.repo;
        let created = with_deadline(self.call_timeout, async {
            if repo
                .find_active(&link.course_id, &link.group_id)
                .await?
                .is_some()
            {
                return Ok(None);
            }
            repo.create(&link).await.map(Some)
        })
        .await
        .map_err(|e| duplicate_or(e, &link.course_id, &link.group_id))?
        .ok_or_else(|| duplicate(&link.course_id, &link.group_id))?;

        tracing::info!(
            link_id = %created.id,
            course_id = %created.course_id,
            group_id = %created.group_id,
            "Linked group to course"
        );
        Ok(created)
    }

    pub async fn get_by_id(&self, id: &str) -> ServiceResult<GroupCourse> {
        with_deadline(self.call_timeout, self.repo.get_by_id(id))
            .await?
            .ok_or_else(|| ServiceError::not_found("GroupCourse", id))
    }

    pub async fn list_by_course(&self, course_id: &str) -> ServiceResult<Vec<GroupCourse>> {
        with_deadline(self.call_timeout, self.repo.list_by_course(course_id)).await
    }

    pub async fn list_by_group(&self, group_id: &str) -> ServiceResult<Vec<GroupCourse>> {
        with_deadline(self.call_timeout, self.repo.list_by_group(group_id)).await
    }

    /// Re-point a link at another course and/or group
    ///
    /// # Errors
    /// - `Validation` if a supplied id is blank
    /// - `NotFound` if the link is absent or deleted
    /// - `AlreadyExists` if the resulting pair is linked by another record
    pub async fn update(
        &self,
        id: &str,
        input: UpdateGroupCourseInput,
    ) -> ServiceResult<GroupCourse> {
        let input = UpdateGroupCourseInput {
            course_id: supplied_required("course_id", input.course_id)?,
            group_id: supplied_required("group_id", input.group_id)?,
        };

        let repo = &self.repo;
        let current = with_deadline(self.call_timeout, repo.get_by_id(id))
            .await?
            .ok_or_else(|| ServiceError::not_found("GroupCourse", id))?;

        let course_id = input.course_id.as_deref().unwrap_or(&current.course_id);
        let group_id = input.group_id.as_deref().unwrap_or(&current.group_id);

        let existing = with_deadline(self.call_timeout, repo.find_active(course_id, group_id)).await?;
        if existing.is_some_and(|other| other.id != id) {
            return Err(duplicate(course_id, group_id));
        }

        with_deadline(self.call_timeout, repo.update(id, &input))
            .await
            .map_err(|e| duplicate_or(e, course_id, group_id))?
            .ok_or_else(|| ServiceError::not_found("GroupCourse", id))
    }

    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        with_deadline(self.call_timeout, self.repo.delete(id)).await
    }
}

fn duplicate(course_id: &str, group_id: &str) -> ServiceError {
    ServiceError::AlreadyExists(format!(
        "group {} is already linked to course {}",
        group_id, course_id
    ))
}

fn duplicate_or(err: ServiceError, course_id: &str, group_id: &str) -> ServiceError {
    if err.is_unique_violation() {
        duplicate(course_id, group_id)
    } else {
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxGroupCourseRepository;
    use crate::db::{create_test_pool, schema};

    async fn setup_test_service() -> GroupCourseService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        schema::ensure_schema(&pool)
            .await
            .expect("Failed to bootstrap schema");
        GroupCourseService::new(SqlxGroupCourseRepository::boxed(pool))
    }

    fn input(course_id: &str, group_id: &str) -> CreateGroupCourseInput {
        CreateGroupCourseInput {
            course_id: course_id.to_string(),
            group_id: group_id.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_read() {
        let service = setup_test_service().await;

        let link = service.create(input("c1", "g1")).await.unwrap();
        assert!(uuid::Uuid::parse_str(&link.id).is_ok());
        assert_eq!(service.get_by_id(&link.id).await.unwrap(), link);
    }

    #[tokio::test]
    async fn test_duplicate_link_already_exists() {
        let service = setup_test_service().await;

        service.create(input("c1", "g1")).await.unwrap();
        assert!(matches!(
            service.create(input("c1", "g1")).await,
            Err(ServiceError::AlreadyExists(_))
        ));
        service.create(input("c1", "g2")).await.unwrap();
    }

    #[tokio::test]
    async fn test_relink_after_delete() {
        let service = setup_test_service().await;

        let first = service.create(input("c1", "g1")).await.unwrap();
        service.delete(&first.id).await.unwrap();

        let second = service.create(input("c1", "g1")).await.unwrap();
        assert_ne!(first.id, second.id);
        assert!(matches!(
            service.get_by_id(&first.id).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_listing() {
        let service = setup_test_service().await;

        service.create(input("c1", "g1")).await.unwrap();
        service.create(input("c1", "g2")).await.unwrap();
        service.create(input("c2", "g1")).await.unwrap();

        assert_eq!(service.list_by_course("c1").await.unwrap().len(), 2);
        let by_group = service.list_by_group("g1").await.unwrap();
        assert!(by_group.iter().all(|l| l.group_id == "g1"));
        assert_eq!(by_group.len(), 2);
    }

    #[tokio::test]
    async fn test_update_repoints_and_rejects_collision() {
        let service = setup_test_service().await;

        let a = service.create(input("c1", "g1")).await.unwrap();
        service.create(input("c1", "g2")).await.unwrap();

        let collision = service
            .update(
                &a.id,
                UpdateGroupCourseInput {
                    course_id: None,
                    group_id: Some("g2".to_string()),
                },
            )
            .await;
        assert!(matches!(collision, Err(ServiceError::AlreadyExists(_))));

        let moved = service
            .update(
                &a.id,
                UpdateGroupCourseInput {
                    course_id: Some(String::new()),
                    group_id: Some("g3".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(moved.course_id, "c1");
        assert_eq!(moved.group_id, "g3");

        // No-op patch on its own pair is not a collision
        let same = service
            .update(&a.id, UpdateGroupCourseInput::default())
            .await
            .unwrap();
        assert_eq!(same, moved);
    }

    #[tokio::test]
    async fn test_update_rejects_blank_ids() {
        let service = setup_test_service().await;
        let link = service.create(input("c1", "g1")).await.unwrap();

        for patch in [
            UpdateGroupCourseInput {
                course_id: Some("  ".to_string()),
                group_id: None,
            },
            UpdateGroupCourseInput {
                course_id: None,
                group_id: Some("  ".to_string()),
            },
        ] {
            assert!(matches!(
                service.update(&link.id, patch).await,
                Err(ServiceError::Validation(_))
            ));
        }

        let stored = service.get_by_id(&link.id).await.unwrap();
        assert_eq!(stored.course_id, "c1");
        assert_eq!(stored.group_id, "g1");
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let service = setup_test_service().await;
        assert!(matches!(
            service
                .update(
                    "missing",
                    UpdateGroupCourseInput {
                        group_id: Some("g".to_string()),
                        ..UpdateGroupCourseInput::default()
                    }
                )
                .await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
