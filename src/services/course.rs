//! Course service
//!
//! Implements business logic for course management:
//! - Create, read, patch-update and soft-delete courses
//! - Listing by owner and by group visibility
//! - Publication toggling

use super::{
    new_id, require, supplied, supplied_required, with_deadline, ServiceError, ServiceResult,
};
use crate::db::repositories::CourseRepository;
use crate::models::{AccessType, Course, CoursePatch, CreateCourseInput, UpdateCourseInput};
use chrono::Utc;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

/// Course service
pub struct CourseService {
    repo: Arc<dyn CourseRepository>,
    call_timeout: Duration,
}

impl CourseService {
    /// Create a new course service with the default call deadline
    pub fn new(repo: Arc<dyn CourseRepository>) -> Self {
        Self::with_call_timeout(repo, super::DEFAULT_CALL_TIMEOUT)
    }

    /// Create a new course service with a custom call deadline
    pub fn with_call_timeout(repo: Arc<dyn CourseRepository>, call_timeout: Duration) -> Self {
        Self { repo, call_timeout }
    }

    /// Create a new, unpublished course
    ///
    /// # Errors
    /// - `Validation` if the title or owner is blank or the access type is unknown
    pub async fn create(&self, input: CreateCourseInput) -> ServiceResult<Course> {
        require("title", &input.title)?;
        require("owner_id", &input.owner_id)?;
        let access_type = parse_access_type(&input.access_type)?;

        let course = Course::new(
            new_id(),
            input.title,
            input.description,
            access_type,
            input.owner_id,
        );
        let created = with_deadline(self.call_timeout, self.repo.create(&course)).await?;

        tracing::info!(course_id = %created.id, owner_id = %created.owner_id, "Created course");
        Ok(created)
    }

    pub async fn get_by_id(&self, id: &str) -> ServiceResult<Course> {
        with_deadline(self.call_timeout, self.repo.get_by_id(id))
            .await?
            .ok_or_else(|| ServiceError::not_found("Course", id))
    }

    pub async fn list_by_owner(&self, owner_id: &str) -> ServiceResult<Vec<Course>> {
        with_deadline(self.call_timeout, self.repo.list_by_owner(owner_id)).await
    }

    /// Courses visible to a member of `group_ids`: every public course plus
    /// the restricted courses linked to one of the groups. Blank and repeated
    /// group ids are ignored.
    pub async fn list_available(&self, group_ids: Vec<String>) -> ServiceResult<Vec<Course>> {
        let groups: Vec<String> = group_ids
            .into_iter()
            .filter(|g| !g.trim().is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        with_deadline(self.call_timeout, self.repo.list_available(&groups)).await
    }

    /// Patch a course. Absent or empty fields keep their stored value.
    ///
    /// # Errors
    /// - `Validation` if a supplied access type is unknown or the title is blank
    /// - `NotFound` if the course is absent or deleted
    pub async fn update(&self, id: &str, input: UpdateCourseInput) -> ServiceResult<Course> {
        let patch = CoursePatch {
            title: supplied_required("title", input.title)?,
            description: supplied(input.description),
            access_type: supplied(input.access_type)
                .map(|a| parse_access_type(&a))
                .transpose()?,
        };

        with_deadline(self.call_timeout, self.repo.update(id, &patch))
            .await?
            .ok_or_else(|| ServiceError::not_found("Course", id))
    }

    /// Publish an unpublished course or unpublish a published one.
    /// Returns the course after the change.
    pub async fn toggle_published(&self, id: &str) -> ServiceResult<Course> {
        let repo = &self.repo;
        let toggled = with_deadline(self.call_timeout, async move {
            let Some(course) = repo.get_by_id(id).await? else {
                return Ok(None);
            };
            let published_at = if course.is_published() {
                None
            } else {
                Some(Utc::now())
            };
            repo.set_published_at(id, published_at).await
        })
        .await?
        .ok_or_else(|| ServiceError::not_found("Course", id))?;

        tracing::info!(course_id = %id, published = toggled.is_published(), "Toggled course publication");
        Ok(toggled)
    }

    /// Soft-delete a course. Deleting an unknown or deleted course succeeds.
    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        with_deadline(self.call_timeout, self.repo.delete(id)).await
    }
}

fn parse_access_type(value: &str) -> ServiceResult<AccessType> {
    value.parse::<AccessType>().map_err(|_| {
        ServiceError::Validation(format!(
            "access_type must be 'public' or 'restricted', got '{}'",
            value
        ))
    })
}
