//! Lesson service

use super::{
    new_id, require, supplied, supplied_required, with_deadline, ServiceError, ServiceResult,
};
use crate::db::repositories::LessonRepository;
use crate::models::{CreateLessonInput, Lesson, UpdateLessonInput};
use std::sync::Arc;
use std::time::Duration;

pub struct LessonService {
    repo: Arc<dyn LessonRepository>,
    call_timeout: Duration,
}

impl LessonService {
    pub fn new(repo: Arc<dyn LessonRepository>) -> Self {
        Self::with_call_timeout(repo, super::DEFAULT_CALL_TIMEOUT)
    }

    pub fn with_call_timeout(repo: Arc<dyn LessonRepository>, call_timeout: Duration) -> Self {
        Self { repo, call_timeout }
    }

    /// Append a lesson to the end of its module
    pub async fn create(&self, input: CreateLessonInput) -> ServiceResult<Lesson> {
        require("title", &input.title)?;
        require("module_id", &input.module_id)?;

        let lesson = Lesson::new(
            new_id(),
            input.title,
            input.description,
            input.content,
            input.module_id,
        );
        let created = with_deadline(self.call_timeout, self.repo.create(lesson)).await?;

        tracing::info!(
            lesson_id = %created.id,
            module_id = %created.module_id,
            position = created.position,
            "Created lesson"
        );
        Ok(created)
    }

    pub async fn get_by_id(&self, id: &str) -> ServiceResult<Lesson> {
        with_deadline(self.call_timeout, self.repo.get_by_id(id))
            .await?
            .ok_or_else(|| ServiceError::not_found("Lesson", id))
    }

    pub async fn list_by_module(&self, module_id: &str) -> ServiceResult<Vec<Lesson>> {
        with_deadline(self.call_timeout, self.repo.list_by_module(module_id)).await
    }

    pub async fn update(&self, id: &str, input: UpdateLessonInput) -> ServiceResult<Lesson> {
        let input = UpdateLessonInput {
            title: supplied_required("title", input.title)?,
            description: supplied(input.description),
            content: supplied(input.content),
        };

        with_deadline(self.call_timeout, self.repo.update(id, &input))
            .await?
            .ok_or_else(|| ServiceError::not_found("Lesson", id))
    }

    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        with_deadline(self.call_timeout, self.repo.delete(id)).await
    }
}
