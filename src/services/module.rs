//! Module service

use super::{
    new_id, require, supplied, supplied_required, with_deadline, ServiceError, ServiceResult,
};
use crate::db::repositories::ModuleRepository;
use crate::models::{CreateModuleInput, Module, UpdateModuleInput};
use std::sync::Arc;
use std::time::Duration;

pub struct ModuleService {
    repo: Arc<dyn ModuleRepository>,
    call_timeout: Duration,
}

impl ModuleService {
    pub fn new(repo: Arc<dyn ModuleRepository>) -> Self {
        Self::with_call_timeout(repo, super::DEFAULT_CALL_TIMEOUT)
    }

    pub fn with_call_timeout(repo: Arc<dyn ModuleRepository>, call_timeout: Duration) -> Self {
        Self { repo, call_timeout }
    }

    /// Append a module to the end of its course.
    ///
    /// The course is not required to exist.
    pub async fn create(&self, input: CreateModuleInput) -> ServiceResult<Module> {
        require("title", &input.title)?;
        require("course_id", &input.course_id)?;

        let module = Module::new(new_id(), input.title, input.description, input.course_id);
        let created = with_deadline(self.call_timeout, self.repo.create(module)).await?;

        tracing::info!(
            module_id = %created.id,
            course_id = %created.course_id,
            position = created.position,
            "Created module"
        );
        Ok(created)
    }

    pub async fn get_by_id(&self, id: &str) -> ServiceResult<Module> {
        with_deadline(self.call_timeout, self.repo.get_by_id(id))
            .await?
            .ok_or_else(|| ServiceError::not_found("Module", id))
    }

    pub async fn list_by_course(&self, course_id: &str) -> ServiceResult<Vec<Module>> {
        with_deadline(self.call_timeout, self.repo.list_by_course(course_id)).await
    }

    /// Patch title and description; position and course never change
    pub async fn update(&self, id: &str, input: UpdateModuleInput) -> ServiceResult<Module> {
        let input = UpdateModuleInput {
            title: supplied_required("title", input.title)?,
            description: supplied(input.description),
        };

        with_deadline(self.call_timeout, self.repo.update(id, &input))
            .await?
            .ok_or_else(|| ServiceError::not_found("Module", id))
    }

    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        with_deadline(self.call_timeout, self.repo.delete(id)).await
    }
}
