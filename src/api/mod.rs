//! API layer - RPC-style HTTP handlers and routing
//!
//! Each catalog service is mounted under `/<package>.<Service>` and every
//! method is a `POST /<package>.<Service>/<Method>` taking and returning JSON:
//! - `course.CourseService`
//! - `module.ModuleService`
//! - `lesson.LessonService`
//! - `groupcourse.GroupCourseService`
//!
//! `GET /healthz` reports database reachability.

pub mod common;
pub mod courses;
pub mod error;
pub mod group_courses;
pub mod lessons;
pub mod modules;

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ApiErrorDetail};

use crate::db::repositories::{
    SqlxCourseRepository, SqlxGroupCourseRepository, SqlxLessonRepository, SqlxModuleRepository,
};
use crate::db::DynDatabasePool;
use crate::services::{CourseService, GroupCourseService, LessonService, ModuleService};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub pool: DynDatabasePool,
    pub course_service: Arc<CourseService>,
    pub module_service: Arc<ModuleService>,
    pub lesson_service: Arc<LessonService>,
    pub group_course_service: Arc<GroupCourseService>,
    /// Also bounds the health check's database ping
    pub call_timeout: Duration,
}

impl AppState {
    /// Wire every service to `pool`, bounding store calls by `call_timeout`
    pub fn new(pool: DynDatabasePool, call_timeout: Duration) -> Self {
        Self {
            course_service: Arc::new(CourseService::with_call_timeout(
                SqlxCourseRepository::boxed(pool.clone()),
                call_timeout,
            )),
            module_service: Arc::new(ModuleService::with_call_timeout(
                SqlxModuleRepository::boxed(pool.clone()),
                call_timeout,
            )),
            lesson_service: Arc::new(LessonService::with_call_timeout(
                SqlxLessonRepository::boxed(pool.clone()),
                call_timeout,
            )),
            group_course_service: Arc::new(GroupCourseService::with_call_timeout(
                SqlxGroupCourseRepository::boxed(pool.clone()),
                call_timeout,
            )),
            pool,
            call_timeout,
        }
    }
}

/// Build the complete router with middleware
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .nest("/course.CourseService", courses::router())
        .nest("/module.ModuleService", modules::router())
        .nest("/lesson.LessonService", lessons::router())
        .nest("/groupcourse.GroupCourseService", group_courses::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    match tokio::time::timeout(state.call_timeout, state.pool.ping()).await {
        Ok(Ok(())) => Ok(Json(json!({ "status": "ok" }))),
        Ok(Err(e)) => {
            tracing::error!("Health check failed: {:#}", e);
            Err(ApiError::unavailable("Database unreachable"))
        }
        Err(_) => {
            tracing::warn!(limit = ?state.call_timeout, "Health check exceeded deadline");
            Err(ApiError::unavailable("Database did not respond in time"))
        }
    }
}
