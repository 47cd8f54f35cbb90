//! `lesson.LessonService` endpoints

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::common::{non_empty, EmptyResponse, IdRequest};
use super::{ApiError, AppState};
use crate::models::{CreateLessonInput, Lesson, UpdateLessonInput};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/CreateLesson", post(create_lesson))
        .route("/ReadLesson", post(read_lesson))
        .route("/ReadAllLessonsByModuleId", post(read_all_lessons_by_module_id))
        .route("/UpdateLesson", post(update_lesson))
        .route("/DeleteLesson", post(delete_lesson))
}

#[derive(Debug, Deserialize)]
pub struct CreateLessonRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub module_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ReadAllLessonsByModuleIdRequest {
    #[serde(default)]
    pub module_id: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateLessonRequest {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LessonResponse {
    pub lesson: Lesson,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LessonsResponse {
    pub lessons: Vec<Lesson>,
}

async fn create_lesson(
    State(state): State<AppState>,
    payload: Result<Json<CreateLessonRequest>, JsonRejection>,
) -> Result<Json<LessonResponse>, ApiError> {
    let Json(req) = payload?;
    let lesson = state
        .lesson_service
        .create(CreateLessonInput {
            title: req.title,
            description: req.description,
            content: req.content,
            module_id: req.module_id,
        })
        .await?;
    Ok(Json(LessonResponse { lesson }))
}

async fn read_lesson(
    State(state): State<AppState>,
    payload: Result<Json<IdRequest>, JsonRejection>,
) -> Result<Json<LessonResponse>, ApiError> {
    let Json(req) = payload?;
    let lesson = state.lesson_service.get_by_id(&req.id).await?;
    Ok(Json(LessonResponse { lesson }))
}

async fn read_all_lessons_by_module_id(
    State(state): State<AppState>,
    payload: Result<Json<ReadAllLessonsByModuleIdRequest>, JsonRejection>,
) -> Result<Json<LessonsResponse>, ApiError> {
    let Json(req) = payload?;
    let lessons = state.lesson_service.list_by_module(&req.module_id).await?;
    Ok(Json(LessonsResponse { lessons }))
}

async fn update_lesson(
    State(state): State<AppState>,
    payload: Result<Json<UpdateLessonRequest>, JsonRejection>,
) -> Result<Json<LessonResponse>, ApiError> {
    let Json(req) = payload?;
    let input = UpdateLessonInput {
        title: non_empty(req.title),
        description: non_empty(req.description),
        content: non_empty(req.content),
    };
    let lesson = state.lesson_service.update(&req.id, input).await?;
    Ok(Json(LessonResponse { lesson }))
}

async fn delete_lesson(
    State(state): State<AppState>,
    payload: Result<Json<IdRequest>, JsonRejection>,
) -> Result<Json<EmptyResponse>, ApiError> {
    let Json(req) = payload?;
    state.lesson_service.delete(&req.id).await?;
    Ok(Json(EmptyResponse::default()))
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::{call, test_router};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_lesson_round_trip() {
        let (app, _state) = test_router().await;

        let (status, created) = call(
            &app,
            "/lesson.LessonService/CreateLesson",
            json!({ "title": "Borrowing", "content": "text", "module_id": "m1" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(created["lesson"]["position"], 1);
        assert_eq!(created["lesson"]["description"], "");

        let id = created["lesson"]["id"].clone();
        let (_, updated) = call(
            &app,
            "/lesson.LessonService/UpdateLesson",
            json!({ "id": id, "content": "more text" }),
        )
        .await;
        assert_eq!(updated["lesson"]["title"], "Borrowing");
        assert_eq!(updated["lesson"]["content"], "more text");

        let (_, listed) = call(
            &app,
            "/lesson.LessonService/ReadAllLessonsByModuleId",
            json!({ "module_id": "m1" }),
        )
        .await;
        assert_eq!(listed["lessons"][0], updated["lesson"]);
    }

    #[tokio::test]
    async fn test_update_missing_lesson_is_404() {
        let (app, _state) = test_router().await;

        let (status, body) = call(
            &app,
            "/lesson.LessonService/UpdateLesson",
            json!({ "id": "missing", "title": "x" }),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }
}
