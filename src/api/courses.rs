//! `course.CourseService` endpoints

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::{non_empty, EmptyResponse, IdRequest};
use super::{ApiError, AppState};
use crate::models::{Course, CreateCourseInput, UpdateCourseInput};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/CreateCourse", post(create_course))
        .route("/ReadCourse", post(read_course))
        .route("/ReadAllCoursesByOwnerId", post(read_all_courses_by_owner_id))
        .route("/ReadAllAvailableCourses", post(read_all_available_courses))
        .route("/UpdateCourse", post(update_course))
        .route("/UpdatePublishedAt", post(update_published_at))
        .route("/DeleteCourse", post(delete_course))
}

/// Wire shape of a course
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct CourseMessage {
    pub id: String,
    pub title: String,
    pub description: String,
    pub access_type: String,
    pub is_published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub owner_id: String,
}

impl From<Course> for CourseMessage {
    fn from(course: Course) -> Self {
        Self {
            is_published: course.is_published(),
            access_type: course.access_type.to_string(),
            id: course.id,
            title: course.title,
            description: course.description,
            published_at: course.published_at,
            owner_id: course.owner_id,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateCourseRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub access_type: String,
    #[serde(default)]
    pub owner_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ReadAllCoursesByOwnerIdRequest {
    #[serde(default)]
    pub owner_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ReadAllAvailableCoursesRequest {
    #[serde(default)]
    pub group_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCourseRequest {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub access_type: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CourseResponse {
    pub course: CourseMessage,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CoursesResponse {
    pub courses: Vec<CourseMessage>,
}

fn courses_response(courses: Vec<Course>) -> Json<CoursesResponse> {
    Json(CoursesResponse {
        courses: courses.into_iter().map(CourseMessage::from).collect(),
    })
}

async fn create_course(
    State(state): State<AppState>,
    payload: Result<Json<CreateCourseRequest>, JsonRejection>,
) -> Result<Json<CourseResponse>, ApiError> {
    let Json(req) = payload?;
    let course = state
        .course_service
        .create(CreateCourseInput {
            title: req.title,
            description: req.description,
            access_type: req.access_type,
            owner_id: req.owner_id,
        })
        .await?;
    Ok(Json(CourseResponse {
        course: course.into(),
    }))
}

async fn read_course(
    State(state): State<AppState>,
    payload: Result<Json<IdRequest>, JsonRejection>,
) -> Result<Json<CourseResponse>, ApiError> {
    let Json(req) = payload?;
    let course = state.course_service.get_by_id(&req.id).await?;
    Ok(Json(CourseResponse {
        course: course.into(),
    }))
}

async fn read_all_courses_by_owner_id(
    State(state): State<AppState>,
    payload: Result<Json<ReadAllCoursesByOwnerIdRequest>, JsonRejection>,
) -> Result<Json<CoursesResponse>, ApiError> {
    let Json(req) = payload?;
    let courses = state.course_service.list_by_owner(&req.owner_id).await?;
    Ok(courses_response(courses))
}

async fn read_all_available_courses(
    State(state): State<AppState>,
    payload: Result<Json<ReadAllAvailableCoursesRequest>, JsonRejection>,
) -> Result<Json<CoursesResponse>, ApiError> {
    let Json(req) = payload?;
    let courses = state.course_service.list_available(req.group_ids).await?;
    Ok(courses_response(courses))
}

async fn update_course(
    State(state): State<AppState>,
    payload: Result<Json<UpdateCourseRequest>, JsonRejection>,
) -> Result<Json<CourseResponse>, ApiError> {
    let Json(req) = payload?;
    let input = UpdateCourseInput {
        title: non_empty(req.title),
        description: non_empty(req.description),
        access_type: non_empty(req.access_type),
    };
    let course = state.course_service.update(&req.id, input).await?;
    Ok(Json(CourseResponse {
        course: course.into(),
    }))
}

/// Flips the publication state and returns the course after the change
async fn update_published_at(
    State(state): State<AppState>,
    payload: Result<Json<IdRequest>, JsonRejection>,
) -> Result<Json<CourseResponse>, ApiError> {
    let Json(req) = payload?;
    let course = state.course_service.toggle_published(&req.id).await?;
    Ok(Json(CourseResponse {
        course: course.into(),
    }))
}

async fn delete_course(
    State(state): State<AppState>,
    payload: Result<Json<IdRequest>, JsonRejection>,
) -> Result<Json<EmptyResponse>, ApiError> {
    let Json(req) = payload?;
    state.course_service.delete(&req.id).await?;
    Ok(Json(EmptyResponse::default()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{call, test_router};
    use axum::http::StatusCode;
    use serde_json::{json, Value};

    async fn create(app: &Router, title: &str, access_type: &str) -> Value {
        let (status, body) = call(
            app,
            "/course.CourseService/CreateCourse",
            json!({ "title": title, "description": "d", "access_type": access_type, "owner_id": "o1" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        body["course"].clone()
    }

    #[tokio::test]
    async fn test_create_and_read_course() {
        let (app, _state) = test_router().await;

        let created = create(&app, "Rust", "public").await;
        assert_eq!(created["is_published"], false);
        assert!(created["published_at"].is_null());
        assert_eq!(created["access_type"], "public");

        let (status, body) = call(
            &app,
            "/course.CourseService/ReadCourse",
            json!({ "id": created["id"] }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["course"], created);
    }

    #[tokio::test]
    async fn test_read_missing_course_is_404() {
        let (app, _state) = test_router().await;

        let (status, body) = call(
            &app,
            "/course.CourseService/ReadCourse",
            json!({ "id": "missing" }),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_invalid_access_type_is_400() {
        let (app, _state) = test_router().await;

        let (status, body) = call(
            &app,
            "/course.CourseService/CreateCourse",
            json!({ "title": "Rust", "access_type": "secret", "owner_id": "o1" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_malformed_body_is_400() {
        let (app, _state) = test_router().await;

        let (status, body) = call(
            &app,
            "/course.CourseService/ReadAllAvailableCourses",
            json!({ "group_ids": "g1" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_update_with_empty_fields_keeps_values() {
        let (app, _state) = test_router().await;
        let created = create(&app, "Rust", "public").await;

        let (status, body) = call(
            &app,
            "/course.CourseService/UpdateCourse",
            json!({ "id": created["id"], "title": "", "description": "", "access_type": "restricted" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["course"]["title"], "Rust");
        assert_eq!(body["course"]["description"], "d");
        assert_eq!(body["course"]["access_type"], "restricted");
    }

    #[tokio::test]
    async fn test_update_published_at_toggles() {
        let (app, _state) = test_router().await;
        let created = create(&app, "Rust", "public").await;
        let req = json!({ "id": created["id"] });

        let (_, first) = call(&app, "/course.CourseService/UpdatePublishedAt", req.clone()).await;
        assert_eq!(first["course"]["is_published"], true);
        assert!(first["course"]["published_at"].is_string());

        let (_, second) = call(&app, "/course.CourseService/UpdatePublishedAt", req).await;
        assert_eq!(second["course"]["is_published"], false);
        assert!(second["course"]["published_at"].is_null());
    }

    #[tokio::test]
    async fn test_available_and_owner_listing() {
        let (app, _state) = test_router().await;
        let public = create(&app, "Public", "public").await;
        let restricted = create(&app, "Restricted", "restricted").await;
        create(&app, "Hidden", "restricted").await;

        let (status, _) = call(
            &app,
            "/groupcourse.GroupCourseService/CreateGroupCourse",
            json!({ "course_id": restricted["id"], "group_id": "g1" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = call(
            &app,
            "/course.CourseService/ReadAllAvailableCourses",
            json!({ "group_ids": ["g1", "g2"] }),
        )
        .await;
        let mut ids: Vec<&str> = body["courses"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["id"].as_str().unwrap())
            .collect();
        ids.sort();
        let mut expected = vec![public["id"].as_str().unwrap(), restricted["id"].as_str().unwrap()];
        expected.sort();
        assert_eq!(ids, expected);

        let (_, owned) = call(
            &app,
            "/course.CourseService/ReadAllCoursesByOwnerId",
            json!({ "owner_id": "o1" }),
        )
        .await;
        assert_eq!(owned["courses"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_delete_then_read_is_404() {
        let (app, _state) = test_router().await;
        let created = create(&app, "Rust", "public").await;
        let req = json!({ "id": created["id"] });

        let (status, body) = call(&app, "/course.CourseService/DeleteCourse", req.clone()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({}));

        let (status, _) = call(&app, "/course.CourseService/ReadCourse", req).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
