//! `groupcourse.GroupCourseService` endpoints

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::common::{non_empty, EmptyResponse, IdRequest};
use super::{ApiError, AppState};
use crate::models::{CreateGroupCourseInput, GroupCourse, UpdateGroupCourseInput};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/CreateGroupCourse", post(create_group_course))
        .route("/ReadGroupCourse", post(read_group_course))
        .route(
            "/ReadAllGroupCoursesByCourseId",
            post(read_all_group_courses_by_course_id),
        )
        .route(
            "/ReadAllGroupCoursesByGroupId",
            post(read_all_group_courses_by_group_id),
        )
        .route("/UpdateGroupCourse", post(update_group_course))
        .route("/DeleteGroupCourse", post(delete_group_course))
}

#[derive(Debug, Deserialize)]
pub struct CreateGroupCourseRequest {
    #[serde(default)]
    pub course_id: String,
    #[serde(default)]
    pub group_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ReadAllGroupCoursesByCourseIdRequest {
    #[serde(default)]
    pub course_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ReadAllGroupCoursesByGroupIdRequest {
    #[serde(default)]
    pub group_id: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateGroupCourseRequest {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub course_id: String,
    #[serde(default)]
    pub group_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GroupCourseResponse {
    pub group_course: GroupCourse,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GroupCoursesResponse {
    pub group_courses: Vec<GroupCourse>,
}

async fn create_group_course(
    State(state): State<AppState>,
    payload: Result<Json<CreateGroupCourseRequest>, JsonRejection>,
) -> Result<Json<GroupCourseResponse>, ApiError> {
    let Json(req) = payload?;
    let group_course = state
        .group_course_service
        .create(CreateGroupCourseInput {
            course_id: req.course_id,
            group_id: req.group_id,
        })
        .await?;
    Ok(Json(GroupCourseResponse { group_course }))
}

async fn read_group_course(
    State(state): State<AppState>,
    payload: Result<Json<IdRequest>, JsonRejection>,
) -> Result<Json<GroupCourseResponse>, ApiError> {
    let Json(req) = payload?;
    let group_course = state.group_course_service.get_by_id(&req.id).await?;
    Ok(Json(GroupCourseResponse { group_course }))
}

async fn read_all_group_courses_by_course_id(
    State(state): State<AppState>,
    payload: Result<Json<ReadAllGroupCoursesByCourseIdRequest>, JsonRejection>,
) -> Result<Json<GroupCoursesResponse>, ApiError> {
    let Json(req) = payload?;
    let group_courses = state
        .group_course_service
        .list_by_course(&req.course_id)
        .await?;
    Ok(Json(GroupCoursesResponse { group_courses }))
}

async fn read_all_group_courses_by_group_id(
    State(state): State<AppState>,
    payload: Result<Json<ReadAllGroupCoursesByGroupIdRequest>, JsonRejection>,
) -> Result<Json<GroupCoursesResponse>, ApiError> {
    let Json(req) = payload?;
    let group_courses = state
        .group_course_service
        .list_by_group(&req.group_id)
        .await?;
    Ok(Json(GroupCoursesResponse { group_courses }))
}

async fn update_group_course(
    State(state): State<AppState>,
    payload: Result<Json<UpdateGroupCourseRequest>, JsonRejection>,
) -> Result<Json<GroupCourseResponse>, ApiError> {
    let Json(req) = payload?;
    let input = UpdateGroupCourseInput {
        course_id: non_empty(req.course_id),
        group_id: non_empty(req.group_id),
    };
    let group_course = state.group_course_service.update(&req.id, input).await?;
    Ok(Json(GroupCourseResponse { group_course }))
}

async fn delete_group_course(
    State(state): State<AppState>,
    payload: Result<Json<IdRequest>, JsonRejection>,
) -> Result<Json<EmptyResponse>, ApiError> {
    let Json(req) = payload?;
    state.group_course_service.delete(&req.id).await?;
    Ok(Json(EmptyResponse::default()))
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::{call, test_router};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_duplicate_link_is_409() {
        let (app, _state) = test_router().await;
        let req = json!({ "course_id": "c1", "group_id": "g1" });

        let (status, body) = call(&app, "/groupcourse.GroupCourseService/CreateGroupCourse", req.clone()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["group_course"]["group_id"], "g1");

        let (status, body) = call(&app, "/groupcourse.GroupCourseService/CreateGroupCourse", req).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn test_list_by_group_and_course() {
        let (app, _state) = test_router().await;

        for (course, group) in [("c1", "g1"), ("c2", "g1"), ("c1", "g2")] {
            call(
                &app,
                "/groupcourse.GroupCourseService/CreateGroupCourse",
                json!({ "course_id": course, "group_id": group }),
            )
            .await;
        }

        let (_, by_group) = call(
            &app,
            "/groupcourse.GroupCourseService/ReadAllGroupCoursesByGroupId",
            json!({ "group_id": "g1" }),
        )
        .await;
        assert_eq!(by_group["group_courses"].as_array().unwrap().len(), 2);

        let (_, by_course) = call(
            &app,
            "/groupcourse.GroupCourseService/ReadAllGroupCoursesByCourseId",
            json!({ "course_id": "c1" }),
        )
        .await;
        assert_eq!(by_course["group_courses"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_and_delete_link() {
        let (app, _state) = test_router().await;

        let (_, created) = call(
            &app,
            "/groupcourse.GroupCourseService/CreateGroupCourse",
            json!({ "course_id": "c1", "group_id": "g1" }),
        )
        .await;
        let id = created["group_course"]["id"].clone();

        let (status, updated) = call(
            &app,
            "/groupcourse.GroupCourseService/UpdateGroupCourse",
            json!({ "id": id, "group_id": "g7" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["group_course"]["course_id"], "c1");
        assert_eq!(updated["group_course"]["group_id"], "g7");

        let (status, _) = call(
            &app,
            "/groupcourse.GroupCourseService/DeleteGroupCourse",
            json!({ "id": id }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = call(
            &app,
            "/groupcourse.GroupCourseService/ReadGroupCourse",
            json!({ "id": id }),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
