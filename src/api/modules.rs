//! `module.ModuleService` endpoints

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::common::{non_empty, EmptyResponse, IdRequest};
use super::{ApiError, AppState};
use crate::models::{CreateModuleInput, Module, UpdateModuleInput};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/CreateModule", post(create_module))
        .route("/ReadModule", post(read_module))
        .route("/ReadAllModulesByCourseId", post(read_all_modules_by_course_id))
        .route("/UpdateModule", post(update_module))
        .route("/DeleteModule", post(delete_module))
}

#[derive(Debug, Deserialize)]
pub struct CreateModuleRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub course_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ReadAllModulesByCourseIdRequest {
    #[serde(default)]
    pub course_id: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateModuleRequest {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModuleResponse {
    pub module: Module,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModulesResponse {
    pub modules: Vec<Module>,
}

async fn create_module(
    State(state): State<AppState>,
    payload: Result<Json<CreateModuleRequest>, JsonRejection>,
) -> Result<Json<ModuleResponse>, ApiError> {
    let Json(req) = payload?;
    let module = state
        .module_service
        .create(CreateModuleInput {
            title: req.title,
            description: req.description,
            course_id: req.course_id,
        })
        .await?;
    Ok(Json(ModuleResponse { module }))
}

async fn read_module(
    State(state): State<AppState>,
    payload: Result<Json<IdRequest>, JsonRejection>,
) -> Result<Json<ModuleResponse>, ApiError> {
    let Json(req) = payload?;
    let module = state.module_service.get_by_id(&req.id).await?;
    Ok(Json(ModuleResponse { module }))
}

async fn read_all_modules_by_course_id(
    State(state): State<AppState>,
    payload: Result<Json<ReadAllModulesByCourseIdRequest>, JsonRejection>,
) -> Result<Json<ModulesResponse>, ApiError> {
    let Json(req) = payload?;
    let modules = state.module_service.list_by_course(&req.course_id).await?;
    Ok(Json(ModulesResponse { modules }))
}

async fn update_module(
    State(state): State<AppState>,
    payload: Result<Json<UpdateModuleRequest>, JsonRejection>,
) -> Result<Json<ModuleResponse>, ApiError> {
    let Json(req) = payload?;
    let input = UpdateModuleInput {
        title: non_empty(req.title),
        description: non_empty(req.description),
    };
    let module = state.module_service.update(&req.id, input).await?;
    Ok(Json(ModuleResponse { module }))
}

async fn delete_module(
    State(state): State<AppState>,
    payload: Result<Json<IdRequest>, JsonRejection>,
) -> Result<Json<EmptyResponse>, ApiError> {
    let Json(req) = payload?;
    state.module_service.delete(&req.id).await?;
    Ok(Json(EmptyResponse::default()))
}
