use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use crate::db::{
    self,
    models::{Task, TaskStatus},
};
use crate::error::{AppError, AppResult};
use crate::extractors::AuthUser;
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    pub assigned_to: Option<String>,
    pub due_date: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    #[serde(default)]
    pub status: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/groups/{id}/tasks", post(create_task).get(list_tasks))
        .route("/tasks/{id}/status", post(update_status))
}

async fn create_task(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(group_id): Path<String>,
    Json(req): Json<CreateTaskRequest>,
) -> AppResult<Response> {
    let title = req.title.trim().to_string();
    if title.is_empty() {
        return Err(AppError::BadRequest("Task title is required".into()));
    }

    let conn = state.db.get()?;
    if db::groups::get(&conn, &group_id)?.is_none() {
        return Err(AppError::NotFound("Group"));
    }

    let task = Task {
        id: uuid::Uuid::now_v7().to_string(),
        group_id,
        title,
        description: req.description,
        assigned_to: req.assigned_to,
        status: TaskStatus::Pending,
        due_date: req.due_date,
        created_at: db::now_utc(),
    };
    db::tasks::insert(&conn, &task)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Task created successfully", "task": task })),
    )
        .into_response())
}

async fn list_tasks(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
) -> AppResult<Json<Vec<Task>>> {
    let conn = state.db.get()?;
    if db::groups::get(&conn, &group_id)?.is_none() {
        return Err(AppError::NotFound("Group"));
    }
    Ok(Json(db::tasks::list_for_group(&conn, &group_id)?))
}

async fn update_status(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let status = TaskStatus::parse(req.status.trim())
        .ok_or_else(|| AppError::BadRequest(format!("Invalid task status: {}", req.status)))?;

    let conn = state.db.get()?;
    let mut task = db::tasks::get(&conn, &id)?.ok_or(AppError::NotFound("Task"))?;
    db::tasks::update_status(&conn, &id, status)?;
    task.status = status;

    Ok(Json(
        json!({ "message": "Task updated successfully", "task": task }),
    ))
}
