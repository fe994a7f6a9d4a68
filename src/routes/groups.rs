use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use rusqlite::TransactionBehavior;
use serde::Deserialize;
use serde_json::json;

use crate::db::{self, models::Group};
use crate::error::{AppError, AppResult};
use crate::extractors::AuthUser;
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/groups", post(create_group).get(list_groups))
        .route("/groups/joined", get(joined_groups))
        .route("/groups/{id}/join", post(join_group))
        .route("/groups/{id}/leave", post(leave_group))
}

async fn create_group(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateGroupRequest>,
) -> AppResult<Response> {
    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::BadRequest("Group name is required".into()));
    }

    let group = Group {
        id: uuid::Uuid::now_v7().to_string(),
        name,
        description: req.description.trim().to_string(),
        created_by: user.id.clone(),
        members: vec![user.id],
        created_at: db::now_utc(),
    };

    let conn = state.db.get()?;
    db::groups::insert(&conn, &group)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Group created successfully", "group": group })),
    )
        .into_response())
}

async fn list_groups(State(state): State<AppState>) -> AppResult<Json<Vec<Group>>> {
    let conn = state.db.get()?;
    Ok(Json(db::groups::list(&conn)?))
}

async fn joined_groups(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<Vec<Group>>> {
    let conn = state.db.get()?;
    Ok(Json(db::groups::joined_by(&conn, &user.id)?))
}

/// Idempotent: joining a group you are already in is a no-op.
async fn join_group(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let mut conn = state.db.get()?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let mut group = db::groups::get(&tx, &id)?.ok_or(AppError::NotFound("Group"))?;
    if !group.members.contains(&user.id) {
        group.members.push(user.id);
        db::groups::update_members(&tx, &group)?;
    }

    tx.commit()?;
    Ok(Json(json!({ "message": "Joined group successfully" })))
}

/// Idempotent: leaving a group you are not in is a no-op. The creator may
/// leave their own group.
async fn leave_group(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let mut conn = state.db.get()?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let mut group = db::groups::get(&tx, &id)?.ok_or(AppError::NotFound("Group"))?;
    let before = group.members.len();
    group.members.retain(|m| m != &user.id);
    if group.members.len() != before {
        db::groups::update_members(&tx, &group)?;
    }

    tx.commit()?;
    Ok(Json(json!({ "message": "Left group successfully" })))
}
