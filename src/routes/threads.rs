use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use rusqlite::TransactionBehavior;
use serde::Deserialize;
use serde_json::json;

use crate::db::{
    self,
    models::{Comment, FileMeta, Thread, ThreadFile},
};
use crate::error::{AppError, AppResult};
use crate::extractors::AuthUser;
use crate::state::AppState;
use crate::vote::{self, VoteKind};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/threads", post(create_thread).get(list_threads))
        .route("/threads/by-author/{user_id}", get(threads_by_author))
        .route("/threads/{id}", get(get_thread))
        .route("/threads/{id}/file", get(download_file))
        .route("/threads/{id}/upvote", post(upvote_thread))
        .route("/threads/{id}/downvote", post(downvote_thread))
        .route("/threads/{id}/comments", post(add_comment))
        .route(
            "/threads/{id}/comments/{comment_id}/upvote",
            post(upvote_comment),
        )
        .route(
            "/threads/{id}/comments/{comment_id}/downvote",
            post(downvote_comment),
        )
}

// --- Creation and listing ---

/// Multipart form: `title`, `content`, optional `groupId`, optional `file`.
/// The attachment is held fully in memory; there is no streaming.
async fn create_thread(
    State(state): State<AppState>,
    user: AuthUser,
    mut multipart: Multipart,
) -> AppResult<Response> {
    let mut title = String::new();
    let mut content = String::new();
    let mut group_id: Option<String> = None;
    let mut file: Option<ThreadFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "title" => title = read_text(field).await?.trim().to_string(),
            "content" => content = read_text(field).await?.trim().to_string(),
            "groupId" => {
                let value = read_text(field).await?.trim().to_string();
                group_id = (!value.is_empty()).then_some(value);
            }
            "file" => {
                let file_name = field.file_name().unwrap_or("attachment").to_string();
                let content_type = field.content_type().map(str::to_string).unwrap_or_else(|| {
                    mime_guess::from_path(&file_name)
                        .first_or_octet_stream()
                        .to_string()
                });
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Invalid file upload: {}", e)))?
                    .to_vec();
                if !data.is_empty() {
                    file = Some(ThreadFile {
                        name: file_name,
                        content_type,
                        data,
                    });
                }
            }
            _ => {}
        }
    }

    if title.is_empty() {
        return Err(AppError::BadRequest("Thread title is required".into()));
    }
    if content.is_empty() {
        return Err(AppError::BadRequest("Thread content is required".into()));
    }

    let thread = Thread {
        id: uuid::Uuid::now_v7().to_string(),
        title,
        content,
        author_id: user.id,
        group_id,
        file: file.as_ref().map(|f| FileMeta {
            name: f.name.clone(),
            content_type: f.content_type.clone(),
        }),
        upvotes: vec![],
        downvotes: vec![],
        comments: vec![],
        created_at: db::now_utc(),
    };

    let conn = state.db.get()?;
    db::threads::insert(&conn, &thread, file.as_ref())?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Thread created successfully", "thread": thread })),
    )
        .into_response())
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> AppResult<String> {
    field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart field: {}", e)))
}

async fn list_threads(State(state): State<AppState>) -> AppResult<Json<Vec<Thread>>> {
    let conn = state.db.get()?;
    Ok(Json(db::threads::list_all(&conn)?))
}

async fn threads_by_author(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<Vec<Thread>>> {
    let conn = state.db.get()?;
    Ok(Json(db::threads::list_by_author(&conn, &user_id)?))
}

async fn get_thread(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let conn = state.db.get()?;
    let thread = db::threads::get(&conn, &id)?.ok_or(AppError::NotFound("Thread"))?;
    Ok(Json(json!({ "thread": thread })))
}

async fn download_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let file = db::threads::get_file(&conn, &id)?.ok_or(AppError::NotFound("File"))?;

    Ok((
        [
            (header::CONTENT_TYPE, file.content_type),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file.name),
            ),
        ],
        file.data,
    )
        .into_response())
}

// --- Voting ---

async fn upvote_thread(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    vote_thread(&state, &user, &id, VoteKind::Up).await
}

async fn downvote_thread(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    vote_thread(&state, &user, &id, VoteKind::Down).await
}

/// Load, toggle and rewrite the thread document under one IMMEDIATE
/// transaction, so concurrent votes on the same thread serialize.
async fn vote_thread(
    state: &AppState,
    user: &AuthUser,
    id: &str,
    kind: VoteKind,
) -> AppResult<Json<serde_json::Value>> {
    let mut conn = state.db.get()?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let mut thread = db::threads::get(&tx, id)?.ok_or(AppError::NotFound("Thread"))?;
    vote::cast(kind, &mut thread.upvotes, &mut thread.downvotes, &user.id).map_err(|_| {
        AppError::AlreadyVoted(format!(
            "User has already {} this thread",
            kind.past_tense()
        ))
    })?;
    db::threads::save_document(&tx, &thread)?;

    tx.commit()?;
    Ok(Json(
        json!({ "message": "Voted successfully", "updatedThread": thread }),
    ))
}

async fn upvote_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, comment_id)): Path<(String, String)>,
) -> AppResult<Json<serde_json::Value>> {
    vote_comment(&state, &user, &id, &comment_id, VoteKind::Up).await
}

async fn downvote_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, comment_id)): Path<(String, String)>,
) -> AppResult<Json<serde_json::Value>> {
    vote_comment(&state, &user, &id, &comment_id, VoteKind::Down).await
}

async fn vote_comment(
    state: &AppState,
    user: &AuthUser,
    thread_id: &str,
    comment_id: &str,
    kind: VoteKind,
) -> AppResult<Json<serde_json::Value>> {
    let mut conn = state.db.get()?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let mut thread = db::threads::get(&tx, thread_id)?.ok_or(AppError::NotFound("Thread"))?;

    // Linear scan over the embedded list; comment counts stay small.
    let comment = thread
        .comments
        .iter_mut()
        .find(|c| c.id == comment_id)
        .ok_or(AppError::NotFound("Comment"))?;
    vote::cast(kind, &mut comment.upvotes, &mut comment.downvotes, &user.id).map_err(|_| {
        AppError::AlreadyVoted(format!(
            "User has already {} this comment",
            kind.past_tense()
        ))
    })?;
    let updated = comment.clone();
    db::threads::save_document(&tx, &thread)?;

    tx.commit()?;
    Ok(Json(
        json!({ "message": "Voted successfully", "updatedComment": updated }),
    ))
}

// --- Comments ---

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    #[serde(default)]
    pub content: String,
}

async fn add_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<CreateCommentRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let content = req.content.trim().to_string();
    if content.is_empty() {
        return Err(AppError::BadRequest("Comment content is required".into()));
    }

    let mut conn = state.db.get()?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let mut thread = db::threads::get(&tx, &id)?.ok_or(AppError::NotFound("Thread"))?;
    thread.comments.push(Comment {
        id: uuid::Uuid::now_v7().to_string(),
        user_id: user.id,
        content,
        upvotes: vec![],
        downvotes: vec![],
        created_at: db::now_utc(),
    });
    db::threads::save_document(&tx, &thread)?;

    tx.commit()?;
    Ok(Json(
        json!({ "message": "Comment added successfully", "thread": thread }),
    ))
}
