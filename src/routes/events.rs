use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use rusqlite::TransactionBehavior;
use serde::Deserialize;
use serde_json::json;

use crate::db::{
    self,
    models::{Event, EventLocation},
};
use crate::error::{AppError, AppResult};
use crate::extractors::AuthUser;
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub location: EventLocation,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/events", post(create_event))
        .route("/events/myevents", get(my_events))
        .route("/events/{id}/register", post(register))
}

async fn create_event(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateEventRequest>,
) -> AppResult<Response> {
    let title = req.title.trim().to_string();
    if title.is_empty() {
        return Err(AppError::BadRequest("Event title is required".into()));
    }
    if req.date.trim().is_empty() {
        return Err(AppError::BadRequest("Event date is required".into()));
    }

    let event = Event {
        id: uuid::Uuid::now_v7().to_string(),
        title,
        description: req.description.trim().to_string(),
        date: req.date.trim().to_string(),
        location: req.location,
        created_by: user.id.clone(),
        attendees: vec![user.id],
        created_at: db::now_utc(),
    };

    let conn = state.db.get()?;
    db::events::insert(&conn, &event)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Event created successfully", "event": event })),
    )
        .into_response())
}

async fn my_events(State(state): State<AppState>, user: AuthUser) -> AppResult<Json<Vec<Event>>> {
    let conn = state.db.get()?;
    Ok(Json(db::events::attended_by(&conn, &user.id)?))
}

/// Idempotent: registering twice leaves the attendee list unchanged.
async fn register(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let mut conn = state.db.get()?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let mut event = db::events::get(&tx, &id)?.ok_or(AppError::NotFound("Event"))?;
    if !event.attendees.contains(&user.id) {
        event.attendees.push(user.id);
        db::events::update_attendees(&tx, &event)?;
    }

    tx.commit()?;
    Ok(Json(json!({ "message": "Registered for event successfully" })))
}
