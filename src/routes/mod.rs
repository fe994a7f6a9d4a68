pub mod events;
pub mod groups;
pub mod tasks;
pub mod threads;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Assemble the full application router.
pub fn app(state: AppState) -> Router {
    let mut router = Router::new()
        .merge(groups::router())
        .merge(threads::router())
        .merge(events::router())
        .merge(tasks::router());

    // Test-only token mint: issues a bearer token for an arbitrary user id.
    // Only mounted when AGORA_TEST_TOKEN env var is set.
    if std::env::var("AGORA_TEST_TOKEN").is_ok() {
        router = router.route("/test/token", post(test_token));
    }

    router
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TestTokenRequest {
    user_id: String,
}

async fn test_token(
    State(state): State<AppState>,
    Json(req): Json<TestTokenRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let token = auth::issue_token(
        state.config.jwt_secret(),
        &req.user_id,
        state.config.auth.token_hours,
    )
    .map_err(|e| AppError::Internal(format!("Token issue failed: {}", e)))?;

    Ok(Json(json!({ "token": token, "userId": req.user_id })))
}
