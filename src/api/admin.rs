//! Admin dashboard API
//!
//! Everything here sits behind `require_auth`. Editors can do everything
//! except delete posts, authors and categories.
//!
//! - GET /api/admin/dashboard - counters and recent activity

use axum::{extract::State, routing::get, Json, Router};

use crate::api::middleware::{AdminActor, ApiError, AppState};
use crate::api::{auth, authors, categories, content, gallery, posts};
use crate::models::DashboardStats;

/// Routes mounted under `/api/admin` that need a session
pub fn protected_router(max_file_size: u64) -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .nest("/auth", auth::protected_router())
        .nest("/posts", posts::router())
        .nest("/gallery", gallery::router(max_file_size))
        .nest("/authors", authors::router())
        .nest("/categories", categories::router())
        .nest("/content", content::router())
}

/// GET /api/admin/dashboard
async fn dashboard(State(state): State<AppState>, _admin: AdminActor) -> Result<Json<DashboardStats>, ApiError> {
    Ok(Json(state.activity_service.dashboard().await?))
}
