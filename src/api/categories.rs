//! Blog category admin endpoints
//!
//! - GET/POST /api/admin/categories
//! - GET/PUT/DELETE /api/admin/categories/{id}

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::api::middleware::{AdminActor, ApiError, AppState};
use crate::models::{BlogCategory, CategoryInput};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route("/{id}", get(get_category).put(update_category).delete(delete_category))
}

/// GET /api/admin/categories - ordered by sort order
async fn list_categories(
    State(state): State<AppState>,
    _admin: AdminActor,
) -> Result<Json<Vec<BlogCategory>>, ApiError> {
    Ok(Json(state.category_service.list().await?))
}

async fn get_category(
    State(state): State<AppState>,
    _admin: AdminActor,
    Path(id): Path<i64>,
) -> Result<Json<BlogCategory>, ApiError> {
    Ok(Json(state.category_service.get_by_id(id).await?))
}

async fn create_category(
    State(state): State<AppState>,
    admin: AdminActor,
    Json(input): Json<CategoryInput>,
) -> Result<(StatusCode, Json<BlogCategory>), ApiError> {
    let category = state.category_service.create(input, &admin.actor).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

async fn update_category(
    State(state): State<AppState>,
    admin: AdminActor,
    Path(id): Path<i64>,
    Json(input): Json<CategoryInput>,
) -> Result<Json<BlogCategory>, ApiError> {
    Ok(Json(state.category_service.update(id, input, &admin.actor).await?))
}

async fn delete_category(
    State(state): State<AppState>,
    admin: AdminActor,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    admin.require_delete()?;
    state.category_service.delete(id, &admin.actor).await?;
    Ok(StatusCode::NO_CONTENT)
}
