//! Blog author admin endpoints
//!
//! - GET/POST /api/admin/authors
//! - GET/PUT/DELETE /api/admin/authors/{id}

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::api::middleware::{AdminActor, ApiError, AppState};
use crate::models::{AuthorInput, BlogAuthor};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_authors).post(create_author))
        .route("/{id}", get(get_author).put(update_author).delete(delete_author))
}

async fn list_authors(
    State(state): State<AppState>,
    _admin: AdminActor,
) -> Result<Json<Vec<BlogAuthor>>, ApiError> {
    Ok(Json(state.author_service.list().await?))
}

async fn get_author(
    State(state): State<AppState>,
    _admin: AdminActor,
    Path(id): Path<i64>,
) -> Result<Json<BlogAuthor>, ApiError> {
    Ok(Json(state.author_service.get_by_id(id).await?))
}

async fn create_author(
    State(state): State<AppState>,
    admin: AdminActor,
    Json(input): Json<AuthorInput>,
) -> Result<(StatusCode, Json<BlogAuthor>), ApiError> {
    let author = state.author_service.create(input, &admin.actor).await?;
    Ok((StatusCode::CREATED, Json(author)))
}

async fn update_author(
    State(state): State<AppState>,
    admin: AdminActor,
    Path(id): Path<i64>,
    Json(input): Json<AuthorInput>,
) -> Result<Json<BlogAuthor>, ApiError> {
    Ok(Json(state.author_service.update(id, input, &admin.actor).await?))
}

/// DELETE /api/admin/authors/{id}
///
/// Posts by the author keep existing with no author.
async fn delete_author(
    State(state): State<AppState>,
    admin: AdminActor,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    admin.require_delete()?;
    state.author_service.delete(id, &admin.actor).await?;
    Ok(StatusCode::NO_CONTENT)
}
