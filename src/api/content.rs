//! Site content admin endpoints
//!
//! - GET /api/admin/content?section= - content rows, optionally one section
//! - GET /api/admin/content/sections - section list for the editor tabs
//! - GET /api/admin/content/dictionary/{locale} - the dictionary pages render with
//! - GET /api/admin/content/{key} - one row by dotted key
//! - PUT /api/admin/content - update one row
//! - PUT /api/admin/content/batch - update several rows in order

use axum::{
    extract::{Path, Query, State},
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;

use crate::api::middleware::{AdminActor, ApiError, AppState};
use crate::models::{ContentSection, ContentUpdate, Locale, SiteContent};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_content).put(update_content))
        .route("/batch", put(batch_update_content))
        .route("/sections", get(list_sections))
        .route("/dictionary/{locale}", get(get_dictionary))
        .route("/{key}", get(get_content))
}

#[derive(Debug, Deserialize)]
pub struct ContentQuery {
    pub section: Option<String>,
}

async fn list_content(
    State(state): State<AppState>,
    _admin: AdminActor,
    Query(query): Query<ContentQuery>,
) -> Result<Json<Vec<SiteContent>>, ApiError> {
    let rows = match query.section.as_deref().filter(|s| !s.is_empty()) {
        Some(section) => state.content_service.list_by_section(section).await?,
        None => state.content_service.list_all().await?,
    };
    Ok(Json(rows))
}

async fn list_sections(
    State(state): State<AppState>,
    _admin: AdminActor,
) -> Result<Json<Vec<ContentSection>>, ApiError> {
    Ok(Json(state.content_service.list_sections().await?))
}

async fn get_content(
    State(state): State<AppState>,
    _admin: AdminActor,
    Path(key): Path<String>,
) -> Result<Json<SiteContent>, ApiError> {
    Ok(Json(state.content_service.get_by_key(&key).await?))
}

async fn get_dictionary(
    State(state): State<AppState>,
    _admin: AdminActor,
    Path(locale): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let locale = Locale::parse(&locale)
        .ok_or_else(|| ApiError::not_found(format!("Unknown locale: {}", locale)))?;
    Ok(Json(state.dictionary.get(locale).await))
}

async fn update_content(
    State(state): State<AppState>,
    admin: AdminActor,
    Json(update): Json<ContentUpdate>,
) -> Result<Json<SiteContent>, ApiError> {
    Ok(Json(state.content_service.update(&update, &admin.actor).await?))
}

/// PUT /api/admin/content/batch
///
/// Stops at the first failing row; earlier rows stay updated.
async fn batch_update_content(
    State(state): State<AppState>,
    admin: AdminActor,
    Json(updates): Json<Vec<ContentUpdate>>,
) -> Result<Json<Vec<SiteContent>>, ApiError> {
    Ok(Json(state.content_service.batch_update(&updates, &admin.actor).await?))
}
