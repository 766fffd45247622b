//! Gallery admin endpoints
//!
//! - GET /api/admin/gallery - every image, in display order
//! - POST /api/admin/gallery - add an image record
//! - POST /api/admin/gallery/upload - store an image file (multipart field "file")
//! - GET /api/admin/gallery/categories - categories offered by the manager
//! - PUT /api/admin/gallery/reorder - explicit sort orders
//! - GET/PUT/DELETE /api/admin/gallery/{id}
//! - POST /api/admin/gallery/{id}/toggle-active | toggle-featured
//! - POST /api/admin/gallery/{id}/move - one step up or down

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{AdminActor, ApiError, AppState};
use crate::models::{CreateGalleryImageInput, GalleryCategory, GalleryImage, MoveDirection, UpdateGalleryImageInput};
use crate::services::gallery::{SortOrderUpdate, UploadedImage};

/// Multipart overhead allowed on top of the configured file size
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Build the gallery router. Upload bodies may be up to `max_file_size`
/// plus multipart framing; anything bigger is cut off by axum.
pub fn router(max_file_size: u64) -> Router<AppState> {
    let upload_limit = usize::try_from(max_file_size)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .route("/", get(list_images).post(create_image))
        .route(
            "/upload",
            post(upload_image).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/categories", get(list_categories))
        .route("/reorder", put(reorder_images))
        .route("/{id}", get(get_image).put(update_image).delete(delete_image))
        .route("/{id}/toggle-active", post(toggle_active))
        .route("/{id}/toggle-featured", post(toggle_featured))
        .route("/{id}/move", post(move_image))
}

async fn list_images(
    State(state): State<AppState>,
    _admin: AdminActor,
) -> Result<Json<Vec<GalleryImage>>, ApiError> {
    Ok(Json(state.gallery_service.list_all().await?))
}

/// GET /api/admin/gallery/categories
///
/// The fixed defaults merged with any category already used by an image.
async fn list_categories(State(state): State<AppState>, _admin: AdminActor) -> Json<Vec<GalleryCategory>> {
    let mut categories = state.gallery_service.default_categories();
    for category in state.gallery_service.categories().await {
        if !categories.contains(&category) {
            categories.push(category);
        }
    }
    Json(categories)
}

async fn create_image(
    State(state): State<AppState>,
    admin: AdminActor,
    Json(input): Json<CreateGalleryImageInput>,
) -> Result<(StatusCode, Json<GalleryImage>), ApiError> {
    let image = state.gallery_service.create(input, &admin.actor).await?;
    Ok((StatusCode::CREATED, Json(image)))
}

/// POST /api/admin/gallery/upload
async fn upload_image(
    State(state): State<AppState>,
    _admin: AdminActor,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadedImage>), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation_error(format!("Failed to read multipart: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::validation_error(format!("Failed to read file: {}", e)))?;

        let uploaded = state
            .gallery_service
            .upload(&filename, &content_type, &data)
            .await?;
        tracing::info!(path = %uploaded.path, size = data.len(), "Gallery image uploaded");
        return Ok((StatusCode::CREATED, Json(uploaded)));
    }

    Err(ApiError::validation_error("No file provided"))
}

async fn get_image(
    State(state): State<AppState>,
    _admin: AdminActor,
    Path(id): Path<i64>,
) -> Result<Json<GalleryImage>, ApiError> {
    Ok(Json(state.gallery_service.get_by_id(id).await?))
}

async fn update_image(
    State(state): State<AppState>,
    admin: AdminActor,
    Path(id): Path<i64>,
    Json(input): Json<UpdateGalleryImageInput>,
) -> Result<Json<GalleryImage>, ApiError> {
    Ok(Json(state.gallery_service.update(id, input, &admin.actor).await?))
}

/// DELETE /api/admin/gallery/{id}
///
/// Also removes the stored file when the image was uploaded.
async fn delete_image(
    State(state): State<AppState>,
    admin: AdminActor,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.gallery_service.delete(id, &admin.actor).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn toggle_active(
    State(state): State<AppState>,
    admin: AdminActor,
    Path(id): Path<i64>,
) -> Result<Json<GalleryImage>, ApiError> {
    Ok(Json(state.gallery_service.toggle_active(id, &admin.actor).await?))
}

async fn toggle_featured(
    State(state): State<AppState>,
    admin: AdminActor,
    Path(id): Path<i64>,
) -> Result<Json<GalleryImage>, ApiError> {
    Ok(Json(state.gallery_service.toggle_featured(id, &admin.actor).await?))
}

#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    pub direction: MoveDirection,
}

#[derive(Debug, Serialize)]
pub struct MoveResponse {
    /// False when the image was already first (or last)
    pub moved: bool,
}

/// POST /api/admin/gallery/{id}/move
async fn move_image(
    State(state): State<AppState>,
    admin: AdminActor,
    Path(id): Path<i64>,
    Json(body): Json<MoveRequest>,
) -> Result<Json<MoveResponse>, ApiError> {
    let moved = match body.direction {
        MoveDirection::Up => state.gallery_service.move_up(id, &admin.actor).await?,
        MoveDirection::Down => state.gallery_service.move_down(id, &admin.actor).await?,
    };
    Ok(Json(MoveResponse { moved }))
}

/// PUT /api/admin/gallery/reorder
async fn reorder_images(
    State(state): State<AppState>,
    admin: AdminActor,
    Json(updates): Json<Vec<SortOrderUpdate>>,
) -> Result<StatusCode, ApiError> {
    state.gallery_service.reorder(&updates, &admin.actor).await?;
    Ok(StatusCode::NO_CONTENT)
}
