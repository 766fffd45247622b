//! Collections gallery service
//!
//! Admin side: uploads, metadata edits, visibility toggles and manual
//! ordering. Public side: cached, read-only queries that degrade to an
//! empty gallery when the database is unavailable.

use crate::cache::{Cache, CacheLayer};
use crate::config::UploadConfig;
use crate::db::repositories::GalleryRepository;
use crate::models::{
    Actor, CreateGalleryImageInput, GalleryCategory, GalleryImage, MoveDirection,
    UpdateGalleryImageInput, ALL_CATEGORIES, DEFAULT_GALLERY_CATEGORIES,
};
use crate::services::activity::ActivityService;
use crate::services::storage::ObjectStore;
use anyhow::Context;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Default cache TTL for public gallery queries (1 hour)
const GALLERY_CACHE_TTL_SECS: u64 = 3600;

const CACHE_KEY_ACTIVE: &str = "gallery:active";
const CACHE_KEY_FEATURED: &str = "gallery:featured";
const CACHE_KEY_CATEGORIES: &str = "gallery:categories";
const CACHE_KEY_CATEGORY: &str = "gallery:category:";
const CACHE_PATTERN_GALLERY: &str = "gallery:*";

/// Object store folder for gallery uploads
pub const GALLERY_FOLDER: &str = "gallery";

/// Error types for gallery operations
#[derive(Debug, thiserror::Error)]
pub enum GalleryServiceError {
    #[error("Gallery image not found: {0}")]
    NotFound(i64),

    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The upload exceeds the configured size limit
    #[error("File too large. Maximum size: {max_mb} MB")]
    FileTooLarge { max_mb: u64 },

    #[error("Invalid file type: {0}. Only images are accepted")]
    InvalidFileType(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Location of a freshly uploaded image
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadedImage {
    pub url: String,
    pub path: String,
}

/// One entry of an explicit reorder request
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SortOrderUpdate {
    pub id: i64,
    pub sort_order: i32,
}

pub struct GalleryService {
    repo: Arc<dyn GalleryRepository>,
    store: Arc<dyn ObjectStore>,
    cache: Arc<Cache>,
    activity: Arc<ActivityService>,
    upload: UploadConfig,
    cache_ttl: Duration,
}

impl GalleryService {
    pub fn new(
        repo: Arc<dyn GalleryRepository>,
        store: Arc<dyn ObjectStore>,
        cache: Arc<Cache>,
        activity: Arc<ActivityService>,
        upload: UploadConfig,
    ) -> Self {
        Self {
            repo,
            store,
            cache,
            activity,
            upload,
            cache_ttl: Duration::from_secs(GALLERY_CACHE_TTL_SECS),
        }
    }

    // ------------------------------------------------------------------
    // Admin
    // ------------------------------------------------------------------

    /// Every image, including hidden ones, by sort_order
    pub async fn list_all(&self) -> Result<Vec<GalleryImage>, GalleryServiceError> {
        Ok(self.repo.list_all().await.context("Failed to list gallery images")?)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<GalleryImage, GalleryServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get gallery image")?
            .ok_or(GalleryServiceError::NotFound(id))
    }

    /// Category pairs offered in the admin picker
    pub fn default_categories(&self) -> Vec<GalleryCategory> {
        DEFAULT_GALLERY_CATEGORIES
            .iter()
            .map(|(en, it)| GalleryCategory {
                en: en.to_string(),
                it: it.to_string(),
            })
            .collect()
    }

    /// Add an image at the end of the gallery. Empty alt texts take the
    /// titles; new images are active and not featured.
    pub async fn create(
        &self,
        mut input: CreateGalleryImageInput,
        actor: &Actor,
    ) -> Result<GalleryImage, GalleryServiceError> {
        if input.image_url.trim().is_empty() {
            return Err(GalleryServiceError::ValidationError("Image URL is required".to_string()));
        }
        if input.title_en.trim().is_empty() || input.title_it.trim().is_empty() {
            return Err(GalleryServiceError::ValidationError(
                "Title is required in both languages".to_string(),
            ));
        }

        let (alt_en, alt_it) = input.alt_or_title();
        input.alt_en = alt_en;
        input.alt_it = alt_it;
        input.is_featured = false;

        let sort_order = self.repo.max_sort_order().await.context("Failed to read sort order")? + 1;
        let image = self
            .repo
            .create(&input, sort_order)
            .await
            .context("Failed to create gallery image")?;

        self.invalidate().await;
        self.activity
            .record(actor, "create", "gallery_image", image.id, None::<&()>, Some(&image))
            .await;
        Ok(image)
    }

    /// Store an uploaded image file.
    ///
    /// Size and type are checked before anything is written.
    pub async fn upload(
        &self,
        filename: &str,
        content_type: &str,
        data: &[u8],
    ) -> Result<UploadedImage, GalleryServiceError> {
        if data.len() as u64 > self.upload.max_file_size {
            return Err(GalleryServiceError::FileTooLarge {
                max_mb: self.upload.max_file_size / 1024 / 1024,
            });
        }
        if !content_type.starts_with("image/") || !self.upload.is_type_allowed(content_type) {
            return Err(GalleryServiceError::InvalidFileType(content_type.to_string()));
        }

        let ext = file_extension(filename).unwrap_or_else(|| self.upload.get_extension(content_type).to_string());
        let random = Uuid::new_v4().simple().to_string();
        let key = format!(
            "{}/{}-{}.{}",
            GALLERY_FOLDER,
            Utc::now().timestamp_millis(),
            &random[..8],
            ext
        );

        self.store.put(&key, data).await.context("Failed to store upload")?;
        tracing::info!(key = %key, size = data.len(), "Stored gallery upload");

        Ok(UploadedImage {
            url: self.store.public_url(&key),
            path: key,
        })
    }

    pub async fn update(
        &self,
        id: i64,
        input: UpdateGalleryImageInput,
        actor: &Actor,
    ) -> Result<GalleryImage, GalleryServiceError> {
        let existing = self.get_by_id(id).await?;
        let image = self
            .repo
            .update(id, &input)
            .await
            .context("Failed to update gallery image")?
            .ok_or(GalleryServiceError::NotFound(id))?;

        self.invalidate().await;
        self.activity
            .record(actor, "update", "gallery_image", id, Some(&existing), Some(&image))
            .await;
        Ok(image)
    }

    pub async fn toggle_active(&self, id: i64, actor: &Actor) -> Result<GalleryImage, GalleryServiceError> {
        let existing = self.get_by_id(id).await?;
        let input = UpdateGalleryImageInput {
            is_active: Some(!existing.is_active),
            ..Default::default()
        };
        self.update(id, input, actor).await
    }

    pub async fn toggle_featured(&self, id: i64, actor: &Actor) -> Result<GalleryImage, GalleryServiceError> {
        let existing = self.get_by_id(id).await?;
        let input = UpdateGalleryImageInput {
            is_featured: Some(!existing.is_featured),
            ..Default::default()
        };
        self.update(id, input, actor).await
    }

    /// Delete an image and, for uploaded images, its stored file. A failure
    /// to remove the file does not stop the row from being deleted.
    pub async fn delete(&self, id: i64, actor: &Actor) -> Result<(), GalleryServiceError> {
        let existing = self.get_by_id(id).await?;

        if existing.is_stored() {
            if let Err(e) = self.store.delete(&existing.image_path).await {
                tracing::warn!(
                    image_id = id,
                    path = %existing.image_path,
                    error = %e,
                    "Storage delete failed"
                );
            }
        }

        if !self.repo.delete(id).await.context("Failed to delete gallery image")? {
            return Err(GalleryServiceError::NotFound(id));
        }

        self.invalidate().await;
        self.activity
            .record(actor, "delete", "gallery_image", id, Some(&existing), None::<&()>)
            .await;
        Ok(())
    }

    /// Swap with the previous image. Returns false at the top.
    pub async fn move_up(&self, id: i64, actor: &Actor) -> Result<bool, GalleryServiceError> {
        self.move_image(id, MoveDirection::Up, actor).await
    }

    /// Swap with the next image. Returns false at the bottom.
    pub async fn move_down(&self, id: i64, actor: &Actor) -> Result<bool, GalleryServiceError> {
        self.move_image(id, MoveDirection::Down, actor).await
    }

    async fn move_image(&self, id: i64, direction: MoveDirection, actor: &Actor) -> Result<bool, GalleryServiceError> {
        self.get_by_id(id).await?;
        let moved = self
            .repo
            .move_image(id, direction)
            .await
            .context("Failed to move gallery image")?;

        if moved {
            self.invalidate().await;
            self.activity
                .record(actor, "reorder", "gallery_image", id, None::<&()>, Some(&direction))
                .await;
        }
        Ok(moved)
    }

    /// Apply explicit sort orders in one transaction
    pub async fn reorder(&self, updates: &[SortOrderUpdate], actor: &Actor) -> Result<(), GalleryServiceError> {
        let orders: Vec<(i64, i32)> = updates.iter().map(|u| (u.id, u.sort_order)).collect();
        self.repo.reorder(&orders).await.context("Failed to reorder gallery")?;

        self.invalidate().await;
        self.activity
            .record(actor, "reorder", "gallery_image", "bulk", None::<&()>, Some(&updates))
            .await;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Public
    // ------------------------------------------------------------------

    /// Active images by sort_order
    pub async fn active_images(&self) -> Vec<GalleryImage> {
        self.cached(CACHE_KEY_ACTIVE.to_string(), || self.repo.list_active()).await
    }

    pub async fn featured_images(&self) -> Vec<GalleryImage> {
        self.cached(CACHE_KEY_FEATURED.to_string(), || self.repo.list_featured()).await
    }

    /// Active images in `category` (English or Italian name); `all`
    /// returns every active image
    pub async fn images_by_category(&self, category: &str) -> Vec<GalleryImage> {
        let category = category.trim();
        if category.is_empty() || category.eq_ignore_ascii_case(ALL_CATEGORIES) {
            return self.active_images().await;
        }
        let key = format!("{}{}", CACHE_KEY_CATEGORY, category);
        self.cached(key, || self.repo.list_by_category(category)).await
    }

    /// Distinct categories of active images, sorted
    pub async fn categories(&self) -> Vec<GalleryCategory> {
        if let Some(cached) = self
            .cache
            .get::<Vec<GalleryCategory>>(CACHE_KEY_CATEGORIES)
            .await
            .ok()
            .flatten()
        {
            return cached;
        }

        match self.repo.list_categories().await {
            Ok(mut categories) => {
                categories.sort();
                categories.dedup();
                let _ = self.cache.set(CACHE_KEY_CATEGORIES, &categories, self.cache_ttl).await;
                categories
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to fetch gallery categories");
                Vec::new()
            }
        }
    }

    async fn cached<F, Fut>(&self, key: String, fetch: F) -> Vec<GalleryImage>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = anyhow::Result<Vec<GalleryImage>>>,
    {
        if let Some(cached) = self.cache.get::<Vec<GalleryImage>>(&key).await.ok().flatten() {
            return cached;
        }

        match fetch().await {
            Ok(images) => {
                let _ = self.cache.set(&key, &images, self.cache_ttl).await;
                images
            }
            Err(e) => {
                tracing::error!(cache_key = %key, error = %e, "Failed to fetch gallery images");
                Vec::new()
            }
        }
    }

    async fn invalidate(&self) {
        let _ = self.cache.delete_pattern(CACHE_PATTERN_GALLERY).await;
    }
}

/// Lower-cased extension of an uploaded file name, when it has a usable one
fn file_extension(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    if ext.is_empty() || ext.len() > 5 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext)
}
