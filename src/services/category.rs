//! Blog category service
//!
//! Categories drive the blog filter on the public site. The ordered list is
//! cached; every write drops it together with the cached blog queries.

use crate::cache::{Cache, CacheLayer};
use crate::db::repositories::CategoryRepository;
use crate::models::{Actor, BlogCategory, CategoryInput};
use crate::services::activity::ActivityService;
use crate::services::editor::generate_slug;
use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;

/// Default cache TTL for categories (1 hour)
const CATEGORY_CACHE_TTL_SECS: u64 = 3600;

const CACHE_KEY_CATEGORY_LIST: &str = "category:list";

/// Error types for category service operations
#[derive(Debug, thiserror::Error)]
pub enum CategoryServiceError {
    #[error("A category with this slug already exists: {0}")]
    DuplicateSlug(String),

    #[error("Category not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Category service for managing blog categories
pub struct CategoryService {
    repo: Arc<dyn CategoryRepository>,
    cache: Arc<Cache>,
    activity: Arc<ActivityService>,
    cache_ttl: Duration,
}

impl CategoryService {
    pub fn new(repo: Arc<dyn CategoryRepository>, cache: Arc<Cache>, activity: Arc<ActivityService>) -> Self {
        Self {
            repo,
            cache,
            activity,
            cache_ttl: Duration::from_secs(CATEGORY_CACHE_TTL_SECS),
        }
    }

    /// All categories ordered by sort_order
    pub async fn list(&self) -> Result<Vec<BlogCategory>, CategoryServiceError> {
        if let Some(cached) = self
            .cache
            .get::<Vec<BlogCategory>>(CACHE_KEY_CATEGORY_LIST)
            .await
            .ok()
            .flatten()
        {
            return Ok(cached);
        }

        let categories = self.repo.list().await.context("Failed to list categories")?;
        let _ = self
            .cache
            .set(CACHE_KEY_CATEGORY_LIST, &categories, self.cache_ttl)
            .await;
        Ok(categories)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<BlogCategory, CategoryServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get category")?
            .ok_or_else(|| CategoryServiceError::NotFound(id.to_string()))
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<BlogCategory>, CategoryServiceError> {
        Ok(self
            .repo
            .get_by_slug(slug)
            .await
            .context("Failed to get category by slug")?)
    }

    /// Create a category. Without an explicit sort order it goes last.
    pub async fn create(&self, input: CategoryInput, actor: &Actor) -> Result<BlogCategory, CategoryServiceError> {
        let input = self.prepare(input, None).await?;
        let category = self.repo.create(&input).await.context("Failed to create category")?;

        self.invalidate().await;
        self.activity
            .record(actor, "create", "blog_category", category.id, None::<&()>, Some(&category))
            .await;
        Ok(category)
    }

    pub async fn update(&self, id: i64, input: CategoryInput, actor: &Actor) -> Result<BlogCategory, CategoryServiceError> {
        let existing = self.get_by_id(id).await?;
        let input = self.prepare(input, Some(id)).await?;

        let category = self
            .repo
            .update(id, &input)
            .await
            .context("Failed to update category")?
            .ok_or_else(|| CategoryServiceError::NotFound(id.to_string()))?;

        self.invalidate().await;
        self.activity
            .record(actor, "update", "blog_category", id, Some(&existing), Some(&category))
            .await;
        Ok(category)
    }

    /// Delete a category. Its posts become uncategorized.
    pub async fn delete(&self, id: i64, actor: &Actor) -> Result<(), CategoryServiceError> {
        let existing = self.get_by_id(id).await?;
        if !self.repo.delete(id).await.context("Failed to delete category")? {
            return Err(CategoryServiceError::NotFound(id.to_string()));
        }

        self.invalidate().await;
        self.activity
            .record(actor, "delete", "blog_category", id, Some(&existing), None::<&()>)
            .await;
        Ok(())
    }

    async fn prepare(&self, mut input: CategoryInput, exclude_id: Option<i64>) -> Result<CategoryInput, CategoryServiceError> {
        input.name_en = input.name_en.trim().to_string();
        input.name_it = input.name_it.trim().to_string();
        if input.name_en.is_empty() || input.name_it.is_empty() {
            return Err(CategoryServiceError::ValidationError(
                "Name is required in both languages".to_string(),
            ));
        }

        input.slug = match input.slug.trim() {
            "" => generate_slug(&input.name_en),
            slug => generate_slug(slug),
        };
        if input.slug.is_empty() {
            return Err(CategoryServiceError::ValidationError(
                "Slug must contain letters or digits".to_string(),
            ));
        }

        if self
            .repo
            .slug_exists(&input.slug, exclude_id)
            .await
            .context("Failed to check slug")?
        {
            return Err(CategoryServiceError::DuplicateSlug(input.slug));
        }

        Ok(input)
    }

    async fn invalidate(&self) {
        let _ = self.cache.delete(CACHE_KEY_CATEGORY_LIST).await;
        let _ = self.cache.delete_pattern("blog:*").await;
    }
}
