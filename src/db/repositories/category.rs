//! Blog category repository

use crate::db::DynDatabasePool;
use crate::models::{BlogCategory, CategoryInput};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

/// Blog category repository trait
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Insert a category. `input.slug` must already be resolved.
    async fn create(&self, input: &CategoryInput) -> Result<BlogCategory>;

    async fn get_by_id(&self, id: i64) -> Result<Option<BlogCategory>>;

    async fn get_by_slug(&self, slug: &str) -> Result<Option<BlogCategory>>;

    /// All categories ordered by sort_order, then name
    async fn list(&self) -> Result<Vec<BlogCategory>>;

    async fn update(&self, id: i64, input: &CategoryInput) -> Result<Option<BlogCategory>>;

    async fn delete(&self, id: i64) -> Result<bool>;

    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool>;

    async fn upsert_by_slug(&self, input: &CategoryInput) -> Result<BlogCategory>;

    async fn count(&self) -> Result<i64>;

    /// Highest sort_order in use, or -1 when empty
    async fn max_sort_order(&self) -> Result<i32>;
}

/// SQLx-based category repository
pub struct SqlxCategoryRepository {
    pool: DynDatabasePool,
}

impl SqlxCategoryRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CategoryRepository> {
        Arc::new(Self::new(pool))
    }
}

const SELECT_CATEGORY: &str = r#"
    SELECT id, name_en, name_it, slug, description_en, description_it, sort_order, created_at
    FROM blog_categories
"#;

#[async_trait]
impl CategoryRepository for SqlxCategoryRepository {
    async fn create(&self, input: &CategoryInput) -> Result<BlogCategory> {
        let now = Utc::now();
        let sort_order = match input.sort_order {
            Some(order) => order,
            None => self.max_sort_order().await? + 1,
        };

        let result = sqlx::query(
            r#"
            INSERT INTO blog_categories (name_en, name_it, slug, description_en, description_it, sort_order, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&input.name_en)
        .bind(&input.name_it)
        .bind(&input.slug)
        .bind(&input.description_en)
        .bind(&input.description_it)
        .bind(sort_order)
        .bind(now)
        .execute(self.pool.sqlite())
        .await
        .context("Failed to create category")?;

        Ok(BlogCategory {
            id: result.last_insert_rowid(),
            name_en: input.name_en.clone(),
            name_it: input.name_it.clone(),
            slug: input.slug.clone(),
            description_en: input.description_en.clone(),
            description_it: input.description_it.clone(),
            sort_order,
            created_at: now,
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<BlogCategory>> {
        let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_CATEGORY))
            .bind(id)
            .fetch_optional(self.pool.sqlite())
            .await
            .context("Failed to get category by ID")?;
        Ok(row.as_ref().map(row_to_category))
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<BlogCategory>> {
        let row = sqlx::query(&format!("{} WHERE slug = ?", SELECT_CATEGORY))
            .bind(slug)
            .fetch_optional(self.pool.sqlite())
            .await
            .context("Failed to get category by slug")?;
        Ok(row.as_ref().map(row_to_category))
    }

    async fn list(&self) -> Result<Vec<BlogCategory>> {
        let rows = sqlx::query(&format!("{} ORDER BY sort_order, name_en", SELECT_CATEGORY))
            .fetch_all(self.pool.sqlite())
            .await
            .context("Failed to list categories")?;
        Ok(rows.iter().map(row_to_category).collect())
    }

    async fn update(&self, id: i64, input: &CategoryInput) -> Result<Option<BlogCategory>> {
        let Some(existing) = self.get_by_id(id).await? else {
            return Ok(None);
        };

        sqlx::query(
            r#"
            UPDATE blog_categories
            SET name_en = ?, name_it = ?, slug = ?, description_en = ?, description_it = ?, sort_order = ?
            WHERE id = ?
            "#,
        )
        .bind(&input.name_en)
        .bind(&input.name_it)
        .bind(&input.slug)
        .bind(&input.description_en)
        .bind(&input.description_it)
        .bind(input.sort_order.unwrap_or(existing.sort_order))
        .bind(id)
        .execute(self.pool.sqlite())
        .await
        .context("Failed to update category")?;

        self.get_by_id(id).await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM blog_categories WHERE id = ?")
            .bind(id)
            .execute(self.pool.sqlite())
            .await
            .context("Failed to delete category")?;
        Ok(result.rows_affected() > 0)
    }

    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
        let row = sqlx::query(
            "SELECT COUNT(*) as count FROM blog_categories WHERE slug = ? AND id != ?",
        )
        .bind(slug)
        .bind(exclude_id.unwrap_or(0))
        .fetch_one(self.pool.sqlite())
        .await
        .context("Failed to check category slug")?;
        let count: i64 = row.get("count");
        Ok(count > 0)
    }

    async fn upsert_by_slug(&self, input: &CategoryInput) -> Result<BlogCategory> {
        match self.get_by_slug(&input.slug).await? {
            Some(existing) => self
                .update(existing.id, input)
                .await?
                .context("Category disappeared during upsert"),
            None => self.create(input).await,
        }
    }

    async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM blog_categories")
            .fetch_one(self.pool.sqlite())
            .await
            .context("Failed to count categories")?;
        Ok(row.get("count"))
    }

    async fn max_sort_order(&self) -> Result<i32> {
        let row = sqlx::query("SELECT COALESCE(MAX(sort_order), -1) as max_order FROM blog_categories")
            .fetch_one(self.pool.sqlite())
            .await
            .context("Failed to read category sort order")?;
        Ok(row.get("max_order"))
    }
}

fn row_to_category(row: &sqlx::sqlite::SqliteRow) -> BlogCategory {
    BlogCategory {
        id: row.get("id"),
        name_en: row.get("name_en"),
        name_it: row.get("name_it"),
        slug: row.get("slug"),
        description_en: row.get("description_en"),
        description_it: row.get("description_it"),
        sort_order: row.get("sort_order"),
        created_at: row.get("created_at"),
    }
}
