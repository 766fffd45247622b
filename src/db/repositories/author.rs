//! Blog author repository

use crate::db::DynDatabasePool;
use crate::models::{AuthorInput, BlogAuthor};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

/// Blog author repository trait
#[async_trait]
pub trait AuthorRepository: Send + Sync {
    /// Insert an author. `input.slug` must already be resolved.
    async fn create(&self, input: &AuthorInput) -> Result<BlogAuthor>;

    async fn get_by_id(&self, id: i64) -> Result<Option<BlogAuthor>>;

    async fn get_by_slug(&self, slug: &str) -> Result<Option<BlogAuthor>>;

    /// All authors ordered by name
    async fn list(&self) -> Result<Vec<BlogAuthor>>;

    async fn update(&self, id: i64, input: &AuthorInput) -> Result<Option<BlogAuthor>>;

    /// Returns false when no row matched
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Whether another author already uses `slug`
    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool>;

    /// Insert or refresh the author with `input.slug`
    async fn upsert_by_slug(&self, input: &AuthorInput) -> Result<BlogAuthor>;

    async fn count(&self) -> Result<i64>;
}

/// SQLx-based author repository
pub struct SqlxAuthorRepository {
    pool: DynDatabasePool,
}

impl SqlxAuthorRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn AuthorRepository> {
        Arc::new(Self::new(pool))
    }
}

const SELECT_AUTHOR: &str = r#"
    SELECT id, name, slug, role_en, role_it, bio_en, bio_it, avatar_url, created_at, updated_at
    FROM blog_authors
"#;

#[async_trait]
impl AuthorRepository for SqlxAuthorRepository {
    async fn create(&self, input: &AuthorInput) -> Result<BlogAuthor> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO blog_authors (name, slug, role_en, role_it, bio_en, bio_it, avatar_url, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&input.name)
        .bind(&input.slug)
        .bind(&input.role_en)
        .bind(&input.role_it)
        .bind(&input.bio_en)
        .bind(&input.bio_it)
        .bind(&input.avatar_url)
        .bind(now)
        .bind(now)
        .execute(self.pool.sqlite())
        .await
        .context("Failed to create author")?;

        Ok(BlogAuthor {
            id: result.last_insert_rowid(),
            name: input.name.clone(),
            slug: input.slug.clone(),
            role_en: input.role_en.clone(),
            role_it: input.role_it.clone(),
            bio_en: input.bio_en.clone(),
            bio_it: input.bio_it.clone(),
            avatar_url: input.avatar_url.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<BlogAuthor>> {
        let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_AUTHOR))
            .bind(id)
            .fetch_optional(self.pool.sqlite())
            .await
            .context("Failed to get author by ID")?;
        Ok(row.as_ref().map(row_to_author))
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<BlogAuthor>> {
        let row = sqlx::query(&format!("{} WHERE slug = ?", SELECT_AUTHOR))
            .bind(slug)
            .fetch_optional(self.pool.sqlite())
            .await
            .context("Failed to get author by slug")?;
        Ok(row.as_ref().map(row_to_author))
    }

    async fn list(&self) -> Result<Vec<BlogAuthor>> {
        let rows = sqlx::query(&format!("{} ORDER BY name", SELECT_AUTHOR))
            .fetch_all(self.pool.sqlite())
            .await
            .context("Failed to list authors")?;
        Ok(rows.iter().map(row_to_author).collect())
    }

    async fn update(&self, id: i64, input: &AuthorInput) -> Result<Option<BlogAuthor>> {
        let result = sqlx::query(
            r#"
            UPDATE blog_authors
            SET name = ?, slug = ?, role_en = ?, role_it = ?, bio_en = ?, bio_it = ?, avatar_url = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&input.name)
        .bind(&input.slug)
        .bind(&input.role_en)
        .bind(&input.role_it)
        .bind(&input.bio_en)
        .bind(&input.bio_it)
        .bind(&input.avatar_url)
        .bind(Utc::now())
        .bind(id)
        .execute(self.pool.sqlite())
        .await
        .context("Failed to update author")?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM blog_authors WHERE id = ?")
            .bind(id)
            .execute(self.pool.sqlite())
            .await
            .context("Failed to delete author")?;
        Ok(result.rows_affected() > 0)
    }

    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
        let row = sqlx::query(
            "SELECT COUNT(*) as count FROM blog_authors WHERE slug = ? AND id != ?",
        )
        .bind(slug)
        .bind(exclude_id.unwrap_or(0))
        .fetch_one(self.pool.sqlite())
        .await
        .context("Failed to check author slug")?;
        let count: i64 = row.get("count");
        Ok(count > 0)
    }

    async fn upsert_by_slug(&self, input: &AuthorInput) -> Result<BlogAuthor> {
        match self.get_by_slug(&input.slug).await? {
            Some(existing) => self
                .update(existing.id, input)
                .await?
                .context("Author disappeared during upsert"),
            None => self.create(input).await,
        }
    }

    async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM blog_authors")
            .fetch_one(self.pool.sqlite())
            .await
            .context("Failed to count authors")?;
        Ok(row.get("count"))
    }
}

fn row_to_author(row: &sqlx::sqlite::SqliteRow) -> BlogAuthor {
    BlogAuthor {
        id: row.get("id"),
        name: row.get("name"),
        slug: row.get("slug"),
        role_en: row.get("role_en"),
        role_it: row.get("role_it"),
        bio_en: row.get("bio_en"),
        bio_it: row.get("bio_it"),
        avatar_url: row.get("avatar_url"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
