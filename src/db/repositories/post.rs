//! Blog post repository
//!
//! Posts, their FAQ rows and the related-post links. Tag and keyword lists
//! are stored as JSON arrays in text columns.

use crate::db::DynDatabasePool;
use crate::models::{BlogFaq, BlogPost, FaqInput, ListParams, PostInput, PostStatus, SchemaType};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use std::sync::Arc;

/// Post counts shown on the dashboard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostCounts {
    pub total: i64,
    pub published: i64,
    pub draft: i64,
}

/// Blog post repository trait
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(
        &self,
        input: &PostInput,
        published_at: Option<DateTime<Utc>>,
        created_by: Option<i64>,
    ) -> Result<BlogPost>;

    /// Replace every editable column of a post
    async fn update(
        &self,
        id: i64,
        input: &PostInput,
        published_at: Option<DateTime<Utc>>,
        updated_by: Option<i64>,
    ) -> Result<Option<BlogPost>>;

    async fn get_by_id(&self, id: i64) -> Result<Option<BlogPost>>;

    /// Any status
    async fn get_by_slug(&self, slug: &str) -> Result<Option<BlogPost>>;

    async fn delete(&self, id: i64) -> Result<bool>;

    /// Change status; `published_at` is only filled when still empty
    async fn set_status(
        &self,
        id: i64,
        status: PostStatus,
        published_at: Option<DateTime<Utc>>,
        updated_by: Option<i64>,
    ) -> Result<Option<BlogPost>>;

    async fn set_featured(&self, id: i64, featured: bool, updated_by: Option<i64>)
        -> Result<Option<BlogPost>>;

    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool>;

    /// Admin listing, newest first, optionally filtered by status
    async fn list(&self, status: Option<PostStatus>, params: &ListParams)
        -> Result<(Vec<BlogPost>, i64)>;

    /// Published posts ordered by published_at desc
    async fn list_published(&self, params: &ListParams) -> Result<(Vec<BlogPost>, i64)>;

    async fn list_featured(&self, limit: i64) -> Result<Vec<BlogPost>>;

    async fn list_published_by_category(&self, category_id: i64) -> Result<Vec<BlogPost>>;

    /// Published posts among `ids`, in the order given
    async fn list_published_by_ids(&self, ids: &[i64]) -> Result<Vec<BlogPost>>;

    async fn counts(&self) -> Result<PostCounts>;

    async fn list_faqs(&self, post_id: i64) -> Result<Vec<BlogFaq>>;

    /// Replace all FAQs of a post; sort_order follows the slice order
    async fn replace_faqs(&self, post_id: i64, faqs: &[FaqInput]) -> Result<Vec<BlogFaq>>;

    /// Related post ids in their stored order
    async fn list_related_ids(&self, post_id: i64) -> Result<Vec<i64>>;

    /// Replace all related links of a post; sort_order follows the slice order
    async fn replace_related(&self, post_id: i64, related_ids: &[i64]) -> Result<()>;
}

/// SQLx-based post repository
pub struct SqlxPostRepository {
    pool: DynDatabasePool,
}

impl SqlxPostRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn PostRepository> {
        Arc::new(Self::new(pool))
    }
}

const SELECT_POST: &str = r#"
    SELECT id, slug, title_en, title_it, excerpt_en, excerpt_it, content_en, content_it,
           tags_en, tags_it, featured_image, featured_image_alt_en, featured_image_alt_it,
           author_id, category_id, reading_time, schema_type,
           seo_title_en, seo_title_it, seo_description_en, seo_description_it,
           seo_keywords_en, seo_keywords_it, status, featured,
           published_at, created_at, updated_at, created_by, updated_by
    FROM blog_posts
"#;

#[async_trait]
impl PostRepository for SqlxPostRepository {
    async fn create(
        &self,
        input: &PostInput,
        published_at: Option<DateTime<Utc>>,
        created_by: Option<i64>,
    ) -> Result<BlogPost> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO blog_posts (
                slug, title_en, title_it, excerpt_en, excerpt_it, content_en, content_it,
                tags_en, tags_it, featured_image, featured_image_alt_en, featured_image_alt_it,
                author_id, category_id, reading_time, schema_type,
                seo_title_en, seo_title_it, seo_description_en, seo_description_it,
                seo_keywords_en, seo_keywords_it, status, featured,
                published_at, created_at, updated_at, created_by, updated_by
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&input.slug)
        .bind(&input.title_en)
        .bind(&input.title_it)
        .bind(&input.excerpt_en)
        .bind(&input.excerpt_it)
        .bind(&input.content_en)
        .bind(&input.content_it)
        .bind(to_json_list(&input.tags_en))
        .bind(to_json_list(&input.tags_it))
        .bind(&input.featured_image)
        .bind(&input.featured_image_alt_en)
        .bind(&input.featured_image_alt_it)
        .bind(input.author_id)
        .bind(input.category_id)
        .bind(input.reading_time_or_default())
        .bind(input.schema_type.as_str())
        .bind(&input.seo_title_en)
        .bind(&input.seo_title_it)
        .bind(&input.seo_description_en)
        .bind(&input.seo_description_it)
        .bind(to_json_list(&input.seo_keywords_en))
        .bind(to_json_list(&input.seo_keywords_it))
        .bind(input.status.as_str())
        .bind(input.featured)
        .bind(published_at)
        .bind(now)
        .bind(now)
        .bind(created_by)
        .bind(created_by)
        .execute(self.pool.sqlite())
        .await
        .context("Failed to create post")?;

        self.get_by_id(result.last_insert_rowid())
            .await?
            .context("Created post not found")
    }

    async fn update(
        &self,
        id: i64,
        input: &PostInput,
        published_at: Option<DateTime<Utc>>,
        updated_by: Option<i64>,
    ) -> Result<Option<BlogPost>> {
        let result = sqlx::query(
            r#"
            UPDATE blog_posts SET
                slug = ?, title_en = ?, title_it = ?, excerpt_en = ?, excerpt_it = ?,
                content_en = ?, content_it = ?, tags_en = ?, tags_it = ?,
                featured_image = ?, featured_image_alt_en = ?, featured_image_alt_it = ?,
                author_id = ?, category_id = ?, reading_time = ?, schema_type = ?,
                seo_title_en = ?, seo_title_it = ?, seo_description_en = ?, seo_description_it = ?,
                seo_keywords_en = ?, seo_keywords_it = ?, status = ?, featured = ?,
                published_at = ?, updated_at = ?, updated_by = ?
            WHERE id = ?
            "#,
        )
        .bind(&input.slug)
        .bind(&input.title_en)
        .bind(&input.title_it)
        .bind(&input.excerpt_en)
        .bind(&input.excerpt_it)
        .bind(&input.content_en)
        .bind(&input.content_it)
        .bind(to_json_list(&input.tags_en))
        .bind(to_json_list(&input.tags_it))
        .bind(&input.featured_image)
        .bind(&input.featured_image_alt_en)
        .bind(&input.featured_image_alt_it)
        .bind(input.author_id)
        .bind(input.category_id)
        .bind(input.reading_time_or_default())
        .bind(input.schema_type.as_str())
        .bind(&input.seo_title_en)
        .bind(&input.seo_title_it)
        .bind(&input.seo_description_en)
        .bind(&input.seo_description_it)
        .bind(to_json_list(&input.seo_keywords_en))
        .bind(to_json_list(&input.seo_keywords_it))
        .bind(input.status.as_str())
        .bind(input.featured)
        .bind(published_at)
        .bind(Utc::now())
        .bind(updated_by)
        .bind(id)
        .execute(self.pool.sqlite())
        .await
        .context("Failed to update post")?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<BlogPost>> {
        let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_POST))
            .bind(id)
            .fetch_optional(self.pool.sqlite())
            .await
            .context("Failed to get post by ID")?;
        row.as_ref().map(row_to_post).transpose()
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<BlogPost>> {
        let row = sqlx::query(&format!("{} WHERE slug = ?", SELECT_POST))
            .bind(slug)
            .fetch_optional(self.pool.sqlite())
            .await
            .context("Failed to get post by slug")?;
        row.as_ref().map(row_to_post).transpose()
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM blog_posts WHERE id = ?")
            .bind(id)
            .execute(self.pool.sqlite())
            .await
            .context("Failed to delete post")?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_status(
        &self,
        id: i64,
        status: PostStatus,
        published_at: Option<DateTime<Utc>>,
        updated_by: Option<i64>,
    ) -> Result<Option<BlogPost>> {
        let result = sqlx::query(
            r#"
            UPDATE blog_posts
            SET status = ?, published_at = COALESCE(published_at, ?), updated_at = ?, updated_by = ?
            WHERE id = ?
            "#,
        )
        .bind(status.as_str())
        .bind(published_at)
        .bind(Utc::now())
        .bind(updated_by)
        .bind(id)
        .execute(self.pool.sqlite())
        .await
        .context("Failed to update post status")?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    async fn set_featured(
        &self,
        id: i64,
        featured: bool,
        updated_by: Option<i64>,
    ) -> Result<Option<BlogPost>> {
        let result = sqlx::query(
            "UPDATE blog_posts SET featured = ?, updated_at = ?, updated_by = ? WHERE id = ?",
        )
        .bind(featured)
        .bind(Utc::now())
        .bind(updated_by)
        .bind(id)
        .execute(self.pool.sqlite())
        .await
        .context("Failed to update featured flag")?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM blog_posts WHERE slug = ? AND id != ?")
            .bind(slug)
            .bind(exclude_id.unwrap_or(0))
            .fetch_one(self.pool.sqlite())
            .await
            .context("Failed to check post slug")?;
        let count: i64 = row.get("count");
        Ok(count > 0)
    }

    async fn list(
        &self,
        status: Option<PostStatus>,
        params: &ListParams,
    ) -> Result<(Vec<BlogPost>, i64)> {
        let status = status.map(|s| s.as_str());

        let rows = sqlx::query(&format!(
            "{} WHERE (? IS NULL OR status = ?) ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
            SELECT_POST
        ))
        .bind(status)
        .bind(status)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(self.pool.sqlite())
        .await
        .context("Failed to list posts")?;

        let total_row =
            sqlx::query("SELECT COUNT(*) as count FROM blog_posts WHERE (? IS NULL OR status = ?)")
                .bind(status)
                .bind(status)
                .fetch_one(self.pool.sqlite())
                .await
                .context("Failed to count posts")?;

        let posts = rows.iter().map(row_to_post).collect::<Result<Vec<_>>>()?;
        Ok((posts, total_row.get("count")))
    }

    async fn list_published(&self, params: &ListParams) -> Result<(Vec<BlogPost>, i64)> {
        let rows = sqlx::query(&format!(
            "{} WHERE status = 'published' ORDER BY published_at DESC, id DESC LIMIT ? OFFSET ?",
            SELECT_POST
        ))
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(self.pool.sqlite())
        .await
        .context("Failed to list published posts")?;

        let total_row =
            sqlx::query("SELECT COUNT(*) as count FROM blog_posts WHERE status = 'published'")
                .fetch_one(self.pool.sqlite())
                .await
                .context("Failed to count published posts")?;

        let posts = rows.iter().map(row_to_post).collect::<Result<Vec<_>>>()?;
        Ok((posts, total_row.get("count")))
    }

    async fn list_featured(&self, limit: i64) -> Result<Vec<BlogPost>> {
        let rows = sqlx::query(&format!(
            "{} WHERE status = 'published' AND featured = 1 ORDER BY published_at DESC LIMIT ?",
            SELECT_POST
        ))
        .bind(limit)
        .fetch_all(self.pool.sqlite())
        .await
        .context("Failed to list featured posts")?;

        rows.iter().map(row_to_post).collect()
    }

    async fn list_published_by_category(&self, category_id: i64) -> Result<Vec<BlogPost>> {
        let rows = sqlx::query(&format!(
            "{} WHERE status = 'published' AND category_id = ? ORDER BY published_at DESC",
            SELECT_POST
        ))
        .bind(category_id)
        .fetch_all(self.pool.sqlite())
        .await
        .context("Failed to list posts by category")?;

        rows.iter().map(row_to_post).collect()
    }

    async fn list_published_by_ids(&self, ids: &[i64]) -> Result<Vec<BlogPost>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "{} WHERE status = 'published' AND id IN ({})",
            SELECT_POST, placeholders
        );
        let mut query = sqlx::query(&sql);
        for id in ids {
            query = query.bind(*id);
        }

        let rows = query
            .fetch_all(self.pool.sqlite())
            .await
            .context("Failed to list posts by IDs")?;
        let mut posts = rows.iter().map(row_to_post).collect::<Result<Vec<_>>>()?;
        posts.sort_by_key(|p| ids.iter().position(|id| *id == p.id));
        Ok(posts)
    }

    async fn counts(&self) -> Result<PostCounts> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) as total,
                   COALESCE(SUM(CASE WHEN status = 'published' THEN 1 ELSE 0 END), 0) as published,
                   COALESCE(SUM(CASE WHEN status = 'draft' THEN 1 ELSE 0 END), 0) as draft
            FROM blog_posts
            "#,
        )
        .fetch_one(self.pool.sqlite())
        .await
        .context("Failed to count posts")?;

        Ok(PostCounts {
            total: row.get("total"),
            published: row.get("published"),
            draft: row.get("draft"),
        })
    }

    async fn list_faqs(&self, post_id: i64) -> Result<Vec<BlogFaq>> {
        let rows = sqlx::query(
            r#"
            SELECT id, post_id, question_en, question_it, answer_en, answer_it, sort_order, created_at
            FROM blog_post_faqs
            WHERE post_id = ?
            ORDER BY sort_order, id
            "#,
        )
        .bind(post_id)
        .fetch_all(self.pool.sqlite())
        .await
        .context("Failed to list FAQs")?;

        Ok(rows
            .iter()
            .map(|row| BlogFaq {
                id: row.get("id"),
                post_id: row.get("post_id"),
                question_en: row.get("question_en"),
                question_it: row.get("question_it"),
                answer_en: row.get("answer_en"),
                answer_it: row.get("answer_it"),
                sort_order: row.get("sort_order"),
                created_at: row.get("created_at"),
            })
            .collect())
    }

    async fn replace_faqs(&self, post_id: i64, faqs: &[FaqInput]) -> Result<Vec<BlogFaq>> {
        let mut tx = self.pool.sqlite().begin().await?;

        sqlx::query("DELETE FROM blog_post_faqs WHERE post_id = ?")
            .bind(post_id)
            .execute(&mut *tx)
            .await
            .context("Failed to clear FAQs")?;

        let now = Utc::now();
        for (index, faq) in faqs.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO blog_post_faqs (post_id, question_en, question_it, answer_en, answer_it, sort_order, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(post_id)
            .bind(&faq.question_en)
            .bind(&faq.question_it)
            .bind(&faq.answer_en)
            .bind(&faq.answer_it)
            .bind(index as i32)
            .bind(now)
            .execute(&mut *tx)
            .await
            .context("Failed to insert FAQ")?;
        }

        tx.commit().await.context("Failed to commit FAQs")?;
        self.list_faqs(post_id).await
    }

    async fn list_related_ids(&self, post_id: i64) -> Result<Vec<i64>> {
        let rows = sqlx::query(
            "SELECT related_post_id FROM blog_related_posts WHERE post_id = ? ORDER BY sort_order",
        )
        .bind(post_id)
        .fetch_all(self.pool.sqlite())
        .await
        .context("Failed to list related posts")?;

        Ok(rows.iter().map(|row| row.get("related_post_id")).collect())
    }

    async fn replace_related(&self, post_id: i64, related_ids: &[i64]) -> Result<()> {
        let mut tx = self.pool.sqlite().begin().await?;

        sqlx::query("DELETE FROM blog_related_posts WHERE post_id = ?")
            .bind(post_id)
            .execute(&mut *tx)
            .await
            .context("Failed to clear related posts")?;

        for (index, related_id) in related_ids.iter().enumerate() {
            sqlx::query(
                "INSERT INTO blog_related_posts (post_id, related_post_id, sort_order) VALUES (?, ?, ?)",
            )
            .bind(post_id)
            .bind(related_id)
            .bind(index as i32)
            .execute(&mut *tx)
            .await
            .context("Failed to insert related post")?;
        }

        tx.commit().await.context("Failed to commit related posts")?;
        Ok(())
    }
}

fn to_json_list(values: &[String]) -> String {
    serde_json::to_string(values).unwrap_or_else(|_| "[]".to_string())
}

fn from_json_list(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}

fn row_to_post(row: &sqlx::sqlite::SqliteRow) -> Result<BlogPost> {
    let status: String = row.get("status");
    let schema_type: String = row.get("schema_type");
    let tags_en: String = row.get("tags_en");
    let tags_it: String = row.get("tags_it");
    let keywords_en: String = row.get("seo_keywords_en");
    let keywords_it: String = row.get("seo_keywords_it");

    Ok(BlogPost {
        id: row.get("id"),
        slug: row.get("slug"),
        title_en: row.get("title_en"),
        title_it: row.get("title_it"),
        excerpt_en: row.get("excerpt_en"),
        excerpt_it: row.get("excerpt_it"),
        content_en: row.get("content_en"),
        content_it: row.get("content_it"),
        tags_en: from_json_list(&tags_en),
        tags_it: from_json_list(&tags_it),
        featured_image: row.get("featured_image"),
        featured_image_alt_en: row.get("featured_image_alt_en"),
        featured_image_alt_it: row.get("featured_image_alt_it"),
        author_id: row.get("author_id"),
        category_id: row.get("category_id"),
        reading_time: row.get("reading_time"),
        schema_type: SchemaType::from_str(&schema_type).unwrap_or_default(),
        seo_title_en: row.get("seo_title_en"),
        seo_title_it: row.get("seo_title_it"),
        seo_description_en: row.get("seo_description_en"),
        seo_description_it: row.get("seo_description_it"),
        seo_keywords_en: from_json_list(&keywords_en),
        seo_keywords_it: from_json_list(&keywords_it),
        status: PostStatus::from_str(&status)
            .with_context(|| format!("Unknown post status: {}", status))?,
        featured: row.get("featured"),
        published_at: row.get("published_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        created_by: row.get("created_by"),
        updated_by: row.get("updated_by"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use chrono::Duration;

    async fn setup_test_repo() -> SqlxPostRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxPostRepository::new(pool)
    }

    fn input(slug: &str, status: PostStatus) -> PostInput {
        PostInput {
            slug: slug.to_string(),
            title_en: format!("{} title", slug),
            title_it: format!("{} titolo", slug),
            excerpt_en: "Excerpt".to_string(),
            excerpt_it: "Estratto".to_string(),
            content_en: "Body".to_string(),
            content_it: "Corpo".to_string(),
            tags_en: vec!["design".to_string(), "light".to_string()],
            tags_it: vec!["design".to_string()],
            status,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_round_trips_lists_and_defaults() {
        let repo = setup_test_repo().await;
        let post = repo.create(&input("first", PostStatus::Draft), None, None).await.unwrap();

        assert!(post.id > 0);
        assert_eq!(post.tags_en, vec!["design", "light"]);
        assert_eq!(post.reading_time, 5);
        assert_eq!(post.schema_type, SchemaType::BlogPosting);
        assert_eq!(post.status, PostStatus::Draft);
        assert!(post.published_at.is_none());
        assert!(post.seo_keywords_it.is_empty());
    }

    #[tokio::test]
    async fn test_update_and_slug_exists() {
        let repo = setup_test_repo().await;
        let post = repo.create(&input("first", PostStatus::Draft), None, None).await.unwrap();

        let mut changed = input("renamed", PostStatus::Draft);
        changed.reading_time = Some(9);
        let updated = repo.update(post.id, &changed, None, None).await.unwrap().unwrap();
        assert_eq!(updated.slug, "renamed");
        assert_eq!(updated.reading_time, 9);

        assert!(repo.slug_exists("renamed", None).await.unwrap());
        assert!(!repo.slug_exists("renamed", Some(post.id)).await.unwrap());
        assert!(repo.update(999, &changed, None, None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_status_keeps_first_publish_date() {
        let repo = setup_test_repo().await;
        let post = repo.create(&input("p", PostStatus::Draft), None, None).await.unwrap();

        let first = Utc::now() - Duration::days(3);
        let published = repo
            .set_status(post.id, PostStatus::Published, Some(first), None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(published.published_at.map(|d| d.timestamp()), Some(first.timestamp()));

        repo.set_status(post.id, PostStatus::Draft, None, None).await.unwrap();
        let again = repo
            .set_status(post.id, PostStatus::Published, Some(Utc::now()), None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(again.published_at.map(|d| d.timestamp()), Some(first.timestamp()));
    }

    #[tokio::test]
    async fn test_published_listings() {
        let repo = setup_test_repo().await;
        let now = Utc::now();
        let old = repo
            .create(&input("old", PostStatus::Published), Some(now - Duration::days(2)), None)
            .await
            .unwrap();
        let new = repo
            .create(&input("new", PostStatus::Published), Some(now), None)
            .await
            .unwrap();
        repo.create(&input("draft", PostStatus::Draft), None, None).await.unwrap();
        repo.set_featured(old.id, true, None).await.unwrap();

        let (posts, total) = repo.list_published(&ListParams::default()).await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(posts[0].id, new.id);

        let featured = repo.list_featured(3).await.unwrap();
        assert_eq!(featured.len(), 1);
        assert_eq!(featured[0].id, old.id);

        let (drafts, draft_total) = repo
            .list(Some(PostStatus::Draft), &ListParams::default())
            .await
            .unwrap();
        assert_eq!(draft_total, 1);
        assert_eq!(drafts[0].slug, "draft");

        let (_, all_total) = repo.list(None, &ListParams::default()).await.unwrap();
        assert_eq!(all_total, 3);

        let counts = repo.counts().await.unwrap();
        assert_eq!(counts, PostCounts { total: 3, published: 2, draft: 1 });
    }

    #[tokio::test]
    async fn test_by_ids_keeps_order_and_skips_drafts() {
        let repo = setup_test_repo().await;
        let a = repo.create(&input("a", PostStatus::Published), Some(Utc::now()), None).await.unwrap();
        let b = repo.create(&input("b", PostStatus::Published), Some(Utc::now()), None).await.unwrap();
        let c = repo.create(&input("c", PostStatus::Draft), None, None).await.unwrap();

        let posts = repo.list_published_by_ids(&[b.id, c.id, a.id]).await.unwrap();
        let ids: Vec<i64> = posts.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![b.id, a.id]);
        assert!(repo.list_published_by_ids(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_replace_faqs_and_related() {
        let repo = setup_test_repo().await;
        let post = repo.create(&input("p", PostStatus::Draft), None, None).await.unwrap();
        let other = repo.create(&input("o", PostStatus::Draft), None, None).await.unwrap();

        let faqs = vec![
            FaqInput { question_en: "Q1".into(), ..Default::default() },
            FaqInput { question_en: "Q2".into(), ..Default::default() },
        ];
        let saved = repo.replace_faqs(post.id, &faqs).await.unwrap();
        assert_eq!(saved.len(), 2);
        assert_eq!(saved[1].sort_order, 1);

        let saved = repo.replace_faqs(post.id, &faqs[1..]).await.unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].question_en, "Q2");
        assert_eq!(saved[0].sort_order, 0);

        repo.replace_related(post.id, &[other.id]).await.unwrap();
        assert_eq!(repo.list_related_ids(post.id).await.unwrap(), vec![other.id]);

        assert!(repo.delete(other.id).await.unwrap());
        assert!(repo.list_related_ids(post.id).await.unwrap().is_empty());
    }
}
