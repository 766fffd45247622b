//! Blog service
//!
//! Admin operations (editing, publishing, FAQs, related posts) and the
//! cached public queries behind the blog pages.
//!
//! Every write drops all `blog:*` cache entries and records an activity
//! log entry.

use crate::cache::{Cache, CacheLayer};
use crate::db::repositories::{AuthorRepository, CategoryRepository, PostRepository};
use crate::models::{
    Actor, BlogAuthor, BlogCategory, BlogFaq, BlogPost, FaqInput, ListParams, PagedResult,
    PostInput, PostStatus,
};
use crate::services::activity::ActivityService;
use crate::services::editor::PostForm;
use anyhow::Context;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Default cache TTL for public blog queries (1 hour)
const BLOG_CACHE_TTL_SECS: u64 = 3600;

const CACHE_KEY_PUBLISHED: &str = "blog:published:";
const CACHE_KEY_POST: &str = "blog:post:";
const CACHE_KEY_FEATURED: &str = "blog:featured:";
const CACHE_KEY_CATEGORY: &str = "blog:category:";
const CACHE_PATTERN_BLOG: &str = "blog:*";

/// Returned alongside a saved post whose FAQs could not be stored
pub const FAQ_SAVE_WARNING: &str = "Post saved but FAQs failed to save";

/// Related posts shown under an article
pub const MAX_RELATED_POSTS: usize = 3;

/// Error types for blog operations
#[derive(Debug, thiserror::Error)]
pub enum BlogServiceError {
    #[error("A post with this slug already exists")]
    DuplicateSlug(String),

    #[error("Post not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// A published post with everything its page shows
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PostDetail {
    pub post: BlogPost,
    pub faqs: Vec<BlogFaq>,
    pub related: Vec<BlogPost>,
    pub author: Option<BlogAuthor>,
    pub category: Option<BlogCategory>,
}

/// Result of saving the full editor form
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SavedPost {
    pub post: BlogPost,
    pub faqs: Vec<BlogFaq>,
    /// Set when the post was stored but a child collection was not
    pub warning: Option<String>,
}

pub struct BlogService {
    repo: Arc<dyn PostRepository>,
    author_repo: Arc<dyn AuthorRepository>,
    category_repo: Arc<dyn CategoryRepository>,
    cache: Arc<Cache>,
    activity: Arc<ActivityService>,
    cache_ttl: Duration,
}

impl BlogService {
    pub fn new(
        repo: Arc<dyn PostRepository>,
        author_repo: Arc<dyn AuthorRepository>,
        category_repo: Arc<dyn CategoryRepository>,
        cache: Arc<Cache>,
        activity: Arc<ActivityService>,
    ) -> Self {
        Self {
            repo,
            author_repo,
            category_repo,
            cache,
            activity,
            cache_ttl: Duration::from_secs(BLOG_CACHE_TTL_SECS),
        }
    }

    // ========================================================================
    // Admin
    // ========================================================================

    /// All posts for the dashboard, newest first
    pub async fn list_admin(
        &self,
        status: Option<PostStatus>,
        params: &ListParams,
    ) -> Result<PagedResult<BlogPost>, BlogServiceError> {
        let (posts, total) = self
            .repo
            .list(status, params)
            .await
            .context("Failed to list posts")?;
        Ok(PagedResult::new(posts, total, params))
    }

    /// Post by id, any status
    pub async fn get_by_id(&self, id: i64) -> Result<BlogPost, BlogServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get post")?
            .ok_or_else(|| BlogServiceError::NotFound(id.to_string()))
    }

    /// Editor form pre-filled with a stored post, its FAQs and related ids
    pub async fn editor_form(&self, id: i64) -> Result<PostForm, BlogServiceError> {
        let post = self.get_by_id(id).await?;
        let faqs = self.repo.list_faqs(id).await.context("Failed to list FAQs")?;
        let related = self
            .repo
            .list_related_ids(id)
            .await
            .context("Failed to list related posts")?;
        Ok(PostForm::from_post(&post, &faqs, related))
    }

    /// Create a post. Posts created as published get their publish date now.
    pub async fn create_post(&self, input: PostInput, actor: &Actor) -> Result<BlogPost, BlogServiceError> {
        let input = self.prepare(input, None).await?;
        let published_at = (input.status == PostStatus::Published).then(Utc::now);

        let post = self
            .repo
            .create(&input, published_at, Some(actor.admin_id))
            .await
            .context("Failed to create post")?;

        self.invalidate().await;
        self.activity
            .record(actor, "create", "blog_post", post.id, None::<&()>, Some(&post))
            .await;
        tracing::info!(post_id = post.id, slug = %post.slug, "Created blog post");
        Ok(post)
    }

    /// Replace a post's fields. The publish date is only set the first time
    /// the post becomes published.
    pub async fn update_post(&self, id: i64, input: PostInput, actor: &Actor) -> Result<BlogPost, BlogServiceError> {
        let existing = self.get_by_id(id).await?;
        let input = self.prepare(input, Some(id)).await?;

        let published_at = existing
            .published_at
            .or_else(|| (input.status == PostStatus::Published).then(Utc::now));

        let post = self
            .repo
            .update(id, &input, published_at, Some(actor.admin_id))
            .await
            .context("Failed to update post")?
            .ok_or_else(|| BlogServiceError::NotFound(id.to_string()))?;

        self.invalidate().await;
        self.activity
            .record(actor, "update", "blog_post", id, Some(&existing), Some(&post))
            .await;
        Ok(post)
    }

    /// Delete a post with its FAQs and related links
    pub async fn delete_post(&self, id: i64, actor: &Actor) -> Result<(), BlogServiceError> {
        let existing = self.get_by_id(id).await?;
        if !self.repo.delete(id).await.context("Failed to delete post")? {
            return Err(BlogServiceError::NotFound(id.to_string()));
        }

        self.invalidate().await;
        self.activity
            .record(actor, "delete", "blog_post", id, Some(&existing), None::<&()>)
            .await;
        tracing::info!(post_id = id, slug = %existing.slug, "Deleted blog post");
        Ok(())
    }

    pub async fn publish(&self, id: i64, actor: &Actor) -> Result<BlogPost, BlogServiceError> {
        self.set_status(id, PostStatus::Published, "publish", actor).await
    }

    /// Move a post back to draft. Its original publish date is kept.
    pub async fn unpublish(&self, id: i64, actor: &Actor) -> Result<BlogPost, BlogServiceError> {
        self.set_status(id, PostStatus::Draft, "unpublish", actor).await
    }

    pub async fn archive(&self, id: i64, actor: &Actor) -> Result<BlogPost, BlogServiceError> {
        self.set_status(id, PostStatus::Archived, "archive", actor).await
    }

    async fn set_status(
        &self,
        id: i64,
        status: PostStatus,
        action: &str,
        actor: &Actor,
    ) -> Result<BlogPost, BlogServiceError> {
        let existing = self.get_by_id(id).await?;
        let published_at = (status == PostStatus::Published).then(Utc::now);

        let post = self
            .repo
            .set_status(id, status, published_at, Some(actor.admin_id))
            .await
            .context("Failed to change post status")?
            .ok_or_else(|| BlogServiceError::NotFound(id.to_string()))?;

        self.invalidate().await;
        self.activity
            .record(
                actor,
                action,
                "blog_post",
                id,
                Some(&serde_json::json!({ "status": existing.status })),
                Some(&serde_json::json!({ "status": post.status })),
            )
            .await;
        Ok(post)
    }

    pub async fn toggle_featured(&self, id: i64, actor: &Actor) -> Result<BlogPost, BlogServiceError> {
        let existing = self.get_by_id(id).await?;
        let post = self
            .repo
            .set_featured(id, !existing.featured, Some(actor.admin_id))
            .await
            .context("Failed to toggle featured")?
            .ok_or_else(|| BlogServiceError::NotFound(id.to_string()))?;

        self.invalidate().await;
        self.activity
            .record(
                actor,
                "update",
                "blog_post",
                id,
                Some(&serde_json::json!({ "featured": existing.featured })),
                Some(&serde_json::json!({ "featured": post.featured })),
            )
            .await;
        Ok(post)
    }

    /// Replace every FAQ of a post, keeping the given order
    pub async fn save_faqs(&self, post_id: i64, faqs: &[FaqInput], actor: &Actor) -> Result<Vec<BlogFaq>, BlogServiceError> {
        self.get_by_id(post_id).await?;
        let saved = self
            .repo
            .replace_faqs(post_id, faqs)
            .await
            .context("Failed to save FAQs")?;

        self.invalidate().await;
        self.activity
            .record(actor, "update", "blog_post_faqs", post_id, None::<&()>, Some(&faqs))
            .await;
        Ok(saved)
    }

    /// Replace the related posts of a post, keeping the given order.
    /// References to the post itself and repeated ids are dropped.
    pub async fn save_related(&self, post_id: i64, related_ids: &[i64], actor: &Actor) -> Result<Vec<i64>, BlogServiceError> {
        self.get_by_id(post_id).await?;

        let mut ids: Vec<i64> = Vec::with_capacity(related_ids.len());
        for id in related_ids {
            if *id != post_id && !ids.contains(id) {
                ids.push(*id);
            }
        }

        self.repo
            .replace_related(post_id, &ids)
            .await
            .context("Failed to save related posts")?;

        self.invalidate().await;
        self.activity
            .record(actor, "update", "blog_related_posts", post_id, None::<&()>, Some(&ids))
            .await;
        Ok(ids)
    }

    /// Save the whole editor form: the post first, then its FAQs and
    /// related posts. When a child collection fails after the post was
    /// stored, the post is kept and a warning is returned.
    pub async fn save_post_with_faqs(
        &self,
        id: Option<i64>,
        form: PostForm,
        actor: &Actor,
    ) -> Result<SavedPost, BlogServiceError> {
        let PostForm {
            post: input,
            faqs,
            related_post_ids,
        } = form;

        let post = match id {
            Some(id) => self.update_post(id, input, actor).await?,
            None => self.create_post(input, actor).await?,
        };

        let mut warning = None;
        let faqs = match self.save_faqs(post.id, &faqs, actor).await {
            Ok(saved) => saved,
            Err(e) => {
                tracing::warn!(post_id = post.id, error = %e, "FAQ save failed");
                warning = Some(FAQ_SAVE_WARNING.to_string());
                Vec::new()
            }
        };

        if let Err(e) = self.save_related(post.id, &related_post_ids, actor).await {
            tracing::warn!(post_id = post.id, error = %e, "Related posts save failed");
            warning.get_or_insert_with(|| "Post saved but related posts failed to save".to_string());
        }

        Ok(SavedPost { post, faqs, warning })
    }

    /// Validate an input and normalize its slug
    async fn prepare(&self, mut input: PostInput, exclude_id: Option<i64>) -> Result<PostInput, BlogServiceError> {
        input.slug = input.slug.trim().to_string();

        let form = PostForm {
            post: input,
            ..Default::default()
        };
        if let Err(errors) = form.validate() {
            let message = errors
                .iter()
                .map(|(field, message)| format!("{}: {}", field, message))
                .collect::<Vec<_>>()
                .join("; ");
            return Err(BlogServiceError::ValidationError(message));
        }
        let input = form.post;

        if input.slug.contains(|c: char| c.is_whitespace() || c == '/') {
            return Err(BlogServiceError::ValidationError(
                "slug: Slug may not contain spaces or slashes".to_string(),
            ));
        }

        if let Some(author_id) = input.author_id {
            if self.author_repo.get_by_id(author_id).await?.is_none() {
                return Err(BlogServiceError::ValidationError(format!("Unknown author: {}", author_id)));
            }
        }
        if let Some(category_id) = input.category_id {
            if self.category_repo.get_by_id(category_id).await?.is_none() {
                return Err(BlogServiceError::ValidationError(format!("Unknown category: {}", category_id)));
            }
        }

        if self
            .repo
            .slug_exists(&input.slug, exclude_id)
            .await
            .context("Failed to check slug")?
        {
            return Err(BlogServiceError::DuplicateSlug(input.slug));
        }

        Ok(input)
    }

    async fn invalidate(&self) {
        let _ = self.cache.delete_pattern(CACHE_PATTERN_BLOG).await;
    }

    // ========================================================================
    // Public
    // ========================================================================

    /// Published posts, most recently published first
    pub async fn published_posts(&self, params: &ListParams) -> Result<PagedResult<BlogPost>, BlogServiceError> {
        let key = format!("{}{}:{}", CACHE_KEY_PUBLISHED, params.page, params.per_page);
        if let Some(cached) = self.cache.get::<PagedResult<BlogPost>>(&key).await.ok().flatten() {
            return Ok(cached);
        }

        let (posts, total) = self
            .repo
            .list_published(params)
            .await
            .context("Failed to list published posts")?;
        let result = PagedResult::new(posts, total, params);

        let _ = self.cache.set(&key, &result, self.cache_ttl).await;
        Ok(result)
    }

    /// Every published post, for the sitemap
    pub async fn all_published(&self) -> Result<Vec<BlogPost>, BlogServiceError> {
        let mut params = ListParams::new(1, 100);
        let mut posts = Vec::new();
        loop {
            let page = self.published_posts(&params).await?;
            let has_next = page.has_next();
            posts.extend(page.items);
            if !has_next {
                return Ok(posts);
            }
            params.page += 1;
        }
    }

    /// A published post with its FAQs, related posts, author and category.
    /// Drafts and archived posts are not visible.
    pub async fn post_by_slug(&self, slug: &str) -> Result<Option<PostDetail>, BlogServiceError> {
        let key = format!("{}{}", CACHE_KEY_POST, slug);
        if let Some(cached) = self.cache.get::<PostDetail>(&key).await.ok().flatten() {
            return Ok(Some(cached));
        }

        let post = match self
            .repo
            .get_by_slug(slug)
            .await
            .context("Failed to get post by slug")?
        {
            Some(post) if post.is_published() => post,
            _ => return Ok(None),
        };

        let faqs = self.repo.list_faqs(post.id).await.context("Failed to list FAQs")?;
        let related_ids = self
            .repo
            .list_related_ids(post.id)
            .await
            .context("Failed to list related posts")?;
        let mut related = self.related_posts(&related_ids).await?;
        related.truncate(MAX_RELATED_POSTS);

        let author = match post.author_id {
            Some(id) => self.author_repo.get_by_id(id).await.context("Failed to get author")?,
            None => None,
        };
        let category = match post.category_id {
            Some(id) => self.category_repo.get_by_id(id).await.context("Failed to get category")?,
            None => None,
        };

        let detail = PostDetail {
            post,
            faqs,
            related,
            author,
            category,
        };
        let _ = self.cache.set(&key, &detail, self.cache_ttl).await;
        Ok(Some(detail))
    }

    pub async fn featured_posts(&self, limit: i64) -> Result<Vec<BlogPost>, BlogServiceError> {
        let key = format!("{}{}", CACHE_KEY_FEATURED, limit);
        if let Some(cached) = self.cache.get::<Vec<BlogPost>>(&key).await.ok().flatten() {
            return Ok(cached);
        }

        let posts = self
            .repo
            .list_featured(limit)
            .await
            .context("Failed to list featured posts")?;
        let _ = self.cache.set(&key, &posts, self.cache_ttl).await;
        Ok(posts)
    }

    /// Published posts of the category with `slug`; empty for unknown slugs
    pub async fn posts_by_category(&self, slug: &str) -> Result<Vec<BlogPost>, BlogServiceError> {
        let key = format!("{}{}", CACHE_KEY_CATEGORY, slug);
        if let Some(cached) = self.cache.get::<Vec<BlogPost>>(&key).await.ok().flatten() {
            return Ok(cached);
        }

        let Some(category) = self
            .category_repo
            .get_by_slug(slug)
            .await
            .context("Failed to get category")?
        else {
            return Ok(Vec::new());
        };

        let posts = self
            .repo
            .list_published_by_category(category.id)
            .await
            .context("Failed to list posts by category")?;
        let _ = self.cache.set(&key, &posts, self.cache_ttl).await;
        Ok(posts)
    }

    /// Published posts among `ids`, in the given order
    pub async fn related_posts(&self, ids: &[i64]) -> Result<Vec<BlogPost>, BlogServiceError> {
        Ok(self
            .repo
            .list_published_by_ids(ids)
            .await
            .context("Failed to list related posts")?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxAuthorRepository, SqlxCategoryRepository, SqlxPostRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::{AuthorInput, CategoryInput};

    struct Fixture {
        service: BlogService,
        categories: Arc<dyn CategoryRepository>,
        authors: Arc<dyn AuthorRepository>,
    }

    async fn setup() -> Fixture {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let categories = SqlxCategoryRepository::boxed(pool.clone());
        let authors = SqlxAuthorRepository::boxed(pool.clone());
        let service = BlogService::new(
            SqlxPostRepository::boxed(pool.clone()),
            authors.clone(),
            categories.clone(),
            Arc::new(Cache::new()),
            Arc::new(ActivityService::for_pool(pool)),
        );
        Fixture {
            service,
            categories,
            authors,
        }
    }

    fn input(slug: &str, status: PostStatus) -> PostInput {
        PostInput {
            slug: slug.to_string(),
            title_en: format!("Title {}", slug),
            title_it: format!("Titolo {}", slug),
            excerpt_en: "Excerpt".to_string(),
            excerpt_it: "Estratto".to_string(),
            content_en: "Content".to_string(),
            content_it: "Contenuto".to_string(),
            status,
            ..Default::default()
        }
    }

    fn faq(question: &str) -> FaqInput {
        FaqInput {
            question_en: question.to_string(),
            question_it: question.to_string(),
            answer_en: "Yes".to_string(),
            answer_it: "Sì".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_published_sets_published_at() {
        let f = setup().await;
        let actor = Actor::new(1);

        let draft = f.service.create_post(input("draft", PostStatus::Draft), &actor).await.unwrap();
        assert!(draft.published_at.is_none());

        let live = f.service.create_post(input("live", PostStatus::Published), &actor).await.unwrap();
        assert!(live.published_at.is_some());
        assert_eq!(live.created_by, Some(1));
        assert_eq!(live.reading_time, 5);
    }

    #[tokio::test]
    async fn test_duplicate_slug_conflict() {
        let f = setup().await;
        let actor = Actor::new(1);
        f.service.create_post(input("marble", PostStatus::Draft), &actor).await.unwrap();

        let err = f
            .service
            .create_post(input("marble", PostStatus::Draft), &actor)
            .await
            .unwrap_err();
        assert!(matches!(err, BlogServiceError::DuplicateSlug(_)));
        assert_eq!(err.to_string(), "A post with this slug already exists");
    }

    #[tokio::test]
    async fn test_update_slug_uniqueness_excludes_self() {
        let f = setup().await;
        let actor = Actor::new(1);
        let a = f.service.create_post(input("a", PostStatus::Draft), &actor).await.unwrap();
        f.service.create_post(input("b", PostStatus::Draft), &actor).await.unwrap();

        let mut same = input("a", PostStatus::Draft);
        same.title_en = "Renamed".to_string();
        let updated = f.service.update_post(a.id, same, &actor).await.unwrap();
        assert_eq!(updated.title_en, "Renamed");

        let result = f.service.update_post(a.id, input("b", PostStatus::Draft), &actor).await;
        assert!(matches!(result, Err(BlogServiceError::DuplicateSlug(_))));
    }

    #[tokio::test]
    async fn test_published_at_set_only_on_first_publish() {
        let f = setup().await;
        let actor = Actor::new(1);
        let post = f.service.create_post(input("p", PostStatus::Draft), &actor).await.unwrap();

        let published = f.service.publish(post.id, &actor).await.unwrap();
        let first = published.published_at.unwrap();

        let draft = f.service.unpublish(post.id, &actor).await.unwrap();
        assert_eq!(draft.status, PostStatus::Draft);

        let again = f.service.update_post(post.id, input("p", PostStatus::Published), &actor).await.unwrap();
        assert_eq!(again.published_at, Some(first));

        let republished = f.service.publish(post.id, &actor).await.unwrap();
        assert_eq!(republished.published_at, Some(first));
    }

    #[tokio::test]
    async fn test_validation_errors() {
        let f = setup().await;
        let actor = Actor::new(1);

        let mut missing = input("x", PostStatus::Draft);
        missing.content_it = String::new();
        let result = f.service.create_post(missing, &actor).await;
        assert!(matches!(result, Err(BlogServiceError::ValidationError(m)) if m.contains("content_it")));

        let mut unknown_author = input("y", PostStatus::Draft);
        unknown_author.author_id = Some(42);
        let result = f.service.create_post(unknown_author, &actor).await;
        assert!(matches!(result, Err(BlogServiceError::ValidationError(_))));

        let result = f.service.create_post(input("with space", PostStatus::Draft), &actor).await;
        assert!(matches!(result, Err(BlogServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_faqs_and_related() {
        let f = setup().await;
        let actor = Actor::new(1);
        let main = f.service.create_post(input("main", PostStatus::Published), &actor).await.unwrap();
        let other = f.service.create_post(input("other", PostStatus::Published), &actor).await.unwrap();
        let third = f.service.create_post(input("third", PostStatus::Published), &actor).await.unwrap();

        let faqs = f
            .service
            .save_faqs(main.id, &[faq("First?"), faq("Second?")], &actor)
            .await
            .unwrap();
        assert_eq!(faqs.len(), 2);
        assert_eq!(faqs[1].sort_order, 1);

        let saved = f
            .service
            .save_related(main.id, &[third.id, main.id, other.id, third.id], &actor)
            .await
            .unwrap();
        assert_eq!(saved, vec![third.id, other.id]);

        let detail = f.service.post_by_slug("main").await.unwrap().unwrap();
        assert_eq!(detail.faqs.len(), 2);
        let related: Vec<_> = detail.related.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(related, vec!["third", "other"]);

        let form = f.service.editor_form(main.id).await.unwrap();
        assert_eq!(form.faqs[0].question_en, "First?");
        assert_eq!(form.related_post_ids, vec![third.id, other.id]);
    }

    #[tokio::test]
    async fn test_save_post_with_faqs_creates_everything() {
        let f = setup().await;
        let actor = Actor::new(1);
        let mut form = PostForm::new();
        form.post = input("form", PostStatus::Published);
        form.add_faq();
        form.update_faq(0, crate::services::editor::FaqField::QuestionEn, "Why marble?");

        let saved = f.service.save_post_with_faqs(None, form, &actor).await.unwrap();
        assert!(saved.warning.is_none());
        assert_eq!(saved.faqs.len(), 1);
        assert_eq!(saved.faqs[0].question_en, "Why marble?");
    }

    #[tokio::test]
    async fn test_save_post_with_faqs_reports_related_failure() {
        let f = setup().await;
        let actor = Actor::new(1);
        let mut form = PostForm::new();
        form.post = input("form", PostStatus::Draft);
        form.related_post_ids = vec![9999];

        let saved = f.service.save_post_with_faqs(None, form, &actor).await.unwrap();
        assert!(saved.warning.is_some());
        assert!(f.service.get_by_id(saved.post.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_public_queries_hide_drafts() {
        let f = setup().await;
        let actor = Actor::new(1);
        f.service.create_post(input("draft", PostStatus::Draft), &actor).await.unwrap();
        f.service.create_post(input("live", PostStatus::Published), &actor).await.unwrap();

        assert!(f.service.post_by_slug("draft").await.unwrap().is_none());
        assert!(f.service.post_by_slug("missing").await.unwrap().is_none());

        let page = f.service.published_posts(&ListParams::default()).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].slug, "live");

        let admin = f.service.list_admin(None, &ListParams::default()).await.unwrap();
        assert_eq!(admin.total, 2);
        let drafts = f
            .service
            .list_admin(Some(PostStatus::Draft), &ListParams::default())
            .await
            .unwrap();
        assert_eq!(drafts.items[0].slug, "draft");
    }

    #[tokio::test]
    async fn test_cache_invalidated_by_writes() {
        let f = setup().await;
        let actor = Actor::new(1);
        let post = f.service.create_post(input("live", PostStatus::Published), &actor).await.unwrap();

        assert_eq!(f.service.published_posts(&ListParams::default()).await.unwrap().total, 1);
        assert!(f.service.post_by_slug("live").await.unwrap().is_some());

        f.service.unpublish(post.id, &actor).await.unwrap();
        assert_eq!(f.service.published_posts(&ListParams::default()).await.unwrap().total, 0);
        assert!(f.service.post_by_slug("live").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_featured_and_category_queries() {
        let f = setup().await;
        let actor = Actor::new(1);
        let category = f
            .categories
            .create(&CategoryInput {
                name_en: "Materials".to_string(),
                name_it: "Materiali".to_string(),
                slug: "materials".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        let author = f
            .authors
            .create(&AuthorInput {
                name: "Elena Rossi".to_string(),
                slug: "elena-rossi".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        let mut in_category = input("marble", PostStatus::Published);
        in_category.category_id = Some(category.id);
        in_category.author_id = Some(author.id);
        let post = f.service.create_post(in_category, &actor).await.unwrap();
        f.service.create_post(input("other", PostStatus::Published), &actor).await.unwrap();

        let posts = f.service.posts_by_category("materials").await.unwrap();
        assert_eq!(posts.len(), 1);
        assert!(f.service.posts_by_category("unknown").await.unwrap().is_empty());

        assert!(f.service.featured_posts(3).await.unwrap().is_empty());
        f.service.toggle_featured(post.id, &actor).await.unwrap();
        assert_eq!(f.service.featured_posts(3).await.unwrap().len(), 1);

        let detail = f.service.post_by_slug("marble").await.unwrap().unwrap();
        assert_eq!(detail.author.unwrap().name, "Elena Rossi");
        assert_eq!(detail.category.unwrap().slug, "materials");
    }

    #[tokio::test]
    async fn test_delete_post() {
        let f = setup().await;
        let actor = Actor::new(1);
        let post = f.service.create_post(input("gone", PostStatus::Published), &actor).await.unwrap();
        f.service.save_faqs(post.id, &[faq("Q?")], &actor).await.unwrap();

        f.service.delete_post(post.id, &actor).await.unwrap();
        assert!(matches!(f.service.get_by_id(post.id).await, Err(BlogServiceError::NotFound(_))));
        assert!(f.service.all_published().await.unwrap().is_empty());
    }
}
