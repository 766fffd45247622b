//! Blog author service

use crate::cache::{Cache, CacheLayer};
use crate::db::repositories::AuthorRepository;
use crate::models::{Actor, AuthorInput, BlogAuthor};
use crate::services::activity::ActivityService;
use crate::services::editor::generate_slug;
use anyhow::Context;
use std::sync::Arc;

/// Error types for author operations
#[derive(Debug, thiserror::Error)]
pub enum AuthorServiceError {
    #[error("An author with this slug already exists: {0}")]
    DuplicateSlug(String),

    #[error("Author not found: {0}")]
    NotFound(i64),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Service for managing blog authors
pub struct AuthorService {
    repo: Arc<dyn AuthorRepository>,
    cache: Arc<Cache>,
    activity: Arc<ActivityService>,
}

impl AuthorService {
    pub fn new(repo: Arc<dyn AuthorRepository>, cache: Arc<Cache>, activity: Arc<ActivityService>) -> Self {
        Self { repo, cache, activity }
    }

    /// All authors ordered by name
    pub async fn list(&self) -> Result<Vec<BlogAuthor>, AuthorServiceError> {
        Ok(self.repo.list().await.context("Failed to list authors")?)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<BlogAuthor, AuthorServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get author")?
            .ok_or(AuthorServiceError::NotFound(id))
    }

    pub async fn create(&self, input: AuthorInput, actor: &Actor) -> Result<BlogAuthor, AuthorServiceError> {
        let input = self.prepare(input, None).await?;
        let author = self.repo.create(&input).await.context("Failed to create author")?;

        self.activity
            .record(actor, "create", "blog_author", author.id, None::<&()>, Some(&author))
            .await;
        Ok(author)
    }

    pub async fn update(&self, id: i64, input: AuthorInput, actor: &Actor) -> Result<BlogAuthor, AuthorServiceError> {
        let existing = self.get_by_id(id).await?;
        let input = self.prepare(input, Some(id)).await?;

        let author = self
            .repo
            .update(id, &input)
            .await
            .context("Failed to update author")?
            .ok_or(AuthorServiceError::NotFound(id))?;

        self.invalidate_posts().await;
        self.activity
            .record(actor, "update", "blog_author", id, Some(&existing), Some(&author))
            .await;
        Ok(author)
    }

    /// Delete an author. Their posts keep existing without an author.
    pub async fn delete(&self, id: i64, actor: &Actor) -> Result<(), AuthorServiceError> {
        let existing = self.get_by_id(id).await?;
        if !self.repo.delete(id).await.context("Failed to delete author")? {
            return Err(AuthorServiceError::NotFound(id));
        }

        self.invalidate_posts().await;
        self.activity
            .record(actor, "delete", "blog_author", id, Some(&existing), None::<&()>)
            .await;
        Ok(())
    }

    /// Trim the input, derive a missing slug from the name and check that
    /// the slug is free
    async fn prepare(&self, mut input: AuthorInput, exclude_id: Option<i64>) -> Result<AuthorInput, AuthorServiceError> {
        input.name = input.name.trim().to_string();
        if input.name.is_empty() {
            return Err(AuthorServiceError::ValidationError("Name is required".to_string()));
        }

        input.slug = match input.slug.trim() {
            "" => generate_slug(&input.name),
            slug => generate_slug(slug),
        };
        if input.slug.is_empty() {
            return Err(AuthorServiceError::ValidationError(
                "Slug must contain letters or digits".to_string(),
            ));
        }

        if self
            .repo
            .slug_exists(&input.slug, exclude_id)
            .await
            .context("Failed to check slug")?
        {
            return Err(AuthorServiceError::DuplicateSlug(input.slug));
        }

        Ok(input)
    }

    async fn invalidate_posts(&self) {
        let _ = self.cache.delete_pattern("blog:*").await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxAuthorRepository;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> AuthorService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        AuthorService::new(
            SqlxAuthorRepository::boxed(pool.clone()),
            Arc::new(Cache::new()),
            Arc::new(ActivityService::for_pool(pool)),
        )
    }

    fn input(name: &str) -> AuthorInput {
        AuthorInput {
            name: name.to_string(),
            role_en: "Design Director".to_string(),
            role_it: "Direttrice creativa".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_derives_slug_from_name() {
        let service = setup().await;
        let author = service.create(input("  Elena Rossi "), &Actor::new(1)).await.unwrap();
        assert_eq!(author.name, "Elena Rossi");
        assert_eq!(author.slug, "elena-rossi");
    }

    #[tokio::test]
    async fn test_duplicate_slug_is_conflict() {
        let service = setup().await;
        service.create(input("Elena Rossi"), &Actor::new(1)).await.unwrap();

        let result = service.create(input("Elena  Rossi"), &Actor::new(1)).await;
        assert!(matches!(result, Err(AuthorServiceError::DuplicateSlug(_))));
    }

    #[tokio::test]
    async fn test_update_keeps_own_slug() {
        let service = setup().await;
        let author = service.create(input("Elena Rossi"), &Actor::new(1)).await.unwrap();

        let mut changed = input("Elena Rossi");
        changed.bio_en = Some("Twenty years in Milan".to_string());
        let updated = service.update(author.id, changed, &Actor::new(1)).await.unwrap();
        assert_eq!(updated.slug, "elena-rossi");
        assert_eq!(updated.bio_en.as_deref(), Some("Twenty years in Milan"));
    }

    #[tokio::test]
    async fn test_list_sorted_and_delete() {
        let service = setup().await;
        let zeta = service.create(input("Zeta Bianchi"), &Actor::new(1)).await.unwrap();
        service.create(input("Alba Verdi"), &Actor::new(1)).await.unwrap();

        let names: Vec<_> = service.list().await.unwrap().into_iter().map(|a| a.name).collect();
        assert_eq!(names, vec!["Alba Verdi", "Zeta Bianchi"]);

        service.delete(zeta.id, &Actor::new(1)).await.unwrap();
        assert!(matches!(service.get_by_id(zeta.id).await, Err(AuthorServiceError::NotFound(_))));
        assert!(matches!(
            service.delete(zeta.id, &Actor::new(1)).await,
            Err(AuthorServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_name_rejected() {
        let service = setup().await;
        let result = service.create(input("   "), &Actor::new(1)).await;
        assert!(matches!(result, Err(AuthorServiceError::ValidationError(_))));
    }
}
