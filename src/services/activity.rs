//! Admin audit log and dashboard statistics

use crate::db::repositories::{
    ActivityRepository, AuthorRepository, CategoryRepository, GalleryRepository, PostRepository,
    SiteContentRepository, SqlxActivityRepository, SqlxAuthorRepository, SqlxCategoryRepository,
    SqlxGalleryRepository, SqlxPostRepository, SqlxSiteContentRepository,
};
use crate::db::DynDatabasePool;
use crate::models::{Actor, DashboardStats, NewActivity};
use anyhow::{Context, Result};
use serde::Serialize;
use std::sync::Arc;

/// Entries shown in the dashboard's recent activity list
pub const RECENT_ACTIVITY_LIMIT: i64 = 10;

pub struct ActivityService {
    activity_repo: Arc<dyn ActivityRepository>,
    post_repo: Arc<dyn PostRepository>,
    category_repo: Arc<dyn CategoryRepository>,
    author_repo: Arc<dyn AuthorRepository>,
    content_repo: Arc<dyn SiteContentRepository>,
    gallery_repo: Arc<dyn GalleryRepository>,
}

impl ActivityService {
    pub fn new(
        activity_repo: Arc<dyn ActivityRepository>,
        post_repo: Arc<dyn PostRepository>,
        category_repo: Arc<dyn CategoryRepository>,
        author_repo: Arc<dyn AuthorRepository>,
        content_repo: Arc<dyn SiteContentRepository>,
        gallery_repo: Arc<dyn GalleryRepository>,
    ) -> Self {
        Self {
            activity_repo,
            post_repo,
            category_repo,
            author_repo,
            content_repo,
            gallery_repo,
        }
    }

    /// Service backed by the sqlx repositories of `pool`
    pub fn for_pool(pool: DynDatabasePool) -> Self {
        Self::new(
            SqlxActivityRepository::boxed(pool.clone()),
            SqlxPostRepository::boxed(pool.clone()),
            SqlxCategoryRepository::boxed(pool.clone()),
            SqlxAuthorRepository::boxed(pool.clone()),
            SqlxSiteContentRepository::boxed(pool.clone()),
            SqlxGalleryRepository::boxed(pool),
        )
    }

    /// Append an audit entry. A failure is logged and never fails the write
    /// being audited.
    pub async fn record<O: Serialize, N: Serialize>(
        &self,
        actor: &Actor,
        action: &str,
        entity_type: &str,
        entity_id: impl ToString,
        old_value: Option<&O>,
        new_value: Option<&N>,
    ) {
        let entry = NewActivity::by(actor, action, entity_type, entity_id).with_values(
            old_value.and_then(|v| serde_json::to_value(v).ok()),
            new_value.and_then(|v| serde_json::to_value(v).ok()),
        );

        if let Err(e) = self.activity_repo.record(&entry).await {
            tracing::warn!(
                action,
                entity_type,
                error = %e,
                "Failed to record admin activity"
            );
        }
    }

    /// Counters and recent activity for the dashboard home
    pub async fn dashboard(&self) -> Result<DashboardStats> {
        let posts = self.post_repo.counts().await.context("Failed to count posts")?;

        Ok(DashboardStats {
            total_posts: posts.total,
            published_posts: posts.published,
            draft_posts: posts.draft,
            total_categories: self.category_repo.count().await?,
            total_authors: self.author_repo.count().await?,
            total_content_keys: self.content_repo.count().await?,
            total_gallery_images: self.gallery_repo.count().await?,
            recent_activity: self.activity_repo.list_recent(RECENT_ACTIVITY_LIMIT).await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::*;
    use crate::db::{create_test_pool, migrations};
    use crate::models::{CategoryInput, PostInput, PostStatus};

    async fn setup() -> (ActivityService, Arc<dyn PostRepository>, Arc<dyn CategoryRepository>) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool).await.expect("Failed to run migrations");
        let posts = SqlxPostRepository::boxed(pool.clone());
        let categories = SqlxCategoryRepository::boxed(pool.clone());
        let service = ActivityService::new(
            SqlxActivityRepository::boxed(pool.clone()),
            posts.clone(),
            categories.clone(),
            SqlxAuthorRepository::boxed(pool.clone()),
            SqlxSiteContentRepository::boxed(pool.clone()),
            SqlxGalleryRepository::boxed(pool),
        );
        (service, posts, categories)
    }

    #[tokio::test]
    async fn test_dashboard_counts() {
        let (service, posts, categories) = setup().await;

        for (slug, status) in [("a", PostStatus::Published), ("b", PostStatus::Draft), ("c", PostStatus::Archived)] {
            let input = PostInput {
                slug: slug.to_string(),
                status,
                ..Default::default()
            };
            posts.create(&input, None, None).await.unwrap();
        }
        categories
            .create(&CategoryInput {
                name_en: "Guides".to_string(),
                name_it: "Guide".to_string(),
                slug: "guides".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        let stats = service.dashboard().await.unwrap();
        assert_eq!(stats.total_posts, 3);
        assert_eq!(stats.published_posts, 1);
        assert_eq!(stats.draft_posts, 1);
        assert_eq!(stats.total_categories, 1);
        assert_eq!(stats.total_authors, 0);
        assert!(stats.recent_activity.is_empty());
    }

    #[tokio::test]
    async fn test_recent_activity_limited_to_ten() {
        let (service, _, _) = setup().await;
        let actor = Actor::new(1);

        for i in 0..15 {
            service
                .record(&actor, "update", "site_content", i, None::<&()>, Some(&serde_json::json!({"i": i})))
                .await;
        }

        let stats = service.dashboard().await.unwrap();
        assert_eq!(stats.recent_activity.len(), 10);
        assert_eq!(stats.recent_activity[0].entity_id.as_deref(), Some("14"));
    }
}
