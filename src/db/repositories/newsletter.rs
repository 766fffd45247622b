//! Newsletter subscriber repository

use crate::db::DynDatabasePool;
use crate::models::{Locale, NewsletterSubscriber};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

#[async_trait]
pub trait NewsletterRepository: Send + Sync {
    /// Insert a subscriber. Returns None when the email is already present.
    async fn subscribe(&self, email: &str, locale: Locale) -> Result<Option<NewsletterSubscriber>>;

    async fn count(&self) -> Result<i64>;
}

/// SQLx-based newsletter repository
pub struct SqlxNewsletterRepository {
    pool: DynDatabasePool,
}

impl SqlxNewsletterRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn NewsletterRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl NewsletterRepository for SqlxNewsletterRepository {
    async fn subscribe(&self, email: &str, locale: Locale) -> Result<Option<NewsletterSubscriber>> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT OR IGNORE INTO newsletter_subscribers (email, locale, created_at) VALUES (?, ?, ?)",
        )
        .bind(email)
        .bind(locale.code())
        .bind(now)
        .execute(self.pool.sqlite())
        .await
        .context("Failed to store newsletter subscriber")?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        Ok(Some(NewsletterSubscriber {
            id: result.last_insert_rowid(),
            email: email.to_string(),
            locale,
            created_at: now,
        }))
    }

    async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM newsletter_subscribers")
            .fetch_one(self.pool.sqlite())
            .await
            .context("Failed to count subscribers")?;
        Ok(row.get("count"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    #[tokio::test]
    async fn test_subscribe_once() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool).await.expect("Failed to run migrations");
        let repo = SqlxNewsletterRepository::new(pool);

        let first = repo.subscribe("reader@example.com", Locale::En).await.unwrap();
        assert!(first.is_some());
        let second = repo.subscribe("reader@example.com", Locale::It).await.unwrap();
        assert!(second.is_none());
        assert_eq!(repo.count().await.unwrap(), 1);
    }
}
