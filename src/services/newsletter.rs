//! Newsletter signup

use crate::db::repositories::NewsletterRepository;
use crate::models::Locale;
use crate::services::email::is_valid_email;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum NewsletterError {
    #[error("Email is required")]
    MissingEmail,

    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Could not process subscription")]
    InternalError(#[from] anyhow::Error),
}

/// Result of a signup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub success: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub already_subscribed: bool,
}

pub struct NewsletterService {
    repo: Arc<dyn NewsletterRepository>,
}

impl NewsletterService {
    pub fn new(repo: Arc<dyn NewsletterRepository>) -> Self {
        Self { repo }
    }

    /// Subscribe an address. Anything other than `en` is stored as `it`.
    pub async fn subscribe(
        &self,
        email: Option<&str>,
        locale: Option<&str>,
    ) -> Result<Subscription, NewsletterError> {
        let email = email.map(str::trim).unwrap_or_default();
        if email.is_empty() {
            return Err(NewsletterError::MissingEmail);
        }
        if !is_valid_email(email) {
            return Err(NewsletterError::InvalidEmail);
        }

        let email = email.to_lowercase();
        let locale = match locale.and_then(Locale::parse) {
            Some(Locale::En) => Locale::En,
            _ => Locale::It,
        };

        let stored = self.repo.subscribe(&email, locale).await?;
        match stored {
            Some(subscriber) => {
                tracing::info!(id = subscriber.id, locale = %locale, "Newsletter subscription");
                Ok(Subscription {
                    success: true,
                    already_subscribed: false,
                })
            }
            None => Ok(Subscription {
                success: true,
                already_subscribed: true,
            }),
        }
    }

    pub async fn count(&self) -> anyhow::Result<i64> {
        self.repo.count().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxNewsletterRepository;
    use crate::db::{create_test_pool, migrations};

    async fn service() -> NewsletterService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool).await.expect("Failed to run migrations");
        NewsletterService::new(SqlxNewsletterRepository::boxed(pool))
    }

    #[tokio::test]
    async fn test_subscribe_normalizes_and_detects_duplicates() {
        let service = service().await;

        let first = service
            .subscribe(Some("  Client@Example.COM "), Some("en"))
            .await
            .unwrap();
        assert!(first.success);
        assert!(!first.already_subscribed);

        let second = service
            .subscribe(Some("client@example.com"), Some("fr"))
            .await
            .unwrap();
        assert!(second.already_subscribed);
        assert_eq!(service.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_subscribe_rejects_bad_input() {
        let service = service().await;

        let missing = service.subscribe(None, None).await.unwrap_err();
        assert_eq!(missing.to_string(), "Email is required");

        let blank = service.subscribe(Some("   "), None).await.unwrap_err();
        assert!(matches!(blank, NewsletterError::MissingEmail));

        let invalid = service.subscribe(Some("not-an-email"), None).await.unwrap_err();
        assert_eq!(invalid.to_string(), "Invalid email address");
    }

    #[test]
    fn test_subscription_json() {
        let fresh = Subscription {
            success: true,
            already_subscribed: false,
        };
        assert_eq!(serde_json::to_value(fresh).unwrap(), serde_json::json!({"success": true}));

        let repeat = Subscription {
            success: true,
            already_subscribed: true,
        };
        assert_eq!(
            serde_json::to_value(repeat).unwrap(),
            serde_json::json!({"success": true, "alreadySubscribed": true})
        );
    }
}
