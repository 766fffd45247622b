//! Site content repository
//!
//! Translation strings edited in the admin and the sections that group them.

use crate::db::DynDatabasePool;
use crate::models::{ContentSection, ContentType, NewSiteContent, SiteContent};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

/// Site content repository trait
#[async_trait]
pub trait SiteContentRepository: Send + Sync {
    /// All rows ordered by section, then sort_order
    async fn list_all(&self) -> Result<Vec<SiteContent>>;

    async fn list_by_section(&self, section: &str) -> Result<Vec<SiteContent>>;

    async fn get_by_key(&self, content_key: &str) -> Result<Option<SiteContent>>;

    async fn get_by_id(&self, id: i64) -> Result<Option<SiteContent>>;

    /// Set both language values of one row
    async fn update_values(
        &self,
        id: i64,
        content_en: &str,
        content_it: &str,
        updated_by: Option<i64>,
    ) -> Result<Option<SiteContent>>;

    /// Insert or overwrite the row with `content.content_key`
    async fn upsert(&self, content: &NewSiteContent) -> Result<()>;

    async fn count(&self) -> Result<i64>;

    async fn list_sections(&self) -> Result<Vec<ContentSection>>;
}

/// SQLx-based site content repository
pub struct SqlxSiteContentRepository {
    pool: DynDatabasePool,
}

impl SqlxSiteContentRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn SiteContentRepository> {
        Arc::new(Self::new(pool))
    }
}

const SELECT_CONTENT: &str = r#"
    SELECT id, content_key, section, content_en, content_it, content_type, description,
           is_array, sort_order, updated_at, updated_by
    FROM site_content
"#;

#[async_trait]
impl SiteContentRepository for SqlxSiteContentRepository {
    async fn list_all(&self) -> Result<Vec<SiteContent>> {
        let rows = sqlx::query(&format!("{} ORDER BY section, sort_order, id", SELECT_CONTENT))
            .fetch_all(self.pool.sqlite())
            .await
            .context("Failed to list site content")?;
        Ok(rows.iter().map(row_to_content).collect())
    }

    async fn list_by_section(&self, section: &str) -> Result<Vec<SiteContent>> {
        let rows = sqlx::query(&format!(
            "{} WHERE section = ? ORDER BY sort_order, id",
            SELECT_CONTENT
        ))
        .bind(section)
        .fetch_all(self.pool.sqlite())
        .await
        .context("Failed to list site content by section")?;
        Ok(rows.iter().map(row_to_content).collect())
    }

    async fn get_by_key(&self, content_key: &str) -> Result<Option<SiteContent>> {
        let row = sqlx::query(&format!("{} WHERE content_key = ?", SELECT_CONTENT))
            .bind(content_key)
            .fetch_optional(self.pool.sqlite())
            .await
            .context("Failed to get site content by key")?;
        Ok(row.as_ref().map(row_to_content))
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<SiteContent>> {
        let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_CONTENT))
            .bind(id)
            .fetch_optional(self.pool.sqlite())
            .await
            .context("Failed to get site content")?;
        Ok(row.as_ref().map(row_to_content))
    }

    async fn update_values(
        &self,
        id: i64,
        content_en: &str,
        content_it: &str,
        updated_by: Option<i64>,
    ) -> Result<Option<SiteContent>> {
        let result = sqlx::query(
            r#"
            UPDATE site_content
            SET content_en = ?, content_it = ?, updated_at = ?, updated_by = ?
            WHERE id = ?
            "#,
        )
        .bind(content_en)
        .bind(content_it)
        .bind(Utc::now())
        .bind(updated_by)
        .bind(id)
        .execute(self.pool.sqlite())
        .await
        .context("Failed to update site content")?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    async fn upsert(&self, content: &NewSiteContent) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO site_content (content_key, section, content_en, content_it, content_type, is_array, sort_order, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(content_key) DO UPDATE SET
                section = excluded.section,
                content_en = excluded.content_en,
                content_it = excluded.content_it,
                content_type = excluded.content_type,
                is_array = excluded.is_array,
                sort_order = excluded.sort_order,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&content.content_key)
        .bind(&content.section)
        .bind(&content.content_en)
        .bind(&content.content_it)
        .bind(content.content_type.as_str())
        .bind(content.is_array)
        .bind(content.sort_order)
        .bind(Utc::now())
        .execute(self.pool.sqlite())
        .await
        .with_context(|| format!("Failed to upsert site content: {}", content.content_key))?;
        Ok(())
    }

    async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM site_content")
            .fetch_one(self.pool.sqlite())
            .await
            .context("Failed to count site content")?;
        Ok(row.get("count"))
    }

    async fn list_sections(&self) -> Result<Vec<ContentSection>> {
        let rows = sqlx::query(
            r#"
            SELECT id, section_key, display_name_en, display_name_it, description, sort_order
            FROM content_sections
            ORDER BY sort_order, id
            "#,
        )
        .fetch_all(self.pool.sqlite())
        .await
        .context("Failed to list content sections")?;

        Ok(rows
            .iter()
            .map(|row| ContentSection {
                id: row.get("id"),
                section_key: row.get("section_key"),
                display_name_en: row.get("display_name_en"),
                display_name_it: row.get("display_name_it"),
                description: row.get("description"),
                sort_order: row.get("sort_order"),
            })
            .collect())
    }
}

fn row_to_content(row: &sqlx::sqlite::SqliteRow) -> SiteContent {
    let content_type: String = row.get("content_type");
    SiteContent {
        id: row.get("id"),
        content_key: row.get("content_key"),
        section: row.get("section"),
        content_en: row.get("content_en"),
        content_it: row.get("content_it"),
        content_type: ContentType::from_str(&content_type).unwrap_or_default(),
        description: row.get("description"),
        is_array: row.get("is_array"),
        sort_order: row.get("sort_order"),
        updated_at: row.get("updated_at"),
        updated_by: row.get("updated_by"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> SqlxSiteContentRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxSiteContentRepository::new(pool)
    }

    fn row(key: &str, en: &str, it: &str, sort_order: i32) -> NewSiteContent {
        NewSiteContent {
            content_key: key.to_string(),
            section: crate::models::section_of(key).to_string(),
            content_en: en.to_string(),
            content_it: it.to_string(),
            content_type: ContentType::infer(en),
            is_array: en.starts_with('['),
            sort_order,
        }
    }

    #[tokio::test]
    async fn test_upsert_inserts_then_overwrites() {
        let repo = setup_test_repo().await;
        repo.upsert(&row("hero.tagline1", "Italian Excellence", "Eccellenza Italiana", 0))
            .await
            .unwrap();
        repo.upsert(&row("hero.tagline1", "Made in Italy", "Fatto in Italia", 0))
            .await
            .unwrap();

        assert_eq!(repo.count().await.unwrap(), 1);
        let stored = repo.get_by_key("hero.tagline1").await.unwrap().unwrap();
        assert_eq!(stored.content_en, "Made in Italy");
        assert_eq!(stored.section, "hero");
        assert_eq!(stored.content_type, ContentType::Text);
    }

    #[tokio::test]
    async fn test_list_by_section_and_all() {
        let repo = setup_test_repo().await;
        repo.upsert(&row("hero.b", "B", "B", 1)).await.unwrap();
        repo.upsert(&row("hero.a", "A", "A", 0)).await.unwrap();
        repo.upsert(&row("about.title", "About", "Chi siamo", 0)).await.unwrap();
        repo.upsert(&row("about.list", r#"["x","y"]"#, r#"["x","y"]"#, 1)).await.unwrap();

        let hero: Vec<String> = repo
            .list_by_section("hero")
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.content_key)
            .collect();
        assert_eq!(hero, vec!["hero.a", "hero.b"]);

        let all = repo.list_all().await.unwrap();
        assert_eq!(all[0].content_key, "about.title");
        assert!(all[1].is_array);
        assert_eq!(all[1].content_type, ContentType::Json);
    }

    #[tokio::test]
    async fn test_update_values() {
        let repo = setup_test_repo().await;
        repo.upsert(&row("nav.home", "Home", "Home", 0)).await.unwrap();
        let stored = repo.get_by_key("nav.home").await.unwrap().unwrap();

        let updated = repo
            .update_values(stored.id, "Start", "Inizio", None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.content_it, "Inizio");
        assert!(repo.update_values(999, "x", "y", None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sections_listed_in_order() {
        let repo = setup_test_repo().await;
        let sections = repo.list_sections().await.unwrap();
        assert_eq!(sections.first().map(|s| s.section_key.as_str()), Some("metadata"));
        assert_eq!(sections.last().map(|s| s.section_key.as_str()), Some("notFound"));
    }
}
