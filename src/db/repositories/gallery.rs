//! Gallery image repository

use crate::db::DynDatabasePool;
use crate::models::{
    CreateGalleryImageInput, GalleryCategory, GalleryImage, MoveDirection, UpdateGalleryImageInput,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

/// Gallery image repository trait
#[async_trait]
pub trait GalleryRepository: Send + Sync {
    /// Insert an image at the given position. Alt texts must be resolved.
    async fn create(&self, input: &CreateGalleryImageInput, sort_order: i32) -> Result<GalleryImage>;

    async fn get_by_id(&self, id: i64) -> Result<Option<GalleryImage>>;

    /// Every image, active or not, by sort_order
    async fn list_all(&self) -> Result<Vec<GalleryImage>>;

    /// Active images by sort_order
    async fn list_active(&self) -> Result<Vec<GalleryImage>>;

    /// Active featured images by sort_order
    async fn list_featured(&self) -> Result<Vec<GalleryImage>>;

    /// Active images whose English or Italian category equals `category`
    async fn list_by_category(&self, category: &str) -> Result<Vec<GalleryImage>>;

    /// Distinct (English, Italian) category pairs of active images
    async fn list_categories(&self) -> Result<Vec<GalleryCategory>>;

    async fn update(&self, id: i64, input: &UpdateGalleryImageInput) -> Result<Option<GalleryImage>>;

    async fn delete(&self, id: i64) -> Result<bool>;

    /// Highest sort_order in use, or -1 when empty
    async fn max_sort_order(&self) -> Result<i32>;

    async fn count(&self) -> Result<i64>;

    /// Swap sort_order with the neighbour in `direction` inside one
    /// transaction. Returns false when the image is already at that end.
    async fn move_image(&self, id: i64, direction: MoveDirection) -> Result<bool>;

    /// Assign explicit sort orders to several images in one transaction
    async fn reorder(&self, orders: &[(i64, i32)]) -> Result<()>;
}

/// SQLx-based gallery repository
pub struct SqlxGalleryRepository {
    pool: DynDatabasePool,
}

impl SqlxGalleryRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn GalleryRepository> {
        Arc::new(Self::new(pool))
    }

    async fn fetch(&self, filter: &str, bind: Option<&str>) -> Result<Vec<GalleryImage>> {
        let sql = format!("{} {} ORDER BY sort_order, id", SELECT_IMAGE, filter);
        let mut query = sqlx::query(&sql);
        if let Some(value) = bind {
            query = query.bind(value).bind(value);
        }
        let rows = query
            .fetch_all(self.pool.sqlite())
            .await
            .context("Failed to list gallery images")?;
        Ok(rows.iter().map(row_to_image).collect())
    }
}

const SELECT_IMAGE: &str = r#"
    SELECT id, image_url, image_path, title_en, title_it, category_en, category_it,
           alt_en, alt_it, sort_order, is_featured, is_active, created_at, updated_at
    FROM gallery_images
"#;

#[async_trait]
impl GalleryRepository for SqlxGalleryRepository {
    async fn create(&self, input: &CreateGalleryImageInput, sort_order: i32) -> Result<GalleryImage> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO gallery_images (
                image_url, image_path, title_en, title_it, category_en, category_it,
                alt_en, alt_it, sort_order, is_featured, is_active, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1, ?, ?)
            "#,
        )
        .bind(&input.image_url)
        .bind(&input.image_path)
        .bind(&input.title_en)
        .bind(&input.title_it)
        .bind(&input.category_en)
        .bind(&input.category_it)
        .bind(&input.alt_en)
        .bind(&input.alt_it)
        .bind(sort_order)
        .bind(input.is_featured)
        .bind(now)
        .bind(now)
        .execute(self.pool.sqlite())
        .await
        .context("Failed to create gallery image")?;

        Ok(GalleryImage {
            id: result.last_insert_rowid(),
            image_url: input.image_url.clone(),
            image_path: input.image_path.clone(),
            title_en: input.title_en.clone(),
            title_it: input.title_it.clone(),
            category_en: input.category_en.clone(),
            category_it: input.category_it.clone(),
            alt_en: input.alt_en.clone(),
            alt_it: input.alt_it.clone(),
            sort_order,
            is_featured: input.is_featured,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<GalleryImage>> {
        let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_IMAGE))
            .bind(id)
            .fetch_optional(self.pool.sqlite())
            .await
            .context("Failed to get gallery image")?;
        Ok(row.as_ref().map(row_to_image))
    }

    async fn list_all(&self) -> Result<Vec<GalleryImage>> {
        self.fetch("", None).await
    }

    async fn list_active(&self) -> Result<Vec<GalleryImage>> {
        self.fetch("WHERE is_active = 1", None).await
    }

    async fn list_featured(&self) -> Result<Vec<GalleryImage>> {
        self.fetch("WHERE is_active = 1 AND is_featured = 1", None).await
    }

    async fn list_by_category(&self, category: &str) -> Result<Vec<GalleryImage>> {
        self.fetch(
            "WHERE is_active = 1 AND (category_en = ? OR category_it = ?)",
            Some(category),
        )
        .await
    }

    async fn list_categories(&self) -> Result<Vec<GalleryCategory>> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT category_en, category_it
            FROM gallery_images
            WHERE is_active = 1
            ORDER BY category_en
            "#,
        )
        .fetch_all(self.pool.sqlite())
        .await
        .context("Failed to list gallery categories")?;

        Ok(rows
            .iter()
            .map(|row| GalleryCategory {
                en: row.get("category_en"),
                it: row.get("category_it"),
            })
            .collect())
    }

    async fn update(&self, id: i64, input: &UpdateGalleryImageInput) -> Result<Option<GalleryImage>> {
        let Some(existing) = self.get_by_id(id).await? else {
            return Ok(None);
        };

        sqlx::query(
            r#"
            UPDATE gallery_images
            SET title_en = ?, title_it = ?, category_en = ?, category_it = ?,
                alt_en = ?, alt_it = ?, is_featured = ?, is_active = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(input.title_en.as_ref().unwrap_or(&existing.title_en))
        .bind(input.title_it.as_ref().unwrap_or(&existing.title_it))
        .bind(input.category_en.as_ref().unwrap_or(&existing.category_en))
        .bind(input.category_it.as_ref().unwrap_or(&existing.category_it))
        .bind(input.alt_en.as_ref().unwrap_or(&existing.alt_en))
        .bind(input.alt_it.as_ref().unwrap_or(&existing.alt_it))
        .bind(input.is_featured.unwrap_or(existing.is_featured))
        .bind(input.is_active.unwrap_or(existing.is_active))
        .bind(Utc::now())
        .bind(id)
        .execute(self.pool.sqlite())
        .await
        .context("Failed to update gallery image")?;

        self.get_by_id(id).await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM gallery_images WHERE id = ?")
            .bind(id)
            .execute(self.pool.sqlite())
            .await
            .context("Failed to delete gallery image")?;
        Ok(result.rows_affected() > 0)
    }

    async fn max_sort_order(&self) -> Result<i32> {
        let row = sqlx::query("SELECT COALESCE(MAX(sort_order), -1) as max_order FROM gallery_images")
            .fetch_one(self.pool.sqlite())
            .await
            .context("Failed to read gallery sort order")?;
        Ok(row.get("max_order"))
    }

    async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM gallery_images")
            .fetch_one(self.pool.sqlite())
            .await
            .context("Failed to count gallery images")?;
        Ok(row.get("count"))
    }

    async fn move_image(&self, id: i64, direction: MoveDirection) -> Result<bool> {
        let mut tx = self.pool.sqlite().begin().await?;

        let Some(current) = sqlx::query("SELECT id, sort_order FROM gallery_images WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .context("Failed to read gallery image")?
        else {
            return Ok(false);
        };
        let current_order: i32 = current.get("sort_order");

        let neighbour_sql = match direction {
            MoveDirection::Up => {
                "SELECT id, sort_order FROM gallery_images WHERE sort_order < ? ORDER BY sort_order DESC LIMIT 1"
            }
            MoveDirection::Down => {
                "SELECT id, sort_order FROM gallery_images WHERE sort_order > ? ORDER BY sort_order ASC LIMIT 1"
            }
        };
        let Some(neighbour) = sqlx::query(neighbour_sql)
            .bind(current_order)
            .fetch_optional(&mut *tx)
            .await
            .context("Failed to read neighbouring image")?
        else {
            return Ok(false);
        };
        let neighbour_id: i64 = neighbour.get("id");
        let neighbour_order: i32 = neighbour.get("sort_order");

        let now = Utc::now();
        for (target, order) in [(id, neighbour_order), (neighbour_id, current_order)] {
            sqlx::query("UPDATE gallery_images SET sort_order = ?, updated_at = ? WHERE id = ?")
                .bind(order)
                .bind(now)
                .bind(target)
                .execute(&mut *tx)
                .await
                .context("Failed to swap gallery order")?;
        }

        tx.commit().await.context("Failed to commit gallery reorder")?;
        Ok(true)
    }

    async fn reorder(&self, orders: &[(i64, i32)]) -> Result<()> {
        let mut tx = self.pool.sqlite().begin().await?;
        let now = Utc::now();

        for (id, order) in orders {
            sqlx::query("UPDATE gallery_images SET sort_order = ?, updated_at = ? WHERE id = ?")
                .bind(order)
                .bind(now)
                .bind(id)
                .execute(&mut *tx)
                .await
                .context("Failed to reorder gallery image")?;
        }

        tx.commit().await.context("Failed to commit gallery reorder")?;
        Ok(())
    }
}

fn row_to_image(row: &sqlx::sqlite::SqliteRow) -> GalleryImage {
    GalleryImage {
        id: row.get("id"),
        image_url: row.get("image_url"),
        image_path: row.get("image_path"),
        title_en: row.get("title_en"),
        title_it: row.get("title_it"),
        category_en: row.get("category_en"),
        category_it: row.get("category_it"),
        alt_en: row.get("alt_en"),
        alt_it: row.get("alt_it"),
        sort_order: row.get("sort_order"),
        is_featured: row.get("is_featured"),
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> SqlxGalleryRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxGalleryRepository::new(pool)
    }

    fn input(title: &str, category_en: &str, category_it: &str) -> CreateGalleryImageInput {
        CreateGalleryImageInput {
            image_url: format!("/images/{}.jpg", title),
            title_en: title.to_string(),
            title_it: title.to_string(),
            category_en: category_en.to_string(),
            category_it: category_it.to_string(),
            alt_en: title.to_string(),
            alt_it: title.to_string(),
            ..Default::default()
        }
    }

    async fn seed(repo: &SqlxGalleryRepository) -> Vec<GalleryImage> {
        let mut images = Vec::new();
        for (i, (title, en, it)) in [
            ("a", "Kitchen", "Cucina"),
            ("b", "Living Room", "Soggiorno"),
            ("c", "Kitchen", "Cucina"),
        ]
        .iter()
        .enumerate()
        {
            images.push(repo.create(&input(title, en, it), i as i32).await.unwrap());
        }
        images
    }

    fn titles(images: &[GalleryImage]) -> Vec<String> {
        images.iter().map(|i| i.title_en.clone()).collect()
    }

    #[tokio::test]
    async fn test_create_defaults() {
        let repo = setup_test_repo().await;
        assert_eq!(repo.max_sort_order().await.unwrap(), -1);

        let image = repo.create(&input("a", "Kitchen", "Cucina"), 0).await.unwrap();
        assert!(image.is_active);
        assert!(!image.is_featured);
        assert_eq!(repo.max_sort_order().await.unwrap(), 0);
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_category_filters() {
        let repo = setup_test_repo().await;
        seed(&repo).await;

        assert_eq!(titles(&repo.list_by_category("Kitchen").await.unwrap()), vec!["a", "c"]);
        assert_eq!(titles(&repo.list_by_category("Soggiorno").await.unwrap()), vec!["b"]);

        let categories = repo.list_categories().await.unwrap();
        assert_eq!(categories.len(), 2);
        assert_eq!(categories[0].en, "Kitchen");
        assert_eq!(categories[1].it, "Soggiorno");
    }

    #[tokio::test]
    async fn test_partial_update_and_inactive_hidden() {
        let repo = setup_test_repo().await;
        let images = seed(&repo).await;

        let update = UpdateGalleryImageInput {
            title_en: Some("renamed".to_string()),
            is_active: Some(false),
            ..Default::default()
        };
        let updated = repo.update(images[0].id, &update).await.unwrap().unwrap();
        assert_eq!(updated.title_en, "renamed");
        assert_eq!(updated.title_it, "a");
        assert!(!updated.is_active);

        assert_eq!(titles(&repo.list_active().await.unwrap()), vec!["b", "c"]);
        assert_eq!(repo.list_all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_move_swaps_with_neighbour() {
        let repo = setup_test_repo().await;
        let images = seed(&repo).await;

        assert!(repo.move_image(images[2].id, MoveDirection::Up).await.unwrap());
        assert_eq!(titles(&repo.list_all().await.unwrap()), vec!["a", "c", "b"]);

        assert!(repo.move_image(images[0].id, MoveDirection::Down).await.unwrap());
        assert_eq!(titles(&repo.list_all().await.unwrap()), vec!["c", "a", "b"]);

        assert!(!repo.move_image(images[2].id, MoveDirection::Up).await.unwrap());
        assert!(!repo.move_image(999, MoveDirection::Down).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = setup_test_repo().await;
        let images = seed(&repo).await;
        assert!(repo.delete(images[1].id).await.unwrap());
        assert!(repo.get_by_id(images[1].id).await.unwrap().is_none());
        assert!(!repo.delete(images[1].id).await.unwrap());
    }

    #[tokio::test]
    async fn test_reorder_assigns_orders() {
        let repo = setup_test_repo().await;
        let images = seed(&repo).await;

        repo.reorder(&[(images[0].id, 2), (images[1].id, 0), (images[2].id, 1)])
            .await
            .unwrap();
        assert_eq!(titles(&repo.list_all().await.unwrap()), vec!["b", "c", "a"]);
    }
}
