//! Admin user repository

use crate::db::DynDatabasePool;
use crate::models::{AdminRole, AdminUser};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::str::FromStr;
use std::sync::Arc;

/// Admin user repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &AdminUser) -> Result<AdminUser>;

    async fn get_by_id(&self, id: i64) -> Result<Option<AdminUser>>;

    /// Lookup by (lower-cased) email
    async fn get_by_email(&self, email: &str) -> Result<Option<AdminUser>>;

    async fn update(&self, user: &AdminUser) -> Result<AdminUser>;

    /// Stamp `last_login` with the current time
    async fn touch_last_login(&self, id: i64) -> Result<()>;

    async fn count(&self) -> Result<i64>;

    async fn list(&self) -> Result<Vec<AdminUser>>;
}

/// SQLx-based admin user repository
pub struct SqlxUserRepository {
    pool: DynDatabasePool,
}

impl SqlxUserRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }
}

const SELECT_USER: &str = r#"
    SELECT id, email, display_name, password_hash, role, is_active, last_login, created_at, updated_at
    FROM admin_users
"#;

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, user: &AdminUser) -> Result<AdminUser> {
        let now = Utc::now();
        let email = user.email.trim().to_lowercase();

        let result = sqlx::query(
            r#"
            INSERT INTO admin_users (email, display_name, password_hash, role, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&email)
        .bind(&user.display_name)
        .bind(&user.password_hash)
        .bind(user.role.to_string())
        .bind(user.is_active)
        .bind(now)
        .bind(now)
        .execute(self.pool.sqlite())
        .await
        .context("Failed to create admin user")?;

        Ok(AdminUser {
            id: result.last_insert_rowid(),
            email,
            created_at: now,
            updated_at: now,
            ..user.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<AdminUser>> {
        let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_USER))
            .bind(id)
            .fetch_optional(self.pool.sqlite())
            .await
            .context("Failed to get admin user by ID")?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<AdminUser>> {
        let row = sqlx::query(&format!("{} WHERE email = ?", SELECT_USER))
            .bind(email.trim().to_lowercase())
            .fetch_optional(self.pool.sqlite())
            .await
            .context("Failed to get admin user by email")?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn update(&self, user: &AdminUser) -> Result<AdminUser> {
        let now = Utc::now();

        sqlx::query(
            r#"
            UPDATE admin_users
            SET email = ?, display_name = ?, password_hash = ?, role = ?, is_active = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(user.email.trim().to_lowercase())
        .bind(&user.display_name)
        .bind(&user.password_hash)
        .bind(user.role.to_string())
        .bind(user.is_active)
        .bind(now)
        .bind(user.id)
        .execute(self.pool.sqlite())
        .await
        .context("Failed to update admin user")?;

        Ok(AdminUser {
            updated_at: now,
            ..user.clone()
        })
    }

    async fn touch_last_login(&self, id: i64) -> Result<()> {
        sqlx::query("UPDATE admin_users SET last_login = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(self.pool.sqlite())
            .await
            .context("Failed to update last login")?;
        Ok(())
    }

    async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM admin_users")
            .fetch_one(self.pool.sqlite())
            .await
            .context("Failed to count admin users")?;
        Ok(row.get("count"))
    }

    async fn list(&self) -> Result<Vec<AdminUser>> {
        let rows = sqlx::query(&format!("{} ORDER BY created_at", SELECT_USER))
            .fetch_all(self.pool.sqlite())
            .await
            .context("Failed to list admin users")?;

        rows.iter().map(row_to_user).collect()
    }
}

fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<AdminUser> {
    let role: String = row.get("role");
    Ok(AdminUser {
        id: row.get("id"),
        email: row.get("email"),
        display_name: row.get("display_name"),
        password_hash: row.get("password_hash"),
        role: AdminRole::from_str(&role)?,
        is_active: row.get("is_active"),
        last_login: row.get("last_login"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> SqlxUserRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxUserRepository::new(pool)
    }

    fn test_user(email: &str, role: AdminRole) -> AdminUser {
        AdminUser::new(email.to_string(), "Test".to_string(), "hash".to_string(), role)
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = setup_test_repo().await;

        let created = repo
            .create(&test_user("Owner@Laxmi.it ", AdminRole::SuperAdmin))
            .await
            .expect("Failed to create user");
        assert!(created.id > 0);
        assert_eq!(created.email, "owner@laxmi.it");

        let by_id = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(by_id.role, AdminRole::SuperAdmin);
        assert!(by_id.is_active);

        let by_email = repo.get_by_email("OWNER@laxmi.it").await.unwrap();
        assert_eq!(by_email.map(|u| u.id), Some(created.id));
    }

    #[tokio::test]
    async fn test_duplicate_email_fails() {
        let repo = setup_test_repo().await;
        repo.create(&test_user("a@laxmi.it", AdminRole::Editor)).await.unwrap();
        assert!(repo.create(&test_user("a@laxmi.it", AdminRole::Admin)).await.is_err());
    }

    #[tokio::test]
    async fn test_update_and_last_login() {
        let repo = setup_test_repo().await;
        let mut user = repo.create(&test_user("e@laxmi.it", AdminRole::Editor)).await.unwrap();
        assert!(user.last_login.is_none());

        user.is_active = false;
        user.role = AdminRole::Admin;
        repo.update(&user).await.unwrap();
        repo.touch_last_login(user.id).await.unwrap();

        let stored = repo.get_by_id(user.id).await.unwrap().unwrap();
        assert!(!stored.is_active);
        assert_eq!(stored.role, AdminRole::Admin);
        assert!(stored.last_login.is_some());
    }

    #[tokio::test]
    async fn test_count_and_list() {
        let repo = setup_test_repo().await;
        assert_eq!(repo.count().await.unwrap(), 0);

        repo.create(&test_user("a@laxmi.it", AdminRole::Editor)).await.unwrap();
        repo.create(&test_user("b@laxmi.it", AdminRole::Admin)).await.unwrap();

        assert_eq!(repo.count().await.unwrap(), 2);
        assert_eq!(repo.list().await.unwrap().len(), 2);
    }
}
