//! Admin activity log repository

use crate::db::DynDatabasePool;
use crate::models::{ActivityLogEntry, NewActivity};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

#[async_trait]
pub trait ActivityRepository: Send + Sync {
    async fn record(&self, entry: &NewActivity) -> Result<i64>;

    /// Most recent entries first
    async fn list_recent(&self, limit: i64) -> Result<Vec<ActivityLogEntry>>;
}

/// SQLx-based activity log repository
pub struct SqlxActivityRepository {
    pool: DynDatabasePool,
}

impl SqlxActivityRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ActivityRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ActivityRepository for SqlxActivityRepository {
    async fn record(&self, entry: &NewActivity) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO admin_activity_log (admin_id, action, entity_type, entity_id, old_value, new_value, ip_address, user_agent, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.admin_id)
        .bind(&entry.action)
        .bind(&entry.entity_type)
        .bind(&entry.entity_id)
        .bind(entry.old_value.as_ref().map(|v| v.to_string()))
        .bind(entry.new_value.as_ref().map(|v| v.to_string()))
        .bind(&entry.ip_address)
        .bind(&entry.user_agent)
        .bind(Utc::now())
        .execute(self.pool.sqlite())
        .await
        .context("Failed to record activity")?;

        Ok(result.last_insert_rowid())
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<ActivityLogEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, admin_id, action, entity_type, entity_id, old_value, new_value, ip_address, user_agent, created_at
            FROM admin_activity_log
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(self.pool.sqlite())
        .await
        .context("Failed to list activity")?;

        Ok(rows
            .iter()
            .map(|row| {
                let old_value: Option<String> = row.get("old_value");
                let new_value: Option<String> = row.get("new_value");
                ActivityLogEntry {
                    id: row.get("id"),
                    admin_id: row.get("admin_id"),
                    action: row.get("action"),
                    entity_type: row.get("entity_type"),
                    entity_id: row.get("entity_id"),
                    old_value: old_value.and_then(|v| serde_json::from_str(&v).ok()),
                    new_value: new_value.and_then(|v| serde_json::from_str(&v).ok()),
                    ip_address: row.get("ip_address"),
                    user_agent: row.get("user_agent"),
                    created_at: row.get("created_at"),
                }
            })
            .collect())
    }
}
