//! Admin activity log model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Audit record of an admin write
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivityLogEntry {
    pub id: i64,
    pub admin_id: Option<i64>,
    /// Verb such as `create`, `update`, `delete`, `publish`
    pub action: String,
    /// Table-level entity name such as `blog_post`
    pub entity_type: String,
    pub entity_id: Option<String>,
    pub old_value: Option<serde_json::Value>,
    pub new_value: Option<serde_json::Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Activity entry before it is stored
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NewActivity {
    pub admin_id: Option<i64>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<String>,
    pub old_value: Option<serde_json::Value>,
    pub new_value: Option<serde_json::Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// The admin performing a write, with request details for the audit log
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Actor {
    pub admin_id: i64,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl Actor {
    pub fn new(admin_id: i64) -> Self {
        Self {
            admin_id,
            ..Default::default()
        }
    }
}

impl NewActivity {
    pub fn new(admin_id: i64, action: &str, entity_type: &str, entity_id: impl ToString) -> Self {
        Self {
            admin_id: Some(admin_id),
            action: action.to_string(),
            entity_type: entity_type.to_string(),
            entity_id: Some(entity_id.to_string()),
            ..Default::default()
        }
    }

    /// Entry attributed to `actor`, carrying its IP and user agent
    pub fn by(actor: &Actor, action: &str, entity_type: &str, entity_id: impl ToString) -> Self {
        Self {
            ip_address: actor.ip_address.clone(),
            user_agent: actor.user_agent.clone(),
            ..Self::new(actor.admin_id, action, entity_type, entity_id)
        }
    }

    pub fn with_values(
        mut self,
        old_value: Option<serde_json::Value>,
        new_value: Option<serde_json::Value>,
    ) -> Self {
        self.old_value = old_value;
        self.new_value = new_value;
        self
    }
}

/// Counters shown on the admin dashboard
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DashboardStats {
    pub total_posts: i64,
    pub published_posts: i64,
    pub draft_posts: i64,
    pub total_categories: i64,
    pub total_authors: i64,
    pub total_content_keys: i64,
    pub total_gallery_images: i64,
    pub recent_activity: Vec<ActivityLogEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_activity_builder() {
        let entry = NewActivity::new(3, "update", "blog_post", 42)
            .with_values(None, Some(serde_json::json!({"status": "published"})));

        assert_eq!(entry.admin_id, Some(3));
        assert_eq!(entry.entity_id.as_deref(), Some("42"));
        assert!(entry.old_value.is_none());
        assert_eq!(entry.new_value.unwrap()["status"], "published");
    }

    #[test]
    fn test_entry_by_actor_copies_request_details() {
        let actor = Actor {
            admin_id: 7,
            ip_address: Some("10.0.0.1".to_string()),
            user_agent: Some("curl".to_string()),
        };
        let entry = NewActivity::by(&actor, "delete", "gallery_image", 5);
        assert_eq!(entry.admin_id, Some(7));
        assert_eq!(entry.ip_address.as_deref(), Some("10.0.0.1"));
        assert_eq!(entry.user_agent.as_deref(), Some("curl"));
    }
}
