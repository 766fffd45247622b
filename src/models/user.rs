//! Admin user model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Account allowed into the admin dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminUser {
    pub id: i64,
    /// Login identifier (unique, stored lower-case)
    pub email: String,
    pub display_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: AdminRole,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AdminUser {
    /// Build a new active user. The password must already be hashed.
    pub fn new(email: String, display_name: String, password_hash: String, role: AdminRole) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            email,
            display_name,
            password_hash,
            role,
            is_active: true,
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Admins and super admins may delete content; editors may not
    pub fn can_delete(&self) -> bool {
        matches!(self.role, AdminRole::SuperAdmin | AdminRole::Admin)
    }

    pub fn is_super_admin(&self) -> bool {
        self.role == AdminRole::SuperAdmin
    }
}

/// Admin dashboard role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    SuperAdmin,
    Admin,
    #[default]
    Editor,
}

impl fmt::Display for AdminRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdminRole::SuperAdmin => write!(f, "super_admin"),
            AdminRole::Admin => write!(f, "admin"),
            AdminRole::Editor => write!(f, "editor"),
        }
    }
}

impl FromStr for AdminRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "super_admin" => Ok(AdminRole::SuperAdmin),
            "admin" => Ok(AdminRole::Admin),
            "editor" => Ok(AdminRole::Editor),
            _ => Err(anyhow::anyhow!("Invalid admin role: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_is_active() {
        let user = AdminUser::new(
            "owner@laxmi.it".to_string(),
            "Owner".to_string(),
            "hash".to_string(),
            AdminRole::SuperAdmin,
        );
        assert_eq!(user.id, 0);
        assert!(user.is_active);
        assert!(user.last_login.is_none());
        assert!(user.is_super_admin());
    }

    #[test]
    fn test_delete_permission_by_role() {
        let mut user = AdminUser::new("a@b.it".into(), "A".into(), "h".into(), AdminRole::Editor);
        assert!(!user.can_delete());
        user.role = AdminRole::Admin;
        assert!(user.can_delete());
        user.role = AdminRole::SuperAdmin;
        assert!(user.can_delete());
    }

    #[test]
    fn test_role_parse_and_display() {
        assert_eq!(AdminRole::from_str("SUPER_ADMIN").unwrap(), AdminRole::SuperAdmin);
        assert_eq!(AdminRole::from_str("editor").unwrap(), AdminRole::Editor);
        assert!(AdminRole::from_str("author").is_err());
        assert_eq!(AdminRole::SuperAdmin.to_string(), "super_admin");
        assert_eq!(
            serde_json::to_string(&AdminRole::SuperAdmin).unwrap(),
            "\"super_admin\""
        );
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = AdminUser::new("a@b.it".into(), "A".into(), "secret".into(), AdminRole::Admin);
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret"));
    }
}
