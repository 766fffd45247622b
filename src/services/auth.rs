//! Admin authentication service
//!
//! Implements the admin login flow:
//! - Credential check against argon2 hashes
//! - Opaque session tokens that expire after seven days
//! - Session validation for every admin request
//! - Bootstrap of the first super admin

use crate::db::repositories::{SessionRepository, UserRepository};
use crate::models::{AdminRole, AdminUser, Session};
use crate::services::email::is_valid_email;
use crate::services::password::{check_password_length, hash_password, verify_password};
use anyhow::Context;
use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Default session lifetime in days
pub const DEFAULT_SESSION_EXPIRATION_DAYS: i64 = 7;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Error types for authentication operations
#[derive(Debug, thiserror::Error)]
pub enum AuthServiceError {
    /// Wrong email/password or disabled account
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("User already exists: {0}")]
    UserExists(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Service for admin login and sessions
pub struct AuthService {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
    session_expiration_days: i64,
}

impl AuthService {
    pub fn new(user_repo: Arc<dyn UserRepository>, session_repo: Arc<dyn SessionRepository>) -> Self {
        Self {
            user_repo,
            session_repo,
            session_expiration_days: DEFAULT_SESSION_EXPIRATION_DAYS,
        }
    }

    /// Create a service with a custom session lifetime
    pub fn with_session_expiration(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
        session_expiration_days: i64,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            session_expiration_days,
        }
    }

    /// Session lifetime, used for the cookie max-age
    pub fn session_lifetime(&self) -> Duration {
        Duration::days(self.session_expiration_days)
    }

    /// Verify credentials and open a new session.
    ///
    /// Unknown emails and wrong passwords get the same message. Inactive
    /// accounts are refused even with the right password.
    pub async fn login(&self, email: &str, password: &str) -> Result<(Session, AdminUser), AuthServiceError> {
        let email = email.trim().to_lowercase();

        let user = self
            .user_repo
            .get_by_email(&email)
            .await
            .context("Failed to get user by email")?
            .ok_or_else(|| AuthServiceError::AuthenticationError(INVALID_CREDENTIALS.to_string()))?;

        let password_valid =
            verify_password(password, &user.password_hash).context("Failed to verify password")?;
        if !password_valid {
            return Err(AuthServiceError::AuthenticationError(INVALID_CREDENTIALS.to_string()));
        }

        if !user.is_active {
            return Err(AuthServiceError::AuthenticationError(
                "This account has been deactivated".to_string(),
            ));
        }

        let session = self.create_session(user.id).await?;

        self.user_repo
            .touch_last_login(user.id)
            .await
            .context("Failed to update last login")?;

        tracing::info!(user_id = user.id, "Admin logged in");
        Ok((session, user))
    }

    /// Invalidate a session. Unknown tokens are not an error.
    pub async fn logout(&self, session_id: &str) -> Result<(), AuthServiceError> {
        self.session_repo
            .delete(session_id)
            .await
            .context("Failed to delete session")?;
        Ok(())
    }

    /// Resolve a session token to its active user.
    ///
    /// Expired sessions are deleted on sight. Returns `None` for unknown or
    /// expired tokens and for users that were deactivated.
    pub async fn validate_session(&self, token: &str) -> Result<Option<AdminUser>, AuthServiceError> {
        let session = match self
            .session_repo
            .get_by_id(token)
            .await
            .context("Failed to get session")?
        {
            Some(s) => s,
            None => return Ok(None),
        };

        if session.is_expired() {
            let _ = self.session_repo.delete(token).await;
            return Ok(None);
        }

        let user = self
            .user_repo
            .get_by_id(session.user_id)
            .await
            .context("Failed to get user")?;

        Ok(user.filter(|u| u.is_active))
    }

    /// Create an admin account
    pub async fn create_admin(
        &self,
        email: &str,
        display_name: &str,
        password: &str,
        role: AdminRole,
    ) -> Result<AdminUser, AuthServiceError> {
        let email = email.trim().to_lowercase();
        if !is_valid_email(&email) {
            return Err(AuthServiceError::ValidationError("Invalid email address".to_string()));
        }
        check_password_length(password).map_err(|e| AuthServiceError::ValidationError(e.to_string()))?;

        if self
            .user_repo
            .get_by_email(&email)
            .await
            .context("Failed to check email")?
            .is_some()
        {
            return Err(AuthServiceError::UserExists(format!(
                "Email '{}' is already registered",
                email
            )));
        }

        let password_hash = hash_password(password).context("Failed to hash password")?;
        let display_name = match display_name.trim() {
            "" => email.split('@').next().unwrap_or(&email).to_string(),
            name => name.to_string(),
        };

        let user = self
            .user_repo
            .create(&AdminUser::new(email, display_name, password_hash, role))
            .await
            .context("Failed to create admin user")?;

        Ok(user)
    }

    /// Create the first super admin when the table is empty.
    ///
    /// Returns the new user, or `None` when an admin already exists.
    pub async fn ensure_super_admin(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<AdminUser>, AuthServiceError> {
        let count = self.user_repo.count().await.context("Failed to count users")?;
        if count > 0 {
            return Ok(None);
        }

        let user = self
            .create_admin(email, "Administrator", password, AdminRole::SuperAdmin)
            .await?;
        Ok(Some(user))
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<AdminUser>, AuthServiceError> {
        let user = self
            .user_repo
            .get_by_id(id)
            .await
            .context("Failed to get user by ID")?;
        Ok(user)
    }

    /// Delete all expired sessions, returning how many were removed
    pub async fn cleanup_expired_sessions(&self) -> Result<u64, AuthServiceError> {
        let count = self
            .session_repo
            .delete_expired()
            .await
            .context("Failed to delete expired sessions")?;
        Ok(count)
    }

    async fn create_session(&self, user_id: i64) -> Result<Session, AuthServiceError> {
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4().to_string(),
            user_id,
            expires_at: now + Duration::days(self.session_expiration_days),
            created_at: now,
        };

        let created = self
            .session_repo
            .create(&session)
            .await
            .context("Failed to create session")?;

        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxSessionRepository, SqlxUserRepository};
    use crate::db::{create_test_pool, migrations, DynDatabasePool};

    async fn setup_with_expiration(days: i64) -> (DynDatabasePool, AuthService) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let service = AuthService::with_session_expiration(
            SqlxUserRepository::boxed(pool.clone()),
            SqlxSessionRepository::boxed(pool.clone()),
            days,
        );
        (pool, service)
    }

    async fn setup_test_service() -> AuthService {
        setup_with_expiration(DEFAULT_SESSION_EXPIRATION_DAYS).await.1
    }

    #[tokio::test]
    async fn test_login_success_sets_last_login() {
        let service = setup_test_service().await;
        service
            .create_admin("Editor@Laxmi.it", "Giulia", "password123", AdminRole::Editor)
            .await
            .unwrap();

        let (session, user) = service.login("editor@laxmi.it ", "password123").await.unwrap();
        assert_eq!(user.email, "editor@laxmi.it");
        assert_eq!(session.user_id, user.id);
        assert!(session.expires_at > Utc::now() + Duration::days(6));

        let reloaded = service.get_by_id(user.id).await.unwrap().unwrap();
        assert!(reloaded.last_login.is_some());
    }

    #[tokio::test]
    async fn test_login_wrong_password_fails() {
        let service = setup_test_service().await;
        service
            .create_admin("admin@laxmi.it", "", "password123", AdminRole::Admin)
            .await
            .unwrap();

        let result = service.login("admin@laxmi.it", "wrong-password").await;
        assert!(matches!(result, Err(AuthServiceError::AuthenticationError(_))));

        let result = service.login("nobody@laxmi.it", "password123").await;
        assert!(matches!(result, Err(AuthServiceError::AuthenticationError(_))));
    }

    #[tokio::test]
    async fn test_inactive_user_cannot_login_or_use_session() {
        let (pool, service) = setup_with_expiration(7).await;
        let user = service
            .create_admin("admin@laxmi.it", "Admin", "password123", AdminRole::Admin)
            .await
            .unwrap();
        let (session, _) = service.login("admin@laxmi.it", "password123").await.unwrap();

        let repo = SqlxUserRepository::new(pool);
        let mut disabled = user.clone();
        disabled.is_active = false;
        repo.update(&disabled).await.unwrap();

        assert!(service.validate_session(&session.id).await.unwrap().is_none());
        let result = service.login("admin@laxmi.it", "password123").await;
        assert!(matches!(result, Err(AuthServiceError::AuthenticationError(_))));
    }

    #[tokio::test]
    async fn test_validate_and_logout() {
        let service = setup_test_service().await;
        service
            .create_admin("admin@laxmi.it", "Admin", "password123", AdminRole::Admin)
            .await
            .unwrap();
        let (session, user) = service.login("admin@laxmi.it", "password123").await.unwrap();

        let validated = service.validate_session(&session.id).await.unwrap().unwrap();
        assert_eq!(validated.id, user.id);

        service.logout(&session.id).await.unwrap();
        assert!(service.validate_session(&session.id).await.unwrap().is_none());
        service.logout("no-such-token").await.unwrap();
    }

    #[tokio::test]
    async fn test_expired_session_is_rejected_and_removed() {
        let (_pool, service) = setup_with_expiration(-1).await;
        service
            .create_admin("admin@laxmi.it", "Admin", "password123", AdminRole::Admin)
            .await
            .unwrap();
        let (session, _) = service.login("admin@laxmi.it", "password123").await.unwrap();

        assert!(service.validate_session(&session.id).await.unwrap().is_none());
        assert_eq!(service.cleanup_expired_sessions().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_admin_validation() {
        let service = setup_test_service().await;

        let result = service
            .create_admin("not-an-email", "X", "password123", AdminRole::Editor)
            .await;
        assert!(matches!(result, Err(AuthServiceError::ValidationError(_))));

        let result = service
            .create_admin("a@laxmi.it", "X", "short", AdminRole::Editor)
            .await;
        assert!(matches!(result, Err(AuthServiceError::ValidationError(_))));

        service
            .create_admin("a@laxmi.it", "", "password123", AdminRole::Editor)
            .await
            .unwrap();
        let result = service
            .create_admin("A@laxmi.it", "X", "password123", AdminRole::Editor)
            .await;
        assert!(matches!(result, Err(AuthServiceError::UserExists(_))));
    }

    #[tokio::test]
    async fn test_ensure_super_admin_only_once() {
        let service = setup_test_service().await;

        let created = service
            .ensure_super_admin("owner@laxmi.it", "password123")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(created.role, AdminRole::SuperAdmin);
        assert!(created.is_super_admin());

        let again = service
            .ensure_super_admin("other@laxmi.it", "password123")
            .await
            .unwrap();
        assert!(again.is_none());
    }
}
