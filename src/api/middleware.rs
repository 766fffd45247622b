//! API middleware
//!
//! Contains:
//! - the shared application state
//! - the JSON error type returned by the admin API
//! - session authentication and role checks for `/api/admin`
//! - the locale redirect applied to un-prefixed page paths

use axum::{
    extract::{ConnectInfo, FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use crate::cache::create_cache;
use crate::config::{Config, SiteConfig, UploadConfig};
use crate::db::repositories::{
    SqlxAuthorRepository, SqlxCategoryRepository, SqlxGalleryRepository, SqlxNewsletterRepository,
    SqlxPostRepository, SqlxSessionRepository, SqlxSiteContentRepository, SqlxUserRepository,
};
use crate::db::DynDatabasePool;
use crate::models::{split_locale_prefix, Actor, AdminUser, Locale};
use crate::services::{
    ActivityService, AuthService, AuthServiceError, AuthorService, AuthorServiceError, BlogService,
    BlogServiceError, BookingService, CategoryService, CategoryServiceError, ContentService,
    ContentServiceError, DictionaryService, GalleryService, GalleryServiceError, LocalObjectStore,
    LoginRateLimiter, Mailer, MarkdownRenderer, NewsletterService,
};
use crate::theme::ThemeEngine;

/// Name of the admin session cookie
pub const SESSION_COOKIE: &str = "session";

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub site: Arc<SiteConfig>,
    pub upload_config: Arc<UploadConfig>,
    pub auth_service: Arc<AuthService>,
    pub blog_service: Arc<BlogService>,
    pub author_service: Arc<AuthorService>,
    pub category_service: Arc<CategoryService>,
    pub content_service: Arc<ContentService>,
    pub dictionary: Arc<DictionaryService>,
    pub gallery_service: Arc<GalleryService>,
    pub activity_service: Arc<ActivityService>,
    pub booking_service: Arc<BookingService>,
    pub newsletter_service: Arc<NewsletterService>,
    pub rate_limiter: Arc<LoginRateLimiter>,
    pub theme_engine: Arc<ThemeEngine>,
    pub markdown: MarkdownRenderer,
}

impl AppState {
    /// Wire repositories and services on top of a migrated pool
    pub fn new(pool: DynDatabasePool, config: &Config, mailer: Arc<dyn Mailer>, theme_engine: ThemeEngine) -> Self {
        let cache = create_cache(&config.cache);
        let activity_service = Arc::new(ActivityService::for_pool(pool.clone()));

        let post_repo = SqlxPostRepository::boxed(pool.clone());
        let author_repo = SqlxAuthorRepository::boxed(pool.clone());
        let category_repo = SqlxCategoryRepository::boxed(pool.clone());
        let content_repo = SqlxSiteContentRepository::boxed(pool.clone());

        let dictionary = Arc::new(DictionaryService::new(content_repo.clone(), cache.clone()));
        let store = LocalObjectStore::boxed(config.upload.path.clone());

        Self {
            site: Arc::new(config.site.clone()),
            upload_config: Arc::new(config.upload.clone()),
            auth_service: Arc::new(AuthService::new(
                SqlxUserRepository::boxed(pool.clone()),
                SqlxSessionRepository::boxed(pool.clone()),
            )),
            blog_service: Arc::new(BlogService::new(
                post_repo,
                author_repo.clone(),
                category_repo.clone(),
                cache.clone(),
                activity_service.clone(),
            )),
            author_service: Arc::new(AuthorService::new(author_repo, cache.clone(), activity_service.clone())),
            category_service: Arc::new(CategoryService::new(category_repo, cache.clone(), activity_service.clone())),
            content_service: Arc::new(ContentService::new(content_repo, dictionary.clone(), activity_service.clone())),
            dictionary,
            gallery_service: Arc::new(GalleryService::new(
                SqlxGalleryRepository::boxed(pool.clone()),
                store,
                cache,
                activity_service.clone(),
                config.upload.clone(),
            )),
            activity_service,
            booking_service: Arc::new(BookingService::new(mailer, config.smtp.clone())),
            newsletter_service: Arc::new(NewsletterService::new(SqlxNewsletterRepository::boxed(pool))),
            rate_limiter: Arc::new(LoginRateLimiter::new()),
            theme_engine: Arc::new(theme_engine),
            markdown: MarkdownRenderer::new(),
        }
    }

    /// Whether cookies should carry the `Secure` attribute
    pub fn secure_cookies(&self) -> bool {
        self.site.url.starts_with("https://")
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("CONFLICT", message)
    }

    pub fn rate_limited(message: impl Into<String>, retry_after_secs: u64) -> Self {
        Self::with_details(
            "RATE_LIMIT",
            message,
            serde_json::json!({ "retry_after": retry_after_secs }),
        )
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }

    /// Log the cause and hide it from the client
    fn internal(error: impl std::fmt::Display) -> Self {
        tracing::error!(error = %error, "Request failed");
        Self::internal_error("Internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.error.code.as_str() {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "CONFLICT" => StatusCode::CONFLICT,
            "PAYLOAD_TOO_LARGE" => StatusCode::PAYLOAD_TOO_LARGE,
            "RATE_LIMIT" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

impl From<BlogServiceError> for ApiError {
    fn from(e: BlogServiceError) -> Self {
        match e {
            BlogServiceError::DuplicateSlug(_) => ApiError::conflict(e.to_string()),
            BlogServiceError::NotFound(_) => ApiError::not_found(e.to_string()),
            BlogServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            BlogServiceError::InternalError(e) => ApiError::internal(e),
        }
    }
}

impl From<AuthorServiceError> for ApiError {
    fn from(e: AuthorServiceError) -> Self {
        match e {
            AuthorServiceError::DuplicateSlug(_) => ApiError::conflict(e.to_string()),
            AuthorServiceError::NotFound(_) => ApiError::not_found(e.to_string()),
            AuthorServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            AuthorServiceError::InternalError(e) => ApiError::internal(e),
        }
    }
}

impl From<CategoryServiceError> for ApiError {
    fn from(e: CategoryServiceError) -> Self {
        match e {
            CategoryServiceError::DuplicateSlug(_) => ApiError::conflict(e.to_string()),
            CategoryServiceError::NotFound(_) => ApiError::not_found(e.to_string()),
            CategoryServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            CategoryServiceError::InternalError(e) => ApiError::internal(e),
        }
    }
}

impl From<ContentServiceError> for ApiError {
    fn from(e: ContentServiceError) -> Self {
        match e {
            ContentServiceError::NotFound(_) => ApiError::not_found(e.to_string()),
            ContentServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            ContentServiceError::InternalError(e) => ApiError::internal(e),
        }
    }
}

impl From<GalleryServiceError> for ApiError {
    fn from(e: GalleryServiceError) -> Self {
        match e {
            GalleryServiceError::NotFound(_) => ApiError::not_found(e.to_string()),
            GalleryServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            GalleryServiceError::FileTooLarge { .. } => ApiError::new("PAYLOAD_TOO_LARGE", e.to_string()),
            GalleryServiceError::InvalidFileType(_) => ApiError::validation_error(e.to_string()),
            GalleryServiceError::InternalError(e) => ApiError::internal(e),
        }
    }
}

impl From<AuthServiceError> for ApiError {
    fn from(e: AuthServiceError) -> Self {
        match e {
            AuthServiceError::AuthenticationError(msg) => ApiError::unauthorized(msg),
            AuthServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            AuthServiceError::UserExists(msg) => ApiError::conflict(msg),
            AuthServiceError::InternalError(e) => ApiError::internal(e),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        ApiError::internal(e)
    }
}

// ============================================================================
// Request helpers
// ============================================================================

/// Value of a cookie from the `Cookie` header
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|cookie| {
            let (key, value) = cookie.trim().split_once('=')?;
            (key == name).then_some(value)
        })
}

/// Extract the session token: `Authorization: Bearer` first, then the cookie
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.trim().to_string());
            }
        }
    }

    cookie_value(headers, SESSION_COOKIE)
        .filter(|token| !token.is_empty())
        .map(String::from)
}

/// Client address from proxy headers, falling back to the socket peer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientIp(pub Option<IpAddr>);

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let from_headers = extract_ip_address(&parts.headers).and_then(|ip| ip.parse().ok());
        let from_socket = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());
        Ok(ClientIp(from_headers.or(from_socket)))
    }
}

/// Extract IP address from request headers.
/// Checks X-Forwarded-For, then X-Real-IP.
pub fn extract_ip_address(headers: &HeaderMap) -> Option<String> {
    if let Some(forwarded) = headers.get("x-forwarded-for") {
        if let Ok(forwarded_str) = forwarded.to_str() {
            if let Some(ip) = forwarded_str.split(',').next() {
                let ip = ip.trim();
                if !ip.is_empty() {
                    return Some(ip.to_string());
                }
            }
        }
    }

    headers
        .get("x-real-ip")
        .and_then(|h| h.to_str().ok())
        .map(|ip| ip.trim().to_string())
}

fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::USER_AGENT)
        .and_then(|h| h.to_str().ok())
        .map(String::from)
}

// ============================================================================
// Authentication
// ============================================================================

/// Authenticated admin extracted from request
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub AdminUser);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

/// The authenticated admin plus request details for the audit log
#[derive(Debug, Clone)]
pub struct AdminActor {
    pub user: AdminUser,
    pub actor: Actor,
}

impl<S> FromRequestParts<S> for AdminActor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthenticatedUser(user) = AuthenticatedUser::from_request_parts(parts, state).await?;
        let ClientIp(ip) = ClientIp::from_request_parts(parts, state).await.unwrap_or(ClientIp(None));

        let actor = Actor {
            admin_id: user.id,
            ip_address: ip.map(|ip| ip.to_string()),
            user_agent: user_agent(&parts.headers),
        };
        Ok(AdminActor { user, actor })
    }
}

impl AdminActor {
    /// Deleting content is reserved to admins and super admins
    pub fn require_delete(&self) -> Result<(), ApiError> {
        if self.user.can_delete() {
            Ok(())
        } else {
            Err(ApiError::forbidden("Admin privileges required to delete content"))
        }
    }
}

/// Authentication middleware
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_session_token(request.headers())
        .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;

    let user = state
        .auth_service
        .validate_session(&token)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid or expired session"))?;

    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}

// ============================================================================
// Locale redirect
// ============================================================================

const UNLOCALIZED_PREFIXES: [&str; 4] = ["/api", "/admin", "/uploads", "/static"];

/// Whether a request path is a page that lacks its locale prefix
pub fn needs_locale_prefix(path: &str) -> bool {
    if path.contains('.') {
        return false;
    }
    let excluded = UNLOCALIZED_PREFIXES
        .iter()
        .any(|prefix| path == *prefix || path.starts_with(&format!("{}/", prefix)));
    !excluded && split_locale_prefix(path).0.is_none()
}

/// Redirect un-prefixed page paths to the visitor's preferred locale
pub async fn locale_redirect(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let path = request.uri().path();
    if !needs_locale_prefix(path) {
        return next.run(request).await;
    }

    let accept_language = request
        .headers()
        .get(header::ACCEPT_LANGUAGE)
        .and_then(|h| h.to_str().ok());
    let locale = Locale::negotiate(accept_language, state.site.default_locale);

    let mut target = format!("/{}{}", locale.code(), if path == "/" { "" } else { path });
    if let Some(query) = request.uri().query() {
        target.push('?');
        target.push_str(query);
    }

    tracing::debug!(from = %path, to = %target, "Redirecting to localized path");
    Redirect::temporary(&target).into_response()
}

// ============================================================================
// Tests
// ============================================================================
