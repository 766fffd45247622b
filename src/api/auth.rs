//! Admin authentication endpoints
//!
//! - POST /api/admin/auth/login - email/password login
//! - POST /api/admin/auth/logout - end the current session
//! - GET /api/admin/auth/me - current admin

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{extract_session_token, ApiError, AppState, AuthenticatedUser, ClientIp, SESSION_COOKIE};
use crate::models::AdminUser;
use crate::services::AuthServiceError;

/// Request body for admin login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response for successful authentication
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: AdminUser,
    pub token: String,
}

/// Build public auth routes (no auth required)
pub fn public_router() -> Router<AppState> {
    Router::new().route("/login", post(login))
}

/// Build protected auth routes (requires auth middleware)
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/logout", post(logout))
        .route("/me", get(get_current_user))
}

/// POST /api/admin/auth/login
///
/// Rate limited per IP (10 per minute) and per email (5 failures per
/// 15 minutes).
async fn login(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(ip) = ip {
        if state.rate_limiter.is_ip_limited(ip).await {
            tracing::warn!(ip = %ip, "Login blocked by IP rate limit");
            return Err(ApiError::rate_limited("Too many requests, please try again later", 60));
        }
        state.rate_limiter.record_ip_request(ip).await;
    }

    if state.rate_limiter.is_email_limited(&body.email).await {
        tracing::warn!(email = %body.email, "Login blocked by email rate limit");
        return Err(ApiError::rate_limited(
            "Too many failed login attempts, please try again in 15 minutes",
            900,
        ));
    }

    let (session, user) = match state.auth_service.login(&body.email, &body.password).await {
        Ok(result) => result,
        Err(AuthServiceError::AuthenticationError(msg)) => {
            state.rate_limiter.record_failed_attempt(&body.email).await;
            tracing::info!(email = %body.email, ip = ?ip, "Failed admin login");
            return Err(ApiError::unauthorized(msg));
        }
        Err(e) => return Err(e.into()),
    };

    state.rate_limiter.clear_email(&body.email).await;

    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}{}",
        SESSION_COOKIE,
        session.id,
        state.auth_service.session_lifetime().num_seconds(),
        if state.secure_cookies() { "; Secure" } else { "" }
    );
    let cookie = HeaderValue::from_str(&cookie)
        .map_err(|e| ApiError::internal_error(format!("Invalid session cookie: {}", e)))?;

    let mut response_headers = HeaderMap::new();
    response_headers.insert(header::SET_COOKIE, cookie);

    Ok((
        response_headers,
        Json(AuthResponse {
            user,
            token: session.id,
        }),
    ))
}

/// POST /api/admin/auth/logout
async fn logout(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let token = extract_session_token(&headers)
        .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;

    state.auth_service.logout(&token).await?;

    let clear_cookie = HeaderValue::from_static("session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    let mut response_headers = HeaderMap::new();
    response_headers.insert(header::SET_COOKIE, clear_cookie);

    Ok((StatusCode::NO_CONTENT, response_headers))
}

/// GET /api/admin/auth/me
async fn get_current_user(user: AuthenticatedUser) -> Json<AdminUser> {
    Json(user.0)
}
