//! HTTP layer - handlers and routing
//!
//! - Localized public pages under `/{locale}/...`
//! - Public form endpoints under `/api`
//! - The admin JSON API under `/api/admin`
//! - Sitemap, robots and static files

pub mod admin;
pub mod auth;
pub mod authors;
pub mod booking;
pub mod categories;
pub mod content;
pub mod gallery;
pub mod middleware;
pub mod pages;
pub mod posts;
pub mod seo;
pub mod static_files;


use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub use middleware::{ApiError, AppState};

/// Build the `/api` router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    let admin_routes = admin::protected_router(state.upload_config.max_file_size).route_layer(
        axum_middleware::from_fn_with_state(state.clone(), middleware::require_auth),
    );

    Router::new()
        .merge(booking::router())
        .nest("/admin/auth", auth::public_router())
        .nest("/admin", admin_routes)
        .fallback(api_not_found)
}

async fn api_not_found() -> ApiError {
    ApiError::not_found("Endpoint not found")
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    let mut router = Router::new()
        .nest("/api", build_api_router(state.clone()))
        .merge(seo::router())
        .merge(static_files::router())
        .merge(pages::router())
        .fallback(pages::fallback)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::locale_redirect,
        ));

    if let Some(cors) = cors_layer(cors_origin) {
        router = router.layer(cors);
    }

    router
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS for the admin client. An empty origin disables it and `*` allows
/// any origin without credentials.
fn cors_layer(origin: &str) -> Option<CorsLayer> {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE]);

    match origin.trim() {
        "" => None,
        "*" => Some(cors.allow_origin(Any)),
        origin => match origin.parse::<HeaderValue>() {
            Ok(value) => Some(cors.allow_origin(value).allow_credentials(true)),
            Err(e) => {
                tracing::warn!(origin = %origin, error = %e, "Invalid CORS origin, CORS disabled");
                None
            }
        },
    }
}
