//! Crawler endpoints
//!
//! - GET /sitemap.xml - static pages and published posts in both locales
//! - GET /robots.txt

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

use crate::api::middleware::{ApiError, AppState};
use crate::services::sitemap;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sitemap.xml", get(sitemap_xml))
        .route("/robots.txt", get(robots_txt))
}

async fn sitemap_xml(State(state): State<AppState>) -> Result<Response, ApiError> {
    let posts = state.blog_service.all_published().await?;
    let entries = sitemap::entries(&state.site, &posts, chrono::Utc::now());
    let xml = sitemap::render_sitemap(&entries);

    Ok((
        [
            (header::CONTENT_TYPE, "application/xml; charset=utf-8"),
            (header::CACHE_CONTROL, "public, max-age=3600"),
        ],
        xml,
    )
        .into_response())
}

async fn robots_txt(State(state): State<AppState>) -> Response {
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        sitemap::robots_txt(&state.site),
    )
        .into_response()
}
