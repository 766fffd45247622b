//! Static file serving
//!
//! - /static/* - stylesheet, site script and images embedded in the binary
//! - /uploads/* - gallery uploads read from the object store root
//! - /images/placeholder.jpg - stand-in for posts without a featured image

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use rust_embed::RustEmbed;
use tokio::fs;

use crate::api::middleware::AppState;
use crate::models::PLACEHOLDER_IMAGE;
use crate::services::storage::validate_key;

/// Embedded site assets
#[derive(RustEmbed)]
#[folder = "static/"]
#[include = "*"]
struct StaticAssets;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/static/{*path}", get(serve_static))
        .route("/uploads/{*path}", get(serve_upload))
        .route(PLACEHOLDER_IMAGE, get(serve_placeholder))
}

const PLACEHOLDER_ASSET: &str = "images/placeholder.svg";

/// GET /static/{*path}
async fn serve_static(Path(path): Path<String>) -> Response {
    match StaticAssets::get(&path) {
        Some(content) => build_response(&path, content.data.to_vec(), "public, max-age=3600"),
        None => not_found(),
    }
}

/// GET /images/placeholder.jpg
async fn serve_placeholder() -> Response {
    match StaticAssets::get(PLACEHOLDER_ASSET) {
        Some(content) => build_response(PLACEHOLDER_ASSET, content.data.to_vec(), "public, max-age=86400"),
        None => not_found(),
    }
}

/// GET /uploads/{*path}
///
/// Uploaded names are random, so the files are cached as immutable.
async fn serve_upload(State(state): State<AppState>, Path(path): Path<String>) -> Response {
    if validate_key(&path).is_err() {
        return not_found();
    }

    let file_path = state.upload_config.path.join(&path);
    match fs::read(&file_path).await {
        Ok(contents) => build_response(&path, contents, "public, max-age=31536000, immutable"),
        Err(_) => not_found(),
    }
}

fn build_response(path: &str, data: Vec<u8>, cache_control: &'static str) -> Response {
    (
        [
            (header::CONTENT_TYPE, get_content_type(path)),
            (header::CACHE_CONTROL, cache_control),
        ],
        data,
    )
        .into_response()
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        "Not Found",
    )
        .into_response()
}

/// Get content type from file extension
fn get_content_type(path: &str) -> &'static str {
    match path.rsplit('.').next().unwrap_or("").to_ascii_lowercase().as_str() {
        "css" => "text/css; charset=utf-8",
        "js" => "application/javascript; charset=utf-8",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "txt" => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::seed::Fixtures;

    #[test]
    fn test_content_types() {
        assert_eq!(get_content_type("css/site.css"), "text/css; charset=utf-8");
        assert_eq!(get_content_type("gallery/abc.JPG"), "image/jpeg");
        assert_eq!(get_content_type("images/favicon.svg"), "image/svg+xml");
        assert_eq!(get_content_type("noext"), "application/octet-stream");
    }

    #[test]
    fn test_assets_embedded() {
        assert!(StaticAssets::get("css/site.css").is_some());
        assert!(StaticAssets::get("js/site.js").is_some());
        assert!(StaticAssets::get("missing.css").is_none());
        assert!(StaticAssets::get(PLACEHOLDER_ASSET).is_some());
    }

    #[test]
    fn test_seed_images_are_bundled() {
        let fixtures = Fixtures::bundled().unwrap();
        let urls = fixtures
            .gallery
            .images
            .iter()
            .map(|image| image.image_url.as_str())
            .chain(fixtures.blog.posts.iter().filter_map(|p| p.post.featured_image.as_deref()));

        for url in urls {
            let asset = url.strip_prefix("/static/").unwrap_or(url);
            assert!(StaticAssets::get(asset).is_some(), "{} is not bundled", url);
        }
    }
}
