//! Public site pages
//!
//! Every page lives under `/{locale}`. Handlers collect the page data,
//! then render a theme template with the locale's dictionary. Unknown
//! locales and pages render `not_found.html` with status 404.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, Uri},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tera::Context as TeraContext;

use crate::api::middleware::{cookie_value, AppState};
use crate::models::{split_locale_prefix, BlogCategory, BlogPost, GalleryImage, Locale, ALL_CATEGORIES};
use crate::services::booking::format_date;
use crate::services::consent::CONSENT_COOKIE;
use crate::services::{structured_data, ConsentBanner, LightboxView, PostDetail};
use crate::theme::PageVars;

/// Images shown in the home page gallery preview
const HOME_GALLERY_SIZE: usize = 6;
/// Posts shown in the home page journal preview
const HOME_POSTS: i64 = 3;

/// Legal documents: URL segment and dictionary key under `legal`
const LEGAL_DOCUMENTS: [(&str, &str); 4] = [
    ("privacy-policy", "privacy"),
    ("cookie-policy", "cookiePolicy"),
    ("terms-of-service", "terms"),
    ("legal-notice", "notice"),
];

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{locale}", get(home))
        .route("/{locale}/about", get(about))
        .route("/{locale}/consulting", get(consulting))
        .route("/{locale}/collections", get(collections))
        .route("/{locale}/blog", get(blog_index))
        .route("/{locale}/blog/{slug}", get(blog_article))
        .route("/{locale}/contact", get(contact))
        .route("/{locale}/book", get(book))
        .route("/{locale}/{document}", get(legal))
}

// ============================================================================
// Rendering helpers
// ============================================================================

/// Locale, page variables and dictionary shared by every page
struct PageEnv {
    locale: Locale,
    vars: PageVars,
    dictionary: Value,
}

impl PageEnv {
    async fn load(state: &AppState, locale: Locale, path: &str, headers: &HeaderMap) -> Self {
        let banner = ConsentBanner::from_cookie(cookie_value(headers, CONSENT_COOKIE));
        Self {
            locale,
            vars: PageVars::new(&state.site, locale, path).with_consent(&banner),
            dictionary: state.dictionary.get(locale).await,
        }
    }

    /// Dictionary string at a slash-separated pointer such as `/nav/about`
    fn text(&self, pointer: &str) -> Option<String> {
        self.dictionary.pointer(pointer).and_then(Value::as_str).map(String::from)
    }

    fn render(self, state: &AppState, template: &str, context: TeraContext) -> Response {
        self.render_with_status(state, StatusCode::OK, template, context)
    }

    fn render_with_status(
        self,
        state: &AppState,
        status: StatusCode,
        template: &str,
        context: TeraContext,
    ) -> Response {
        let html = state
            .theme_engine
            .render_page(template, &self.vars, &self.dictionary, context);
        (status, Html(html)).into_response()
    }
}

/// Context with the page title taken from the dictionary
fn titled(env: &PageEnv, pointer: &str) -> TeraContext {
    let mut context = TeraContext::new();
    if let Some(title) = env.text(pointer) {
        context.insert("title", &title);
    }
    context
}

/// The themed 404 page
pub async fn not_found_page(state: &AppState, locale: Locale, path: &str, headers: &HeaderMap) -> Response {
    let env = PageEnv::load(state, locale, path, headers).await;
    let context = titled(&env, "/notFound/title");
    env.render_with_status(state, StatusCode::NOT_FOUND, "not_found.html", context)
}

/// Fallback for paths no route matched
pub async fn fallback(State(state): State<AppState>, uri: Uri, headers: HeaderMap) -> Response {
    let (locale, rest) = split_locale_prefix(uri.path());
    let locale = locale.unwrap_or(state.site.default_locale);
    not_found_page(&state, locale, rest, &headers).await
}

/// Parse the `{locale}` path segment, or render the 404 page
async fn resolve_locale(
    state: &AppState,
    raw: &str,
    path: &str,
    headers: &HeaderMap,
) -> Result<Locale, Response> {
    match Locale::parse(raw).filter(|l| l.code() == raw) {
        Some(locale) => Ok(locale),
        None => Err(not_found_page(state, state.site.default_locale, path, headers).await),
    }
}

// ============================================================================
// View models
// ============================================================================

#[derive(Debug, Clone, Serialize)]
struct ImageCard {
    url: String,
    title: String,
    alt: String,
    category: String,
    /// Link that opens this image in the lightbox
    #[serde(skip_serializing_if = "Option::is_none")]
    href: Option<String>,
}

impl ImageCard {
    fn new(image: &GalleryImage, locale: Locale) -> Self {
        Self {
            url: image.image_url.clone(),
            title: image.title(locale).to_string(),
            alt: image.alt(locale).to_string(),
            category: image.category(locale).to_string(),
            href: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct FilterLink {
    label: String,
    url: String,
    active: bool,
}

#[derive(Debug, Clone, Serialize)]
struct PostCard {
    url: String,
    title: String,
    excerpt: String,
    image: String,
    image_alt: String,
    category: Option<String>,
    date: String,
    date_iso: String,
    reading_time: i32,
    featured: bool,
}

impl PostCard {
    fn new(post: &BlogPost, locale: Locale, categories: &HashMap<i64, BlogCategory>) -> Self {
        let date = post.display_date();
        Self {
            url: format!("/{}/blog/{}", locale.code(), post.slug),
            title: post.title(locale).to_string(),
            excerpt: post.excerpt(locale).to_string(),
            image: post.image().to_string(),
            image_alt: post.image_alt(locale).to_string(),
            category: post
                .category_id
                .and_then(|id| categories.get(&id))
                .map(|c| c.name(locale).to_string()),
            date: format_date(&date.format("%Y-%m-%d").to_string(), locale),
            date_iso: date.to_rfc3339(),
            reading_time: post.reading_time,
            featured: post.featured,
        }
    }
}

async fn category_map(state: &AppState) -> HashMap<i64, BlogCategory> {
    match state.category_service.list().await {
        Ok(categories) => categories.into_iter().map(|c| (c.id, c)).collect(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load blog categories");
            HashMap::new()
        }
    }
}

fn post_cards(posts: &[BlogPost], locale: Locale, categories: &HashMap<i64, BlogCategory>) -> Vec<PostCard> {
    posts.iter().map(|p| PostCard::new(p, locale, categories)).collect()
}

// ============================================================================
// Handlers
// ============================================================================

async fn home(State(state): State<AppState>, Path(locale): Path<String>, headers: HeaderMap) -> Response {
    let locale = match resolve_locale(&state, &locale, "", &headers).await {
        Ok(locale) => locale,
        Err(response) => return response,
    };
    let env = PageEnv::load(&state, locale, "", &headers).await;

    let mut images = state.gallery_service.featured_images().await;
    if images.is_empty() {
        images = state.gallery_service.active_images().await;
    }
    let featured_images: Vec<ImageCard> = images
        .iter()
        .take(HOME_GALLERY_SIZE)
        .map(|image| ImageCard::new(image, locale))
        .collect();

    let featured_posts = match state.blog_service.featured_posts(HOME_POSTS).await {
        Ok(posts) => post_cards(&posts, locale, &category_map(&state).await),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load featured posts");
            Vec::new()
        }
    };

    let mut context = TeraContext::new();
    context.insert("featured_images", &featured_images);
    context.insert("featured_posts", &featured_posts);
    env.render(&state, "home.html", context)
}

async fn about(State(state): State<AppState>, Path(locale): Path<String>, headers: HeaderMap) -> Response {
    simple_page(&state, &locale, "/about", &headers, "about.html", "/nav/about").await
}

async fn consulting(State(state): State<AppState>, Path(locale): Path<String>, headers: HeaderMap) -> Response {
    simple_page(&state, &locale, "/consulting", &headers, "consulting.html", "/nav/consulting").await
}

async fn contact(State(state): State<AppState>, Path(locale): Path<String>, headers: HeaderMap) -> Response {
    simple_page(&state, &locale, "/contact", &headers, "contact.html", "/nav/contact").await
}

/// Pages rendered from the dictionary alone
async fn simple_page(
    state: &AppState,
    raw_locale: &str,
    path: &str,
    headers: &HeaderMap,
    template: &str,
    title_pointer: &str,
) -> Response {
    let locale = match resolve_locale(state, raw_locale, path, headers).await {
        Ok(locale) => locale,
        Err(response) => return response,
    };
    let env = PageEnv::load(state, locale, path, headers).await;
    let context = titled(&env, title_pointer);
    env.render(state, template, context)
}

#[derive(Debug, Default, Deserialize)]
struct CollectionsQuery {
    category: Option<String>,
    image: Option<usize>,
}

async fn collections(
    State(state): State<AppState>,
    Path(locale): Path<String>,
    Query(query): Query<CollectionsQuery>,
    headers: HeaderMap,
) -> Response {
    let locale = match resolve_locale(&state, &locale, "/collections", &headers).await {
        Ok(locale) => locale,
        Err(response) => return response,
    };
    let env = PageEnv::load(&state, locale, "/collections", &headers).await;

    let selected = query
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(ALL_CATEGORIES)
        .to_string();
    let base = format!("/{}/collections", locale.code());
    let filter_url = |category: &str| {
        if category == ALL_CATEGORIES {
            base.clone()
        } else {
            format!("{}?category={}", base, urlencoding::encode(category))
        }
    };
    let image_url = |index: usize| {
        format!("{}?category={}&image={}", base, urlencoding::encode(&selected), index)
    };

    let mut categories = vec![FilterLink {
        label: env
            .text("/collections/categories/all")
            .unwrap_or_else(|| "All".to_string()),
        url: filter_url(ALL_CATEGORIES),
        active: selected.eq_ignore_ascii_case(ALL_CATEGORIES),
    }];
    for category in state.gallery_service.categories().await {
        let active = selected.eq_ignore_ascii_case(&category.en) || selected.eq_ignore_ascii_case(&category.it);
        categories.push(FilterLink {
            label: category.label(locale).to_string(),
            url: filter_url(&category.en),
            active,
        });
    }

    let images: Vec<ImageCard> = state
        .gallery_service
        .images_by_category(&selected)
        .await
        .iter()
        .enumerate()
        .map(|(index, image)| ImageCard {
            href: Some(image_url(index)),
            ..ImageCard::new(image, locale)
        })
        .collect();

    let lightbox = query
        .image
        .and_then(|requested| LightboxView::at(images.len(), requested))
        .map(|view| {
            serde_json::json!({
                "image": images[view.index],
                "position": view.position,
                "total": view.total,
                "prev_url": image_url(view.prev),
                "next_url": image_url(view.next),
                "close_url": filter_url(&selected),
            })
        });

    let mut context = titled(&env, "/nav/collections");
    context.insert("categories", &categories);
    context.insert("image_count", &images.len());
    context.insert("images", &images);
    context.insert("lightbox", &lightbox);
    env.render(&state, "collections.html", context)
}

#[derive(Debug, Default, Deserialize)]
struct BlogQuery {
    category: Option<String>,
}

async fn blog_index(
    State(state): State<AppState>,
    Path(locale): Path<String>,
    Query(query): Query<BlogQuery>,
    headers: HeaderMap,
) -> Response {
    let locale = match resolve_locale(&state, &locale, "/blog", &headers).await {
        Ok(locale) => locale,
        Err(response) => return response,
    };
    let env = PageEnv::load(&state, locale, "/blog", &headers).await;
    let category_map = category_map(&state).await;
    let selected = query.category.filter(|c| !c.trim().is_empty());

    let posts = match &selected {
        Some(slug) => state.blog_service.posts_by_category(slug).await,
        None => state.blog_service.all_published().await,
    };
    let posts = match posts {
        Ok(posts) => posts,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load blog posts");
            Vec::new()
        }
    };

    let base = format!("/{}/blog", locale.code());
    let mut ordered: Vec<&BlogCategory> = category_map.values().collect();
    ordered.sort_by_key(|c| (c.sort_order, c.id));
    let mut categories = Vec::with_capacity(ordered.len() + 1);
    if !ordered.is_empty() {
        categories.push(FilterLink {
            label: env.text("/blog/allCategories").unwrap_or_else(|| "All".to_string()),
            url: base.clone(),
            active: selected.is_none(),
        });
    }
    for category in ordered {
        categories.push(FilterLink {
            label: category.name(locale).to_string(),
            url: format!("{}?category={}", base, urlencoding::encode(&category.slug)),
            active: selected.as_deref() == Some(category.slug.as_str()),
        });
    }

    let mut context = titled(&env, "/blog/title");
    context.insert("categories", &categories);
    context.insert("posts", &post_cards(&posts, locale, &category_map));
    env.render(&state, "blog/index.html", context)
}

async fn blog_article(
    State(state): State<AppState>,
    Path((locale, slug)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    let path = format!("/blog/{}", slug);
    let locale = match resolve_locale(&state, &locale, &path, &headers).await {
        Ok(locale) => locale,
        Err(response) => return response,
    };

    let detail = match state.blog_service.post_by_slug(&slug).await {
        Ok(Some(detail)) => detail,
        Ok(None) => return not_found_page(&state, locale, &path, &headers).await,
        Err(e) => {
            tracing::error!(slug = %slug, error = %e, "Failed to load post");
            return not_found_page(&state, locale, &path, &headers).await;
        }
    };

    let env = PageEnv::load(&state, locale, &path, &headers).await;
    let context = article_context(&state, &detail, locale).await;
    env.render(&state, "blog/article.html", context)
}

async fn article_context(state: &AppState, detail: &PostDetail, locale: Locale) -> TeraContext {
    let post = &detail.post;
    let (content_html, toc) = state.markdown.render_with_toc(post.content(locale));
    let date = post.display_date();

    let author = detail.author.as_ref().map(|author| {
        serde_json::json!({
            "name": author.name,
            "role": author.role(locale),
            "bio": author.bio(locale),
            "avatar_url": author.avatar_url,
        })
    });
    let faqs: Vec<Value> = detail
        .faqs
        .iter()
        .map(|faq| serde_json::json!({ "question": faq.question(locale), "answer": faq.answer(locale) }))
        .collect();

    let mut json_ld = vec![structured_data::to_script(&structured_data::article(
        &state.site,
        post,
        detail.author.as_ref(),
        locale,
    ))];
    if let Some(faq_page) = structured_data::faq_page(&detail.faqs, locale) {
        json_ld.push(structured_data::to_script(&faq_page));
    }

    let image = post.image();
    let image_absolute = if image.starts_with("http://") || image.starts_with("https://") {
        image.to_string()
    } else {
        state.site.absolute_url(image)
    };

    let categories: HashMap<i64, BlogCategory> = detail
        .category
        .iter()
        .map(|c| (c.id, c.clone()))
        .collect();

    let mut context = TeraContext::new();
    context.insert("title", post.seo_title(locale));
    context.insert("description", post.seo_description(locale));
    context.insert(
        "post",
        &serde_json::json!({
            "title": post.title(locale),
            "excerpt": post.excerpt(locale),
            "category": detail.category.as_ref().map(|c| c.name(locale)),
            "author_name": detail
                .author
                .as_ref()
                .map(|a| a.name.as_str())
                .unwrap_or(structured_data::EDITORIAL_AUTHOR),
            "date": format_date(&date.format("%Y-%m-%d").to_string(), locale),
            "date_iso": date.to_rfc3339(),
            "reading_time": post.reading_time,
            "image": image,
            "image_alt": post.image_alt(locale),
            "image_absolute": image_absolute,
            "content_html": content_html,
            "tags": post.tags(locale),
            "keywords": post.seo_keywords(locale),
        }),
    );
    context.insert("toc", &toc);
    context.insert("author", &author);
    context.insert("faqs", &faqs);
    context.insert("related", &post_cards(&detail.related, locale, &categories));
    context.insert("json_ld", &json_ld);
    context
}

#[derive(Debug, Default, Deserialize)]
struct BookQuery {
    submitted: Option<String>,
}

async fn book(
    State(state): State<AppState>,
    Path(locale): Path<String>,
    Query(query): Query<BookQuery>,
    headers: HeaderMap,
) -> Response {
    let locale = match resolve_locale(&state, &locale, "/book", &headers).await {
        Ok(locale) => locale,
        Err(response) => return response,
    };
    let env = PageEnv::load(&state, locale, "/book", &headers).await;

    let submitted_email = query.submitted.map(|e| e.trim().to_string()).filter(|e| !e.is_empty());

    let mut context = titled(&env, "/nav/book");
    context.insert("submitted_email", &submitted_email);
    context.insert("min_date", &chrono::Utc::now().date_naive().format("%Y-%m-%d").to_string());
    env.render(&state, "book.html", context)
}

async fn legal(
    State(state): State<AppState>,
    Path((locale, document)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    let path = format!("/{}", document);
    let locale = match resolve_locale(&state, &locale, &path, &headers).await {
        Ok(locale) => locale,
        Err(response) => return response,
    };

    let Some((_, key)) = LEGAL_DOCUMENTS.iter().find(|(segment, _)| *segment == document) else {
        return not_found_page(&state, locale, &path, &headers).await;
    };

    let env = PageEnv::load(&state, locale, &path, &headers).await;
    let pointer = format!("/legal/{}", key);
    let document = env.dictionary.pointer(&pointer).cloned().unwrap_or(Value::Null);
    if !document.is_object() {
        tracing::warn!(document = %key, "Legal document missing from dictionary");
        return not_found_page(&state, locale, &path, &headers).await;
    }

    let mut context = titled(&env, &format!("{}/title", pointer));
    context.insert("document", &document);
    env.render(&state, "legal.html", context)
}
