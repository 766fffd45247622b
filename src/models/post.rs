//! Blog post model
//!
//! This module provides:
//! - `BlogPost` entity with bilingual content and SEO fields
//! - `PostStatus` and `SchemaType` enums
//! - `PostInput` carrying the full editor form for create and update
//! - `BlogFaq` child rows and pagination types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Locale;

/// Image shown when a post has no featured image
pub const PLACEHOLDER_IMAGE: &str = "/images/placeholder.jpg";

/// Default estimated reading time in minutes
pub const DEFAULT_READING_TIME: i32 = 5;

/// Blog post entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlogPost {
    pub id: i64,
    /// Unique URL-friendly slug shared by both languages
    pub slug: String,

    pub title_en: String,
    pub title_it: String,
    pub excerpt_en: String,
    pub excerpt_it: String,
    /// Markdown body
    pub content_en: String,
    pub content_it: String,
    pub tags_en: Vec<String>,
    pub tags_it: Vec<String>,

    pub featured_image: Option<String>,
    pub featured_image_alt_en: Option<String>,
    pub featured_image_alt_it: Option<String>,

    pub author_id: Option<i64>,
    pub category_id: Option<i64>,

    pub reading_time: i32,
    pub schema_type: SchemaType,

    pub seo_title_en: Option<String>,
    pub seo_title_it: Option<String>,
    pub seo_description_en: Option<String>,
    pub seo_description_it: Option<String>,
    pub seo_keywords_en: Vec<String>,
    pub seo_keywords_it: Vec<String>,

    pub status: PostStatus,
    pub featured: bool,

    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: Option<i64>,
    pub updated_by: Option<i64>,
}

impl BlogPost {
    pub fn is_published(&self) -> bool {
        self.status == PostStatus::Published
    }

    pub fn title(&self, locale: Locale) -> &str {
        locale.pick(&self.title_it, &self.title_en)
    }

    pub fn excerpt(&self, locale: Locale) -> &str {
        locale.pick(&self.excerpt_it, &self.excerpt_en)
    }

    pub fn content(&self, locale: Locale) -> &str {
        locale.pick(&self.content_it, &self.content_en)
    }

    pub fn tags(&self, locale: Locale) -> &[String] {
        locale.pick(&self.tags_it, &self.tags_en)
    }

    pub fn seo_keywords(&self, locale: Locale) -> &[String] {
        locale.pick(&self.seo_keywords_it, &self.seo_keywords_en)
    }

    /// SEO title, falling back to the post title
    pub fn seo_title(&self, locale: Locale) -> &str {
        non_empty(locale.pick(&self.seo_title_it, &self.seo_title_en))
            .unwrap_or_else(|| self.title(locale))
    }

    /// SEO description, falling back to the excerpt
    pub fn seo_description(&self, locale: Locale) -> &str {
        non_empty(locale.pick(&self.seo_description_it, &self.seo_description_en))
            .unwrap_or_else(|| self.excerpt(locale))
    }

    /// Featured image URL, or the placeholder
    pub fn image(&self) -> &str {
        non_empty(&self.featured_image).unwrap_or(PLACEHOLDER_IMAGE)
    }

    /// Featured image alt text, falling back to the title
    pub fn image_alt(&self, locale: Locale) -> &str {
        non_empty(locale.pick(&self.featured_image_alt_it, &self.featured_image_alt_en))
            .unwrap_or_else(|| self.title(locale))
    }

    /// Date shown to readers: publish date, or creation date for posts
    /// that were never published
    pub fn display_date(&self) -> DateTime<Utc> {
        self.published_at.unwrap_or(self.created_at)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Post publication status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
            PostStatus::Archived => "archived",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(PostStatus::Draft),
            "published" => Some(PostStatus::Published),
            "archived" => Some(PostStatus::Archived),
            _ => None,
        }
    }
}

impl std::fmt::Display for PostStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// schema.org type emitted in the article's JSON-LD
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SchemaType {
    Article,
    #[default]
    BlogPosting,
    HowTo,
    #[serde(rename = "FAQPage")]
    FaqPage,
}

impl SchemaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaType::Article => "Article",
            SchemaType::BlogPosting => "BlogPosting",
            SchemaType::HowTo => "HowTo",
            SchemaType::FaqPage => "FAQPage",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Article" => Some(SchemaType::Article),
            "BlogPosting" => Some(SchemaType::BlogPosting),
            "HowTo" => Some(SchemaType::HowTo),
            "FAQPage" => Some(SchemaType::FaqPage),
            _ => None,
        }
    }
}

impl std::fmt::Display for SchemaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full editor form for creating or updating a post
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PostInput {
    pub slug: String,
    pub title_en: String,
    pub title_it: String,
    pub excerpt_en: String,
    pub excerpt_it: String,
    pub content_en: String,
    pub content_it: String,
    pub tags_en: Vec<String>,
    pub tags_it: Vec<String>,
    pub featured_image: Option<String>,
    pub featured_image_alt_en: Option<String>,
    pub featured_image_alt_it: Option<String>,
    pub author_id: Option<i64>,
    pub category_id: Option<i64>,
    pub reading_time: Option<i32>,
    pub schema_type: SchemaType,
    pub status: PostStatus,
    pub featured: bool,
    pub seo_title_en: Option<String>,
    pub seo_title_it: Option<String>,
    pub seo_description_en: Option<String>,
    pub seo_description_it: Option<String>,
    pub seo_keywords_en: Vec<String>,
    pub seo_keywords_it: Vec<String>,
}

impl PostInput {
    /// Reading time, defaulting to five minutes when unset or non-positive
    pub fn reading_time_or_default(&self) -> i32 {
        self.reading_time
            .filter(|minutes| *minutes > 0)
            .unwrap_or(DEFAULT_READING_TIME)
    }
}

impl From<&BlogPost> for PostInput {
    fn from(post: &BlogPost) -> Self {
        Self {
            slug: post.slug.clone(),
            title_en: post.title_en.clone(),
            title_it: post.title_it.clone(),
            excerpt_en: post.excerpt_en.clone(),
            excerpt_it: post.excerpt_it.clone(),
            content_en: post.content_en.clone(),
            content_it: post.content_it.clone(),
            tags_en: post.tags_en.clone(),
            tags_it: post.tags_it.clone(),
            featured_image: post.featured_image.clone(),
            featured_image_alt_en: post.featured_image_alt_en.clone(),
            featured_image_alt_it: post.featured_image_alt_it.clone(),
            author_id: post.author_id,
            category_id: post.category_id,
            reading_time: Some(post.reading_time),
            schema_type: post.schema_type,
            status: post.status,
            featured: post.featured,
            seo_title_en: post.seo_title_en.clone(),
            seo_title_it: post.seo_title_it.clone(),
            seo_description_en: post.seo_description_en.clone(),
            seo_description_it: post.seo_description_it.clone(),
            seo_keywords_en: post.seo_keywords_en.clone(),
            seo_keywords_it: post.seo_keywords_it.clone(),
        }
    }
}

/// Question/answer pair attached to a post
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlogFaq {
    pub id: i64,
    pub post_id: i64,
    pub question_en: String,
    pub question_it: String,
    pub answer_en: String,
    pub answer_it: String,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

impl BlogFaq {
    pub fn question(&self, locale: Locale) -> &str {
        locale.pick(&self.question_it, &self.question_en)
    }

    pub fn answer(&self, locale: Locale) -> &str {
        locale.pick(&self.answer_it, &self.answer_en)
    }
}

/// FAQ as edited in the post form
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FaqInput {
    pub question_en: String,
    pub question_it: String,
    pub answer_en: String,
    pub answer_it: String,
}

impl From<&BlogFaq> for FaqInput {
    fn from(faq: &BlogFaq) -> Self {
        Self {
            question_en: faq.question_en.clone(),
            question_it: faq.question_it.clone(),
            answer_en: faq.answer_en.clone(),
            answer_it: faq.answer_it.clone(),
        }
    }
}

/// Pagination parameters for list queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListParams {
    /// Page number (1-indexed)
    pub page: u32,
    pub per_page: u32,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 12,
        }
    }
}

impl ListParams {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, 100),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page.saturating_sub(1) * self.per_page) as i64
    }

    pub fn limit(&self) -> i64 {
        self.per_page as i64
    }
}

/// Paginated result container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
}

impl<T> PagedResult<T> {
    pub fn new(items: Vec<T>, total: i64, params: &ListParams) -> Self {
        Self {
            items,
            total,
            page: params.page,
            per_page: params.per_page,
        }
    }

    pub fn total_pages(&self) -> u32 {
        if self.per_page == 0 {
            return 0;
        }
        ((self.total.max(0) as u32) + self.per_page - 1) / self.per_page
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_post() -> BlogPost {
        let now = Utc::now();
        BlogPost {
            id: 1,
            slug: "art-of-color".to_string(),
            title_en: "The Art of Color".to_string(),
            title_it: "L'Arte del Colore".to_string(),
            excerpt_en: "Palettes for refined interiors".to_string(),
            excerpt_it: "Palette per interni raffinati".to_string(),
            content_en: "## Color".to_string(),
            content_it: "## Colore".to_string(),
            tags_en: vec!["color".to_string()],
            tags_it: vec!["colore".to_string()],
            featured_image: None,
            featured_image_alt_en: None,
            featured_image_alt_it: Some("Salotto".to_string()),
            author_id: None,
            category_id: None,
            reading_time: 8,
            schema_type: SchemaType::default(),
            seo_title_en: Some("  ".to_string()),
            seo_title_it: Some("Armonia cromatica".to_string()),
            seo_description_en: None,
            seo_description_it: None,
            seo_keywords_en: vec![],
            seo_keywords_it: vec![],
            status: PostStatus::Draft,
            featured: false,
            published_at: None,
            created_at: now,
            updated_at: now,
            created_by: None,
            updated_by: None,
        }
    }

    #[test]
    fn test_localized_fallbacks() {
        let post = sample_post();

        assert_eq!(post.seo_title(Locale::It), "Armonia cromatica");
        // Blank SEO title falls back to the title
        assert_eq!(post.seo_title(Locale::En), "The Art of Color");
        assert_eq!(post.seo_description(Locale::En), "Palettes for refined interiors");
        assert_eq!(post.image(), PLACEHOLDER_IMAGE);
        assert_eq!(post.image_alt(Locale::It), "Salotto");
        assert_eq!(post.image_alt(Locale::En), "The Art of Color");
        assert_eq!(post.display_date(), post.created_at);
    }

    #[test]
    fn test_status_roundtrip() {
        for status in [PostStatus::Draft, PostStatus::Published, PostStatus::Archived] {
            assert_eq!(PostStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(PostStatus::from_str("deleted"), None);
        assert_eq!(PostStatus::default(), PostStatus::Draft);
    }

    #[test]
    fn test_schema_type_serialization() {
        assert_eq!(SchemaType::default(), SchemaType::BlogPosting);
        let json = serde_json::to_string(&SchemaType::FaqPage).unwrap();
        assert_eq!(json, "\"FAQPage\"");
        assert_eq!(SchemaType::from_str("HowTo"), Some(SchemaType::HowTo));
    }

    #[test]
    fn test_post_input_defaults() {
        let input: PostInput = serde_json::from_str(r#"{"slug":"a"}"#).unwrap();
        assert_eq!(input.status, PostStatus::Draft);
        assert_eq!(input.schema_type, SchemaType::BlogPosting);
        assert_eq!(input.reading_time_or_default(), DEFAULT_READING_TIME);

        let input = PostInput {
            reading_time: Some(12),
            ..PostInput::default()
        };
        assert_eq!(input.reading_time_or_default(), 12);
    }

    #[test]
    fn test_list_params() {
        let params = ListParams::new(0, 500);
        assert_eq!(params.page, 1);
        assert_eq!(params.per_page, 100);

        let params = ListParams::new(3, 10);
        assert_eq!(params.offset(), 20);

        let result: PagedResult<i32> = PagedResult::new(vec![], 25, &params);
        assert_eq!(result.total_pages(), 3);
        assert!(!result.has_next());
        assert!(result.has_prev());
    }
}
