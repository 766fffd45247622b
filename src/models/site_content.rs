//! Site content (translation string) model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Locale;

/// One translation string stored under a dotted key such as `hero.tagline1`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SiteContent {
    pub id: i64,
    pub content_key: String,
    /// First segment of `content_key`
    pub section: String,
    pub content_en: String,
    pub content_it: String,
    pub content_type: ContentType,
    pub description: Option<String>,
    pub is_array: bool,
    pub sort_order: i32,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<i64>,
}

impl SiteContent {
    pub fn value(&self, locale: Locale) -> &str {
        locale.pick(&self.content_it, &self.content_en)
    }
}

/// Section of a dotted content key
pub fn section_of(content_key: &str) -> &str {
    content_key.split('.').next().unwrap_or(content_key)
}

/// How a content value is edited and interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    #[default]
    Text,
    Richtext,
    Html,
    Json,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Text => "text",
            ContentType::Richtext => "richtext",
            ContentType::Html => "html",
            ContentType::Json => "json",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(ContentType::Text),
            "richtext" => Some(ContentType::Richtext),
            "html" => Some(ContentType::Html),
            "json" => Some(ContentType::Json),
            _ => None,
        }
    }

    /// Infer the type of a seeded value.
    ///
    /// JSON when it starts with `[` or `{`, rich text when it spans lines or
    /// exceeds 200 characters, plain text otherwise.
    pub fn infer(value: &str) -> Self {
        let trimmed = value.trim_start();
        if trimmed.starts_with('[') || trimmed.starts_with('{') {
            ContentType::Json
        } else if value.contains('\n') || value.chars().count() > 200 {
            ContentType::Richtext
        } else {
            ContentType::Text
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Admin navigation entry grouping content keys
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContentSection {
    pub id: i64,
    pub section_key: String,
    pub display_name_en: String,
    pub display_name_it: String,
    pub description: Option<String>,
    pub sort_order: i32,
}

/// Edited values for one content row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContentUpdate {
    pub id: i64,
    pub content_en: String,
    pub content_it: String,
}

/// A content row produced by the seeder, keyed by `content_key`
#[derive(Debug, Clone, PartialEq)]
pub struct NewSiteContent {
    pub content_key: String,
    pub section: String,
    pub content_en: String,
    pub content_it: String,
    pub content_type: ContentType,
    pub is_array: bool,
    pub sort_order: i32,
}
