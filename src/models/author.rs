//! Blog author model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Locale;

/// Author credited on blog posts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlogAuthor {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub role_en: String,
    pub role_it: String,
    pub bio_en: Option<String>,
    pub bio_it: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BlogAuthor {
    pub fn role(&self, locale: Locale) -> &str {
        locale.pick(&self.role_it, &self.role_en)
    }

    pub fn bio(&self, locale: Locale) -> Option<&str> {
        locale.pick(&self.bio_it, &self.bio_en).as_deref()
    }
}

/// Input for creating or replacing an author.
///
/// An empty slug is derived from the name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorInput {
    pub name: String,
    pub slug: String,
    pub role_en: String,
    pub role_it: String,
    pub bio_en: Option<String>,
    pub bio_it: Option<String>,
    pub avatar_url: Option<String>,
}
