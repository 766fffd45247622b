//! Blog category model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Locale;

/// Category grouping blog posts, shown in the blog filter
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlogCategory {
    pub id: i64,
    pub name_en: String,
    pub name_it: String,
    pub slug: String,
    pub description_en: Option<String>,
    pub description_it: Option<String>,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

impl BlogCategory {
    pub fn name(&self, locale: Locale) -> &str {
        locale.pick(&self.name_it, &self.name_en)
    }

    pub fn description(&self, locale: Locale) -> Option<&str> {
        locale.pick(&self.description_it, &self.description_en).as_deref()
    }
}

/// Input for creating or replacing a category
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryInput {
    pub name_en: String,
    pub name_it: String,
    /// Derived from `name_en` when empty
    pub slug: String,
    pub description_en: Option<String>,
    pub description_it: Option<String>,
    pub sort_order: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_localized_name() {
        let category = BlogCategory {
            id: 1,
            name_en: "Color & Light".to_string(),
            name_it: "Colore e Luce".to_string(),
            slug: "color-light".to_string(),
            description_en: None,
            description_it: Some("Palette e illuminazione".to_string()),
            sort_order: 2,
            created_at: Utc::now(),
        };

        assert_eq!(category.name(Locale::It), "Colore e Luce");
        assert_eq!(category.name(Locale::En), "Color & Light");
        assert_eq!(category.description(Locale::It), Some("Palette e illuminazione"));
        assert_eq!(category.description(Locale::En), None);
    }

    #[test]
    fn test_input_deserializes_with_defaults() {
        let input: CategoryInput = serde_json::from_str(r#"{"name_en":"Guides"}"#).unwrap();
        assert_eq!(input.name_en, "Guides");
        assert!(input.slug.is_empty());
        assert!(input.sort_order.is_none());
    }
}
