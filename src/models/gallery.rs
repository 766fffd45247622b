//! Gallery image model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Locale;

/// Category value that selects every active image
pub const ALL_CATEGORIES: &str = "all";

/// Categories offered by the gallery manager, as (English, Italian) pairs
pub const DEFAULT_GALLERY_CATEGORIES: &[(&str, &str)] = &[
    ("Living Room", "Soggiorno"),
    ("Bedroom", "Camera da Letto"),
    ("Kitchen", "Cucina"),
    ("Dining", "Sala da Pranzo"),
    ("Foyer", "Ingresso"),
    ("Villa", "Villa"),
    ("Interior", "Interni"),
    ("Details", "Dettagli"),
];

/// A photograph in the collections gallery
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GalleryImage {
    pub id: i64,
    /// Public URL of the image
    pub image_url: String,
    /// Object store key, e.g. `gallery/1700000000000-ab12cd.jpg`.
    /// Empty for images referenced by URL only.
    pub image_path: String,
    pub title_en: String,
    pub title_it: String,
    pub category_en: String,
    pub category_it: String,
    pub alt_en: String,
    pub alt_it: String,
    pub sort_order: i32,
    pub is_featured: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GalleryImage {
    pub fn title(&self, locale: Locale) -> &str {
        locale.pick(&self.title_it, &self.title_en)
    }

    pub fn category(&self, locale: Locale) -> &str {
        locale.pick(&self.category_it, &self.category_en)
    }

    pub fn alt(&self, locale: Locale) -> &str {
        locale.pick(&self.alt_it, &self.alt_en)
    }

    /// Whether the image file lives in the managed object store
    pub fn is_stored(&self) -> bool {
        self.image_path.starts_with("gallery/")
    }
}

/// Input for adding an image to the gallery.
///
/// Empty alt texts default to the titles.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateGalleryImageInput {
    pub image_url: String,
    pub image_path: String,
    pub title_en: String,
    pub title_it: String,
    pub category_en: String,
    pub category_it: String,
    pub alt_en: String,
    pub alt_it: String,
    pub is_featured: bool,
}

impl CreateGalleryImageInput {
    pub fn alt_or_title(&self) -> (String, String) {
        let pick = |alt: &str, title: &str| {
            if alt.trim().is_empty() {
                title.to_string()
            } else {
                alt.to_string()
            }
        };
        (
            pick(&self.alt_en, &self.title_en),
            pick(&self.alt_it, &self.title_it),
        )
    }
}

/// Partial update of gallery metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateGalleryImageInput {
    pub title_en: Option<String>,
    pub title_it: Option<String>,
    pub category_en: Option<String>,
    pub category_it: Option<String>,
    pub alt_en: Option<String>,
    pub alt_it: Option<String>,
    pub is_featured: Option<bool>,
    pub is_active: Option<bool>,
}

/// Direction of a one-step reorder in the gallery manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    Up,
    Down,
}

/// A gallery category with its two display names
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct GalleryCategory {
    pub en: String,
    pub it: String,
}

impl GalleryCategory {
    pub fn label(&self, locale: Locale) -> &str {
        locale.pick(&self.it, &self.en)
    }
}
