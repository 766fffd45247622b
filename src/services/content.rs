//! Site content and translation dictionaries
//!
//! Translation strings live in `site_content` as one row per dotted key.
//! Templates consume them as a nested dictionary, so this module converts
//! between the two shapes:
//!
//! ```text
//! { "hero": { "tagline1": "A" } }  <->  { "hero.tagline1": "A" }
//! ```
//!
//! The dictionaries bundled in `locales/` are the base layer; database rows
//! override them key by key.

use crate::cache::{Cache, CacheLayer};
use crate::db::repositories::SiteContentRepository;
use crate::models::{Actor, ContentSection, ContentUpdate, Locale, SiteContent};
use crate::services::activity::ActivityService;
use anyhow::Context;
use rust_embed::RustEmbed;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;

/// Dictionary cache TTL (1 hour)
const DICTIONARY_CACHE_TTL_SECS: u64 = 3600;

const CACHE_KEY_DICTIONARY: &str = "dictionary:";
const CACHE_PATTERN_DICTIONARY: &str = "dictionary:*";

#[derive(RustEmbed)]
#[folder = "locales/"]
#[include = "*.json"]
struct BundledLocales;

/// Error types for site content operations
#[derive(Debug, thiserror::Error)]
pub enum ContentServiceError {
    #[error("Content not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Flatten a nested dictionary into `(dotted key, value)` pairs.
///
/// Strings are kept as they are. Arrays are stored as their JSON text and
/// numbers or booleans as their JSON literal. Nulls are dropped.
pub fn flatten(value: &Value) -> Vec<(String, String)> {
    let mut out = Vec::new();
    flatten_into(value, "", &mut out);
    out
}

fn flatten_into(value: &Value, prefix: &str, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten_into(child, &path, out);
            }
        }
        Value::Null => {}
        Value::String(s) => out.push((prefix.to_string(), s.clone())),
        other => out.push((prefix.to_string(), other.to_string())),
    }
}

/// Rebuild a nested dictionary from dotted keys.
///
/// Intermediate values that are not objects are replaced by objects.
/// Values that look like JSON arrays or objects are parsed; a value that
/// fails to parse stays a string.
pub fn unflatten<K, V, I>(pairs: I) -> Value
where
    K: AsRef<str>,
    V: AsRef<str>,
    I: IntoIterator<Item = (K, V)>,
{
    let mut root = Map::new();
    for (key, value) in pairs {
        set_path(&mut root, key.as_ref(), parse_content_value(value.as_ref()));
    }
    Value::Object(root)
}

/// Nested dictionary for `locale` from stored content rows
pub fn build_dictionary(rows: &[SiteContent], locale: Locale) -> Value {
    unflatten(rows.iter().map(|row| (row.content_key.as_str(), row.value(locale))))
}

fn set_path(root: &mut Map<String, Value>, path: &str, value: Value) {
    let mut segments = path.split('.').peekable();
    let mut current = root;

    while let Some(segment) = segments.next() {
        if segments.peek().is_none() {
            current.insert(segment.to_string(), value);
            return;
        }

        let slot = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        current = match slot {
            Value::Object(map) => map,
            _ => return,
        };
    }
}

fn parse_content_value(value: &str) -> Value {
    let trimmed = value.trim();
    let looks_like_json = (trimmed.starts_with('[') && trimmed.ends_with(']'))
        || (trimmed.starts_with('{') && trimmed.ends_with('}'));

    if looks_like_json {
        if let Ok(parsed) = serde_json::from_str(trimmed) {
            return parsed;
        }
    }
    Value::String(value.to_string())
}

/// Recursively overlay `overlay` onto `base`
fn merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

/// Dictionary shipped with the binary for `locale`
pub fn bundled_dictionary(locale: Locale) -> Value {
    let file = format!("{}.json", locale.code());
    let parsed = BundledLocales::get(&file)
        .map(|content| serde_json::from_slice::<Value>(&content.data));

    match parsed {
        Some(Ok(value)) => value,
        Some(Err(e)) => {
            tracing::error!(locale = %locale, error = %e, "Bundled dictionary is not valid JSON");
            Value::Object(Map::new())
        }
        None => {
            tracing::error!(locale = %locale, "Bundled dictionary is missing");
            Value::Object(Map::new())
        }
    }
}

/// Cached translation dictionaries for page rendering
pub struct DictionaryService {
    repo: Arc<dyn SiteContentRepository>,
    cache: Arc<Cache>,
    cache_ttl: Duration,
}

impl DictionaryService {
    pub fn new(repo: Arc<dyn SiteContentRepository>, cache: Arc<Cache>) -> Self {
        Self {
            repo,
            cache,
            cache_ttl: Duration::from_secs(DICTIONARY_CACHE_TTL_SECS),
        }
    }

    /// Dictionary for `locale`: the bundled strings overridden by the
    /// stored ones. A database failure serves the bundled dictionary
    /// without caching it.
    pub async fn get(&self, locale: Locale) -> Value {
        let cache_key = format!("{}{}", CACHE_KEY_DICTIONARY, locale.code());
        if let Some(cached) = self.cache.get::<Value>(&cache_key).await.ok().flatten() {
            return cached;
        }

        let rows = match self.repo.list_all().await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!(locale = %locale, error = %e, "Falling back to bundled dictionary");
                return bundled_dictionary(locale);
            }
        };

        let mut dictionary = bundled_dictionary(locale);
        if !rows.is_empty() {
            merge(&mut dictionary, build_dictionary(&rows, locale));
        }

        let _ = self.cache.set(&cache_key, &dictionary, self.cache_ttl).await;
        dictionary
    }

    /// Drop every cached dictionary
    pub async fn invalidate(&self) {
        let _ = self.cache.delete_pattern(CACHE_PATTERN_DICTIONARY).await;
    }
}

/// Admin editing of site content rows
pub struct ContentService {
    repo: Arc<dyn SiteContentRepository>,
    dictionary: Arc<DictionaryService>,
    activity: Arc<ActivityService>,
}

impl ContentService {
    pub fn new(
        repo: Arc<dyn SiteContentRepository>,
        dictionary: Arc<DictionaryService>,
        activity: Arc<ActivityService>,
    ) -> Self {
        Self {
            repo,
            dictionary,
            activity,
        }
    }

    /// All rows ordered by section, then sort_order
    pub async fn list_all(&self) -> Result<Vec<SiteContent>, ContentServiceError> {
        Ok(self.repo.list_all().await.context("Failed to list content")?)
    }

    pub async fn list_by_section(&self, section: &str) -> Result<Vec<SiteContent>, ContentServiceError> {
        Ok(self
            .repo
            .list_by_section(section)
            .await
            .context("Failed to list section content")?)
    }

    pub async fn list_sections(&self) -> Result<Vec<ContentSection>, ContentServiceError> {
        Ok(self.repo.list_sections().await.context("Failed to list sections")?)
    }

    pub async fn get_by_key(&self, content_key: &str) -> Result<SiteContent, ContentServiceError> {
        self.repo
            .get_by_key(content_key)
            .await
            .context("Failed to get content")?
            .ok_or_else(|| ContentServiceError::NotFound(content_key.to_string()))
    }

    /// Update both language values of one row
    pub async fn update(&self, update: &ContentUpdate, actor: &Actor) -> Result<SiteContent, ContentServiceError> {
        let updated = self.apply(update, actor).await?;
        self.dictionary.invalidate().await;
        Ok(updated)
    }

    /// Apply updates in order, stopping at the first failure. Rows updated
    /// before the failure keep their new values.
    pub async fn batch_update(
        &self,
        updates: &[ContentUpdate],
        actor: &Actor,
    ) -> Result<Vec<SiteContent>, ContentServiceError> {
        let mut saved = Vec::with_capacity(updates.len());
        let mut result = Ok(());

        for update in updates {
            match self.apply(update, actor).await {
                Ok(row) => saved.push(row),
                Err(e) => {
                    result = Err(e);
                    break;
                }
            }
        }

        if !saved.is_empty() {
            self.dictionary.invalidate().await;
        }
        result.map(|_| saved)
    }

    async fn apply(&self, update: &ContentUpdate, actor: &Actor) -> Result<SiteContent, ContentServiceError> {
        let existing = self
            .repo
            .get_by_id(update.id)
            .await
            .context("Failed to get content")?
            .ok_or_else(|| ContentServiceError::NotFound(update.id.to_string()))?;

        if existing.is_array {
            for value in [&update.content_en, &update.content_it] {
                if !matches!(serde_json::from_str::<Value>(value), Ok(Value::Array(_))) {
                    return Err(ContentServiceError::ValidationError(format!(
                        "'{}' must be a JSON array",
                        existing.content_key
                    )));
                }
            }
        }

        let updated = self
            .repo
            .update_values(update.id, &update.content_en, &update.content_it, Some(actor.admin_id))
            .await
            .context("Failed to update content")?
            .ok_or_else(|| ContentServiceError::NotFound(update.id.to_string()))?;

        self.activity
            .record(actor, "update", "site_content", updated.id, Some(&existing), Some(&updated))
            .await;

        Ok(updated)
    }
}
