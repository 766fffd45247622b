//! Database seeding
//!
//! Copies the bundled blog fixtures, collection images and translation
//! dictionaries into the database. Running it again updates rows in place:
//! authors, categories and posts are matched by slug and content rows by
//! key. Gallery images are only inserted into an empty gallery.

use crate::config::AdminSeedConfig;
use crate::db::repositories::{
    AuthorRepository, CategoryRepository, GalleryRepository, PostRepository,
    SiteContentRepository, SqlxAuthorRepository, SqlxCategoryRepository, SqlxGalleryRepository,
    SqlxPostRepository, SqlxSessionRepository, SqlxSiteContentRepository, SqlxUserRepository,
};
use crate::db::DynDatabasePool;
use crate::models::{
    section_of, AuthorInput, CategoryInput, ContentType, CreateGalleryImageInput, FaqInput,
    Locale, NewSiteContent, PostInput, PostStatus,
};
use crate::services::auth::AuthService;
use crate::services::content::{bundled_dictionary, flatten};
use crate::services::editor::generate_slug;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rust_embed::RustEmbed;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

#[derive(RustEmbed)]
#[folder = "seed/"]
#[include = "*.toml"]
struct BundledFixtures;

const BLOG_FIXTURE: &str = "blog.toml";
const GALLERY_FIXTURE: &str = "gallery.toml";

/// A post as written in `blog.toml`
#[derive(Debug, Clone, Deserialize)]
pub struct PostFixture {
    #[serde(flatten)]
    pub post: PostInput,
    /// Author slug
    #[serde(default)]
    pub author: Option<String>,
    /// Category slug
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub faqs: Vec<FaqInput>,
    /// Slugs of related posts
    #[serde(default)]
    pub related: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BlogFixtures {
    pub authors: Vec<AuthorInput>,
    pub categories: Vec<CategoryInput>,
    pub posts: Vec<PostFixture>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GalleryFixtures {
    pub images: Vec<CreateGalleryImageInput>,
}

/// Everything the seeder writes
#[derive(Debug, Clone, Default)]
pub struct Fixtures {
    pub blog: BlogFixtures,
    pub gallery: GalleryFixtures,
}

impl Fixtures {
    /// Fixtures compiled into the binary
    pub fn bundled() -> Result<Self> {
        Ok(Self {
            blog: parse(BLOG_FIXTURE, &bundled_text(BLOG_FIXTURE)?)?,
            gallery: parse(GALLERY_FIXTURE, &bundled_text(GALLERY_FIXTURE)?)?,
        })
    }

    /// Fixtures read from a directory holding `blog.toml` and `gallery.toml`.
    /// A missing file yields an empty fixture.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let read = |name: &str| -> Result<String> {
            let path = dir.join(name);
            if !path.exists() {
                return Ok(String::new());
            }
            std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read fixture {}", path.display()))
        };
        Ok(Self {
            blog: parse(BLOG_FIXTURE, &read(BLOG_FIXTURE)?)?,
            gallery: parse(GALLERY_FIXTURE, &read(GALLERY_FIXTURE)?)?,
        })
    }
}

fn bundled_text(name: &str) -> Result<String> {
    let file = BundledFixtures::get(name).with_context(|| format!("Bundled fixture {} is missing", name))?;
    String::from_utf8(file.data.into_owned()).with_context(|| format!("Fixture {} is not UTF-8", name))
}

fn parse<T: serde::de::DeserializeOwned>(name: &str, text: &str) -> Result<T> {
    toml::from_str(text).with_context(|| format!("Failed to parse fixture {}", name))
}

/// Counts printed at the end of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub admin_created: bool,
    pub authors: usize,
    pub categories: usize,
    pub posts: usize,
    pub faqs: usize,
    pub gallery_images: usize,
    pub content_keys: usize,
}

impl fmt::Display for SeedReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Seed summary:")?;
        writeln!(f, "  admin user created: {}", if self.admin_created { "yes" } else { "no" })?;
        writeln!(f, "  authors:            {}", self.authors)?;
        writeln!(f, "  categories:         {}", self.categories)?;
        writeln!(f, "  posts:              {}", self.posts)?;
        writeln!(f, "  faqs:               {}", self.faqs)?;
        writeln!(f, "  gallery images:     {}", self.gallery_images)?;
        write!(f, "  content keys:       {}", self.content_keys)
    }
}

/// Merge both bundled dictionaries into content rows.
///
/// Keys are taken from both locales; a key missing in one locale reuses the
/// other locale's value.
pub fn content_rows(en: &serde_json::Value, it: &serde_json::Value) -> Vec<NewSiteContent> {
    let en_pairs = flatten(en);
    let it_pairs: HashMap<String, String> = flatten(it).into_iter().collect();
    let en_keys: HashMap<&str, &str> = en_pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();

    let mut keys: Vec<&str> = en_pairs.iter().map(|(k, _)| k.as_str()).collect();
    let mut italian_only: Vec<&str> = it_pairs
        .keys()
        .map(String::as_str)
        .filter(|k| !en_keys.contains_key(k))
        .collect();
    italian_only.sort_unstable();
    keys.extend(italian_only);

    keys.into_iter()
        .enumerate()
        .map(|(position, key)| {
            let content_it = it_pairs.get(key).cloned();
            let content_en = en_keys
                .get(key)
                .map(|v| v.to_string())
                .or_else(|| content_it.clone())
                .unwrap_or_default();
            let content_it = content_it.unwrap_or_else(|| content_en.clone());
            NewSiteContent {
                content_key: key.to_string(),
                section: section_of(key).to_string(),
                content_type: ContentType::infer(&content_en),
                is_array: content_en.trim_start().starts_with('['),
                content_en,
                content_it,
                sort_order: position as i32,
            }
        })
        .collect()
}

pub struct Seeder {
    pool: DynDatabasePool,
    authors: Arc<dyn AuthorRepository>,
    categories: Arc<dyn CategoryRepository>,
    posts: Arc<dyn PostRepository>,
    gallery: Arc<dyn GalleryRepository>,
    content: Arc<dyn SiteContentRepository>,
}

impl Seeder {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self {
            authors: SqlxAuthorRepository::boxed(pool.clone()),
            categories: SqlxCategoryRepository::boxed(pool.clone()),
            posts: SqlxPostRepository::boxed(pool.clone()),
            gallery: SqlxGalleryRepository::boxed(pool.clone()),
            content: SqlxSiteContentRepository::boxed(pool.clone()),
            pool,
        }
    }

    /// Seed everything in dependency order
    pub async fn run(&self, admin: &AdminSeedConfig, fixtures: &Fixtures) -> Result<SeedReport> {
        let mut report = SeedReport {
            admin_created: self.seed_admin(admin).await?,
            ..Default::default()
        };

        let author_ids = self.seed_authors(&fixtures.blog.authors).await?;
        report.authors = author_ids.len();

        let category_ids = self.seed_categories(&fixtures.blog.categories).await?;
        report.categories = category_ids.len();

        let (posts, faqs) = self
            .seed_posts(&fixtures.blog.posts, &author_ids, &category_ids)
            .await?;
        report.posts = posts;
        report.faqs = faqs;

        report.gallery_images = self.seed_gallery(&fixtures.gallery.images).await?;

        let rows = content_rows(&bundled_dictionary(Locale::En), &bundled_dictionary(Locale::It));
        report.content_keys = self.seed_content(&rows).await?;

        Ok(report)
    }

    async fn seed_admin(&self, admin: &AdminSeedConfig) -> Result<bool> {
        let (Some(email), Some(password)) = (admin.email.as_deref(), admin.password.as_deref()) else {
            tracing::warn!("LAXMI_ADMIN_EMAIL / LAXMI_ADMIN_PASSWORD not set; skipping admin user");
            return Ok(false);
        };

        let auth = AuthService::new(
            SqlxUserRepository::boxed(self.pool.clone()),
            SqlxSessionRepository::boxed(self.pool.clone()),
        );
        let created = auth
            .ensure_super_admin(email, password)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to create admin user: {}", e))?;

        match created {
            Some(user) => {
                tracing::info!(email = %user.email, "Created super admin");
                Ok(true)
            }
            None => {
                tracing::info!("An admin user already exists; skipping");
                Ok(false)
            }
        }
    }

    async fn seed_authors(&self, authors: &[AuthorInput]) -> Result<HashMap<String, i64>> {
        let mut ids = HashMap::new();
        for input in authors {
            let mut input = input.clone();
            if input.slug.trim().is_empty() {
                input.slug = generate_slug(&input.name);
            }
            let author = self
                .authors
                .upsert_by_slug(&input)
                .await
                .with_context(|| format!("Failed to seed author {}", input.name))?;
            tracing::debug!(slug = %author.slug, "Seeded author");
            ids.insert(author.slug, author.id);
        }
        Ok(ids)
    }

    async fn seed_categories(&self, categories: &[CategoryInput]) -> Result<HashMap<String, i64>> {
        let mut ids = HashMap::new();
        for (position, input) in categories.iter().enumerate() {
            let mut input = input.clone();
            if input.slug.trim().is_empty() {
                input.slug = generate_slug(&input.name_en);
            }
            if input.sort_order.is_none() {
                input.sort_order = Some(position as i32);
            }
            let category = self
                .categories
                .upsert_by_slug(&input)
                .await
                .with_context(|| format!("Failed to seed category {}", input.name_en))?;
            tracing::debug!(slug = %category.slug, "Seeded category");
            ids.insert(category.slug, category.id);
        }
        Ok(ids)
    }

    async fn seed_posts(
        &self,
        posts: &[PostFixture],
        author_ids: &HashMap<String, i64>,
        category_ids: &HashMap<String, i64>,
    ) -> Result<(usize, usize)> {
        let mut post_ids: HashMap<String, i64> = HashMap::new();
        let mut faq_count = 0;

        for fixture in posts {
            let mut input = fixture.post.clone();
            input.author_id = fixture.author.as_ref().and_then(|s| author_ids.get(s).copied());
            input.category_id = fixture.category.as_ref().and_then(|s| category_ids.get(s).copied());
            if input.reading_time.is_none() {
                input.reading_time = Some(crate::services::markdown::reading_time(&input.content_en));
            }

            let published_at = match input.status {
                PostStatus::Published => Some(fixture.published_at.unwrap_or_else(Utc::now)),
                _ => None,
            };

            let existing = self
                .posts
                .get_by_slug(&input.slug)
                .await
                .context("Failed to look up post")?;
            let post = match existing {
                Some(post) => self
                    .posts
                    .update(post.id, &input, published_at.or(post.published_at), None)
                    .await?
                    .with_context(|| format!("Post {} disappeared while seeding", input.slug))?,
                None => self
                    .posts
                    .create(&input, published_at, None)
                    .await
                    .with_context(|| format!("Failed to seed post {}", input.slug))?,
            };

            let faqs = self
                .posts
                .replace_faqs(post.id, &fixture.faqs)
                .await
                .with_context(|| format!("Failed to seed FAQs of {}", post.slug))?;
            faq_count += faqs.len();

            tracing::debug!(slug = %post.slug, faqs = faqs.len(), "Seeded post");
            post_ids.insert(post.slug, post.id);
        }

        for fixture in posts {
            let Some(&post_id) = post_ids.get(&fixture.post.slug) else {
                continue;
            };
            let related: Vec<i64> = fixture
                .related
                .iter()
                .filter_map(|slug| post_ids.get(slug).copied())
                .filter(|id| *id != post_id)
                .collect();
            self.posts
                .replace_related(post_id, &related)
                .await
                .with_context(|| format!("Failed to seed related posts of {}", fixture.post.slug))?;
        }

        Ok((post_ids.len(), faq_count))
    }

    async fn seed_gallery(&self, images: &[CreateGalleryImageInput]) -> Result<usize> {
        if self.gallery.count().await? > 0 {
            tracing::info!("Gallery already has images; skipping");
            return Ok(0);
        }
        for (position, image) in images.iter().enumerate() {
            let (alt_en, alt_it) = image.alt_or_title();
            let image = CreateGalleryImageInput {
                alt_en,
                alt_it,
                ..image.clone()
            };
            self.gallery
                .create(&image, position as i32)
                .await
                .with_context(|| format!("Failed to seed image {}", image.image_url))?;
        }
        Ok(images.len())
    }

    async fn seed_content(&self, rows: &[NewSiteContent]) -> Result<usize> {
        for row in rows {
            self.content
                .upsert(row)
                .await
                .with_context(|| format!("Failed to seed content key {}", row.content_key))?;
        }
        Ok(rows.len())
    }
}
