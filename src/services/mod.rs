//! Services layer - Business logic
//!
//! Services sit between the HTTP handlers and the repositories. They:
//! - Implement business rules and validation
//! - Coordinate repositories, the cache and the object store
//! - Record admin activity

pub mod activity;
pub mod auth;
pub mod author;
pub mod blog;
pub mod booking;
pub mod category;
pub mod consent;
pub mod content;
pub mod editor;
pub mod email;
pub mod gallery;
pub mod markdown;
pub mod newsletter;
pub mod password;
pub mod rate_limiter;
pub mod seed;
pub mod sitemap;
pub mod slideshow;
pub mod storage;
pub mod structured_data;

pub use activity::ActivityService;
pub use auth::{AuthService, AuthServiceError};
pub use author::{AuthorService, AuthorServiceError};
pub use blog::{BlogService, BlogServiceError, PostDetail, SavedPost};
pub use booking::{BookingError, BookingRequest, BookingService};
pub use category::{CategoryService, CategoryServiceError};
pub use consent::{ConsentAction, ConsentBanner, ConsentRecord};
pub use content::{ContentService, ContentServiceError, DictionaryService};
pub use editor::{generate_slug, PostForm};
pub use email::{create_mailer, Mailer};
pub use gallery::{GalleryService, GalleryServiceError};
pub use markdown::{MarkdownRenderer, TocEntry};
pub use newsletter::{NewsletterError, NewsletterService};
pub use password::{hash_password, verify_password};
pub use rate_limiter::LoginRateLimiter;
pub use slideshow::{LightboxView, Slideshow};
pub use storage::{LocalObjectStore, ObjectStore};
