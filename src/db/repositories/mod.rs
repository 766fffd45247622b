//! Database repositories
//!
//! One repository per stored entity. Each exposes an async trait and a
//! sqlx-backed implementation that services receive as `Arc<dyn ...>`.

pub mod activity;
pub mod author;
pub mod category;
pub mod gallery;
pub mod newsletter;
pub mod post;
pub mod session;
pub mod site_content;
pub mod user;

pub use activity::{ActivityRepository, SqlxActivityRepository};
pub use author::{AuthorRepository, SqlxAuthorRepository};
pub use category::{CategoryRepository, SqlxCategoryRepository};
pub use gallery::{GalleryRepository, SqlxGalleryRepository};
pub use newsletter::{NewsletterRepository, SqlxNewsletterRepository};
pub use post::{PostCounts, PostRepository, SqlxPostRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use site_content::{SiteContentRepository, SqlxSiteContentRepository};
pub use user::{SqlxUserRepository, UserRepository};
