//! Data models
//!
//! Entities stored in the site database plus the input types used by the
//! admin API and the seeder.

mod activity;
mod author;
mod category;
mod gallery;
mod locale;
mod newsletter;
mod post;
mod session;
mod site_content;
mod user;

pub use activity::{ActivityLogEntry, Actor, DashboardStats, NewActivity};
pub use author::{AuthorInput, BlogAuthor};
pub use category::{BlogCategory, CategoryInput};
pub use gallery::{
    CreateGalleryImageInput, GalleryCategory, GalleryImage, MoveDirection,
    UpdateGalleryImageInput, ALL_CATEGORIES, DEFAULT_GALLERY_CATEGORIES,
};
pub use locale::{split_locale_prefix, Locale};
pub use newsletter::NewsletterSubscriber;
pub use post::{
    BlogFaq, BlogPost, FaqInput, ListParams, PagedResult, PostInput, PostStatus, SchemaType,
    DEFAULT_READING_TIME, PLACEHOLDER_IMAGE,
};
pub use session::Session;
pub use site_content::{section_of, ContentSection, ContentType, ContentUpdate, NewSiteContent, SiteContent};
pub use user::{AdminRole, AdminUser};
