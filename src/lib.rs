//! LAXMI - bilingual website and admin API for a luxury Italian furniture
//! consultancy.
//!
//! Public pages are rendered server side in Italian and English; the admin
//! JSON API manages the blog, gallery and site copy stored in SQLite.

pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
pub mod theme;
