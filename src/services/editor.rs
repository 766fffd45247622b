//! Blog post editor form
//!
//! `PostForm` holds the state of the admin post editor and applies the
//! edits the dashboard sends (tag chips, keyword chips, FAQ rows) before
//! the post is validated and saved.

use crate::models::{BlogFaq, BlogPost, FaqInput, Locale, PostInput};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Build a URL slug from a title.
///
/// Lower-cases, drops anything outside `a-z`, `0-9`, whitespace and `-`,
/// turns whitespace runs into `-`, collapses repeated `-` and trims `-`
/// from both ends.
pub fn generate_slug(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());

    for c in title.to_lowercase().chars() {
        let mapped = if c.is_ascii_lowercase() || c.is_ascii_digit() {
            c
        } else if c.is_whitespace() || c == '-' {
            '-'
        } else {
            continue;
        };

        if mapped == '-' && slug.ends_with('-') {
            continue;
        }
        slug.push(mapped);
    }

    slug.trim_matches('-').to_string()
}

/// Editable FAQ column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaqField {
    QuestionEn,
    QuestionIt,
    AnswerEn,
    AnswerIt,
}

/// Field-keyed validation messages
pub type FormErrors = BTreeMap<String, String>;

/// State of the post editor
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PostForm {
    pub post: PostInput,
    pub faqs: Vec<FaqInput>,
    pub related_post_ids: Vec<i64>,
}

impl PostForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Form pre-filled with a stored post
    pub fn from_post(post: &BlogPost, faqs: &[BlogFaq], related_post_ids: Vec<i64>) -> Self {
        Self {
            post: PostInput::from(post),
            faqs: faqs.iter().map(FaqInput::from).collect(),
            related_post_ids,
        }
    }

    /// Fill the slug from the English title
    pub fn generate_slug(&mut self) {
        self.post.slug = generate_slug(&self.post.title_en);
    }

    pub fn add_tag(&mut self, locale: Locale, value: &str) {
        let tags = match locale {
            Locale::En => &mut self.post.tags_en,
            Locale::It => &mut self.post.tags_it,
        };
        push_unique(tags, value);
    }

    pub fn remove_tag(&mut self, locale: Locale, value: &str) {
        match locale {
            Locale::En => self.post.tags_en.retain(|t| t != value),
            Locale::It => self.post.tags_it.retain(|t| t != value),
        }
    }

    pub fn add_keyword(&mut self, locale: Locale, value: &str) {
        let keywords = match locale {
            Locale::En => &mut self.post.seo_keywords_en,
            Locale::It => &mut self.post.seo_keywords_it,
        };
        push_unique(keywords, value);
    }

    pub fn remove_keyword(&mut self, locale: Locale, value: &str) {
        match locale {
            Locale::En => self.post.seo_keywords_en.retain(|k| k != value),
            Locale::It => self.post.seo_keywords_it.retain(|k| k != value),
        }
    }

    /// Append an empty FAQ row
    pub fn add_faq(&mut self) {
        self.faqs.push(FaqInput::default());
    }

    /// Set one column of a FAQ row. Out-of-range indexes are ignored.
    pub fn update_faq(&mut self, index: usize, field: FaqField, value: &str) {
        if let Some(faq) = self.faqs.get_mut(index) {
            let slot = match field {
                FaqField::QuestionEn => &mut faq.question_en,
                FaqField::QuestionIt => &mut faq.question_it,
                FaqField::AnswerEn => &mut faq.answer_en,
                FaqField::AnswerIt => &mut faq.answer_it,
            };
            *slot = value.to_string();
        }
    }

    pub fn remove_faq(&mut self, index: usize) {
        if index < self.faqs.len() {
            self.faqs.remove(index);
        }
    }

    /// Check the fields required before saving
    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::new();
        let post = &self.post;

        if post.slug.trim().is_empty() {
            errors.insert("slug".to_string(), "Slug is required".to_string());
        }

        let required = [
            ("title", &post.title_en, &post.title_it, "Title is required in both languages"),
            ("excerpt", &post.excerpt_en, &post.excerpt_it, "Excerpt is required in both languages"),
            ("content", &post.content_en, &post.content_it, "Content is required in both languages"),
        ];
        for (field, en, it, message) in required {
            if en.trim().is_empty() {
                errors.insert(format!("{}_en", field), message.to_string());
            }
            if it.trim().is_empty() {
                errors.insert(format!("{}_it", field), message.to_string());
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    let trimmed = value.trim();
    if trimmed.is_empty() || list.iter().any(|v| v == trimmed) {
        return;
    }
    list.push(trimmed.to_string());
}
