//! schema.org JSON-LD for article pages

use crate::config::SiteConfig;
use crate::models::{BlogAuthor, BlogFaq, BlogPost, Locale};
use serde_json::{json, Value};

/// Credited when a post has no author
pub const EDITORIAL_AUTHOR: &str = "LAXMI Editorial";

/// Article document typed by the post's schema type
pub fn article(site: &SiteConfig, post: &BlogPost, author: Option<&BlogAuthor>, locale: Locale) -> Value {
    json!({
        "@context": "https://schema.org",
        "@type": post.schema_type.as_str(),
        "headline": post.title(locale),
        "description": post.excerpt(locale),
        "image": absolute(site, post.image()),
        "datePublished": post.display_date().to_rfc3339(),
        "dateModified": post.updated_at.to_rfc3339(),
        "author": {
            "@type": "Organization",
            "name": author.map(|a| a.name.as_str()).unwrap_or(EDITORIAL_AUTHOR),
        },
        "publisher": {
            "@type": "Organization",
            "name": site.name,
            "logo": {
                "@type": "ImageObject",
                "url": site.absolute_url("/static/images/logo.svg"),
            },
        },
        "mainEntityOfPage": {
            "@type": "WebPage",
            "@id": site.absolute_url(&format!("/{}/blog/{}", locale.code(), post.slug)),
        },
    })
}

/// FAQPage document, or None when the post has no FAQs
pub fn faq_page(faqs: &[BlogFaq], locale: Locale) -> Option<Value> {
    if faqs.is_empty() {
        return None;
    }
    let questions: Vec<Value> = faqs
        .iter()
        .map(|faq| {
            json!({
                "@type": "Question",
                "name": faq.question(locale),
                "acceptedAnswer": {
                    "@type": "Answer",
                    "text": faq.answer(locale),
                },
            })
        })
        .collect();

    Some(json!({
        "@context": "https://schema.org",
        "@type": "FAQPage",
        "mainEntity": questions,
    }))
}

/// Serialize for a `<script type="application/ld+json">` block.
///
/// `<` is escaped so the payload cannot close the script element.
pub fn to_script(value: &Value) -> String {
    value.to_string().replace('<', "\\u003c")
}

fn absolute(site: &SiteConfig, url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        site.absolute_url(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PostStatus, SchemaType};
    use chrono::{TimeZone, Utc};

    fn post() -> BlogPost {
        let created = Utc.with_ymd_and_hms(2025, 1, 10, 9, 0, 0).unwrap();
        BlogPost {
            id: 7,
            slug: "venetian-plaster".to_string(),
            title_en: "Venetian Plaster".to_string(),
            title_it: "Stucco veneziano".to_string(),
            excerpt_en: "Walls with depth".to_string(),
            excerpt_it: "Pareti con profondità".to_string(),
            content_en: String::new(),
            content_it: String::new(),
            tags_en: vec![],
            tags_it: vec![],
            featured_image: Some("/uploads/gallery/wall.jpg".to_string()),
            featured_image_alt_en: None,
            featured_image_alt_it: None,
            author_id: None,
            category_id: None,
            reading_time: 5,
            schema_type: SchemaType::HowTo,
            seo_title_en: None,
            seo_title_it: None,
            seo_description_en: None,
            seo_description_it: None,
            seo_keywords_en: vec![],
            seo_keywords_it: vec![],
            status: PostStatus::Published,
            featured: false,
            published_at: None,
            created_at: created,
            updated_at: created,
            created_by: None,
            updated_by: None,
        }
    }

    fn faq(q: &str) -> BlogFaq {
        BlogFaq {
            id: 1,
            post_id: 7,
            question_en: q.to_string(),
            question_it: format!("{} (it)", q),
            answer_en: "Yes".to_string(),
            answer_it: "Sì".to_string(),
            sort_order: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_article_schema() {
        let doc = article(&SiteConfig::default(), &post(), None, Locale::It);
        assert_eq!(doc["@type"], "HowTo");
        assert_eq!(doc["headline"], "Stucco veneziano");
        assert_eq!(doc["image"], "https://laxmi.it/uploads/gallery/wall.jpg");
        assert_eq!(doc["author"]["name"], EDITORIAL_AUTHOR);
        assert_eq!(doc["mainEntityOfPage"]["@id"], "https://laxmi.it/it/blog/venetian-plaster");
        assert!(doc["datePublished"].as_str().unwrap().starts_with("2025-01-10"));
    }

    #[test]
    fn test_faq_page() {
        assert!(faq_page(&[], Locale::En).is_none());
        let doc = faq_page(&[faq("Lead time?")], Locale::En).unwrap();
        assert_eq!(doc["mainEntity"][0]["name"], "Lead time?");
        assert_eq!(doc["mainEntity"][0]["acceptedAnswer"]["text"], "Yes");
    }

    #[test]
    fn test_script_escaping() {
        let value = json!({"headline": "</script><script>alert(1)</script>"});
        assert!(!to_script(&value).contains("</script>"));
    }
}
