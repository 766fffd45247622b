//! `sitemap.xml` and `robots.txt`

use crate::config::SiteConfig;
use crate::models::{BlogPost, Locale};
use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt::Write;

/// Static pages listed for every locale, relative to `/{locale}`
pub const SITEMAP_PAGES: [&str; 6] = ["", "/book", "/consulting", "/collections", "/about", "/contact"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeFrequency {
    Weekly,
    Monthly,
}

impl ChangeFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeFrequency::Weekly => "weekly",
            ChangeFrequency::Monthly => "monthly",
        }
    }
}

/// One `<url>` element
#[derive(Debug, Clone, PartialEq)]
pub struct SitemapEntry {
    pub url: String,
    pub last_modified: DateTime<Utc>,
    pub change_frequency: ChangeFrequency,
    pub priority: f32,
    /// `(hreflang, url)` pairs, `x-default` last
    pub alternates: Vec<(String, String)>,
}

fn page_priority(page: &str) -> f32 {
    match page {
        "" => 1.0,
        "/book" => 0.9,
        _ => 0.8,
    }
}

fn alternates(site: &SiteConfig, path: &str) -> Vec<(String, String)> {
    let mut links: Vec<(String, String)> = Locale::ALL
        .iter()
        .map(|l| (l.hreflang().to_string(), site.absolute_url(&format!("/{}{}", l.code(), path))))
        .collect();
    links.push((
        "x-default".to_string(),
        site.absolute_url(&format!("/{}{}", Locale::It.code(), path)),
    ));
    links
}

/// Entries for the static pages and the published posts
pub fn entries(site: &SiteConfig, posts: &[BlogPost], now: DateTime<Utc>) -> Vec<SitemapEntry> {
    let mut entries = Vec::with_capacity(SITEMAP_PAGES.len() * 2 + posts.len() * 2);

    for locale in Locale::ALL {
        for page in SITEMAP_PAGES {
            entries.push(SitemapEntry {
                url: site.absolute_url(&format!("/{}{}", locale.code(), page)),
                last_modified: now,
                change_frequency: if page.is_empty() {
                    ChangeFrequency::Weekly
                } else {
                    ChangeFrequency::Monthly
                },
                priority: page_priority(page),
                alternates: alternates(site, page),
            });
        }
    }

    for locale in Locale::ALL {
        for post in posts.iter().filter(|p| p.is_published()) {
            let path = format!("/blog/{}", post.slug);
            entries.push(SitemapEntry {
                url: site.absolute_url(&format!("/{}{}", locale.code(), path)),
                last_modified: post.updated_at,
                change_frequency: ChangeFrequency::Monthly,
                priority: 0.7,
                alternates: alternates(site, &path),
            });
        }
    }

    entries
}

/// Render entries as a sitemap document with xhtml alternates
pub fn render_sitemap(entries: &[SitemapEntry]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\" \
         xmlns:xhtml=\"http://www.w3.org/1999/xhtml\">\n",
    );

    for entry in entries {
        let _ = writeln!(xml, "  <url>");
        let _ = writeln!(xml, "    <loc>{}</loc>", xml_escape(&entry.url));
        let _ = writeln!(
            xml,
            "    <lastmod>{}</lastmod>",
            entry.last_modified.to_rfc3339_opts(SecondsFormat::Secs, true)
        );
        let _ = writeln!(xml, "    <changefreq>{}</changefreq>", entry.change_frequency.as_str());
        let _ = writeln!(xml, "    <priority>{:.1}</priority>", entry.priority);
        for (lang, href) in &entry.alternates {
            let _ = writeln!(
                xml,
                "    <xhtml:link rel=\"alternate\" hreflang=\"{}\" href=\"{}\"/>",
                lang,
                xml_escape(href)
            );
        }
        let _ = writeln!(xml, "  </url>");
    }

    xml.push_str("</urlset>\n");
    xml
}

fn xml_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

pub fn robots_txt(site: &SiteConfig) -> String {
    format!(
        "User-agent: *\nAllow: /\nDisallow: /admin\nDisallow: /api\n\nSitemap: {}\n",
        site.absolute_url("/sitemap.xml")
    )
}
