//! Theme engine
//!
//! This module renders the public site with Tera.
//! Features:
//! - Templates embedded from `templates/` at build time
//! - Optional on-disk override directory (same relative names)
//! - Standard page variables (locale, alternates, consent state)
//! - Fallback to the error template, then to a plain HTML page

use anyhow::{Context, Result};
use chrono::Datelike;
use rust_embed::RustEmbed;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::error::Error as StdError;
use std::fs;
use std::path::Path;
use tera::{Context as TeraContext, Tera};

use crate::config::SiteConfig;
use crate::models::Locale;
use crate::services::consent::{ConsentBanner, BANNER_DELAY_MS};

mod error;

pub use error::ThemeError;

#[derive(RustEmbed)]
#[folder = "templates/"]
#[include = "*.html"]
struct EmbeddedTemplates;

/// Template rendering for the public pages
pub struct ThemeEngine {
    tera: Tera,
}

impl ThemeEngine {
    /// Create an engine from the embedded templates
    pub fn new() -> Result<Self> {
        Self::from_templates(embedded_templates()?)
    }

    /// Create an engine whose embedded templates are replaced by any file
    /// with the same relative name under `dir`.
    pub fn with_override_dir(dir: &Path) -> Result<Self> {
        let mut templates: HashMap<String, String> = embedded_templates()?.into_iter().collect();

        let mut overrides = Vec::new();
        collect_templates_from_dir(dir, dir, &mut overrides)?;
        for (name, content) in overrides {
            tracing::info!("Template override: {}", name);
            templates.insert(name, content);
        }

        Self::from_templates(templates.into_iter().collect())
    }

    fn from_templates(mut templates: Vec<(String, String)>) -> Result<Self> {
        // Base templates first so children can resolve their parent
        templates.sort_by(|a, b| {
            let a_is_base = a.0 == "base.html" || a.0.ends_with("/base.html");
            let b_is_base = b.0 == "base.html" || b.0.ends_with("/base.html");
            b_is_base.cmp(&a_is_base).then_with(|| a.0.cmp(&b.0))
        });

        let mut tera = Tera::default();
        tera.add_raw_templates(templates)
            .map_err(|e| ThemeError::TemplateError(format!("Failed to add templates: {}", e)))?;
        tera.register_filter("fill", fill_filter);

        Ok(Self { tera })
    }

    /// Render a template with context
    pub fn render(&self, template: &str, context: &TeraContext) -> Result<String> {
        self.tera.render(template, context).map_err(|e| {
            let mut error_msg = format!("Failed to render '{}': {}", template, e);
            let mut source = e.source();
            while let Some(s) = source {
                error_msg.push_str(&format!("\n  Caused by: {}", s));
                source = s.source();
            }
            ThemeError::TemplateError(error_msg).into()
        })
    }

    /// Render a page with the standard variables and the locale dictionary
    /// added to `context` as `page` and `t`.
    pub fn render_page(&self, template: &str, page: &PageVars, dictionary: &Value, context: TeraContext) -> String {
        let mut full_context = context;
        full_context.insert("page", page);
        full_context.insert("t", dictionary);
        self.render_with_fallback(template, &full_context)
    }

    /// Render a template with fallback to error template or simple HTML
    ///
    /// Always produces a document: the requested template, then
    /// `error.html` with `error_message` set, then a built-in page.
    pub fn render_with_fallback(&self, template: &str, context: &TeraContext) -> String {
        match self.render(template, context) {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!("Failed to render template '{}': {}, trying error template", template, e);

                let mut error_context = context.clone();
                error_context.insert("error_message", &e.to_string());
                error_context.insert("requested_template", template);

                match self.render("error.html", &error_context) {
                    Ok(html) => html,
                    Err(error_template_err) => {
                        tracing::warn!(
                            "Failed to render error template: {}, returning simple HTML error page",
                            error_template_err
                        );
                        Self::simple_error_page(template, &e.to_string())
                    }
                }
            }
        }
    }

    /// Check whether a template is registered
    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|n| n == name)
    }

    /// Registered template names, sorted
    pub fn template_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tera.get_template_names().map(str::to_string).collect();
        names.sort();
        names
    }

    /// Last-resort page when both the requested template and the error
    /// template fail.
    fn simple_error_page(template: &str, error: &str) -> String {
        format!(
            r#"<!DOCTYPE html>
<html lang="it">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>LAXMI</title>
    <style>
        body {{ font-family: Georgia, serif; max-width: 600px; margin: 80px auto; padding: 20px; color: #2b2118; background: #faf7f2; }}
        h1 {{ font-weight: normal; letter-spacing: 0.1em; }}
        code {{ background: #f0ebe3; padding: 2px 6px; }}
    </style>
</head>
<body>
    <h1>LAXMI</h1>
    <p>Failed to render template: <code>{}</code></p>
    <p><small>{}</small></p>
</body>
</html>"#,
            tera::escape_html(template),
            tera::escape_html(error)
        )
    }
}

fn embedded_templates() -> Result<Vec<(String, String)>> {
    let mut templates = Vec::new();
    for name in EmbeddedTemplates::iter() {
        let file = EmbeddedTemplates::get(&name)
            .ok_or_else(|| ThemeError::NotFound(name.to_string()))?;
        let content = String::from_utf8(file.data.into_owned())
            .with_context(|| format!("Template is not UTF-8: {}", name))?;
        templates.push((name.to_string(), content));
    }
    Ok(templates)
}

/// Collect `.html` templates below `current_path`, named relative to `base_path`
fn collect_templates_from_dir(base_path: &Path, current_path: &Path, templates: &mut Vec<(String, String)>) -> Result<()> {
    if !current_path.exists() {
        return Ok(());
    }

    for entry in fs::read_dir(current_path)? {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            collect_templates_from_dir(base_path, &path, templates)?;
        } else if path.extension().map_or(false, |ext| ext == "html") {
            let relative_path = path
                .strip_prefix(base_path)
                .map_err(|_| ThemeError::TemplateError("Failed to get relative path".to_string()))?;

            let template_name = relative_path.to_string_lossy().replace('\\', "/");

            let content = fs::read_to_string(&path).with_context(|| format!("Failed to read template: {:?}", path))?;

            templates.push((template_name, content));
        }
    }

    Ok(())
}

/// `{{ "Showing {count} images" | fill(count=3) }}`
///
/// Replaces each `{name}` placeholder with the named argument.
fn fill_filter(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let mut text = tera::try_get_value!("fill", "value", String, value);
    for (name, arg) in args {
        let replacement = match arg {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        text = text.replace(&format!("{{{}}}", name), &replacement);
    }
    Ok(Value::String(text))
}

/// One `<link rel="alternate" hreflang>` target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alternate {
    pub hreflang: String,
    pub href: String,
}

/// Cookie banner state handed to the templates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsentVars {
    pub show_banner: bool,
    pub banner_delay_ms: u64,
    pub analytics: bool,
    pub marketing: bool,
    pub preferences: bool,
}

impl From<&ConsentBanner> for ConsentVars {
    fn from(banner: &ConsentBanner) -> Self {
        let prefs = &banner.preferences;
        Self {
            show_banner: banner.should_show(),
            banner_delay_ms: BANNER_DELAY_MS,
            analytics: prefs.analytics,
            marketing: prefs.marketing,
            preferences: prefs.preferences,
        }
    }
}

impl Default for ConsentVars {
    fn default() -> Self {
        Self::from(&ConsentBanner::from_cookie(None))
    }
}

/// Standard template variables available as `page` in every template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageVars {
    pub site_name: String,
    pub site_url: String,
    /// Current locale code (`it` / `en`)
    pub locale: String,
    pub hreflang: String,
    pub alternate_locale: String,
    pub alternate_locale_name: String,
    /// Path below the locale prefix, e.g. `/about` (empty for home)
    pub path: String,
    pub canonical_url: String,
    pub alternates: Vec<Alternate>,
    pub contact_email: String,
    pub contact_phone: String,
    pub year: i32,
    pub consent: ConsentVars,
}

impl PageVars {
    pub fn new(site: &SiteConfig, locale: Locale, path: &str) -> Self {
        let alternate = locale.alternate();
        let mut alternates: Vec<Alternate> = Locale::ALL
            .iter()
            .map(|l| Alternate {
                hreflang: l.hreflang().to_string(),
                href: site.absolute_url(&format!("/{}{}", l.code(), path)),
            })
            .collect();
        alternates.push(Alternate {
            hreflang: "x-default".to_string(),
            href: site.absolute_url(&format!("/{}{}", Locale::default().code(), path)),
        });

        Self {
            site_name: site.name.clone(),
            site_url: site.url.trim_end_matches('/').to_string(),
            locale: locale.code().to_string(),
            hreflang: locale.hreflang().to_string(),
            alternate_locale: alternate.code().to_string(),
            alternate_locale_name: alternate.display_name().to_string(),
            path: path.to_string(),
            canonical_url: site.absolute_url(&format!("/{}{}", locale.code(), path)),
            alternates,
            contact_email: site.contact_email.clone(),
            contact_phone: site.contact_phone.clone(),
            year: chrono::Utc::now().year(),
            consent: ConsentVars::default(),
        }
    }

    pub fn with_consent(mut self, banner: &ConsentBanner) -> Self {
        self.consent = ConsentVars::from(banner);
        self
    }
}
