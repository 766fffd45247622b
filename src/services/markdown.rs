//! Markdown rendering for blog content
//!
//! Posts are authored in Markdown and rendered with pulldown-cmark.
//! Headings receive anchor ids so the article page can build a table of
//! contents.
//!
//! # Example
//!
//! ```
//! use laxmi::services::markdown::MarkdownRenderer;
//!
//! let renderer = MarkdownRenderer::new();
//! let html = renderer.render("## Marble\n\nA **timeless** material.");
//! assert!(html.contains(r#"<h2 id="marble">"#));
//! assert!(html.contains("<strong>"));
//! ```

use pulldown_cmark::{html, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use serde::Serialize;
use std::collections::HashMap;

/// Words per minute used for the reading time estimate
pub const WORDS_PER_MINUTE: usize = 200;

/// Heading entry of an article's table of contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocEntry {
    pub level: u8,
    pub id: String,
    pub text: String,
}

#[derive(Debug, Clone, Copy)]
pub struct MarkdownRenderer {
    options: Options,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownRenderer {
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_SMART_PUNCTUATION);
        Self { options }
    }

    /// Render Markdown to HTML
    pub fn render(&self, markdown: &str) -> String {
        let (events, _) = self.parse(markdown);
        let mut output = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut output, events.into_iter());
        output
    }

    /// Render and collect the `h2`/`h3` headings
    pub fn render_with_toc(&self, markdown: &str) -> (String, Vec<TocEntry>) {
        let (events, headings) = self.parse(markdown);
        let mut output = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut output, events.into_iter());
        let toc = headings
            .into_iter()
            .filter(|h| (2..=3).contains(&h.level))
            .collect();
        (output, toc)
    }

    fn parse<'a>(&self, markdown: &'a str) -> (Vec<Event<'a>>, Vec<TocEntry>) {
        let mut events = Vec::new();
        let mut headings = Vec::new();
        let mut used_ids: HashMap<String, usize> = HashMap::new();

        // Heading events are held back until the heading text is known
        let mut pending: Option<(HeadingLevel, Vec<Event<'a>>, String)> = None;

        for event in Parser::new_ext(markdown, self.options) {
            match event {
                Event::Start(Tag::Heading { level, .. }) => {
                    pending = Some((level, Vec::new(), String::new()));
                }
                Event::End(TagEnd::Heading(level)) => {
                    let Some((_, inner, text)) = pending.take() else {
                        continue;
                    };
                    let id = unique_id(&mut used_ids, heading_id(&text));
                    headings.push(TocEntry {
                        level: level as u8,
                        id: id.clone(),
                        text: text.trim().to_string(),
                    });
                    events.push(Event::Start(Tag::Heading {
                        level,
                        id: Some(id.into()),
                        classes: Vec::new(),
                        attrs: Vec::new(),
                    }));
                    events.extend(inner);
                    events.push(Event::End(TagEnd::Heading(level)));
                }
                other => match pending.as_mut() {
                    Some((_, inner, text)) => {
                        if let Event::Text(t) | Event::Code(t) = &other {
                            text.push_str(t);
                        }
                        inner.push(other);
                    }
                    None => events.push(other),
                },
            }
        }

        (events, headings)
    }
}

/// Anchor id for a heading: lower-case ASCII letters and digits joined by `-`
fn heading_id(text: &str) -> String {
    let mut id = String::with_capacity(text.len());
    for c in text.to_lowercase().chars() {
        if c.is_alphanumeric() && c.is_ascii() {
            id.push(c);
        } else if !id.is_empty() && !id.ends_with('-') {
            id.push('-');
        }
    }
    let id = id.trim_end_matches('-').to_string();
    if id.is_empty() {
        "section".to_string()
    } else {
        id
    }
}

fn unique_id(used: &mut HashMap<String, usize>, id: String) -> String {
    let count = used.entry(id.clone()).or_insert(0);
    *count += 1;
    if *count == 1 {
        id
    } else {
        format!("{}-{}", id, *count - 1)
    }
}

/// Estimated minutes to read a Markdown text, at least one
pub fn reading_time(markdown: &str) -> i32 {
    let words = markdown.split_whitespace().count();
    words.div_ceil(WORDS_PER_MINUTE).max(1) as i32
}
