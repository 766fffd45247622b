//! Supported site locales and Accept-Language negotiation

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A language the site is published in. Italian is the default and the
/// `x-default` alternate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    It,
    En,
}

impl Locale {
    pub const ALL: [Locale; 2] = [Locale::It, Locale::En];

    /// Parse a locale code, case-insensitively
    pub fn parse(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "it" => Some(Locale::It),
            "en" => Some(Locale::En),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Locale::It => "it",
            Locale::En => "en",
        }
    }

    /// Language-region code used in hreflang alternates
    pub fn hreflang(&self) -> &'static str {
        match self {
            Locale::It => "it-IT",
            Locale::En => "en-GB",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Locale::It => "Italiano",
            Locale::En => "English",
        }
    }

    /// The other published language, used by the language switcher
    pub fn alternate(&self) -> Self {
        match self {
            Locale::It => Locale::En,
            Locale::En => Locale::It,
        }
    }

    /// Pick the Italian or English variant of a bilingual field
    pub fn pick<'a, T: ?Sized>(&self, it: &'a T, en: &'a T) -> &'a T {
        match self {
            Locale::It => it,
            Locale::En => en,
        }
    }

    /// Choose the preferred supported locale from an `Accept-Language` header.
    ///
    /// Entries are ordered by their `q` weight (1.0 when absent); only the
    /// primary language subtag is compared. Falls back to `default`.
    pub fn negotiate(accept_language: Option<&str>, default: Locale) -> Locale {
        let header = match accept_language {
            Some(h) if !h.trim().is_empty() => h,
            _ => return default,
        };

        let mut languages: Vec<(String, f32)> = header
            .split(',')
            .filter_map(|entry| {
                let mut parts = entry.trim().split(';');
                let tag = parts.next()?.trim();
                if tag.is_empty() {
                    return None;
                }
                let primary = tag.split('-').next().unwrap_or(tag).to_ascii_lowercase();
                let priority = parts
                    .find_map(|p| p.trim().strip_prefix("q="))
                    .and_then(|q| q.trim().parse::<f32>().ok())
                    .unwrap_or(1.0);
                Some((primary, priority))
            })
            .collect();

        // Stable sort keeps header order among equal weights.
        languages.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        languages
            .iter()
            .find_map(|(code, _)| Locale::parse(code))
            .unwrap_or(default)
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Locale::parse(s).ok_or_else(|| anyhow::anyhow!("Unsupported locale: {}", s))
    }
}

/// Split a request path into its locale prefix and the remainder.
///
/// `/en/blog` → `(Some(En), "/blog")`, `/it` → `(Some(It), "")`,
/// `/blog` → `(None, "/blog")`.
pub fn split_locale_prefix(path: &str) -> (Option<Locale>, &str) {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let (first, rest) = match trimmed.find('/') {
        Some(idx) => (&trimmed[..idx], &trimmed[idx..]),
        None => (trimmed, ""),
    };

    if first.len() != 2 {
        return (None, path);
    }

    match Locale::parse(first) {
        Some(locale) => (Some(locale), if rest == "/" { "" } else { rest }),
        None => (None, path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_and_codes() {
        assert_eq!(Locale::parse("IT"), Some(Locale::It));
        assert_eq!(Locale::parse("en"), Some(Locale::En));
        assert_eq!(Locale::parse("fr"), None);
        assert_eq!(Locale::It.hreflang(), "it-IT");
        assert_eq!(Locale::En.hreflang(), "en-GB");
        assert_eq!(Locale::default(), Locale::It);
        assert_eq!(Locale::En.alternate(), Locale::It);
    }

    #[test]
    fn test_pick() {
        assert_eq!(Locale::It.pick("Cucina", "Kitchen"), "Cucina");
        assert_eq!(Locale::En.pick("Cucina", "Kitchen"), "Kitchen");
    }

    #[test]
    fn test_negotiate_missing_header_uses_default() {
        assert_eq!(Locale::negotiate(None, Locale::It), Locale::It);
        assert_eq!(Locale::negotiate(Some(""), Locale::En), Locale::En);
    }

    #[test]
    fn test_negotiate_respects_quality() {
        let header = "it;q=0.4, en-GB;q=0.9, de";
        // `de` has q=1 but is unsupported; en-GB beats it;q=0.4
        assert_eq!(Locale::negotiate(Some(header), Locale::It), Locale::En);
    }

    #[test]
    fn test_negotiate_region_subtags() {
        assert_eq!(Locale::negotiate(Some("en-US,en;q=0.9"), Locale::It), Locale::En);
        assert_eq!(Locale::negotiate(Some("it-CH"), Locale::En), Locale::It);
        assert_eq!(Locale::negotiate(Some("fr-FR,de"), Locale::It), Locale::It);
    }

    #[test]
    fn test_split_locale_prefix() {
        assert_eq!(split_locale_prefix("/en/blog"), (Some(Locale::En), "/blog"));
        assert_eq!(split_locale_prefix("/it"), (Some(Locale::It), ""));
        assert_eq!(split_locale_prefix("/it/"), (Some(Locale::It), ""));
        assert_eq!(split_locale_prefix("/blog"), (None, "/blog"));
        assert_eq!(split_locale_prefix("/english"), (None, "/english"));
        assert_eq!(split_locale_prefix("/"), (None, "/"));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn negotiate_always_returns_supported_locale(header in "[a-zA-Z,;=.0-9 -]{0,40}") {
            let locale = Locale::negotiate(Some(&header), Locale::It);
            prop_assert!(Locale::ALL.contains(&locale));
        }
    }
}
