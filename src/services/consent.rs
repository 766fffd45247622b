//! Cookie consent preferences
//!
//! The banner is a small state machine. Its outcome is a `ConsentRecord`
//! persisted as a URL-encoded JSON cookie, which page rendering reads back
//! to decide whether the banner must be shown again.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const CONSENT_COOKIE: &str = "laxmi_cookie_consent";
pub const CONSENT_VERSION: &str = "1.0";
/// Delay before the banner appears when no valid record exists
pub const BANNER_DELAY_MS: u64 = 500;
/// One year
pub const CONSENT_MAX_AGE_SECS: i64 = 365 * 24 * 60 * 60;

/// Optional cookie categories. Necessary cookies are always on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CookieCategory {
    Necessary,
    Analytics,
    Marketing,
    Preferences,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentPreferences {
    pub necessary: bool,
    pub analytics: bool,
    pub marketing: bool,
    pub preferences: bool,
}

impl Default for ConsentPreferences {
    fn default() -> Self {
        Self::rejected()
    }
}

impl ConsentPreferences {
    pub fn accepted() -> Self {
        Self {
            necessary: true,
            analytics: true,
            marketing: true,
            preferences: true,
        }
    }

    pub fn rejected() -> Self {
        Self {
            necessary: true,
            analytics: false,
            marketing: false,
            preferences: false,
        }
    }

    /// Flip an optional category; necessary is left untouched
    pub fn toggle(&mut self, category: CookieCategory) {
        match category {
            CookieCategory::Necessary => {}
            CookieCategory::Analytics => self.analytics = !self.analytics,
            CookieCategory::Marketing => self.marketing = !self.marketing,
            CookieCategory::Preferences => self.preferences = !self.preferences,
        }
    }

    pub fn allows(&self, category: CookieCategory) -> bool {
        match category {
            CookieCategory::Necessary => true,
            CookieCategory::Analytics => self.analytics,
            CookieCategory::Marketing => self.marketing,
            CookieCategory::Preferences => self.preferences,
        }
    }
}

/// Stored consent decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsentRecord {
    #[serde(flatten)]
    pub preferences: ConsentPreferences,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl ConsentRecord {
    pub fn new(preferences: ConsentPreferences, timestamp: DateTime<Utc>) -> Self {
        Self {
            preferences: ConsentPreferences {
                necessary: true,
                ..preferences
            },
            timestamp,
            version: CONSENT_VERSION.to_string(),
        }
    }

    /// Cookie value: URL-encoded JSON
    pub fn to_cookie_value(&self) -> anyhow::Result<String> {
        let json = serde_json::to_string(self)?;
        Ok(urlencoding::encode(&json).into_owned())
    }

    /// Parse a cookie value. Unreadable records and records of another
    /// version yield None.
    pub fn from_cookie_value(value: &str) -> Option<Self> {
        let decoded = urlencoding::decode(value).ok()?;
        let mut record: ConsentRecord = serde_json::from_str(&decoded).ok()?;
        if record.version != CONSENT_VERSION {
            return None;
        }
        record.preferences.necessary = true;
        Some(record)
    }

    /// Full `Set-Cookie` header value
    pub fn set_cookie_header(&self, secure: bool) -> anyhow::Result<String> {
        Ok(format!(
            "{}={}; Path=/; Max-Age={}; SameSite=Lax{}",
            CONSENT_COOKIE,
            self.to_cookie_value()?,
            CONSENT_MAX_AGE_SECS,
            if secure { "; Secure" } else { "" }
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BannerStage {
    Hidden,
    Visible,
    Customizing,
}

/// Banner state
#[derive(Debug, Clone, PartialEq)]
pub struct ConsentBanner {
    pub stage: BannerStage,
    pub preferences: ConsentPreferences,
    pub record: Option<ConsentRecord>,
}

impl ConsentBanner {
    /// Initial state from the stored cookie value, if any
    pub fn from_cookie(value: Option<&str>) -> Self {
        match value.and_then(ConsentRecord::from_cookie_value) {
            Some(record) => Self {
                stage: BannerStage::Hidden,
                preferences: record.preferences,
                record: Some(record),
            },
            None => Self {
                stage: BannerStage::Visible,
                preferences: ConsentPreferences::rejected(),
                record: None,
            },
        }
    }

    /// True when the page must show the banner after `BANNER_DELAY_MS`
    pub fn should_show(&self) -> bool {
        self.stage != BannerStage::Hidden
    }

    pub fn accept_all(&mut self, now: DateTime<Utc>) -> &ConsentRecord {
        self.commit(ConsentPreferences::accepted(), now)
    }

    pub fn reject_all(&mut self, now: DateTime<Utc>) -> &ConsentRecord {
        self.commit(ConsentPreferences::rejected(), now)
    }

    /// Open the per-category toggles
    pub fn customize(&mut self) {
        if self.stage != BannerStage::Hidden {
            self.stage = BannerStage::Customizing;
        }
    }

    /// Flip a category while customizing. Ignored in other stages.
    pub fn toggle(&mut self, category: CookieCategory) {
        if self.stage == BannerStage::Customizing {
            self.preferences.toggle(category);
        }
    }

    /// Persist the toggled values
    pub fn save(&mut self, now: DateTime<Utc>) -> &ConsentRecord {
        self.commit(self.preferences, now)
    }

    /// Dismissing the banner counts as rejecting everything optional
    pub fn close(&mut self, now: DateTime<Utc>) -> &ConsentRecord {
        self.reject_all(now)
    }

    fn commit(&mut self, preferences: ConsentPreferences, now: DateTime<Utc>) -> &ConsentRecord {
        self.preferences = preferences;
        self.stage = BannerStage::Hidden;
        self.record.insert(ConsentRecord::new(preferences, now))
    }
}

/// Decision posted by the banner form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ConsentAction {
    AcceptAll,
    RejectAll,
    Close,
    Save {
        #[serde(default)]
        analytics: bool,
        #[serde(default)]
        marketing: bool,
        #[serde(default)]
        preferences: bool,
    },
}

impl ConsentAction {
    /// Apply the decision to a fresh banner and return the record to store
    pub fn apply(self, now: DateTime<Utc>) -> ConsentRecord {
        let mut banner = ConsentBanner::from_cookie(None);
        match self {
            ConsentAction::AcceptAll => banner.accept_all(now).clone(),
            ConsentAction::RejectAll => banner.reject_all(now).clone(),
            ConsentAction::Close => banner.close(now).clone(),
            ConsentAction::Save {
                analytics,
                marketing,
                preferences,
            } => {
                banner.customize();
                let wanted = [
                    (CookieCategory::Analytics, analytics),
                    (CookieCategory::Marketing, marketing),
                    (CookieCategory::Preferences, preferences),
                ];
                for (category, on) in wanted {
                    if banner.preferences.allows(category) != on {
                        banner.toggle(category);
                    }
                }
                banner.save(now).clone()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_missing_cookie_shows_banner() {
        let banner = ConsentBanner::from_cookie(None);
        assert!(banner.should_show());
        assert_eq!(banner.preferences, ConsentPreferences::rejected());

        let garbage = ConsentBanner::from_cookie(Some("%7Bnot-json"));
        assert!(garbage.should_show());
    }

    #[test]
    fn test_cookie_round_trip_hides_banner() {
        let record = ConsentRecord::new(ConsentPreferences::accepted(), at(0));
        let value = record.to_cookie_value().unwrap();
        assert!(!value.contains('{'));

        let banner = ConsentBanner::from_cookie(Some(&value));
        assert!(!banner.should_show());
        assert_eq!(banner.record, Some(record));
    }

    #[test]
    fn test_other_version_is_ignored() {
        let mut record = ConsentRecord::new(ConsentPreferences::accepted(), at(0));
        record.version = "0.9".to_string();
        let value = record.to_cookie_value().unwrap();
        assert!(ConsentRecord::from_cookie_value(&value).is_none());
    }

    #[test]
    fn test_stored_necessary_false_is_forced_on() {
        let json = r#"{"necessary":false,"analytics":true,"marketing":false,"preferences":false,"timestamp":"2024-01-01T00:00:00Z","version":"1.0"}"#;
        let value = urlencoding::encode(json).into_owned();

        let banner = ConsentBanner::from_cookie(Some(&value));
        assert!(!banner.should_show());
        assert!(banner.preferences.necessary);
        assert!(banner.preferences.analytics);
        assert!(banner.record.as_ref().unwrap().preferences.necessary);
    }

    #[test]
    fn test_record_json_shape() {
        let record = ConsentRecord::new(ConsentPreferences::rejected(), at(0));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["necessary"], true);
        assert_eq!(json["analytics"], false);
        assert_eq!(json["version"], "1.0");
        assert!(json["timestamp"].as_str().unwrap().starts_with("2023-11-14T"));
    }

    #[test]
    fn test_customize_toggle_save() {
        let mut banner = ConsentBanner::from_cookie(None);
        banner.toggle(CookieCategory::Analytics);
        assert!(!banner.preferences.analytics, "toggles need the customize stage");

        banner.customize();
        assert_eq!(banner.stage, BannerStage::Customizing);
        banner.toggle(CookieCategory::Analytics);
        banner.toggle(CookieCategory::Necessary);
        let record = banner.save(at(1)).clone();

        assert!(record.preferences.necessary);
        assert!(record.preferences.analytics);
        assert!(!record.preferences.marketing);
        assert!(!banner.should_show());
    }

    #[test]
    fn test_close_rejects_optional_categories() {
        let mut banner = ConsentBanner::from_cookie(None);
        banner.customize();
        banner.toggle(CookieCategory::Marketing);
        let record = banner.close(at(2)).clone();
        assert_eq!(record.preferences, ConsentPreferences::rejected());
    }

    #[test]
    fn test_action_deserialize_and_apply() {
        let action: ConsentAction =
            serde_json::from_str(r#"{"action":"save","analytics":true}"#).unwrap();
        let record = action.apply(at(3));
        assert!(record.preferences.analytics);
        assert!(!record.preferences.preferences);

        let accept: ConsentAction = serde_json::from_str(r#"{"action":"accept_all"}"#).unwrap();
        assert_eq!(accept.apply(at(3)).preferences, ConsentPreferences::accepted());
    }

    #[test]
    fn test_set_cookie_header() {
        let record = ConsentRecord::new(ConsentPreferences::accepted(), at(0));
        let header = record.set_cookie_header(true).unwrap();
        assert!(header.starts_with("laxmi_cookie_consent="));
        assert!(header.contains("Max-Age=31536000"));
        assert!(header.ends_with("; Secure"));
    }

    fn category() -> impl Strategy<Value = CookieCategory> {
        prop_oneof![
            Just(CookieCategory::Necessary),
            Just(CookieCategory::Analytics),
            Just(CookieCategory::Marketing),
            Just(CookieCategory::Preferences),
        ]
    }

    proptest! {
        #[test]
        fn accept_all_is_idempotent(a in 0i64..1000, b in 0i64..1000) {
            let mut banner = ConsentBanner::from_cookie(None);
            let first = banner.accept_all(at(a)).clone();
            let second = banner.accept_all(at(b)).clone();
            prop_assert_eq!(first.preferences, second.preferences);
            prop_assert_eq!(first.version, second.version);
        }

        #[test]
        fn necessary_is_always_on(toggles in proptest::collection::vec(category(), 0..20)) {
            let mut banner = ConsentBanner::from_cookie(None);
            banner.customize();
            for c in toggles {
                banner.toggle(c);
                prop_assert!(banner.preferences.necessary);
            }
            let record = banner.save(at(0)).clone();
            prop_assert!(record.preferences.necessary);
        }
    }
}
