//! Newsletter subscriber model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Locale;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewsletterSubscriber {
    pub id: i64,
    /// Lower-cased, trimmed address (unique)
    pub email: String,
    pub locale: Locale,
    pub created_at: DateTime<Utc>,
}
