//! Sliding-window rate limiting for admin logins
//!
//! Failed logins are limited per email address (5 per 15 minutes) and all
//! login requests per client IP (10 per minute).

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::hash::Hash;
use std::net::IpAddr;
use tokio::sync::Mutex;

/// Attempts allowed per key within a trailing window
pub struct SlidingWindow<K> {
    limit: usize,
    window: Duration,
    hits: Mutex<HashMap<K, Vec<DateTime<Utc>>>>,
}

impl<K: Eq + Hash + Clone> SlidingWindow<K> {
    pub fn new(limit: usize, window: Duration) -> Self {
        Self {
            limit,
            window,
            hits: Mutex::new(HashMap::new()),
        }
    }

    /// Whether `key` has used up its attempts as of `now`
    pub async fn is_limited_at(&self, key: &K, now: DateTime<Utc>) -> bool {
        let cutoff = now - self.window;
        let mut hits = self.hits.lock().await;
        match hits.get_mut(key) {
            Some(times) => {
                times.retain(|t| *t > cutoff);
                times.len() >= self.limit
            }
            None => false,
        }
    }

    pub async fn record_at(&self, key: K, now: DateTime<Utc>) {
        self.hits.lock().await.entry(key).or_default().push(now);
    }

    pub async fn clear(&self, key: &K) {
        self.hits.lock().await.remove(key);
    }

    /// Drop keys with no attempts inside the window
    pub async fn prune_at(&self, now: DateTime<Utc>) {
        let cutoff = now - self.window;
        self.hits.lock().await.retain(|_, times| {
            times.retain(|t| *t > cutoff);
            !times.is_empty()
        });
    }
}

/// Login limiter combining the per-email and per-IP windows
pub struct LoginRateLimiter {
    emails: SlidingWindow<String>,
    ips: SlidingWindow<IpAddr>,
}

impl LoginRateLimiter {
    pub fn new() -> Self {
        Self {
            emails: SlidingWindow::new(5, Duration::minutes(15)),
            ips: SlidingWindow::new(10, Duration::minutes(1)),
        }
    }

    pub async fn is_email_limited(&self, email: &str) -> bool {
        self.emails.is_limited_at(&normalize(email), Utc::now()).await
    }

    pub async fn record_failed_attempt(&self, email: &str) {
        self.emails.record_at(normalize(email), Utc::now()).await;
    }

    /// Forget failures after a successful login
    pub async fn clear_email(&self, email: &str) {
        self.emails.clear(&normalize(email)).await;
    }

    pub async fn is_ip_limited(&self, ip: IpAddr) -> bool {
        self.ips.is_limited_at(&ip, Utc::now()).await
    }

    pub async fn record_ip_request(&self, ip: IpAddr) {
        self.ips.record_at(ip, Utc::now()).await;
    }

    /// Periodic cleanup of stale entries
    pub async fn cleanup(&self) {
        let now = Utc::now();
        self.emails.prune_at(now).await;
        self.ips.prune_at(now).await;
    }
}

impl Default for LoginRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[tokio::test]
    async fn test_email_limit_after_five_failures() {
        let limiter = LoginRateLimiter::new();

        for _ in 0..4 {
            limiter.record_failed_attempt("owner@laxmi.it").await;
        }
        assert!(!limiter.is_email_limited("owner@laxmi.it").await);

        limiter.record_failed_attempt("OWNER@laxmi.it ").await;
        assert!(limiter.is_email_limited("owner@laxmi.it").await);

        limiter.clear_email("owner@laxmi.it").await;
        assert!(!limiter.is_email_limited("owner@laxmi.it").await);
    }

    #[tokio::test]
    async fn test_ip_limit_after_ten_requests() {
        let limiter = LoginRateLimiter::new();
        let ip = IpAddr::from_str("10.0.0.7").unwrap();

        for _ in 0..9 {
            limiter.record_ip_request(ip).await;
        }
        assert!(!limiter.is_ip_limited(ip).await);
        limiter.record_ip_request(ip).await;
        assert!(limiter.is_ip_limited(ip).await);
    }

    #[tokio::test]
    async fn test_window_slides() {
        let window = SlidingWindow::new(2, Duration::minutes(1));
        let start = Utc::now();

        window.record_at("k", start).await;
        window.record_at("k", start + Duration::seconds(30)).await;
        assert!(window.is_limited_at(&"k", start + Duration::seconds(40)).await);

        // The first hit falls out of the window after one minute
        assert!(!window.is_limited_at(&"k", start + Duration::seconds(61)).await);
    }

    #[tokio::test]
    async fn test_prune_removes_stale_keys() {
        let window = SlidingWindow::new(1, Duration::minutes(1));
        let start = Utc::now();
        window.record_at("old", start).await;
        window.prune_at(start + Duration::minutes(2)).await;
        assert!(window.hits.lock().await.is_empty());
    }
}
