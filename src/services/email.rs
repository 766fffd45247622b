//! Outgoing email
//!
//! Booking notifications go through the `Mailer` trait. The SMTP
//! implementation uses lettre; when no SMTP host is configured a mailer
//! that only logs is used instead.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

use crate::config::SmtpConfig;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

/// Loose address check used by the public forms
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// An HTML email ready to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub reply_to: Option<String>,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<()>;

    /// False when messages are dropped instead of delivered
    fn is_enabled(&self) -> bool;
}

/// Build the mailer described by the SMTP settings
pub fn create_mailer(config: &SmtpConfig) -> Arc<dyn Mailer> {
    if config.is_enabled() {
        Arc::new(SmtpMailer::new(config.clone()))
    } else {
        tracing::info!("SMTP host not configured; booking emails will be skipped");
        Arc::new(DisabledMailer)
    }
}

/// Delivers through an SMTP relay
pub struct SmtpMailer {
    config: SmtpConfig,
}

impl SmtpMailer {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>> {
        // Port 465 speaks implicit TLS; anything else upgrades with STARTTLS.
        let builder = if self.config.port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.host)
        }
        .map_err(|e| anyhow!("Failed to create SMTP transport: {}", e))?
        .port(self.config.port);

        let builder = if self.config.username.is_empty() {
            builder
        } else {
            builder.credentials(Credentials::new(
                self.config.username.clone(),
                self.config.password.clone(),
            ))
        };

        Ok(builder.build())
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: EmailMessage) -> Result<()> {
        let mut builder = Message::builder()
            .from(
                self.config
                    .from_address
                    .parse()
                    .map_err(|e| anyhow!("Invalid from address: {}", e))?,
            )
            .to(message
                .to
                .parse()
                .map_err(|e| anyhow!("Invalid to address: {}", e))?)
            .subject(message.subject);

        if let Some(reply_to) = message.reply_to {
            builder = builder.reply_to(
                reply_to
                    .parse()
                    .map_err(|e| anyhow!("Invalid reply-to address: {}", e))?,
            );
        }

        let email = builder
            .header(ContentType::TEXT_HTML)
            .body(message.html)
            .map_err(|e| anyhow!("Failed to build email: {}", e))?;

        self.transport()?
            .send(email)
            .await
            .map_err(|e| anyhow!("Failed to send email: {}", e))?;

        Ok(())
    }

    fn is_enabled(&self) -> bool {
        true
    }
}

/// Drops every message
pub struct DisabledMailer;

#[async_trait]
impl Mailer for DisabledMailer {
    async fn send(&self, message: EmailMessage) -> Result<()> {
        tracing::debug!(to = %message.to, subject = %message.subject, "Mail disabled, message dropped");
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

/// Keeps sent messages in memory for assertions
#[cfg(test)]
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: std::sync::Mutex<Vec<EmailMessage>>,
    pub fail: bool,
}

#[cfg(test)]
impl RecordingMailer {
    pub fn failing() -> Self {
        Self {
            sent: Default::default(),
            fail: true,
        }
    }

    pub fn messages(&self) -> Vec<EmailMessage> {
        self.sent.lock().map(|m| m.clone()).unwrap_or_default()
    }
}

#[cfg(test)]
#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: EmailMessage) -> Result<()> {
        if self.fail {
            return Err(anyhow!("SMTP unavailable"));
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(message);
        }
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        true
    }
}
