//! Consultation booking requests
//!
//! A request is validated, logged and, when mail is configured, forwarded
//! to the concierge with a confirmation sent back to the client. Mail
//! failures never fail the request.

use crate::config::SmtpConfig;
use crate::models::Locale;
use crate::services::email::{is_valid_email, EmailMessage, Mailer};
use chrono::{Datelike, NaiveDate, NaiveTime, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const MISSING_FIELDS_MESSAGE: &str = "Please complete all required fields";
pub const INVALID_EMAIL_MESSAGE: &str = "Please provide a valid email address";
pub const SUCCESS_MESSAGE: &str =
    "Your consultation request has been received. Our design concierge will contact you within 24 hours.";
pub const FAILURE_MESSAGE: &str =
    "We could not process your request. Please try again or contact us directly.";

pub const CLIENT_SUBJECT: &str = "Your LAXMI Consultation Request";

/// Body of `POST /api/book` and of the booking form
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BookingRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`, 24-hour
    pub time: String,
    pub message: Option<String>,
    pub locale: Option<String>,
    pub project_type: Option<String>,
}

impl BookingRequest {
    fn locale(&self) -> Locale {
        self.locale
            .as_deref()
            .and_then(Locale::parse)
            .unwrap_or_default()
    }

    fn phone(&self) -> Option<&str> {
        self.phone.as_deref().map(str::trim).filter(|p| !p.is_empty())
    }

    fn message(&self) -> Option<&str> {
        self.message.as_deref().map(str::trim).filter(|m| !m.is_empty())
    }

    fn project_type(&self) -> Option<&str> {
        self.project_type.as_deref().map(str::trim).filter(|p| !p.is_empty())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BookingError {
    #[error("Please complete all required fields")]
    MissingFields,

    #[error("Please provide a valid email address")]
    InvalidEmail,
}

/// Check the required fields and the email format
pub fn validate(request: &BookingRequest) -> Result<(), BookingError> {
    let required = [&request.name, &request.email, &request.date, &request.time];
    if required.iter().any(|field| field.trim().is_empty()) {
        return Err(BookingError::MissingFields);
    }
    if !is_valid_email(request.email.trim()) {
        return Err(BookingError::InvalidEmail);
    }
    Ok(())
}

/// `14:30` → `2:30 PM`, `00:05` → `12:05 AM`. Unparsable input is
/// returned unchanged.
pub fn format_time(time: &str) -> String {
    match NaiveTime::parse_from_str(time.trim(), "%H:%M") {
        Ok(t) => {
            let (pm, hour) = t.hour12();
            format!("{}:{:02} {}", hour, t.minute(), if pm { "PM" } else { "AM" })
        }
        Err(_) => time.to_string(),
    }
}

/// Long date in the client's language, e.g. `Monday, March 3, 2025` or
/// `lunedì 3 marzo 2025`. Unparsable input is returned unchanged.
pub fn format_date(date: &str, locale: Locale) -> String {
    let Ok(d) = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d") else {
        return date.to_string();
    };
    let month = d.month0() as usize;

    match locale {
        Locale::En => format!(
            "{}, {} {}, {}",
            weekday_name(d.weekday(), locale),
            MONTHS_EN[month],
            d.day(),
            d.year()
        ),
        Locale::It => format!(
            "{} {} {} {}",
            weekday_name(d.weekday(), locale),
            d.day(),
            MONTHS_IT[month],
            d.year()
        ),
    }
}

const MONTHS_EN: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

const MONTHS_IT: [&str; 12] = [
    "gennaio", "febbraio", "marzo", "aprile", "maggio", "giugno", "luglio", "agosto",
    "settembre", "ottobre", "novembre", "dicembre",
];

fn weekday_name(day: Weekday, locale: Locale) -> &'static str {
    let index = day.num_days_from_monday() as usize;
    match locale {
        Locale::En => ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday"][index],
        Locale::It => ["lunedì", "martedì", "mercoledì", "giovedì", "venerdì", "sabato", "domenica"][index],
    }
}

pub struct BookingService {
    mailer: Arc<dyn Mailer>,
    smtp: SmtpConfig,
}

impl BookingService {
    pub fn new(mailer: Arc<dyn Mailer>, smtp: SmtpConfig) -> Self {
        Self { mailer, smtp }
    }

    /// Accept a consultation request
    pub async fn submit(&self, request: &BookingRequest) -> Result<(), BookingError> {
        validate(request)?;
        let locale = request.locale();

        tracing::info!(
            name = %request.name,
            email = %request.email,
            phone = request.phone().unwrap_or("Not provided"),
            date = %format_date(&request.date, Locale::En),
            time = %format_time(&request.time),
            project_type = request.project_type().unwrap_or("-"),
            locale = %locale,
            message = request.message().unwrap_or("None"),
            submitted = %Utc::now().to_rfc3339(),
            "New consultation request"
        );

        if !self.mailer.is_enabled() {
            tracing::info!("Email notifications disabled (SMTP not configured)");
            return Ok(());
        }

        let concierge = EmailMessage {
            to: self.smtp.concierge_email.clone(),
            subject: format!("New Consultation Request — {}", request.name.trim()),
            html: concierge_email_html(request),
            reply_to: Some(request.email.trim().to_string()),
        };
        let client = EmailMessage {
            to: request.email.trim().to_string(),
            subject: CLIENT_SUBJECT.to_string(),
            html: client_email_html(request, locale, &self.smtp.concierge_email),
            reply_to: Some(self.smtp.concierge_email.clone()),
        };

        for message in [concierge, client] {
            let to = message.to.clone();
            if let Err(e) = self.mailer.send(message).await {
                tracing::error!(to = %to, error = %e, "Email sending failed");
                break;
            }
        }

        Ok(())
    }
}

fn esc(value: &str) -> String {
    tera::escape_html(value)
}

fn field(label: &str, value: &str) -> String {
    format!(
        r#"<div class="section"><div class="label">{}</div><div class="value">{}</div></div>"#,
        label, value
    )
}

/// Notification sent to the concierge
pub fn concierge_email_html(request: &BookingRequest) -> String {
    let name = esc(request.name.trim());
    let email = esc(request.email.trim());

    let mut details = String::new();
    details.push_str(&field("Client Name", &name));
    details.push_str(&field("Email", &format!(r#"<a href="mailto:{0}">{0}</a>"#, email)));
    if let Some(phone) = request.phone() {
        details.push_str(&field("Phone", &format!(r#"<a href="tel:{0}">{0}</a>"#, esc(phone))));
    }
    if let Some(project_type) = request.project_type() {
        details.push_str(&field("Project Type", &esc(project_type)));
    }

    let message = request
        .message()
        .map(|m| {
            format!(
                r#"<div class="section"><div class="label">Project Details</div><div class="value" style="white-space: pre-wrap;">{}</div></div>"#,
                esc(m)
            )
        })
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <style>
    body {{ font-family: 'Georgia', serif; color: #1a1a1a; line-height: 1.6; }}
    .container {{ max-width: 600px; margin: 0 auto; padding: 40px 20px; }}
    .header {{ border-bottom: 2px solid #c9a961; padding-bottom: 20px; margin-bottom: 30px; }}
    .logo {{ font-size: 24px; letter-spacing: 0.3em; }}
    .badge {{ display: inline-block; background: #c9a961; color: white; padding: 4px 12px; font-size: 12px; letter-spacing: 0.1em; margin-top: 8px; }}
    .section {{ margin-bottom: 25px; }}
    .label {{ font-size: 11px; letter-spacing: 0.15em; color: #8b7355; text-transform: uppercase; margin-bottom: 4px; }}
    .value {{ font-size: 16px; }}
    .highlight {{ background: #faf8f5; padding: 20px; border-left: 3px solid #c9a961; margin: 20px 0; }}
    .footer {{ border-top: 1px solid #e5e5e5; padding-top: 20px; margin-top: 30px; font-size: 12px; color: #666; }}
  </style>
</head>
<body>
  <div class="container">
    <div class="header">
      <div class="logo">LAXMI</div>
      <div class="badge">NEW CONSULTATION REQUEST</div>
    </div>
    <p>A new consultation request has been submitted through the website.</p>
    {details}
    <div class="highlight">
      <div class="label">Preferred Appointment</div>
      <div class="value" style="font-size: 18px;">{date} at {time}</div>
    </div>
    {message}
    <div class="footer">
      <p>This request was submitted on {submitted}</p>
      <p>LAXMI — Italian Luxury Interiors</p>
    </div>
  </div>
</body>
</html>"#,
        details = details,
        date = esc(&format_date(&request.date, Locale::En)),
        time = esc(&format_time(&request.time)),
        message = message,
        submitted = Utc::now().format("%A, %B %-d, %Y at %H:%M UTC"),
    )
}

/// Confirmation sent to the client in their language
pub fn client_email_html(request: &BookingRequest, locale: Locale, contact_email: &str) -> String {
    let (heading, received, preferred, note, invite, closing, footer) = match locale {
        Locale::En => (
            "Thank You",
            "We have received your consultation request and are delighted by your interest in LAXMI.",
            "Your Preferred Time",
            "Our design concierge will contact you within 24 hours to confirm.",
            "In the meantime, we invite you to explore our curated collection of exceptional Italian craftsmanship.",
            "We look forward to creating something beautiful together.",
            "By Appointment Only",
        ),
        Locale::It => (
            "Grazie",
            "Abbiamo ricevuto la sua richiesta di consulenza e siamo lieti del suo interesse per LAXMI.",
            "L'orario da lei preferito",
            "Il nostro concierge di design la contatterà entro 24 ore per confermare.",
            "Nel frattempo, la invitiamo a scoprire la nostra collezione di eccellenze artigianali italiane.",
            "Non vediamo l'ora di creare insieme qualcosa di straordinario.",
            "Solo su appuntamento",
        ),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="{lang}">
<head>
  <meta charset="utf-8">
  <style>
    body {{ font-family: 'Georgia', serif; color: #1a1a1a; line-height: 1.8; }}
    .container {{ max-width: 600px; margin: 0 auto; padding: 40px 20px; }}
    .header {{ text-align: center; border-bottom: 1px solid #e5e5e5; padding-bottom: 30px; margin-bottom: 30px; }}
    .logo {{ font-size: 28px; letter-spacing: 0.3em; }}
    .tagline {{ font-size: 12px; letter-spacing: 0.2em; color: #8b7355; margin-top: 8px; }}
    .content {{ text-align: center; }}
    h1 {{ font-weight: 300; font-size: 24px; margin-bottom: 20px; }}
    .highlight {{ background: #faf8f5; padding: 25px; margin: 30px 0; text-align: center; }}
    .note {{ font-size: 14px; color: #666; margin-top: 10px; }}
    .footer {{ text-align: center; border-top: 1px solid #e5e5e5; padding-top: 30px; margin-top: 40px; font-size: 12px; color: #666; }}
  </style>
</head>
<body>
  <div class="container">
    <div class="header">
      <div class="logo">LAXMI</div>
      <div class="tagline">ITALIAN LUXURY INTERIORS</div>
    </div>
    <div class="content">
      <h1>{heading}, {name}</h1>
      <p>{received}</p>
      <div class="highlight">
        <div><strong>{preferred}</strong><br>{date}<br>{time}</div>
        <div class="note">{note}</div>
      </div>
      <p>{invite}</p>
      <p style="color: #8b7355; font-style: italic;">{closing}</p>
    </div>
    <div class="footer">
      <p>LAXMI — {footer}</p>
      <p>Milano, Italia</p>
      <p><a href="mailto:{contact}" style="color: #8b7355;">{contact}</a></p>
    </div>
  </div>
</body>
</html>"#,
        lang = locale.code(),
        heading = heading,
        name = esc(request.name.trim()),
        received = received,
        preferred = preferred,
        date = esc(&format_date(&request.date, locale)),
        time = esc(&format_time(&request.time)),
        note = note,
        invite = invite,
        closing = closing,
        footer = footer,
        contact = esc(contact_email),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::email::{DisabledMailer, RecordingMailer};

    fn request() -> BookingRequest {
        BookingRequest {
            name: "Sofia <Bianchi>".to_string(),
            email: "sofia@example.com".to_string(),
            phone: Some("+39 333 1234567".to_string()),
            date: "2025-03-03".to_string(),
            time: "14:30".to_string(),
            message: Some("Villa on Lake Como".to_string()),
            locale: Some("it".to_string()),
            project_type: Some("residential".to_string()),
        }
    }

    fn smtp() -> SmtpConfig {
        SmtpConfig {
            host: "smtp.example.com".to_string(),
            concierge_email: "concierge@laxmi.it".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time("14:30"), "2:30 PM");
        assert_eq!(format_time("00:05"), "12:05 AM");
        assert_eq!(format_time("12:00"), "12:00 PM");
        assert_eq!(format_time("09:15"), "9:15 AM");
        assert_eq!(format_time("later"), "later");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date("2025-03-03", Locale::En), "Monday, March 3, 2025");
        assert_eq!(format_date("2025-03-03", Locale::It), "lunedì 3 marzo 2025");
        assert_eq!(format_date("soon", Locale::En), "soon");
    }

    #[test]
    fn test_validate() {
        assert_eq!(validate(&request()), Ok(()));

        let mut missing = request();
        missing.time = " ".to_string();
        assert_eq!(validate(&missing), Err(BookingError::MissingFields));

        let mut bad_email = request();
        bad_email.email = "sofia@example".to_string();
        assert_eq!(validate(&bad_email), Err(BookingError::InvalidEmail));
        assert_eq!(BookingError::InvalidEmail.to_string(), INVALID_EMAIL_MESSAGE);
        assert_eq!(BookingError::MissingFields.to_string(), MISSING_FIELDS_MESSAGE);
    }

    #[tokio::test]
    async fn test_submit_sends_both_emails() {
        let mailer = Arc::new(RecordingMailer::default());
        let service = BookingService::new(mailer.clone(), smtp());

        service.submit(&request()).await.unwrap();

        let sent = mailer.messages();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].to, "concierge@laxmi.it");
        assert_eq!(sent[0].subject, "New Consultation Request — Sofia <Bianchi>");
        assert!(sent[0].html.contains("Sofia &lt;Bianchi&gt;"));
        assert!(sent[0].html.contains("2:30 PM"));
        assert_eq!(sent[1].to, "sofia@example.com");
        assert_eq!(sent[1].subject, CLIENT_SUBJECT);
        assert!(sent[1].html.contains("lunedì 3 marzo 2025"));
    }

    #[tokio::test]
    async fn test_mail_failure_does_not_fail_request() {
        let service = BookingService::new(Arc::new(RecordingMailer::failing()), smtp());
        assert_eq!(service.submit(&request()).await, Ok(()));
    }

    #[tokio::test]
    async fn test_disabled_mailer_still_accepts() {
        let service = BookingService::new(Arc::new(DisabledMailer), SmtpConfig::default());
        assert_eq!(service.submit(&request()).await, Ok(()));

        let mut invalid = request();
        invalid.email = "nope".to_string();
        assert_eq!(service.submit(&invalid).await, Err(BookingError::InvalidEmail));
    }

    #[test]
    fn test_client_email_in_english() {
        let mut req = request();
        req.locale = Some("en".to_string());
        let html = client_email_html(&req, req.locale(), "hello@laxmi.it");
        assert!(html.contains("Thank You, Sofia &lt;Bianchi&gt;"));
        assert!(html.contains("Monday, March 3, 2025"));
        assert!(html.contains("within 24 hours"));
    }
}
