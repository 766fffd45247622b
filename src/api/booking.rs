//! Public form endpoints
//!
//! - POST /api/book - consultation request (JSON, or a plain form post)
//! - POST /api/newsletter - newsletter signup
//! - POST /api/consent - store the cookie consent decision
//!
//! Booking and newsletter answer with `{success}` / `{error}` bodies that
//! the site script reads directly.

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::post,
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState};
use crate::models::Locale;
use crate::services::booking::{FAILURE_MESSAGE, SUCCESS_MESSAGE};
use crate::services::{BookingError, BookingRequest, ConsentAction, NewsletterError};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/book", post(submit_booking))
        .route("/newsletter", post(subscribe))
        .route("/consent", post(save_consent))
}

#[derive(Debug, Serialize)]
struct SuccessBody {
    success: bool,
    message: &'static str,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorBody { error: message.into() })).into_response()
}

fn is_form_post(request: &Request) -> bool {
    request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/x-www-form-urlencoded"))
}

/// POST /api/book
///
/// A plain form post (no script) is redirected back to the book page,
/// which then shows the confirmation with the submitted email.
async fn submit_booking(State(state): State<AppState>, request: Request) -> Response {
    let from_form = is_form_post(&request);
    let parsed = if from_form {
        Form::<BookingRequest>::from_request(request, &state)
            .await
            .map(|Form(body)| body)
            .map_err(|e| e.body_text())
    } else {
        Json::<BookingRequest>::from_request(request, &state)
            .await
            .map(|Json(body)| body)
            .map_err(|e| e.body_text())
    };

    let booking = match parsed {
        Ok(booking) => booking,
        Err(reason) => {
            tracing::error!(reason = %reason, "Unreadable booking request");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, FAILURE_MESSAGE);
        }
    };

    match state.booking_service.submit(&booking).await {
        Ok(()) if from_form => {
            let locale = booking.locale.as_deref().and_then(Locale::parse).unwrap_or_default();
            let target = format!(
                "/{}/book?submitted={}",
                locale.code(),
                urlencoding::encode(booking.email.trim())
            );
            Redirect::to(&target).into_response()
        }
        Ok(()) => Json(SuccessBody {
            success: true,
            message: SUCCESS_MESSAGE,
        })
        .into_response(),
        Err(e @ (BookingError::MissingFields | BookingError::InvalidEmail)) => {
            error_response(StatusCode::BAD_REQUEST, e.to_string())
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NewsletterRequest {
    email: Option<String>,
    locale: Option<String>,
}

/// POST /api/newsletter
async fn subscribe(
    State(state): State<AppState>,
    body: Result<Json<NewsletterRequest>, JsonRejection>,
) -> Response {
    let body = body.map(|Json(b)| b).unwrap_or_default();

    match state
        .newsletter_service
        .subscribe(body.email.as_deref(), body.locale.as_deref())
        .await
    {
        Ok(subscription) => Json(subscription).into_response(),
        Err(e @ (NewsletterError::MissingEmail | NewsletterError::InvalidEmail)) => {
            error_response(StatusCode::BAD_REQUEST, e.to_string())
        }
        Err(NewsletterError::InternalError(e)) => {
            tracing::error!(error = %e, "Newsletter subscription failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Could not process subscription")
        }
    }
}

/// POST /api/consent
///
/// Applies the banner decision and returns the stored record in the
/// `laxmi_cookie_consent` cookie.
async fn save_consent(
    State(state): State<AppState>,
    body: Result<Json<ConsentAction>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(action) = body.map_err(|e| ApiError::validation_error(e.body_text()))?;

    let record = action.apply(chrono::Utc::now());
    let cookie = record.set_cookie_header(state.secure_cookies())?;
    let cookie = HeaderValue::from_str(&cookie)
        .map_err(|e| ApiError::internal_error(format!("Invalid consent cookie: {}", e)))?;

    tracing::debug!(
        analytics = record.preferences.analytics,
        marketing = record.preferences.marketing,
        preferences = record.preferences.preferences,
        "Cookie consent saved"
    );

    Ok(([(header::SET_COOKIE, cookie)], Json(record)).into_response())
}
