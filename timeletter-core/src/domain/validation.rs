//! Form validation for time letters
//!
//! All checks are pure. The time-based checks come in two flavours: the
//! `_at` variants take `now` explicitly, the plain ones read the wall clock.
//! Lengths are counted in characters after trimming.

use std::sync::LazyLock;

use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::datetime::parse_timestamp;

/// Minimum letter length, in characters
pub const CONTENT_MIN_CHARS: usize = 10;

/// Maximum letter length, in characters
pub const CONTENT_MAX_CHARS: usize = 2000;

/// Default preview length used on the confirm page
pub const DEFAULT_PREVIEW_CHARS: usize = 100;

/// Marker appended to truncated previews
pub const ELLIPSIS: &str = "...";

/// Delivery must be at least this many minutes in the future
pub const MIN_DELIVERY_LEAD_MINUTES: i64 = 5;

/// Minimum gap between "now" and an accepted delivery time
pub fn min_delivery_lead() -> Duration {
    Duration::minutes(MIN_DELIVERY_LEAD_MINUTES)
}

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

static BLANK_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// Form field a validation error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Content,
    Email,
    DeliveryTime,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Content => "content",
            Field::Email => "email",
            Field::DeliveryTime => "deliveryTime",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single field-tagged validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub field: Field,
    pub message: String,
}

impl ValidationError {
    fn new(field: Field, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Outcome of validating a whole form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    fn from_errors(errors: Vec<ValidationError>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }

    /// First error reported for a field
    pub fn error_for(&self, field: Field) -> Option<&ValidationError> {
        self.errors.iter().find(|e| e.field == field)
    }
}

// User-facing messages
pub const MSG_CONTENT_REQUIRED: &str = "Please write the content of your letter";
pub const MSG_CONTENT_TOO_SHORT: &str = "The letter must be at least 10 characters long";
pub const MSG_CONTENT_TOO_LONG: &str = "The letter cannot be longer than 2000 characters";
pub const MSG_EMAIL_REQUIRED: &str = "Please enter an email address";
pub const MSG_EMAIL_INVALID: &str = "Please enter a valid email address";
pub const MSG_TIME_REQUIRED: &str = "Please choose a delivery time";
pub const MSG_TIME_TOO_SOON: &str = "Delivery time must be at least 5 minutes in the future";

fn char_len(value: &str) -> usize {
    value.trim().chars().count()
}

/// Check the `local@domain.tld` shape. Deliverability is not checked.
pub fn validate_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn validate_required(value: &str) -> bool {
    !value.trim().is_empty()
}

pub fn validate_min_length(value: &str, min_length: usize) -> bool {
    char_len(value) >= min_length
}

pub fn validate_max_length(value: &str, max_length: usize) -> bool {
    char_len(value) <= max_length
}

pub fn validate_length_range(value: &str, min_length: usize, max_length: usize) -> bool {
    let len = char_len(value);
    len >= min_length && len <= max_length
}

/// True iff `time` parses and is strictly later than `now`
pub fn validate_future_time_at(time: &str, now: DateTime<Utc>) -> bool {
    parse_timestamp(time).is_some_and(|t| t > now)
}

pub fn validate_future_time(time: &str) -> bool {
    validate_future_time_at(time, Utc::now())
}

/// True iff `time` parses and is at least [`min_delivery_lead`] after `now`.
/// The boundary itself is accepted.
pub fn validate_delivery_time_at(time: &str, now: DateTime<Utc>) -> bool {
    parse_timestamp(time).is_some_and(|t| t >= now + min_delivery_lead())
}

pub fn validate_delivery_time(time: &str) -> bool {
    validate_delivery_time_at(time, Utc::now())
}

/// Trimmed content, cut to `max_length` characters plus [`ELLIPSIS`] when longer.
/// Cuts are not word-aware.
pub fn get_content_preview(content: &str, max_length: usize) -> String {
    let trimmed = content.trim();
    if trimmed.chars().count() <= max_length {
        return trimmed.to_string();
    }
    let mut preview: String = trimmed.chars().take(max_length).collect();
    preview.push_str(ELLIPSIS);
    preview
}

/// Normalize line endings, cap blank-line runs at one empty line, trim.
pub fn sanitize_content(content: &str) -> String {
    let unified = content.replace("\r\n", "\n").replace('\r', "\n");
    BLANK_RUN_RE
        .replace_all(&unified, "\n\n")
        .trim()
        .to_string()
}

/// Validate the compose form field by field.
///
/// Every field is checked; within a field, checking stops at the first failure.
pub fn validate_letter_form(content: &str, email: &str, delivery_time: &str) -> ValidationResult {
    let mut errors = Vec::new();

    if !validate_required(content) {
        errors.push(ValidationError::new(Field::Content, MSG_CONTENT_REQUIRED));
    } else if !validate_min_length(content, CONTENT_MIN_CHARS) {
        errors.push(ValidationError::new(Field::Content, MSG_CONTENT_TOO_SHORT));
    } else if !validate_max_length(content, CONTENT_MAX_CHARS) {
        errors.push(ValidationError::new(Field::Content, MSG_CONTENT_TOO_LONG));
    }

    if !validate_required(email) {
        errors.push(ValidationError::new(Field::Email, MSG_EMAIL_REQUIRED));
    } else if !validate_email(email) {
        errors.push(ValidationError::new(Field::Email, MSG_EMAIL_INVALID));
    }

    if !validate_required(delivery_time) {
        errors.push(ValidationError::new(Field::DeliveryTime, MSG_TIME_REQUIRED));
    }

    ValidationResult::from_errors(errors)
}
