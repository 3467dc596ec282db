//! Letter domain model and API wire types

use serde::{Deserialize, Serialize};

/// Delivery lifecycle as reported by the letter service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LetterStatus {
    Scheduled,
    Sent,
    Failed,
}

impl LetterStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LetterStatus::Scheduled => "scheduled",
            LetterStatus::Sent => "sent",
            LetterStatus::Failed => "failed",
        }
    }

    /// Only `scheduled -> sent` and `scheduled -> failed` exist
    pub fn can_transition_to(&self, next: LetterStatus) -> bool {
        matches!(
            (self, next),
            (LetterStatus::Scheduled, LetterStatus::Sent)
                | (LetterStatus::Scheduled, LetterStatus::Failed)
        )
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, LetterStatus::Scheduled)
    }
}

impl std::fmt::Display for LetterStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LetterStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "scheduled" => Ok(LetterStatus::Scheduled),
            "sent" => Ok(LetterStatus::Sent),
            "failed" => Ok(LetterStatus::Failed),
            other => Err(format!("Unknown letter status: {}", other)),
        }
    }
}

/// A time letter as the client knows it
///
/// `content` is only present between compose and confirm; the history
/// endpoint never returns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Letter {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub delivery_email: String,
    pub delivery_time: String,
    pub status: LetterStatus,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl Letter {
    /// Letter just accepted by the service
    pub fn scheduled(
        response: &CreateLetterResponse,
        content: impl Into<String>,
        delivery_email: impl Into<String>,
        delivery_time: impl Into<String>,
    ) -> Self {
        let content = content.into();
        Self {
            id: response.letter_id.clone(),
            title: title_for(&content),
            content: Some(content),
            delivery_email: delivery_email.into(),
            delivery_time: delivery_time.into(),
            status: response.status,
            created_at: response.created_at.clone(),
            sent_at: None,
            error_message: None,
        }
    }

    /// Letter from a history row; the query email is the recipient
    pub fn from_summary(summary: &LetterSummary, delivery_email: &str) -> Self {
        Self {
            id: summary.id.clone(),
            title: summary.title.clone(),
            content: None,
            delivery_email: delivery_email.to_string(),
            delivery_time: summary.delivery_time.clone(),
            status: summary.status,
            created_at: summary.created_at.clone(),
            sent_at: None,
            error_message: None,
        }
    }

    pub fn from_detail(detail: &LetterDetail) -> Self {
        Self {
            id: detail.id.clone(),
            title: title_for(&detail.content),
            // Detail lookups are for status; the body stays server-side
            content: None,
            delivery_email: detail.delivery_email.clone(),
            delivery_time: detail.delivery_time.clone().unwrap_or_default(),
            status: detail.status,
            created_at: detail.created_at.clone().unwrap_or_default(),
            sent_at: detail.sent_at.clone(),
            error_message: detail.error_message.clone(),
        }
    }
}

/// Title length the letter service uses for history rows
pub const TITLE_MAX_CHARS: usize = 50;

/// Same summary rule the service applies: up to 50 chars, else 47 + "..."
pub fn title_for(content: &str) -> String {
    let trimmed = content.trim();
    if trimmed.chars().count() <= TITLE_MAX_CHARS {
        return trimmed.to_string();
    }
    let mut title: String = trimmed.chars().take(TITLE_MAX_CHARS - 3).collect();
    title.push_str("...");
    title
}

// =============================================================================
// Wire types (match the letter service JSON)
// =============================================================================

/// Body of `POST /api/time-letters`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateLetterRequest {
    pub content: String,
    pub delivery_email: String,
    pub delivery_time: String,
}

/// Response of `POST /api/time-letters`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateLetterResponse {
    pub letter_id: String,
    pub status: LetterStatus,
    pub created_at: String,
}

/// A row of `GET /api/time-letters/history`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LetterSummary {
    pub id: String,
    pub title: String,
    pub delivery_time: String,
    pub status: LetterStatus,
    pub created_at: String,
}

/// Response of `GET /api/time-letters/history`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryResponse {
    #[serde(default)]
    pub letters: Vec<LetterSummary>,
}

/// Response of `GET /api/time-letters/{id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LetterDetail {
    pub id: String,
    pub content: String,
    pub delivery_email: String,
    #[serde(default)]
    pub delivery_time: Option<String>,
    pub status: LetterStatus,
    #[serde(default)]
    pub sent_at: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Response of `GET /health`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}
