//! History page workflow
//!
//! Loads the letters sent to the session identity, filters them by status
//! locally, and can refresh one letter's status from the service.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use crate::domain::datetime::parse_timestamp;
use crate::domain::result::Result;
use crate::domain::{Letter, LetterStatus};
use crate::ports::LetterGateway;
use crate::state::{LetterAction, UserAction};

use super::logging::{events, LogEvent};
use super::session::Session;

pub const HISTORY_FAILURE: &str = "Failed to load history, please try again later";

pub const EMPTY_WITHOUT_EMAIL: &str = "Enter your email to look up your letters";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Scheduled,
    Sent,
    Failed,
}

impl StatusFilter {
    pub const ALL: [StatusFilter; 4] = [
        StatusFilter::All,
        StatusFilter::Scheduled,
        StatusFilter::Sent,
        StatusFilter::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Scheduled => "scheduled",
            StatusFilter::Sent => "sent",
            StatusFilter::Failed => "failed",
        }
    }

    pub fn matches(&self, status: LetterStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Scheduled => status == LetterStatus::Scheduled,
            StatusFilter::Sent => status == LetterStatus::Sent,
            StatusFilter::Failed => status == LetterStatus::Failed,
        }
    }
}

impl std::fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(StatusFilter::All),
            "scheduled" => Ok(StatusFilter::Scheduled),
            "sent" => Ok(StatusFilter::Sent),
            "failed" => Ok(StatusFilter::Failed),
            other => Err(format!(
                "Unknown status filter '{}' (expected all, scheduled, sent or failed)",
                other
            )),
        }
    }
}

pub struct HistoryWorkflow {
    gateway: Arc<dyn LetterGateway>,
    filter: StatusFilter,
    loaded_for: Option<String>,
}

impl HistoryWorkflow {
    pub fn new(gateway: Arc<dyn LetterGateway>) -> Self {
        Self {
            gateway,
            filter: StatusFilter::All,
            loaded_for: None,
        }
    }

    pub fn filter(&self) -> StatusFilter {
        self.filter
    }

    /// Email the current list belongs to
    pub fn loaded_for(&self) -> Option<&str> {
        self.loaded_for.as_deref()
    }

    /// Page entry: load the identity's letters when one is known
    pub async fn mount(&mut self, session: &mut Session) {
        if let Some(email) = session.user.email().map(str::to_string) {
            self.load(session, &email).await;
        }
    }

    /// Look up a different email; blank input is ignored
    pub async fn submit_email(&mut self, session: &mut Session, email: &str) -> Result<()> {
        let email = email.trim();
        if email.is_empty() {
            return Ok(());
        }
        session.user.dispatch(UserAction::SetEmail(Some(email.to_string())))?;
        self.load(session, email).await;
        Ok(())
    }

    /// Re-fetch for the email already shown
    pub async fn refresh(&mut self, session: &mut Session) {
        if let Some(email) = self.loaded_for.clone() {
            self.load(session, &email).await;
        }
    }

    async fn load(&mut self, session: &mut Session, email: &str) {
        session.letters.dispatch(LetterAction::SetLoading(true));
        session.letters.dispatch(LetterAction::ClearError);

        match self.gateway.get_history(email).await {
            Ok(response) => {
                let letters: Vec<Letter> = response
                    .letters
                    .iter()
                    .map(|summary| Letter::from_summary(summary, email))
                    .collect();
                tracing::debug!(count = letters.len(), "history loaded");
                session.letters.dispatch(LetterAction::SetLetters(letters));
                session.record(LogEvent::new(events::HISTORY_LOADED).with_page("/history"));
            }
            Err(e) => {
                session.letters.dispatch(LetterAction::SetLetters(Vec::new()));
                session.letters.dispatch(LetterAction::SetError(Some(e.to_string())));
                session.notifier.error(HISTORY_FAILURE);
                session.record(
                    LogEvent::new(events::HISTORY_LOAD_FAILED)
                        .with_page("/history")
                        .with_failure(&e),
                );
            }
        }

        self.loaded_for = Some(email.to_string());
        session.letters.dispatch(LetterAction::SetLoading(false));
    }

    pub fn set_filter(&mut self, filter: StatusFilter) {
        self.filter = filter;
    }

    /// The fetched list narrowed by the current filter
    pub fn visible<'a>(&self, session: &'a Session) -> Vec<&'a Letter> {
        session
            .letters
            .state()
            .letters
            .iter()
            .filter(|letter| self.filter.matches(letter.status))
            .collect()
    }

    pub fn empty_message(&self, session: &Session) -> String {
        match self.loaded_for.as_deref().or_else(|| session.user.email()) {
            Some(email) => format!("No letters found for {}", email),
            None => EMPTY_WITHOUT_EMAIL.to_string(),
        }
    }

    /// Fetch one letter and fold its reported status into the store
    pub async fn inspect(&mut self, session: &mut Session, letter_id: &str) -> Result<Letter> {
        match self.gateway.get_letter(letter_id).await {
            Ok(detail) => {
                let at = detail
                    .sent_at
                    .as_deref()
                    .and_then(parse_timestamp)
                    .unwrap_or_else(Utc::now);
                let letter = Letter::from_detail(&detail);

                session.letters.dispatch(LetterAction::UpdateLetterStatus {
                    id: detail.id.clone(),
                    status: detail.status,
                    error_message: detail.error_message.clone(),
                    at,
                });
                session
                    .letters
                    .dispatch(LetterAction::SetCurrentLetter(Some(letter.clone())));
                session.record(LogEvent::new(events::LETTER_INSPECTED).with_page("/history"));
                Ok(letter)
            }
            Err(e) => {
                session.notifier.error(e.to_string());
                session.record(
                    LogEvent::new(events::LETTER_INSPECTED)
                        .with_page("/history")
                        .with_failure(&e),
                );
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for HistoryWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryWorkflow")
            .field("filter", &self.filter)
            .field("loaded_for", &self.loaded_for)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_parsing() {
        assert_eq!("Sent".parse::<StatusFilter>().unwrap(), StatusFilter::Sent);
        assert_eq!("".parse::<StatusFilter>().unwrap(), StatusFilter::All);
        assert!("pending".parse::<StatusFilter>().is_err());
        for filter in StatusFilter::ALL {
            assert_eq!(filter.to_string().parse::<StatusFilter>().unwrap(), filter);
        }
    }

    #[test]
    fn test_filter_matching() {
        assert!(StatusFilter::All.matches(LetterStatus::Failed));
        assert!(StatusFilter::Failed.matches(LetterStatus::Failed));
        assert!(!StatusFilter::Sent.matches(LetterStatus::Scheduled));
    }
}
