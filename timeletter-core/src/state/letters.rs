use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::domain::{Letter, LetterStatus};

/// Letters known to this session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LetterState {
    pub letters: Vec<Letter>,
    pub current_letter: Option<Letter>,
    pub is_loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub enum LetterAction {
    SetLetters(Vec<Letter>),
    SetCurrentLetter(Option<Letter>),
    SetLoading(bool),
    SetError(Option<String>),
    /// Newest first, so the letter is prepended
    AddLetter(Letter),
    UpdateLetterStatus {
        id: String,
        status: LetterStatus,
        error_message: Option<String>,
        at: DateTime<Utc>,
    },
    ClearError,
}

#[derive(Debug, Default)]
pub struct LetterStore {
    state: LetterState,
}

impl LetterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &LetterState {
        &self.state
    }

    pub fn find(&self, id: &str) -> Option<&Letter> {
        self.state.letters.iter().find(|l| l.id == id)
    }

    pub fn dispatch(&mut self, action: LetterAction) {
        match action {
            LetterAction::SetLetters(letters) => self.state.letters = letters,
            LetterAction::SetCurrentLetter(letter) => self.state.current_letter = letter,
            LetterAction::SetLoading(loading) => self.state.is_loading = loading,
            LetterAction::SetError(error) => self.state.error = error,
            LetterAction::ClearError => self.state.error = None,
            LetterAction::AddLetter(letter) => self.state.letters.insert(0, letter),
            LetterAction::UpdateLetterStatus {
                id,
                status,
                error_message,
                at,
            } => {
                let stamp = at.to_rfc3339_opts(SecondsFormat::Millis, true);
                let mut found = false;

                let current = self
                    .state
                    .current_letter
                    .as_mut()
                    .filter(|l| l.id == id);
                for letter in self
                    .state
                    .letters
                    .iter_mut()
                    .filter(|l| l.id == id)
                    .chain(current)
                {
                    found = true;
                    apply_status(letter, status, error_message.as_deref(), &stamp);
                }

                if !found {
                    tracing::debug!(letter_id = %id, "status update for unknown letter");
                }
            }
        }
    }
}

fn apply_status(letter: &mut Letter, status: LetterStatus, error_message: Option<&str>, stamp: &str) {
    if letter.status == status {
        return;
    }
    if !letter.status.can_transition_to(status) {
        tracing::warn!(
            letter_id = %letter.id,
            from = %letter.status,
            to = %status,
            "ignoring invalid letter status transition"
        );
        return;
    }

    letter.status = status;
    match status {
        LetterStatus::Sent => {
            letter.sent_at = Some(stamp.to_string());
            letter.error_message = None;
        }
        LetterStatus::Failed => letter.error_message = error_message.map(str::to_string),
        LetterStatus::Scheduled => {}
    }
}
