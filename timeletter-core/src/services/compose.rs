//! Compose page workflow
//!
//! Holds the form, gates submission on the field rules, sends the letter and
//! hands the accepted letter over to the confirm page.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::datetime;
use crate::domain::result::{Error, Result};
use crate::domain::validation::{
    validate_delivery_time_at, validate_email, validate_max_length, validate_min_length,
    validate_required, CONTENT_MAX_CHARS, CONTENT_MIN_CHARS, MSG_CONTENT_REQUIRED,
    MSG_CONTENT_TOO_LONG, MSG_CONTENT_TOO_SHORT, MSG_EMAIL_INVALID, MSG_EMAIL_REQUIRED,
    MSG_TIME_REQUIRED, MSG_TIME_TOO_SOON,
};
use crate::domain::{CreateLetterRequest, Field, Letter};
use crate::ports::LetterGateway;
use crate::state::{LetterAction, UserAction};

use super::handoff::ConfirmPayload;
use super::logging::{events, LogEvent};
use super::router::Route;
use super::session::Session;

/// Shown when the failure carries no message meant for the user
pub const CREATE_FAILURE: &str = "Failed to create letter, please try again later";

pub const CREATE_SUCCESS: &str = "Your letter has been scheduled";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComposeForm {
    pub content: String,
    pub email: String,
    /// Local wall-clock `YYYY-MM-DDTHH:MM`, or any timestamp with an offset
    pub delivery_time: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposeState {
    Editing,
    Submitting,
    EditingWithError(String),
    Submitted(Route),
}

#[derive(Debug)]
pub enum ComposeOutcome {
    Navigate(Route),
    /// The form did not pass the gate; nothing was sent
    Rejected(Error),
    /// The service call failed
    Failed(Error),
    /// The state is still `Submitting`
    ///
    /// `submit` takes `&mut self`, so two submissions cannot overlap while
    /// the first future is alive, and dropping it resets the state. Only a
    /// future that was leaked mid-request (never dropped) leaves the state
    /// behind, and this outcome refuses to send a second letter over it.
    Busy,
}

/// Puts the workflow in `Submitting` and falls back to `Editing` if the
/// submission future is dropped before it finishes
struct SubmittingGuard<'a>(&'a mut ComposeState);

impl<'a> SubmittingGuard<'a> {
    fn begin(state: &'a mut ComposeState) -> Self {
        *state = ComposeState::Submitting;
        Self(state)
    }

    fn finish(self, next: ComposeState) {
        *self.0 = next;
    }
}

impl Drop for SubmittingGuard<'_> {
    fn drop(&mut self) {
        if *self.0 == ComposeState::Submitting {
            *self.0 = ComposeState::Editing;
        }
    }
}

pub struct ComposeWorkflow {
    form: ComposeForm,
    state: ComposeState,
    gateway: Arc<dyn LetterGateway>,
}

impl ComposeWorkflow {
    pub fn new(gateway: Arc<dyn LetterGateway>) -> Self {
        Self {
            form: ComposeForm::default(),
            state: ComposeState::Editing,
            gateway,
        }
    }

    /// Start with the session identity in the email field
    pub fn for_session(gateway: Arc<dyn LetterGateway>, session: &Session) -> Self {
        let mut workflow = Self::new(gateway);
        if let Some(email) = session.user.email() {
            workflow.form.email = email.to_string();
        }
        workflow
    }

    pub fn form(&self) -> &ComposeForm {
        &self.form
    }

    pub fn state(&self) -> &ComposeState {
        &self.state
    }

    pub fn is_submitting(&self) -> bool {
        self.state == ComposeState::Submitting
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.form.content = content.into();
        self.clear_error();
    }

    pub fn set_email(&mut self, email: impl Into<String>) {
        self.form.email = email.into();
        self.clear_error();
    }

    pub fn set_delivery_time(&mut self, delivery_time: impl Into<String>) {
        self.form.delivery_time = delivery_time.into();
        self.clear_error();
    }

    fn clear_error(&mut self) {
        if matches!(self.state, ComposeState::EditingWithError(_)) {
            self.state = ComposeState::Editing;
        }
    }

    /// "n/2000" over the raw input
    pub fn content_counter(&self) -> String {
        format!("{}/{}", self.form.content.chars().count(), CONTENT_MAX_CHARS)
    }

    /// Earliest value the delivery picker should offer
    pub fn min_delivery_time(&self) -> String {
        datetime::min_delivery_time(Utc::now())
    }

    /// The submission gate; stops at the first failing rule
    pub fn check(&self, now: DateTime<Utc>) -> Result<()> {
        let form = &self.form;

        if !validate_required(&form.content) {
            return Err(Error::validation(Field::Content, MSG_CONTENT_REQUIRED));
        }
        if !validate_min_length(&form.content, CONTENT_MIN_CHARS) {
            return Err(Error::validation(Field::Content, MSG_CONTENT_TOO_SHORT));
        }
        if !validate_max_length(&form.content, CONTENT_MAX_CHARS) {
            return Err(Error::validation(Field::Content, MSG_CONTENT_TOO_LONG));
        }
        if !validate_required(&form.email) {
            return Err(Error::validation(Field::Email, MSG_EMAIL_REQUIRED));
        }
        if !validate_email(form.email.trim()) {
            return Err(Error::validation(Field::Email, MSG_EMAIL_INVALID));
        }
        if !validate_required(&form.delivery_time) {
            return Err(Error::validation(Field::DeliveryTime, MSG_TIME_REQUIRED));
        }
        if !validate_delivery_time_at(form.delivery_time.trim(), now) {
            return Err(Error::validation(Field::DeliveryTime, MSG_TIME_TOO_SOON));
        }
        Ok(())
    }

    pub async fn submit(&mut self, session: &mut Session) -> ComposeOutcome {
        self.submit_at(session, Utc::now()).await
    }

    pub async fn submit_at(&mut self, session: &mut Session, now: DateTime<Utc>) -> ComposeOutcome {
        if self.is_submitting() {
            return ComposeOutcome::Busy;
        }

        if let Err(e) = self.check(now) {
            session.notifier.error(e.to_string());
            session.record(LogEvent::new(events::LETTER_CREATE_FAILED).with_page("/compose").with_failure(&e));
            self.state = ComposeState::EditingWithError(e.to_string());
            return ComposeOutcome::Rejected(e);
        }

        let request = CreateLetterRequest {
            content: self.form.content.trim().to_string(),
            delivery_email: self.form.email.trim().to_string(),
            delivery_time: self.form.delivery_time.trim().to_string(),
        };

        let guard = SubmittingGuard::begin(&mut self.state);
        tracing::debug!("submitting letter");

        match self.gateway.create_letter(&request).await {
            Ok(response) => {
                let letter = Letter::scheduled(
                    &response,
                    request.content.clone(),
                    request.delivery_email.clone(),
                    request.delivery_time.clone(),
                );
                session.letters.dispatch(LetterAction::AddLetter(letter.clone()));
                session.letters.dispatch(LetterAction::SetCurrentLetter(Some(letter)));

                if let Err(e) = session
                    .user
                    .dispatch(UserAction::SetEmail(Some(request.delivery_email.clone())))
                {
                    tracing::warn!(error = %e, "failed to remember email");
                }

                let token = session.handoff.put(ConfirmPayload {
                    letter_id: response.letter_id,
                    content: request.content,
                    delivery_email: request.delivery_email,
                    delivery_time: request.delivery_time,
                });
                let route = Route::Confirm(Some(token.to_string()));

                session.notifier.success(CREATE_SUCCESS);
                session.record(LogEvent::new(events::LETTER_CREATED).with_page("/compose"));
                guard.finish(ComposeState::Submitted(route.clone()));
                ComposeOutcome::Navigate(route)
            }
            Err(e) => {
                let message = match &e {
                    Error::Api { .. } => e.to_string(),
                    _ => CREATE_FAILURE.to_string(),
                };
                tracing::debug!(error = %e, "letter creation failed");
                session.notifier.error(message.clone());
                session.record(LogEvent::new(events::LETTER_CREATE_FAILED).with_page("/compose").with_failure(&e));
                guard.finish(ComposeState::EditingWithError(message));
                ComposeOutcome::Failed(e)
            }
        }
    }
}

impl std::fmt::Debug for ComposeWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComposeWorkflow")
            .field("form", &self.form)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
