//! Confirm page: shows what compose just scheduled
//!
//! The page has no data of its own. It takes the handoff entry once; with no
//! entry it sends the user back to the landing page.

use serde::Serialize;

use crate::domain::datetime::format_date_time;
use crate::domain::validation::{get_content_preview, DEFAULT_PREVIEW_CHARS};

use super::handoff::{ConfirmPayload, HandoffStore, HandoffToken};
use super::router::Route;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmView {
    pub letter_id: String,
    pub preview: String,
    pub delivery_email: String,
    /// Local display form of the delivery time
    pub delivery_time: String,
}

impl From<ConfirmPayload> for ConfirmView {
    fn from(payload: ConfirmPayload) -> Self {
        Self {
            letter_id: payload.letter_id,
            preview: get_content_preview(&payload.content, DEFAULT_PREVIEW_CHARS),
            delivery_email: payload.delivery_email,
            delivery_time: format_date_time(&payload.delivery_time),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmOutcome {
    Show(ConfirmView),
    Redirect(Route),
}

pub fn open(token: Option<&str>, handoff: &mut HandoffStore) -> ConfirmOutcome {
    let payload = token
        .map(HandoffToken::from)
        .and_then(|token| handoff.take(&token));

    match payload {
        Some(payload) => ConfirmOutcome::Show(payload.into()),
        None => {
            tracing::debug!(has_token = token.is_some(), "no confirm payload, redirecting");
            ConfirmOutcome::Redirect(Route::Landing)
        }
    }
}
