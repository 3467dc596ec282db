//! Show command - fetch one letter's current status

use std::sync::Arc;

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use timeletter_core::domain::datetime::format_date_time;
use timeletter_core::services::{HistoryWorkflow, LoggingService};
use timeletter_core::{Letter, LetterStatus, OperationResult};

use super::{get_context, render_notices, with_spinner, Reported};
use crate::output;

pub async fn run(id: &str, json: bool, logger: Option<Arc<LoggingService>>) -> Result<()> {
    let mut app = get_context()?.into_app(logger)?;
    let mut history = HistoryWorkflow::new(app.gateway());

    let result = with_spinner("Fetching letter...", history.inspect(app.session_mut(), id)).await;

    if json {
        let failed = result.is_err();
        let view = result.map(|letter| StatusView::from(&letter));
        println!("{}", serde_json::to_string_pretty(&OperationResult::from(view))?);
        return if failed { Err(Reported.into()) } else { Ok(()) };
    }

    let letter = match result {
        Ok(letter) => letter,
        Err(_) => {
            render_notices(app.session_mut());
            return Err(Reported.into());
        }
    };

    for (label, value) in detail_fields(&letter) {
        if label == "Status" {
            output::field(label, &status_text(letter.status));
        } else {
            output::field(label, &value);
        }
    }

    Ok(())
}

/// `--json` shape; the title is cut from the letter text, so it stays out
#[derive(Serialize)]
struct StatusView {
    id: String,
    delivery_email: String,
    delivery_time: String,
    status: LetterStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    sent_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_message: Option<String>,
    created_at: String,
}

impl From<&Letter> for StatusView {
    fn from(letter: &Letter) -> Self {
        Self {
            id: letter.id.clone(),
            delivery_email: letter.delivery_email.clone(),
            delivery_time: letter.delivery_time.clone(),
            status: letter.status,
            sent_at: letter.sent_at.clone(),
            error_message: letter.error_message.clone(),
            created_at: letter.created_at.clone(),
        }
    }
}

fn status_text(status: LetterStatus) -> String {
    match status {
        LetterStatus::Scheduled => status.as_str().cyan().to_string(),
        LetterStatus::Sent => status.as_str().green().to_string(),
        LetterStatus::Failed => status.as_str().red().to_string(),
    }
}

/// Rows printed for one letter; delivery facts only, never the letter text
fn detail_fields(letter: &Letter) -> Vec<(&'static str, String)> {
    let mut fields = vec![
        ("ID", letter.id.clone()),
        ("To", letter.delivery_email.clone()),
        ("Status", letter.status.as_str().to_string()),
        ("Delivery", format_date_time(&letter.delivery_time)),
    ];
    if let Some(sent_at) = &letter.sent_at {
        fields.push(("Sent", format_date_time(sent_at)));
    }
    if let Some(error) = &letter.error_message {
        fields.push(("Error", error.clone()));
    }
    if !letter.created_at.is_empty() {
        fields.push(("Created", format_date_time(&letter.created_at)));
    }
    fields
}
