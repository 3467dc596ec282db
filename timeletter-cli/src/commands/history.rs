//! History command - list letters sent to an email

use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;
use timeletter_core::services::history::EMPTY_WITHOUT_EMAIL;
use timeletter_core::services::{LoggingService, Page, Route, StatusFilter};
use timeletter_core::state::UserAction;
use timeletter_core::{Letter, OperationResult};

use super::{get_context, render_notices, with_spinner, Reported};
use crate::output;

#[derive(Serialize)]
struct HistoryOutput<'a> {
    email: Option<&'a str>,
    filter: StatusFilter,
    letters: Vec<&'a Letter>,
}

pub async fn run(
    email: Option<String>,
    status: StatusFilter,
    json: bool,
    logger: Option<Arc<LoggingService>>,
) -> Result<()> {
    let mut app = get_context()?.into_app(logger)?;

    // A new email becomes the identity, so the page mount loads it
    if let Some(email) = email.filter(|e| !e.trim().is_empty()) {
        app.session_mut().user.dispatch(UserAction::SetEmail(Some(email)))?;
    }

    let Page::History(mut history) = with_spinner("Loading letters...", app.navigate(Route::History)).await else {
        anyhow::bail!("History page unavailable");
    };
    history.set_filter(status);

    let failed = app.session().letters.state().error.is_some();
    if json {
        if failed {
            let message = app.session().letters.state().error.clone().unwrap_or_default();
            println!("{}", serde_json::to_string_pretty(&OperationResult::<()>::fail(message))?);
            return Err(Reported.into());
        }
        let payload = HistoryOutput {
            email: history.loaded_for(),
            filter: history.filter(),
            letters: history.visible(app.session()),
        };
        println!("{}", serde_json::to_string_pretty(&OperationResult::ok(payload))?);
        return Ok(());
    }

    if render_notices(app.session_mut()) {
        return Err(Reported.into());
    }

    let Some(email) = history.loaded_for() else {
        output::info(EMPTY_WITHOUT_EMAIL);
        println!("Try: tlm history --email you@example.com");
        return Ok(());
    };

    let visible = history.visible(app.session());
    if visible.is_empty() {
        output::info(&history.empty_message(app.session()));
        return Ok(());
    }

    println!("{}", output::letters_table(&visible));
    println!();
    let total = app.session().letters.state().letters.len();
    if history.filter() == StatusFilter::All {
        println!("{} letter(s) for {}", total, email);
    } else {
        println!("{} of {} letter(s) for {} ({})", visible.len(), total, email, history.filter());
    }

    Ok(())
}
