//! Compose command - schedule a letter without the interactive shell

use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Duration, Local};
use colored::Colorize;
use timeletter_core::domain::datetime::INPUT_FORMAT;
use timeletter_core::services::{ComposeOutcome, ConfirmView, LoggingService, Page, Route};
use timeletter_core::OperationResult;

use super::{get_context, render_notices, with_spinner, Reported};
use crate::output;

pub struct ComposeArgs {
    pub content: Option<String>,
    pub file: Option<PathBuf>,
    pub email: Option<String>,
    pub at: Option<String>,
}

fn read_content(args: &ComposeArgs) -> Result<String> {
    if let Some(content) = &args.content {
        Ok(content.clone())
    } else if let Some(path) = &args.file {
        std::fs::read_to_string(path).with_context(|| format!("Failed to read letter file: {:?}", path))
    } else if atty::isnt(atty::Stream::Stdin) {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read letter from stdin")?;
        Ok(buffer)
    } else {
        anyhow::bail!("No letter text provided. Use --content, --file, or pipe it on stdin.");
    }
}

/// Expand "+30m", "+2h", "+7d" to local input text; anything else passes through
pub fn resolve_delivery_time(value: &str) -> Result<String> {
    let value = value.trim();
    let Some(offset) = value.strip_prefix('+') else {
        return Ok(value.to_string());
    };

    let Some(unit) = offset.chars().last() else {
        anyhow::bail!("Invalid relative time '{}'", value);
    };
    let amount: i64 = offset[..offset.len() - unit.len_utf8()]
        .parse()
        .with_context(|| format!("Invalid relative time '{}'", value))?;
    let delta = match unit {
        'm' => Duration::try_minutes(amount),
        'h' => Duration::try_hours(amount),
        'd' => Duration::try_days(amount),
        _ => anyhow::bail!("Invalid relative time '{}': use m, h or d", value),
    };

    // Whole minutes, rounded up so "+5m" still clears the minimum lead
    let target = delta
        .and_then(|delta| delta.checked_add(&Duration::minutes(1)))
        .and_then(|delta| Local::now().checked_add_signed(delta))
        .with_context(|| format!("Relative time '{}' is too far away", value))?;
    Ok(target.format(INPUT_FORMAT).to_string())
}

pub fn print_confirm(view: &ConfirmView) {
    output::success("Letter scheduled!");
    println!();
    output::field("ID", &view.letter_id);
    output::field("To", &view.delivery_email);
    output::field("Delivery", &view.delivery_time);
    println!();
    println!("{}", view.preview.italic());
    println!();
    println!("{}", "Check on it later with 'tlm history' or 'tlm show <id>'.".dimmed());
}

pub async fn run(args: ComposeArgs, json: bool, logger: Option<Arc<LoggingService>>) -> Result<()> {
    let content = read_content(&args)?;
    let delivery_time = args.at.as_deref().map(resolve_delivery_time).transpose()?;

    let mut app = get_context()?.into_app(logger)?;
    let Page::Compose(mut compose) = app.navigate(Route::Compose).await else {
        anyhow::bail!("Compose page unavailable");
    };

    compose.set_content(content);
    if let Some(email) = args.email {
        compose.set_email(email);
    }
    compose.set_delivery_time(delivery_time.unwrap_or_default());

    let outcome = with_spinner("Scheduling letter...", compose.submit(app.session_mut())).await;

    match outcome {
        ComposeOutcome::Navigate(route) => {
            let Page::Confirm(view) = app.navigate(route).await else {
                anyhow::bail!("Letter was scheduled but its confirmation was lost");
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&OperationResult::ok(view))?);
            } else {
                render_notices(app.session_mut());
                println!();
                print_confirm(&view);
            }
            Ok(())
        }
        ComposeOutcome::Rejected(e) | ComposeOutcome::Failed(e) => {
            if json {
                let result = OperationResult::from(Err::<ConfirmView, _>(e));
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                render_notices(app.session_mut());
            }
            Err(Reported.into())
        }
        ComposeOutcome::Busy => anyhow::bail!("A letter is already being submitted"),
    }
}
