//! App command - walk the pages interactively
//!
//! Landing, compose, confirm and history behave as they do in the browser:
//! compose hands off to confirm through a one-time token, and history loads
//! the remembered email on entry.

use std::sync::Arc;

use anyhow::Result;
use colored::Colorize;
use dialoguer::{Input, Select};
use timeletter_core::domain::datetime::format_date_time;
use timeletter_core::services::{
    App, ComposeOutcome, ComposeWorkflow, HistoryWorkflow, LoggingService, Page,
    Route, StatusFilter,
};

use super::compose::{print_confirm, resolve_delivery_time};
use super::{get_context, render_notices, with_spinner};
use crate::output;

pub async fn run(logger: Option<Arc<LoggingService>>) -> Result<()> {
    let mut app = get_context()?.into_app(logger)?;
    let mut page = app.navigate(Route::Landing).await;

    loop {
        render_notices(app.session_mut());
        let next = match page {
            Page::Landing => landing(&app)?,
            Page::Compose(compose) => compose_page(&mut app, compose).await?,
            Page::Confirm(view) => {
                println!();
                print_confirm(&view);
                println!();
                pick(&["Write another letter", "View my letters", "Home"], &[
                    Some(Route::Compose),
                    Some(Route::History),
                    Some(Route::Landing),
                ])?
            }
            Page::History(history) => history_page(&mut app, history).await?,
        };

        let Some(route) = next else {
            return Ok(());
        };
        page = with_spinner("Loading...", app.navigate(route)).await;
    }
}

/// Prompt with `items`; the chosen index maps into `routes` (`None` quits)
fn pick(items: &[&str], routes: &[Option<Route>]) -> Result<Option<Route>> {
    let choice = Select::new()
        .with_prompt("Where to?")
        .items(items)
        .default(0)
        .interact()?;
    Ok(routes.get(choice).cloned().flatten())
}

fn landing(app: &App) -> Result<Option<Route>> {
    println!();
    println!("{}", "Time Letter".bold());
    println!("Write a letter today. It arrives in your inbox when you choose.");
    if let Some(email) = app.session().user.email() {
        println!("{}", format!("Signed in as {}", email).dimmed());
    }
    println!();
    pick(&["Write a letter", "View my letters", "Quit"], &[
        Some(Route::Compose),
        Some(Route::History),
        None,
    ])
}

fn prompt(label: &str, initial: &str) -> Result<String> {
    Ok(Input::<String>::new()
        .with_prompt(label)
        .with_initial_text(initial)
        .allow_empty(true)
        .interact_text()?)
}

async fn compose_page(app: &mut App, mut compose: ComposeWorkflow) -> Result<Option<Route>> {
    loop {
        println!();
        println!("{}", "Write to your future self".bold());

        let content = prompt("Letter", &compose.form().content)?;
        compose.set_content(content);
        println!("{}", compose.content_counter().dimmed());

        let email = prompt("Deliver to", &compose.form().email)?;
        compose.set_email(email);

        let earliest = compose.min_delivery_time();
        let current = compose.form().delivery_time.clone();
        let initial = if current.is_empty() { earliest.clone() } else { current };
        let at = prompt(&format!("Deliver at (earliest {}, or +2h / +7d)", earliest), &initial)?;
        match resolve_delivery_time(&at) {
            Ok(resolved) => compose.set_delivery_time(resolved),
            Err(e) => {
                output::warning(&format!("{:#}", e));
                compose.set_delivery_time(at);
            }
        }

        let outcome = with_spinner("Scheduling letter...", compose.submit(app.session_mut())).await;
        match outcome {
            ComposeOutcome::Navigate(route) => return Ok(Some(route)),
            ComposeOutcome::Busy => continue,
            ComposeOutcome::Rejected(_) | ComposeOutcome::Failed(_) => {
                render_notices(app.session_mut());
                let choice = Select::new()
                    .with_prompt("What now?")
                    .items(&["Edit and try again", "Home"])
                    .default(0)
                    .interact()?;
                if choice == 1 {
                    return Ok(Some(Route::Landing));
                }
            }
        }
    }
}

fn print_history(app: &App, history: &HistoryWorkflow) {
    println!();
    let title = match history.loaded_for() {
        Some(email) => format!("Letters for {}", email),
        None => "My letters".to_string(),
    };
    println!("{} {}", title.bold(), format!("[{}]", history.filter()).dimmed());

    let visible = history.visible(app.session());
    if visible.is_empty() {
        output::info(&history.empty_message(app.session()));
    } else {
        println!("{}", output::letters_table(&visible));
    }
}

async fn history_page(app: &mut App, mut history: HistoryWorkflow) -> Result<Option<Route>> {
    loop {
        render_notices(app.session_mut());
        print_history(app, &history);

        let has_letters = !history.visible(app.session()).is_empty();
        let mut items = vec!["Look up an email", "Filter by status", "Refresh"];
        if has_letters {
            items.push("Inspect a letter");
        }
        items.extend(["Write a letter", "Home", "Quit"]);

        let choice = Select::new().with_prompt("What now?").items(&items).default(0).interact()?;
        match items[choice] {
            "Look up an email" => {
                let current = history.loaded_for().unwrap_or_default().to_string();
                let email = prompt("Email", &current)?;
                with_spinner("Loading letters...", history.submit_email(app.session_mut(), &email)).await?;
            }
            "Filter by status" => {
                let labels: Vec<&str> = StatusFilter::ALL.iter().map(StatusFilter::as_str).collect();
                let current = StatusFilter::ALL
                    .iter()
                    .position(|f| *f == history.filter())
                    .unwrap_or(0);
                let pick = Select::new()
                    .with_prompt("Status")
                    .items(&labels)
                    .default(current)
                    .interact()?;
                history.set_filter(StatusFilter::ALL[pick]);
            }
            "Refresh" => {
                with_spinner("Loading letters...", history.refresh(app.session_mut())).await;
            }
            "Inspect a letter" => inspect(app, &mut history).await?,
            "Write a letter" => return Ok(Some(Route::Compose)),
            "Home" => return Ok(Some(Route::Landing)),
            _ => return Ok(None),
        }
    }
}

async fn inspect(app: &mut App, history: &mut HistoryWorkflow) -> Result<()> {
    let (ids, labels): (Vec<String>, Vec<String>) = history
        .visible(app.session())
        .iter()
        .map(|letter| {
            (
                letter.id.clone(),
                format!("{}  {}  {}", output::short_id(&letter.id), letter.status.as_str(), letter.title),
            )
        })
        .unzip();

    let choice = Select::new()
        .with_prompt("Letter")
        .items(&labels)
        .default(0)
        .interact()?;
    let Some(id) = ids.get(choice) else {
        return Ok(());
    };

    if let Ok(letter) = with_spinner("Fetching letter...", history.inspect(app.session_mut(), id)).await {
        println!();
        output::field("ID", &letter.id);
        output::field("Status", letter.status.as_str());
        output::field("Delivery", &format_date_time(&letter.delivery_time));
        if let Some(sent_at) = &letter.sent_at {
            output::field("Sent", &format_date_time(sent_at));
        }
        if let Some(error) = &letter.error_message {
            output::field("Error", error);
        }
    }
    Ok(())
}
