//! CLI command implementations

pub mod app;
pub mod compose;
pub mod config;
pub mod health;
pub mod history;
pub mod identity;
pub mod logs;
pub mod show;

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use timeletter_core::services::{EntryPoint, LogEvent, LoggingService, NoticeLevel, Session};
use timeletter_core::TimeLetterContext;

use crate::output;

/// Marker error: the failure was already printed, exit non-zero quietly
#[derive(Debug)]
pub struct Reported;

impl std::fmt::Display for Reported {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("command failed")
    }
}

impl std::error::Error for Reported {}

/// Get the data directory from `TIMELETTER_DIR` or `~/.timeletter`
pub fn get_data_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("TIMELETTER_DIR") {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    dirs::home_dir()
        .map(|home| home.join(".timeletter"))
        .context("Could not find home directory; set TIMELETTER_DIR")
}

/// Event log for this run; `None` if it cannot be opened (never blocks a command)
pub fn get_logger(entry_point: EntryPoint) -> Option<Arc<LoggingService>> {
    let data_dir = get_data_dir().ok()?;
    match LoggingService::new(&data_dir, entry_point, env!("CARGO_PKG_VERSION")) {
        Ok(service) => Some(Arc::new(service)),
        Err(e) => {
            tracing::debug!(error = %e, "event log unavailable");
            None
        }
    }
}

/// Log an event, ignoring any errors
pub fn log_event(logger: &Option<Arc<LoggingService>>, event: LogEvent) {
    if let Some(l) = logger {
        let _ = l.log(event);
    }
}

pub fn get_context() -> Result<TimeLetterContext> {
    let data_dir = get_data_dir()?;
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory: {:?}", data_dir))?;
    TimeLetterContext::new(&data_dir).context("Failed to initialize time letter context")
}

/// Await `future` behind a spinner on stderr (hidden when stderr is not a terminal)
pub async fn with_spinner<F: Future>(message: &str, future: F) -> F::Output {
    if atty::isnt(atty::Stream::Stderr) {
        return future.await;
    }

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));

    let result = future.await;
    spinner.finish_and_clear();
    result
}

/// Print queued notices; returns true if any was an error
pub fn render_notices(session: &mut Session) -> bool {
    let mut had_error = false;
    for notice in session.notifier.drain() {
        had_error |= notice.level == NoticeLevel::Error;
        output::notice(&notice);
    }
    had_error
}
