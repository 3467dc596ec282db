//! Logs command - view and manage the local event log

use anyhow::Result;
use chrono::{Duration, TimeZone, Utc};
use clap::Subcommand;
use colored::Colorize;
use comfy_table::Cell;
use dialoguer::Confirm;
use timeletter_core::services::{EntryPoint, LogEntry, LoggingService};

use super::get_data_dir;
use crate::output;

#[derive(Subcommand)]
pub enum LogsCommands {
    /// Show recent log entries
    List {
        /// Number of entries to show
        #[arg(short, long, default_value = "50")]
        limit: usize,
        /// Show only failures
        #[arg(long)]
        errors: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete log entries
    Clear {
        /// Delete entries older than N days (0 deletes everything)
        #[arg(long, default_value = "30")]
        older_than_days: u32,
        /// Skip confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Per-event totals and the database path
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn get_logging_service() -> Result<LoggingService> {
    let data_dir = get_data_dir()?;
    Ok(LoggingService::new(&data_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION"))?)
}

fn format_timestamp(timestamp_ms: i64) -> String {
    Utc.timestamp_millis_opt(timestamp_ms)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| timestamp_ms.to_string())
}

fn context_of(entry: &LogEntry) -> String {
    let status = entry.http_status.map(|s| format!("HTTP {}", s));
    [entry.command.as_deref(), entry.page.as_deref(), status.as_deref()]
        .iter()
        .filter_map(|&s| s)
        .collect::<Vec<_>>()
        .join(", ")
}

fn list(limit: usize, errors: bool, json: bool) -> Result<()> {
    let service = get_logging_service()?;
    let entries = if errors { service.get_errors(limit)? } else { service.get_recent(limit)? };

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No log entries found.");
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["Time", "Entry", "Event", "Context", "Error"]);
    for entry in &entries {
        let marker = if entry.error_message.is_some() { "!".red().to_string() } else { String::new() };
        table.add_row(vec![
            Cell::new(format_timestamp(entry.timestamp)),
            Cell::new(&entry.entry_point),
            Cell::new(&entry.event),
            Cell::new(context_of(entry)),
            Cell::new(marker),
        ]);
    }
    println!("{}", table);

    if !errors {
        let failures: Vec<_> = entries.iter().filter(|e| e.error_message.is_some()).take(3).collect();
        if !failures.is_empty() {
            println!();
            println!("{}", "Recent Errors:".red().bold());
            for entry in failures {
                println!(
                    "  {} [{}]: {}",
                    format_timestamp(entry.timestamp).dimmed(),
                    entry.event,
                    entry.error_message.as_deref().unwrap_or("Unknown error")
                );
            }
        }
    }
    Ok(())
}

fn clear(older_than_days: u32, force: bool, json: bool) -> Result<()> {
    let service = get_logging_service()?;

    if !force && !json {
        let prompt = if older_than_days == 0 {
            "Delete all log entries?".to_string()
        } else {
            format!("Delete log entries older than {} days?", older_than_days)
        };
        if !Confirm::new().with_prompt(prompt).default(false).interact()? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let deleted = if older_than_days == 0 {
        service.clear()?
    } else {
        let cutoff = Utc::now() - Duration::days(i64::from(older_than_days));
        service.delete_before(cutoff.timestamp_millis())?
    };

    if json {
        println!("{}", serde_json::json!({ "deleted": deleted }));
    } else {
        output::success(&format!("Deleted {} log entries", deleted));
    }
    Ok(())
}

fn stats(json: bool) -> Result<()> {
    let service = get_logging_service()?;
    let total = service.count()?;
    let by_event = service.stats()?;
    let db_path = service.db_path().to_path_buf();
    let size_bytes = std::fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "total_entries": total,
                "events": by_event,
                "database_path": db_path.to_string_lossy(),
                "database_size_bytes": size_bytes
            }))?
        );
        return Ok(());
    }

    println!("{}", "Log Statistics".bold());
    println!("  Total entries: {}", total);
    println!("  Database: {}", db_path.display());
    println!("  Size: {} bytes", size_bytes);

    if !by_event.is_empty() {
        println!();
        let mut table = output::create_table();
        table.set_header(vec!["Event", "Count", "Errors"]);
        for row in by_event {
            let errors = if row.errors > 0 {
                Cell::new(row.errors).fg(comfy_table::Color::Red)
            } else {
                Cell::new(row.errors)
            };
            table.add_row(vec![Cell::new(row.event), Cell::new(row.count), errors]);
        }
        println!("{}", table);
    }
    Ok(())
}

pub fn run(command: LogsCommands) -> Result<()> {
    match command {
        LogsCommands::List { limit, errors, json } => list(limit, errors, json),
        LogsCommands::Clear { older_than_days, force, json } => clear(older_than_days, force, json),
        LogsCommands::Stats { json } => stats(json),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> LogEntry {
        LogEntry {
            id: 1,
            timestamp: 0,
            entry_point: "cli".into(),
            app_version: "0.1.0".into(),
            platform: "linux".into(),
            event: "letter_create_failed".into(),
            page: Some("compose".into()),
            command: Some("compose".into()),
            http_status: Some(400),
            error_message: Some("HTTP 400".into()),
        }
    }

    #[test]
    fn test_context_joins_present_parts() {
        assert_eq!(context_of(&entry()), "compose, compose, HTTP 400");

        let bare = LogEntry { page: None, http_status: None, ..entry() };
        assert_eq!(context_of(&bare), "compose");
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0), "1970-01-01 00:00:00");
    }
}
