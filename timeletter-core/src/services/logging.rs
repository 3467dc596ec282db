//! Structured event log in `logs.duckdb`
//!
//! Records what happened (page opened, letter created, history load failed)
//! without recording who or what was written: no letter content and no
//! email addresses ever reach this table.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, Result};
use chrono::Utc;
use duckdb::Connection;
use serde::{Deserialize, Serialize};

use crate::domain::result::Error;
use crate::log_migrations::LOG_MIGRATIONS;

/// File name used inside the data directory
pub const LOG_DB_FILE: &str = "logs.duckdb";

const BOOTSTRAP_MIGRATION: &str = "000_migrations.sql";

static ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Millisecond timestamp in the high bits, per-process counter in the low 16
fn generate_id() -> u64 {
    let millis = Utc::now().timestamp_millis().max(0) as u64;
    let counter = ID_COUNTER.fetch_add(1, Ordering::Relaxed) & 0xFFFF;
    (millis << 16) | counter
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

fn detect_platform() -> &'static str {
    if cfg!(target_os = "macos") {
        "macos"
    } else if cfg!(target_os = "windows") {
        "windows"
    } else if cfg!(target_os = "linux") {
        "linux"
    } else {
        "unknown"
    }
}

/// How the client was started
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryPoint {
    /// One-shot subcommand
    Cli,
    /// `tlm app`
    Interactive,
}

impl EntryPoint {
    fn as_str(&self) -> &'static str {
        match self {
            EntryPoint::Cli => "cli",
            EntryPoint::Interactive => "interactive",
        }
    }
}

/// Event names written by the workflows
pub mod events {
    pub const PAGE_OPENED: &str = "page_opened";
    pub const COMMAND_EXECUTED: &str = "command_executed";
    pub const LETTER_CREATED: &str = "letter_created";
    pub const LETTER_CREATE_FAILED: &str = "letter_create_failed";
    pub const HISTORY_LOADED: &str = "history_loaded";
    pub const HISTORY_LOAD_FAILED: &str = "history_load_failed";
    pub const LETTER_INSPECTED: &str = "letter_inspected";
    pub const CONFIRM_REDIRECTED: &str = "confirm_redirected";
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    pub event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl LogEvent {
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            page: None,
            command: None,
            http_status: None,
            error_message: None,
        }
    }

    pub fn with_page(mut self, page: impl Into<String>) -> Self {
        self.page = Some(page.into());
        self
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    /// Attach a failure: its HTTP status, and a message safe to keep.
    ///
    /// Server messages can echo user input, so API errors only keep the status.
    pub fn with_failure(mut self, error: &Error) -> Self {
        self.http_status = error.status();
        self.error_message = Some(match error {
            Error::Validation { field, .. } => format!("validation failed: {}", field),
            Error::Api { status, .. } => format!("HTTP {}", status),
            Error::Network(_) => "network error".to_string(),
            Error::InvalidResponse(_) => "invalid response".to_string(),
            other => other.to_string(),
        });
        self
    }
}

/// A row of `sys_logs`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: u64,
    pub timestamp: i64,
    pub entry_point: String,
    pub app_version: String,
    pub platform: String,
    pub event: String,
    pub page: Option<String>,
    pub command: Option<String>,
    pub http_status: Option<i32>,
    pub error_message: Option<String>,
}

/// Per-event totals for `tlm logs stats`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventCount {
    pub event: String,
    pub count: i64,
    pub errors: i64,
}

const ENTRY_COLUMNS: &str = "id, timestamp, entry_point, app_version, platform, \
                             event, page, command, http_status, error_message";

fn entry_from_row(row: &duckdb::Row<'_>) -> duckdb::Result<LogEntry> {
    Ok(LogEntry {
        id: row.get(0)?,
        timestamp: row.get(1)?,
        entry_point: row.get(2)?,
        app_version: row.get(3)?,
        platform: row.get(4)?,
        event: row.get(5)?,
        page: row.get(6)?,
        command: row.get(7)?,
        http_status: row.get(8)?,
        error_message: row.get(9)?,
    })
}

pub struct LoggingService {
    conn: Mutex<Connection>,
    db_path: PathBuf,
    entry_point: EntryPoint,
    app_version: String,
    platform: &'static str,
}

impl LoggingService {
    /// Open (or create) `logs.duckdb` in `data_dir` and apply pending migrations
    pub fn new(data_dir: &Path, entry_point: EntryPoint, app_version: impl Into<String>) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;
        let db_path = data_dir.join(LOG_DB_FILE);
        let conn = Connection::open(&db_path)?;

        let service = Self {
            conn: Mutex::new(conn),
            db_path,
            entry_point,
            app_version: app_version.into(),
            platform: detect_platform(),
        };
        service.run_migrations()?;

        Ok(service)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| anyhow!("Lock poisoned: {}", e))
    }

    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;

        let bootstrapped: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM information_schema.tables WHERE table_name = 'sys_migrations'",
                [],
                |row| row.get(0),
            )
            .unwrap_or(false);

        if !bootstrapped {
            if let Some((name, sql)) = LOG_MIGRATIONS.iter().find(|(n, _)| *n == BOOTSTRAP_MIGRATION) {
                conn.execute_batch(sql)?;
                conn.execute("INSERT INTO sys_migrations (migration_name) VALUES (?)", [name])?;
            }
        }

        let mut stmt = conn.prepare("SELECT migration_name FROM sys_migrations")?;
        let applied: Vec<String> = stmt
            .query_map([], |row| row.get(0))?
            .filter_map(|r| r.ok())
            .collect();

        for (name, sql) in LOG_MIGRATIONS.iter().filter(|(n, _)| *n != BOOTSTRAP_MIGRATION) {
            if applied.iter().any(|a| a == *name) {
                continue;
            }
            tracing::debug!(migration = *name, "applying log migration");
            conn.execute_batch(sql)?;
            conn.execute("INSERT INTO sys_migrations (migration_name) VALUES (?)", [name])?;
        }

        Ok(())
    }

    /// Record an event; entry point, version and platform are filled in here
    pub fn log(&self, event: LogEvent) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            &format!(
                "INSERT INTO sys_logs ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                ENTRY_COLUMNS
            ),
            duckdb::params![
                generate_id(),
                now_ms(),
                self.entry_point.as_str(),
                &self.app_version,
                self.platform,
                &event.event,
                &event.page,
                &event.command,
                event.http_status.map(i32::from),
                &event.error_message,
            ],
        )?;
        Ok(())
    }

    pub fn log_command(&self, command: &str) -> Result<()> {
        self.log(LogEvent::new(events::COMMAND_EXECUTED).with_command(command))
    }

    pub fn log_page(&self, page: &str) -> Result<()> {
        self.log(LogEvent::new(events::PAGE_OPENED).with_page(page))
    }

    /// Most recent entries first
    pub fn get_recent(&self, limit: usize) -> Result<Vec<LogEntry>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM sys_logs ORDER BY timestamp DESC, id DESC LIMIT ?",
            ENTRY_COLUMNS
        ))?;
        let entries = stmt
            .query_map([limit as i64], entry_from_row)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(entries)
    }

    /// Most recent entries that carry an error
    pub fn get_errors(&self, limit: usize) -> Result<Vec<LogEntry>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM sys_logs WHERE error_message IS NOT NULL \
             ORDER BY timestamp DESC, id DESC LIMIT ?",
            ENTRY_COLUMNS
        ))?;
        let entries = stmt
            .query_map([limit as i64], entry_from_row)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(entries)
    }

    pub fn count(&self) -> Result<u64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM sys_logs", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    pub fn stats(&self) -> Result<Vec<EventCount>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT event,
                   COUNT(*) AS total,
                   COUNT(error_message) AS errors
            FROM sys_logs
            GROUP BY event
            ORDER BY total DESC, event
            "#,
        )?;
        let stats = stmt
            .query_map([], |row| {
                Ok(EventCount {
                    event: row.get(0)?,
                    count: row.get(1)?,
                    errors: row.get(2)?,
                })
            })?
            .filter_map(|r| r.ok())
            .collect();
        Ok(stats)
    }

    /// Delete entries older than `timestamp_ms` (unix millis)
    pub fn delete_before(&self, timestamp_ms: i64) -> Result<u64> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM sys_logs WHERE timestamp < ?", [timestamp_ms])?;
        Ok(deleted as u64)
    }

    pub fn clear(&self) -> Result<u64> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM sys_logs", [])?;
        Ok(deleted as u64)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}

impl std::fmt::Debug for LoggingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggingService")
            .field("db_path", &self.db_path)
            .field("entry_point", &self.entry_point)
            .finish_non_exhaustive()
    }
}
