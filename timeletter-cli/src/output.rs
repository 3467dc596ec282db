//! Output formatting utilities

use chrono::Utc;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, Color, ContentArrangement, Table};
use timeletter_core::domain::datetime::{format_date_time, format_relative_time};
use timeletter_core::services::{Notice, NoticeLevel};
use timeletter_core::{Letter, LetterStatus};

/// Print a success message
pub fn success(msg: &str) {
    println!("{}", msg.green());
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{}", msg.red());
}

/// Print a warning message
pub fn warning(msg: &str) {
    println!("{}", msg.yellow());
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{}", msg.cyan());
}

pub fn notice(notice: &Notice) {
    match notice.level {
        NoticeLevel::Success => success(&notice.message),
        NoticeLevel::Info => info(&notice.message),
        NoticeLevel::Warning => warning(&notice.message),
        NoticeLevel::Error => error(&notice.message),
    }
}

/// Create a styled table
pub fn create_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn status_cell(status: LetterStatus) -> Cell {
    let color = match status {
        LetterStatus::Scheduled => Color::Cyan,
        LetterStatus::Sent => Color::Green,
        LetterStatus::Failed => Color::Red,
    };
    Cell::new(status.as_str()).fg(color)
}

/// First block of a UUID, enough to tell rows apart
pub fn short_id(id: &str) -> &str {
    id.split('-').next().filter(|s| !s.is_empty()).unwrap_or(id)
}

pub fn letters_table(letters: &[&Letter]) -> Table {
    let now = Utc::now();
    let mut table = create_table();
    table.set_header(vec!["ID", "Title", "Delivery", "Status", "Created"]);
    for letter in letters {
        table.add_row(vec![
            Cell::new(short_id(&letter.id)),
            Cell::new(&letter.title),
            Cell::new(format!(
                "{} ({})",
                format_date_time(&letter.delivery_time),
                format_relative_time(&letter.delivery_time, now)
            )),
            status_cell(letter.status),
            Cell::new(format_relative_time(&letter.created_at, now)),
        ]);
    }
    table
}

/// Key/value block used by `show` and the confirm page
pub fn field(label: &str, value: &str) {
    println!("  {:<10} {}", format!("{}:", label).dimmed(), value);
}
