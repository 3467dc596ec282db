//! Service layer - page workflows and the shell around them
//!
//! Workflows coordinate domain rules, the gateway port and the session
//! stores. Each one backs a single page.

pub mod compose;
pub mod confirm;
pub mod handoff;
pub mod history;
pub mod logging;
mod notifications;
pub mod router;
mod session;

pub use compose::{ComposeForm, ComposeOutcome, ComposeState, ComposeWorkflow};
pub use confirm::{ConfirmOutcome, ConfirmView};
pub use handoff::{ConfirmPayload, HandoffStore, HandoffToken};
pub use history::{HistoryWorkflow, StatusFilter};
pub use logging::{EntryPoint, EventCount, LogEntry, LogEvent, LoggingService};
pub use notifications::{Notice, NoticeLevel, Notifier};
pub use router::{App, Page, Route};
pub use session::Session;
