use std::sync::Arc;

use crate::domain::result::Result;
use crate::ports::KeyValueStore;
use crate::state::{LetterStore, UserAction, UserStore};

use super::handoff::HandoffStore;
use super::logging::{LogEvent, LoggingService};
use super::notifications::Notifier;

/// Everything a page workflow reads or writes besides the gateway
#[derive(Debug)]
pub struct Session {
    pub letters: LetterStore,
    pub user: UserStore,
    pub handoff: HandoffStore,
    pub notifier: Notifier,
    log: Option<Arc<LoggingService>>,
}

impl Session {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            letters: LetterStore::new(),
            user: UserStore::new(storage),
            handoff: HandoffStore::new(),
            notifier: Notifier::new(),
            log: None,
        }
    }

    pub fn with_log(mut self, log: Arc<LoggingService>) -> Self {
        self.log = Some(log);
        self
    }

    /// Pick up the identity left by a previous run
    pub fn restore(&mut self) -> Result<()> {
        self.user.dispatch(UserAction::LoadStored)
    }

    pub fn log(&self) -> Option<&Arc<LoggingService>> {
        self.log.as_ref()
    }

    /// Write to the event log; a failing log never fails the caller
    pub fn record(&self, event: LogEvent) {
        if let Some(log) = &self.log {
            if let Err(e) = log.log(event) {
                tracing::warn!(error = %e, "failed to write event log");
            }
        }
    }
}
