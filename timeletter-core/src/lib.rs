//! Time Letter Core - client logic for scheduling letters to the future
//!
//! This crate follows a hexagonal layout:
//!
//! - **domain**: Letters, validation rules and timestamp helpers
//! - **ports**: Trait definitions for external dependencies (LetterGateway, KeyValueStore)
//! - **state**: Session stores with a single dispatch each
//! - **services**: Page workflows, router and event log
//! - **adapters**: Concrete implementations (HTTP client, JSON file store)

pub mod adapters;
pub mod config;
pub mod domain;
mod log_migrations;
pub mod ports;
pub mod services;
pub mod state;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use adapters::file_store::JsonFileStore;
use adapters::http::HttpLetterGateway;
use config::Config;
use services::{App, LoggingService, Session};

pub use domain::result::{Error, OperationResult};
pub use domain::{Letter, LetterStatus};

/// Everything needed to talk to the letter service from one data directory
pub struct TimeLetterContext {
    pub config: Config,
    pub data_dir: PathBuf,
    pub gateway: Arc<HttpLetterGateway>,
    pub storage: Arc<JsonFileStore>,
}

impl TimeLetterContext {
    pub fn new(data_dir: &Path) -> Result<Self> {
        let config = Config::load(data_dir).context("Failed to load settings")?;
        let gateway = HttpLetterGateway::with_timeout(&config.api_base_url, config.request_timeout())?;
        let storage = JsonFileStore::in_dir(data_dir);

        Ok(Self {
            config,
            data_dir: data_dir.to_path_buf(),
            gateway: Arc::new(gateway),
            storage: Arc::new(storage),
        })
    }

    /// Session with the stored identity loaded
    pub fn session(&self, log: Option<Arc<LoggingService>>) -> Result<Session> {
        let mut session = Session::new(self.storage.clone());
        if let Some(log) = log {
            session = session.with_log(log);
        }
        session.restore().context("Failed to read stored identity")?;
        Ok(session)
    }

    pub fn into_app(self, log: Option<Arc<LoggingService>>) -> Result<App> {
        let session = self.session(log)?;
        Ok(App::new(self.config, self.gateway, session))
    }
}
