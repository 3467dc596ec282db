//! Configuration management
//!
//! Settings live in `<data dir>/settings.json`:
//! ```json
//! {
//!   "api": { "baseUrl": "http://localhost:8000", "requestTimeoutSecs": 30 },
//!   ...
//! }
//! ```
//! Keys this client does not manage are carried through on save.
//! `TIMELETTER_API_BASE_URL` overrides `api.baseUrl` without touching the file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::adapters::http::{API_BASE_URL_ENV, DEFAULT_BASE_URL};
use crate::domain::result::{Error, Result};

/// File name used inside the data directory
pub const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    api: ApiSettings,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    request_timeout_secs: Option<u64>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// Where the effective base URL came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Env,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub api_base_url: String,
    pub request_timeout_secs: Option<u64>,
    pub base_url_source: ConfigSource,
    #[serde(skip)]
    file_base_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: None,
            base_url_source: ConfigSource::Default,
            file_base_url: None,
        }
    }
}

fn settings_path(data_dir: &Path) -> PathBuf {
    data_dir.join(SETTINGS_FILE)
}

fn read_settings(path: &Path) -> Result<Option<SettingsFile>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(Some(SettingsFile::default()));
    }
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| Error::Config(format!("{} is not valid JSON: {}", path.display(), e)))
}

/// Accept only absolute http(s) URLs; returns the URL without a trailing slash
pub fn normalize_base_url(value: &str) -> Result<String> {
    let trimmed = value.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(Error::Config("API base URL cannot be empty".to_string()));
    }
    let url = Url::parse(trimmed).map_err(|e| Error::Config(format!("Invalid API base URL '{}': {}", trimmed, e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::Config(format!("API base URL must use http or https, got '{}'", url.scheme())));
    }
    Ok(trimmed.to_string())
}

impl Config {
    /// Load from the data directory, applying the environment override
    pub fn load(data_dir: &Path) -> Result<Self> {
        Self::load_with_env(data_dir, std::env::var(API_BASE_URL_ENV).ok())
    }

    pub fn load_with_env(data_dir: &Path, env_base_url: Option<String>) -> Result<Self> {
        let path = settings_path(data_dir);
        let settings = match read_settings(&path) {
            Ok(settings) => settings.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable settings file");
                SettingsFile::default()
            }
        };

        // A bad stored URL falls back to the default so `config set-base-url` can repair it
        let file_base_url = settings
            .api
            .base_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .and_then(|url| match normalize_base_url(url) {
                Ok(url) => Some(url),
                Err(e) => {
                    tracing::warn!(error = %e, "ignoring stored base URL");
                    None
                }
            });

        let mut config = Self {
            request_timeout_secs: settings.api.request_timeout_secs.filter(|secs| *secs > 0),
            file_base_url: file_base_url.clone(),
            ..Self::default()
        };

        if let Some(url) = file_base_url {
            config.api_base_url = url;
            config.base_url_source = ConfigSource::File;
        }

        if let Some(env_url) = env_base_url.filter(|url| !url.trim().is_empty()) {
            config.api_base_url = normalize_base_url(&env_url)?;
            config.base_url_source = ConfigSource::Env;
        }

        Ok(config)
    }

    /// Write managed keys back, leaving everything else in the file as it was
    pub fn save(&self, data_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(data_dir)?;
        let path = settings_path(data_dir);
        // A corrupt file is reported instead of being overwritten
        let mut settings = read_settings(&path)?.unwrap_or_default();

        settings.api.base_url = self.file_base_url.clone();
        settings.api.request_timeout_secs = self.request_timeout_secs;

        std::fs::write(&path, serde_json::to_string_pretty(&settings)?)?;
        Ok(())
    }

    /// Set the persisted base URL; an environment override still wins at runtime
    pub fn set_base_url(&mut self, url: &str) -> Result<()> {
        let url = normalize_base_url(url)?;
        self.file_base_url = Some(url.clone());
        if self.base_url_source != ConfigSource::Env {
            self.api_base_url = url;
            self.base_url_source = ConfigSource::File;
        }
        Ok(())
    }

    pub fn set_request_timeout(&mut self, secs: Option<u64>) {
        self.request_timeout_secs = secs.filter(|s| *s > 0);
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}
