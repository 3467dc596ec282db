//! Config command - view and change settings.json

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use timeletter_core::adapters::http::API_BASE_URL_ENV;
use timeletter_core::config::{Config, ConfigSource, SETTINGS_FILE};

use super::get_data_dir;
use crate::output;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective settings
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set the letter service base URL
    SetBaseUrl {
        /// e.g. https://letters.example.com
        url: String,
    },
    /// Set the request timeout in seconds (0 removes it)
    SetTimeout {
        secs: u64,
    },
}

pub fn run(command: ConfigCommands) -> Result<()> {
    let data_dir = get_data_dir()?;
    let mut config = Config::load(&data_dir)?;

    match command {
        ConfigCommands::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
                return Ok(());
            }
            let source = match config.base_url_source {
                ConfigSource::Default => "default",
                ConfigSource::File => SETTINGS_FILE,
                ConfigSource::Env => API_BASE_URL_ENV,
            };
            output::field("Base URL", &format!("{} {}", config.api_base_url, format!("({})", source).dimmed()));
            let timeout = config
                .request_timeout_secs
                .map(|secs| format!("{}s", secs))
                .unwrap_or_else(|| "none".to_string());
            output::field("Timeout", &timeout);
            output::field("Settings", &data_dir.join(SETTINGS_FILE).display().to_string());
        }
        ConfigCommands::SetBaseUrl { url } => {
            config.set_base_url(&url)?;
            config.save(&data_dir)?;
            output::success(&format!("Base URL saved to {}", SETTINGS_FILE));
            if config.base_url_source == ConfigSource::Env {
                output::warning(&format!(
                    "{} is set and still overrides it ({})",
                    API_BASE_URL_ENV, config.api_base_url
                ));
            }
        }
        ConfigCommands::SetTimeout { secs } => {
            config.set_request_timeout(Some(secs));
            config.save(&data_dir)?;
            match config.request_timeout_secs {
                Some(secs) => output::success(&format!("Requests now time out after {}s", secs)),
                None => output::success("Request timeout removed"),
            }
        }
    }

    Ok(())
}
