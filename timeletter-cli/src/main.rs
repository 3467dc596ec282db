//! Time Letter CLI - write to your future self from the terminal

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod output;

use commands::{app, compose, config, health, history, identity, logs, show};
use timeletter_core::services::logging::events;
use timeletter_core::services::{EntryPoint, LogEvent, StatusFilter};

/// tlm - schedule letters to your future self
#[derive(Parser)]
#[command(name = "tlm", version, about, long_about = None)]
struct Cli {
    /// Diagnostic output on stderr (-v debug, -vv trace); RUST_LOG wins when set
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Schedule a new letter
    Compose {
        /// Letter text
        #[arg(long, conflicts_with = "file")]
        content: Option<String>,
        /// Read the letter text from a file
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Recipient (defaults to the remembered email)
        #[arg(long)]
        email: Option<String>,
        /// Delivery time: "YYYY-MM-DDTHH:MM" local, RFC 3339, or "+30m" / "+2h" / "+7d"
        #[arg(long)]
        at: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List letters sent to an email
    History {
        /// Email to look up (remembered for next time)
        #[arg(long)]
        email: Option<String>,
        /// Only show letters with this status (all, scheduled, sent, failed)
        #[arg(long, default_value = "all")]
        status: StatusFilter,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the current status of one letter
    Show {
        /// Letter ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the remembered email
    Whoami {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Forget the remembered email
    Logout,

    /// Check that the letter service is reachable
    Health {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// View or change settings
    Config {
        #[command(subcommand)]
        command: config::ConfigCommands,
    },

    /// View and manage the event log
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },

    /// Interactive mode: walk through the pages with prompts
    App,
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Compose { .. } => "compose",
            Commands::History { .. } => "history",
            Commands::Show { .. } => "show",
            Commands::Whoami { .. } => "whoami",
            Commands::Logout => "logout",
            Commands::Health { .. } => "health",
            Commands::Config { .. } => "config",
            Commands::Logs { .. } => "logs",
            Commands::App => "app",
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Already shown to the user by the command itself
            if !e.is::<commands::Reported>() {
                output::error(&format!("{:#}", e));
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let entry_point = match cli.command {
        Commands::App => EntryPoint::Interactive,
        _ => EntryPoint::Cli,
    };
    let logger = commands::get_logger(entry_point);
    commands::log_event(
        &logger,
        LogEvent::new(events::COMMAND_EXECUTED).with_command(cli.command.name()),
    );

    match cli.command {
        Commands::Compose { content, file, email, at, json } => {
            let args = compose::ComposeArgs { content, file, email, at };
            compose::run(args, json, logger).await
        }
        Commands::History { email, status, json } => history::run(email, status, json, logger).await,
        Commands::Show { id, json } => show::run(&id, json, logger).await,
        Commands::Whoami { json } => identity::whoami(json),
        Commands::Logout => identity::logout(),
        Commands::Health { json } => health::run(json).await,
        Commands::Config { command } => config::run(command),
        Commands::Logs { command } => logs::run(command),
        Commands::App => app::run(logger).await,
    }
}
