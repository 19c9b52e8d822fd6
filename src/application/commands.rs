//! CLI commands and handlers
use clap::{Parser, Subcommand};

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "goldwatch")]
#[command(version, about = "Gold price tracker with mail alerts, WebSocket push and CSV/JSON export")]
pub struct Cli {
    /// Path to config file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Log level filter (overrides config; RUST_LOG wins over both)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Run the scheduler and the HTTP server (default)
    Serve {
        /// Address to bind the HTTP server to
        #[arg(long)]
        bind: Option<String>,

        /// Seconds between scheduled price checks
        #[arg(long)]
        interval_secs: Option<u64>,

        /// Wait one period before the first check
        #[arg(long)]
        no_run_on_start: bool,

        /// Log alerts instead of sending mail
        #[arg(long)]
        dry_run: bool,
    },

    /// Fetch the price once and print it as JSON
    Check,
}

impl Default for Commands {
    fn default() -> Self {
        Commands::Serve {
            bind: None,
            interval_secs: None,
            no_run_on_start: false,
            dry_run: false,
        }
    }
}

impl Cli {
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or_default()
    }

    /// CLI args > config file > defaults
    pub fn apply_overrides(&self, cfg: &mut Config) {
        if let Some(level) = &self.log_level {
            cfg.logging.level = level.clone();
        }

        if let Some(Commands::Serve {
            bind,
            interval_secs,
            no_run_on_start,
            dry_run,
        }) = &self.command
        {
            if let Some(bind) = bind {
                cfg.server.bind = bind.clone();
            }
            if let Some(interval_secs) = interval_secs {
                cfg.tracker.interval_secs = *interval_secs;
            }
            if *no_run_on_start {
                cfg.tracker.run_on_start = false;
            }
            if *dry_run {
                cfg.notify.dry_run = true;
            }
        }
    }
}
