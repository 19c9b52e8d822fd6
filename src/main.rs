use anyhow::Result;
use clap::Parser;

use goldwatch::app;
use goldwatch::application::{Cli, Commands};
use goldwatch::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load base configuration from file if provided
    let mut cfg = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    cli.apply_overrides(&mut cfg);

    app::init_logging(&cfg.logging);

    match cli.command() {
        Commands::Serve { .. } => app::run(cfg).await,
        Commands::Check => app::check(cfg).await,
    }
}
