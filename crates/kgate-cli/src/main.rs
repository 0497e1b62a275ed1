mod cli;
mod commands;
mod observability;
mod output;

use anyhow::{Context, Result};
use clap::Parser;

use cli::{Cli, Commands, ConfigCommands};
use output::print_error;

fn main() {
    if let Err(e) = run() {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = kgate_config::load_config(cli.config.as_deref())
        .context("Failed to load kgate configuration")?;

    let level = cli.log_level.as_deref().unwrap_or(&config.logging.level);
    observability::init_tracing_with_level(level);

    match &cli.command {
        Commands::Evaluate(args) => {
            commands::evaluate::run(config, &args.event, args.owner.as_deref())?;
        }
        Commands::Diff(args) => {
            commands::diff::run(&config.diff, &args.old, &args.new)?;
        }
        Commands::Config(args) => match &args.command {
            ConfigCommands::Show => commands::config::show(&config)?,
        },
    }

    Ok(())
}
