use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "kgate")]
#[command(about = "kgate: replay watch events through reconcile-trigger predicates")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the kgate TOML config (defaults to ./kgate.toml if present)
    #[arg(short, long, global = true, env = "KGATE_CONFIG")]
    pub config: Option<String>,

    /// Log level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Decide whether a captured watch event triggers a reconcile
    Evaluate(EvaluateArgs),
    /// Show the normalized diff between two object snapshots
    Diff(DiffArgs),
    /// Inspect the effective configuration
    Config(ConfigArgs),
}

#[derive(clap::Args)]
pub struct EvaluateArgs {
    /// Path to a watch event JSON file
    #[arg(short, long)]
    pub event: String,
    /// Evaluate as a secondary object owned by this primary kind
    #[arg(short, long)]
    pub owner: Option<String>,
}

#[derive(clap::Args)]
pub struct DiffArgs {
    /// Old object snapshot (JSON)
    pub old: String,
    /// New object snapshot (JSON)
    pub new: String,
}

#[derive(clap::Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration as TOML
    Show,
}
