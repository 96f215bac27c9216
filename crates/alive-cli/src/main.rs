use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "alive-cli", version, about = "Alive dead man's switch CLI")]
struct Cli {
    /// Evaluate as if the current time were this RFC 3339 instant
    #[arg(long, global = true, hide = true)]
    now: Option<DateTime<Utc>>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check in and push the deadline 48 hours forward
    Checkin,
    /// Show liveness status and the pending deadline
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Name, emergency contact and API key
    Settings {
        #[command(subcommand)]
        action: commands::settings::SettingsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("ALIVE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_logging();

    let cli = Cli::parse();
    let now = cli.now.unwrap_or_else(Utc::now);
    let result = match cli.command {
        Commands::Checkin => commands::checkin::run(now),
        Commands::Status { json } => commands::status::run(now, json),
        Commands::Settings { action } => commands::settings::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
