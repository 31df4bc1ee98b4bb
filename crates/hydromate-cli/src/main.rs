use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod platform;

#[derive(Parser)]
#[command(name = "hydromate-cli", version, about = "Hydromate CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log and inspect water intake
    Intake {
        #[command(subcommand)]
        action: commands::intake::IntakeAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Shake gesture tools
    Shake {
        #[command(subcommand)]
        action: commands::shake::ShakeAction,
    },
    /// Reminder schedule and task handler
    Reminder {
        #[command(subcommand)]
        action: commands::reminder::ReminderAction,
    },
    /// Run the reminder coordinator and motion listener until interrupted
    Watch(commands::watch::WatchArgs),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Intake { action } => commands::intake::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Shake { action } => commands::shake::run(action).await,
        Commands::Reminder { action } => commands::reminder::run(action),
        Commands::Watch(args) => commands::watch::run(args).await,
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
