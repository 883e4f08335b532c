//! `souk` - drive the client core from a terminal.
//!
//! Exercises the same layer the mobile shell embeds: session restore,
//! login/logout, connectivity checks and stored preferences.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "souk", about = "Souk marketplace client core", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Establish a session from an issued token
    Login(commands::LoginArgs),
    /// Clear the stored session
    Logout,
    /// Restore the session and show who is signed in
    Whoami,
    /// Show session, connectivity and preference state
    Status(commands::StatusArgs),
    /// Run the connectivity probes individually
    Doctor,
    /// Read or write app preferences
    Prefs(commands::PrefsArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Login(args) => commands::login(args).await,
        Command::Logout => commands::logout().await,
        Command::Whoami => commands::whoami().await,
        Command::Status(args) => commands::status(args).await,
        Command::Doctor => commands::doctor().await,
        Command::Prefs(args) => commands::prefs(args).await,
    }
}
