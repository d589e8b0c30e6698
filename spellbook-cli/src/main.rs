//! Spellbook CLI
//!
//! Command-line interface for the Spellbook API: classes, notes and quizzes.

mod commands;
mod config;
mod id_resolver;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;

#[derive(Parser)]
#[command(name = "spellbook")]
#[command(about = "Spellbook notes and quiz CLI", long_about = None)]
struct Cli {
    /// API URL
    #[arg(long, env = "SPELLBOOK_API_URL", default_value = "http://localhost:8080")]
    api_url: String,

    /// User id sent with every request
    #[arg(long, env = "SPELLBOOK_USER")]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config {
        api_url: cli.api_url,
        user: cli.user,
    };

    handle_command(cli.command, &config).await
}
