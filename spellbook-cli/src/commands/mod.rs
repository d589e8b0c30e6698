//! Command definitions and dispatch

mod class;
mod note;
mod quiz;

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;
pub use class::ClassCommands;
pub use note::NoteCommands;
pub use quiz::QuizCommands;

/// Top-level commands
#[derive(Subcommand)]
pub enum Commands {
    /// Manage classes
    Class {
        #[command(subcommand)]
        command: ClassCommands,
    },
    /// Upload and browse notes
    Note {
        #[command(subcommand)]
        command: NoteCommands,
    },
    /// Generate, take and review quizzes
    Quiz {
        #[command(subcommand)]
        command: QuizCommands,
    },
}

/// Dispatch a parsed command to its handler
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Class { command } => class::handle_class_command(command, config).await,
        Commands::Note { command } => note::handle_note_command(command, config).await,
        Commands::Quiz { command } => quiz::handle_quiz_command(command, config).await,
    }
}
