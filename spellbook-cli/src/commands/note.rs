//! Note command handlers
//!
//! Uploads go through short-lived signed URLs handed out by the API, so
//! file bytes never pass through the JSON endpoints.

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use colored::*;
use spellbook_client::SpellbookClient;
use std::path::PathBuf;
use uuid::Uuid;

use crate::config::Config;
use crate::id_resolver::resolve_class_id;

/// Note subcommands
#[derive(Subcommand)]
pub enum NoteCommands {
    /// Upload note files to a class
    Upload {
        /// Class id, id prefix or name
        class: String,

        /// Files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// List the notes of a class
    List {
        /// Class id, id prefix or name
        class: String,

        #[arg(short, long, default_value = "1")]
        page: u32,

        #[arg(short, long, default_value = "10")]
        limit: u32,
    },
    /// Show how many notes have been processed
    Status {
        /// Class id, id prefix or name
        class: String,
    },
    /// Delete a note
    Delete {
        /// Class id, id prefix or name
        class: String,

        /// Note key as shown by `note list`
        key: String,
    },
}

pub async fn handle_note_command(command: NoteCommands, config: &Config) -> Result<()> {
    let client = config.client();

    match command {
        NoteCommands::Upload { class, files } => {
            let class_id = resolve_class_id(&client, &class).await?;
            upload_notes(&client, class_id, &files).await
        }
        NoteCommands::List { class, page, limit } => {
            let class_id = resolve_class_id(&client, &class).await?;
            list_notes(&client, class_id, page, limit).await
        }
        NoteCommands::Status { class } => {
            let class_id = resolve_class_id(&client, &class).await?;
            show_status(&client, class_id).await
        }
        NoteCommands::Delete { class, key } => {
            let class_id = resolve_class_id(&client, &class).await?;
            client.delete_note(class_id, &key).await?;
            println!("{} Deleted note {}", "✓".green(), key.dimmed());
            Ok(())
        }
    }
}

async fn upload_notes(client: &SpellbookClient, class_id: Uuid, files: &[PathBuf]) -> Result<()> {
    let mut contents = Vec::with_capacity(files.len());
    for path in files {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        contents.push((path, bytes));
    }

    let slots = client.request_uploads(class_id, files.len() as u32).await?;
    if slots.len() != contents.len() {
        bail!(
            "Requested {} upload slots but received {}",
            contents.len(),
            slots.len()
        );
    }

    for (slot, (path, bytes)) in slots.iter().zip(contents) {
        client
            .upload_note(&slot.upload_url, bytes)
            .await
            .with_context(|| format!("Failed to upload {}", path.display()))?;
        println!(
            "{} {} {}",
            "✓".green(),
            path.display(),
            format!("({})", slot.key).dimmed()
        );
    }

    println!(
        "{}",
        format!("Uploaded {} note(s)", slots.len()).green().bold()
    );

    Ok(())
}

async fn list_notes(client: &SpellbookClient, class_id: Uuid, page: u32, limit: u32) -> Result<()> {
    let notes = client.list_notes(class_id, page, limit).await?;

    if notes.notes.is_empty() {
        println!("{}", "No notes found".yellow());
        return Ok(());
    }

    println!(
        "{}",
        format!("Notes (page {} of {})", page, notes.total_pages).bold()
    );
    println!("{}", "─".repeat(80).dimmed());
    for note in &notes.notes {
        println!("{} {}", "▸".cyan(), note.key);
        println!("    {}", note.url.dimmed());
    }

    Ok(())
}

async fn show_status(client: &SpellbookClient, class_id: Uuid) -> Result<()> {
    let status = client.processing_status(class_id).await?;

    println!("{}", "Processing Status:".bold());
    println!("  Processed:   {}", status.processed_notes.to_string().green());
    println!(
        "  Unprocessed: {}",
        status.unprocessed_notes.to_string().yellow()
    );
    println!("  Total:       {}", status.total_notes);

    Ok(())
}
