//! Class command handlers

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use spellbook_client::SpellbookClient;
use spellbook_core::domain::class::ClassSummary;

use crate::config::Config;
use crate::id_resolver::resolve_class_id;

/// Class subcommands
#[derive(Subcommand)]
pub enum ClassCommands {
    /// Create a new class
    Create {
        /// Class name
        name: String,
    },
    /// List your classes, newest first
    List {
        #[arg(short, long, default_value = "1")]
        page: u32,

        #[arg(short, long, default_value = "10")]
        limit: u32,
    },
    /// Show one class with its note and score totals
    Show {
        /// Class id, id prefix or name
        class: String,
    },
    /// Show recorded quiz scores for a class
    Scores {
        /// Class id, id prefix or name
        class: String,
    },
}

pub async fn handle_class_command(command: ClassCommands, config: &Config) -> Result<()> {
    let client = config.client();

    match command {
        ClassCommands::Create { name } => create_class(&client, &name).await,
        ClassCommands::List { page, limit } => list_classes(&client, page, limit).await,
        ClassCommands::Show { class } => {
            let class_id = resolve_class_id(&client, &class).await?;
            let summary = client.get_class(class_id).await?;
            print_class_summary(&summary);
            Ok(())
        }
        ClassCommands::Scores { class } => {
            let class_id = resolve_class_id(&client, &class).await?;
            show_scores(&client, class_id).await
        }
    }
}

async fn create_class(client: &SpellbookClient, name: &str) -> Result<()> {
    let class = client.create_class(name).await?;

    println!("{}", "✓ Class created".green().bold());
    println!("  ID:   {}", class.id.to_string().cyan());
    println!("  Name: {}", class.name);

    Ok(())
}

async fn list_classes(client: &SpellbookClient, page: u32, limit: u32) -> Result<()> {
    let listing = client.list_classes(page, limit).await?;

    if listing.classes.is_empty() {
        if listing.total == 0 {
            println!("{}", "No classes found".yellow());
        } else {
            println!("{}", format!("No classes on page {}", page).yellow());
        }
        return Ok(());
    }

    let pages = listing.total.div_ceil(u64::from(limit.max(1)));
    println!(
        "{}",
        format!("Classes ({} total, page {} of {})", listing.total, page, pages).bold()
    );
    println!("{}", "─".repeat(60).dimmed());
    for summary in &listing.classes {
        print_class_summary(summary);
    }

    Ok(())
}

async fn show_scores(client: &SpellbookClient, class_id: uuid::Uuid) -> Result<()> {
    let scores = client.class_scores(class_id).await?;

    if scores.is_empty() {
        println!("{}", "No scores recorded for this class".yellow());
        return Ok(());
    }

    println!("{}", format!("Scores ({})", scores.len()).bold());
    println!("{}", "─".repeat(60).dimmed());
    for score in &scores {
        println!(
            "{} {:>6.1}  {}  {}",
            "▸".cyan(),
            score.score,
            score.job_id.to_string().dimmed(),
            score
                .created_at
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
                .dimmed()
        );
    }

    let average = scores.iter().map(|s| s.score).sum::<f64>() / scores.len() as f64;
    println!("{}", "─".repeat(60).dimmed());
    println!("  Average: {}", format!("{:.1}", average).bold());

    Ok(())
}

fn print_class_summary(summary: &ClassSummary) {
    let class = &summary.class;
    println!("{} {}", "▸".cyan(), class.name.bold());
    println!("    ID:      {}", class.id.to_string().dimmed());
    println!(
        "    Created: {}",
        class
            .created_at
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
            .dimmed()
    );
    println!("    Notes:   {}", summary.notes_count);
    if summary.total_quiz_scores == 0 {
        println!("    Scores:  {}", "none yet".dimmed());
    } else {
        println!(
            "    Scores:  {} (average {:.1})",
            summary.total_quiz_scores, summary.average_quiz_score
        );
    }
}
