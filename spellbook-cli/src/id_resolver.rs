//! Class reference resolution
//!
//! Lets commands take a class as a full UUID, an unambiguous id prefix
//! or its exact name.

use anyhow::{Result, anyhow};
use spellbook_client::SpellbookClient;
use spellbook_core::domain::class::ClassRecord;
use uuid::Uuid;

/// Resolve `input` to the id of one of the caller's classes
pub async fn resolve_class_id(client: &SpellbookClient, input: &str) -> Result<Uuid> {
    if let Ok(id) = Uuid::parse_str(input) {
        return Ok(id);
    }

    let classes: Vec<ClassRecord> = client
        .list_all_classes()
        .await?
        .into_iter()
        .map(|summary| summary.class)
        .collect();
    match_class(&classes, input)
}

/// Parse a job id; jobs cannot be listed so no prefix lookup is possible
pub fn parse_job_id(input: &str) -> Result<Uuid> {
    Uuid::parse_str(input).map_err(|_| anyhow!("'{}' is not a valid job id", input))
}

fn match_class(classes: &[ClassRecord], input: &str) -> Result<Uuid> {
    if let Some(class) = classes.iter().find(|c| c.name == input) {
        return Ok(class.id);
    }

    let prefix = input.to_lowercase();
    let matches: Vec<&ClassRecord> = classes
        .iter()
        .filter(|c| c.id.to_string().starts_with(&prefix))
        .collect();

    match matches.as_slice() {
        [] => Err(anyhow!("No class found matching '{}'", input)),
        [class] => Ok(class.id),
        _ => {
            let ids: Vec<String> = matches
                .iter()
                .map(|c| format!("{} ({})", c.id, c.name))
                .collect();
            Err(anyhow!(
                "Ambiguous class reference '{}' matches {} classes:\n  {}",
                input,
                matches.len(),
                ids.join("\n  ")
            ))
        }
    }
}
