//! Job domain types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Largest number of questions a single job may ask for
pub const MAX_QUESTIONS: u32 = 50;

/// Suffix appended to the job id to form the result object key
pub const RESULT_SUFFIX: &str = ".json";

/// Generation knobs carried by a job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationParameters {
    pub num_questions: u32,
    #[serde(default)]
    pub topics: Vec<String>,
}

/// Work item handed to the external quiz worker through the queue
///
/// The field names on the wire are the ones the worker reads, so the
/// serialized form must stay stable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDescriptor {
    #[serde(rename = "jobUuid")]
    pub job_id: Uuid,
    #[serde(rename = "noteKeys")]
    pub input_refs: Vec<String>,
    #[serde(flatten)]
    pub parameters: GenerationParameters,
}

/// Ownership record written once a job has been enqueued
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub job_id: Uuid,
    pub owner_class_id: Uuid,
    pub owner_user_id: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Score recorded for a completed quiz, at most one per job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRecord {
    pub job_id: Uuid,
    pub score: f64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Object key under which the worker writes the result of `job_id`
pub fn result_key(prefix: &str, job_id: Uuid) -> String {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        format!("{}{}", job_id, RESULT_SUFFIX)
    } else {
        format!("{}/{}{}", prefix, job_id, RESULT_SUFFIX)
    }
}

/// Returns true when `score` is a finite percentage
pub fn is_valid_score(score: f64) -> bool {
    score.is_finite() && (0.0..=100.0).contains(&score)
}
