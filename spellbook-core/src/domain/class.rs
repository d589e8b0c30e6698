//! Class and note domain types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A class owned by a user; its notes are the inputs of quiz jobs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassRecord {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// An uploaded page of notes, addressed by its content key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteRecord {
    pub key: String,
    pub class_id: Uuid,
    pub user_id: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// A class with the aggregates shown in class listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSummary {
    #[serde(flatten)]
    pub class: ClassRecord,
    pub notes_count: u32,
    pub total_quiz_scores: u32,
    /// Zero when the class has no scores yet
    pub average_quiz_score: f64,
}
