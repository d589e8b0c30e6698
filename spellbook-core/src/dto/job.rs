//! Job DTOs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::job::{JobDescriptor, ScoreRecord};
use crate::domain::quiz::ReviewTopic;

/// Request to generate a quiz for a class
///
/// Fields are optional so that a missing field is reported as a
/// validation error rather than a body rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitJob {
    pub class_id: Option<Uuid>,
    pub num_questions: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topics: Option<Vec<String>>,
}

/// Response to a successful submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSubmitted {
    pub job_id: Uuid,
}

/// Response of the status endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatus {
    pub ready: bool,
}

/// Envelope around a parsed result object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResult<T> {
    pub result: T,
}

/// Request to record the score of a completed quiz
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmitScore {
    pub score: Option<f64>,
}

/// All recorded scores for the jobs of one class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassScores {
    pub scores: Vec<ScoreRecord>,
}

/// Request for review topics covering the wrongly answered questions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    #[serde(default)]
    pub wrong_question_indices: Vec<usize>,
}

/// Review topics produced by the LLM provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewResponse {
    pub topics: Vec<ReviewTopic>,
}

/// Administrative view of the job queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSnapshot {
    pub size: u64,
    pub head: Option<JobDescriptor>,
}
