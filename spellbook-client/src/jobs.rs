//! Job-related API endpoints

use reqwest::Method;
use serde::de::DeserializeOwned;
use spellbook_core::domain::job::ScoreRecord;
use spellbook_core::domain::quiz::ReviewTopic;
use spellbook_core::dto::job::{
    ClassScores, JobResult, JobStatus, JobSubmitted, QueueSnapshot, ReviewRequest,
    ReviewResponse, SubmitJob, SubmitScore,
};
use uuid::Uuid;

use crate::SpellbookClient;
use crate::error::{ClientError, Result};

impl SpellbookClient {
    // =============================================================================
    // Job Lifecycle
    // =============================================================================

    /// Submit a quiz-generation job
    ///
    /// # Returns
    /// The id of the new job
    pub async fn submit_job(&self, req: SubmitJob) -> Result<Uuid> {
        let response = self.request(Method::POST, "/jobs").json(&req).send().await?;

        let submitted: JobSubmitted = self.handle_response(response).await?;
        Ok(submitted.job_id)
    }

    /// Whether the result of a job exists yet
    pub async fn job_status(&self, job_id: Uuid) -> Result<bool> {
        let response = self
            .request(Method::GET, &format!("/jobs/{}/status", job_id))
            .send()
            .await?;

        let status: JobStatus = self.handle_response(response).await?;
        Ok(status.ready)
    }

    /// Fetch and deserialize the result of a finished job
    pub async fn job_result<T: DeserializeOwned>(&self, job_id: Uuid) -> Result<T> {
        let response = self
            .request(Method::GET, &format!("/jobs/{}/result", job_id))
            .send()
            .await?;

        let result: JobResult<T> = self
            .handle_response(response)
            .await
            .map_err(ClientError::classify_result_error)?;
        Ok(result.result)
    }

    // =============================================================================
    // Scores and Review
    // =============================================================================

    /// Record the score of a completed quiz
    pub async fn submit_score(&self, job_id: Uuid, score: f64) -> Result<ScoreRecord> {
        let response = self
            .request(Method::POST, &format!("/jobs/{}/score", job_id))
            .json(&SubmitScore { score: Some(score) })
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// List the scores recorded for a class
    pub async fn class_scores(&self, class_id: Uuid) -> Result<Vec<ScoreRecord>> {
        let response = self
            .request(Method::GET, &format!("/classes/{}/scores", class_id))
            .send()
            .await?;

        let scores: ClassScores = self.handle_response(response).await?;
        Ok(scores.scores)
    }

    /// Ask for review topics covering the wrongly answered questions
    pub async fn review_topics(&self, job_id: Uuid, wrong_question_indices: Vec<usize>) -> Result<Vec<ReviewTopic>> {
        let response = self
            .request(Method::POST, &format!("/jobs/{}/review", job_id))
            .json(&ReviewRequest {
                wrong_question_indices,
            })
            .send()
            .await?;

        let review: ReviewResponse = self.handle_response(response).await?;
        Ok(review.topics)
    }

    // =============================================================================
    // Administration
    // =============================================================================

    /// Size and head of the job queue
    pub async fn queue_snapshot(&self) -> Result<QueueSnapshot> {
        let response = self.request(Method::GET, "/admin/queue").send().await?;

        self.handle_response(response).await
    }
}
