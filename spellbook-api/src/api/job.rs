//! Job API Handlers
//!
//! Submission, status polling, result retrieval and scoring of quiz jobs.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use spellbook_core::domain::job::ScoreRecord;
use spellbook_core::domain::quiz::Quiz;
use spellbook_core::dto::job::{
    ClassScores, JobResult, JobStatus, JobSubmitted, ReviewRequest, ReviewResponse, SubmitJob,
    SubmitScore,
};
use uuid::Uuid;

use crate::api::AppState;
use crate::api::error::ApiResult;
use crate::api::owner::OwnerId;

// =============================================================================
// Job Lifecycle Endpoints
// =============================================================================

/// POST /jobs
/// Submit a quiz-generation job for a class
pub async fn submit_job(
    State(state): State<AppState>,
    owner: OwnerId,
    payload: Result<Json<SubmitJob>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<JobSubmitted>)> {
    let Json(req) = payload?;
    tracing::info!("Submitting job for class {:?} by {}", req.class_id, owner.as_str());

    let job_id = state.jobs.submit(owner.as_str(), req).await?;

    Ok((StatusCode::CREATED, Json(JobSubmitted { job_id })))
}

/// GET /jobs/{id}/status
/// Existence check on the result object
pub async fn job_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<JobStatus>> {
    tracing::debug!("Checking status of job {}", id);

    let ready = state.jobs.check_status(id).await?;

    Ok(Json(JobStatus { ready }))
}

/// GET /jobs/{id}/result
pub async fn job_result(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<JobResult<Quiz>>> {
    tracing::debug!("Fetching result of job {}", id);

    let result = state.jobs.fetch_result(id).await?;

    Ok(Json(JobResult { result }))
}

// =============================================================================
// Scores and Review
// =============================================================================

/// POST /jobs/{id}/score
pub async fn submit_score(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<SubmitScore>, JsonRejection>,
) -> ApiResult<Json<ScoreRecord>> {
    let Json(req) = payload?;

    let score = state.jobs.record_score(id, req).await?;

    Ok(Json(score))
}

/// GET /classes/{id}/scores
pub async fn class_scores(
    State(state): State<AppState>,
    owner: OwnerId,
    Path(class_id): Path<Uuid>,
) -> ApiResult<Json<ClassScores>> {
    tracing::debug!("Listing scores of class {}", class_id);

    let scores = state.jobs.class_scores(owner.as_str(), class_id).await?;

    Ok(Json(ClassScores { scores }))
}

/// POST /jobs/{id}/review
/// Suggest topics to review from the wrongly answered questions
pub async fn review_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<ReviewRequest>, JsonRejection>,
) -> ApiResult<Json<ReviewResponse>> {
    let Json(req) = payload?;
    tracing::info!(
        "Generating review topics for job {} ({} wrong answers)",
        id,
        req.wrong_question_indices.len()
    );

    let topics = state
        .review
        .review_topics(id, &req.wrong_question_indices)
        .await?;

    Ok(Json(ReviewResponse { topics }))
}
