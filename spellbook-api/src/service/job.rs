//! Job Service
//!
//! Submission of quiz-generation jobs and everything keyed by job id
//! afterwards: status, result, and score.

use spellbook_core::domain::job::{
    GenerationParameters, JobDescriptor, JobRecord, MAX_QUESTIONS, ScoreRecord, is_valid_score,
    result_key,
};
use spellbook_core::domain::quiz::Quiz;
use spellbook_core::dto::job::{QueueSnapshot, SubmitJob, SubmitScore};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::gateway::{JobQueue, ObjectStore, QueueError, StoreError};
use crate::repository::{ClassRepository, JobRecordStore, RecordStoreError};

#[derive(Debug, Error)]
pub enum JobError {
    #[error("{0}")]
    Validation(String),

    #[error("class {0} not found")]
    ClassNotFound(Uuid),

    #[error("class {0} has no notes to generate a quiz from")]
    NoInputs(Uuid),

    #[error("job {0} not found")]
    JobNotFound(Uuid),

    #[error("result for job {0} not found")]
    ResultNotFound(Uuid),

    #[error("result for job {job_id} is malformed: {reason}")]
    MalformedResult { job_id: Uuid, reason: String },

    #[error("score already recorded for job {0}")]
    Conflict(Uuid),

    #[error("failed to enqueue job {job_id}: {source}")]
    Enqueue {
        job_id: Uuid,
        #[source]
        source: QueueError,
    },

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Records(RecordStoreError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl From<RecordStoreError> for JobError {
    fn from(err: RecordStoreError) -> Self {
        match err {
            RecordStoreError::DuplicateScore(job_id) => JobError::Conflict(job_id),
            RecordStoreError::UnknownJob(job_id) => JobError::JobNotFound(job_id),
            other => JobError::Records(other),
        }
    }
}

#[derive(Clone)]
pub struct JobService {
    classes: Arc<dyn ClassRepository>,
    records: Arc<dyn JobRecordStore>,
    queue: Arc<dyn JobQueue>,
    store: Arc<dyn ObjectStore>,
    result_prefix: String,
}

impl JobService {
    pub fn new(
        classes: Arc<dyn ClassRepository>,
        records: Arc<dyn JobRecordStore>,
        queue: Arc<dyn JobQueue>,
        store: Arc<dyn ObjectStore>,
        result_prefix: impl Into<String>,
    ) -> Self {
        Self {
            classes,
            records,
            queue,
            store,
            result_prefix: result_prefix.into(),
        }
    }

    /// Object key the worker writes the result of `job_id` to
    pub fn result_key(&self, job_id: Uuid) -> String {
        result_key(&self.result_prefix, job_id)
    }

    /// Validates a request, enqueues the job, then records its owner
    ///
    /// Nothing is written when validation or input lookup fails. A failed
    /// enqueue leaves no record behind. A failed record write after a
    /// successful enqueue leaves an orphaned queue entry, which is logged
    /// under the `spellbook::inconsistency` target.
    pub async fn submit(&self, owner_user_id: &str, req: SubmitJob) -> Result<Uuid, JobError> {
        let class_id = req
            .class_id
            .ok_or_else(|| JobError::Validation("classId is required".to_string()))?;
        let num_questions = req
            .num_questions
            .ok_or_else(|| JobError::Validation("numQuestions is required".to_string()))?;

        if num_questions == 0 || num_questions > MAX_QUESTIONS {
            return Err(JobError::Validation(format!(
                "numQuestions must be between 1 and {}",
                MAX_QUESTIONS
            )));
        }

        let topics: Vec<String> = req
            .topics
            .unwrap_or_default()
            .into_iter()
            .map(|topic| topic.trim().to_string())
            .filter(|topic| !topic.is_empty())
            .collect();

        self.classes
            .find_class(owner_user_id, class_id)
            .await?
            .ok_or(JobError::ClassNotFound(class_id))?;

        let input_refs = self.classes.note_keys(class_id).await?;
        if input_refs.is_empty() {
            return Err(JobError::NoInputs(class_id));
        }

        let job_id = Uuid::new_v4();
        let descriptor = JobDescriptor {
            job_id,
            input_refs,
            parameters: GenerationParameters {
                num_questions,
                topics,
            },
        };

        if let Err(source) = self.queue.enqueue(&descriptor).await {
            tracing::error!("Failed to enqueue job {} for class {}: {}", job_id, class_id, source);
            return Err(JobError::Enqueue { job_id, source });
        }

        let record = JobRecord {
            job_id,
            owner_class_id: class_id,
            owner_user_id: owner_user_id.to_string(),
            created_at: chrono::Utc::now(),
        };

        if let Err(err) = self.records.insert_job(&record).await {
            tracing::error!(
                target: "spellbook::inconsistency",
                job_id = %job_id,
                class_id = %class_id,
                owner = owner_user_id,
                error = %err,
                "Job enqueued but its record could not be written; queue entry is orphaned"
            );
            return Err(err.into());
        }

        tracing::info!(
            "Job submitted: {} for class {} ({} notes, {} questions)",
            job_id,
            class_id,
            descriptor.input_refs.len(),
            num_questions
        );

        Ok(job_id)
    }

    /// Whether the result object exists; never reads its body
    pub async fn check_status(&self, job_id: Uuid) -> Result<bool, JobError> {
        let key = self.result_key(job_id);
        self.store.exists(&key).await.map_err(|e| {
            tracing::error!("Status check failed for job {} ({}): {}", job_id, key, e);
            JobError::Store(e)
        })
    }

    /// Reads and parses the result object
    pub async fn fetch_result(&self, job_id: Uuid) -> Result<Quiz, JobError> {
        let key = self.result_key(job_id);
        let bytes = match self.store.get_bytes(&key).await {
            Ok(bytes) => bytes,
            Err(e) if e.is_not_found() => return Err(JobError::ResultNotFound(job_id)),
            Err(e) => {
                tracing::error!("Failed to read result of job {} ({}): {}", job_id, key, e);
                return Err(e.into());
            }
        };

        serde_json::from_slice(&bytes).map_err(|e| {
            tracing::error!("Malformed result for job {}: {}", job_id, e);
            JobError::MalformedResult {
                job_id,
                reason: e.to_string(),
            }
        })
    }

    /// Records the score of a job, at most once
    pub async fn record_score(&self, job_id: Uuid, req: SubmitScore) -> Result<ScoreRecord, JobError> {
        let score = req
            .score
            .ok_or_else(|| JobError::Validation("score is required".to_string()))?;
        if !is_valid_score(score) {
            return Err(JobError::Validation(
                "score must be a number between 0 and 100".to_string(),
            ));
        }

        self.records
            .find_job(job_id)
            .await?
            .ok_or(JobError::JobNotFound(job_id))?;

        if self.records.find_score(job_id).await?.is_some() {
            tracing::warn!("Rejected duplicate score for job {}", job_id);
            return Err(JobError::Conflict(job_id));
        }

        let record = ScoreRecord {
            job_id,
            score,
            created_at: chrono::Utc::now(),
        };
        self.records.insert_score(&record).await?;

        tracing::info!("Score {} recorded for job {}", score, job_id);

        Ok(record)
    }

    /// Scores of the jobs of a class the caller owns
    pub async fn class_scores(&self, owner_user_id: &str, class_id: Uuid) -> Result<Vec<ScoreRecord>, JobError> {
        self.classes
            .find_class(owner_user_id, class_id)
            .await?
            .ok_or(JobError::ClassNotFound(class_id))?;

        Ok(self.records.scores_for_class(class_id).await?)
    }

    /// Administrative view of the queue
    pub async fn queue_snapshot(&self) -> Result<QueueSnapshot, JobError> {
        let size = self.queue.size().await?;
        let head = self.queue.peek().await?;
        Ok(QueueSnapshot { size, head })
    }
}
