//! Job Record Store
//!
//! Durable mapping from job id to owning class and user, and from job id
//! to its (at most one) score.

use async_trait::async_trait;
use spellbook_core::domain::job::{JobRecord, ScoreRecord};
use sqlx::PgPool;
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum RecordStoreError {
    #[error("score already recorded for job {0}")]
    DuplicateScore(Uuid),

    #[error("job {0} is not recorded")]
    UnknownJob(Uuid),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, RecordStoreError>;

/// Score aggregates of one class
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScoreStats {
    pub count: u32,
    pub average: f64,
}

#[async_trait]
pub trait JobRecordStore: Send + Sync {
    /// Persists the ownership record of a freshly enqueued job
    async fn insert_job(&self, record: &JobRecord) -> Result<()>;

    async fn find_job(&self, job_id: Uuid) -> Result<Option<JobRecord>>;

    async fn find_score(&self, job_id: Uuid) -> Result<Option<ScoreRecord>>;

    /// Inserts a score
    ///
    /// Fails with `DuplicateScore` if the job already has one and with
    /// `UnknownJob` if the job was never recorded. Never overwrites.
    async fn insert_score(&self, score: &ScoreRecord) -> Result<()>;

    /// Scores of every job owned by `class_id`, oldest first
    async fn scores_for_class(&self, class_id: Uuid) -> Result<Vec<ScoreRecord>>;

    /// Score aggregates keyed by class; classes without scores are absent
    async fn score_stats(&self, class_ids: &[Uuid]) -> Result<HashMap<Uuid, ScoreStats>>;
}

pub struct PgJobRecordStore {
    pool: PgPool,
}

impl PgJobRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobRecordStore for PgJobRecordStore {
    async fn insert_job(&self, record: &JobRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO quiz_records (job_id, class_id, user_id, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(record.job_id)
        .bind(record.owner_class_id)
        .bind(&record.owner_user_id)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_job(&self, job_id: Uuid) -> Result<Option<JobRecord>> {
        let row = sqlx::query_as::<_, JobRecordRow>(
            r#"
            SELECT job_id, class_id, user_id, created_at
            FROM quiz_records
            WHERE job_id = $1
            "#,
        )
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn find_score(&self, job_id: Uuid) -> Result<Option<ScoreRecord>> {
        let row = sqlx::query_as::<_, ScoreRow>(
            r#"
            SELECT job_id, score, created_at
            FROM quiz_scores
            WHERE job_id = $1
            "#,
        )
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn insert_score(&self, score: &ScoreRecord) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO quiz_scores (job_id, score, created_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(score.job_id)
        .bind(score.score)
        .bind(score.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(RecordStoreError::DuplicateScore(score.job_id))
            }
            Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
                Err(RecordStoreError::UnknownJob(score.job_id))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn scores_for_class(&self, class_id: Uuid) -> Result<Vec<ScoreRecord>> {
        let rows = sqlx::query_as::<_, ScoreRow>(
            r#"
            SELECT s.job_id, s.score, s.created_at
            FROM quiz_scores s
            JOIN quiz_records r ON r.job_id = s.job_id
            WHERE r.class_id = $1
            ORDER BY s.created_at ASC
            "#,
        )
        .bind(class_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn score_stats(&self, class_ids: &[Uuid]) -> Result<HashMap<Uuid, ScoreStats>> {
        let rows = sqlx::query_as::<_, ScoreStatsRow>(
            r#"
            SELECT r.class_id, COUNT(s.job_id) AS count, AVG(s.score) AS average
            FROM quiz_scores s
            JOIN quiz_records r ON r.job_id = s.job_id
            WHERE r.class_id = ANY($1)
            GROUP BY r.class_id
            "#,
        )
        .bind(class_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let stats = ScoreStats {
                    count: u32::try_from(row.count).unwrap_or(u32::MAX),
                    average: row.average.unwrap_or(0.0),
                };
                (row.class_id, stats)
            })
            .collect())
    }
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct JobRecordRow {
    job_id: Uuid,
    class_id: Uuid,
    user_id: String,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl From<JobRecordRow> for JobRecord {
    fn from(row: JobRecordRow) -> Self {
        JobRecord {
            job_id: row.job_id,
            owner_class_id: row.class_id,
            owner_user_id: row.user_id,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ScoreRow {
    job_id: Uuid,
    score: f64,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl From<ScoreRow> for ScoreRecord {
    fn from(row: ScoreRow) -> Self {
        ScoreRecord {
            job_id: row.job_id,
            score: row.score,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ScoreStatsRow {
    class_id: Uuid,
    count: i64,
    average: Option<f64>,
}
