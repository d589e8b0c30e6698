//! Job queue
//!
//! Append-only hand-off of job descriptors to the external quiz worker.
//! Delivery is at-least-once; the worker is expected to be idempotent per
//! job id. Only `enqueue` sits on the hot path, the rest are
//! administrative.

use async_trait::async_trait;
use spellbook_core::domain::job::JobDescriptor;
use sqlx::PgPool;
use std::collections::VecDeque;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("queue database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("malformed queue entry: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("queue unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Appends a descriptor to the tail of the queue
    async fn enqueue(&self, descriptor: &JobDescriptor) -> Result<(), QueueError>;

    /// Removes and returns the head of the queue
    async fn dequeue(&self) -> Result<Option<JobDescriptor>, QueueError>;

    /// Returns the head of the queue without removing it
    async fn peek(&self) -> Result<Option<JobDescriptor>, QueueError>;

    /// Number of pending descriptors
    async fn size(&self) -> Result<u64, QueueError>;
}

/// Queue stored in the `job_queue` table
pub struct PgJobQueue {
    pool: PgPool,
}

impl PgJobQueue {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobQueue for PgJobQueue {
    async fn enqueue(&self, descriptor: &JobDescriptor) -> Result<(), QueueError> {
        let payload = serde_json::to_value(descriptor)?;

        sqlx::query(
            r#"
            INSERT INTO job_queue (job_id, payload, enqueued_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(descriptor.job_id)
        .bind(payload)
        .bind(chrono::Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn dequeue(&self) -> Result<Option<JobDescriptor>, QueueError> {
        let payload = sqlx::query_scalar::<_, serde_json::Value>(
            r#"
            DELETE FROM job_queue
            WHERE id = (
                SELECT id FROM job_queue
                ORDER BY id ASC
                LIMIT 1
                FOR UPDATE SKIP LOCKED
            )
            RETURNING payload
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(payload.map(serde_json::from_value).transpose()?)
    }

    async fn peek(&self) -> Result<Option<JobDescriptor>, QueueError> {
        let payload = sqlx::query_scalar::<_, serde_json::Value>(
            "SELECT payload FROM job_queue ORDER BY id ASC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(payload.map(serde_json::from_value).transpose()?)
    }

    async fn size(&self) -> Result<u64, QueueError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM job_queue")
            .fetch_one(&self.pool)
            .await?;

        Ok(u64::try_from(count).unwrap_or(0))
    }
}

/// FIFO queue held in memory
#[derive(Default)]
pub struct InMemoryJobQueue {
    entries: Mutex<VecDeque<JobDescriptor>>,
}

impl InMemoryJobQueue {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobQueue for InMemoryJobQueue {
    async fn enqueue(&self, descriptor: &JobDescriptor) -> Result<(), QueueError> {
        self.entries.lock().await.push_back(descriptor.clone());
        Ok(())
    }

    async fn dequeue(&self) -> Result<Option<JobDescriptor>, QueueError> {
        Ok(self.entries.lock().await.pop_front())
    }

    async fn peek(&self) -> Result<Option<JobDescriptor>, QueueError> {
        Ok(self.entries.lock().await.front().cloned())
    }

    async fn size(&self) -> Result<u64, QueueError> {
        Ok(self.entries.lock().await.len() as u64)
    }
}
