//! Review Service
//!
//! Turns the questions a user got wrong into topics to review.

use spellbook_core::domain::quiz::ReviewTopic;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::llm::{LlmError, LlmProvider};
use crate::service::job::{JobError, JobService};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Job(#[from] JobError),

    #[error("review topics could not be generated after {attempts} attempts: {source}")]
    Llm {
        attempts: u32,
        #[source]
        source: LlmError,
    },
}

#[derive(Clone)]
pub struct ReviewService {
    jobs: JobService,
    llm: Arc<dyn LlmProvider>,
    max_attempts: u32,
}

impl ReviewService {
    pub fn new(jobs: JobService, llm: Arc<dyn LlmProvider>) -> Self {
        Self {
            jobs,
            llm,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub async fn review_topics(
        &self,
        job_id: Uuid,
        wrong_question_indices: &[usize],
    ) -> Result<Vec<ReviewTopic>, ReviewError> {
        if wrong_question_indices.is_empty() {
            return Err(ReviewError::Validation(
                "wrongQuestionIndices must not be empty".to_string(),
            ));
        }

        let quiz = self.jobs.fetch_result(job_id).await?;
        let questions = quiz
            .review_questions(wrong_question_indices)
            .map_err(|index| {
                ReviewError::Validation(format!(
                    "question index {} is out of range for a quiz of {} questions",
                    index,
                    quiz.questions.len()
                ))
            })?;

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.llm.review_topics(&questions).await {
                Ok(topics) => {
                    tracing::info!(
                        "Generated {} review topics for job {} via {}",
                        topics.len(),
                        job_id,
                        self.llm.name()
                    );
                    return Ok(topics);
                }
                Err(e) if attempt < self.max_attempts => {
                    tracing::warn!(
                        "Review topic attempt {} for job {} failed: {}",
                        attempt,
                        job_id,
                        e
                    );
                }
                Err(e) => {
                    tracing::error!("Giving up on review topics for job {}: {}", job_id, e);
                    return Err(ReviewError::Llm {
                        attempts: attempt,
                        source: e,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{InMemoryJobQueue, InMemoryObjectStore, ObjectStore, UrlSigner};
    use crate::repository::{InMemoryClassRepository, InMemoryJobRecordStore};
    use async_trait::async_trait;
    use spellbook_core::domain::quiz::ReviewQuestion;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails a fixed number of times, then answers with one topic per question
    struct FlakyProvider {
        failures: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl LlmProvider for FlakyProvider {
        fn name(&self) -> &'static str {
            "flaky"
        }

        async fn review_topics(&self, questions: &[ReviewQuestion]) -> Result<Vec<ReviewTopic>, LlmError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(LlmError::InvalidResponse("no topics".to_string()));
            }
            Ok(questions
                .iter()
                .map(|q| ReviewTopic {
                    topic: q.correct_answer.clone(),
                    importance: "missed".to_string(),
                })
                .collect())
        }
    }

    async fn setup(failures: u32, max_attempts: u32) -> (ReviewService, Arc<FlakyProvider>, Uuid) {
        let signer = Arc::new(UrlSigner::new(b"test-secret", "http://localhost:8080").unwrap());
        let store = Arc::new(InMemoryObjectStore::new(signer));
        let jobs = JobService::new(
            Arc::new(InMemoryClassRepository::new()),
            Arc::new(InMemoryJobRecordStore::new()),
            Arc::new(InMemoryJobQueue::new()),
            store.clone(),
            "quizzes",
        );

        let job_id = Uuid::new_v4();
        let quiz = br#"{"questions":[
            {"question":"2+2?","answers":["3","4"],"correctAnswerIndex":1},
            {"question":"Capital of Italy?","answers":["Rome","Milan"],"correctAnswerIndex":0}
        ]}"#;
        store
            .put_bytes(&jobs.result_key(job_id), quiz.to_vec())
            .await
            .unwrap();

        let provider = Arc::new(FlakyProvider {
            failures,
            calls: AtomicU32::new(0),
        });
        let service = ReviewService::new(jobs, provider.clone()).with_max_attempts(max_attempts);
        (service, provider, job_id)
    }

    #[tokio::test]
    async fn test_retries_until_provider_answers() {
        let (service, provider, job_id) = setup(2, DEFAULT_MAX_ATTEMPTS).await;

        let topics = service.review_topics(job_id, &[1]).await.unwrap();

        assert_eq!(topics.len(), 1);
        assert_eq!(topics[0].topic, "Rome");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let (service, provider, job_id) = setup(5, 2).await;

        let err = service.review_topics(job_id, &[0]).await.unwrap_err();

        assert!(matches!(err, ReviewError::Llm { attempts: 2, .. }));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_zero_attempts_still_calls_provider_once() {
        let (service, provider, job_id) = setup(5, 0).await;

        let err = service.review_topics(job_id, &[0]).await.unwrap_err();

        assert!(matches!(err, ReviewError::Llm { attempts: 1, .. }));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rejects_bad_indices_without_calling_provider() {
        let (service, provider, job_id) = setup(0, DEFAULT_MAX_ATTEMPTS).await;

        assert!(matches!(
            service.review_topics(job_id, &[]).await,
            Err(ReviewError::Validation(_))
        ));
        assert!(matches!(
            service.review_topics(job_id, &[0, 2]).await,
            Err(ReviewError::Validation(_))
        ));
        assert!(matches!(
            service.review_topics(Uuid::new_v4(), &[0]).await,
            Err(ReviewError::Job(JobError::ResultNotFound(_)))
        ));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }
}
