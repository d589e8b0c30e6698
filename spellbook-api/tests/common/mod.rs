#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::Value;
use spellbook_api::api::{self, AppState, Backends};
use spellbook_api::config::Config;
use spellbook_api::gateway::{InMemoryJobQueue, InMemoryObjectStore, UrlSigner};
use spellbook_api::llm::{LlmError, LlmProvider};
use spellbook_api::repository::{InMemoryClassRepository, InMemoryJobRecordStore};
use spellbook_core::domain::quiz::{ReviewQuestion, ReviewTopic};
use std::sync::Arc;
use tower::ServiceExt;

pub const USER: &str = "user-1";

/// Suggests one topic per wrong question, named after its correct answer
pub struct EchoProvider;

#[async_trait]
impl LlmProvider for EchoProvider {
    fn name(&self) -> &'static str {
        "echo"
    }

    async fn review_topics(&self, questions: &[ReviewQuestion]) -> Result<Vec<ReviewTopic>, LlmError> {
        Ok(questions
            .iter()
            .map(|q| ReviewTopic {
                topic: q.correct_answer.clone(),
                importance: format!("Missed: {}", q.question),
            })
            .collect())
    }
}

/// Server state on in-memory backends, with handles to inspect them
pub struct TestApp {
    pub state: AppState,
    pub store: Arc<InMemoryObjectStore>,
    pub queue: Arc<InMemoryJobQueue>,
    pub records: Arc<InMemoryJobRecordStore>,
    pub signer: Arc<UrlSigner>,
    pub config: Config,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_public_url("http://localhost:8080")
    }

    pub fn with_public_url(public_url: &str) -> Self {
        let config = Config {
            public_url: public_url.to_string(),
            signing_secret: "test-secret".to_string(),
            ..Config::default()
        };

        let signer = Arc::new(
            UrlSigner::new(config.signing_secret.as_bytes(), &config.public_url).unwrap(),
        );
        let store = Arc::new(InMemoryObjectStore::new(signer.clone()));
        let queue = Arc::new(InMemoryJobQueue::new());
        let records = Arc::new(InMemoryJobRecordStore::new());

        let backends = Backends {
            store: store.clone(),
            queue: queue.clone(),
            records: records.clone(),
            classes: Arc::new(InMemoryClassRepository::new()),
            llm: Arc::new(EchoProvider),
            signer: signer.clone(),
        };

        Self {
            state: AppState::new(backends, &config),
            store,
            queue,
            records,
            signer,
            config,
        }
    }

    pub fn router(&self) -> Router {
        api::create_router(self.state.clone())
    }

    /// Sends one request through a fresh router
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, body)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(request("GET", uri, Some(USER), None)).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(request("POST", uri, Some(USER), Some(body))).await
    }

    /// Creates a class with `notes` registered note keys; returns the class id
    pub async fn class_with_notes(&self, notes: u32) -> String {
        let (status, class) = self
            .post("/classes", serde_json::json!({ "name": "Biology" }))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let class_id = class["id"].as_str().unwrap().to_string();

        if notes > 0 {
            let (status, _) = self
                .post(
                    &format!("/classes/{}/notes", class_id),
                    serde_json::json!({ "numberOfFiles": notes }),
                )
                .await;
            assert_eq!(status, StatusCode::OK);
        }

        class_id
    }
}

pub fn request(method: &str, uri: &str, user: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("x-user-id", user);
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub fn sample_quiz() -> Value {
    serde_json::json!({
        "questions": [
            { "question": "Powerhouse of the cell?", "answers": ["Nucleus", "Mitochondria"], "correctAnswerIndex": 1 },
            { "question": "Basic unit of life?", "answers": ["Cell", "Atom"], "correctAnswerIndex": 0 },
            { "question": "DNA shape?", "answers": ["Double helix", "Sheet"], "correctAnswerIndex": 0 }
        ]
    })
}
