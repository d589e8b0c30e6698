//! API Module
//!
//! HTTP API layer of the spellbook server.
//! Each submodule handles endpoints for a specific domain.

pub mod admin;
pub mod blob;
pub mod class;
pub mod error;
pub mod health;
pub mod job;
pub mod owner;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::cache::TtlCache;
use crate::config::Config;
use crate::gateway::{JobQueue, ObjectStore, UrlSigner};
use crate::llm::LlmProvider;
use crate::repository::{ClassRepository, JobRecordStore};
use crate::service::{ClassService, JobService, ReviewService};

/// Storage and provider implementations the server runs on
pub struct Backends {
    pub store: Arc<dyn ObjectStore>,
    pub queue: Arc<dyn JobQueue>,
    pub records: Arc<dyn JobRecordStore>,
    pub classes: Arc<dyn ClassRepository>,
    pub llm: Arc<dyn LlmProvider>,
    pub signer: Arc<UrlSigner>,
}

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub jobs: JobService,
    pub classes: ClassService,
    pub review: ReviewService,
    pub store: Arc<dyn ObjectStore>,
    pub signer: Arc<UrlSigner>,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(backends: Backends, config: &Config) -> Self {
        let jobs = JobService::new(
            backends.classes.clone(),
            backends.records.clone(),
            backends.queue,
            backends.store.clone(),
            config.result_prefix.clone(),
        );

        let classes = ClassService::new(
            backends.classes,
            backends.records,
            backends.store.clone(),
            Arc::new(TtlCache::new(config.display_cache_ttl())),
            config.upload_url_ttl,
            config.display_url_ttl,
            config.ocr_prefix.clone(),
        );

        let review = ReviewService::new(jobs.clone(), backends.llm)
            .with_max_attempts(config.llm.review_max_attempts);

        Self {
            jobs,
            classes,
            review,
            store: backends.store,
            signer: backends.signer,
            max_upload_bytes: config.max_upload_bytes,
        }
    }
}

/// Create the main API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let max_upload_bytes = state.max_upload_bytes;

    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Job endpoints
        .route("/jobs", post(job::submit_job))
        .route("/jobs/{id}/status", get(job::job_status))
        .route("/jobs/{id}/result", get(job::job_result))
        .route("/jobs/{id}/score", post(job::submit_score))
        .route("/jobs/{id}/review", post(job::review_job))
        // Class endpoints
        .route("/classes", post(class::create_class).get(class::list_classes))
        .route("/classes/{id}", get(class::get_class))
        .route("/classes/{id}/scores", get(job::class_scores))
        .route(
            "/classes/{id}/notes",
            post(class::request_uploads).get(class::list_notes),
        )
        .route("/classes/{id}/notes/status", get(class::processing_status))
        .route("/classes/{id}/notes/{key}", delete(class::delete_note))
        // Signed blob access
        .route(
            "/blobs/{*key}",
            get(blob::get_blob)
                .put(blob::put_blob)
                .layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        // Administration
        .route("/admin/queue", get(admin::queue_snapshot))
        // Add state and middleware
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
