//! Spellbook HTTP Client
//!
//! A type-safe HTTP client for the Spellbook API, plus the poller that
//! watches a submitted quiz job until its result is ready.
//!
//! # Example
//!
//! ```no_run
//! use spellbook_client::{JobPoller, PollerConfig, SpellbookClient};
//! use spellbook_core::domain::quiz::Quiz;
//! use spellbook_core::dto::job::SubmitJob;
//! use uuid::Uuid;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = SpellbookClient::new("http://localhost:8080").with_user("user-1");
//!
//!     let job_id = client.submit_job(SubmitJob {
//!         class_id: Some(Uuid::new_v4()),
//!         num_questions: Some(5),
//!         topics: None,
//!     }).await?;
//!
//!     let mut poller = JobPoller::new(job_id, client, PollerConfig::default());
//!     let quiz: Quiz = poller.run().await?;
//!     println!("{} questions", quiz.questions.len());
//!     Ok(())
//! }
//! ```

mod classes;
pub mod error;
mod jobs;
pub mod poller;

// Re-export commonly used types
pub use error::{ClientError, Result};
pub use poller::{
    JobPoller, PollError, PollState, PollerConfig, Sleeper, StatusSource, Tick, TokioSleeper,
};

use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;

/// Header carrying the id of the calling user
pub const USER_HEADER: &str = "X-User-Id";

/// HTTP client for the Spellbook API
#[derive(Debug, Clone)]
pub struct SpellbookClient {
    /// Base URL of the API (e.g., "http://localhost:8080")
    base_url: String,
    /// HTTP client instance
    client: Client,
    /// User sent in the identity header, if any
    user_id: Option<String>,
}

impl SpellbookClient {
    /// Create a new client
    ///
    /// # Example
    /// ```
    /// use spellbook_client::SpellbookClient;
    ///
    /// let client = SpellbookClient::new("http://localhost:8080");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            user_id: None,
        }
    }

    /// Act on behalf of `user_id`
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Get the base URL of the API
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Builds a request to `path` under the base URL with the identity header
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        match &self.user_id {
            Some(user) => builder.header(USER_HEADER, user),
            None => builder,
        }
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Handle an API response that returns no content (e.g., DELETE operations)
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        Ok(())
    }
}
