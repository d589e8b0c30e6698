//! LLM Module
//!
//! Review-topic generation behind a provider trait. Both providers speak
//! the OpenAI chat-completions protocol and differ only in endpoint, key
//! and model.

pub mod chat;
pub mod groq;
pub mod openai;

use async_trait::async_trait;
use spellbook_core::domain::quiz::{ReviewQuestion, ReviewTopic};
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

use crate::config::LlmConfig;

pub use groq::GroqProvider;
pub use openai::OpenAiProvider;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("LLM API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("invalid LLM response: {0}")]
    InvalidResponse(String),

    #[error("{0} is not set")]
    MissingApiKey(&'static str),

    #[error("unknown LLM provider {0:?}, expected openai or groq")]
    UnknownProvider(String),
}

#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Suggests topics to review given the questions answered wrongly
    async fn review_topics(&self, questions: &[ReviewQuestion]) -> Result<Vec<ReviewTopic>, LlmError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProviderKind {
    OpenAi,
    Groq,
}

impl FromStr for LlmProviderKind {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "groq" => Ok(Self::Groq),
            other => Err(LlmError::UnknownProvider(other.to_string())),
        }
    }
}

/// Builds the configured provider
///
/// Fails if the selected provider has no API key.
pub fn build_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    match config.provider {
        LlmProviderKind::OpenAi => {
            let key = config
                .openai_api_key
                .clone()
                .ok_or(LlmError::MissingApiKey("OPENAI_API_KEY"))?;
            Ok(Arc::new(OpenAiProvider::new(key, config.openai_model.clone())))
        }
        LlmProviderKind::Groq => {
            let key = config
                .groq_api_key
                .clone()
                .ok_or(LlmError::MissingApiKey("GROQ_API_KEY"))?;
            Ok(Arc::new(GroqProvider::new(key, config.groq_model.clone())))
        }
    }
}
