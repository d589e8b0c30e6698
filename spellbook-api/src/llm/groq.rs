use async_trait::async_trait;
use spellbook_core::domain::quiz::{ReviewQuestion, ReviewTopic};

use crate::llm::chat::ChatClient;
use crate::llm::{LlmError, LlmProvider};

/// Groq exposes an OpenAI-compatible API under this prefix
pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

pub struct GroqProvider {
    chat: ChatClient,
}

impl GroqProvider {
    pub fn new(api_key: String, model: String) -> Self {
        Self::with_base_url(GROQ_BASE_URL, api_key, model)
    }

    pub fn with_base_url(base_url: &str, api_key: String, model: String) -> Self {
        Self {
            chat: ChatClient::new(base_url, api_key, model),
        }
    }
}

#[async_trait]
impl LlmProvider for GroqProvider {
    fn name(&self) -> &'static str {
        "groq"
    }

    async fn review_topics(&self, questions: &[ReviewQuestion]) -> Result<Vec<ReviewTopic>, LlmError> {
        tracing::debug!(model = self.chat.model(), count = questions.len(), "Requesting review topics from Groq");
        self.chat.review_topics(questions).await
    }
}
