//! Minimal OpenAI-compatible chat-completions client

use serde::{Deserialize, Serialize};
use serde_json::json;
use spellbook_core::domain::quiz::{ReviewQuestion, ReviewTopic};

use crate::llm::LlmError;

pub const REVIEW_SYSTEM_PROMPT: &str = "Generate at most 10 most-important review topics based on the \
provided wrong questions from a quiz the user answered incorrectly. Only generate topics that are \
related to the wrong questions, and make sure they're sufficiently specific. Respond in JSON format \
with an array of topics to review, each followed by a short sentence describing why it's important. \
The response should be in the following format: {\"topics\": [{\"topic\": \"string\", \"importance\": \"string\"}]}. \
Keep your response short and concise.";

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TopicsEnvelope {
    topics: Vec<ReviewTopic>,
}

#[derive(Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl ChatClient {
    pub fn new(base_url: impl Into<String>, api_key: String, model: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            model,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Sends one system and one user message, asking for a JSON object back
    ///
    /// Returns the raw content of the first choice.
    pub async fn complete_json(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
            "response_format": { "type": "json_object" },
        });

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| LlmError::InvalidResponse("response has no content".to_string()))
    }

    /// Asks the model for review topics covering `questions`
    pub async fn review_topics(&self, questions: &[ReviewQuestion]) -> Result<Vec<ReviewTopic>, LlmError> {
        let questions = serde_json::to_string(questions)
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;
        let user = format!(
            "Generate review topics from the following wrong questions: {}",
            questions
        );

        let content = self.complete_json(REVIEW_SYSTEM_PROMPT, &user).await?;
        parse_review_topics(&content)
    }
}

/// Parses `{"topics": [{"topic", "importance"}]}` out of a model reply
pub fn parse_review_topics(content: &str) -> Result<Vec<ReviewTopic>, LlmError> {
    serde_json::from_str::<TopicsEnvelope>(content)
        .map(|envelope| envelope.topics)
        .map_err(|e| LlmError::InvalidResponse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, http::HeaderMap, http::StatusCode, routing::post};
    use serde_json::Value;

    async fn spawn_mock(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn question() -> ReviewQuestion {
        ReviewQuestion {
            question: "Powerhouse of the cell?".to_string(),
            answer_choices: vec!["Nucleus".to_string(), "Mitochondria".to_string()],
            correct_answer: "Mitochondria".to_string(),
        }
    }

    #[test]
    fn test_parse_review_topics() {
        let topics = parse_review_topics(
            r#"{"topics":[{"topic":"Cell organelles","importance":"Core of the unit"}]}"#,
        )
        .unwrap();
        assert_eq!(topics.len(), 1);
        assert_eq!(topics[0].topic, "Cell organelles");

        assert!(parse_review_topics(r#"{"items":[]}"#).is_err());
        assert!(parse_review_topics("not json").is_err());
    }

    #[tokio::test]
    async fn test_review_topics_against_mock_api() {
        let router = Router::new().route(
            "/chat/completions",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                assert_eq!(headers["authorization"], "Bearer test-key");
                assert_eq!(body["model"], "test-model");
                assert_eq!(body["response_format"]["type"], "json_object");
                let user = body["messages"][1]["content"].as_str().unwrap().to_string();
                assert!(user.contains("answerChoices"));

                Json(serde_json::json!({
                    "choices": [{
                        "message": {
                            "content": "{\"topics\":[{\"topic\":\"Mitochondria\",\"importance\":\"Energy production\"}]}"
                        }
                    }]
                }))
            }),
        );
        let base = spawn_mock(router).await;

        let client = ChatClient::new(base, "test-key".to_string(), "test-model".to_string());
        let topics = client.review_topics(&[question()]).await.unwrap();

        assert_eq!(topics[0].topic, "Mitochondria");
    }

    #[tokio::test]
    async fn test_api_error_is_surfaced() {
        let router = Router::new().route(
            "/chat/completions",
            post(|| async { (StatusCode::TOO_MANY_REQUESTS, "rate limited") }),
        );
        let base = spawn_mock(router).await;

        let client = ChatClient::new(base, "k".to_string(), "m".to_string());
        let err = client.review_topics(&[question()]).await.unwrap_err();

        assert!(matches!(err, LlmError::Api { status: 429, .. }));
    }
}
