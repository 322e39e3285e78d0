use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::KnowledgeSettings;
use crate::embeddings::build_http_client;
use crate::errors::{KnowledgeError, KnowledgeResult};

/// System prompt used when deriving a note's summary.
pub const SUMMARY_SYSTEM_PROMPT: &str = "You summarize personal notes. Reply with a concise \
summary of the note in two or three plain sentences. Keep names, dates and decisions. \
Do not add commentary or formatting.";

/// Single-turn chat completion.
#[async_trait]
pub trait ChatCompleter: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> KnowledgeResult<String>;
}

/// Chat client for an Ollama-compatible `/api/chat` endpoint.
#[derive(Debug, Clone)]
pub struct OllamaChatClient {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaChatClient {
    /// Client for the configured `chat_model`.
    pub fn new(settings: &KnowledgeSettings) -> KnowledgeResult<Self> {
        Self::with_model(settings, &settings.chat_model)
    }

    /// Client for the configured `completion_model`.
    pub fn for_completion(settings: &KnowledgeSettings) -> KnowledgeResult<Self> {
        Self::with_model(settings, &settings.completion_model)
    }

    fn with_model(settings: &KnowledgeSettings, model: &str) -> KnowledgeResult<Self> {
        Ok(Self {
            base_url: settings.inference_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client: build_http_client(settings.request_timeout_seconds)?,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ChatCompleter for OllamaChatClient {
    async fn complete(&self, system: &str, user: &str) -> KnowledgeResult<String> {
        let url = format!("{}/api/chat", self.base_url);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            stream: false,
        };

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(KnowledgeError::Chat(format!(
                "chat request failed: {status} {text}"
            )));
        }

        let payload: ChatResponse = response.json().await?;
        payload
            .message
            .map(|message| message.content.trim().to_string())
            .ok_or_else(|| KnowledgeError::Chat("chat response missing message".to_string()))
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<ChatResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_disables_streaming() {
        let body = ChatRequest {
            model: "llama3.2",
            messages: vec![ChatMessage {
                role: "user",
                content: "hi",
            }],
            stream: false,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["stream"], serde_json::Value::Bool(false));
        assert_eq!(json["messages"][0]["role"], "user");
    }

    #[test]
    fn completion_client_uses_completion_model() {
        let mut settings = KnowledgeSettings::default();
        settings.completion_model = "qwen2.5-coder".to_string();
        let client = OllamaChatClient::for_completion(&settings).unwrap();
        assert_eq!(client.model(), "qwen2.5-coder");
    }
}
