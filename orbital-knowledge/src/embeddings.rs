use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::KnowledgeSettings;
use crate::errors::{KnowledgeError, KnowledgeResult};

/// Turns text into a dense vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> KnowledgeResult<Vec<f32>>;

    /// Model identifier stored next to every vector.
    fn model(&self) -> &str;
}

/// Embedding client for an Ollama-compatible `/api/embed` endpoint.
#[derive(Debug, Clone)]
pub struct OllamaEmbeddingClient {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaEmbeddingClient {
    pub fn new(settings: &KnowledgeSettings) -> KnowledgeResult<Self> {
        Ok(Self {
            base_url: settings.inference_url.trim_end_matches('/').to_string(),
            model: settings.embedding_model.clone(),
            client: build_http_client(settings.request_timeout_seconds)?,
        })
    }

    pub async fn embed_batch(&self, inputs: &[String]) -> KnowledgeResult<Vec<Vec<f32>>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/api/embed", self.base_url);
        let body = EmbedRequest {
            model: &self.model,
            input: inputs,
        };

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(KnowledgeError::Embedding(format!(
                "embedding request failed: {status} {text}"
            )));
        }

        let payload: EmbedResponse = response.json().await?;

        if let Some(embeddings) = payload.embeddings {
            if embeddings.len() != inputs.len() {
                return Err(KnowledgeError::Embedding(format!(
                    "expected {} vectors, got {}",
                    inputs.len(),
                    embeddings.len()
                )));
            }
            return Ok(embeddings);
        }

        if let Some(embedding) = payload.embedding {
            return Ok(vec![embedding]);
        }

        Err(KnowledgeError::Embedding(
            "embedding response missing vectors".to_string(),
        ))
    }
}

#[async_trait]
impl Embedder for OllamaEmbeddingClient {
    async fn embed(&self, text: &str) -> KnowledgeResult<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| KnowledgeError::Embedding("embedding response was empty".to_string()))
    }

    fn model(&self) -> &str {
        &self.model
    }
}

pub(crate) fn build_http_client(timeout_seconds: Option<u64>) -> KnowledgeResult<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if let Some(seconds) = timeout_seconds {
        builder = builder.timeout(Duration::from_secs(seconds));
    }
    Ok(builder.build()?)
}

#[derive(Debug, serde::Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Clone, Deserialize)]
struct EmbedResponse {
    embeddings: Option<Vec<Vec<f32>>>,
    embedding: Option<Vec<f32>>,
}
