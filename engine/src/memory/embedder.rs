//! Embedding provider used by the Memory Store.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbedderError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("unexpected response shape: {0}")]
    Response(String),
}

/// Produces a fixed-dimension embedding for a piece of text.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedderError>;
    fn dimension(&self) -> usize;
}

/// OpenAI `text-embedding-3-small`-class embedder, reached over HTTP
/// directly (the embedding provider is an external collaborator per §1,
/// not core transport surface like the MCP client).
pub struct OpenAiEmbedder {
    client: reqwest::Client,
    api_key: String,
    model: String,
    dimension: usize,
}

impl OpenAiEmbedder {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, dimension: usize) -> Self {
        Self { client: reqwest::Client::new(), api_key: api_key.into(), model: model.into(), dimension }
    }
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedderError> {
        let response = self
            .client
            .post("https://api.openai.com/v1/embeddings")
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({ "model": self.model, "input": text }))
            .send()
            .await
            .map_err(|e| EmbedderError::Request(e.to_string()))?;

        let parsed: EmbeddingResponse = response.json().await.map_err(|e| EmbedderError::Response(e.to_string()))?;
        parsed.data.into_iter().next().map(|d| d.embedding).ok_or_else(|| EmbedderError::Response("empty embedding data".into()))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
