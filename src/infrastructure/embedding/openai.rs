//! OpenAI-compatible embedding provider implementation
//!
//! Works against any server exposing `POST /v1/embeddings`, including
//! self-hosted text-embedding servers running sentence-transformer models.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;

use crate::domain::DomainError;
use crate::domain::embedding::EmbeddingProvider;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";
const DEFAULT_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Configuration for the OpenAI-compatible provider
#[derive(Debug, Clone)]
pub struct OpenAiEmbeddingConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    /// Expected vector length; responses of another length are rejected
    pub dimensions: Option<usize>,
}

impl Default for OpenAiEmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(30),
            dimensions: None,
        }
    }
}

impl OpenAiEmbeddingConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = Some(dimensions);
        self
    }
}

/// Embedding provider backed by an OpenAI-compatible HTTP endpoint.
///
/// `encode` blocks the current thread until the response arrives, so it must
/// be called from the blocking pool (`tokio::task::spawn_blocking`), never
/// directly from an async task.
#[derive(Debug)]
pub struct OpenAiEmbeddingProvider {
    client: reqwest::Client,
    runtime: Handle,
    embeddings_url: String,
    auth_header: Option<String>,
    model: String,
    dimensions: Option<usize>,
}

impl OpenAiEmbeddingProvider {
    /// Creates the provider. Must be called from within a tokio runtime.
    pub fn new(config: OpenAiEmbeddingConfig) -> Result<Self, DomainError> {
        let runtime = Handle::try_current().map_err(|e| {
            DomainError::configuration(format!(
                "Embedding provider requires a tokio runtime: {}",
                e
            ))
        })?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                DomainError::configuration(format!("Failed to build HTTP client: {}", e))
            })?;

        let base_url = config.base_url.trim_end_matches('/');

        Ok(Self {
            client,
            runtime,
            embeddings_url: format!("{}/v1/embeddings", base_url),
            auth_header: config.api_key.map(|key| format!("Bearer {}", key)),
            model: config.model,
            dimensions: config.dimensions,
        })
    }

    async fn request(&self, text: &str) -> Result<Vec<f32>, DomainError> {
        let body = EmbeddingRequest {
            model: &self.model,
            input: text,
        };

        let mut request = self.client.post(&self.embeddings_url).json(&body);

        if let Some(auth) = &self.auth_header {
            request = request.header("Authorization", auth);
        }

        let response = request
            .send()
            .await
            .map_err(|e| DomainError::internal(format!("Embedding request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(DomainError::internal(format!(
                "Embedding server returned {}: {}",
                status, error_body
            )));
        }

        let parsed: EmbeddingResponse = response.json().await.map_err(|e| {
            DomainError::internal(format!("Failed to parse embedding response: {}", e))
        })?;

        let embedding = parsed
            .data
            .into_iter()
            .min_by_key(|d| d.index)
            .map(|d| d.embedding)
            .ok_or_else(|| DomainError::internal("Embedding response contained no data"))?;

        if let Some(expected) = self.dimensions {
            if embedding.len() != expected {
                return Err(DomainError::dimension_mismatch(expected, embedding.len()));
            }
        }

        Ok(embedding)
    }
}

impl EmbeddingProvider for OpenAiEmbeddingProvider {
    fn encode(&self, text: &str) -> Result<Vec<f32>, DomainError> {
        self.runtime.block_on(self.request(text))
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }

    fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn embedding_body(vectors: &[Vec<f32>]) -> serde_json::Value {
        let data: Vec<serde_json::Value> = vectors
            .iter()
            .enumerate()
            .map(|(i, v)| {
                serde_json::json!({
                    "object": "embedding",
                    "index": i,
                    "embedding": v,
                })
            })
            .collect();

        serde_json::json!({
            "object": "list",
            "model": DEFAULT_MODEL,
            "data": data,
            "usage": { "prompt_tokens": 3, "total_tokens": 3 }
        })
    }

    async fn encode_blocking(
        provider: OpenAiEmbeddingProvider,
        text: &'static str,
    ) -> Result<Vec<f32>, DomainError> {
        let provider = Arc::new(provider);
        tokio::task::spawn_blocking(move || provider.encode(text))
            .await
            .unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_encode_returns_embedding() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .and(body_partial_json(serde_json::json!({
                "model": DEFAULT_MODEL,
                "input": "Software Engineer"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(embedding_body(&[vec![
                0.1, 0.2, 0.3,
            ]])))
            .expect(1)
            .mount(&server)
            .await;

        let provider =
            OpenAiEmbeddingProvider::new(OpenAiEmbeddingConfig::new(server.uri())).unwrap();

        let vector = encode_blocking(provider, "Software Engineer").await.unwrap();
        assert_eq!(vector, vec![0.1, 0.2, 0.3]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_encode_sends_bearer_token() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .and(header("Authorization", "Bearer secret"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(embedding_body(&[vec![1.0, 0.0]])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let config = OpenAiEmbeddingConfig::new(server.uri()).with_api_key("secret");
        let provider = OpenAiEmbeddingProvider::new(config).unwrap();

        assert!(encode_blocking(provider, "Plumber").await.is_ok());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_encode_server_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(500).set_body_string("model not loaded"))
            .mount(&server)
            .await;

        let provider =
            OpenAiEmbeddingProvider::new(OpenAiEmbeddingConfig::new(server.uri())).unwrap();

        let err = encode_blocking(provider, "Plumber").await.unwrap_err();
        assert!(matches!(err, DomainError::Internal { .. }));
        assert!(err.to_string().contains("model not loaded"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_encode_rejects_unexpected_dimensions() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(embedding_body(&[vec![1.0, 0.0]])),
            )
            .mount(&server)
            .await;

        let config = OpenAiEmbeddingConfig::new(server.uri()).with_dimensions(384);
        let provider = OpenAiEmbeddingProvider::new(config).unwrap();

        let err = encode_blocking(provider, "Plumber").await.unwrap_err();
        assert!(matches!(
            err,
            DomainError::DimensionMismatch {
                expected: 384,
                actual: 2
            }
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_encode_empty_data() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(embedding_body(&[])))
            .mount(&server)
            .await;

        let provider =
            OpenAiEmbeddingProvider::new(OpenAiEmbeddingConfig::new(server.uri())).unwrap();

        assert!(encode_blocking(provider, "Plumber").await.is_err());
    }

    #[test]
    fn test_new_outside_runtime_fails() {
        let result = OpenAiEmbeddingProvider::new(OpenAiEmbeddingConfig::default());
        assert!(matches!(result, Err(DomainError::Configuration { .. })));
    }

    #[tokio::test]
    async fn test_provider_metadata() {
        let config = OpenAiEmbeddingConfig::default().with_dimensions(384);
        let provider = OpenAiEmbeddingProvider::new(config).unwrap();

        assert_eq!(provider.provider_name(), "openai");
        assert_eq!(provider.dimensions(), Some(384));
        assert_eq!(provider.embeddings_url, "http://127.0.0.1:8080/v1/embeddings");
    }
}
