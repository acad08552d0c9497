//! OpenAI embedding provider.
//!
//! Talks to the `/embeddings` endpoint of the OpenAI API or any compatible
//! server. The whole batch goes out in one request; the response items are
//! put back in input order using their `index` field.

use crate::client::EmbeddingClient;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument, warn};
use ward_core::{AppError, AppResult};

pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";
const EMBEDDING_ENDPOINT: &str = "/embeddings";

/// Maximum attempts per request
const MAX_RETRIES: u32 = 3;

/// Initial backoff duration in milliseconds
const INITIAL_BACKOFF_MS: u64 = 100;

/// Default request timeout in seconds
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Embedding provider backed by an OpenAI-compatible HTTP API.
#[derive(Clone)]
pub struct OpenAiEmbedder {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    /// Expected dimensionality, 0 disables the check
    dimensions: usize,
}

impl std::fmt::Debug for OpenAiEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiEmbedder")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("dimensions", &self.dimensions)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Outcome of a single failed attempt.
enum Failure {
    Retryable(AppError),
    Fatal(AppError),
}

impl OpenAiEmbedder {
    /// Create a provider for the public OpenAI API.
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        dimensions: usize,
    ) -> AppResult<Self> {
        Self::with_options(
            api_key,
            model,
            dimensions,
            DEFAULT_OPENAI_URL,
            REQUEST_TIMEOUT_SECS,
        )
    }

    /// Create a provider with a custom base URL and timeout.
    pub fn with_options(
        api_key: impl Into<String>,
        model: impl Into<String>,
        dimensions: usize,
        base_url: &str,
        timeout_secs: u64,
    ) -> AppResult<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(AppError::Embedding(
                "OpenAI provider requires API key".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AppError::Embedding(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model: model.into(),
            dimensions,
        })
    }

    #[instrument(skip(self, texts), fields(batch_size = texts.len(), model = %self.model))]
    async fn embed_with_retries(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.embed_once(texts).await {
                Ok(embeddings) => return Ok(embeddings),
                Err(Failure::Fatal(e)) => return Err(e),
                Err(Failure::Retryable(e)) if attempt >= MAX_RETRIES => return Err(e),
                Err(Failure::Retryable(e)) => {
                    let backoff_ms = INITIAL_BACKOFF_MS * 2_u64.pow(attempt - 1);
                    warn!(
                        "Embedding request failed (attempt {}/{}): {}; retrying in {}ms",
                        attempt, MAX_RETRIES, e, backoff_ms
                    );
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                }
            }
        }
    }

    async fn embed_once(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, Failure> {
        let url = format!("{}{}", self.base_url, EMBEDDING_ENDPOINT);
        let request = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };

        debug!("Sending embedding request to {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                Failure::Retryable(AppError::Embedding(format!(
                    "Failed to send embedding request: {}",
                    e
                )))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let message = serde_json::from_str::<ErrorResponse>(&error_text)
                .map(|r| r.error.message)
                .unwrap_or(error_text);
            let err = AppError::Embedding(format!("Embedding API error ({}): {}", status, message));

            return Err(if is_retryable(status) {
                Failure::Retryable(err)
            } else {
                Failure::Fatal(err)
            });
        }

        let body: EmbeddingResponse = response.json().await.map_err(|e| {
            Failure::Fatal(AppError::Embedding(format!(
                "Failed to parse embedding response: {}",
                e
            )))
        })?;

        self.order_and_check(texts.len(), body).map_err(Failure::Fatal)
    }

    /// Put items back in input order and verify count and dimensionality.
    fn order_and_check(&self, expected: usize, body: EmbeddingResponse) -> AppResult<Vec<Vec<f32>>> {
        if body.data.len() != expected {
            return Err(AppError::Embedding(format!(
                "Expected {} embeddings, got {}",
                expected,
                body.data.len()
            )));
        }

        let mut slots: Vec<Option<Vec<f32>>> = vec![None; expected];
        for item in body.data {
            let slot = slots.get_mut(item.index).ok_or_else(|| {
                AppError::Embedding(format!("Embedding index {} out of range", item.index))
            })?;

            if self.dimensions > 0 && item.embedding.len() != self.dimensions {
                return Err(AppError::Embedding(format!(
                    "Unexpected embedding dimensions: got {}, expected {}",
                    item.embedding.len(),
                    self.dimensions
                )));
            }
            *slot = Some(item.embedding);
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(i, slot)| {
                slot.ok_or_else(|| AppError::Embedding(format!("Missing embedding for input {}", i)))
            })
            .collect()
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

#[async_trait]
impl EmbeddingClient for OpenAiEmbedder {
    fn provider_name(&self) -> &str {
        "openai"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        if let Some(i) = texts.iter().position(|t| t.trim().is_empty()) {
            return Err(AppError::Embedding(format!(
                "Cannot embed empty text (input {})",
                i
            )));
        }

        self.embed_with_retries(texts).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, StatusCode as AxumStatus};
    use axum::routing::post;
    use axum::{Json, Router};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    async fn spawn_mock(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    /// Answers with items in reverse order; each vector encodes its input index.
    async fn reversed_embeddings(
        headers: HeaderMap,
        Json(body): Json<serde_json::Value>,
    ) -> (AxumStatus, Json<serde_json::Value>) {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if auth != "Bearer test-key" {
            return (
                AxumStatus::UNAUTHORIZED,
                Json(serde_json::json!({"error": {"message": "Invalid API key"}})),
            );
        }

        let count = body["input"].as_array().map(|a| a.len()).unwrap_or(0);
        let data: Vec<_> = (0..count)
            .rev()
            .map(|i| serde_json::json!({"index": i, "embedding": [i as f32, 1.0, 0.0]}))
            .collect();
        (AxumStatus::OK, Json(serde_json::json!({"data": data})))
    }

    #[tokio::test]
    async fn test_batch_is_returned_in_input_order() {
        let url = spawn_mock(Router::new().route("/embeddings", post(reversed_embeddings))).await;
        let provider =
            OpenAiEmbedder::with_options("test-key", "text-embedding-3-small", 3, &url, 5).unwrap();

        let texts = vec![
            "thu tuc".to_string(),
            "khai sinh".to_string(),
            "ket hon".to_string(),
        ];
        let embeddings = provider.embed_batch(&texts).await.unwrap();

        assert_eq!(embeddings.len(), 3);
        for (i, embedding) in embeddings.iter().enumerate() {
            assert_eq!(embedding[0], i as f32);
        }
    }

    #[tokio::test]
    async fn test_single_embed() {
        let url = spawn_mock(Router::new().route("/embeddings", post(reversed_embeddings))).await;
        let provider = OpenAiEmbedder::with_options("test-key", "m", 3, &url, 5).unwrap();

        let embedding = provider.embed("lịch làm việc").await.unwrap();
        assert_eq!(embedding, vec![0.0, 1.0, 0.0]);
    }

    #[tokio::test]
    async fn test_auth_error_is_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let router = Router::new().route(
            "/embeddings",
            post(move |headers: HeaderMap, body: Json<serde_json::Value>| {
                counter.fetch_add(1, Ordering::SeqCst);
                reversed_embeddings(headers, body)
            }),
        );
        let url = spawn_mock(router).await;
        let provider = OpenAiEmbedder::with_options("wrong-key", "m", 3, &url, 5).unwrap();

        let err = provider.embed("xin chao").await.unwrap_err();
        assert!(err.to_string().contains("Invalid API key"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_server_error_is_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let router = Router::new().route(
            "/embeddings",
            post(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { (AxumStatus::SERVICE_UNAVAILABLE, "overloaded") }
            }),
        );
        let url = spawn_mock(router).await;
        let provider = OpenAiEmbedder::with_options("test-key", "m", 3, &url, 5).unwrap();

        assert!(provider.embed("xin chao").await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), MAX_RETRIES);
    }

    #[tokio::test]
    async fn test_dimension_mismatch() {
        let url = spawn_mock(Router::new().route("/embeddings", post(reversed_embeddings))).await;
        let provider = OpenAiEmbedder::with_options("test-key", "m", 1536, &url, 5).unwrap();

        let err = provider.embed("xin chao").await.unwrap_err();
        assert!(err.to_string().contains("Unexpected embedding dimensions"));
    }

    #[tokio::test]
    async fn test_empty_text_rejected() {
        let provider = OpenAiEmbedder::new("test-key", "m", 3).unwrap();
        assert!(provider.embed("   ").await.is_err());
        assert!(provider.embed_batch(&[]).await.unwrap().is_empty());
    }

    #[test]
    fn test_requires_api_key() {
        assert!(OpenAiEmbedder::new("", "m", 3).is_err());
    }

    #[test]
    fn test_debug_hides_key() {
        let provider = OpenAiEmbedder::new("sk-secret", "m", 3).unwrap();
        assert!(!format!("{:?}", provider).contains("sk-secret"));
    }
}
