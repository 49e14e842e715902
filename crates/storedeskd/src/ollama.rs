//! Ollama HTTP clients for text generation and embeddings.

use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use storedesk_shared::ServiceError;
use tracing::debug;

use crate::services::{Embedder, TextGenerator};

const SERVICE: &str = "Ollama";

pub(crate) fn build_http_client(timeout_secs: u64) -> Result<reqwest::Client, ServiceError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ServiceError::Http(format!("Failed to create HTTP client: {}", e)))
}

pub(crate) fn map_request_error(e: reqwest::Error, timeout_secs: u64) -> ServiceError {
    if e.is_timeout() {
        ServiceError::Timeout(timeout_secs)
    } else {
        ServiceError::Http(format!("Request failed: {}", e))
    }
}

/// `POST /api/generate` client (non-streaming)
pub struct OllamaClient {
    endpoint: String,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl OllamaClient {
    pub fn new(endpoint: &str, timeout_secs: u64) -> Result<Self, ServiceError> {
        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            timeout_secs,
            client: build_http_client(timeout_secs)?,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl TextGenerator for OllamaClient {
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, ServiceError> {
        let body = json!({
            "model": model,
            "prompt": prompt,
            "stream": false
        });

        debug!("Ollama generate: model={}, prompt {} bytes", model, prompt.len());

        let response = self
            .client
            .post(format!("{}/api/generate", self.endpoint))
            .json(&body)
            .send()
            .await
            .map_err(|e| map_request_error(e, self.timeout_secs))?;

        if !response.status().is_success() {
            return Err(ServiceError::Status {
                service: SERVICE,
                status: response.status().as_u16(),
            });
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ServiceError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        let text = json
            .get("response")
            .and_then(|r| r.as_str())
            .ok_or(ServiceError::EmptyResponse)?
            .trim()
            .to_string();

        if text.is_empty() {
            return Err(ServiceError::EmptyResponse);
        }

        Ok(text)
    }
}

/// `POST /api/embed` client producing dense vectors of a fixed dimension
pub struct OllamaEmbedder {
    endpoint: String,
    model: String,
    dimension: usize,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl OllamaEmbedder {
    pub fn new(
        endpoint: &str,
        model: &str,
        dimension: usize,
        timeout_secs: u64,
    ) -> Result<Self, ServiceError> {
        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            dimension,
            timeout_secs,
            client: build_http_client(timeout_secs)?,
        })
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ServiceError> {
        let body = json!({
            "model": self.model,
            "input": text
        });

        let response = self
            .client
            .post(format!("{}/api/embed", self.endpoint))
            .json(&body)
            .send()
            .await
            .map_err(|e| map_request_error(e, self.timeout_secs))?;

        if !response.status().is_success() {
            return Err(ServiceError::Status {
                service: SERVICE,
                status: response.status().as_u16(),
            });
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ServiceError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        let vector: Vec<f32> = json
            .get("embeddings")
            .and_then(|e| e.as_array())
            .and_then(|rows| rows.first())
            .and_then(|row| row.as_array())
            .ok_or(ServiceError::EmptyResponse)?
            .iter()
            .filter_map(|v| v.as_f64())
            .map(|v| v as f32)
            .collect();

        if vector.len() != self.dimension {
            return Err(ServiceError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }

        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
