//! Boundary traits for the external model and vector services.
//!
//! Production code uses the HTTP clients in `ollama` and `vector_store`.
//! Test code uses the recording fakes in `fakes`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use storedesk_shared::{ServiceError, TenantScope};

/// Prompt-in, text-out model call. Output is untrusted free text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, ServiceError>;
}

/// Text to fixed-length vector
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ServiceError>;

    fn dimension(&self) -> usize;
}

/// Nearest-neighbour search over one tenant's documents
#[async_trait]
pub trait VectorSearch: Send + Sync {
    /// Returns at most `top_k` documents, highest score first
    async fn search(
        &self,
        vector: &[f32],
        scope: &TenantScope,
        top_k: usize,
    ) -> Result<Vec<RetrievedDocument>, ServiceError>;
}

/// One search hit. `score` is inner-product similarity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedDocument {
    pub text: String,
    pub score: f32,
}

impl RetrievedDocument {
    pub fn new(text: &str, score: f32) -> Self {
        Self {
            text: text.to_string(),
            score,
        }
    }
}
