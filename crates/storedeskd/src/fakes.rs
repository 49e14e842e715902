//! Recording fakes for the external services.
//!
//! Deterministic stand-ins for the model, embedding and vector services.
//! Every call is recorded so tests can assert which external calls were
//! made, and which were not.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use storedesk_shared::{ServiceError, TenantScope};

use crate::services::{Embedder, RetrievedDocument, TextGenerator, VectorSearch};

/// One recorded `generate` call
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateCall {
    pub model: String,
    pub prompt: String,
}

/// Text generator with scripted replies.
///
/// Replies are consumed in order; once the script runs out the last reply
/// is repeated.
pub struct FakeGenerator {
    script: Mutex<VecDeque<Result<String, ServiceError>>>,
    last: Mutex<Result<String, ServiceError>>,
    calls: Mutex<Vec<GenerateCall>>,
}

impl FakeGenerator {
    pub fn scripted(replies: Vec<Result<String, ServiceError>>) -> Self {
        let last = replies
            .last()
            .cloned()
            .unwrap_or(Err(ServiceError::EmptyResponse));
        Self {
            script: Mutex::new(replies.into()),
            last: Mutex::new(last),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Always reply with `text`
    pub fn replying(text: &str) -> Self {
        Self::scripted(vec![Ok(text.to_string())])
    }

    /// Always fail with `error`
    pub fn failing(error: ServiceError) -> Self {
        Self::scripted(vec![Err(error)])
    }

    pub fn calls(&self) -> Vec<GenerateCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait]
impl TextGenerator for FakeGenerator {
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, ServiceError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(GenerateCall {
                model: model.to_string(),
                prompt: prompt.to_string(),
            });

        let next = self
            .script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        match next {
            Some(reply) => {
                *self.last.lock().unwrap_or_else(|e| e.into_inner()) = reply.clone();
                reply
            }
            None => self.last.lock().unwrap_or_else(|e| e.into_inner()).clone(),
        }
    }
}

/// Embedder returning a constant vector of the configured dimension
pub struct FakeEmbedder {
    dimension: usize,
    vector_len: usize,
    error: Option<ServiceError>,
    texts: Mutex<Vec<String>>,
}

impl FakeEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vector_len: dimension,
            error: None,
            texts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: ServiceError) -> Self {
        Self {
            dimension: 0,
            vector_len: 0,
            error: Some(error),
            texts: Mutex::new(Vec::new()),
        }
    }

    /// Return vectors of `len` while still reporting the configured dimension
    pub fn with_vector_len(mut self, len: usize) -> Self {
        self.vector_len = len;
        self
    }

    /// Texts embedded so far
    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ServiceError> {
        self.texts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(text.to_string());
        match &self.error {
            Some(e) => Err(e.clone()),
            None => Ok(vec![0.5; self.vector_len]),
        }
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Vector search returning a fixed document list
pub struct FakeVectorSearch {
    documents: Result<Vec<RetrievedDocument>, ServiceError>,
    scopes: Mutex<Vec<TenantScope>>,
}

impl FakeVectorSearch {
    pub fn with_documents(documents: Vec<RetrievedDocument>) -> Self {
        Self {
            documents: Ok(documents),
            scopes: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: ServiceError) -> Self {
        Self {
            documents: Err(error),
            scopes: Mutex::new(Vec::new()),
        }
    }

    /// Scopes searched so far, in call order
    pub fn scopes(&self) -> Vec<TenantScope> {
        self.scopes.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn call_count(&self) -> usize {
        self.scopes.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait]
impl VectorSearch for FakeVectorSearch {
    async fn search(
        &self,
        _vector: &[f32],
        scope: &TenantScope,
        top_k: usize,
    ) -> Result<Vec<RetrievedDocument>, ServiceError> {
        self.scopes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(scope.clone());

        let mut docs = self.documents.clone()?;
        docs.sort_by(|a, b| b.score.total_cmp(&a.score));
        docs.truncate(top_k);
        Ok(docs)
    }
}
