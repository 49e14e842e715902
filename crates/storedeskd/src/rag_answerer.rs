//! Retrieval-augmented answerer.
//!
//! Embeds the query, searches the tenant's documents and only calls the
//! generation model when the best document clears the relevance threshold.
//! Below the threshold the fixed "don't know" template is returned.

use serde::Serialize;
use std::sync::Arc;
use storedesk_shared::{Language, ServiceError, TenantScope};
use tracing::{debug, info, warn};

use crate::config::{Config, RetrievalConfig};
use crate::prompts::retrieval_prompt;
use crate::services::{Embedder, RetrievedDocument, TextGenerator, VectorSearch};
use crate::shaping::shape_answer;

/// How a retrieval answer was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RagOutcome {
    Answered,
    NoDocuments,
    LowRelevance,
    EmbeddingFailed,
    SearchFailed,
    GenerationFailed,
}

/// One retrieved document as shown in diagnostics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocPreview {
    pub score: f32,
    pub text_preview: String,
}

/// Observability data for one retrieval answer. Never shown to the customer.
#[derive(Debug, Clone, Serialize)]
pub struct RagDiagnostics {
    pub outcome: RagOutcome,
    pub retrieved_docs: Vec<DocPreview>,
    pub max_score: Option<f32>,
    pub relevance_threshold: f32,
    pub context_length: usize,
    pub final_prompt: Option<String>,
    pub llm_model: Option<String>,
    pub raw_answer: Option<String>,
    pub error: Option<String>,
}

impl RagDiagnostics {
    fn new(outcome: RagOutcome, relevance_threshold: f32) -> Self {
        Self {
            outcome,
            retrieved_docs: Vec::new(),
            max_score: None,
            relevance_threshold,
            context_length: 0,
            final_prompt: None,
            llm_model: None,
            raw_answer: None,
            error: None,
        }
    }

    /// True if the generation model was called
    pub fn generated(&self) -> bool {
        self.final_prompt.is_some()
    }
}

/// Final retrieval answer plus diagnostics
#[derive(Debug, Clone)]
pub struct RagAnswer {
    pub text: String,
    pub diagnostics: RagDiagnostics,
}

fn preview(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Highest score among `docs`; NaN scores are ignored
fn best_score(docs: &[RetrievedDocument]) -> Option<f32> {
    docs.iter()
        .map(|d| d.score)
        .filter(|s| !s.is_nan())
        .fold(None, |best, s| Some(best.map_or(s, |b: f32| b.max(s))))
}

pub struct RagAnswerer {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorSearch>,
    generator: Arc<dyn TextGenerator>,
    model: String,
    top_k: usize,
    relevance_threshold: f32,
    preview_chars: usize,
    max_chars: usize,
}

impl RagAnswerer {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorSearch>,
        generator: Arc<dyn TextGenerator>,
        model: &str,
    ) -> Self {
        let defaults = Config::default();
        Self {
            embedder,
            index,
            generator,
            model: model.to_string(),
            top_k: defaults.retrieval.top_k,
            relevance_threshold: defaults.retrieval.relevance_threshold,
            preview_chars: defaults.retrieval.preview_chars,
            max_chars: defaults.answer.max_chars,
        }
    }

    /// Take `top_k`, threshold and preview length from config
    pub fn with_retrieval(mut self, config: &RetrievalConfig) -> Self {
        self.top_k = config.top_k;
        self.relevance_threshold = config.relevance_threshold;
        self.preview_chars = config.preview_chars;
        self
    }

    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }

    /// Answer `query` from the documents of `scope`, in `language`
    pub async fn answer(&self, query: &str, scope: &TenantScope, language: Language) -> RagAnswer {
        info!(
            "RAG: query for store {} ({}), top_k {}",
            scope.store_id, scope.category, self.top_k
        );

        let vector = match self.embedder.embed(query).await {
            Ok(v) => v,
            Err(e) => {
                warn!("RAG: embedding failed: {}", e);
                return self.degrade(RagOutcome::EmbeddingFailed, language.apology(), e.to_string());
            }
        };
        let expected = self.embedder.dimension();
        if vector.len() != expected {
            let e = ServiceError::DimensionMismatch {
                expected,
                actual: vector.len(),
            };
            warn!("RAG: {}", e);
            return self.degrade(RagOutcome::EmbeddingFailed, language.apology(), e.to_string());
        }

        let docs = match self.index.search(&vector, scope, self.top_k).await {
            Ok(docs) => docs,
            Err(e) => {
                warn!("RAG: vector search failed: {}", e);
                return self.degrade(RagOutcome::SearchFailed, language.dont_know(), e.to_string());
            }
        };

        let mut diagnostics = RagDiagnostics::new(RagOutcome::Answered, self.relevance_threshold);
        diagnostics.retrieved_docs = docs
            .iter()
            .map(|d| DocPreview {
                score: d.score,
                text_preview: preview(&d.text, self.preview_chars),
            })
            .collect();
        for (i, doc) in docs.iter().enumerate() {
            info!("  [{}] score {:.4}", i + 1, doc.score);
        }

        let Some(max_score) = best_score(&docs) else {
            warn!("RAG: no documents found");
            diagnostics.outcome = RagOutcome::NoDocuments;
            return RagAnswer {
                text: language.dont_know().to_string(),
                diagnostics,
            };
        };
        diagnostics.max_score = Some(max_score);

        if max_score < self.relevance_threshold {
            warn!(
                "RAG: best score {:.4} below threshold {:.2}",
                max_score, self.relevance_threshold
            );
            diagnostics.outcome = RagOutcome::LowRelevance;
            return RagAnswer {
                text: language.dont_know().to_string(),
                diagnostics,
            };
        }

        let context = docs
            .iter()
            .map(|d| d.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        let prompt = retrieval_prompt(query, &context, language, self.max_chars);
        diagnostics.context_length = context.chars().count();
        diagnostics.llm_model = Some(self.model.clone());
        debug!("RAG: prompt {} bytes", prompt.len());

        let result = self.generator.generate(&self.model, &prompt).await;
        diagnostics.final_prompt = Some(prompt);
        match result {
            Ok(raw) => {
                let text = shape_answer(&raw, language, self.max_chars);
                info!("RAG: answer {} chars", text.chars().count());
                diagnostics.raw_answer = Some(raw);
                RagAnswer { text, diagnostics }
            }
            Err(e) => {
                warn!("RAG: generation failed: {}", e);
                diagnostics.outcome = RagOutcome::GenerationFailed;
                diagnostics.error = Some(e.to_string());
                RagAnswer {
                    text: language.apology().to_string(),
                    diagnostics,
                }
            }
        }
    }

    fn degrade(&self, outcome: RagOutcome, text: &str, error: String) -> RagAnswer {
        let mut diagnostics = RagDiagnostics::new(outcome, self.relevance_threshold);
        diagnostics.error = Some(error);
        RagAnswer {
            text: text.to_string(),
            diagnostics,
        }
    }
}
