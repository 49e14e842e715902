//! Configuration management for storedeskd.
//!
//! Loads settings from /etc/storedesk/config.toml or uses defaults.
//! Service endpoints can be overridden from the environment.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use storedesk_shared::Language;
use tracing::{info, warn};

use crate::shaping::DEFAULT_MAX_CHARS;

/// Config file path
pub const CONFIG_PATH: &str = "/etc/storedesk/config.toml";

/// Default config file path for fallback
pub const DEFAULT_CONFIG_PATH: &str = "/var/lib/storedesk/config.toml";

pub const ENV_OLLAMA_URL: &str = "STOREDESK_OLLAMA_URL";
pub const ENV_ROUTER_URL: &str = "STOREDESK_ROUTER_URL";
pub const ENV_MILVUS_URL: &str = "STOREDESK_MILVUS_URL";
pub const ENV_MILVUS_TOKEN: &str = "STOREDESK_MILVUS_TOKEN";

/// Text generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Ollama endpoint for the generation model
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,

    /// Ollama endpoint for the classification model (same as `endpoint` if unset)
    #[serde(default)]
    pub router_endpoint: Option<String>,

    /// Model for routing (classification) - fast, small
    #[serde(default = "default_router_model")]
    pub router_model: String,

    /// Model for answers and tool narration - capable, accurate
    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    #[serde(default = "default_router_timeout")]
    pub router_timeout_secs: u64,

    #[serde(default = "default_chat_timeout")]
    pub chat_timeout_secs: u64,
}

fn default_llm_endpoint() -> String {
    "http://127.0.0.1:11434".to_string()
}

fn default_router_model() -> String {
    "qwen2.5:0.5b-instruct".to_string()
}

fn default_chat_model() -> String {
    "qwen2.5:7b-instruct".to_string()
}

fn default_router_timeout() -> u64 {
    10
}

fn default_chat_timeout() -> u64 {
    60
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_llm_endpoint(),
            router_endpoint: None,
            router_model: default_router_model(),
            chat_model: default_chat_model(),
            router_timeout_secs: default_router_timeout(),
            chat_timeout_secs: default_chat_timeout(),
        }
    }
}

impl LlmConfig {
    pub fn router_endpoint(&self) -> &str {
        self.router_endpoint.as_deref().unwrap_or(&self.endpoint)
    }
}

/// Embedding service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Vector length produced by `model`
    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,

    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,
}

fn default_embedding_model() -> String {
    "bge-m3".to_string()
}

fn default_embedding_dimension() -> usize {
    1024
}

fn default_embedding_timeout() -> u64 {
    30
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            dimension: default_embedding_dimension(),
            timeout_secs: default_embedding_timeout(),
        }
    }
}

/// Vector index and relevance gate configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Milvus REST endpoint
    #[serde(default = "default_retrieval_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_collection")]
    pub collection: String,

    #[serde(default)]
    pub token: Option<String>,

    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Best document score below this answers "don't know" without generation
    #[serde(default = "default_relevance_threshold")]
    pub relevance_threshold: f32,

    /// Characters of each document kept in diagnostics
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,

    #[serde(default = "default_retrieval_timeout")]
    pub timeout_secs: u64,
}

fn default_retrieval_endpoint() -> String {
    "http://127.0.0.1:19530".to_string()
}

fn default_collection() -> String {
    "store_documents".to_string()
}

fn default_top_k() -> usize {
    5
}

fn default_relevance_threshold() -> f32 {
    0.3
}

fn default_preview_chars() -> usize {
    200
}

fn default_retrieval_timeout() -> u64 {
    10
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            endpoint: default_retrieval_endpoint(),
            collection: default_collection(),
            token: None,
            top_k: default_top_k(),
            relevance_threshold: default_relevance_threshold(),
            preview_chars: default_preview_chars(),
            timeout_secs: default_retrieval_timeout(),
        }
    }
}

/// Response shaping configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerConfig {
    /// Hard cap on model-generated answers, in characters
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,

    #[serde(default)]
    pub default_language: Language,
}

fn default_max_chars() -> usize {
    DEFAULT_MAX_CHARS
}

impl Default for AnswerConfig {
    fn default() -> Self {
        Self {
            max_chars: default_max_chars(),
            default_language: Language::default(),
        }
    }
}

/// Router configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Language picked by the keyword fallback when a language change
    /// request names no recognizable language
    #[serde(default = "default_fallback_language")]
    pub fallback_language: Language,

    /// Classification prompts larger than this skip the classifier
    #[serde(default = "default_max_prompt_bytes")]
    pub max_prompt_bytes: usize,
}

fn default_fallback_language() -> Language {
    Language::En
}

fn default_max_prompt_bytes() -> usize {
    16_384
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            fallback_language: default_fallback_language(),
            max_prompt_bytes: default_max_prompt_bytes(),
        }
    }
}

/// Full daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,

    #[serde(default)]
    pub answer: AnswerConfig,

    #[serde(default)]
    pub router: RouterConfig,
}

impl Config {
    /// Load config from file, or return defaults. Environment overrides apply either way.
    pub fn load() -> Self {
        let mut config = Self::load_from_path(CONFIG_PATH)
            .or_else(|_| Self::load_from_path(DEFAULT_CONFIG_PATH))
            .unwrap_or_else(|e| {
                warn!("Config not found, using defaults: {}", e);
                Config::default()
            });
        config.apply_overrides(|key| env::var(key).ok());
        config
    }

    /// Load config from specific path
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Apply endpoint overrides; `lookup` is `std::env::var` outside tests
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_OLLAMA_URL) {
            self.llm.endpoint = url;
        }
        if let Some(url) = lookup(ENV_ROUTER_URL) {
            self.llm.router_endpoint = Some(url);
        }
        if let Some(url) = lookup(ENV_MILVUS_URL) {
            self.retrieval.endpoint = url;
        }
        if let Some(token) = lookup(ENV_MILVUS_TOKEN) {
            self.retrieval.token = Some(token);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.llm.router_model, "qwen2.5:0.5b-instruct");
        assert_eq!(config.llm.chat_model, "qwen2.5:7b-instruct");
        assert_eq!(config.retrieval.top_k, 5);
        assert!((config.retrieval.relevance_threshold - 0.3).abs() < f32::EPSILON);
        assert_eq!(config.answer.max_chars, 50);
        assert_eq!(config.answer.default_language, Language::Ko);
        assert_eq!(config.router.fallback_language, Language::En);
    }

    #[test]
    fn test_router_endpoint_falls_back_to_main() {
        let mut config = Config::default();
        assert_eq!(config.llm.router_endpoint(), "http://127.0.0.1:11434");
        config.llm.router_endpoint = Some("http://10.0.0.2:11434".to_string());
        assert_eq!(config.llm.router_endpoint(), "http://10.0.0.2:11434");
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
[llm]
router_model = "custom:1b"
chat_timeout_secs = 5

[retrieval]
relevance_threshold = 0.5

[answer]
default_language = "ja"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.llm.router_model, "custom:1b");
        assert_eq!(config.llm.chat_timeout_secs, 5);
        assert!((config.retrieval.relevance_threshold - 0.5).abs() < f32::EPSILON);
        assert_eq!(config.answer.default_language, Language::Ja);
        // Defaults for missing fields
        assert_eq!(config.llm.chat_model, "qwen2.5:7b-instruct");
        assert_eq!(config.embedding.dimension, 1024);
    }

    #[test]
    fn test_load_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[router]\nfallback_language = \"zh\"").unwrap();
        let config = Config::load_from_path(file.path()).unwrap();
        assert_eq!(config.router.fallback_language, Language::Zh);
    }

    #[test]
    fn test_load_from_missing_path_errors() {
        assert!(Config::load_from_path("/nonexistent/storedesk.toml").is_err());
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            (ENV_OLLAMA_URL, "http://gpu:11434"),
            (ENV_MILVUS_TOKEN, "secret"),
        ]
        .into_iter()
        .collect();
        let mut config = Config::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(config.llm.endpoint, "http://gpu:11434");
        assert_eq!(config.retrieval.token.as_deref(), Some("secret"));
        assert_eq!(config.retrieval.endpoint, "http://127.0.0.1:19530");
    }
}
