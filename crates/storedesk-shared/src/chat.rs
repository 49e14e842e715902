//! Inbound chat requests and outbound responses exchanged with the transport layer.

use serde::{Deserialize, Serialize};

use crate::language::Language;
use crate::route::RouteKind;

fn default_category() -> String {
    "customer".to_string()
}

/// One customer message for one store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub store_id: i64,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub language: Language,
}

impl ChatRequest {
    pub fn new(message: &str, store_id: i64) -> Self {
        Self {
            message: message.to_string(),
            store_id,
            category: default_category(),
            language: Language::default(),
        }
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = category.to_string();
        self
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    pub fn scope(&self) -> TenantScope {
        TenantScope {
            store_id: self.store_id,
            category: self.category.clone(),
        }
    }
}

/// Store/category pair isolating one business's documents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantScope {
    pub store_id: i64,
    pub category: String,
}

/// Answer returned to the transport layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
    pub route: RouteKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_tool: Option<String>,
    pub language: Language,
    pub language_changed: bool,
    /// Observability data; never shown to the end user
    pub diagnostics: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let req: ChatRequest =
            serde_json::from_str(r#"{"message": "안녕하세요", "store_id": 3}"#).unwrap();
        assert_eq!(req.category, "customer");
        assert_eq!(req.language, Language::Ko);
        assert_eq!(
            req.scope(),
            TenantScope { store_id: 3, category: "customer".to_string() }
        );
    }

    #[test]
    fn test_builder() {
        let req = ChatRequest::new("hi", 1)
            .with_category("owner")
            .with_language(Language::En);
        assert_eq!(req.category, "owner");
        assert_eq!(req.language, Language::En);
    }
}
