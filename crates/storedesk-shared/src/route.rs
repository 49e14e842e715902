//! Routing decisions produced by the request router.

use serde::{Deserialize, Serialize};

use crate::tool::{ExecutionCategory, ToolParams};

/// Fulfillment strategy for one message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "route", rename_all = "snake_case")]
pub enum Route {
    /// Invoke a cataloged tool
    ToolCall {
        tool_name: String,
        params: ToolParams,
        execution_category: ExecutionCategory,
    },
    /// Answer from retrieved store documents
    RetrievalQuery { query: String },
    /// Plain conversational reply
    ConversationalQuery { query: String },
}

impl Route {
    pub fn kind(&self) -> RouteKind {
        match self {
            Self::ToolCall { .. } => RouteKind::ToolCall,
            Self::RetrievalQuery { .. } => RouteKind::RetrievalQuery,
            Self::ConversationalQuery { .. } => RouteKind::ConversationalQuery,
        }
    }

    pub fn tool_name(&self) -> Option<&str> {
        match self {
            Self::ToolCall { tool_name, .. } => Some(tool_name),
            _ => None,
        }
    }
}

/// Route variant without its payload, as reported to the transport layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteKind {
    ToolCall,
    RetrievalQuery,
    ConversationalQuery,
}

impl std::fmt::Display for RouteKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::ToolCall => "tool_call",
            Self::RetrievalQuery => "retrieval_query",
            Self::ConversationalQuery => "conversational_query",
        };
        write!(f, "{}", s)
    }
}

/// Which stage of the router produced a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSource {
    Classifier,
    Heuristic,
    Fallback,
}

/// Router output. `confidence` and `reasoning` are diagnostic only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteDecision {
    #[serde(flatten)]
    pub route: Route,
    pub confidence: f32,
    pub reasoning: String,
    pub source: DecisionSource,
}

impl RouteDecision {
    pub fn new(route: Route, confidence: f32, reasoning: &str, source: DecisionSource) -> Self {
        Self {
            route,
            confidence: confidence.clamp(0.0, 1.0),
            reasoning: reasoning.to_string(),
            source,
        }
    }

    pub fn kind(&self) -> RouteKind {
        self.route.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_confidence_is_clamped() {
        let decision = RouteDecision::new(
            Route::ConversationalQuery { query: "hi".to_string() },
            1.7,
            "test",
            DecisionSource::Classifier,
        );
        assert_eq!(decision.confidence, 1.0);
    }

    #[test]
    fn test_serializes_flat_with_route_tag() {
        let decision = RouteDecision::new(
            Route::RetrievalQuery { query: "영업시간".to_string() },
            0.9,
            "store info",
            DecisionSource::Heuristic,
        );
        let value = serde_json::to_value(&decision).unwrap();
        assert_eq!(value["route"], json!("retrieval_query"));
        assert_eq!(value["query"], json!("영업시간"));
        assert_eq!(value["source"], json!("heuristic"));
    }

    #[test]
    fn test_tool_name_only_for_tool_calls() {
        let route = Route::ToolCall {
            tool_name: "order_menu".to_string(),
            params: ToolParams::new(),
            execution_category: ExecutionCategory::SelfContained,
        };
        assert_eq!(route.tool_name(), Some("order_menu"));
        assert_eq!(route.kind(), RouteKind::ToolCall);
        assert_eq!(
            Route::ConversationalQuery { query: String::new() }.tool_name(),
            None
        );
    }
}
