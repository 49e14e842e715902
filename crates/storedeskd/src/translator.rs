//! LLM-based classifier for message routing.
//!
//! Converts a customer message into a `RouteDecision` by asking a small,
//! fast model for a JSON object. Model output is untrusted text: any problem
//! with it is a `ClassifyError` and the router falls back to keywords.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use storedesk_shared::{ClassifyError, DecisionSource, Route, RouteDecision, ToolParams};
use tracing::{debug, info};

use crate::services::TextGenerator;
use crate::tools::ToolCatalog;

/// Confidence assumed when the classifier omits one
pub const DEFAULT_CONFIDENCE: f32 = 0.8;

/// Reasoning assumed when the classifier omits one
pub const DEFAULT_REASONING: &str = "auto";

/// First `{` to last `}` across lines
static JSON_OBJECT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{.*\}").unwrap());

const ROUTE_TOOL_CALL: &str = "TOOL_CALL";
const ROUTE_RETRIEVAL: &str = "RAG_QUERY";
const ROUTE_CONVERSATIONAL: &str = "SIMPLE_QA";

/// Build the classification prompt for `message`
pub fn build_classification_prompt(message: &str, catalog: &ToolCatalog) -> String {
    format!(
        r#"You are a router that decides how a store assistant should handle a customer message.

Customer message: "{message}"

Choose exactly one of these routes:

1. TOOL_CALL - an action or data lookup that a tool performs
   Available tools:
{tools}

2. RAG_QUERY - needs the store's documents
   - store information (location, contact, opening hours, social media)
   - menu information (price, description, ingredients)
   - menu recommendations and pairings

3. SIMPLE_QA - general conversation
   - greetings
   - small talk
   - anything that needs neither a tool nor the store documents

Answer ONLY with one JSON object in this format:

TOOL_CALL:
{{"route": "TOOL_CALL", "tool_name": "<tool>", "tool_params": {{"<param>": "<value>"}}, "execution_category": "Self-Contained or LLM-Interpreted", "confidence": 0.95, "reasoning": "<why>"}}

RAG_QUERY:
{{"route": "RAG_QUERY", "query": "<search question>", "confidence": 0.9, "reasoning": "<why>"}}

SIMPLE_QA:
{{"route": "SIMPLE_QA", "query": "<customer message>", "confidence": 0.85, "reasoning": "<why>"}}

Examples:

Customer: "김치찌개 주문해줘"
Answer: {{"route": "TOOL_CALL", "tool_name": "order_menu", "tool_params": {{"menu": "김치찌개", "quantity": 1}}, "execution_category": "Self-Contained", "confidence": 0.98, "reasoning": "menu order"}}

Customer: "언어를 영어로 바꿔줘"
Answer: {{"route": "TOOL_CALL", "tool_name": "set_language", "tool_params": {{"language": "en"}}, "execution_category": "Self-Contained", "confidence": 0.99, "reasoning": "language change"}}

Customer: "plz speak english"
Answer: {{"route": "TOOL_CALL", "tool_name": "set_language", "tool_params": {{"language": "en"}}, "execution_category": "Self-Contained", "confidence": 0.98, "reasoning": "language change"}}

Customer: "한국어로 말해줘"
Answer: {{"route": "TOOL_CALL", "tool_name": "set_language", "tool_params": {{"language": "ko"}}, "execution_category": "Self-Contained", "confidence": 0.99, "reasoning": "language change"}}

Customer: "영업시간 알려줘"
Answer: {{"route": "RAG_QUERY", "query": "영업시간 알려줘", "confidence": 0.95, "reasoning": "store information"}}

Customer: "안녕하세요"
Answer: {{"route": "SIMPLE_QA", "query": "안녕하세요", "confidence": 0.99, "reasoning": "greeting"}}

Customer: "오늘 매출 알려줘"
Answer: {{"route": "TOOL_CALL", "tool_name": "get_sales_data", "tool_params": {{"date": "today", "period": "daily"}}, "execution_category": "LLM-Interpreted", "confidence": 0.97, "reasoning": "sales data lookup"}}

Now answer for the customer message above with JSON only:"#,
        message = message,
        tools = catalog.render_for_prompt(),
    )
}

/// Locate the JSON object in free-form model text (first greedy match)
pub fn extract_json_object(text: &str) -> Option<&str> {
    JSON_OBJECT.find(text).map(|m| m.as_str())
}

/// Parse classifier output into a decision.
///
/// Tool calls must name a cataloged tool; the execution category always
/// comes from the catalog record.
pub fn parse_classification(
    raw: &str,
    message: &str,
    catalog: &ToolCatalog,
) -> Result<RouteDecision, ClassifyError> {
    let json_str = extract_json_object(raw).ok_or(ClassifyError::NoJson)?;
    let value: Value =
        serde_json::from_str(json_str).map_err(|e| ClassifyError::InvalidJson(e.to_string()))?;
    let obj = value
        .as_object()
        .ok_or_else(|| ClassifyError::InvalidJson("not an object".to_string()))?;

    let route_label = obj
        .get("route")
        .and_then(Value::as_str)
        .ok_or(ClassifyError::MissingField("route"))?
        .trim()
        .to_uppercase();

    let query = || {
        obj.get("query")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .unwrap_or(message)
            .to_string()
    };

    let route = match route_label.as_str() {
        ROUTE_TOOL_CALL => {
            let tool_name = obj
                .get("tool_name")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .ok_or(ClassifyError::MissingField("tool_name"))?;

            let def = catalog
                .lookup(tool_name)
                .ok_or_else(|| ClassifyError::UnknownTool(tool_name.to_string()))?;

            let params: ToolParams = match obj.get("tool_params") {
                None | Some(Value::Null) => ToolParams::new(),
                Some(Value::Object(map)) => map.clone(),
                Some(other) => {
                    return Err(ClassifyError::InvalidJson(format!(
                        "tool_params must be an object, got {}",
                        other
                    )))
                }
            };

            if let Some(label) = obj.get("execution_category").and_then(Value::as_str) {
                debug!(
                    "Classifier category '{}' ignored, catalog says {}",
                    label, def.execution_category
                );
            }

            Route::ToolCall {
                tool_name: def.name.clone(),
                params,
                execution_category: def.execution_category,
            }
        }
        ROUTE_RETRIEVAL => Route::RetrievalQuery { query: query() },
        ROUTE_CONVERSATIONAL => Route::ConversationalQuery { query: query() },
        _ => return Err(ClassifyError::UnknownRoute(route_label)),
    };

    let confidence = obj
        .get("confidence")
        .and_then(Value::as_f64)
        .map(|c| c as f32)
        .unwrap_or(DEFAULT_CONFIDENCE);
    let reasoning = obj
        .get("reasoning")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_REASONING);

    Ok(RouteDecision::new(
        route,
        confidence,
        reasoning,
        DecisionSource::Classifier,
    ))
}

/// Run the classification model once and parse its answer
pub async fn classify(
    generator: &dyn TextGenerator,
    model: &str,
    prompt: &str,
    message: &str,
    catalog: &ToolCatalog,
) -> Result<RouteDecision, ClassifyError> {
    info!("Classifier: prompt {} bytes, model {}", prompt.len(), model);

    let raw = generator.generate(model, prompt).await?;
    debug!("Classifier raw output: {}", raw);

    parse_classification(&raw, message, catalog)
}
