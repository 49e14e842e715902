//! Request router - turns a customer message into a `RouteDecision`.
//!
//! Three stages, each total over its input:
//! 1. LLM classifier (translator) with a strict JSON contract
//! 2. Keyword heuristics when the classifier output is unusable
//! 3. Conversational backstop when routing itself cannot start
//!
//! `Router::route` never fails.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;
use std::sync::Arc;
use storedesk_shared::{
    DecisionSource, Language, Route, RouteDecision, RouteError, ToolParams,
};
use tracing::{info, warn};

use crate::config::Config;
use crate::services::TextGenerator;
use crate::tools::ToolCatalog;
use crate::translator::{build_classification_prompt, classify};

/// Confidence of a heuristic tool match
pub const HEURISTIC_TOOL_CONFIDENCE: f32 = 0.6;

/// Confidence of a heuristic store-information match
pub const HEURISTIC_RETRIEVAL_CONFIDENCE: f32 = 0.65;

/// Confidence when no keyword matched
pub const HEURISTIC_DEFAULT_CONFIDENCE: f32 = 0.5;

/// Confidence of the backstop decision
pub const FALLBACK_CONFIDENCE: f32 = 0.3;

/// Tool keyword sets, checked in order. ASCII keywords match word prefixes,
/// Hangul keywords match anywhere in the message.
const TOOL_KEYWORDS: &[(&str, &[&str])] = &[
    ("order_menu", &["주문", "시켜", "먹고싶", "먹을게"]),
    (
        "set_language",
        &[
            "언어", "영어", "일본어", "중국어", "한국어", "한국말", "english", "korean",
            "japanese", "chinese", "speak", "language", "日本語", "中文",
        ],
    ),
    ("navigate_to", &["화면", "페이지", "이동", "보여줘", "가기"]),
    ("get_sales_data", &["매출", "판매", "수익"]),
    ("get_order_statistics", &["통계", "순위", "인기"]),
    ("analyze_trends", &["트렌드", "분석", "추세"]),
];

/// Store-information keywords routed to retrieval
const RETRIEVAL_KEYWORDS: &[&str] = &[
    "메뉴", "가격", "영업시간", "위치", "전화", "추천", "어디", "언제", "얼마",
];

/// Language mentions, first match wins
const LANGUAGE_KEYWORDS: &[(&str, Language)] = &[
    ("english", Language::En),
    ("영어", Language::En),
    ("korean", Language::Ko),
    ("한국어", Language::Ko),
    ("한국말", Language::Ko),
    ("japanese", Language::Ja),
    ("일본어", Language::Ja),
    ("日本語", Language::Ja),
    ("chinese", Language::Zh),
    ("중국어", Language::Zh),
    ("中文", Language::Zh),
];

/// Screen mentions for navigate_to, most specific first
const DESTINATION_KEYWORDS: &[(&str, &str)] = &[
    ("주문 내역", "order_history"),
    ("주문내역", "order_history"),
    ("내역", "order_history"),
    ("설정", "settings"),
    ("리뷰", "reviews"),
    ("후기", "reviews"),
    ("매장 정보", "store_info"),
    ("매장정보", "store_info"),
    ("가게 정보", "store_info"),
    ("메뉴", "menu"),
    ("홈", "home"),
    ("처음", "home"),
];

/// Order verbs that end the menu name in "<menu> 주문해줘"
const ORDER_VERBS: &[&str] = &["주문", "시켜", "먹고싶", "먹을게"];

/// "2개", "두 그릇", "3인분"
static QUANTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+|한|두|세|네|다섯)\s*(개|인분|그릇)").unwrap()
});

fn matches_keyword(lowered: &str, keyword: &str) -> bool {
    if keyword.is_ascii() {
        lowered
            .split(|c: char| !c.is_alphanumeric())
            .any(|token| token.starts_with(keyword))
    } else {
        lowered.contains(keyword)
    }
}

fn matches_any(lowered: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| matches_keyword(lowered, k))
}

fn numeral_value(token: &str) -> Option<i64> {
    match token {
        "한" => Some(1),
        "두" => Some(2),
        "세" => Some(3),
        "네" => Some(4),
        "다섯" => Some(5),
        digits => digits.parse().ok(),
    }
}

/// Quantity mentioned in an order message, 1 if none
pub fn extract_quantity(message: &str) -> i64 {
    QUANTITY
        .captures(message)
        .and_then(|caps| numeral_value(caps.get(1)?.as_str()))
        .filter(|n| *n > 0)
        .unwrap_or(1)
}

/// Menu name in an order message: the text before the order verb, minus
/// quantity tokens and the object particle
pub fn extract_menu(message: &str) -> Option<String> {
    let cut = ORDER_VERBS.iter().filter_map(|v| message.find(v)).min()?;
    let head = QUANTITY.replace_all(&message[..cut], "");
    let head = head.trim();
    let head = head
        .strip_suffix('을')
        .or_else(|| head.strip_suffix('를'))
        .unwrap_or(head)
        .trim();
    if head.is_empty() {
        None
    } else {
        Some(head.to_string())
    }
}

/// Language named in the message, if any
pub fn extract_language(lowered: &str) -> Option<Language> {
    LANGUAGE_KEYWORDS
        .iter()
        .find(|(keyword, _)| matches_keyword(lowered, keyword))
        .map(|(_, lang)| *lang)
}

/// Screen named in the message, if any
pub fn extract_destination(lowered: &str) -> Option<&'static str> {
    DESTINATION_KEYWORDS
        .iter()
        .find(|(keyword, _)| lowered.contains(keyword))
        .map(|(_, dest)| *dest)
}

/// Best-effort parameters for a heuristically matched tool
fn heuristic_params(
    tool_name: &str,
    message: &str,
    lowered: &str,
    fallback_language: Language,
) -> ToolParams {
    let mut params = ToolParams::new();
    match tool_name {
        "order_menu" => {
            if let Some(menu) = extract_menu(message) {
                params.insert("menu".to_string(), json!(menu));
            }
            params.insert("quantity".to_string(), json!(extract_quantity(message)));
        }
        "set_language" => {
            let language = extract_language(lowered).unwrap_or(fallback_language);
            params.insert("language".to_string(), json!(language.code()));
        }
        "navigate_to" => {
            if let Some(destination) = extract_destination(lowered) {
                params.insert("destination".to_string(), json!(destination));
            }
        }
        _ => {}
    }
    params
}

/// Keyword routing. Total: every message maps to one of the three routes.
pub fn heuristic_route(
    message: &str,
    catalog: &ToolCatalog,
    fallback_language: Language,
) -> RouteDecision {
    let lowered = message.to_lowercase();

    for (tool_name, keywords) in TOOL_KEYWORDS {
        if !matches_any(&lowered, keywords) {
            continue;
        }
        // "주문 내역 보여줘" is navigation, not an order
        if *tool_name == "order_menu" && lowered.contains("내역") {
            continue;
        }
        let Some(def) = catalog.lookup(tool_name) else {
            continue;
        };

        info!("Heuristic match: {}", tool_name);
        return RouteDecision::new(
            Route::ToolCall {
                tool_name: def.name.clone(),
                params: heuristic_params(tool_name, message, &lowered, fallback_language),
                execution_category: def.execution_category,
            },
            HEURISTIC_TOOL_CONFIDENCE,
            "keyword match",
            DecisionSource::Heuristic,
        );
    }

    if matches_any(&lowered, RETRIEVAL_KEYWORDS) {
        info!("Heuristic match: retrieval");
        return RouteDecision::new(
            Route::RetrievalQuery { query: message.to_string() },
            HEURISTIC_RETRIEVAL_CONFIDENCE,
            "keyword match (store information)",
            DecisionSource::Heuristic,
        );
    }

    info!("Heuristic match: conversational (default)");
    RouteDecision::new(
        Route::ConversationalQuery { query: message.to_string() },
        HEURISTIC_DEFAULT_CONFIDENCE,
        "no keyword matched",
        DecisionSource::Heuristic,
    )
}

/// Backstop decision when routing cannot even start
pub fn fallback_decision(message: &str, reason: &str) -> RouteDecision {
    warn!("Fallback routing: conversational ({})", reason);
    RouteDecision::new(
        Route::ConversationalQuery { query: message.to_string() },
        FALLBACK_CONFIDENCE,
        &format!("fallback: {}", reason),
        DecisionSource::Fallback,
    )
}

/// Routes messages using the classification model, with keyword fallback
pub struct Router {
    generator: Arc<dyn TextGenerator>,
    catalog: Arc<ToolCatalog>,
    model: String,
    fallback_language: Language,
    max_prompt_bytes: usize,
}

impl Router {
    pub fn new(generator: Arc<dyn TextGenerator>, catalog: Arc<ToolCatalog>, model: &str) -> Self {
        let defaults = Config::default();
        Self {
            generator,
            catalog,
            model: model.to_string(),
            fallback_language: defaults.router.fallback_language,
            max_prompt_bytes: defaults.router.max_prompt_bytes,
        }
    }

    pub fn with_fallback_language(mut self, language: Language) -> Self {
        self.fallback_language = language;
        self
    }

    pub fn with_max_prompt_bytes(mut self, limit: usize) -> Self {
        self.max_prompt_bytes = limit;
        self
    }

    /// Decide how to fulfil `message`
    pub async fn route(&self, message: &str) -> RouteDecision {
        info!("Router: start ({} chars)", message.chars().count());
        match self.try_route(message).await {
            Ok(decision) => {
                info!(
                    "Router: {} via {:?} (confidence {:.2})",
                    decision.kind(),
                    decision.source,
                    decision.confidence
                );
                decision
            }
            Err(e) => fallback_decision(message, &e.to_string()),
        }
    }

    async fn try_route(&self, message: &str) -> Result<RouteDecision, RouteError> {
        if message.trim().is_empty() {
            return Err(RouteError::EmptyMessage);
        }

        let prompt = build_classification_prompt(message, &self.catalog);
        if prompt.len() > self.max_prompt_bytes {
            let err = RouteError::PromptTooLarge {
                size: prompt.len(),
                limit: self.max_prompt_bytes,
            };
            warn!("{}, using keyword heuristics", err);
            return Ok(heuristic_route(message, &self.catalog, self.fallback_language));
        }

        match classify(
            self.generator.as_ref(),
            &self.model,
            &prompt,
            message,
            &self.catalog,
        )
        .await
        {
            Ok(decision) => Ok(decision),
            Err(e) => {
                warn!("Classifier output unusable ({}), using keyword heuristics", e);
                Ok(heuristic_route(message, &self.catalog, self.fallback_language))
            }
        }
    }
}
