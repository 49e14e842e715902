//! Fulfillment orchestrator - one customer message in, one shaped answer out.
//!
//! message -> Router -> decision -> (Dispatcher | RagAnswerer | direct
//! generation) -> shaped response. Stages run strictly in sequence and every
//! failure degrades to a fixed template in the active language.

use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use storedesk_shared::{
    ChatRequest, ChatResponse, ExecutionCategory, Language, Route, ServiceError, ToolResult,
};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::Config;
use crate::dispatcher::ToolDispatcher;
use crate::ollama::{OllamaClient, OllamaEmbedder};
use crate::prompts::{conversational_prompt, narration_prompt};
use crate::rag_answerer::RagAnswerer;
use crate::router::Router;
use crate::services::TextGenerator;
use crate::shaping::shape_answer;
use crate::tools::ToolCatalog;
use crate::vector_store::MilvusSearch;

/// Text produced by one direct generation call, with its diagnostics
struct Generated {
    text: String,
    diagnostics: Value,
}

pub struct Orchestrator {
    router: Router,
    dispatcher: ToolDispatcher,
    answerer: RagAnswerer,
    generator: Arc<dyn TextGenerator>,
    chat_model: String,
    max_chars: usize,
}

impl Orchestrator {
    pub fn new(
        router: Router,
        dispatcher: ToolDispatcher,
        answerer: RagAnswerer,
        generator: Arc<dyn TextGenerator>,
        chat_model: &str,
    ) -> Self {
        Self {
            router,
            dispatcher,
            answerer,
            generator,
            chat_model: chat_model.to_string(),
            max_chars: Config::default().answer.max_chars,
        }
    }

    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }

    /// Build every client handle once from config
    pub fn from_config(config: &Config) -> Result<Self, ServiceError> {
        let catalog = Arc::new(ToolCatalog::standard());

        let classifier: Arc<dyn TextGenerator> = Arc::new(OllamaClient::new(
            config.llm.router_endpoint(),
            config.llm.router_timeout_secs,
        )?);
        let generator: Arc<dyn TextGenerator> = Arc::new(OllamaClient::new(
            &config.llm.endpoint,
            config.llm.chat_timeout_secs,
        )?);
        let embedder = Arc::new(OllamaEmbedder::new(
            &config.llm.endpoint,
            &config.embedding.model,
            config.embedding.dimension,
            config.embedding.timeout_secs,
        )?);
        let index = Arc::new(MilvusSearch::new(
            &config.retrieval.endpoint,
            &config.retrieval.collection,
            config.retrieval.token.clone(),
            config.retrieval.timeout_secs,
        )?);

        let router = Router::new(classifier, catalog.clone(), &config.llm.router_model)
            .with_fallback_language(config.router.fallback_language)
            .with_max_prompt_bytes(config.router.max_prompt_bytes);
        let answerer = RagAnswerer::new(embedder, index, generator.clone(), &config.llm.chat_model)
            .with_retrieval(&config.retrieval)
            .with_max_chars(config.answer.max_chars);

        info!(
            "Orchestrator ready: router {} @ {}, chat {} @ {}",
            config.llm.router_model,
            config.llm.router_endpoint(),
            config.llm.chat_model,
            config.llm.endpoint
        );

        Ok(Self::new(
            router,
            ToolDispatcher::new(catalog),
            answerer,
            generator,
            &config.llm.chat_model,
        )
        .with_max_chars(config.answer.max_chars))
    }

    /// Handle one message. Never fails: every error has a textual fallback.
    pub async fn handle(&self, request: &ChatRequest) -> ChatResponse {
        let request_id = Uuid::new_v4();
        let span = info_span!("chat", request_id = %request_id, store_id = request.store_id);
        self.handle_inner(request, request_id).instrument(span).await
    }

    async fn handle_inner(&self, request: &ChatRequest, request_id: Uuid) -> ChatResponse {
        let started = Instant::now();
        info!("Chat: {} ({})", request.message, request.language);

        let decision = self.router.route(&request.message).await;
        let mut diagnostics = json!({
            "request_id": request_id.to_string(),
            "routing": decision,
        });

        let mut language = request.language;
        let mut language_changed = false;
        let used_tool = decision.route.tool_name().map(str::to_string);

        let answer = match &decision.route {
            Route::ToolCall {
                tool_name, params, ..
            } => {
                let result = self.dispatcher.execute(tool_name, params);
                if let (true, Some(selected)) = (result.success, result.language) {
                    info!("Language switched to {}", selected);
                    language = selected;
                    language_changed = true;
                }
                diagnostics["tool"] = json!(result);

                let answer = self.tool_answer(&request.message, &result, language).await;
                if let Some(narration) = answer.diagnostics.as_object().filter(|o| !o.is_empty()) {
                    diagnostics["narration"] = Value::Object(narration.clone());
                }
                answer.text
            }
            Route::RetrievalQuery { query } => {
                let rag = self.answerer.answer(query, &request.scope(), language).await;
                diagnostics["rag"] = json!(rag.diagnostics);
                rag.text
            }
            Route::ConversationalQuery { query } => {
                let prompt = conversational_prompt(query, language, self.max_chars);
                let reply = self.generate(prompt, language).await;
                diagnostics["chat"] = reply.diagnostics;
                reply.text
            }
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        diagnostics["elapsed_ms"] = json!(elapsed_ms);
        info!(
            "Chat done: {} in {} ms, answer {} chars",
            decision.kind(),
            elapsed_ms,
            answer.chars().count()
        );

        ChatResponse {
            answer,
            route: decision.kind(),
            used_tool,
            language,
            language_changed,
            diagnostics,
        }
    }

    /// Final text for a tool result.
    ///
    /// Self-contained results are already user-facing and are returned as is.
    /// LLM-interpreted results are narrated and shaped.
    async fn tool_answer(&self, message: &str, result: &ToolResult, language: Language) -> Generated {
        if !result.success {
            let error = result.error.as_deref().unwrap_or("unknown error");
            return Generated {
                text: format!("{}: {}", language.tool_failed(), error),
                diagnostics: json!({}),
            };
        }

        match result.execution_category {
            Some(ExecutionCategory::LlmInterpreted) => {
                let result_json = serde_json::to_string_pretty(&result.result)
                    .unwrap_or_else(|_| result.result.to_string());
                let prompt = narration_prompt(
                    message,
                    &result.tool_name,
                    &result_json,
                    language,
                    self.max_chars,
                );
                self.generate(prompt, language).await
            }
            _ => Generated {
                text: result.message().to_string(),
                diagnostics: json!({}),
            },
        }
    }

    /// One generation call, shaped; apology template on failure
    async fn generate(&self, prompt: String, language: Language) -> Generated {
        match self.generator.generate(&self.chat_model, &prompt).await {
            Ok(raw) => {
                let text = shape_answer(&raw, language, self.max_chars);
                Generated {
                    text,
                    diagnostics: json!({
                        "llm_model": self.chat_model,
                        "final_prompt": prompt,
                        "raw_answer": raw,
                    }),
                }
            }
            Err(e) => {
                warn!("Generation failed: {}", e);
                Generated {
                    text: language.apology().to_string(),
                    diagnostics: json!({
                        "llm_model": self.chat_model,
                        "final_prompt": prompt,
                        "error": e.to_string(),
                    }),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{FakeEmbedder, FakeGenerator, FakeVectorSearch};
    use crate::services::RetrievedDocument;
    use storedesk_shared::RouteKind;

    struct Harness {
        classifier: Arc<FakeGenerator>,
        generator: Arc<FakeGenerator>,
        index: Arc<FakeVectorSearch>,
        orchestrator: Orchestrator,
    }

    fn harness(classifier_reply: &str, generator_reply: &str, docs: Vec<RetrievedDocument>) -> Harness {
        let catalog = Arc::new(ToolCatalog::standard());
        let classifier = Arc::new(FakeGenerator::replying(classifier_reply));
        let generator = Arc::new(FakeGenerator::replying(generator_reply));
        let index = Arc::new(FakeVectorSearch::with_documents(docs));

        let router = Router::new(classifier.clone(), catalog.clone(), "router-model");
        let answerer = RagAnswerer::new(
            Arc::new(FakeEmbedder::new(8)),
            index.clone(),
            generator.clone(),
            "chat-model",
        );
        let orchestrator = Orchestrator::new(
            router,
            ToolDispatcher::new(catalog),
            answerer,
            generator.clone(),
            "chat-model",
        );
        Harness {
            classifier,
            generator,
            index,
            orchestrator,
        }
    }

    #[tokio::test]
    async fn test_self_contained_tool_skips_generation() {
        let h = harness(
            r#"{"route": "TOOL_CALL", "tool_name": "order_menu", "tool_params": {"menu": "김치찌개", "quantity": 1}}"#,
            "unused",
            vec![],
        );
        let response = h.orchestrator.handle(&ChatRequest::new("김치찌개 주문해줘", 1)).await;

        assert_eq!(response.route, RouteKind::ToolCall);
        assert_eq!(response.used_tool.as_deref(), Some("order_menu"));
        assert_eq!(response.answer, "김치찌개 1개 주문이 완료되었습니다");
        assert!(!response.language_changed);
        assert_eq!(h.classifier.call_count(), 1);
        assert_eq!(h.generator.call_count(), 0);
        assert_eq!(response.diagnostics["tool"]["success"], json!(true));
    }

    #[tokio::test]
    async fn test_language_tool_overrides_language() {
        let h = harness("garbage, not json", "unused", vec![]);
        let response = h.orchestrator.handle(&ChatRequest::new("plz speak english", 1)).await;

        assert_eq!(response.used_tool.as_deref(), Some("set_language"));
        assert_eq!(response.language, Language::En);
        assert!(response.language_changed);
        assert_eq!(response.answer, Language::En.changed_message());
        assert_eq!(response.diagnostics["routing"]["source"], json!("heuristic"));
    }

    #[tokio::test]
    async fn test_llm_interpreted_tool_is_narrated() {
        let h = harness(
            r#"{"route": "TOOL_CALL", "tool_name": "get_sales_data"}"#,
            "오늘 매출은 125만원이에요",
            vec![],
        );
        let response = h.orchestrator.handle(&ChatRequest::new("오늘 매출 알려줘", 1)).await;

        assert_eq!(response.answer, "오늘 매출은 125만원이에요");
        let calls = h.generator.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].model, "chat-model");
        assert!(calls[0].prompt.contains("\"get_sales_data\""));
        assert!(calls[0].prompt.contains("Request: 오늘 매출 알려줘"));
        assert!(response.diagnostics["narration"]["final_prompt"].is_string());
    }

    #[tokio::test]
    async fn test_tool_failure_is_reported() {
        let h = harness(
            r#"{"route": "TOOL_CALL", "tool_name": "order_menu", "tool_params": {}}"#,
            "unused",
            vec![],
        );
        let response = h.orchestrator.handle(&ChatRequest::new("주문할게요", 1)).await;

        assert_eq!(
            response.answer,
            "요청을 처리하지 못했어요: invalid parameters: missing required parameters: menu"
        );
        assert_eq!(h.generator.call_count(), 0);
    }

    #[tokio::test]
    async fn test_retrieval_uses_request_scope() {
        let h = harness(
            r#"{"route": "RAG_QUERY", "query": "영업시간"}"#,
            "11시부터 21시까지예요",
            vec![RetrievedDocument::new("영업시간: 11:00-21:00", 0.45)],
        );
        let request = ChatRequest::new("영업시간 알려줘", 42).with_category("owner");
        let response = h.orchestrator.handle(&request).await;

        assert_eq!(response.route, RouteKind::RetrievalQuery);
        assert_eq!(response.answer, "11시부터 21시까지예요");
        assert_eq!(h.index.scopes(), vec![request.scope()]);
        assert_eq!(response.diagnostics["rag"]["outcome"], json!("answered"));
    }

    #[tokio::test]
    async fn test_conversational_failure_apologizes() {
        let catalog = Arc::new(ToolCatalog::standard());
        let classifier = Arc::new(FakeGenerator::replying(r#"{"route": "SIMPLE_QA"}"#));
        let generator = Arc::new(FakeGenerator::failing(ServiceError::Timeout(60)));
        let orchestrator = Orchestrator::new(
            Router::new(classifier, catalog.clone(), "router-model"),
            ToolDispatcher::new(catalog),
            RagAnswerer::new(
                Arc::new(FakeEmbedder::new(8)),
                Arc::new(FakeVectorSearch::with_documents(vec![])),
                generator.clone(),
                "chat-model",
            ),
            generator,
            "chat-model",
        );

        let request = ChatRequest::new("안녕하세요", 1).with_language(Language::Zh);
        let response = orchestrator.handle(&request).await;

        assert_eq!(response.route, RouteKind::ConversationalQuery);
        assert_eq!(response.answer, Language::Zh.apology());
        assert_eq!(response.language, Language::Zh);
    }

    #[tokio::test]
    async fn test_diagnostics_carry_request_id_and_timing() {
        let h = harness(r#"{"route": "SIMPLE_QA"}"#, "안녕하세요!", vec![]);
        let response = h.orchestrator.handle(&ChatRequest::new("안녕", 1)).await;

        let id = response.diagnostics["request_id"].as_str().unwrap();
        assert!(Uuid::parse_str(id).is_ok());
        assert!(response.diagnostics["elapsed_ms"].is_u64());
        assert_eq!(response.diagnostics["chat"]["raw_answer"], json!("안녕하세요!"));
    }
}
