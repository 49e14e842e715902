//! HTTP client tests against mock Ollama and Milvus servers.

use serde_json::json;
use storedesk_shared::{ServiceError, TenantScope};
use storedeskd::ollama::{OllamaClient, OllamaEmbedder};
use storedeskd::services::{Embedder, TextGenerator, VectorSearch};
use storedeskd::vector_store::MilvusSearch;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn scope() -> TenantScope {
    TenantScope {
        store_id: 12,
        category: "customer".to_string(),
    }
}

// ============================================================================
// Ollama generate
// ============================================================================

#[tokio::test]
async fn test_generate_reads_response_field() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({
            "model": "qwen2.5:7b-instruct",
            "prompt": "hello",
            "stream": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "qwen2.5:7b-instruct",
            "response": "  안녕하세요!  ",
            "done": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = OllamaClient::new(&server.uri(), 5).unwrap();
    let text = client.generate("qwen2.5:7b-instruct", "hello").await.unwrap();
    assert_eq!(text, "안녕하세요!");
}

#[tokio::test]
async fn test_generate_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = OllamaClient::new(&server.uri(), 5).unwrap();
    let err = client.generate("m", "p").await.unwrap_err();
    assert_eq!(
        err,
        ServiceError::Status {
            service: "Ollama",
            status: 503
        }
    );
}

#[tokio::test]
async fn test_generate_blank_response_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "   "})))
        .mount(&server)
        .await;

    let client = OllamaClient::new(&server.uri(), 5).unwrap();
    assert_eq!(
        client.generate("m", "p").await.unwrap_err(),
        ServiceError::EmptyResponse
    );
}

#[tokio::test]
async fn test_generate_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"response": "late"}))
                .set_delay(std::time::Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let client = OllamaClient::new(&server.uri(), 1).unwrap();
    let err = client.generate("m", "p").await.unwrap_err();
    assert!(err.is_timeout(), "got {:?}", err);
}

// ============================================================================
// Ollama embed
// ============================================================================

#[tokio::test]
async fn test_embed_takes_first_row() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .and(body_partial_json(json!({"model": "bge-m3", "input": "영업시간"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "bge-m3",
            "embeddings": [[0.1, 0.2, 0.3, 0.4]]
        })))
        .mount(&server)
        .await;

    let embedder = OllamaEmbedder::new(&server.uri(), "bge-m3", 4, 5).unwrap();
    let vector = embedder.embed("영업시간").await.unwrap();
    assert_eq!(vector, vec![0.1, 0.2, 0.3, 0.4]);
}

#[tokio::test]
async fn test_embed_dimension_mismatch() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"embeddings": [[0.1, 0.2]]})),
        )
        .mount(&server)
        .await;

    let embedder = OllamaEmbedder::new(&server.uri(), "bge-m3", 1024, 5).unwrap();
    assert_eq!(
        embedder.embed("x").await.unwrap_err(),
        ServiceError::DimensionMismatch {
            expected: 1024,
            actual: 2
        }
    );
}

// ============================================================================
// Milvus search
// ============================================================================

#[tokio::test]
async fn test_milvus_search_scopes_and_sorts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/vectordb/entities/search"))
        .and(header("authorization", "Bearer root:Milvus"))
        .and(body_partial_json(json!({
            "collectionName": "store_documents",
            "filter": "store_id == 12 && category == \"customer\"",
            "annsField": "embedding",
            "limit": 2,
            "outputFields": ["text"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "data": [
                {"id": 1, "distance": 0.31, "text": "휴무일: 월요일"},
                {"id": 2, "distance": 0.72, "text": "영업시간: 11:00-21:00"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let index = MilvusSearch::new(
        &server.uri(),
        "store_documents",
        Some("root:Milvus".to_string()),
        5,
    )
    .unwrap();
    let docs = index.search(&[0.5, 0.5], &scope(), 2).await.unwrap();

    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0].text, "영업시간: 11:00-21:00");
    assert!((docs[0].score - 0.72).abs() < 1e-6);
    assert_eq!(docs[1].text, "휴무일: 월요일");
}

#[tokio::test]
async fn test_milvus_error_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/vectordb/entities/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 100,
            "message": "collection not found"
        })))
        .mount(&server)
        .await;

    let index = MilvusSearch::new(&server.uri(), "missing", None, 5).unwrap();
    let err = index.search(&[0.5], &scope(), 5).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidResponse(ref m) if m.contains("collection not found")));
}

#[tokio::test]
async fn test_milvus_rejects_bad_category_without_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let index = MilvusSearch::new(&server.uri(), "store_documents", None, 5).unwrap();
    let bad = TenantScope {
        store_id: 12,
        category: "customer\" || store_id > 0 || \"".to_string(),
    };
    let err = index.search(&[0.5], &bad, 5).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidScope(_)));
}
