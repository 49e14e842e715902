//! Milvus REST client for tenant-scoped document search.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use storedesk_shared::{ServiceError, TenantScope};
use tracing::{debug, info};

use crate::ollama::{build_http_client, map_request_error};
use crate::services::{RetrievedDocument, VectorSearch};

const SERVICE: &str = "Milvus";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    code: i64,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(default)]
    text: String,
    distance: f32,
}

/// `POST /v2/vectordb/entities/search` over one collection
pub struct MilvusSearch {
    endpoint: String,
    collection: String,
    token: Option<String>,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl MilvusSearch {
    pub fn new(
        endpoint: &str,
        collection: &str,
        token: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self, ServiceError> {
        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            collection: collection.to_string(),
            token,
            timeout_secs,
            client: build_http_client(timeout_secs)?,
        })
    }
}

/// Boolean filter expression restricting a search to one tenant
pub fn scope_filter(scope: &TenantScope) -> Result<String, ServiceError> {
    let valid = !scope.category.is_empty()
        && scope
            .category
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !valid {
        return Err(ServiceError::InvalidScope(format!(
            "category '{}' must match [A-Za-z0-9_-]+",
            scope.category
        )));
    }
    Ok(format!(
        "store_id == {} && category == \"{}\"",
        scope.store_id, scope.category
    ))
}

#[async_trait]
impl VectorSearch for MilvusSearch {
    async fn search(
        &self,
        vector: &[f32],
        scope: &TenantScope,
        top_k: usize,
    ) -> Result<Vec<RetrievedDocument>, ServiceError> {
        let filter = scope_filter(scope)?;
        let body = json!({
            "collectionName": self.collection,
            "data": [vector],
            "annsField": "embedding",
            "filter": filter,
            "limit": top_k,
            "outputFields": ["text"],
            "searchParams": {"metricType": "IP", "params": {"nprobe": 10}}
        });

        debug!("Milvus search: {} (top_k={})", filter, top_k);

        let mut request = self
            .client
            .post(format!("{}/v2/vectordb/entities/search", self.endpoint))
            .json(&body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| map_request_error(e, self.timeout_secs))?;

        if !response.status().is_success() {
            return Err(ServiceError::Status {
                service: SERVICE,
                status: response.status().as_u16(),
            });
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        if parsed.code != 0 {
            return Err(ServiceError::InvalidResponse(format!(
                "Milvus error {}: {}",
                parsed.code,
                parsed.message.unwrap_or_default()
            )));
        }

        let mut documents: Vec<RetrievedDocument> = parsed
            .data
            .into_iter()
            .map(|hit| RetrievedDocument {
                text: hit.text,
                score: hit.distance,
            })
            .collect();
        documents.sort_by(|a, b| b.score.total_cmp(&a.score));
        documents.truncate(top_k);

        info!(
            "Search complete: {} documents (store_id={}, category={})",
            documents.len(),
            scope.store_id,
            scope.category
        );
        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope(category: &str) -> TenantScope {
        TenantScope {
            store_id: 7,
            category: category.to_string(),
        }
    }

    #[test]
    fn test_scope_filter() {
        assert_eq!(
            scope_filter(&scope("customer")).unwrap(),
            "store_id == 7 && category == \"customer\""
        );
    }

    #[test]
    fn test_scope_filter_rejects_injection() {
        let err = scope_filter(&scope("x\" || store_id > 0")).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidScope(_)));
        assert!(scope_filter(&scope("")).is_err());
    }
}
