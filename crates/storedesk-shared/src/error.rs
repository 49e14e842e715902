//! Error types for StoreDesk.
//!
//! Every variant here is recovered somewhere in the pipeline; none of them
//! reaches the caller as a fault.

use thiserror::Error;

/// Failures of the external model and vector services.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServiceError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("{service} returned HTTP {status}")]
    Status { service: &'static str, status: u16 },

    #[error("Request timeout after {0} seconds")]
    Timeout(u64),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Service returned empty response")]
    EmptyResponse,

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid tenant scope: {0}")]
    InvalidScope(String),
}

impl ServiceError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ServiceError::Timeout(_))
    }
}

/// Tool lookup, validation and execution failures.
///
/// The `Display` text is what ends up in `ToolResult::error`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("invalid parameters: {0}")]
    Validation(String),

    #[error("tool execution failed: {0}")]
    Execution(String),
}

/// Why a classifier response could not be turned into a route decision.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassifyError {
    #[error("no JSON object in classifier output")]
    NoJson,

    #[error("invalid JSON from classifier: {0}")]
    InvalidJson(String),

    #[error("classifier output missing '{0}'")]
    MissingField(&'static str),

    #[error("unknown route value: {0}")]
    UnknownRoute(String),

    #[error("classifier named a tool that is not in the catalog: {0}")]
    UnknownTool(String),

    #[error("classifier unavailable: {0}")]
    Service(#[from] ServiceError),
}

/// Router failures that skip straight to the conversational backstop.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RouteError {
    #[error("empty message")]
    EmptyMessage,

    #[error("classification prompt is {size} bytes, limit is {limit}")]
    PromptTooLarge { size: usize, limit: usize },
}
