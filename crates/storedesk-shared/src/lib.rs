//! Shared types for StoreDesk components.
//!
//! Route decisions, tool schemas and results, response languages, the
//! request/response pair exchanged with the transport layer, and the error
//! taxonomy. No I/O lives here.

pub mod chat;
pub mod error;
pub mod language;
pub mod route;
pub mod tool;

pub use chat::{ChatRequest, ChatResponse, TenantScope};
pub use error::{ClassifyError, RouteError, ServiceError, ToolError};
pub use language::Language;
pub use route::{DecisionSource, Route, RouteDecision, RouteKind};
pub use tool::{
    ExecutionCategory, Normalizer, ParamSpec, ParamType, ToolDefinition, ToolParams, ToolResult,
};
