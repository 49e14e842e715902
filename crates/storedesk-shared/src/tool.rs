//! Tool definitions, parameter schemas and invocation results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ToolError;
use crate::language::Language;

/// Parameters passed to a tool, keyed by parameter name
pub type ToolParams = serde_json::Map<String, Value>;

/// How a tool's output reaches the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionCategory {
    /// Tool output is already a complete, user-presentable message
    SelfContained,
    /// Tool output is structured data that a generation model must narrate
    LlmInterpreted,
}

impl std::fmt::Display for ExecutionCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl ExecutionCategory {
    /// Label used in prompts
    pub fn label(&self) -> &'static str {
        match self {
            Self::SelfContained => "Self-Contained",
            Self::LlmInterpreted => "LLM-Interpreted",
        }
    }
}

/// Declared parameter type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    String,
    Integer,
    Enum,
    /// Passed through without type checking
    Unspecified,
}

impl ParamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Enum => "enum",
            Self::Unspecified => "any",
        }
    }
}

/// Canonical form a parameter value is rewritten to before validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalizer {
    /// Language names and codes become a lowercase code ("English" -> "en")
    LanguageCode,
}

impl Normalizer {
    /// Non-string values and unrecognized names are returned trimmed and
    /// lowercased so the allowed-values check still reports them.
    pub fn apply(&self, value: &Value) -> Value {
        match (self, value) {
            (Self::LanguageCode, Value::String(s)) => match Language::from_name_or_code(s) {
                Some(language) => Value::from(language.code()),
                None => Value::from(s.trim().to_lowercase()),
            },
            _ => value.clone(),
        }
    }
}

/// Schema for one tool parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    pub param_type: ParamType,
    pub description: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalizer: Option<Normalizer>,
}

impl ParamSpec {
    pub fn new(name: &str, param_type: ParamType, description: &str) -> Self {
        Self {
            name: name.to_string(),
            param_type,
            description: description.to_string(),
            required: false,
            default: None,
            allowed_values: None,
            normalizer: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn normalized(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = Some(normalizer);
        self
    }

    pub fn one_of(mut self, values: &[&str]) -> Self {
        self.allowed_values = Some(values.iter().map(|v| Value::from(*v)).collect());
        self
    }

    /// Human-readable form for prompts, e.g.
    /// `language(string, optional, default "en", one of: ko|en|ja|zh)`
    pub fn render(&self) -> String {
        let mut parts = vec![
            self.param_type.as_str().to_string(),
            if self.required { "required" } else { "optional" }.to_string(),
        ];
        if let Some(default) = &self.default {
            parts.push(format!("default {}", default));
        }
        if let Some(allowed) = &self.allowed_values {
            let values: Vec<String> = allowed.iter().map(display_value).collect();
            parts.push(format!("one of: {}", values.join("|")));
        }
        format!("{}({})", self.name, parts.join(", "))
    }
}

/// Render a JSON value without quotes around plain strings
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Static description of a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub execution_category: ExecutionCategory,
    pub parameters: Vec<ParamSpec>,
}

impl ToolDefinition {
    pub fn new(name: &str, description: &str, execution_category: ExecutionCategory) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            execution_category,
            parameters: Vec::new(),
        }
    }

    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.parameters.retain(|p| p.name != spec.name);
        self.parameters.push(spec);
        self
    }

    pub fn get_param(&self, name: &str) -> Option<&ParamSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Parameter list for prompts ("none" when the tool takes no parameters)
    pub fn render_params(&self) -> String {
        if self.parameters.is_empty() {
            return "none".to_string();
        }
        self.parameters
            .iter()
            .map(ParamSpec::render)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Outcome of one tool invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    pub tool_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_category: Option<ExecutionCategory>,
    pub result: Value,
    pub notification: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Language selected by the tool for the rest of the response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    pub executed_at: DateTime<Utc>,
}

impl ToolResult {
    pub fn success(
        tool_name: &str,
        execution_category: ExecutionCategory,
        result: Value,
        notification: String,
    ) -> Self {
        Self {
            success: true,
            tool_name: tool_name.to_string(),
            execution_category: Some(execution_category),
            result,
            notification,
            error: None,
            language: None,
            executed_at: Utc::now(),
        }
    }

    pub fn failure(tool_name: &str, error: &ToolError) -> Self {
        let message = error.to_string();
        Self {
            success: false,
            tool_name: tool_name.to_string(),
            execution_category: None,
            result: Value::Null,
            notification: format!("❌ [툴 실행 실패] {} - {}", tool_name, message),
            error: Some(message),
            language: None,
            executed_at: Utc::now(),
        }
    }

    /// User-facing text of a self-contained result: its `message`, else the notification
    pub fn message(&self) -> &str {
        self.result
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or(&self.notification)
    }
}
