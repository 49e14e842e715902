//! Tool catalog - static registry of the tools the router may select.
//!
//! Populated once at startup and read-only afterwards. Tools are looked up
//! by name; the dispatcher validates parameters before calling `execute`.

pub mod analytics;
pub mod store;

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use storedesk_shared::{ExecutionCategory, Language, ToolDefinition, ToolError, ToolParams};
use tracing::{debug, info};

/// Raw output of a tool body
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    pub result: Value,
    pub notification: String,
    /// Set by tools that switch the response language
    pub language: Option<Language>,
}

impl ToolOutput {
    pub fn new(result: Value, notification: String) -> Self {
        Self {
            result,
            notification,
            language: None,
        }
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = Some(language);
        self
    }
}

/// A named capability the router can select.
///
/// `execute` receives parameters that already passed schema validation.
/// Absent optional parameters take the defaults declared in `definition()`.
pub trait Tool: Send + Sync {
    fn definition(&self) -> &ToolDefinition;

    fn execute(&self, params: &ToolParams) -> Result<ToolOutput, ToolError>;

    fn name(&self) -> &str {
        &self.definition().name
    }
}

/// Standard notification line for a tool run
pub fn notification(tool_name: &str, detail: &str) -> String {
    if detail.is_empty() {
        format!("✅ [툴 실행] {}", tool_name)
    } else {
        format!("✅ [툴 실행] {} - {}", tool_name, detail)
    }
}

/// String parameter, falling back to the declared default
pub fn str_param<'a>(def: &'a ToolDefinition, params: &'a ToolParams, name: &str) -> Option<&'a str> {
    params
        .get(name)
        .and_then(|v| v.as_str())
        .or_else(|| def.get_param(name)?.default.as_ref()?.as_str())
}

/// Integer parameter, falling back to the declared default
pub fn int_param(def: &ToolDefinition, params: &ToolParams, name: &str) -> Option<i64> {
    params
        .get(name)
        .and_then(|v| v.as_i64())
        .or_else(|| def.get_param(name)?.default.as_ref()?.as_i64())
}

/// Registry of tools keyed by name, in registration order
#[derive(Default)]
pub struct ToolCatalog {
    tools: HashMap<String, Arc<dyn Tool>>,
    order: Vec<String>,
}

impl ToolCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with every built-in store tool
    pub fn standard() -> Self {
        let mut catalog = Self::new();
        catalog.register(store::SetLanguageTool::new());
        catalog.register(store::OrderMenuTool::new());
        catalog.register(store::NavigateToTool::new());
        catalog.register(store::ApplyFilterTool::new());
        catalog.register(analytics::GetSalesDataTool::new());
        catalog.register(analytics::GetOrderStatisticsTool::new());
        catalog.register(analytics::AnalyzeTrendsTool::new());
        info!("Tool catalog ready: {} tools", catalog.len());
        catalog
    }

    /// Add a tool. A tool with the same name is replaced (last registration wins).
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        let name = tool.name().to_string();
        debug!(
            "Registering tool: {} ({})",
            name,
            tool.definition().execution_category
        );
        if self.tools.insert(name.clone(), Arc::new(tool)).is_none() {
            self.order.push(name);
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.get(name).map(|t| t.definition())
    }

    pub fn tool(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn exists(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// All definitions in registration order
    pub fn describe_all(&self) -> Vec<&ToolDefinition> {
        self.order
            .iter()
            .filter_map(|name| self.lookup(name))
            .collect()
    }

    pub fn by_category(&self, category: ExecutionCategory) -> Vec<&ToolDefinition> {
        self.describe_all()
            .into_iter()
            .filter(|d| d.execution_category == category)
            .collect()
    }

    /// Human-readable summary used in the classification prompt
    pub fn render_for_prompt(&self) -> String {
        let mut lines = Vec::new();
        for def in self.describe_all() {
            lines.push(format!(
                "   - {} ({}): {}",
                def.name, def.execution_category, def.description
            ));
            lines.push(format!("     parameters: {}", def.render_params()));
        }
        lines.join("\n")
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
