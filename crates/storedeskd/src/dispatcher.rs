//! Tool dispatcher - validates parameters against a tool's schema and runs it.
//!
//! Every outcome is a `ToolResult`; failures never propagate to the caller.

use serde_json::Value;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use storedesk_shared::{ParamType, ToolDefinition, ToolError, ToolParams, ToolResult};
use tracing::{error, info, warn};

use crate::tools::ToolCatalog;

pub struct ToolDispatcher {
    catalog: Arc<ToolCatalog>,
}

impl ToolDispatcher {
    pub fn new(catalog: Arc<ToolCatalog>) -> Self {
        Self { catalog }
    }

    /// Look up, validate and invoke `tool_name`
    pub fn execute(&self, tool_name: &str, params: &ToolParams) -> ToolResult {
        let logged = serde_json::Value::Object(params.clone());
        info!("Executing tool: {} params={}", tool_name, logged);

        let Some(tool) = self.catalog.tool(tool_name) else {
            let err = ToolError::UnknownTool(tool_name.to_string());
            error!("{}", err);
            return ToolResult::failure(tool_name, &err);
        };

        let validated = match validate_params(tool.definition(), params) {
            Ok(validated) => validated,
            Err(err) => {
                warn!("Tool {} rejected: {}", tool_name, err);
                return ToolResult::failure(tool_name, &err);
            }
        };

        let category = tool.definition().execution_category;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| tool.execute(&validated)))
            .unwrap_or_else(|payload| Err(ToolError::Execution(panic_message(payload.as_ref()))));

        match outcome {
            Ok(output) => {
                info!("Tool {} done: {}", tool_name, output.notification);
                let mut result =
                    ToolResult::success(tool_name, category, output.result, output.notification);
                result.language = output.language;
                result
            }
            Err(err) => {
                error!("Tool {} failed: {}", tool_name, err);
                ToolResult::failure(tool_name, &err)
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "tool panicked".to_string()
    }
}

/// Check `params` against the tool schema.
///
/// Returns the parameters to pass to the tool: nulls on optional parameters
/// are dropped and numeric strings for integer parameters are converted.
/// Unknown parameters pass through untouched.
pub fn validate_params(def: &ToolDefinition, params: &ToolParams) -> Result<ToolParams, ToolError> {
    let missing: Vec<&str> = def
        .parameters
        .iter()
        .filter(|spec| spec.required)
        .filter(|spec| params.get(&spec.name).map_or(true, Value::is_null))
        .map(|spec| spec.name.as_str())
        .collect();

    if !missing.is_empty() {
        return Err(ToolError::Validation(format!(
            "missing required parameters: {}",
            missing.join(", ")
        )));
    }

    let mut validated: ToolParams = params
        .iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    for spec in &def.parameters {
        if let (Some(normalizer), Some(value)) = (spec.normalizer, validated.get_mut(&spec.name)) {
            *value = normalizer.apply(value);
        }
    }

    for spec in &def.parameters {
        let Some(value) = validated.get(&spec.name) else {
            continue;
        };
        if let Some(allowed) = &spec.allowed_values {
            if !allowed.contains(value) {
                let values: Vec<String> =
                    allowed.iter().map(storedesk_shared::tool::display_value).collect();
                return Err(ToolError::Validation(format!(
                    "parameter '{}' must be one of: {}",
                    spec.name,
                    values.join(", ")
                )));
            }
        }
    }

    for spec in &def.parameters {
        let Some(value) = validated.get(&spec.name) else {
            continue;
        };
        match spec.param_type {
            ParamType::String => {
                if !value.is_string() {
                    return Err(ToolError::Validation(format!(
                        "parameter '{}' must be a string",
                        spec.name
                    )));
                }
            }
            ParamType::Integer => {
                let coerced = coerce_integer(value).ok_or_else(|| {
                    ToolError::Validation(format!("parameter '{}' must be an integer", spec.name))
                })?;
                validated.insert(spec.name.clone(), coerced);
            }
            ParamType::Enum | ParamType::Unspecified => {}
        }
    }

    Ok(validated)
}

/// Best-effort integer conversion: integral numbers and numeric strings
fn coerce_integer(value: &Value) -> Option<Value> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Some(Value::from(i));
            }
            let f = n.as_f64()?;
            (f.fract() == 0.0 && f.abs() < i64::MAX as f64).then(|| Value::from(f as i64))
        }
        Value::String(s) => s.trim().parse::<i64>().ok().map(Value::from),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{Tool, ToolOutput};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use storedesk_shared::{ExecutionCategory, Language, ParamSpec};

    fn params(value: Value) -> ToolParams {
        value.as_object().cloned().unwrap_or_default()
    }

    fn dispatcher() -> ToolDispatcher {
        ToolDispatcher::new(Arc::new(ToolCatalog::standard()))
    }

    /// Counts invocations; panics when asked to
    struct CountingTool {
        def: ToolDefinition,
        calls: Arc<AtomicUsize>,
    }

    impl Tool for CountingTool {
        fn definition(&self) -> &ToolDefinition {
            &self.def
        }

        fn execute(&self, params: &ToolParams) -> Result<ToolOutput, ToolError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if params.get("boom").is_some() {
                panic!("kaboom");
            }
            Ok(ToolOutput::new(json!({}), "ok".to_string()))
        }
    }

    fn counting_dispatcher() -> (ToolDispatcher, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut catalog = ToolCatalog::new();
        catalog.register(CountingTool {
            def: ToolDefinition::new("count", "counts", ExecutionCategory::SelfContained)
                .param(ParamSpec::new("a", ParamType::String, "a").required())
                .param(ParamSpec::new("b", ParamType::Integer, "b").required())
                .param(ParamSpec::new("boom", ParamType::Unspecified, "panic trigger")),
            calls: calls.clone(),
        });
        (ToolDispatcher::new(Arc::new(catalog)), calls)
    }

    #[test]
    fn test_unknown_tool() {
        let result = dispatcher().execute("nonexistent_tool", &ToolParams::new());
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("unknown tool: nonexistent_tool"));
    }

    #[test]
    fn test_missing_required_names_all_and_skips_tool() {
        let (dispatcher, calls) = counting_dispatcher();
        let result = dispatcher.execute("count", &params(json!({"a": null})));
        assert!(!result.success);
        assert_eq!(
            result.error.as_deref(),
            Some("invalid parameters: missing required parameters: a, b")
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_disallowed_value_names_allowed_set() {
        let result =
            dispatcher().execute("navigate_to", &params(json!({"destination": "kitchen"})));
        assert!(!result.success);
        let err = result.error.unwrap();
        assert!(err.contains("destination"));
        assert!(err.contains("order_history"));
    }

    #[test]
    fn test_integer_coercion() {
        let result =
            dispatcher().execute("order_menu", &params(json!({"menu": "냉면", "quantity": "3"})));
        assert!(result.success);
        assert_eq!(result.result["quantity"], 3);

        let result =
            dispatcher().execute("order_menu", &params(json!({"menu": "냉면", "quantity": "three"})));
        assert!(!result.success);
        assert!(result.error.unwrap().contains("quantity"));
    }

    #[test]
    fn test_string_type_checked() {
        let result = dispatcher().execute("order_menu", &params(json!({"menu": 42})));
        assert!(!result.success);
        assert!(result.error.unwrap().contains("must be a string"));
    }

    #[test]
    fn test_optional_null_is_dropped() {
        let def = ToolCatalog::standard().lookup("order_menu").unwrap().clone();
        let validated =
            validate_params(&def, &params(json!({"menu": "불고기", "options": null}))).unwrap();
        assert!(!validated.contains_key("options"));
    }

    #[test]
    fn test_extra_params_pass_through() {
        let def = ToolCatalog::standard().lookup("order_menu").unwrap().clone();
        let validated =
            validate_params(&def, &params(json!({"menu": "불고기", "table": 4}))).unwrap();
        assert_eq!(validated["table"], 4);
    }

    #[test]
    fn test_coerce_integer() {
        assert_eq!(coerce_integer(&json!(2)), Some(json!(2)));
        assert_eq!(coerce_integer(&json!(2.0)), Some(json!(2)));
        assert_eq!(coerce_integer(&json!(2.5)), None);
        assert_eq!(coerce_integer(&json!(" 7 ")), Some(json!(7)));
        assert_eq!(coerce_integer(&json!(true)), None);
    }

    #[test]
    fn test_panicking_tool_becomes_failure() {
        let (dispatcher, calls) = counting_dispatcher();
        let result = dispatcher.execute("count", &params(json!({"a": "x", "b": 1, "boom": true})));
        assert!(!result.success);
        assert!(result.error.unwrap().contains("kaboom"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_success_carries_category_and_language() {
        let result = dispatcher().execute("set_language", &params(json!({"language": "ja"})));
        assert!(result.success);
        assert_eq!(result.execution_category, Some(ExecutionCategory::SelfContained));
        assert_eq!(result.language, Some(storedesk_shared::Language::Ja));
    }

    #[test]
    fn test_language_names_normalized_before_allowed_check() {
        for (requested, expected) in [
            ("English", Language::En),
            ("english", Language::En),
            ("EN", Language::En),
            ("日本語", Language::Ja),
            ("중국어", Language::Zh),
        ] {
            let result =
                dispatcher().execute("set_language", &params(json!({"language": requested})));
            assert!(result.success, "{}: {:?}", requested, result.error);
            assert_eq!(result.language, Some(expected), "{}", requested);
            assert_eq!(result.result["language"], expected.code());
        }
    }

    #[test]
    fn test_unsupported_language_still_rejected() {
        let result = dispatcher().execute("set_language", &params(json!({"language": "Klingon"})));
        assert!(!result.success);
        assert_eq!(
            result.error.as_deref(),
            Some("invalid parameters: parameter 'language' must be one of: ko, en, ja, zh")
        );
    }
}
