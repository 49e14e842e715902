//! Self-contained store tools: their output is the final answer.

use serde_json::json;
use storedesk_shared::{
    ExecutionCategory, Language, Normalizer, ParamSpec, ParamType, ToolDefinition, ToolError,
    ToolParams,
};
use tracing::{info, warn};

use super::{int_param, notification, str_param, Tool, ToolOutput};

/// Switch the response language
pub struct SetLanguageTool {
    def: ToolDefinition,
}

impl SetLanguageTool {
    pub fn new() -> Self {
        Self {
            def: ToolDefinition::new(
                "set_language",
                "Change the conversation language. Supports Korean(ko), English(en), Japanese(ja), Chinese(zh)",
                ExecutionCategory::SelfContained,
            )
            .param(
                ParamSpec::new(
                    "language",
                    ParamType::String,
                    "Language code: 한국어=ko, English=en, 日本語=ja, 中文=zh",
                )
                .with_default("en")
                .normalized(Normalizer::LanguageCode)
                .one_of(&["ko", "en", "ja", "zh"]),
            ),
        }
    }
}

impl Default for SetLanguageTool {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for SetLanguageTool {
    fn definition(&self) -> &ToolDefinition {
        &self.def
    }

    fn execute(&self, params: &ToolParams) -> Result<ToolOutput, ToolError> {
        let requested = str_param(&self.def, params, "language").unwrap_or("en");
        let language = Language::from_name_or_code(requested).unwrap_or_else(|| {
            warn!("Unsupported language: {}, using en", requested);
            Language::En
        });

        let note = notification(
            &self.def.name,
            &format!("언어를 {}(으)로 변경", language.native_name()),
        );
        info!("{}", note);

        Ok(ToolOutput::new(
            json!({
                "language": language.code(),
                "language_name": language.native_name(),
                "message": language.changed_message(),
            }),
            note,
        )
        .with_language(language))
    }
}

/// Place a menu order
pub struct OrderMenuTool {
    def: ToolDefinition,
}

impl OrderMenuTool {
    pub fn new() -> Self {
        Self {
            def: ToolDefinition::new(
                "order_menu",
                "Order a menu item for the customer",
                ExecutionCategory::SelfContained,
            )
            .param(ParamSpec::new("menu", ParamType::String, "Menu item name").required())
            .param(
                ParamSpec::new("quantity", ParamType::Integer, "Number of servings")
                    .with_default(1),
            )
            .param(ParamSpec::new(
                "options",
                ParamType::String,
                "Extra request, e.g. '맵게', '덜 맵게'",
            )),
        }
    }
}

impl Default for OrderMenuTool {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for OrderMenuTool {
    fn definition(&self) -> &ToolDefinition {
        &self.def
    }

    fn execute(&self, params: &ToolParams) -> Result<ToolOutput, ToolError> {
        let menu = str_param(&self.def, params, "menu")
            .ok_or_else(|| ToolError::Execution("menu is required".to_string()))?;
        let quantity = int_param(&self.def, params, "quantity").unwrap_or(1);
        if quantity < 1 {
            return Err(ToolError::Execution(format!(
                "quantity must be at least 1, got {}",
                quantity
            )));
        }
        let options = str_param(&self.def, params, "options").filter(|o| !o.is_empty());

        let mut detail = format!("{} {}개", menu, quantity);
        let mut message = format!("{} {}개 주문이 완료되었습니다", menu, quantity);
        if let Some(options) = options {
            detail.push_str(&format!(", 옵션: {}", options));
            message.push_str(&format!(" (옵션: {})", options));
        }

        let note = notification(&self.def.name, &detail);
        info!("{}", note);

        Ok(ToolOutput::new(
            json!({
                "menu": menu,
                "quantity": quantity,
                "options": options,
                "message": message,
            }),
            note,
        ))
    }
}

/// Move the customer's screen
pub struct NavigateToTool {
    def: ToolDefinition,
}

impl NavigateToTool {
    pub fn new() -> Self {
        Self {
            def: ToolDefinition::new(
                "navigate_to",
                "Move the user to a screen or page",
                ExecutionCategory::SelfContained,
            )
            .param(
                ParamSpec::new("destination", ParamType::String, "Screen to open")
                    .required()
                    .one_of(&["menu", "order_history", "settings", "store_info", "reviews", "home"]),
            ),
        }
    }
}

impl Default for NavigateToTool {
    fn default() -> Self {
        Self::new()
    }
}

fn destination_name(destination: &str) -> &str {
    match destination {
        "menu" => "메뉴 화면",
        "order_history" => "주문 내역",
        "settings" => "설정 화면",
        "store_info" => "매장 정보",
        "reviews" => "리뷰 화면",
        "home" => "홈 화면",
        other => other,
    }
}

impl Tool for NavigateToTool {
    fn definition(&self) -> &ToolDefinition {
        &self.def
    }

    fn execute(&self, params: &ToolParams) -> Result<ToolOutput, ToolError> {
        let destination = str_param(&self.def, params, "destination")
            .ok_or_else(|| ToolError::Execution("destination is required".to_string()))?;
        let name = destination_name(destination);

        let note = notification(&self.def.name, &format!("{}(으)로 이동", name));
        info!("{}", note);

        Ok(ToolOutput::new(
            json!({
                "destination": destination,
                "destination_name": name,
                "message": format!("{}(으)로 이동합니다", name),
            }),
            note,
        ))
    }
}

/// Filter the menu list
pub struct ApplyFilterTool {
    def: ToolDefinition,
}

impl ApplyFilterTool {
    pub fn new() -> Self {
        Self {
            def: ToolDefinition::new(
                "apply_filter",
                "Apply a filter to the menu or product list",
                ExecutionCategory::SelfContained,
            )
            .param(
                ParamSpec::new("filter_type", ParamType::String, "Kind of filter")
                    .required()
                    .one_of(&["category", "price", "popularity", "spicy_level"]),
            )
            .param(ParamSpec::new("filter_value", ParamType::String, "Filter value").required()),
        }
    }
}

impl Default for ApplyFilterTool {
    fn default() -> Self {
        Self::new()
    }
}

fn filter_type_name(filter_type: &str) -> &str {
    match filter_type {
        "category" => "카테고리",
        "price" => "가격",
        "popularity" => "인기도",
        "spicy_level" => "매운맛",
        other => other,
    }
}

impl Tool for ApplyFilterTool {
    fn definition(&self) -> &ToolDefinition {
        &self.def
    }

    fn execute(&self, params: &ToolParams) -> Result<ToolOutput, ToolError> {
        let (Some(filter_type), Some(filter_value)) = (
            str_param(&self.def, params, "filter_type"),
            str_param(&self.def, params, "filter_value"),
        ) else {
            return Err(ToolError::Execution(
                "filter_type and filter_value are required".to_string(),
            ));
        };
        let type_name = filter_type_name(filter_type);

        let note = notification(
            &self.def.name,
            &format!("{} 필터 적용: {}", type_name, filter_value),
        );
        info!("{}", note);

        Ok(ToolOutput::new(
            json!({
                "filter_type": filter_type,
                "filter_value": filter_value,
                "message": format!("{} 필터가 '{}'(으)로 적용되었습니다", type_name, filter_value),
            }),
            note,
        ))
    }
}
