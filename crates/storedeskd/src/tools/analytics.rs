//! LLM-interpreted owner tools: structured data a generation model narrates.
//!
//! Figures are fixed sample data until the sales database is wired in.

use serde_json::json;
use storedesk_shared::{
    ExecutionCategory, ParamSpec, ParamType, ToolDefinition, ToolError, ToolParams,
};
use tracing::info;

use super::{notification, str_param, Tool, ToolOutput};

/// Sales figures for a period
pub struct GetSalesDataTool {
    def: ToolDefinition,
}

impl GetSalesDataTool {
    pub fn new() -> Self {
        Self {
            def: ToolDefinition::new(
                "get_sales_data",
                "Look up sales figures for a date and period",
                ExecutionCategory::LlmInterpreted,
            )
            .param(
                ParamSpec::new("date", ParamType::String, "today, yesterday or YYYY-MM-DD")
                    .with_default("today"),
            )
            .param(
                ParamSpec::new("period", ParamType::String, "daily, weekly or monthly")
                    .with_default("daily"),
            ),
        }
    }
}

impl Default for GetSalesDataTool {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for GetSalesDataTool {
    fn definition(&self) -> &ToolDefinition {
        &self.def
    }

    fn execute(&self, params: &ToolParams) -> Result<ToolOutput, ToolError> {
        let date = str_param(&self.def, params, "date").unwrap_or("today");
        let period = str_param(&self.def, params, "period").unwrap_or("daily");

        let note = notification(
            &self.def.name,
            &format!("{} 매출 데이터 조회 (기간: {})", date, period),
        );
        info!("{}", note);

        Ok(ToolOutput::new(
            json!({
                "date": date,
                "period": period,
                "total_sales": 1_500_000,
                "order_count": 45,
                "average_order_value": 33_333,
                "comparison": {
                    "previous_period": 1_350_000,
                    "change_percent": 11.1
                },
                "top_menu": "김치찌개",
                "peak_hour": "12:00-13:00"
            }),
            note,
        ))
    }
}

/// Order counts and menu ranking
pub struct GetOrderStatisticsTool {
    def: ToolDefinition,
}

impl GetOrderStatisticsTool {
    pub fn new() -> Self {
        Self {
            def: ToolDefinition::new(
                "get_order_statistics",
                "Look up order statistics",
                ExecutionCategory::LlmInterpreted,
            )
            .param(
                ParamSpec::new("period", ParamType::String, "today, week or month")
                    .with_default("today"),
            )
            .param(
                ParamSpec::new(
                    "stat_type",
                    ParamType::String,
                    "menu_ranking, time_distribution or category",
                )
                .with_default("menu_ranking"),
            ),
        }
    }
}

impl Default for GetOrderStatisticsTool {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for GetOrderStatisticsTool {
    fn definition(&self) -> &ToolDefinition {
        &self.def
    }

    fn execute(&self, params: &ToolParams) -> Result<ToolOutput, ToolError> {
        let period = str_param(&self.def, params, "period").unwrap_or("today");
        let stat_type = str_param(&self.def, params, "stat_type").unwrap_or("menu_ranking");

        let note = notification(
            &self.def.name,
            &format!("{} 주문 통계 조회 (유형: {})", period, stat_type),
        );
        info!("{}", note);

        Ok(ToolOutput::new(
            json!({
                "period": period,
                "stat_type": stat_type,
                "total_orders": 45,
                "menu_ranking": [
                    {"rank": 1, "menu": "김치찌개", "count": 15, "percentage": 33.3},
                    {"rank": 2, "menu": "된장찌개", "count": 12, "percentage": 26.7},
                    {"rank": 3, "menu": "비빔밥", "count": 10, "percentage": 22.2},
                    {"rank": 4, "menu": "불고기", "count": 5, "percentage": 11.1},
                    {"rank": 5, "menu": "냉면", "count": 3, "percentage": 6.7}
                ],
                "time_distribution": {
                    "morning": 5,
                    "lunch": 25,
                    "afternoon": 8,
                    "dinner": 7
                }
            }),
            note,
        ))
    }
}

/// Sales and order trend analysis
pub struct AnalyzeTrendsTool {
    def: ToolDefinition,
}

impl AnalyzeTrendsTool {
    pub fn new() -> Self {
        Self {
            def: ToolDefinition::new(
                "analyze_trends",
                "Analyze sales and order trends",
                ExecutionCategory::LlmInterpreted,
            )
            .param(
                ParamSpec::new("analysis_type", ParamType::String, "sales, menu or customer")
                    .with_default("sales"),
            )
            .param(
                ParamSpec::new("period", ParamType::String, "week, month or quarter")
                    .with_default("week"),
            ),
        }
    }
}

impl Default for AnalyzeTrendsTool {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for AnalyzeTrendsTool {
    fn definition(&self) -> &ToolDefinition {
        &self.def
    }

    fn execute(&self, params: &ToolParams) -> Result<ToolOutput, ToolError> {
        let analysis_type = str_param(&self.def, params, "analysis_type").unwrap_or("sales");
        let period = str_param(&self.def, params, "period").unwrap_or("week");

        let note = notification(
            &self.def.name,
            &format!("{} 트렌드 분석 ({})", analysis_type, period),
        );
        info!("{}", note);

        Ok(ToolOutput::new(
            json!({
                "analysis_type": analysis_type,
                "period": period,
                "trend": "increasing",
                "trend_percentage": 15.5,
                "insights": [
                    "주말 매출이 평일 대비 20% 높습니다",
                    "점심 시간대(12-13시) 주문이 집중되어 있습니다",
                    "김치찌개가 지속적으로 1위를 유지하고 있습니다"
                ],
                "recommendations": [
                    "점심 시간대 직원 배치 강화 권장",
                    "인기 메뉴 재고 관리 필요"
                ]
            }),
            note,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sales_data_defaults() {
        let out = GetSalesDataTool::new().execute(&ToolParams::new()).unwrap();
        assert_eq!(out.result["date"], "today");
        assert_eq!(out.result["period"], "daily");
        assert_eq!(out.result["total_sales"], 1_500_000);
    }

    #[test]
    fn test_order_statistics_is_deterministic() {
        let tool = GetOrderStatisticsTool::new();
        let a = tool.execute(&ToolParams::new()).unwrap();
        let b = tool.execute(&ToolParams::new()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.result["menu_ranking"][0]["menu"], "김치찌개");
    }

    #[test]
    fn test_trends_echoes_params() {
        let mut params = ToolParams::new();
        params.insert("period".to_string(), json!("month"));
        let out = AnalyzeTrendsTool::new().execute(&params).unwrap();
        assert_eq!(out.result["period"], "month");
        assert_eq!(out.result["analysis_type"], "sales");
    }
}
