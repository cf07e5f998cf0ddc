//! analyze 工具：结合最近几条成功结果分析输入数据
//!
//! 只取上下文中最后 `context_entries` 条 *成功* 结果，每条截断到 `context_chars` 个字符。

use async_trait::async_trait;
use serde_json::Value;

use crate::core::StepResult;
use crate::tools::{Tool, ToolContext, ToolInputs, ToolKind};

pub const DEFAULT_ANALYZE_CONTEXT_ENTRIES: usize = 3;
pub const DEFAULT_ANALYZE_CONTEXT_CHARS: usize = 500;
pub const DEFAULT_ANALYZE_MAX_TOKENS: u32 = 2000;

pub struct AnalyzeTool {
    context_entries: usize,
    context_chars: usize,
    max_output: u32,
}

impl AnalyzeTool {
    pub fn new(context_entries: usize, context_chars: usize, max_output: u32) -> Self {
        Self {
            context_entries,
            context_chars,
            max_output,
        }
    }

    fn context_block(&self, context: &[StepResult]) -> String {
        let recent: Vec<&str> = context
            .iter()
            .filter_map(StepResult::completed_result)
            .collect();
        let skip = recent.len().saturating_sub(self.context_entries);
        recent[skip..]
            .iter()
            .map(|r| {
                format!(
                    "Previous finding: {}",
                    r.chars().take(self.context_chars).collect::<String>()
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

impl Default for AnalyzeTool {
    fn default() -> Self {
        Self::new(
            DEFAULT_ANALYZE_CONTEXT_ENTRIES,
            DEFAULT_ANALYZE_CONTEXT_CHARS,
            DEFAULT_ANALYZE_MAX_TOKENS,
        )
    }
}

/// 字符串原样使用，其他 JSON 值序列化
fn value_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

#[async_trait]
impl Tool for AnalyzeTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Analyze
    }

    fn description(&self) -> &str {
        "Analyze data or information. Inputs: {\"data\": \"...\", \"type\": \"general\"}"
    }

    async fn execute(
        &self,
        inputs: &ToolInputs,
        context: &[StepResult],
        ctx: &ToolContext,
    ) -> Result<String, String> {
        let data = value_text(inputs.get("data"));
        let analysis_type = inputs
            .get("type")
            .and_then(|v| v.as_str())
            .unwrap_or("general");

        let instructions = format!(
            "You are analyzing research data.\n\nAnalysis type: {}\n\nProvide insights, patterns, key findings, and conclusions.\nBe specific and data-driven.",
            analysis_type
        );
        let input = format!(
            "Context:\n{}\n\nData to analyze:\n{}\n\nProvide analysis.",
            self.context_block(context),
            data
        );
        ctx.llm.complete(&instructions, &input, self.max_output).await
    }
}
