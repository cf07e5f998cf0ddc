//! web_search 工具：由 LLM 模拟搜索结果（不访问网络，不缓存）

use async_trait::async_trait;

use crate::core::StepResult;
use crate::tools::{Tool, ToolContext, ToolInputs, ToolKind};

const SEARCH_PROMPT: &str = "You are simulating web search results.

Provide realistic, factual search results for the given query.
Include 3-5 relevant findings with brief descriptions.
Format as a structured summary.";

pub const DEFAULT_SEARCH_MAX_TOKENS: u32 = 1500;

pub struct WebSearchTool {
    max_output: u32,
}

impl WebSearchTool {
    pub fn new(max_output: u32) -> Self {
        Self { max_output }
    }
}

impl Default for WebSearchTool {
    fn default() -> Self {
        Self::new(DEFAULT_SEARCH_MAX_TOKENS)
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn kind(&self) -> ToolKind {
        ToolKind::WebSearch
    }

    fn description(&self) -> &str {
        "Search the internet for information. Inputs: {\"query\": \"...\"}"
    }

    async fn execute(
        &self,
        inputs: &ToolInputs,
        _context: &[StepResult],
        ctx: &ToolContext,
    ) -> Result<String, String> {
        let query = inputs.get("query").and_then(|v| v.as_str()).unwrap_or("");
        let input = format!(
            "Search query: {}\n\nProvide relevant, factual information.",
            query
        );
        ctx.llm.complete(SEARCH_PROMPT, &input, self.max_output).await
    }
}
