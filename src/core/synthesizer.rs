//! ResultSynthesizer：把已完成步骤的结果综合为最终报告
//!
//! 无回退：LLM 失败以 AgentError::SynthesisError 传到 RunOrchestrator 边界。

use std::sync::Arc;

use crate::core::{AgentError, ExecutionState};
use crate::llm::LlmClient;

const REPORT_PROMPT: &str = "You are creating the final deliverable for a research task.

Synthesize all the research findings into a comprehensive, well-structured output.
Use markdown formatting for clarity.

Include:
- Executive Summary
- Main Findings (organized by topic)
- Key Statistics and Data Points
- Sources and References
- Conclusion";

pub const DEFAULT_REPORT_MAX_TOKENS: u32 = 4000;

pub struct ResultSynthesizer {
    llm: Arc<dyn LlmClient>,
    max_output: u32,
}

impl ResultSynthesizer {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            llm,
            max_output: DEFAULT_REPORT_MAX_TOKENS,
        }
    }

    pub fn with_max_output(mut self, max_output: u32) -> Self {
        self.max_output = max_output;
        self
    }

    /// 后端累计 token 使用：(prompt, completion, total)
    pub fn token_usage(&self) -> (u64, u64, u64) {
        self.llm.token_usage()
    }

    /// 按计划顺序拼接每个成功步骤：`## 描述` + 结果
    pub fn findings(state: &ExecutionState) -> String {
        state
            .completed_results()
            .map(|r| {
                format!(
                    "## {}\n\n{}",
                    r.step.description,
                    r.result.as_deref().unwrap_or_default()
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub async fn synthesize(
        &self,
        objective: &str,
        state: &ExecutionState,
    ) -> Result<String, AgentError> {
        let input = format!(
            "Original Goal: {}\n\nResearch Findings:\n\n{}\n\nCreate the final comprehensive report.",
            objective,
            Self::findings(state)
        );
        self.llm
            .complete(REPORT_PROMPT, &input, self.max_output)
            .await
            .map_err(AgentError::SynthesisError)
    }
}
