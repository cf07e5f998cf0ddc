//! synthesize 工具：合并此前所有成功步骤的结果（不截断）

use async_trait::async_trait;

use crate::core::StepResult;
use crate::tools::{Tool, ToolContext, ToolInputs, ToolKind};

const SYNTHESIZE_PROMPT: &str = "You are synthesizing research findings.

Combine all the information into a coherent, comprehensive summary.
Identify common themes, contradictions, and key insights.
Structure the synthesis logically.";

const FINDINGS_SEPARATOR: &str = "\n\n---\n\n";

pub const DEFAULT_SYNTHESIZE_MAX_TOKENS: u32 = 3000;

pub struct SynthesizeTool {
    max_output: u32,
}

impl SynthesizeTool {
    pub fn new(max_output: u32) -> Self {
        Self { max_output }
    }
}

impl Default for SynthesizeTool {
    fn default() -> Self {
        Self::new(DEFAULT_SYNTHESIZE_MAX_TOKENS)
    }
}

#[async_trait]
impl Tool for SynthesizeTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Synthesize
    }

    fn description(&self) -> &str {
        "Combine information from multiple sources. Inputs: {\"sources\": \"all_previous_steps\"}"
    }

    async fn execute(
        &self,
        _inputs: &ToolInputs,
        context: &[StepResult],
        ctx: &ToolContext,
    ) -> Result<String, String> {
        let findings = context
            .iter()
            .filter_map(StepResult::completed_result)
            .filter(|r| !r.is_empty())
            .collect::<Vec<_>>()
            .join(FINDINGS_SEPARATOR);
        let input = format!(
            "Findings to synthesize:\n\n{}\n\nCreate comprehensive synthesis.",
            findings
        );
        ctx.llm
            .complete(SYNTHESIZE_PROMPT, &input, self.max_output)
            .await
    }
}
