//! GoalInterpreter：自由文本目标 → Understanding
//!
//! 一次 LLM 调用；输出无法解析时静默回退到 Understanding::fallback，不重试。

use std::sync::Arc;

use crate::core::AgentError;
use crate::llm::LlmClient;
use crate::planning::parse::{parse_json_object, Parsed};
use crate::planning::Understanding;

const UNDERSTANDING_PROMPT: &str = "You are an AI agent that understands research goals.
Analyze the goal and extract:
1. Main objective
2. Key topics/entities
3. Expected deliverable type (report, summary, analysis, etc.)
4. Scope and constraints
5. Success criteria

Return as JSON with keys: objective, topics, deliverable_type, scope, success_criteria";

pub const DEFAULT_UNDERSTANDING_MAX_TOKENS: u32 = 2000;

pub struct GoalInterpreter {
    llm: Arc<dyn LlmClient>,
    max_output: u32,
}

impl GoalInterpreter {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            llm,
            max_output: DEFAULT_UNDERSTANDING_MAX_TOKENS,
        }
    }

    pub fn with_max_output(mut self, max_output: u32) -> Self {
        self.max_output = max_output;
        self
    }

    /// 理解目标；只有 LLM 调用本身失败才返回 Err
    pub async fn interpret(&self, goal: &str) -> Result<Parsed<Understanding>, AgentError> {
        let input = format!(
            "Goal: {}\n\nAnalyze this goal and return the structured information as JSON.",
            goal
        );
        let output = self
            .llm
            .complete(UNDERSTANDING_PROMPT, &input, self.max_output)
            .await
            .map_err(|e| AgentError::llm("understanding", e))?;

        Ok(match parse_json_object::<Understanding>(&output) {
            Ok(understanding) => Parsed::Structured(understanding),
            Err(reason) => {
                tracing::debug!(%reason, "goal understanding unparsable, using fallback");
                Parsed::Fallback {
                    value: Understanding::fallback(goal),
                    reason,
                }
            }
        })
    }
}
