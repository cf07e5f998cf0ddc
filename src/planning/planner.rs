//! PlanBuilder：Understanding → 有序 PlanStep 列表
//!
//! 从 LLM 输出中截取首个 `[` 到最后一个 `]` 解析为计划并校验；解析或校验失败时使用确定性回退计划：
//! 1 个目标搜索步骤 + 至多 3 个主题搜索（非关键）+ 1 个最终 synthesize 步骤。

use std::sync::Arc;

use crate::core::AgentError;
use crate::llm::LlmClient;
use crate::planning::parse::{parse_json_array, Parsed};
use crate::planning::{validate_plan, Plan, PlanStep, Understanding};
use crate::tools::ToolKind;

const PLANNING_PROMPT: &str = r#"You are an expert task planner for a research agent.

Given a research goal, create a detailed step-by-step plan.

Each step should have:
- description: Clear description of what to do
- tool: Which tool to use (web_search, web_fetch, analyze, synthesize)
- inputs: What inputs are needed
- expected_output: What the step should produce
- dependencies: Which previous steps this depends on (array of step numbers)
- critical: Whether failure of this step should stop execution (boolean)

Available tools:
- web_search: Search the internet for information
- web_fetch: Fetch and read specific web pages
- analyze: Analyze data or information
- synthesize: Combine information from multiple sources

Return as JSON array of steps. Be thorough but efficient (5-10 steps typically).

Example output:
[
  {
    "step_number": 1,
    "description": "Search for current market size of electric vehicles in Europe",
    "tool": "web_search",
    "inputs": {"query": "electric vehicle market size Europe 2024"},
    "expected_output": "Market size statistics and trends",
    "dependencies": [],
    "critical": true
  }
]"#;

pub const DEFAULT_PLANNING_MAX_TOKENS: u32 = 3000;

/// 回退计划中最多展开的主题数
const MAX_FALLBACK_TOPICS: usize = 3;

pub struct PlanBuilder {
    llm: Arc<dyn LlmClient>,
    max_output: u32,
}

impl PlanBuilder {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            llm,
            max_output: DEFAULT_PLANNING_MAX_TOKENS,
        }
    }

    pub fn with_max_output(mut self, max_output: u32) -> Self {
        self.max_output = max_output;
        self
    }

    /// 生成计划；LLM 调用失败或 Understanding 无法编码时返回 Err，输出格式错误走回退
    pub async fn build(&self, understanding: &Understanding) -> Result<Parsed<Plan>, AgentError> {
        let serialized = serde_json::to_string_pretty(understanding)?;
        let input = format!(
            "Goal Understanding:\n{}\n\nCreate a detailed execution plan for this research goal. Return ONLY the JSON array, no other text.",
            serialized
        );
        let output = self
            .llm
            .complete(PLANNING_PROMPT, &input, self.max_output)
            .await
            .map_err(|e| AgentError::llm("planning", e))?;

        let parsed = parse_json_array::<PlanStep>(&output)
            .and_then(|steps| validate_plan(steps).map_err(|e| e.to_string()));

        Ok(match parsed {
            Ok(plan) => Parsed::Structured(plan),
            Err(reason) => {
                tracing::debug!(%reason, "plan unparsable, using fallback plan");
                Parsed::Fallback {
                    value: fallback_plan(understanding),
                    reason,
                }
            }
        })
    }
}

/// 确定性回退计划（始终至少 2 步，且仅有最后一步为 synthesize）
pub fn fallback_plan(understanding: &Understanding) -> Plan {
    let objective = &understanding.objective;
    let mut plan = vec![PlanStep::new(
        1,
        format!("Search for information about {}", objective),
        ToolKind::WebSearch,
    )
    .with_input("query", objective.as_str())
    .with_expected_output("Initial research findings")];

    for (i, topic) in understanding
        .topics
        .iter()
        .take(MAX_FALLBACK_TOPICS)
        .enumerate()
    {
        plan.push(
            PlanStep::new(i + 2, format!("Deep dive into {}", topic), ToolKind::WebSearch)
                .with_input("query", topic.as_str())
                .with_expected_output(format!("Detailed information about {}", topic))
                .with_dependencies(vec![1])
                .with_critical(false),
        );
    }

    let preceding: Vec<usize> = (1..=plan.len()).collect();
    plan.push(
        PlanStep::new(plan.len() + 1, "Synthesize all findings", ToolKind::Synthesize)
            .with_input("sources", "all_previous_steps")
            .with_expected_output("Comprehensive summary")
            .with_dependencies(preceding),
    );
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlmClient;

    fn understanding(topics: &[&str]) -> Understanding {
        Understanding {
            topics: topics.iter().map(|t| t.to_string()).collect(),
            ..Understanding::fallback("EV adoption in Europe")
        }
    }

    #[test]
    fn test_fallback_with_two_topics() {
        let plan = fallback_plan(&understanding(&["batteries", "charging"]));
        assert_eq!(plan.len(), 4);

        assert_eq!(plan[0].tool, "web_search");
        assert!(plan[0].critical);
        assert!(plan[0].dependencies.is_empty());
        assert_eq!(plan[0].inputs["query"], "EV adoption in Europe");

        for step in &plan[1..3] {
            assert_eq!(step.tool, "web_search");
            assert_eq!(step.dependencies, vec![1]);
            assert!(!step.critical);
        }
        assert_eq!(plan[2].inputs["query"], "charging");

        assert_eq!(plan[3].tool, "synthesize");
        assert_eq!(plan[3].dependencies, vec![1, 2, 3]);
        assert!(plan[3].critical);
        assert_eq!(plan[3].inputs["sources"], "all_previous_steps");
        let numbers: Vec<usize> = plan.iter().map(|s| s.step_number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_fallback_without_topics_has_two_steps() {
        let plan = fallback_plan(&understanding(&[]));
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[1].dependencies, vec![1]);
    }

    #[test]
    fn test_fallback_caps_topics_at_three() {
        let plan = fallback_plan(&understanding(&["a", "b", "c", "d", "e"]));
        assert_eq!(plan.len(), 5);
        let synth: Vec<_> = plan.iter().filter(|s| s.tool == "synthesize").collect();
        assert_eq!(synth.len(), 1);
        assert_eq!(plan[4].dependencies, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_parses_plan_wrapped_in_prose() {
        let llm = Arc::new(MockLlmClient::always(
            r#"Here is the plan:
[
  {"step_number": 1, "description": "Search", "tool": "web_search", "inputs": {"query": "ev"}, "expected_output": "facts", "dependencies": [], "critical": true},
  {"step_number": 2, "description": "Analyze", "tool": "analyze", "inputs": {"data": "facts"}, "expected_output": "insights", "dependencies": [1], "critical": false}
]
Good luck!"#,
        ));
        let parsed = PlanBuilder::new(llm).build(&understanding(&[])).await.unwrap();
        assert!(!parsed.is_fallback());
        let plan = parsed.into_inner();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[1].tool, "analyze");
        assert!(!plan[1].critical);
    }

    #[tokio::test]
    async fn test_unparsable_plan_falls_back() {
        let llm = Arc::new(MockLlmClient::always("I would start by searching."));
        let parsed = PlanBuilder::new(llm)
            .build(&understanding(&["batteries"]))
            .await
            .unwrap();
        assert!(parsed.is_fallback());
        assert_eq!(parsed.value().len(), 3);
    }

    #[tokio::test]
    async fn test_empty_plan_falls_back() {
        let llm = Arc::new(MockLlmClient::always("[]"));
        let parsed = PlanBuilder::new(llm).build(&understanding(&[])).await.unwrap();
        assert!(parsed.is_fallback());
        assert_eq!(parsed.fallback_reason(), Some("Plan has no steps"));
    }

    #[tokio::test]
    async fn test_planner_receives_serialized_understanding() {
        let llm = Arc::new(MockLlmClient::always("[]"));
        PlanBuilder::new(llm.clone())
            .build(&understanding(&["batteries"]))
            .await
            .unwrap();
        let calls = llm.calls();
        assert!(calls[0].input.contains("\"objective\": \"EV adoption in Europe\""));
        assert_eq!(calls[0].max_output, DEFAULT_PLANNING_MAX_TOKENS);
    }
}
