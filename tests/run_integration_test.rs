//! 运行级集成测试：按 instructions 前缀路由的 Mock LLM + Mock Web 客户端

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use quest::agent::create_orchestrator_with;
use quest::config::AppConfig;
use quest::core::{EventKind, ExecutionStatus, ProgressEvent, ProgressSink, RunResult};
use quest::llm::MockLlmClient;
use quest::tools::MockWebClient;

const UNDERSTANDING: &str = r#"{"objective": "Research EV market", "topics": ["Tesla", "BYD"],
    "deliverable_type": "report", "scope": "Europe", "success_criteria": ["numbers"]}"#;

const THREE_STEP_PLAN: &str = r#"Here is the plan:
[
  {"step_number": 1, "description": "Search EV market size", "tool": "web_search",
   "inputs": {"query": "EV market Europe"}, "expected_output": "numbers", "dependencies": [], "critical": true},
  {"step_number": 2, "description": "Read report", "tool": "web_fetch",
   "inputs": {"url": "https://example.com/ev"}, "expected_output": "page text", "dependencies": [1], "critical": true},
  {"step_number": 3, "description": "Analyze trends", "tool": "analyze",
   "inputs": {"data": "market numbers", "type": "trend"}, "expected_output": "insights", "dependencies": [1, 2], "critical": true}
]"#;

fn routed_llm(plan: &'static str, report: Result<&'static str, &'static str>) -> MockLlmClient {
    MockLlmClient::with_handler(move |instructions, input| {
        if instructions.starts_with("You are an AI agent that understands") {
            Ok(UNDERSTANDING.to_string())
        } else if instructions.starts_with("You are an expert task planner") {
            Ok(plan.to_string())
        } else if instructions.starts_with("You are creating the final deliverable") {
            report.map(str::to_string).map_err(str::to_string)
        } else {
            Ok(format!("answer to: {}", input.lines().next().unwrap_or("")))
        }
    })
}

fn web() -> MockWebClient {
    MockWebClient::new().with_page(
        "https://example.com/ev",
        "<html><script>x()</script><body><p>EV sales   grew 20%</p></body></html>",
    )
}

async fn run(llm: MockLlmClient, goal: &str) -> RunResult {
    create_orchestrator_with(&AppConfig::default(), Arc::new(llm), Arc::new(web()))
        .run(goal, None)
        .await
}

#[derive(Default)]
struct Recorder {
    names: Mutex<Vec<&'static str>>,
}

#[async_trait]
impl ProgressSink for Recorder {
    async fn notify(&self, event: ProgressEvent) {
        self.names.lock().unwrap().push(event.name());
    }
}

#[tokio::test]
async fn test_three_step_run_succeeds_with_ordered_log() {
    let llm = routed_llm(THREE_STEP_PLAN, Ok("# EV Report"));
    let result = run(llm.clone(), "Research the EV market in Europe").await;

    assert!(result.success);
    assert_eq!(result.output.as_deref(), Some("# EV Report"));
    let execution = result.execution.unwrap();
    assert_eq!(execution.status(), ExecutionStatus::Completed);
    assert_eq!(execution.steps_completed, 3);
    assert_eq!(execution.final_output.as_deref(), Some("# EV Report"));

    let fetched = execution.step_results[1].result.as_deref().unwrap();
    assert!(fetched.contains("EV sales grew 20%"));
    assert!(!fetched.contains("x()"));

    let kinds: Vec<EventKind> = result.log.iter().map(|e| e.event).collect();
    assert_eq!(
        kinds,
        vec![
            EventKind::GoalUnderstood,
            EventKind::PlanCreated,
            EventKind::StepStarted,
            EventKind::StepCompleted,
            EventKind::StepStarted,
            EventKind::StepCompleted,
            EventKind::StepStarted,
            EventKind::StepCompleted,
            EventKind::ResultsSynthesized,
        ]
    );
    assert!(result.log.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    assert_eq!(result.log[1].data["steps"], 3);
}

#[tokio::test]
async fn test_progress_events_arrive_in_stage_order() {
    let orchestrator = create_orchestrator_with(
        &AppConfig::default(),
        Arc::new(routed_llm(THREE_STEP_PLAN, Ok("done"))),
        Arc::new(web()),
    );
    let recorder = Recorder::default();
    orchestrator.run("EV market", Some(&recorder)).await;

    assert_eq!(
        *recorder.names.lock().unwrap(),
        vec!["understanding", "planning", "progress", "progress", "progress", "complete"]
    );
}

#[tokio::test]
async fn test_critical_failure_skips_synthesis() {
    let plan = r#"[
      {"description": "Search", "tool": "web_search", "inputs": {"query": "ev"}},
      {"description": "Teleport", "tool": "teleport", "critical": true},
      {"description": "Never runs", "tool": "web_search", "inputs": {"query": "x"}}
    ]"#;
    let llm = routed_llm(plan, Ok("unused"));
    let result = run(llm.clone(), "EV market").await;

    assert!(result.success);
    assert!(result.output.is_none());
    let execution = result.execution.unwrap();
    assert_eq!(execution.status(), ExecutionStatus::Failed);
    assert_eq!(execution.step_results.len(), 2);
    assert_eq!(
        execution.step_results[1].error.as_deref(),
        Some("Tool 'teleport' not found")
    );
    assert!(!result
        .log
        .iter()
        .any(|e| e.event == EventKind::ResultsSynthesized));
    assert!(llm
        .calls()
        .iter()
        .all(|c| !c.instructions.starts_with("You are creating the final deliverable")));
}

#[tokio::test]
async fn test_synthesis_failure_is_failure_envelope() {
    let result = run(routed_llm(THREE_STEP_PLAN, Err("overloaded")), "EV market").await;

    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("Synthesis failed: overloaded"));
    assert!(result.execution.is_none());
    let last = result.log.last().unwrap();
    assert_eq!(last.event, EventKind::AgentError);
    assert_eq!(last.data["error"], "Synthesis failed: overloaded");
}

#[tokio::test]
async fn test_malformed_understanding_falls_back_to_goal() {
    let llm = MockLlmClient::with_handler(|instructions, _| {
        if instructions.starts_with("You are an AI agent that understands") {
            Ok("Sorry, I cannot produce JSON".to_string())
        } else if instructions.starts_with("You are an expert task planner") {
            Ok("also not a plan".to_string())
        } else {
            Ok("text".to_string())
        }
    });
    let result = run(llm, "Compare solar panel vendors").await;

    assert!(result.success);
    let understanding = result.understanding.unwrap();
    assert_eq!(understanding.objective, "Compare solar panel vendors");
    assert!(understanding.topics.is_empty());

    let plan = result.plan.unwrap();
    assert_eq!(plan.len(), 2);
    assert_eq!(
        plan[0].description,
        "Search for information about Compare solar panel vendors"
    );
    assert_eq!(plan[1].tool, "synthesize");
    assert_eq!(plan[1].dependencies, vec![1]);
    assert_eq!(result.output.as_deref(), Some("text"));
}
