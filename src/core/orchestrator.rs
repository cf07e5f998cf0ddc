//! 运行编排器（RunOrchestrator）：理解 → 计划 → 执行 → 综合
//!
//! 每次 run 持有自己的 EventLog；orchestrator 本身无可变状态，可在多个并发运行间共享。
//! 所有 AgentError 在此边界被捕获一次，转为失败信封，调用方永远拿到 RunResult。

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::core::{
    AgentError, EventKind, EventLog, EventLogEntry, ExecutionEngine, ExecutionState,
    ExecutionStatus, ProgressEvent, ProgressSink, ResultSynthesizer,
};
use crate::planning::{GoalInterpreter, Plan, PlanBuilder, Understanding};

/// 一次运行的结果信封
///
/// 成功：`success=true`，带 understanding / plan / execution / output（执行失败时 output 缺省）。
/// 失败：`success=false`，只带 error 与截至失败点的 log。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub understanding: Option<Understanding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<Plan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution: Option<ExecutionState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub log: Vec<EventLogEntry>,
}

impl RunResult {
    fn succeeded(goal: &str, outcome: RunOutcome, log: Vec<EventLogEntry>) -> Self {
        Self {
            success: true,
            goal: Some(goal.to_string()),
            understanding: Some(outcome.understanding),
            plan: Some(outcome.plan),
            execution: Some(outcome.execution),
            output: outcome.output,
            error: None,
            log,
        }
    }

    fn failed(error: String, log: Vec<EventLogEntry>) -> Self {
        Self {
            success: false,
            goal: None,
            understanding: None,
            plan: None,
            execution: None,
            output: None,
            error: Some(error),
            log,
        }
    }
}

/// 外部请求体：`{"goal": "..."}`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GoalRequest {
    pub goal: String,
}

impl GoalRequest {
    pub fn new(goal: impl Into<String>) -> Self {
        Self { goal: goal.into() }
    }

    /// 目标去除首尾空白后不能为空；返回去空白后的目标
    pub fn validate(&self) -> Result<&str, AgentError> {
        let goal = self.goal.trim();
        if goal.is_empty() {
            return Err(AgentError::InvalidGoal("goal must not be empty".to_string()));
        }
        Ok(goal)
    }
}

struct RunOutcome {
    understanding: Understanding,
    plan: Plan,
    execution: ExecutionState,
    output: Option<String>,
}

pub struct RunOrchestrator {
    interpreter: GoalInterpreter,
    planner: PlanBuilder,
    engine: ExecutionEngine,
    synthesizer: ResultSynthesizer,
}

impl RunOrchestrator {
    pub fn new(
        interpreter: GoalInterpreter,
        planner: PlanBuilder,
        engine: ExecutionEngine,
        synthesizer: ResultSynthesizer,
    ) -> Self {
        Self {
            interpreter,
            planner,
            engine,
            synthesizer,
        }
    }

    /// 已注册工具的 (name, description)，按名称排序
    pub fn tool_descriptions(&self) -> Vec<(String, String)> {
        self.engine.executor().registry().tool_descriptions()
    }

    /// LLM 后端的累计 token 使用：(prompt, completion, total)
    pub fn token_usage(&self) -> (u64, u64, u64) {
        self.synthesizer.token_usage()
    }

    /// 执行一次完整运行；progress 为 None 时不发送任何进度事件
    pub async fn run(&self, goal: &str, progress: Option<&dyn ProgressSink>) -> RunResult {
        let mut log = EventLog::new();
        tracing::info!(goal = %goal, "run started");

        let result = match self.run_stages(goal, &mut log, progress).await {
            Ok(outcome) => RunResult::succeeded(goal, outcome, log.into_entries()),
            Err(e) => {
                tracing::error!(error = %e, "run failed");
                log.append(EventKind::AgentError, json!({ "error": e.to_string() }));
                RunResult::failed(e.to_string(), log.into_entries())
            }
        };

        let (prompt_tokens, completion_tokens, total_tokens) = self.token_usage();
        tracing::info!(
            success = result.success,
            prompt_tokens,
            completion_tokens,
            total_tokens,
            "run finished (cumulative token usage)"
        );

        if let Some(sink) = progress {
            sink.notify(ProgressEvent::Complete(Box::new(result.clone())))
                .await;
        }
        result
    }

    async fn run_stages(
        &self,
        goal: &str,
        log: &mut EventLog,
        progress: Option<&dyn ProgressSink>,
    ) -> Result<RunOutcome, AgentError> {
        let parsed = self.interpreter.interpret(goal).await?;
        if let Some(reason) = parsed.fallback_reason() {
            tracing::warn!(reason = %reason, "understanding fell back to defaults");
        }
        let understanding = parsed.into_inner();
        log.record(EventKind::GoalUnderstood, &understanding);
        if let Some(sink) = progress {
            sink.notify(ProgressEvent::Understanding(understanding.clone()))
                .await;
        }

        let parsed = self.planner.build(&understanding).await?;
        if let Some(reason) = parsed.fallback_reason() {
            tracing::warn!(reason = %reason, "plan fell back to default template");
        }
        let plan = parsed.into_inner();
        log.append(
            EventKind::PlanCreated,
            json!({ "steps": plan.len(), "plan": &plan }),
        );
        if let Some(sink) = progress {
            sink.notify(ProgressEvent::Planning(plan.clone())).await;
        }

        let mut execution = self.engine.run(&plan, log, progress).await;

        let output = if execution.status() == ExecutionStatus::Completed {
            let report = self
                .synthesizer
                .synthesize(&understanding.objective, &execution)
                .await?;
            log.append(
                EventKind::ResultsSynthesized,
                json!({ "length": report.chars().count() }),
            );
            execution.final_output = Some(report.clone());
            Some(report)
        } else {
            tracing::warn!("execution failed, skipping synthesis");
            None
        };

        Ok(RunOutcome {
            understanding,
            plan,
            execution,
            output,
        })
    }
}
