//! 步骤执行器（StepExecutor）
//!
//! 按 step.tool 从 ToolRegistry 解析工具，把到目前为止的全部步骤结果作为上下文传入（不按 dependencies 过滤），
//! 工具失败统一包装为 StepError 并以值返回；每次调用输出结构化审计日志（JSON）。

use std::time::Instant;

use crate::core::{StepError, StepResult};
use crate::planning::PlanStep;
use crate::tools::{ToolContext, ToolInputs, ToolRegistry};

pub struct StepExecutor {
    registry: ToolRegistry,
    ctx: ToolContext,
}

impl StepExecutor {
    pub fn new(registry: ToolRegistry, ctx: ToolContext) -> Self {
        Self { registry, ctx }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// 执行单个步骤；未知工具为 ToolNotFound，工具返回 Err 为 ToolExecutionFailed
    pub async fn execute(&self, step: &PlanStep, context: &[StepResult]) -> Result<String, StepError> {
        let start = Instant::now();
        let result = match self.registry.resolve(&step.tool) {
            Ok(tool) => tool
                .execute(&step.inputs, context, &self.ctx)
                .await
                .map_err(|cause| StepError::ToolExecutionFailed {
                    description: step.description.clone(),
                    cause,
                }),
            Err(e) => Err(e),
        };

        let outcome = match &result {
            Ok(_) => "ok",
            Err(StepError::ToolNotFound { .. }) => "not_found",
            Err(StepError::ToolExecutionFailed { .. }) => "error",
        };
        let audit = serde_json::json!({
            "event": "tool_audit",
            "tool": step.tool,
            "step": step.step_number,
            "ok": result.is_ok(),
            "outcome": outcome,
            "duration_ms": start.elapsed().as_millis() as u64,
            "args_preview": args_preview(&step.inputs),
        });
        tracing::info!(target: "tool_audit", audit = %audit, "tool");

        result
    }
}

fn args_preview(inputs: &ToolInputs) -> String {
    let s = serde_json::to_string(inputs).unwrap_or_default();
    if s.chars().count() > 200 {
        format!("{}...", s.chars().take(200).collect::<String>())
    } else {
        s
    }
}
