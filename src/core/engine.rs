//! 执行引擎（ExecutionEngine）：按列表位置逐步执行计划
//!
//! 状态机：in_progress → completed | failed。dependencies 只作记录，不参与排序或等待。
//! 非关键步骤失败被吸收并继续；关键步骤失败立即终止，不再执行后续步骤、不再发送进度。

use serde_json::json;

use crate::core::{
    EventKind, EventLog, ExecutionState, ExecutionStatus, ProgressEvent, ProgressSink, StepResult,
};
use crate::planning::PlanStep;
use crate::tools::StepExecutor;

pub struct ExecutionEngine {
    executor: StepExecutor,
}

impl ExecutionEngine {
    pub fn new(executor: StepExecutor) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &StepExecutor {
        &self.executor
    }

    /// 执行整个计划，返回终态 ExecutionState
    ///
    /// steps_completed 记录已处理的计划位置：成功步骤与被吸收的非关键失败都会推进它，
    /// 因此 completed 终态下恒有 `step_results.len() == steps_completed`。
    pub async fn run(
        &self,
        plan: &[PlanStep],
        log: &mut EventLog,
        progress: Option<&dyn ProgressSink>,
    ) -> ExecutionState {
        let mut state = ExecutionState::new(plan.len());

        for (i, step) in plan.iter().enumerate() {
            let position = i + 1;
            log.record(EventKind::StepStarted, step);
            tracing::info!(step = position, tool = %step.tool, description = %step.description, "step started");

            match self.executor.execute(step, &state.step_results).await {
                Ok(result) => {
                    state.push(StepResult::completed(position, step.clone(), result.clone()));
                    state.steps_completed = position;
                    if let Some(sink) = progress {
                        sink.notify(ProgressEvent::Progress(state.clone())).await;
                    }
                    log_step_completed(log, position, &result);
                }
                Err(e) => {
                    let failed = StepResult::failed(position, step.clone(), e.to_string());
                    log.record(EventKind::StepFailed, &failed);
                    state.push(failed);

                    if !step.critical {
                        tracing::warn!(step = position, error = %e, "non-critical step failed, continuing");
                        state.steps_completed = position;
                        continue;
                    }
                    tracing::error!(step = position, error = %e, "critical step failed, aborting run");
                    state.finish(ExecutionStatus::Failed);
                    return state;
                }
            }
        }

        state.finish(ExecutionStatus::Completed);
        state
    }
}

fn log_step_completed(log: &mut EventLog, position: usize, result: &str) {
    log.append(
        EventKind::StepCompleted,
        json!({ "step_number": position, "result": result }),
    );
}
