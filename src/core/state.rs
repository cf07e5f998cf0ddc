//! 执行状态：StepResult 与 ExecutionState
//!
//! step_results 只追加、保持计划顺序；status 单调：in_progress → completed | failed，不会回退。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::planning::PlanStep;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Completed,
    Failed,
}

/// 单步执行结果；result 与 error 恰有一个存在，与 status 对应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub step_number: usize,
    pub step: PlanStep,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub status: StepStatus,
    pub timestamp: DateTime<Utc>,
}

impl StepResult {
    pub fn completed(step_number: usize, step: PlanStep, result: String) -> Self {
        Self {
            step_number,
            step,
            result: Some(result),
            error: None,
            status: StepStatus::Completed,
            timestamp: Utc::now(),
        }
    }

    pub fn failed(step_number: usize, step: PlanStep, error: String) -> Self {
        Self {
            step_number,
            step,
            result: None,
            error: Some(error),
            status: StepStatus::Failed,
            timestamp: Utc::now(),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == StepStatus::Completed
    }

    /// 成功步骤的结果文本；失败步骤返回 None
    pub fn completed_result(&self) -> Option<&str> {
        match self.status {
            StepStatus::Completed => self.result.as_deref(),
            StepStatus::Failed => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    InProgress,
    Completed,
    Failed,
}

/// 一次运行的执行状态（每个进度事件携带其完整快照）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionState {
    pub steps_completed: usize,
    pub total_steps: usize,
    pub step_results: Vec<StepResult>,
    pub final_output: Option<String>,
    status: ExecutionStatus,
}

impl ExecutionState {
    pub fn new(total_steps: usize) -> Self {
        Self {
            steps_completed: 0,
            total_steps,
            step_results: Vec::with_capacity(total_steps),
            final_output: None,
            status: ExecutionStatus::InProgress,
        }
    }

    pub fn status(&self) -> ExecutionStatus {
        self.status
    }

    pub fn is_terminal(&self) -> bool {
        self.status != ExecutionStatus::InProgress
    }

    /// 终态转换；已处于终态时忽略并返回 false
    pub fn finish(&mut self, status: ExecutionStatus) -> bool {
        if self.is_terminal() || status == ExecutionStatus::InProgress {
            return false;
        }
        self.status = status;
        true
    }

    pub fn push(&mut self, result: StepResult) {
        self.step_results.push(result);
    }

    pub fn completed_results(&self) -> impl Iterator<Item = &StepResult> {
        self.step_results.iter().filter(|r| r.is_completed())
    }
}
