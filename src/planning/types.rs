//! 计划相关类型：Understanding、PlanStep 与计划边界校验
//!
//! PlanStep 的 JSON 形状即计划的线上格式：
//! `{step_number, description, tool, inputs, expected_output, dependencies, critical}`。
//! 计划只在进入系统时校验一次（validate_plan），之后各处直接信任。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// 对目标的结构化理解；每次运行只生成一次，之后不再修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Understanding {
    pub objective: String,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default = "default_deliverable_type")]
    pub deliverable_type: String,
    #[serde(default = "default_scope")]
    pub scope: String,
    #[serde(default)]
    pub success_criteria: Vec<String>,
}

fn default_deliverable_type() -> String {
    "report".to_string()
}

fn default_scope() -> String {
    "comprehensive".to_string()
}

impl Understanding {
    /// LLM 输出无法解析时的确定性回退
    pub fn fallback(goal: &str) -> Self {
        Self {
            objective: goal.to_string(),
            topics: Vec::new(),
            deliverable_type: default_deliverable_type(),
            scope: default_scope(),
            success_criteria: vec![
                "Complete research".to_string(),
                "Accurate information".to_string(),
                "Well-structured output".to_string(),
            ],
        }
    }
}

/// 计划中的一步：工具名、输入、声明的依赖（仅作记录，不参与调度）与 critical 标记
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanStep {
    /// 1..N 连续编号；LLM 未给出时由 validate_plan 按位置补齐
    #[serde(default)]
    pub step_number: usize,
    pub description: String,
    /// 工具名保留原始字符串，未知名称在执行时作为 ToolNotFound 步骤失败处理
    pub tool: String,
    #[serde(default)]
    pub inputs: BTreeMap<String, Value>,
    #[serde(default)]
    pub expected_output: String,
    #[serde(default)]
    pub dependencies: Vec<usize>,
    #[serde(default = "default_critical")]
    pub critical: bool,
}

fn default_critical() -> bool {
    true
}

impl PlanStep {
    pub fn new(step_number: usize, description: impl Into<String>, tool: impl Into<String>) -> Self {
        Self {
            step_number,
            description: description.into(),
            tool: tool.into(),
            inputs: BTreeMap::new(),
            expected_output: String::new(),
            dependencies: Vec::new(),
            critical: true,
        }
    }

    pub fn with_input(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.inputs.insert(key.into(), value.into());
        self
    }

    pub fn with_expected_output(mut self, expected: impl Into<String>) -> Self {
        self.expected_output = expected.into();
        self
    }

    pub fn with_dependencies(mut self, dependencies: Vec<usize>) -> Self {
        self.dependencies = dependencies;
        self
    }

    pub fn with_critical(mut self, critical: bool) -> Self {
        self.critical = critical;
        self
    }
}

/// 有序步骤列表
pub type Plan = Vec<PlanStep>;

/// 计划在边界校验时可能出现的问题
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("Plan has no steps")]
    Empty,
    #[error("Step at position {0} has an empty description")]
    MissingDescription(usize),
    #[error("Step at position {0} has an empty tool name")]
    MissingTool(usize),
}

/// 校验并规范化计划：非空、描述与工具名非空；step_number 按列表位置重排为 1..N
pub fn validate_plan(mut steps: Vec<PlanStep>) -> Result<Plan, PlanError> {
    if steps.is_empty() {
        return Err(PlanError::Empty);
    }
    for (i, step) in steps.iter_mut().enumerate() {
        let position = i + 1;
        if step.description.trim().is_empty() {
            return Err(PlanError::MissingDescription(position));
        }
        if step.tool.trim().is_empty() {
            return Err(PlanError::MissingTool(position));
        }
        if step.step_number != position {
            if step.step_number != 0 {
                tracing::warn!(
                    declared = step.step_number,
                    position,
                    "plan step renumbered to match its position"
                );
            }
            step.step_number = position;
        }
    }
    Ok(steps)
}
