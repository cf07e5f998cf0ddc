//! 错误类型：运行级（AgentError）与步骤级（StepError）
//!
//! StepError 按步骤的 critical 标记被引擎吸收或终止执行；AgentError 只在 RunOrchestrator 边界被捕获一次，
//! 转为 `{success: false, error, log}`。

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 运行级错误：到达 RunOrchestrator 边界才被捕获
#[derive(Error, Debug)]
pub enum AgentError {
    /// 目标理解 / 计划阶段调用 LLM 本身失败（不是输出格式错误）
    #[error("LLM error during {stage}: {message}")]
    LlmError { stage: &'static str, message: String },

    /// 最终综合报告失败，无回退
    #[error("Synthesis failed: {0}")]
    SynthesisError(String),

    /// 本地序列化失败（构造 LLM 输入时），与 LLM 调用失败区分
    #[error("JSON encode error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 请求在系统边界校验失败（如空目标）
    #[error("Invalid goal: {0}")]
    InvalidGoal(String),
}

impl AgentError {
    pub fn llm(stage: &'static str, message: impl Into<String>) -> Self {
        AgentError::LlmError {
            stage,
            message: message.into(),
        }
    }
}

/// 步骤级错误：StepExecutor 以值的形式返回，不向外抛出
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepError {
    #[error("Tool '{name}' not found")]
    ToolNotFound { name: String },

    #[error("Error executing step '{description}': {cause}")]
    ToolExecutionFailed { description: String, cause: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_error_messages() {
        let err = StepError::ToolNotFound {
            name: "teleport".to_string(),
        };
        assert_eq!(err.to_string(), "Tool 'teleport' not found");

        let err = StepError::ToolExecutionFailed {
            description: "Search for EV market".to_string(),
            cause: "LLM unavailable".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Error executing step 'Search for EV market': LLM unavailable"
        );
    }

    #[test]
    fn test_serde_error_is_not_llm_error() {
        let serde_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = AgentError::from(serde_err);
        assert!(matches!(err, AgentError::Serialization(_)));
        assert!(err.to_string().starts_with("JSON encode error:"));
    }

    #[test]
    fn test_agent_error_carries_stage() {
        let err = AgentError::llm("planning", "connection reset");
        assert_eq!(err.to_string(), "LLM error during planning: connection reset");
    }
}
