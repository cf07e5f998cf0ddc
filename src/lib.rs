//! Quest - Rust 目标驱动研究智能体
//!
//! 模块划分：
//! - **agent**: 运行时装配（LLM 后端选择、工具注册、RunOrchestrator 构建）
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 执行状态、事件日志、进度事件、执行引擎、综合与运行编排
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / DeepSeek / Mock）
//! - **observability**: tracing 初始化
//! - **planning**: 目标理解、计划生成与回退
//! - **tools**: 内置工具（web_search / web_fetch / analyze / synthesize）与步骤执行器
//! - **server**: HTTP 前端（feature = "web"）

pub mod agent;
pub mod config;
pub mod core;
pub mod llm;
pub mod observability;
pub mod planning;
#[cfg(feature = "web")]
pub mod server;
pub mod tools;

pub use crate::core::{GoalRequest, RunOrchestrator, RunResult};
