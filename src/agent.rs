//! 运行时装配：从配置构建 LLM 后端、工具注册表与 RunOrchestrator
//!
//! 命令行与 HTTP 前端共用这里的装配逻辑；组件构建一次，之后每次运行只读共享。

use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::core::{ExecutionEngine, ResultSynthesizer, RunOrchestrator};
use crate::llm::{create_deepseek_client, LlmClient, MockLlmClient, OpenAiClient};
use crate::planning::{GoalInterpreter, PlanBuilder};
use crate::tools::{
    AnalyzeTool, ReqwestWebClient, StepExecutor, SynthesizeTool, ToolContext, ToolRegistry,
    WebClient, WebFetchTool, WebSearchTool,
};

/// 按配置与环境变量选择 LLM 后端
///
/// - provider = "mock"：始终使用 Mock
/// - 有 `DEEPSEEK_API_KEY`，或 provider 为 deepseek 且仅有 `OPENAI_API_KEY`：DeepSeek
/// - 有 `OPENAI_API_KEY` 且 provider 不是 deepseek：OpenAI 兼容端点
/// - 否则回退到 Mock
pub fn create_llm_from_config(cfg: &AppConfig) -> Arc<dyn LlmClient> {
    let provider = cfg.llm.provider.to_lowercase();
    if provider == "mock" {
        tracing::info!("Using Mock LLM (configured)");
        return Arc::new(MockLlmClient::new());
    }

    let has_deepseek = std::env::var("DEEPSEEK_API_KEY").is_ok();
    let has_openai = std::env::var("OPENAI_API_KEY").is_ok();
    let use_deepseek = has_deepseek || (provider == "deepseek" && has_openai);
    let use_openai = has_openai && provider != "deepseek";

    if use_deepseek {
        let model = cfg
            .llm
            .deepseek
            .model
            .clone()
            .unwrap_or_else(|| cfg.llm.model.clone());
        let client = create_deepseek_client(&model);
        tracing::info!("Using DeepSeek LLM ({})", client.model());
        Arc::new(client)
    } else if use_openai {
        let model = cfg
            .llm
            .openai
            .model
            .clone()
            .unwrap_or_else(|| "gpt-4o-mini".to_string());
        let client = OpenAiClient::new(
            cfg.llm.base_url.as_deref(),
            &model,
            std::env::var("OPENAI_API_KEY").ok().as_deref(),
        );
        tracing::info!("Using OpenAI LLM ({})", client.model());
        Arc::new(client)
    } else {
        tracing::warn!("No API key set or provider unknown, using Mock LLM");
        Arc::new(MockLlmClient::new())
    }
}

/// 按配置注册四个内置工具
pub fn create_tool_registry(cfg: &AppConfig) -> ToolRegistry {
    let tokens = &cfg.llm.max_tokens;
    let mut tools = ToolRegistry::new();
    tools.register(WebSearchTool::new(tokens.search));
    tools.register(WebFetchTool::new(
        cfg.tools.web_fetch.timeout_secs,
        cfg.tools.web_fetch.max_chars,
    ));
    tools.register(AnalyzeTool::new(
        cfg.tools.analyze.context_entries,
        cfg.tools.analyze.context_chars,
        tokens.analyze,
    ));
    tools.register(SynthesizeTool::new(tokens.synthesize));
    tools
}

/// 用给定的 LLM 与 Web 客户端装配 RunOrchestrator（测试可注入 Mock）
pub fn create_orchestrator_with(
    cfg: &AppConfig,
    llm: Arc<dyn LlmClient>,
    web: Arc<dyn WebClient>,
) -> RunOrchestrator {
    let tokens = &cfg.llm.max_tokens;
    let executor = StepExecutor::new(create_tool_registry(cfg), ToolContext::new(llm.clone(), web));
    tracing::debug!(
        fetch_timeout = ?Duration::from_secs(cfg.tools.web_fetch.timeout_secs),
        "orchestrator assembled"
    );
    RunOrchestrator::new(
        GoalInterpreter::new(llm.clone()).with_max_output(tokens.understanding),
        PlanBuilder::new(llm.clone()).with_max_output(tokens.planning),
        ExecutionEngine::new(executor),
        ResultSynthesizer::new(llm).with_max_output(tokens.report),
    )
}

/// 从配置装配生产用 RunOrchestrator（真实 HTTP 客户端）
pub fn create_orchestrator(cfg: &AppConfig) -> RunOrchestrator {
    let llm = create_llm_from_config(cfg);
    create_orchestrator_with(cfg, llm, Arc::new(ReqwestWebClient::new()))
}
