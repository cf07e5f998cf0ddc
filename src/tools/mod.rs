pub mod analyze;
pub mod executor;
pub mod registry;
pub mod synthesize;
pub mod web;
pub mod web_fetch;
pub mod web_search;

pub use analyze::AnalyzeTool;
pub use executor::StepExecutor;
pub use registry::{Tool, ToolContext, ToolInputs, ToolKind, ToolRegistry};
pub use synthesize::SynthesizeTool;
pub use web::{MockWebClient, NetworkError, ReqwestWebClient, WebClient};
pub use web_fetch::WebFetchTool;
pub use web_search::WebSearchTool;

/// 注册四个内置工具（默认参数）
pub fn builtin_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(WebSearchTool::default());
    registry.register(WebFetchTool::default());
    registry.register(AnalyzeTool::default());
    registry.register(SynthesizeTool::default());
    registry
}
