//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `QUEST__*` 覆盖（双下划线表示嵌套，如 `QUEST__LLM__PROVIDER=openai`）。

use std::path::PathBuf;

use serde::Deserialize;

use crate::core::synthesizer::DEFAULT_REPORT_MAX_TOKENS;
use crate::llm::DEEPSEEK_CHAT;
use crate::planning::interpreter::DEFAULT_UNDERSTANDING_MAX_TOKENS;
use crate::planning::planner::DEFAULT_PLANNING_MAX_TOKENS;
use crate::tools::analyze::{
    DEFAULT_ANALYZE_CONTEXT_CHARS, DEFAULT_ANALYZE_CONTEXT_ENTRIES, DEFAULT_ANALYZE_MAX_TOKENS,
};
use crate::tools::synthesize::DEFAULT_SYNTHESIZE_MAX_TOKENS;
use crate::tools::web_fetch::{DEFAULT_FETCH_MAX_CHARS, DEFAULT_FETCH_TIMEOUT_SECS};
use crate::tools::web_search::DEFAULT_SEARCH_MAX_TOKENS;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub llm: LlmSection,
    pub tools: ToolsSection,
    pub web: WebSection,
}

/// [app] 段
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppSection {
    pub name: Option<String>,
}

/// [llm] 段：后端选择与各阶段输出上限
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    /// 后端：deepseek / openai / mock；无 API Key 时回退到 mock
    pub provider: String,
    pub model: String,
    pub base_url: Option<String>,
    pub deepseek: LlmModelOverride,
    pub openai: LlmModelOverride,
    pub max_tokens: MaxTokensSection,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: "deepseek".to_string(),
            model: DEEPSEEK_CHAT.to_string(),
            base_url: None,
            deepseek: LlmModelOverride::default(),
            openai: LlmModelOverride::default(),
            max_tokens: MaxTokensSection::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LlmModelOverride {
    pub model: Option<String>,
}

/// [llm.max_tokens] 段：每次 LLM 调用的输出 token 上限
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MaxTokensSection {
    pub understanding: u32,
    pub planning: u32,
    pub search: u32,
    pub analyze: u32,
    pub synthesize: u32,
    pub report: u32,
}

impl Default for MaxTokensSection {
    fn default() -> Self {
        Self {
            understanding: DEFAULT_UNDERSTANDING_MAX_TOKENS,
            planning: DEFAULT_PLANNING_MAX_TOKENS,
            search: DEFAULT_SEARCH_MAX_TOKENS,
            analyze: DEFAULT_ANALYZE_MAX_TOKENS,
            synthesize: DEFAULT_SYNTHESIZE_MAX_TOKENS,
            report: DEFAULT_REPORT_MAX_TOKENS,
        }
    }
}

/// [tools] 段
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ToolsSection {
    pub web_fetch: WebFetchSection,
    pub analyze: AnalyzeSection,
}

/// [tools.web_fetch] 段：抓取超时（系统中唯一的截止时间）与最大字符数
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WebFetchSection {
    pub timeout_secs: u64,
    pub max_chars: usize,
}

impl Default for WebFetchSection {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            max_chars: DEFAULT_FETCH_MAX_CHARS,
        }
    }
}

/// [tools.analyze] 段：附带的最近成功结果条数与每条截断长度
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalyzeSection {
    pub context_entries: usize,
    pub context_chars: usize,
}

impl Default for AnalyzeSection {
    fn default() -> Self {
        Self {
            context_entries: DEFAULT_ANALYZE_CONTEXT_ENTRIES,
            context_chars: DEFAULT_ANALYZE_CONTEXT_CHARS,
        }
    }
}

/// [web] 段：HTTP 前端端口与进度通道容量
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WebSection {
    pub port: u16,
    pub progress_capacity: usize,
}

impl Default for WebSection {
    fn default() -> Self {
        Self {
            port: 8080,
            progress_capacity: 16,
        }
    }
}

/// 从 config 目录加载配置，环境变量 QUEST__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 QUEST__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("QUEST")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}
