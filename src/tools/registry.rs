//! 工具注册表
//!
//! 工具集合是固定的 ToolKind 枚举；启动时按 kind 建立查找表（可替换实现以便插拔与测试）。
//! 计划中出现的未知工具名在 resolve 时转为 StepError::ToolNotFound。

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::{StepError, StepResult};
use crate::llm::LlmClient;
use crate::tools::WebClient;

/// 固定工具集合
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    WebSearch,
    WebFetch,
    Analyze,
    Synthesize,
}

impl ToolKind {
    pub const ALL: [ToolKind; 4] = [
        ToolKind::WebSearch,
        ToolKind::WebFetch,
        ToolKind::Analyze,
        ToolKind::Synthesize,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolKind::WebSearch => "web_search",
            ToolKind::WebFetch => "web_fetch",
            ToolKind::Analyze => "analyze",
            ToolKind::Synthesize => "synthesize",
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolKind {
    type Err = StepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s.trim())
            .ok_or_else(|| StepError::ToolNotFound {
                name: s.to_string(),
            })
    }
}

impl From<ToolKind> for String {
    fn from(kind: ToolKind) -> Self {
        kind.as_str().to_string()
    }
}

/// 工具输入：计划中 step.inputs 的原样映射
pub type ToolInputs = BTreeMap<String, Value>;

/// 工具执行时可用的外部协作方
#[derive(Clone)]
pub struct ToolContext {
    pub llm: Arc<dyn LlmClient>,
    pub web: Arc<dyn WebClient>,
}

impl ToolContext {
    pub fn new(llm: Arc<dyn LlmClient>, web: Arc<dyn WebClient>) -> Self {
        Self { llm, web }
    }
}

/// 工具 trait：kind、描述与异步执行；context 为此前所有步骤结果（按计划顺序）
#[async_trait]
pub trait Tool: Send + Sync {
    fn kind(&self) -> ToolKind;

    /// 工具描述（日志与 /api 展示用）
    fn description(&self) -> &str;

    async fn execute(
        &self,
        inputs: &ToolInputs,
        context: &[StepResult],
        ctx: &ToolContext,
    ) -> Result<String, String>;
}

/// 工具注册表：ToolKind → Arc<dyn Tool>
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: HashMap<ToolKind, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册工具；同一 kind 的旧实现被替换
    pub fn register(&mut self, tool: impl Tool + 'static) {
        self.tools.insert(tool.kind(), Arc::new(tool));
    }

    pub fn get(&self, kind: ToolKind) -> Option<Arc<dyn Tool>> {
        self.tools.get(&kind).cloned()
    }

    /// 按计划中的工具名查找；未知名称或未注册的 kind 均为 ToolNotFound
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Tool>, StepError> {
        let kind: ToolKind = name.parse()?;
        self.get(kind).ok_or_else(|| StepError::ToolNotFound {
            name: name.to_string(),
        })
    }

    /// 按名称排序的 (name, description) 列表，供 GET /api/tools 展示
    pub fn tool_descriptions(&self) -> Vec<(String, String)> {
        let mut list: Vec<(String, String)> = self
            .tools
            .iter()
            .map(|(kind, tool)| (kind.to_string(), tool.description().to_string()))
            .collect();
        list.sort();
        list
    }
}
