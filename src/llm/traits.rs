//! LLM 客户端抽象
//!
//! 所有后端（OpenAI 兼容 / DeepSeek / Mock）实现 LlmClient：complete(instructions, input, max_output)。
//! 返回的文本可能不是合法 JSON，调用方需将其视为常态而非异常。

use async_trait::async_trait;

/// LLM 客户端 trait：以 system 指令 + 用户输入完成一次非流式调用
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// 非流式完成；`max_output` 为输出 token 上限
    async fn complete(
        &self,
        instructions: &str,
        input: &str,
        max_output: u32,
    ) -> Result<String, String>;

    /// 获取累计 token 使用统计：(prompt_tokens, completion_tokens, total_tokens)
    /// 默认返回 (0, 0, 0)，具体实现可覆盖
    fn token_usage(&self) -> (u64, u64, u64) {
        (0, 0, 0)
    }
}
