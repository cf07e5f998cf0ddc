//! DeepSeek 预设：OpenAI 兼容端点 + 固定 base URL

use crate::llm::OpenAiClient;

pub const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com";
pub const DEEPSEEK_CHAT: &str = "deepseek-chat";

/// 读取 DeepSeek 凭据：`DEEPSEEK_API_KEY` 优先，其次 `OPENAI_API_KEY`
fn deepseek_api_key() -> Option<String> {
    std::env::var("DEEPSEEK_API_KEY")
        .or_else(|_| std::env::var("OPENAI_API_KEY"))
        .ok()
}

/// 以给定模型创建 DeepSeek 客户端；模型名为空时使用 deepseek-chat
pub fn create_deepseek_client(model: &str) -> OpenAiClient {
    let model = match model.trim() {
        "" => DEEPSEEK_CHAT,
        m => m,
    };
    OpenAiClient::new(Some(DEEPSEEK_BASE_URL), model, deepseek_api_key().as_deref())
}
