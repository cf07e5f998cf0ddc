//! Mock LLM 客户端（用于测试与离线运行，无需 API）
//!
//! 默认回显输入首行；可通过 `with_handler` 注入按 (instructions, input) 决定回复的闭包，
//! 所有调用都会被记录，便于测试断言调用次数与内容。

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::llm::LlmClient;

type Handler = dyn Fn(&str, &str) -> Result<String, String> + Send + Sync;

/// 一次被记录的调用
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    pub instructions: String,
    pub input: String,
    pub max_output: u32,
}

/// Mock 客户端：无 handler 时回显输入首行
#[derive(Default, Clone)]
pub struct MockLlmClient {
    handler: Option<Arc<Handler>>,
    calls: Arc<Mutex<Vec<MockCall>>>,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// 使用闭包决定每次调用的返回值
    pub fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(&str, &str) -> Result<String, String> + Send + Sync + 'static,
    {
        Self {
            handler: Some(Arc::new(handler)),
            calls: Arc::default(),
        }
    }

    /// 每次调用都返回同一段文本
    pub fn always(reply: impl Into<String>) -> Self {
        let reply = reply.into();
        Self::with_handler(move |_, _| Ok(reply.clone()))
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(
        &self,
        instructions: &str,
        input: &str,
        max_output: u32,
    ) -> Result<String, String> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(MockCall {
                instructions: instructions.to_string(),
                input: input.to_string(),
                max_output,
            });
        }

        match &self.handler {
            Some(handler) => handler(instructions, input),
            None => {
                let first_line = input.lines().next().unwrap_or("(no input)");
                Ok(format!("Echo from Mock: {}", first_line))
            }
        }
    }
}
