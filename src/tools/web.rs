//! Web 传输客户端：GET + 超时
//!
//! ReqwestWebClient 使用浏览器 UA 与常用请求头，每次请求单独施加超时；非 2xx 状态视为 NetworkError::Status。
//! MockWebClient 按 URL 返回预置内容，供测试与离线运行使用。

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("Read body: {0}")]
    Body(String),
}

/// Web 传输契约：`get(url, timeout) -> body | NetworkError`
#[async_trait]
pub trait WebClient: Send + Sync {
    async fn get(&self, url: &str, timeout: Duration) -> Result<String, NetworkError>;
}

/// 基于 reqwest 的实现
pub struct ReqwestWebClient {
    client: Client,
}

impl ReqwestWebClient {
    pub fn new() -> Self {
        // 使用现代浏览器 UA 与常用请求头，避免被站点识别为爬虫
        const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            reqwest::header::HeaderValue::from_static("en-US,en;q=0.9"),
        );
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

impl Default for ReqwestWebClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WebClient for ReqwestWebClient {
    async fn get(&self, url: &str, timeout: Duration) -> Result<String, NetworkError> {
        let resp = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NetworkError::Timeout(timeout)
                } else {
                    NetworkError::Request(e.to_string())
                }
            })?;
        if !resp.status().is_success() {
            return Err(NetworkError::Status(resp.status().as_u16()));
        }
        let mut body = resp
            .text()
            .await
            .map_err(|e| NetworkError::Body(e.to_string()))?;

        // 去除 BOM
        if body.starts_with('\u{FEFF}') {
            body = body['\u{FEFF}'.len_utf8()..].to_string();
        }
        Ok(body)
    }
}

/// 按 URL 返回预置内容；未预置的 URL 返回连接失败
#[derive(Debug, Default, Clone)]
pub struct MockWebClient {
    pages: HashMap<String, Result<String, NetworkError>>,
}

impl MockWebClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.pages.insert(url.into(), Ok(body.into()));
        self
    }

    pub fn with_error(mut self, url: impl Into<String>, error: NetworkError) -> Self {
        self.pages.insert(url.into(), Err(error));
        self
    }
}

#[async_trait]
impl WebClient for MockWebClient {
    async fn get(&self, url: &str, _timeout: Duration) -> Result<String, NetworkError> {
        self.pages
            .get(url)
            .cloned()
            .unwrap_or_else(|| Err(NetworkError::Request(format!("connection refused: {}", url))))
    }
}
