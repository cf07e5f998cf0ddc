//! web_fetch 工具：抓取指定 URL 并提取可读文本
//!
//! 剔除 script/style，HTML 经 html2text 转为纯文本（不带标题、列表、链接标记），折叠空白后截断到 max_chars 个字符。
//! 任何网络 / 状态码 / 解析错误都转为 "Error fetching URL: <cause>" 文本结果，而不是步骤失败。

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use html2text::from_read_with_decorator;
use html2text::render::TrivialDecorator;
use regex::Regex;

use crate::core::StepResult;
use crate::tools::{Tool, ToolContext, ToolInputs, ToolKind};

pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_FETCH_MAX_CHARS: usize = 3000;

pub struct WebFetchTool {
    timeout: Duration,
    max_chars: usize,
}

impl WebFetchTool {
    pub fn new(timeout_secs: u64, max_chars: usize) -> Self {
        Self {
            timeout: Duration::from_secs(timeout_secs),
            max_chars,
        }
    }
}

impl Default for WebFetchTool {
    fn default() -> Self {
        Self::new(DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_FETCH_MAX_CHARS)
    }
}

fn script_style_patterns() -> &'static [Regex; 2] {
    static PATTERNS: OnceLock<[Regex; 2]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").expect("valid script regex"),
            Regex::new(r"(?is)<style\b[^>]*>.*?</style\s*>").expect("valid style regex"),
        ]
    })
}

/// 简易去除 HTML 标签（html2text 失败时的回退）
fn strip_html_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => {
                in_tag = false;
                out.push(' ');
            }
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

/// 判断内容是否像 HTML
fn looks_like_html(s: &str) -> bool {
    let s = s.trim_start();
    s.starts_with("<!")
        || s.starts_with("<html")
        || s.starts_with("<HTML")
        || (s.contains('<') && (s.contains("</") || s.contains("<meta") || s.contains("<br")))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 将抓取到的内容转为可读文本：剔除 script/style、转文本、折叠空白、截断
pub fn extract_text(body: &str, max_chars: usize) -> String {
    let text = if looks_like_html(body) {
        let mut html = body.to_string();
        for pattern in script_style_patterns() {
            html = pattern.replace_all(&html, " ").into_owned();
        }
        match from_read_with_decorator(html.as_bytes(), 10_000, TrivialDecorator::new()) {
            Ok(text) if !text.trim().is_empty() => text,
            _ => strip_html_tags(&html),
        }
    } else {
        body.to_string()
    };
    collapse_whitespace(&text).chars().take(max_chars).collect()
}

#[async_trait]
impl Tool for WebFetchTool {
    fn kind(&self) -> ToolKind {
        ToolKind::WebFetch
    }

    fn description(&self) -> &str {
        "Fetch and read a specific web page. Inputs: {\"url\": \"https://...\"}"
    }

    async fn execute(
        &self,
        inputs: &ToolInputs,
        _context: &[StepResult],
        ctx: &ToolContext,
    ) -> Result<String, String> {
        let url = inputs
            .get("url")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .trim();
        if url.is_empty() {
            return Ok("Error fetching URL: Missing url".to_string());
        }
        tracing::info!(url = %url, "web_fetch");
        match ctx.web.get(url, self.timeout).await {
            Ok(body) => Ok(extract_text(&body, self.max_chars)),
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "web_fetch failed");
                Ok(format!("Error fetching URL: {}", e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::llm::MockLlmClient;
    use crate::tools::{MockWebClient, NetworkError, ReqwestWebClient};

    fn inputs(url: &str) -> ToolInputs {
        let mut inputs = ToolInputs::new();
        inputs.insert("url".to_string(), url.into());
        inputs
    }

    fn ctx(web: impl crate::tools::WebClient + 'static) -> ToolContext {
        ToolContext::new(Arc::new(MockLlmClient::new()), Arc::new(web))
    }

    #[test]
    fn test_extract_text_strips_script_and_style() {
        let html = r#"<html><head><style>body { color: red; }</style>
            <script type="text/javascript">var secret = 1;</script></head>
            <body><h1>Title</h1>   <p>Hello
            world</p></body></html>"#;
        let text = extract_text(html, 3000);
        assert!(text.contains("Title"));
        assert!(text.contains("Hello world"));
        assert!(!text.contains("secret"));
        assert!(!text.contains("color: red"));
        assert!(!text.contains("  "));
    }

    #[test]
    fn test_extract_text_is_bare_text() {
        let html = r#"<h1>Title</h1><p>See <a href="https://example.com/a">the link</a> and <b>bold</b>.</p><ul><li>one</li><li>two</li></ul>"#;
        let text = extract_text(html, 3000);
        assert_eq!(text, "Title See the link and bold. one two");
    }

    #[test]
    fn test_extract_text_truncates_by_chars() {
        let body = "é".repeat(5000);
        assert_eq!(extract_text(&body, 3000).chars().count(), 3000);
    }

    #[tokio::test]
    async fn test_unreachable_url_becomes_text() {
        let tool = WebFetchTool::new(2, 3000);
        let out = tool
            .execute(&inputs("http://127.0.0.1:9/nothing"), &[], &ctx(ReqwestWebClient::new()))
            .await
            .unwrap();
        assert!(out.starts_with("Error fetching URL"));
    }

    #[tokio::test]
    async fn test_http_status_becomes_text() {
        let web = MockWebClient::new().with_error("https://x.test", NetworkError::Status(503));
        let out = WebFetchTool::default()
            .execute(&inputs("https://x.test"), &[], &ctx(web))
            .await
            .unwrap();
        assert_eq!(out, "Error fetching URL: HTTP 503");
    }

    #[tokio::test]
    async fn test_fetches_page_text() {
        let web = MockWebClient::new().with_page("https://ok.test", "<html><body><p>Fresh data</p></body></html>");
        let out = WebFetchTool::default()
            .execute(&inputs("https://ok.test"), &[], &ctx(web))
            .await
            .unwrap();
        assert_eq!(out, "Fresh data");
    }

    #[tokio::test]
    async fn test_missing_url_is_not_a_failure() {
        let out = WebFetchTool::default()
            .execute(&ToolInputs::new(), &[], &ctx(MockWebClient::new()))
            .await
            .unwrap();
        assert!(out.contains("Error fetching URL"));
    }
}
