//! LLM 输出解析：提取 JSON 片段，结果用 Parsed 表示「解析成功」或「已回退」
//!
//! 回退不是异常：调用方可以通过 `is_fallback()` 观察并测试这一分支。

use serde::de::DeserializeOwned;

/// 解析结果：结构化值，或附带原因的确定性回退值
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed<T> {
    Structured(T),
    Fallback { value: T, reason: String },
}

impl<T> Parsed<T> {
    pub fn value(&self) -> &T {
        match self {
            Parsed::Structured(v) => v,
            Parsed::Fallback { value, .. } => value,
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            Parsed::Structured(v) => v,
            Parsed::Fallback { value, .. } => value,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Parsed::Fallback { .. })
    }

    pub fn fallback_reason(&self) -> Option<&str> {
        match self {
            Parsed::Fallback { reason, .. } => Some(reason),
            Parsed::Structured(_) => None,
        }
    }
}

/// 取首个 `open` 到最后一个 `close` 之间的片段（含两端）
fn between<'a>(text: &'a str, open: char, close: char) -> Option<&'a str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}

/// 解析 JSON 对象：先整体尝试，失败后取首个 `{` 到最后一个 `}` 之间的内容
pub fn parse_json_object<T: DeserializeOwned>(output: &str) -> Result<T, String> {
    let trimmed = output.trim();
    match serde_json::from_str(trimmed) {
        Ok(v) => Ok(v),
        Err(first) => {
            let fragment = between(trimmed, '{', '}').ok_or_else(|| first.to_string())?;
            serde_json::from_str(fragment).map_err(|e| e.to_string())
        }
    }
}

/// 解析 JSON 数组：有 `[`...`]` 时取首尾之间的内容，否则整体解析
pub fn parse_json_array<T: DeserializeOwned>(output: &str) -> Result<Vec<T>, String> {
    let trimmed = output.trim();
    let fragment = between(trimmed, '[', ']').unwrap_or(trimmed);
    serde_json::from_str(fragment).map_err(|e| e.to_string())
}
