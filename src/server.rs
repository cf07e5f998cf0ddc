//! HTTP 前端（feature = "web"）
//!
//! - GET  /api/health：健康检查、活跃会话数与累计 token 使用
//! - GET  /api/tools：已注册工具及说明
//! - POST /api/run：同步运行，返回 RunResult
//! - POST /api/run/stream：NDJSON 流，首行会话 ID，之后为进度事件，最后一行为 complete
//! - GET  /api/sessions：活跃流式会话
//!
//! 会话随流连接创建与移除；客户端断开不会取消运行：运行在后台任务中进行，进度通道关闭后事件被丢弃。

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use futures_util::stream;
use serde::Serialize;
use serde_json::json;

use crate::core::{ChannelSink, GoalRequest, RunOrchestrator, RunResult, SessionInfo, SessionRegistry};

pub struct AppState {
    pub orchestrator: Arc<RunOrchestrator>,
    pub sessions: SessionRegistry,
    /// 每个流式请求的进度通道容量
    pub progress_capacity: usize,
}

impl AppState {
    pub fn new(orchestrator: RunOrchestrator, progress_capacity: usize) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            sessions: SessionRegistry::new(),
            progress_capacity,
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(api_health))
        .route("/api/tools", get(api_tools))
        .route("/api/run", post(api_run))
        .route("/api/run/stream", post(api_run_stream))
        .route("/api/sessions", get(api_sessions))
        .with_state(state)
}

async fn api_health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let (prompt, completion, total) = state.orchestrator.token_usage();
    Json(json!({
        "status": "ok",
        "active_sessions": state.sessions.active_count().await,
        "token_usage": { "prompt": prompt, "completion": completion, "total": total },
    }))
}

async fn api_tools(State(state): State<Arc<AppState>>) -> Json<Vec<serde_json::Value>> {
    Json(
        state
            .orchestrator
            .tool_descriptions()
            .into_iter()
            .map(|(name, description)| json!({ "name": name, "description": description }))
            .collect(),
    )
}

/// POST /api/run：阻塞到运行结束；失败运行同样以 200 返回失败信封
async fn api_run(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GoalRequest>,
) -> Result<Json<RunResult>, (StatusCode, String)> {
    let goal = req
        .validate()
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    Ok(Json(state.orchestrator.run(goal, None).await))
}

async fn api_sessions(State(state): State<Arc<AppState>>) -> Json<Vec<SessionInfo>> {
    Json(state.sessions.list().await)
}

/// 流式运行：NDJSON，首行 `{"type":"session","session_id":...}`
async fn api_run_stream(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GoalRequest>,
) -> Result<Response, (StatusCode, String)> {
    let goal = req
        .validate()
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?
        .to_string();

    let session_id = state.sessions.create(&goal).await;
    let (sink, rx) = ChannelSink::channel(state.progress_capacity);

    let guard = state.sessions.guard(session_id.clone());

    let orchestrator = Arc::clone(&state.orchestrator);
    let session_spawn = session_id.clone();
    tokio::spawn(async move {
        let result = orchestrator.run(&goal, Some(&sink)).await;
        tracing::info!(session = %session_spawn, success = result.success, "streamed run finished");
    });

    // guard 随流状态存活：流读完或客户端断开（body 被 drop）时会话即被移除
    let first_line = ndjson_line(&json!({ "type": "session", "session_id": session_id }));
    let stream = stream::unfold(
        (Some(first_line), rx, guard),
        |(first, mut rx, guard)| async move {
            if let Some(line) = first {
                return Some((Ok::<Bytes, Infallible>(line), (None, rx, guard)));
            }
            rx.recv()
                .await
                .map(|event| (Ok(ndjson_line(&event)), (None, rx, guard)))
        },
    );

    let mut res = Response::new(Body::from_stream(stream));
    res.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/x-ndjson; charset=utf-8"),
    );
    Ok(res)
}

fn ndjson_line(value: &impl Serialize) -> Bytes {
    match serde_json::to_string(value) {
        Ok(line) => Bytes::from(format!("{}\n", line)),
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize stream line");
            Bytes::from(format!("{}\n", json!({ "type": "error", "error": e.to_string() })))
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::config::AppConfig;
    use crate::llm::{LlmClient, MockLlmClient};
    use crate::tools::MockWebClient;

    fn app(llm: MockLlmClient) -> (Router, Arc<AppState>) {
        let orchestrator = crate::agent::create_orchestrator_with(
            &AppConfig::default(),
            Arc::new(llm),
            Arc::new(MockWebClient::new()),
        );
        let state = Arc::new(AppState::new(orchestrator, 4));
        (router(Arc::clone(&state)), state)
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app(MockLlmClient::new());
        let response = app
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["active_sessions"], 0);
        assert_eq!(json["token_usage"]["total"], 0);
    }

    /// 报告固定 token 用量的 LLM 客户端
    struct MeteredLlm(MockLlmClient);

    #[async_trait::async_trait]
    impl LlmClient for MeteredLlm {
        async fn complete(
            &self,
            instructions: &str,
            input: &str,
            max_output: u32,
        ) -> Result<String, String> {
            self.0.complete(instructions, input, max_output).await
        }

        fn token_usage(&self) -> (u64, u64, u64) {
            (12, 30, 42)
        }
    }

    #[tokio::test]
    async fn test_health_reports_token_usage() {
        let orchestrator = crate::agent::create_orchestrator_with(
            &AppConfig::default(),
            Arc::new(MeteredLlm(MockLlmClient::new())),
            Arc::new(MockWebClient::new()),
        );
        let app = router(Arc::new(AppState::new(orchestrator, 4)));
        let response = app
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["token_usage"]["prompt"], 12);
        assert_eq!(json["token_usage"]["completion"], 30);
        assert_eq!(json["token_usage"]["total"], 42);
    }

    #[tokio::test]
    async fn test_tools_lists_builtin_tools() {
        let (app, _) = app(MockLlmClient::new());
        let response = app
            .oneshot(Request::builder().uri("/api/tools").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let tools: Vec<serde_json::Value> = serde_json::from_slice(&body).unwrap();
        let names: Vec<&str> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["analyze", "synthesize", "web_fetch", "web_search"]);
        assert!(tools.iter().all(|t| !t["description"].as_str().unwrap().is_empty()));
    }

    #[tokio::test]
    async fn test_run_rejects_blank_goal() {
        let (app, _) = app(MockLlmClient::new());
        let response = app
            .oneshot(post_json("/api/run", r#"{"goal": "   "}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_run_returns_envelope() {
        let (app, _) = app(MockLlmClient::always("plain text"));
        let response = app
            .oneshot(post_json("/api/run", r#"{"goal": "EV market"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let result: RunResult = serde_json::from_slice(&body).unwrap();
        assert!(result.success);
        assert_eq!(result.output.as_deref(), Some("plain text"));
    }

    #[tokio::test]
    async fn test_stream_session_then_events_then_complete() {
        let (app, state) = app(MockLlmClient::always("plain text"));
        let response = app
            .oneshot(post_json("/api/run/stream", r#"{"goal": "EV market"}"#))
            .await
            .unwrap();
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/x-ndjson; charset=utf-8"
        );
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let lines: Vec<serde_json::Value> = std::str::from_utf8(&body)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(lines[0]["type"], "session");
        assert_eq!(lines[1]["stage"], "understanding");
        assert_eq!(lines[2]["stage"], "planning");
        assert_eq!(lines[3]["type"], "progress");
        let last = lines.last().unwrap();
        assert_eq!(last["type"], "complete");
        assert_eq!(last["data"]["success"], true);

        // 流读完即移除会话
        assert_eq!(state.sessions.active_count().await, 0);
    }

    #[tokio::test]
    async fn test_disconnect_disposes_session_but_run_continues() {
        let llm = MockLlmClient::always("plain text");
        let (app, state) = app(llm.clone());
        let response = app
            .oneshot(post_json("/api/run/stream", r#"{"goal": "EV market"}"#))
            .await
            .unwrap();
        assert_eq!(state.sessions.active_count().await, 1);

        // 客户端断开：响应 body 未读即被丢弃
        drop(response);
        assert_eq!(state.sessions.active_count().await, 0);

        // 理解、计划、两个回退步骤与最终报告共 5 次调用
        for _ in 0..200 {
            if llm.call_count() >= 5 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(llm.call_count(), 5);
    }
}
