//! 进度事件与订阅者
//!
//! 两种形状：阶段事件 `{stage: "understanding"|"planning", data}`，
//! 以及 `{type: "progress", data: ExecutionState}` / `{type: "complete", data: RunResult}`。
//! 订阅者在循环中被 await：慢订阅者会反压整个运行；订阅端断开不会停止运行。

use async_trait::async_trait;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use tokio::sync::mpsc;

use crate::core::{ExecutionState, RunResult};
use crate::planning::{Plan, Understanding};

#[derive(Debug, Clone)]
pub enum ProgressEvent {
    Understanding(Understanding),
    Planning(Plan),
    Progress(ExecutionState),
    Complete(Box<RunResult>),
}

impl ProgressEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ProgressEvent::Understanding(_) => "understanding",
            ProgressEvent::Planning(_) => "planning",
            ProgressEvent::Progress(_) => "progress",
            ProgressEvent::Complete(_) => "complete",
        }
    }
}

impl Serialize for ProgressEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        match self {
            ProgressEvent::Understanding(u) => {
                map.serialize_entry("stage", "understanding")?;
                map.serialize_entry("data", u)?;
            }
            ProgressEvent::Planning(plan) => {
                map.serialize_entry("stage", "planning")?;
                map.serialize_entry("data", plan)?;
            }
            ProgressEvent::Progress(state) => {
                map.serialize_entry("type", "progress")?;
                map.serialize_entry("data", state)?;
            }
            ProgressEvent::Complete(result) => {
                map.serialize_entry("type", "complete")?;
                map.serialize_entry("data", result)?;
            }
        }
        map.end()
    }
}

/// 进度订阅者；notify 返回前运行不会继续
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn notify(&self, event: ProgressEvent);
}

/// 有界通道订阅者：通道满时等待（反压），接收端关闭后静默丢弃
pub struct ChannelSink {
    tx: mpsc::Sender<ProgressEvent>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<ProgressEvent>) -> Self {
        Self { tx }
    }

    /// 创建订阅者与对应接收端
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<ProgressEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(tx), rx)
    }
}

#[async_trait]
impl ProgressSink for ChannelSink {
    async fn notify(&self, event: ProgressEvent) {
        let name = event.name();
        if self.tx.send(event).await.is_err() {
            tracing::debug!(event = name, "progress receiver closed, event dropped");
        }
    }
}

/// 只写日志的订阅者（命令行使用）
pub struct LogSink;

#[async_trait]
impl ProgressSink for LogSink {
    async fn notify(&self, event: ProgressEvent) {
        match &event {
            ProgressEvent::Understanding(u) => {
                tracing::info!(objective = %u.objective, topics = u.topics.len(), "goal understood")
            }
            ProgressEvent::Planning(plan) => tracing::info!(steps = plan.len(), "plan created"),
            ProgressEvent::Progress(state) => tracing::info!(
                completed = state.steps_completed,
                total = state.total_steps,
                "step progress"
            ),
            ProgressEvent::Complete(result) => {
                tracing::info!(success = result.success, "run complete")
            }
        }
    }
}
